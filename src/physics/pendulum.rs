use std::f32::consts::{PI, TAU};

use glam::Vec2;

use super::REFERENCE_RATE;

/// One mass point of a pendulum chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendulumNode {
	pub initial_position: Vec2,
	/// Fraction of the frame's displacement kept as velocity.
	pub mobility: f32,
	/// Time scale of this node relative to the reference rate.
	pub delay: f32,
	pub acceleration: f32,
	/// Fixed distance to the parent node.
	pub radius: f32,

	pub position: Vec2,
	pub velocity: Vec2,
}

impl PendulumNode {
	pub fn new(initial_position: Vec2, mobility: f32, delay: f32, acceleration: f32, radius: f32) -> Self {
		Self {
			initial_position,
			mobility,
			delay,
			acceleration,
			radius,
			position: initial_position,
			velocity: Vec2::ZERO,
		}
	}

	/// Moves the node back to where it was loaded, at rest.
	pub fn reset(&mut self) {
		self.position = self.initial_position;
		self.velocity = Vec2::ZERO;
	}

	/// Runs one velocity-Verlet step under `gravity`, then pins the node to its radius around `parent`.
	///
	/// `parent` must already be updated for this frame. A zero step leaves the node untouched, even if its parent
	/// moved.
	pub(crate) fn integrate(&mut self, parent: Vec2, prev_gravity: Vec2, gravity: Vec2, dt: f32, snap_threshold: f32) {
		let dt = self.delay * dt * REFERENCE_RATE;
		if dt == 0.0 {
			return;
		}
		let prev_position = self.position;
		let prev_acceleration = prev_gravity * self.acceleration;
		let acceleration = gravity * self.acceleration;

		let velocity = self.velocity + 0.25 * (acceleration + prev_acceleration) * dt;
		self.position += velocity * dt;

		self.constrain(parent, prev_position);

		// settle residual jitter at rest
		if self.position.x.abs() < snap_threshold {
			self.position.x = 0.0;
		}

		self.velocity = self.mobility * (self.position - prev_position) / dt;
	}

	/// Places the node on the circle of `radius` around `parent`, along the parent-to-node direction.
	fn constrain(&mut self, parent: Vec2, prev_position: Vec2) {
		let mut direction = (self.position - parent).normalize_or_zero();
		if direction == Vec2::ZERO {
			direction = (prev_position - parent).normalize_or_zero();
		}
		if direction == Vec2::ZERO {
			direction = Vec2::Y;
		}

		self.position = parent + direction * self.radius;
	}

	/// Hangs the node at rest below `parent` in the direction of `gravity`.
	pub(crate) fn hang(&mut self, parent: Vec2, gravity: Vec2) {
		self.position = parent + gravity.normalize_or_zero() * self.radius;
		self.velocity = Vec2::ZERO;
	}
}

/// Unit gravity direction for a rotation in degrees. 0° points down the +Y axis.
pub fn gravity_from_rotation(degrees: f32) -> Vec2 {
	let radians = degrees.to_radians();
	Vec2::new(radians.sin(), radians.cos())
}

/// Signed shortest angle in radians turning `from` onto `to`, in `(-π, π]`.
pub fn direction_to_radian(from: Vec2, to: Vec2) -> f32 {
	let mut ret = f32::atan2(to.y, to.x) - f32::atan2(from.y, from.x);

	while ret <= -PI {
		ret += TAU;
	}
	while ret > PI {
		ret -= TAU;
	}

	ret
}
