mod group;
pub mod pendulum;

use crate::params::{Param, Params};

pub use group::PhysicsGroup;
pub use pendulum::PendulumNode;

/// Simulation rate the node delays of a physics descriptor are authored against (Hz).
pub const REFERENCE_RATE: f32 = 30.0;
/// Damping applied to the frame-to-frame change of the gravity direction.
pub const AIR_RESISTANCE: f32 = 5.0;
/// Input and output weights are percentages.
pub const MAX_WEIGHT: f32 = 100.0;
/// Fraction of the position normalization maximum below which a node's x coordinate snaps to 0.
pub const REST_SNAP_RATIO: f32 = 0.001;

/// Which component of the pendulum state a parameter feeds or receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicsParamType {
	Angle,
	X,
	Y,
}

/// Maps a parameter's own range onto the simulator's internal angle or position range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizationParams {
	pub min: f32,
	pub max: f32,
	pub base: f32,
}

impl NormalizationParams {
	pub fn normalize(&self, param: &Param) -> f32 {
		param.normalized_value_with_base(self.base, self.min, self.max)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsInput {
	pub param_id: String,
	pub ty: PhysicsParamType,
	pub weight: f32,
	pub reflect: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsOutput {
	pub param_id: String,
	pub ty: PhysicsParamType,
	/// Node whose segment to its parent drives the output. Must be at least 1.
	pub node_index: usize,
	pub weight: f32,
	pub scale: f32,
	pub reflect: bool,
}

/// Physics of one model instance: a set of independent pendulum groups.
///
/// A controller loaded with a model acts as a prototype; every instance clones its own.
#[derive(Clone, Debug, Default)]
pub struct PhysicsController {
	groups: Vec<PhysicsGroup>,
}

impl PhysicsController {
	pub fn new(groups: Vec<PhysicsGroup>) -> Self {
		Self { groups }
	}

	/// Binds every group to `params`. `None` detaches.
	pub fn attach_to(&mut self, params: Option<&Params>) {
		for group in &mut self.groups {
			group.attach_to(params);
		}
	}

	/// Advances every group by `dt` seconds and writes the bound output parameters.
	pub fn update(&mut self, params: &mut Params, dt: f32) {
		for group in &mut self.groups {
			group.update(params, dt);
		}
	}

	/// Puts every group at rest for the current inputs. See [`PhysicsGroup::stabilize`].
	pub fn stabilize(&mut self, params: &mut Params) {
		for group in &mut self.groups {
			group.stabilize(params);
		}
	}

	pub fn groups(&self) -> &[PhysicsGroup] {
		&self.groups
	}

	pub fn groups_mut(&mut self) -> &mut [PhysicsGroup] {
		&mut self.groups
	}
}

#[cfg(test)]
mod tests {
	use glam::vec2;

	use super::*;

	fn hair_group(id: &str, output: &str) -> PhysicsGroup {
		let norm = NormalizationParams {
			min: -10.0,
			max: 10.0,
			base: 0.0,
		};
		PhysicsGroup::new(
			id,
			norm,
			norm,
			vec![
				PendulumNode::new(vec2(0.0, 0.0), 1.0, 1.0, 1.0, 0.0),
				PendulumNode::new(vec2(0.0, 3.0), 0.95, 0.9, 1.5, 3.0),
			],
			vec![PhysicsInput {
				param_id: "ParamAngleX".to_owned(),
				ty: PhysicsParamType::Angle,
				weight: 100.0,
				reflect: false,
			}],
			vec![PhysicsOutput {
				param_id: output.to_owned(),
				ty: PhysicsParamType::X,
				node_index: 1,
				weight: 100.0,
				scale: 1.0,
				reflect: false,
			}],
		)
	}

	#[test]
	fn controller_drives_every_group() {
		let mut params = Params::new(
			0,
			vec![
				Param::new("ParamAngleX", -30.0, 30.0, 0.0),
				Param::new("ParamHairFront", -10.0, 10.0, 0.0),
				Param::new("ParamHairBack", -10.0, 10.0, 0.0),
			],
		);
		let prototype = PhysicsController::new(vec![
			hair_group("Front", "ParamHairFront"),
			hair_group("Back", "ParamHairBack"),
		]);

		let mut physics = prototype.clone();
		physics.attach_to(Some(&params));
		params.by_id_mut("ParamAngleX").unwrap().set_value(30.0);
		for _ in 0..30 {
			physics.update(&mut params, 1.0 / 60.0);
		}

		let front = params.by_id("ParamHairFront").unwrap().value();
		let back = params.by_id("ParamHairBack").unwrap().value();
		assert!(front > 0.0);
		assert!((front - back).abs() < 1e-5);

		// the prototype never moved
		assert_eq!(prototype.groups()[0].nodes()[1].position, vec2(0.0, 3.0));
	}

	#[test]
	fn detached_controller_writes_nothing() {
		let mut params = Params::new(
			0,
			vec![
				Param::new("ParamAngleX", -30.0, 30.0, 30.0),
				Param::new("ParamHairFront", -10.0, 10.0, 0.0),
			],
		);
		let mut physics = PhysicsController::new(vec![hair_group("Front", "ParamHairFront")]);
		physics.attach_to(Some(&params));
		physics.attach_to(None);

		physics.stabilize(&mut params);
		physics.update(&mut params, 1.0 / 60.0);

		assert_eq!(params.by_id("ParamHairFront").unwrap().value(), 0.0);
	}
}
