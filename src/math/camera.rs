use glam::{Mat4, UVec2, Vec2, Vec3};

/// Orthographic camera looking at the XY plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
	pub position: Vec2,
	pub rotation: f32,
	pub scale: Vec2,
	/// Size in pixels of the target the camera renders into. Nothing is rendered without one.
	pub target_size: Option<UVec2>,
}

impl Default for Camera {
	fn default() -> Self {
		Self {
			position: Vec2::ZERO,
			rotation: 0.0,
			scale: Vec2::ONE,
			target_size: None,
		}
	}
}

impl Camera {
	pub fn with_target_size(mut self, size: UVec2) -> Self {
		self.target_size = Some(size);
		self
	}

	/// Gets the real size of the viewport
	pub fn real_size(&self, viewport: Vec2) -> Vec2 {
		viewport / self.scale
	}

	/// Gets the resulting matrix from the camera and viewport
	pub fn matrix(&self, viewport: Vec2) -> Mat4 {
		let real_size = self.real_size(viewport);
		let origin = real_size / 2.0;
		let pos = Vec3::new(self.position.x, self.position.y, -(u16::MAX as f32) / 2.0);

		Mat4::orthographic_lh(0.0, real_size.x, real_size.y, 0.0, 0.0, u16::MAX as f32)
			* Mat4::from_translation(origin.extend(0.0))
			* Mat4::from_rotation_z(self.rotation)
			* Mat4::from_translation(pos)
	}
}

#[cfg(test)]
mod tests {
	use glam::Vec4;

	use super::*;

	#[test]
	fn camera_position_lands_on_viewport_center() {
		let camera = Camera {
			position: Vec2::new(30.0, -20.0),
			..Default::default()
		};

		let clip = camera.matrix(Vec2::new(800.0, 600.0)) * Vec4::new(-30.0, 20.0, 0.0, 1.0);
		assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5, "{clip:?}");
	}

	#[test]
	fn zoom_shrinks_real_size() {
		let camera = Camera {
			scale: Vec2::splat(2.0),
			..Default::default()
		};

		assert_eq!(camera.real_size(Vec2::new(800.0, 600.0)), Vec2::new(400.0, 300.0));
	}
}
