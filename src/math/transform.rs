use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

/// Placement of a model instance in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
	/// X Y Z
	pub translation: Vec3,
	/// Euler angles
	pub rotation: Vec3,
	/// X Y zoom
	pub scale: Vec2,
}

impl Default for Transform {
	fn default() -> Self {
		Self {
			translation: Vec3::ZERO,
			rotation: Vec3::ZERO,
			scale: Vec2::ONE,
		}
	}
}

impl Transform {
	pub fn with_translation(mut self, translation: Vec3) -> Self {
		self.translation = translation;
		self
	}

	pub fn with_rotation(mut self, rotation: Vec3) -> Self {
		self.rotation = rotation;
		self
	}

	pub fn with_scale(mut self, scale: Vec2) -> Self {
		self.scale = scale;
		self
	}

	pub fn to_matrix(&self) -> Mat4 {
		Mat4::from_translation(self.translation)
			* Mat4::from_quat(Quat::from_euler(
				EulerRot::XYZ,
				self.rotation.x,
				self.rotation.y,
				self.rotation.z,
			)) * Mat4::from_scale(Vec3::new(self.scale.x, self.scale.y, 1.))
	}
}

#[cfg(test)]
mod tests {
	use glam::{vec3, Vec4};

	use super::*;

	#[test]
	fn matrix_scales_then_translates() {
		let transform = Transform::default()
			.with_translation(vec3(10.0, -5.0, 0.0))
			.with_scale(Vec2::new(2.0, 3.0));

		let p = transform.to_matrix() * Vec4::new(1.0, 1.0, 0.0, 1.0);
		assert_eq!(p, Vec4::new(12.0, -2.0, 0.0, 1.0));
		assert_eq!(Transform::default().to_matrix(), Mat4::IDENTITY);
	}
}
