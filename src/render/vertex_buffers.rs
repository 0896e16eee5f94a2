use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};

use crate::drawable::Drawable;

/// Vertex layout uploaded for every batch.
///
/// The screen color rides in the slot a lit mesh would use for its normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
	pub position: Vec3,
	pub uv: Vec2,
	pub screen_color: Vec3,
	/// RGBA8, red in the lowest byte.
	pub multiply_color: u32,
}

/// Packs a color into RGBA8 with red in the lowest byte.
pub fn pack_color(color: Vec4) -> u32 {
	let [r, g, b, a] = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round().to_array();
	u32::from_le_bytes([r as u8, g as u8, b as u8, a as u8])
}

/// CPU side buffers of one batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexBuffers {
	pub vertices: Vec<Vertex>,
	pub indices: Vec<u32>,
}

impl VertexBuffers {
	/// Concatenates the members' indices, offsetting each drawable's by the vertices of the ones before it.
	pub fn rebuild_indices<'a>(&mut self, drawables: impl IntoIterator<Item = &'a Drawable>) {
		self.indices.clear();

		let mut vert_offset = 0;
		for drawable in drawables {
			self.indices
				.extend(drawable.indices().iter().map(|&index| u32::from(index) + vert_offset));
			vert_offset += drawable.vertex_count() as u32;
		}
	}

	/// Concatenates the members' vertices in the XY plane with their current tint.
	///
	/// Masks only contribute their silhouette, so they are tinted opaque white with no screen color.
	pub fn rebuild_vertices<'a>(&mut self, drawables: impl IntoIterator<Item = &'a Drawable>, as_mask: bool) {
		self.vertices.clear();

		for drawable in drawables {
			let (multiply_color, screen_color) = if as_mask {
				(u32::MAX, Vec3::ZERO)
			} else {
				(pack_color(drawable.multiply_color()), drawable.screen_color())
			};

			self.vertices.extend(
				drawable
					.vertex_positions()
					.iter()
					.zip(drawable.vertex_uvs())
					.map(|(position, &uv)| Vertex {
						position: position.extend(0.0),
						uv,
						screen_color,
						multiply_color,
					}),
			);
		}
	}
}
