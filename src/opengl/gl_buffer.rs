use std::cell::Cell;
use std::mem::{offset_of, size_of};

use glow::HasContext;

use crate::render::Vertex;

use super::OpenglRendererError;

/// A vertex array with its own vertex and index buffers, one per batch.
pub struct GlMesh {
	vao: glow::VertexArray,
	vbo: glow::Buffer,
	ibo: glow::Buffer,
	index_count: Cell<i32>,
}

impl GlMesh {
	/// Creates the buffers and describes the [`Vertex`] layout to the vertex array.
	pub(super) fn new(gl: &glow::Context) -> Result<Self, OpenglRendererError> {
		const STRIDE: i32 = size_of::<Vertex>() as i32;

		unsafe {
			let vao = gl.create_vertex_array().map_err(OpenglRendererError::Opengl)?;
			let vbo = gl.create_buffer().map_err(OpenglRendererError::Opengl)?;
			let ibo = gl.create_buffer().map_err(OpenglRendererError::Opengl)?;

			gl.bind_vertex_array(Some(vao));
			gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
			gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));

			gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, STRIDE, offset_of!(Vertex, position) as i32);
			gl.enable_vertex_attrib_array(0);
			gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, STRIDE, offset_of!(Vertex, uv) as i32);
			gl.enable_vertex_attrib_array(1);
			gl.vertex_attrib_pointer_f32(2, 3, glow::FLOAT, false, STRIDE, offset_of!(Vertex, screen_color) as i32);
			gl.enable_vertex_attrib_array(2);
			// RGBA8, normalized to 0..1 in the shader
			gl.vertex_attrib_pointer_f32(
				3,
				4,
				glow::UNSIGNED_BYTE,
				true,
				STRIDE,
				offset_of!(Vertex, multiply_color) as i32,
			);
			gl.enable_vertex_attrib_array(3);

			gl.bind_vertex_array(None);

			Ok(Self {
				vao,
				vbo,
				ibo,
				index_count: Cell::new(0),
			})
		}
	}

	pub(super) fn upload_indices(&self, gl: &glow::Context, indices: &[u32]) {
		unsafe {
			gl.bind_vertex_array(Some(self.vao));
			gl.buffer_data_u8_slice(
				glow::ELEMENT_ARRAY_BUFFER,
				bytemuck::cast_slice(indices),
				glow::STATIC_DRAW,
			);
			gl.bind_vertex_array(None);
		}
		self.index_count.set(indices.len() as i32);
	}

	pub(super) fn upload_vertices(&self, gl: &glow::Context, vertices: &[Vertex]) {
		unsafe {
			gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
			gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck::cast_slice(vertices), glow::DYNAMIC_DRAW);
			gl.bind_buffer(glow::ARRAY_BUFFER, None);
		}
	}

	/// Draws every uploaded triangle. The shader and textures must be bound.
	pub(super) fn draw(&self, gl: &glow::Context) {
		let count = self.index_count.get();
		if count == 0 {
			return;
		}

		unsafe {
			gl.bind_vertex_array(Some(self.vao));
			gl.draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_INT, 0);
			gl.bind_vertex_array(None);
		}
	}

	pub(super) fn delete(self, gl: &glow::Context) {
		unsafe {
			gl.delete_vertex_array(self.vao);
			gl.delete_buffer(self.vbo);
			gl.delete_buffer(self.ibo);
		}
	}
}
