//! OpenGL rendering backend on top of `glow`.
//!
//! Every batch is drawn by the same program: the drawable's texture is multiplied and screened with the per-vertex
//! colors, then cut by the alpha of the mask target, sampled at the fragment's clip-space position.

mod gl_buffer;
mod shader;
mod texture;

use glam::{UVec2, Vec4};
use glow::HasContext;
use tracing::debug;

use crate::render::{DrawUniforms, MaterialId, RenderContext, Vertex};
use crate::texture::ShallowTexture;

pub use self::gl_buffer::GlMesh;
pub use self::shader::ShaderCompileError;

use self::shader::{PartShader, MAIN_TEXTURE_SLOT, MASK_TEXTURE_SLOT};
use self::texture::Texture;

#[derive(Debug, thiserror::Error)]
#[error("Could not initialize OpenGL renderer: {0}")]
pub enum OpenglRendererError {
	ShaderCompile(#[from] ShaderCompileError),
	Opengl(String),
}

/// Handle to the offscreen framebuffer masks are drawn into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskTarget {
	framebuffer: glow::Framebuffer,
	size: UVec2,
}

struct Offscreen {
	target: MaskTarget,
	texture: Texture,
}

pub struct OpenglContext {
	gl: glow::Context,
	shader: PartShader,
	/// Indexed by [`MaterialId`].
	textures: Vec<Texture>,
	/// Bound as the mask of unmasked draws.
	no_mask: Texture,
	offscreen: Option<Offscreen>,
	viewport: UVec2,
}

impl OpenglContext {
	/// Compiles the shader and sets up blending. Drawables are two dimensional, so culling and depth testing are off.
	pub fn new(gl: glow::Context) -> Result<Self, OpenglRendererError> {
		let shader = PartShader::new(&gl)?;
		let no_mask = Texture::from_raw_pixels(&gl, &[255; 4], 1, 1)?;

		unsafe {
			gl.enable(glow::BLEND);
			gl.blend_equation(glow::FUNC_ADD);
			gl.blend_func(glow::ONE, glow::ONE_MINUS_SRC_ALPHA);
			gl.disable(glow::CULL_FACE);
			gl.disable(glow::DEPTH_TEST);
		}

		Ok(Self {
			gl,
			shader,
			textures: Vec::new(),
			no_mask,
			offscreen: None,
			viewport: UVec2::ZERO,
		})
	}

	pub fn gl(&self) -> &glow::Context {
		&self.gl
	}

	/// Size of the default framebuffer, restored whenever the camera target is bound.
	pub fn resize(&mut self, w: u32, h: u32) {
		self.viewport = UVec2::new(w, h);
		unsafe { self.gl.viewport(0, 0, w as i32, h as i32) };
	}

	fn create_offscreen(&self, size: UVec2) -> Result<Offscreen, OpenglRendererError> {
		debug!("Allocating {}x{} mask target", size.x, size.y);
		let texture = Texture::empty(&self.gl, size)?;

		let gl = &self.gl;
		unsafe {
			let framebuffer = gl.create_framebuffer().map_err(OpenglRendererError::Opengl)?;
			gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
			gl.framebuffer_texture_2d(
				glow::FRAMEBUFFER,
				glow::COLOR_ATTACHMENT0,
				glow::TEXTURE_2D,
				Some(texture.raw()),
				0,
			);
			gl.bind_framebuffer(glow::FRAMEBUFFER, None);

			Ok(Offscreen {
				target: MaskTarget { framebuffer, size },
				texture,
			})
		}
	}

	fn delete_offscreen(&mut self) {
		if let Some(offscreen) = self.offscreen.take() {
			unsafe { self.gl.delete_framebuffer(offscreen.target.framebuffer) };
			offscreen.texture.delete(&self.gl);
		}
	}
}

impl Drop for OpenglContext {
	fn drop(&mut self) {
		self.delete_offscreen();
		for texture in &self.textures {
			texture.delete(&self.gl);
		}
		self.no_mask.delete(&self.gl);
		self.shader.delete(&self.gl);
	}
}

impl RenderContext for OpenglContext {
	type Mesh = GlMesh;
	type Target = MaskTarget;
	type Error = OpenglRendererError;

	fn create_material(&mut self, texture: &ShallowTexture) -> Result<MaterialId, Self::Error> {
		let material = MaterialId(self.textures.len() as u32);
		debug!(
			"Uploading {}x{} texture as material {}",
			texture.width(),
			texture.height(),
			material.0
		);

		self.textures.push(Texture::from_shallow_texture(&self.gl, texture)?);
		Ok(material)
	}

	fn create_mesh(&mut self) -> Result<Self::Mesh, Self::Error> {
		GlMesh::new(&self.gl)
	}

	fn release_mesh(&mut self, mesh: Self::Mesh) {
		mesh.delete(&self.gl);
	}

	fn upload_indices(&mut self, mesh: &Self::Mesh, indices: &[u32]) {
		mesh.upload_indices(&self.gl, indices);
	}

	fn upload_vertices(&mut self, mesh: &Self::Mesh, vertices: &[Vertex]) {
		mesh.upload_vertices(&self.gl, vertices);
	}

	fn temporary_target(&mut self, size: UVec2) -> Result<Self::Target, Self::Error> {
		match &self.offscreen {
			Some(offscreen) if offscreen.target.size == size => Ok(offscreen.target),
			_ => {
				self.delete_offscreen();
				let offscreen = self.create_offscreen(size)?;
				let target = offscreen.target;
				self.offscreen = Some(offscreen);
				Ok(target)
			}
		}
	}

	fn bind_target(&mut self, target: Option<&Self::Target>) {
		let (framebuffer, size) = match target {
			Some(target) => (Some(target.framebuffer), target.size),
			None => (None, self.viewport),
		};

		unsafe {
			self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer);
			self.gl.viewport(0, 0, size.x as i32, size.y as i32);
		}
	}

	fn clear(&mut self, color: Vec4) {
		unsafe {
			self.gl.clear_color(color.x, color.y, color.z, color.w);
			self.gl.clear(glow::COLOR_BUFFER_BIT);
		}
	}

	fn set_camera(&mut self, view_projection: glam::Mat4) {
		self.shader.bind(&self.gl);
		self.shader.set_camera(&self.gl, view_projection);
	}

	fn draw(&mut self, mesh: &Self::Mesh, material: MaterialId, uniforms: &DrawUniforms, mask: Option<&Self::Target>) {
		let Some(texture) = self.textures.get(material.0 as usize) else {
			return;
		};
		let mask_texture = mask
			.and_then(|mask| {
				self.offscreen
					.as_ref()
					.filter(|offscreen| offscreen.target == *mask)
			})
			.map_or(&self.no_mask, |offscreen| &offscreen.texture);

		let gl = &self.gl;
		self.shader.bind(gl);
		self.shader.set_model_matrix(gl, uniforms.model_matrix);
		self.shader.set_mask_inversed(gl, mask.is_some() && uniforms.inverse_mask);
		texture.bind_on(gl, MAIN_TEXTURE_SLOT);
		mask_texture.bind_on(gl, MASK_TEXTURE_SLOT);

		mesh.draw(gl);
	}
}
