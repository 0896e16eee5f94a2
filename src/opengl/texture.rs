use glam::UVec2;
use glow::HasContext;

use crate::texture::ShallowTexture;

use super::OpenglRendererError;

pub struct Texture {
	tex: glow::Texture,
}

impl Texture {
	pub fn from_shallow_texture(gl: &glow::Context, shalltex: &ShallowTexture) -> Result<Self, OpenglRendererError> {
		Self::from_raw_pixels(gl, shalltex.pixels(), shalltex.width(), shalltex.height())
	}

	/// Uploads RGBA8 pixels.
	pub fn from_raw_pixels(
		gl: &glow::Context,
		pixels: &[u8],
		width: u32,
		height: u32,
	) -> Result<Self, OpenglRendererError> {
		let tex = unsafe { gl.create_texture().map_err(OpenglRendererError::Opengl)? };
		unsafe {
			gl.bind_texture(glow::TEXTURE_2D, Some(tex));
			set_filtering(gl);
			gl.tex_image_2d(
				glow::TEXTURE_2D,
				0,
				glow::RGBA8 as i32,
				width as i32,
				height as i32,
				0,
				glow::RGBA,
				glow::UNSIGNED_BYTE,
				Some(pixels),
			);
			gl.bind_texture(glow::TEXTURE_2D, None);
		}

		Ok(Texture { tex })
	}

	/// An uninitialized RGBA8 texture to render into.
	pub fn empty(gl: &glow::Context, size: UVec2) -> Result<Self, OpenglRendererError> {
		let tex = unsafe { gl.create_texture().map_err(OpenglRendererError::Opengl)? };
		unsafe {
			gl.bind_texture(glow::TEXTURE_2D, Some(tex));
			gl.tex_image_2d(
				glow::TEXTURE_2D,
				0,
				glow::RGBA8 as i32,
				size.x as i32,
				size.y as i32,
				0,
				glow::RGBA,
				glow::UNSIGNED_BYTE,
				None,
			);
			set_filtering(gl);
			gl.bind_texture(glow::TEXTURE_2D, None);
		}

		Ok(Texture { tex })
	}

	pub fn raw(&self) -> glow::Texture {
		self.tex
	}

	pub fn bind_on(&self, gl: &glow::Context, slot: u32) {
		unsafe {
			gl.active_texture(glow::TEXTURE0 + slot);
			gl.bind_texture(glow::TEXTURE_2D, Some(self.tex));
		}
	}

	pub fn delete(&self, gl: &glow::Context) {
		unsafe { gl.delete_texture(self.tex) };
	}
}

unsafe fn set_filtering(gl: &glow::Context) {
	gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
	gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
	gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
	gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
}
