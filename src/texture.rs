use std::path::Path;

use image::{ImageBuffer, ImageError, Rgba};

/// Decoded RGBA8 pixels, ready to be handed to a [`RenderContext`](crate::render::RenderContext).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShallowTexture {
	pixels: Vec<u8>,
	width: u32,
	height: u32,
}

impl ShallowTexture {
	/// Wraps raw RGBA8 pixels. Returns `None` if their count does not match the size.
	pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32) -> Option<Self> {
		(pixels.len() == width as usize * height as usize * 4).then_some(Self { pixels, width, height })
	}

	pub fn pixels(&self) -> &[u8] {
		&self.pixels
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}
}

impl From<ImageBuffer<Rgba<u8>, Vec<u8>>> for ShallowTexture {
	fn from(value: ImageBuffer<Rgba<u8>, Vec<u8>>) -> Self {
		Self {
			width: value.width(),
			height: value.height(),
			pixels: value.into_raw(),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeTextureError {
	#[error("Could not read texture {path:?}")]
	Io {
		path: String,
		#[source]
		source: std::io::Error,
	},
	#[error("Could not decode texture")]
	ImageDecode(
		#[from]
		#[source]
		ImageError,
	),
}

/// Decodes an encoded image, guessing the format from its content.
pub fn decode_texture(data: &[u8]) -> Result<ShallowTexture, DecodeTextureError> {
	let img_buf = image::load_from_memory(data)?;
	Ok(ShallowTexture::from(img_buf.into_rgba8()))
}

pub fn load_texture(path: &Path) -> Result<ShallowTexture, DecodeTextureError> {
	let data = std::fs::read(path).map_err(|source| DecodeTextureError::Io {
		path: path.display().to_string(),
		source,
	})?;
	decode_texture(&data)
}
