use std::convert::Infallible;

use glam::{Mat4, UVec2, Vec4};

use crate::texture::ShallowTexture;

use super::{DrawUniforms, MaterialId, RenderContext, Vertex};

/// Handle to a mesh or render target of a [`RecordingContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordedHandle(pub usize);

#[derive(Clone, Debug, PartialEq)]
pub enum RenderCall {
	CreateMaterial {
		material: MaterialId,
		width: u32,
		height: u32,
	},
	CreateMesh(RecordedHandle),
	ReleaseMesh(RecordedHandle),
	UploadIndices {
		mesh: RecordedHandle,
		indices: Vec<u32>,
	},
	UploadVertices {
		mesh: RecordedHandle,
		vertices: Vec<Vertex>,
	},
	TemporaryTarget {
		target: RecordedHandle,
		size: UVec2,
	},
	/// `None` is the camera target.
	BindTarget(Option<RecordedHandle>),
	Clear(Vec4),
	SetCamera(Mat4),
	Draw {
		mesh: RecordedHandle,
		material: MaterialId,
		uniforms: DrawUniforms,
		mask: Option<RecordedHandle>,
	},
}

/// Headless [`RenderContext`] that records every call instead of touching a GPU.
///
/// Useful for tests and for inspecting what a frame would submit.
#[derive(Debug, Default)]
pub struct RecordingContext {
	calls: Vec<RenderCall>,
	next_material: u32,
	next_handle: usize,
}

impl RecordingContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn calls(&self) -> &[RenderCall] {
		&self.calls
	}

	/// Returns the calls recorded so far and starts over.
	pub fn take_calls(&mut self) -> Vec<RenderCall> {
		std::mem::take(&mut self.calls)
	}

	pub fn draw_count(&self) -> usize {
		self.calls
			.iter()
			.filter(|call| matches!(call, RenderCall::Draw { .. }))
			.count()
	}

	fn next_handle(&mut self) -> RecordedHandle {
		let handle = RecordedHandle(self.next_handle);
		self.next_handle += 1;
		handle
	}
}

impl RenderContext for RecordingContext {
	type Mesh = RecordedHandle;
	type Target = RecordedHandle;
	type Error = Infallible;

	fn create_material(&mut self, texture: &ShallowTexture) -> Result<MaterialId, Self::Error> {
		let material = MaterialId(self.next_material);
		self.next_material += 1;
		self.calls.push(RenderCall::CreateMaterial {
			material,
			width: texture.width(),
			height: texture.height(),
		});
		Ok(material)
	}

	fn create_mesh(&mut self) -> Result<Self::Mesh, Self::Error> {
		let mesh = self.next_handle();
		self.calls.push(RenderCall::CreateMesh(mesh));
		Ok(mesh)
	}

	fn release_mesh(&mut self, mesh: Self::Mesh) {
		self.calls.push(RenderCall::ReleaseMesh(mesh));
	}

	fn upload_indices(&mut self, mesh: &Self::Mesh, indices: &[u32]) {
		self.calls.push(RenderCall::UploadIndices {
			mesh: *mesh,
			indices: indices.to_vec(),
		});
	}

	fn upload_vertices(&mut self, mesh: &Self::Mesh, vertices: &[Vertex]) {
		self.calls.push(RenderCall::UploadVertices {
			mesh: *mesh,
			vertices: vertices.to_vec(),
		});
	}

	fn temporary_target(&mut self, size: UVec2) -> Result<Self::Target, Self::Error> {
		let target = self.next_handle();
		self.calls.push(RenderCall::TemporaryTarget { target, size });
		Ok(target)
	}

	fn bind_target(&mut self, target: Option<&Self::Target>) {
		self.calls.push(RenderCall::BindTarget(target.copied()));
	}

	fn clear(&mut self, color: Vec4) {
		self.calls.push(RenderCall::Clear(color));
	}

	fn set_camera(&mut self, view_projection: Mat4) {
		self.calls.push(RenderCall::SetCamera(view_projection));
	}

	fn draw(&mut self, mesh: &Self::Mesh, material: MaterialId, uniforms: &DrawUniforms, mask: Option<&Self::Target>) {
		self.calls.push(RenderCall::Draw {
			mesh: *mesh,
			material,
			uniforms: *uniforms,
			mask: mask.copied(),
		});
	}
}
