use glam::Mat4;
use glow::HasContext;
use tracing::debug;

#[derive(thiserror::Error, Debug)]
#[error("Could not compile shader: {0}")]
pub struct ShaderCompileError(String);

const PART_VERT: &str = include_str!("shaders/part.vert");
const PART_FRAG: &str = include_str!("shaders/part.frag");

/// Texture slot of the drawable's own texture.
pub(super) const MAIN_TEXTURE_SLOT: u32 = 0;
/// Texture slot of the mask target, or of a white texture when unmasked.
pub(super) const MASK_TEXTURE_SLOT: u32 = 1;

/// The one program every batch and mask batch is drawn with.
pub(super) struct PartShader {
	program: glow::Program,
	u_camera: Option<glow::UniformLocation>,
	u_model_matrix: Option<glow::UniformLocation>,
	u_mask_inversed: Option<glow::UniformLocation>,
}

impl PartShader {
	pub fn new(gl: &glow::Context) -> Result<Self, ShaderCompileError> {
		debug!("Compiling part shader");
		let program = compile(gl, PART_VERT, PART_FRAG)?;

		unsafe {
			gl.use_program(Some(program));
			let u_main = gl.get_uniform_location(program, "MainTexture");
			gl.uniform_1_i32(u_main.as_ref(), MAIN_TEXTURE_SLOT as i32);
			let u_mask = gl.get_uniform_location(program, "Live2DMaskTexture");
			gl.uniform_1_i32(u_mask.as_ref(), MASK_TEXTURE_SLOT as i32);

			Ok(Self {
				program,
				u_camera: gl.get_uniform_location(program, "Camera"),
				u_model_matrix: gl.get_uniform_location(program, "ModelMatrix"),
				u_mask_inversed: gl.get_uniform_location(program, "Live2DMaskTextureInversed"),
			})
		}
	}

	pub fn bind(&self, gl: &glow::Context) {
		unsafe { gl.use_program(Some(self.program)) };
	}

	/// Sets the `Camera` uniform. The shader must be bound.
	#[inline]
	pub fn set_camera(&self, gl: &glow::Context, camera: Mat4) {
		unsafe { gl.uniform_matrix_4_f32_slice(self.u_camera.as_ref(), false, camera.as_ref()) };
	}

	/// Sets the `ModelMatrix` uniform. The shader must be bound.
	#[inline]
	pub fn set_model_matrix(&self, gl: &glow::Context, model_matrix: Mat4) {
		unsafe { gl.uniform_matrix_4_f32_slice(self.u_model_matrix.as_ref(), false, model_matrix.as_ref()) };
	}

	/// Sets the `Live2DMaskTextureInversed` uniform. The shader must be bound.
	#[inline]
	pub fn set_mask_inversed(&self, gl: &glow::Context, inversed: bool) {
		unsafe { gl.uniform_1_i32(self.u_mask_inversed.as_ref(), inversed as i32) };
	}

	pub fn delete(&self, gl: &glow::Context) {
		unsafe { gl.delete_program(self.program) };
	}
}

/// Compiles a shader program composed of a vertex and fragment shader.
fn compile(gl: &glow::Context, vertex: &str, fragment: &str) -> Result<glow::Program, ShaderCompileError> {
	unsafe {
		let program = gl.create_program().map_err(ShaderCompileError)?;

		// Use GLSL ES 3.00 on WASM for WebGL
		#[cfg(target_arch = "wasm32")]
		let (vertex, fragment) = (
			&format!(
				"#version 300 es\nprecision highp float;\n{}",
				vertex.replace("#version 330", "")
			),
			&format!(
				"#version 300 es\nprecision highp float;\n{}",
				fragment.replace("#version 330", "")
			),
		);

		for (ty, source) in [(glow::VERTEX_SHADER, vertex), (glow::FRAGMENT_SHADER, fragment)] {
			let shader = gl.create_shader(ty).map_err(ShaderCompileError)?;
			gl.shader_source(shader, source);
			gl.compile_shader(shader);
			verify_shader(gl, shader)?;
			gl.attach_shader(program, shader);
			gl.delete_shader(shader);
		}

		gl.link_program(program);
		verify_program(gl, program)?;

		Ok(program)
	}
}

unsafe fn verify_shader(gl: &glow::Context, shader: glow::Shader) -> Result<(), ShaderCompileError> {
	if gl.get_shader_compile_status(shader) {
		Ok(())
	} else {
		Err(ShaderCompileError(gl.get_shader_info_log(shader)))
	}
}

unsafe fn verify_program(gl: &glow::Context, program: glow::Program) -> Result<(), ShaderCompileError> {
	if gl.get_program_link_status(program) {
		Ok(())
	} else {
		Err(ShaderCompileError(gl.get_program_info_log(program)))
	}
}
