use glam::Vec2;

use super::pendulum::{direction_to_radian, gravity_from_rotation, PendulumNode};
use super::{
	NormalizationParams, PhysicsInput, PhysicsOutput, PhysicsParamType, AIR_RESISTANCE, MAX_WEIGHT, REST_SNAP_RATIO,
};
use crate::params::{ParamHandle, Params};

/// A single pendulum chain with parameters as inputs and outputs.
///
/// `nodes[0]` is the anchor, positioned from the X/Y inputs every update and never integrated.
#[derive(Clone, Debug)]
pub struct PhysicsGroup {
	id: String,
	position_normalization: NormalizationParams,
	angle_normalization: NormalizationParams,
	nodes: Vec<PendulumNode>,
	inputs: Vec<PhysicsInput>,
	outputs: Vec<PhysicsOutput>,
	input_params: Vec<Option<ParamHandle>>,
	output_params: Vec<Option<ParamHandle>>,
	prev_gravity: Vec2,
	delta_rotation: f32,
}

impl PhysicsGroup {
	pub fn new(
		id: impl Into<String>,
		position_normalization: NormalizationParams,
		angle_normalization: NormalizationParams,
		nodes: Vec<PendulumNode>,
		inputs: Vec<PhysicsInput>,
		outputs: Vec<PhysicsOutput>,
	) -> Self {
		Self {
			id: id.into(),
			position_normalization,
			angle_normalization,
			nodes,
			inputs,
			outputs,
			input_params: Vec::new(),
			output_params: Vec::new(),
			prev_gravity: Vec2::Y,
			delta_rotation: 0.0,
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn position_normalization(&self) -> NormalizationParams {
		self.position_normalization
	}

	pub fn angle_normalization(&self) -> NormalizationParams {
		self.angle_normalization
	}

	pub fn nodes(&self) -> &[PendulumNode] {
		&self.nodes
	}

	pub fn nodes_mut(&mut self) -> &mut [PendulumNode] {
		&mut self.nodes
	}

	pub fn inputs(&self) -> &[PhysicsInput] {
		&self.inputs
	}

	pub fn outputs(&self) -> &[PhysicsOutput] {
		&self.outputs
	}

	pub fn prev_gravity(&self) -> Vec2 {
		self.prev_gravity
	}

	/// Damped change of the gravity direction during the last update, in radians.
	///
	/// Integration blends the previous and current gravity directly and does not read this value.
	pub fn delta_rotation(&self) -> f32 {
		self.delta_rotation
	}

	pub fn is_attached(&self) -> bool {
		self.input_params.iter().chain(&self.output_params).any(Option::is_some)
	}

	/// Resolves input and output parameter ids against `params`. `None` clears all bindings.
	///
	/// Ids that do not resolve stay unbound and are skipped by every update.
	pub fn attach_to(&mut self, params: Option<&Params>) {
		self.input_params.clear();
		self.output_params.clear();

		let Some(params) = params else {
			return;
		};

		self.input_params
			.extend(self.inputs.iter().map(|input| params.find(&input.param_id)));
		self.output_params
			.extend(self.outputs.iter().map(|output| params.find(&output.param_id)));
	}

	/// Advances the chain by `dt` seconds and writes the bound outputs.
	pub fn update(&mut self, params: &mut Params, dt: f32) {
		if self.nodes.is_empty() {
			return;
		}

		let (rotation, anchor) = self.read_input_state(params);
		self.nodes[0].position = anchor;

		let gravity = gravity_from_rotation(rotation);
		self.delta_rotation = direction_to_radian(self.prev_gravity, gravity) / AIR_RESISTANCE;

		let snap_threshold = REST_SNAP_RATIO * self.position_normalization.max;
		for i in 1..self.nodes.len() {
			let parent = self.nodes[i - 1].position;
			self.nodes[i].integrate(parent, self.prev_gravity, gravity, dt, snap_threshold);
		}

		self.prev_gravity = gravity;
		self.write_output_state(params);
	}

	/// Puts the chain at rest for the current inputs.
	///
	/// Every simulated node hangs at its radius below its parent along the current gravity direction with zero
	/// velocity, so forces cancel and nothing moves until an input changes. Useful after a discontinuous jump of
	/// the input parameters.
	pub fn stabilize(&mut self, params: &mut Params) {
		if self.nodes.is_empty() {
			return;
		}

		let (rotation, anchor) = self.read_input_state(params);
		let gravity = gravity_from_rotation(rotation);

		self.nodes[0].position = anchor;
		self.nodes[0].velocity = Vec2::ZERO;
		for i in 1..self.nodes.len() {
			let parent = self.nodes[i - 1].position;
			self.nodes[i].hang(parent, gravity);
		}

		self.prev_gravity = gravity;
		self.delta_rotation = 0.0;
		self.write_output_state(params);
	}

	/// Accumulates weighted inputs into a rotation in degrees and an anchor position.
	fn read_input_state(&self, params: &Params) -> (f32, Vec2) {
		let mut rotation = 0.0;
		let mut position = Vec2::ZERO;

		for (input, handle) in self.inputs.iter().zip(&self.input_params) {
			let Some(param) = handle.and_then(|h| params.get(h)) else {
				continue;
			};

			let sign = if input.reflect { -1.0 } else { 1.0 };
			let factor = sign * input.weight / MAX_WEIGHT;

			match input.ty {
				PhysicsParamType::Angle => rotation += self.angle_normalization.normalize(param) * factor,
				PhysicsParamType::X => position.x += self.position_normalization.normalize(param) * factor,
				PhysicsParamType::Y => position.y += self.position_normalization.normalize(param) * factor,
			}
		}

		(rotation, position)
	}

	fn write_output_state(&self, params: &mut Params) {
		for (output, &handle) in self.outputs.iter().zip(&self.output_params) {
			let idx = output.node_index;
			if idx < 1 || idx >= self.nodes.len() {
				continue;
			}

			let Some(param) = handle.and_then(|h| params.get_mut(h)) else {
				continue;
			};

			let translation = self.nodes[idx].position - self.nodes[idx - 1].position;

			let mut value = match output.ty {
				PhysicsParamType::Angle => {
					let parent = if idx >= 2 {
						self.nodes[idx - 1].position - self.nodes[idx - 2].position
					} else {
						Vec2::Y
					};
					-direction_to_radian(parent, translation)
				}
				PhysicsParamType::X => translation.x,
				PhysicsParamType::Y => translation.y,
			};

			if output.reflect {
				value = -value;
			}
			value *= output.scale;
			value *= output.weight / MAX_WEIGHT;

			param.set_value(value);
		}
	}
}
