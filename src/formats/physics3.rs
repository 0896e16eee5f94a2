use json::JsonValue;
use tracing::warn;

use crate::physics::{
	NormalizationParams, PendulumNode, PhysicsController, PhysicsGroup, PhysicsInput, PhysicsOutput, PhysicsParamType,
};

use super::json::{JsonError, JsonObject};

pub type PhysicsJsonResult<T> = Result<T, PhysicsJsonError>;

#[derive(Debug, thiserror::Error)]
pub enum PhysicsJsonError {
	#[error("Could not parse physics descriptor: {0}")]
	Syntax(#[from] json::Error),
	#[error(transparent)]
	JsonError(#[from] JsonError),
	#[error("Physics group {group:?} has no vertices")]
	NoVertices { group: String },
}

impl PhysicsJsonError {
	fn nested(self, key: &str) -> Self {
		match self {
			PhysicsJsonError::JsonError(err) => PhysicsJsonError::JsonError(err.nested(key)),
			_ => self,
		}
	}

	fn in_list(self, index: usize) -> Self {
		match self {
			PhysicsJsonError::JsonError(err) => PhysicsJsonError::JsonError(err.in_list(index)),
			_ => self,
		}
	}
}

fn vals<T>(key: &str, res: PhysicsJsonResult<T>) -> PhysicsJsonResult<T> {
	res.map_err(|e| e.nested(key))
}

/// Parses every entry of a list with `f`, tagging errors with their index.
fn list_of<'file, T>(
	list: &'file [JsonValue],
	mut f: impl FnMut(JsonObject<'file>) -> PhysicsJsonResult<T>,
) -> PhysicsJsonResult<Vec<T>> {
	list.iter()
		.enumerate()
		.map(|(i, val)| {
			JsonObject::from_value(&i.to_string(), val)
				.map_err(PhysicsJsonError::from)
				.and_then(&mut f)
				.map_err(|e| e.in_list(i))
		})
		.collect()
}

/// Parses a `*.physics3.json` physics descriptor into a controller prototype.
pub fn parse_physics3(text: &str) -> PhysicsJsonResult<PhysicsController> {
	let root = json::parse(text)?;
	let root = JsonObject::from_value("root", &root)?;

	let settings = root.get_list("PhysicsSettings")?;
	let groups = vals("PhysicsSettings", list_of(settings, deserialize_group))?;

	Ok(PhysicsController::new(groups))
}

fn deserialize_group(obj: JsonObject) -> PhysicsJsonResult<PhysicsGroup> {
	let id = obj.get_str("Id")?.to_owned();

	let normalization = obj.get_object("Normalization")?;
	let position_normalization = vals(
		"Normalization",
		vals("Position", deserialize_normalization(normalization.get_object("Position")?)),
	)?;
	let angle_normalization = vals(
		"Normalization",
		vals("Angle", deserialize_normalization(normalization.get_object("Angle")?)),
	)?;

	let nodes = vals("Vertices", list_of(obj.get_list("Vertices")?, deserialize_node))?;
	if nodes.is_empty() {
		return Err(PhysicsJsonError::NoVertices { group: id });
	}

	let inputs = vals("Input", list_of(obj.get_list("Input")?, deserialize_input))?
		.into_iter()
		.flatten()
		.collect();
	let outputs = vals("Output", list_of(obj.get_list("Output")?, deserialize_output))?
		.into_iter()
		.flatten()
		.collect();

	Ok(PhysicsGroup::new(
		id,
		position_normalization,
		angle_normalization,
		nodes,
		inputs,
		outputs,
	))
}

fn deserialize_normalization(obj: JsonObject) -> PhysicsJsonResult<NormalizationParams> {
	Ok(NormalizationParams {
		min: obj.get_f32("Minimum")?,
		max: obj.get_f32("Maximum")?,
		base: obj.get_f32("Default")?,
	})
}

fn deserialize_node(obj: JsonObject) -> PhysicsJsonResult<PendulumNode> {
	Ok(PendulumNode::new(
		obj.get_xy("Position")?,
		obj.get_f32("Mobility")?,
		obj.get_f32("Delay")?,
		obj.get_f32("Acceleration")?,
		obj.get_f32("Radius")?,
	))
}

fn deserialize_param_type(ty: &str) -> Option<PhysicsParamType> {
	match ty {
		"X" => Some(PhysicsParamType::X),
		"Y" => Some(PhysicsParamType::Y),
		"Angle" => Some(PhysicsParamType::Angle),
		_ => None,
	}
}

/// Reads the parameter id of a `{"Target": "Parameter", "Id": ..}` reference. Other targets are unsupported.
fn deserialize_target(obj: JsonObject) -> PhysicsJsonResult<Option<String>> {
	let target = obj.get_str("Target")?;
	if target != "Parameter" {
		return Ok(None);
	}
	Ok(Some(obj.get_str("Id")?.to_owned()))
}

fn deserialize_input(obj: JsonObject) -> PhysicsJsonResult<Option<PhysicsInput>> {
	let Some(param_id) = vals("Source", deserialize_target(obj.get_object("Source")?))? else {
		return Ok(None);
	};

	let ty = obj.get_str("Type")?;
	let Some(ty) = deserialize_param_type(ty) else {
		warn!("Physics input {param_id:?} has unknown type {ty:?}, skipping");
		return Ok(None);
	};

	Ok(Some(PhysicsInput {
		param_id,
		ty,
		weight: obj.get_f32("Weight")?,
		reflect: obj.get_bool("Reflect")?,
	}))
}

fn deserialize_output(obj: JsonObject) -> PhysicsJsonResult<Option<PhysicsOutput>> {
	let Some(param_id) = vals("Destination", deserialize_target(obj.get_object("Destination")?))? else {
		return Ok(None);
	};

	let ty = obj.get_str("Type")?;
	let Some(ty) = deserialize_param_type(ty) else {
		warn!("Physics output {param_id:?} has unknown type {ty:?}, skipping");
		return Ok(None);
	};

	Ok(Some(PhysicsOutput {
		param_id,
		ty,
		node_index: obj.get_u32("VertexIndex")? as usize,
		weight: obj.get_f32("Weight")?,
		scale: obj.get_f32("Scale")?,
		reflect: obj.get_bool("Reflect")?,
	}))
}

#[cfg(test)]
pub(crate) mod tests {
	use glam::vec2;

	use super::*;

	pub(crate) const HAIR_PHYSICS: &str = r#"{
		"Version": 3,
		"Meta": { "PhysicsSettingCount": 1 },
		"PhysicsSettings": [
			{
				"Id": "PhysicsSetting1",
				"Input": [
					{ "Source": { "Target": "Parameter", "Id": "ParamAngleX" }, "Weight": 60, "Type": "X", "Reflect": false },
					{ "Source": { "Target": "Parameter", "Id": "ParamAngleZ" }, "Weight": 60, "Type": "Angle", "Reflect": true },
					{ "Source": { "Target": "Part", "Id": "PartHair" }, "Weight": 100, "Type": "X", "Reflect": false }
				],
				"Output": [
					{ "Destination": { "Target": "Parameter", "Id": "ParamHairFront" }, "VertexIndex": 1, "Scale": 1.522, "Weight": 100, "Type": "Angle", "Reflect": false },
					{ "Destination": { "Target": "Parameter", "Id": "ParamHairSide" }, "VertexIndex": 1, "Scale": 1, "Weight": 100, "Type": "Wobble", "Reflect": false }
				],
				"Vertices": [
					{ "Position": { "X": 0, "Y": 0 }, "Mobility": 1, "Delay": 1, "Acceleration": 1, "Radius": 0 },
					{ "Position": { "X": 0, "Y": 3 }, "Mobility": 0.95, "Delay": 0.9, "Acceleration": 1.5, "Radius": 3 }
				],
				"Normalization": {
					"Position": { "Minimum": -10, "Default": 0, "Maximum": 10 },
					"Angle": { "Minimum": -10, "Default": 0, "Maximum": 10 }
				}
			}
		]
	}"#;

	#[test]
	fn parses_groups_and_skips_unsupported_bindings() {
		let controller = parse_physics3(HAIR_PHYSICS).unwrap();
		let [group] = controller.groups() else {
			panic!("expected one group");
		};

		assert_eq!(group.id(), "PhysicsSetting1");
		assert_eq!(
			group.position_normalization(),
			NormalizationParams {
				min: -10.0,
				max: 10.0,
				base: 0.0
			}
		);

		assert_eq!(group.nodes().len(), 2);
		assert_eq!(group.nodes()[1].position, vec2(0.0, 3.0));
		assert!((group.nodes()[1].delay - 0.9).abs() < 1e-6);

		assert_eq!(
			group.inputs(),
			&[
				PhysicsInput {
					param_id: "ParamAngleX".to_owned(),
					ty: PhysicsParamType::X,
					weight: 60.0,
					reflect: false,
				},
				PhysicsInput {
					param_id: "ParamAngleZ".to_owned(),
					ty: PhysicsParamType::Angle,
					weight: 60.0,
					reflect: true,
				},
			]
		);

		let [output] = group.outputs() else {
			panic!("expected one output");
		};
		assert_eq!(output.param_id, "ParamHairFront");
		assert_eq!(output.node_index, 1);
		assert!((output.scale - 1.522).abs() < 1e-6);
	}

	#[test]
	fn errors_point_at_the_broken_value() {
		let text = HAIR_PHYSICS.replace(r#""Mobility": 0.95"#, r#""Mobility": "fast""#);
		let err = parse_physics3(&text).unwrap_err();

		let PhysicsJsonError::JsonError(err) = err else {
			panic!("expected a json error, got {err:?}");
		};
		assert_eq!(
			err,
			JsonError::ValueIsNotNumber("Mobility".to_owned())
				.in_list(1)
				.nested("Vertices")
				.in_list(0)
				.nested("PhysicsSettings")
		);
	}

	#[test]
	fn malformed_text_is_a_syntax_error() {
		assert!(matches!(parse_physics3("{ nope"), Err(PhysicsJsonError::Syntax(_))));
	}
}
