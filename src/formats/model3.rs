use super::json::{JsonError, JsonObject};

pub type ModelJsonResult<T> = Result<T, ModelJsonError>;

#[derive(Debug, thiserror::Error)]
pub enum ModelJsonError {
	#[error("Could not parse model descriptor: {0}")]
	Syntax(#[from] json::Error),
	#[error(transparent)]
	JsonError(#[from] JsonError),
}

/// Files a `*.model3.json` model descriptor refers to, relative to its own directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileReferences {
	pub moc: String,
	pub textures: Vec<String>,
	pub physics: Option<String>,
}

pub fn parse_model3(text: &str) -> ModelJsonResult<FileReferences> {
	let root = json::parse(text)?;
	let root = JsonObject::from_value("root", &root)?;

	deserialize_file_references(root.get_object("FileReferences")?)
		.map_err(|e| ModelJsonError::JsonError(e.nested("FileReferences")))
}

fn deserialize_file_references(obj: JsonObject) -> Result<FileReferences, JsonError> {
	let textures = obj
		.get_list("Textures")?
		.iter()
		.enumerate()
		.map(|(i, val)| match val.as_str() {
			Some(path) => Ok(path.to_owned()),
			None => Err(JsonError::ValueIsNotString(i.to_string()).nested("Textures")),
		})
		.collect::<Result<_, _>>()?;

	let physics = if obj.contains("Physics") {
		Some(obj.get_str("Physics")?.to_owned())
	} else {
		None
	};

	Ok(FileReferences {
		moc: obj.get_str("Moc")?.to_owned(),
		textures,
		physics,
	})
}
