use std::fs;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use tracing::{debug, error};

use crate::formats::moc::{Moc, MocError};
use crate::formats::model3::{parse_model3, ModelJsonError};
use crate::formats::physics3::{parse_physics3, PhysicsJsonError};
use crate::physics::PhysicsController;
use crate::render::{MaterialId, RenderContext};
use crate::texture::{load_texture, DecodeTextureError, ShallowTexture};

bitflags! {
	#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
	pub struct LoadFlags: u8 {
		/// Skip the physics descriptor even if the model has one.
		const NO_PHYSICS = 1 << 0;
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
	#[error("Could not read {path:?}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("Invalid model descriptor")]
	ModelJson(
		#[from]
		#[source]
		ModelJsonError,
	),
	#[error("Invalid physics descriptor")]
	PhysicsJson(
		#[from]
		#[source]
		PhysicsJsonError,
	),
	#[error("Invalid moc")]
	Moc(
		#[from]
		#[source]
		MocError,
	),
	#[error("Could not load texture")]
	Texture(
		#[from]
		#[source]
		DecodeTextureError,
	),
	#[error("Could not create material")]
	Material(#[source] Box<dyn std::error::Error + Send + Sync>),
	#[error("Model is not loaded")]
	NotLoaded,
}

fn read_file(path: &Path) -> Result<Vec<u8>, ModelLoadError> {
	fs::read(path).map_err(|source| ModelLoadError::Io {
		path: path.to_owned(),
		source,
	})
}

fn read_text(path: &Path) -> Result<String, ModelLoadError> {
	fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
		path: path.to_owned(),
		source,
	})
}

/// Shared resources of a model: the moc, its textures and their materials, and the physics prototype.
///
/// Any number of [`ModelInstance`](crate::instance::ModelInstance)s can be created from one model.
#[derive(Clone, Debug, Default)]
pub struct Model {
	moc: Option<Moc>,
	textures: Vec<ShallowTexture>,
	materials: Vec<MaterialId>,
	physics: Option<PhysicsController>,
}

impl Model {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a model from already loaded parts, creating one material per texture.
	pub fn from_parts<C: RenderContext>(
		ctx: &mut C,
		moc: Moc,
		textures: Vec<ShallowTexture>,
		physics: Option<PhysicsController>,
	) -> Result<Self, ModelLoadError> {
		let materials = textures
			.iter()
			.map(|texture| ctx.create_material(texture))
			.collect::<Result<Vec<_>, _>>()
			.map_err(|e| ModelLoadError::Material(Box::new(e)))?;
		debug!("Created {} materials", materials.len());

		Ok(Self {
			moc: Some(moc),
			textures,
			materials,
			physics,
		})
	}

	/// Loads a `*.model3.json` and everything it refers to, replacing what was loaded before.
	///
	/// On failure the model is left unloaded.
	pub fn load<C: RenderContext>(
		&mut self,
		ctx: &mut C,
		path: impl AsRef<Path>,
		flags: LoadFlags,
	) -> Result<(), ModelLoadError> {
		let path = path.as_ref();
		self.unload();

		match Self::read(ctx, path, flags) {
			Ok(model) => {
				*self = model;
				Ok(())
			}
			Err(e) => {
				error!("Could not load model {}: {e}", path.display());
				Err(e)
			}
		}
	}

	fn read<C: RenderContext>(ctx: &mut C, path: &Path, flags: LoadFlags) -> Result<Self, ModelLoadError> {
		let root = path.parent().unwrap_or_else(|| Path::new(""));
		let refs = parse_model3(&read_text(path)?)?;

		let textures = refs
			.textures
			.iter()
			.map(|texture| load_texture(&root.join(texture)))
			.collect::<Result<Vec<_>, _>>()?;

		let physics = match &refs.physics {
			Some(physics) if !flags.contains(LoadFlags::NO_PHYSICS) => {
				Some(parse_physics3(&read_text(&root.join(physics))?)?)
			}
			_ => None,
		};

		let moc = Moc::parse(read_file(&root.join(&refs.moc))?)?;
		debug!(
			"Loaded moc v{} with {} textures from {}",
			moc.version(),
			textures.len(),
			path.display()
		);

		Self::from_parts(ctx, moc, textures, physics)
	}

	pub fn unload(&mut self) {
		*self = Self::default();
	}

	pub fn is_valid(&self) -> bool {
		self.moc.is_some()
	}

	pub fn moc(&self) -> Option<&Moc> {
		self.moc.as_ref()
	}

	pub fn textures(&self) -> &[ShallowTexture] {
		&self.textures
	}

	/// One material per texture, in texture order.
	pub fn materials(&self) -> &[MaterialId] {
		&self.materials
	}

	/// Physics every new instance starts from a copy of.
	pub fn physics_prototype(&self) -> Option<&PhysicsController> {
		self.physics.as_ref()
	}
}
