use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use glam::{Mat4, Vec2};
use tracing::debug;

use crate::drawable::{Drawable, DrawableDesc, DrawableId, Drawables};
use crate::formats::moc::{Moc, MocError};
use crate::math::transform::Transform;
use crate::model::{Model, ModelLoadError};
use crate::params::{Param, Params};
use crate::physics::PhysicsController;

/// Canvas of a model, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasInfo {
	pub size: Vec2,
	pub origin: Vec2,
	pub pixels_per_unit: f32,
}

/// The deformation core of one model instance.
///
/// It owns the mesh deformation state behind the moc and recomputes the drawables from the parameters.
pub trait ModelCore {
	fn canvas_info(&self) -> CanvasInfo;

	/// Parameters in core order, at their default values.
	fn parameters(&self) -> Vec<Param>;

	/// Drawables in core order. Mask indices refer to this order.
	fn drawables(&self) -> Vec<DrawableDesc>;

	/// Clears the per-frame change bits before an update.
	fn reset_dynamic_flags(&mut self, drawables: &mut Drawables) {
		drawables.reset_dynamic_flags();
	}

	/// Deforms the drawables for the current parameter values, flagging what changed.
	fn update(&mut self, params: &Params, drawables: &mut Drawables);
}

/// Creates deformation cores from a moc.
pub trait MocLoader {
	fn instantiate(&self, moc: &Moc) -> Result<Box<dyn ModelCore>, MocError>;
}

impl<F> MocLoader for F
where
	F: Fn(&Moc) -> Result<Box<dyn ModelCore>, MocError>,
{
	fn instantiate(&self, moc: &Moc) -> Result<Box<dyn ModelCore>, MocError> {
		self(moc)
	}
}

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(0);
static NEXT_GENERATION: AtomicU32 = AtomicU32::new(0);

/// Identifies one load of one model instance. Changes on reload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceKey {
	id: u64,
	generation: u32,
}

/// A model placed in the world, with its own parameters, drawables and physics.
pub struct ModelInstance {
	id: u64,
	generation: u32,
	core: Box<dyn ModelCore>,
	canvas_size: Vec2,
	canvas_origin: Vec2,
	pixels_per_unit: f32,
	params: Params,
	drawables: Drawables,
	physics: Option<PhysicsController>,
	transform: Transform,
}

impl ModelInstance {
	pub fn new(model: &Model, loader: &impl MocLoader) -> Result<Self, ModelLoadError> {
		let loaded = Loaded::new(model, loader)?;
		let id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
		debug!(
			"Created model instance {id} with {} params and {} drawables",
			loaded.params.len(),
			loaded.drawables.len()
		);

		Ok(Self {
			id,
			generation: loaded.generation,
			core: loaded.core,
			canvas_size: loaded.canvas_size,
			canvas_origin: loaded.canvas_origin,
			pixels_per_unit: loaded.pixels_per_unit,
			params: loaded.params,
			drawables: loaded.drawables,
			physics: loaded.physics,
			transform: Transform::default(),
		})
	}

	/// Rebuilds the instance from `model`, keeping its identity and transform.
	///
	/// Handles into the previous parameters and drawables stop resolving, and renderers rebind on their next frame.
	/// On failure the instance is left as it was.
	pub fn reload(&mut self, model: &Model, loader: &impl MocLoader) -> Result<(), ModelLoadError> {
		let loaded = Loaded::new(model, loader)?;
		debug!("Reloaded model instance {} as generation {}", self.id, loaded.generation);

		self.generation = loaded.generation;
		self.core = loaded.core;
		self.canvas_size = loaded.canvas_size;
		self.canvas_origin = loaded.canvas_origin;
		self.pixels_per_unit = loaded.pixels_per_unit;
		self.params = loaded.params;
		self.drawables = loaded.drawables;
		self.physics = loaded.physics;
		Ok(())
	}

	/// Runs one frame: physics, then deformation of the drawables.
	pub fn update(&mut self, dt: f32) {
		if let Some(physics) = &mut self.physics {
			physics.update(&mut self.params, dt);
		}

		self.core.reset_dynamic_flags(&mut self.drawables);
		self.core.update(&self.params, &mut self.drawables);
	}

	/// Settles the physics for the current parameter values. See [`PhysicsController::stabilize`].
	pub fn stabilize_physics(&mut self) {
		if let Some(physics) = &mut self.physics {
			physics.stabilize(&mut self.params);
		}
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn generation(&self) -> u32 {
		self.generation
	}

	pub fn key(&self) -> InstanceKey {
		InstanceKey {
			id: self.id,
			generation: self.generation,
		}
	}

	/// Canvas size in units.
	pub fn canvas_size(&self) -> Vec2 {
		self.canvas_size
	}

	/// Canvas origin in units.
	pub fn canvas_origin(&self) -> Vec2 {
		self.canvas_origin
	}

	pub fn pixels_per_unit(&self) -> f32 {
		self.pixels_per_unit
	}

	pub fn params(&self) -> &Params {
		&self.params
	}

	pub fn params_mut(&mut self) -> &mut Params {
		&mut self.params
	}

	pub fn param(&self, id: &str) -> Option<&Param> {
		self.params.by_id(id)
	}

	pub fn param_mut(&mut self, id: &str) -> Option<&mut Param> {
		self.params.by_id_mut(id)
	}

	pub fn drawables(&self) -> &Drawables {
		&self.drawables
	}

	pub fn drawables_mut(&mut self) -> &mut Drawables {
		&mut self.drawables
	}

	pub fn drawable(&self, id: &str) -> Option<&Drawable> {
		self.drawables.find(id).and_then(|id| self.drawables.get(id))
	}

	pub fn drawable_mut(&mut self, id: &str) -> Option<&mut Drawable> {
		let id: DrawableId = self.drawables.find(id)?;
		self.drawables.get_mut(id)
	}

	pub fn physics(&self) -> Option<&PhysicsController> {
		self.physics.as_ref()
	}

	pub fn physics_mut(&mut self) -> Option<&mut PhysicsController> {
		self.physics.as_mut()
	}

	pub fn transform(&self) -> &Transform {
		&self.transform
	}

	pub fn set_transform(&mut self, transform: Transform) {
		self.transform = transform;
	}

	/// World matrix every batch of this instance is drawn with.
	pub fn model_matrix(&self) -> Mat4 {
		self.transform.to_matrix()
	}
}

/// Everything an instance rebuilds when it is (re)loaded.
struct Loaded {
	generation: u32,
	core: Box<dyn ModelCore>,
	canvas_size: Vec2,
	canvas_origin: Vec2,
	pixels_per_unit: f32,
	params: Params,
	drawables: Drawables,
	physics: Option<PhysicsController>,
}

impl Loaded {
	fn new(model: &Model, loader: &impl MocLoader) -> Result<Self, ModelLoadError> {
		let moc = model.moc().ok_or(ModelLoadError::NotLoaded)?;
		let core = loader.instantiate(moc)?;
		let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);

		let canvas = core.canvas_info();
		let pixels_per_unit = if canvas.pixels_per_unit > 0.0 {
			canvas.pixels_per_unit
		} else {
			1.0
		};

		let params = Params::new(generation, core.parameters());
		let drawables = Drawables::import(generation, core.drawables(), model.materials());

		let mut physics = model.physics_prototype().cloned();
		if let Some(physics) = &mut physics {
			physics.attach_to(Some(&params));
		}

		Ok(Self {
			generation,
			core,
			canvas_size: canvas.size / pixels_per_unit,
			canvas_origin: canvas.origin / pixels_per_unit,
			pixels_per_unit,
			params,
			drawables,
			physics,
		})
	}
}
