//! Batched rendering of model instances.
//!
//! The crate follows a "bring your own rendering backend" design: a backend implements [`RenderContext`], and a
//! [`Renderer`] groups the drawables of one [`ModelInstance`] into as few draw calls as materials and masks allow,
//! then dispatches them to the context every frame.

mod batch;
mod policy;
mod recording;
mod vertex_buffers;

use glam::{Mat4, UVec2, Vec4};
use tracing::{debug, error, trace};

use crate::drawable::{ConstantFlags, Drawable, DynamicFlags};
use crate::instance::{InstanceKey, ModelInstance};
use crate::math::camera::Camera;
use crate::texture::ShallowTexture;

pub use batch::{partition, Batch};
pub use policy::{BatchPolicy, DefaultBatchPolicy};
pub use recording::{RecordedHandle, RecordingContext, RenderCall};
pub use vertex_buffers::{pack_color, Vertex, VertexBuffers};

/// Material created by a [`RenderContext`] for one model texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// Per draw call shader parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawUniforms {
	pub model_matrix: Mat4,
	/// The mask texture cuts the drawable out instead of in.
	pub inverse_mask: bool,
}

/// Changes that make a batch's vertex buffer stale.
const CONTENT_CHANGED: DynamicFlags = DynamicFlags::VISIBILITY_DID_CHANGE
	.union(DynamicFlags::OPACITY_DID_CHANGE)
	.union(DynamicFlags::VERTEX_POSITIONS_DID_CHANGE)
	.union(DynamicFlags::BLEND_COLOR_DID_CHANGE);

/// Masks are drawn untinted, so color changes do not concern them.
const MASK_CONTENT_CHANGED: DynamicFlags = DynamicFlags::VISIBILITY_DID_CHANGE
	.union(DynamicFlags::OPACITY_DID_CHANGE)
	.union(DynamicFlags::VERTEX_POSITIONS_DID_CHANGE);

/// A rendering backend.
///
/// Meshes and render targets are owned by the backend and referred to by handles.
/// Every call happens between frames of the host application, on the thread owning the context.
pub trait RenderContext {
	type Mesh;
	type Target;
	type Error: std::error::Error + Send + Sync + 'static;

	/// Uploads a model texture and creates the material drawables using it render with.
	fn create_material(&mut self, texture: &ShallowTexture) -> Result<MaterialId, Self::Error>;

	fn create_mesh(&mut self) -> Result<Self::Mesh, Self::Error>;
	fn release_mesh(&mut self, mesh: Self::Mesh);
	fn upload_indices(&mut self, mesh: &Self::Mesh, indices: &[u32]);
	fn upload_vertices(&mut self, mesh: &Self::Mesh, vertices: &[Vertex]);

	/// Offscreen target masks are drawn into. It may be reused across calls and frames.
	fn temporary_target(&mut self, size: UVec2) -> Result<Self::Target, Self::Error>;
	/// Makes `target` the active target. `None` is the camera's target.
	fn bind_target(&mut self, target: Option<&Self::Target>);
	fn clear(&mut self, color: Vec4);

	fn set_camera(&mut self, view_projection: Mat4);
	/// Draws `mesh` with `material`. Without a mask texture the drawable is fully unmasked.
	fn draw(&mut self, mesh: &Self::Mesh, material: MaterialId, uniforms: &DrawUniforms, mask: Option<&Self::Target>);
}

/// Keeps the draw calls of one model instance up to date and issues them.
///
/// Per frame, after the instance has been updated: [`begin_frame`](Self::begin_frame),
/// [`end_frame`](Self::end_frame), then [`render`](Self::render) for every camera.
pub struct Renderer<C: RenderContext, P = DefaultBatchPolicy> {
	policy: P,
	bound: Option<InstanceKey>,
	/// Store indices of the bound instance's drawables, by render order.
	sorted: Vec<usize>,
	batches: Vec<Batch<C::Mesh>>,
	mask_batches: Vec<Vec<Batch<C::Mesh>>>,
}

impl<C: RenderContext> Renderer<C> {
	pub fn new() -> Self {
		Self::with_policy(DefaultBatchPolicy)
	}
}

impl<C: RenderContext> Default for Renderer<C> {
	fn default() -> Self {
		Self::new()
	}
}

impl<C: RenderContext, P: BatchPolicy> Renderer<C, P> {
	pub fn with_policy(policy: P) -> Self {
		Self {
			policy,
			bound: None,
			sorted: Vec::new(),
			batches: Vec::new(),
			mask_batches: Vec::new(),
		}
	}

	pub fn policy(&self) -> &P {
		&self.policy
	}

	/// Whether the batches were built for exactly this instance, and it has not been reloaded since.
	pub fn is_bound_to(&self, instance: &ModelInstance) -> bool {
		self.bound == Some(instance.key())
	}

	pub fn batches(&self) -> &[Batch<C::Mesh>] {
		&self.batches
	}

	/// Sub-batches of the masks drawn before a masked batch, see [`Batch::mask_id`].
	pub fn mask_batches(&self, mask_id: usize) -> &[Batch<C::Mesh>] {
		self.mask_batches.get(mask_id).map_or(&[], Vec::as_slice)
	}

	/// Binds the renderer to `instance`, building every batch from scratch if it was bound to anything else.
	pub fn begin_frame(&mut self, instance: &ModelInstance, ctx: &mut C) {
		if self.is_bound_to(instance) {
			return;
		}

		debug!(
			"Binding renderer to model instance {} ({} drawables)",
			instance.id(),
			instance.drawables().len()
		);
		self.bound = Some(instance.key());
		self.sorted = (0..instance.drawables().len()).collect();
		self.sort_drawables(instance.drawables().as_slice(), ctx);
		self.flush(ctx);
	}

	/// Brings the batches up to date with the changes the instance's last update flagged.
	///
	/// A render order change or a material that no longer matches its batch re-partitions everything.
	/// Otherwise only the vertex buffers of batches with changed content are rebuilt.
	pub fn end_frame(&mut self, instance: &ModelInstance, ctx: &mut C) {
		if !self.is_bound_to(instance) {
			return;
		}
		let drawables = instance.drawables().as_slice();

		if self.needs_rebuild(drawables) {
			debug!("Render order or materials changed, rebuilding batches");
			self.sort_drawables(drawables, ctx);
		} else {
			for batch in &mut self.batches {
				if batch
					.members(drawables)
					.any(|d| d.dynamic_flags().intersects(CONTENT_CHANGED))
				{
					batch.rebuild_vertices(drawables, false);
				}
			}

			for batch in self.mask_batches.iter_mut().flatten() {
				if batch
					.members(drawables)
					.any(|d| d.dynamic_flags().intersects(MASK_CONTENT_CHANGED))
				{
					batch.rebuild_vertices(drawables, true);
				}
			}
		}

		self.flush(ctx);
	}

	/// Whether the partition is stale: a drawable's render order changed, or its material differs from the first
	/// member of its batch.
	pub fn needs_rebuild(&self, drawables: &[Drawable]) -> bool {
		self.batches.iter().any(|batch| {
			let Some(first) = batch.first().and_then(|i| drawables.get(i)) else {
				return false;
			};

			batch.members(drawables).any(|d| {
				d.material() != first.material() || d.dynamic_flags().contains(DynamicFlags::RENDER_ORDER_DID_CHANGE)
			})
		})
	}

	/// Draws the bound instance into the camera's target.
	///
	/// Does nothing if the camera has no target, the renderer is not bound to `instance` or there is nothing to draw.
	pub fn render(&self, instance: &ModelInstance, camera: &Camera, ctx: &mut C) {
		let Some(target_size) = camera.target_size else {
			return;
		};
		if !self.is_bound_to(instance) || self.batches.is_empty() {
			return;
		}

		let drawables = instance.drawables().as_slice();
		let model_matrix = instance.model_matrix();

		ctx.bind_target(None);
		ctx.set_camera(camera.matrix(target_size.as_vec2()));

		let mut mask_target = None;
		for batch in &self.batches {
			let Some(mask_id) = batch.mask_id else {
				Self::draw_batch(ctx, batch, drawables, model_matrix, false, None);
				continue;
			};

			if mask_target.is_none() {
				match ctx.temporary_target(target_size) {
					Ok(target) => mask_target = Some(target),
					Err(e) => {
						error!("Could not allocate mask target: {e}");
						return;
					}
				}
			}
			let Some(target) = mask_target.as_ref() else {
				return;
			};

			ctx.bind_target(Some(target));
			ctx.clear(Vec4::ZERO);
			for mask_batch in self.mask_batches(mask_id) {
				Self::draw_batch(ctx, mask_batch, drawables, model_matrix, false, None);
			}

			ctx.bind_target(None);
			let inverse_mask = batch
				.first()
				.and_then(|i| drawables.get(i))
				.map_or(false, |d| d.constant_flags().contains(ConstantFlags::IS_INVERTED_MASK));
			Self::draw_batch(ctx, batch, drawables, model_matrix, inverse_mask, Some(target));
		}
	}

	fn draw_batch(
		ctx: &mut C,
		batch: &Batch<C::Mesh>,
		drawables: &[Drawable],
		model_matrix: Mat4,
		inverse_mask: bool,
		mask: Option<&C::Target>,
	) {
		let Some(mesh) = batch.mesh.as_ref() else {
			return;
		};
		let Some(first) = batch.first().and_then(|i| drawables.get(i)) else {
			return;
		};

		let uniforms = DrawUniforms {
			model_matrix,
			inverse_mask,
		};
		ctx.draw(mesh, first.material(), &uniforms, mask);
	}

	/// Stable sort by render order, then a full rebuild.
	fn sort_drawables(&mut self, drawables: &[Drawable], ctx: &mut C) {
		self.sorted.retain(|&i| i < drawables.len());
		self.sorted.sort_by_key(|&i| drawables[i].render_order());

		self.build_batches(drawables, ctx);
	}

	fn build_batches(&mut self, drawables: &[Drawable], ctx: &mut C) {
		for batch in self.batches.drain(..).chain(self.mask_batches.drain(..).flatten()) {
			if let Some(mesh) = batch.mesh {
				ctx.release_mesh(mesh);
			}
		}

		for run in partition(&self.policy, drawables, self.sorted.iter().copied(), false) {
			let opener = &drawables[run[0]];

			let mask_id = if opener.mask_count() != 0 {
				let masks = opener.masks().iter().copied();
				let mask_group = partition(&self.policy, drawables, masks, true)
					.into_iter()
					.map(|run| Batch::new(run, None))
					.collect();
				self.mask_batches.push(mask_group);
				Some(self.mask_batches.len() - 1)
			} else {
				None
			};

			self.batches.push(Batch::new(run, mask_id));
		}

		for batch in &mut self.batches {
			batch.rebuild_indices(drawables);
			batch.rebuild_vertices(drawables, false);
		}
		for batch in self.mask_batches.iter_mut().flatten() {
			batch.rebuild_indices(drawables);
			batch.rebuild_vertices(drawables, true);
		}

		debug!(
			"Built {} batches and {} mask batch groups",
			self.batches.len(),
			self.mask_batches.len()
		);
	}

	/// Uploads every buffer rebuilt since the last flush, creating meshes as needed.
	fn flush(&mut self, ctx: &mut C) {
		let mut refreshed = 0;

		for batch in self.batches.iter_mut().chain(self.mask_batches.iter_mut().flatten()) {
			if !batch.indices_dirty && !batch.vertices_dirty {
				continue;
			}

			if batch.mesh.is_none() {
				match ctx.create_mesh() {
					Ok(mesh) => batch.mesh = Some(mesh),
					Err(e) => {
						error!("Could not create batch mesh: {e}");
						continue;
					}
				}
			}
			let Some(mesh) = batch.mesh.as_ref() else {
				continue;
			};

			if batch.indices_dirty {
				ctx.upload_indices(mesh, &batch.buffers.indices);
				batch.indices_dirty = false;
			}
			if batch.vertices_dirty {
				ctx.upload_vertices(mesh, &batch.buffers.vertices);
				batch.vertices_dirty = false;
				refreshed += 1;
			}
		}

		if refreshed != 0 {
			trace!("Uploaded vertices of {refreshed} batches");
		}
	}
}

#[cfg(test)]
mod tests {
	use glam::uvec2;

	use super::*;
	use crate::drawable::tests::quad;
	use crate::drawable::DrawableDesc;
	use crate::formats::moc::{Moc, MocError};
	use crate::instance::tests::{new_instance, test_model, StaticCore};
	use crate::instance::ModelCore;

	fn setup(textures: usize, drawables: Vec<DrawableDesc>) -> (RecordingContext, ModelInstance) {
		let _ = tracing_subscriber::fmt().with_test_writer().try_init();

		let mut ctx = RecordingContext::new();
		let model = test_model(&mut ctx, textures, false);
		let instance = new_instance(
			&model,
			StaticCore {
				params: Vec::new(),
				drawables,
			},
		);
		ctx.take_calls();
		(ctx, instance)
	}

	fn camera() -> Camera {
		Camera::default().with_target_size(uvec2(640, 480))
	}

	fn frame(renderer: &mut Renderer<RecordingContext>, instance: &ModelInstance, ctx: &mut RecordingContext) {
		renderer.begin_frame(instance, ctx);
		renderer.end_frame(instance, ctx);
		renderer.render(instance, &camera(), ctx);
	}

	fn batch_ids(renderer: &Renderer<RecordingContext>, instance: &ModelInstance) -> Vec<Vec<String>> {
		let drawables = instance.drawables().as_slice();
		renderer
			.batches()
			.iter()
			.map(|batch| batch.drawables().iter().map(|&i| drawables[i].id().to_owned()).collect())
			.collect()
	}

	fn count(calls: &[RenderCall], pred: impl Fn(&RenderCall) -> bool) -> usize {
		calls.iter().filter(|call| pred(call)).count()
	}

	#[test]
	fn shared_material_is_one_draw_call() {
		let (mut ctx, instance) = setup(1, vec![quad("A", 0, 0, &[]), quad("B", 0, 1, &[])]);
		let mut renderer = Renderer::new();

		frame(&mut renderer, &instance, &mut ctx);

		assert_eq!(renderer.batches().len(), 1);
		assert_eq!(ctx.draw_count(), 1);

		// both quads land in one index buffer without overlapping vertex ranges
		assert_eq!(renderer.batches()[0].buffers().indices, [0, 1, 2, 2, 1, 3, 4, 5, 6, 6, 5, 7]);
		assert_eq!(renderer.batches()[0].buffers().vertices.len(), 8);
	}

	#[test]
	fn another_material_is_another_batch() {
		let (mut ctx, instance) = setup(
			2,
			vec![quad("A", 0, 0, &[]), quad("B", 0, 1, &[]), quad("C", 1, 2, &[])],
		);
		let mut renderer = Renderer::new();

		frame(&mut renderer, &instance, &mut ctx);

		assert_eq!(renderer.batches().len(), 2);
		assert_eq!(ctx.draw_count(), 2);

		let materials: Vec<MaterialId> = ctx
			.calls()
			.iter()
			.filter_map(|call| match call {
				RenderCall::Draw { material, .. } => Some(*material),
				_ => None,
			})
			.collect();
		assert_eq!(materials, [MaterialId(0), MaterialId(1)]);
	}

	#[test]
	fn masked_batch_draws_masks_offscreen_first() {
		let (mut ctx, instance) = setup(
			2,
			vec![quad("M0", 0, 0, &[]), quad("M1", 0, 1, &[]), quad("Masked", 1, 2, &[0, 1])],
		);
		let mut renderer = Renderer::new();

		renderer.begin_frame(&instance, &mut ctx);
		renderer.end_frame(&instance, &mut ctx);
		ctx.take_calls();
		renderer.render(&instance, &camera(), &mut ctx);

		assert_eq!(batch_ids(&renderer, &instance), [vec!["M0", "M1"], vec!["Masked"]]);
		let mask_id = renderer.batches()[1].mask_id().unwrap();
		assert_eq!(renderer.mask_batches(mask_id).len(), 1);
		assert_eq!(renderer.mask_batches(mask_id)[0].drawables(), &[0, 1]);

		// masks are drawn as plain silhouettes
		assert!(renderer.mask_batches(mask_id)[0]
			.buffers()
			.vertices
			.iter()
			.all(|v| v.multiply_color == u32::MAX));

		let calls = ctx.take_calls();
		assert_eq!(count(&calls, |c| matches!(c, RenderCall::Draw { .. })), 3);

		let main_mesh = *renderer.batches()[1].mesh().unwrap();
		let mask_mesh = *renderer.mask_batches(mask_id)[0].mesh().unwrap();
		let target = RecordedHandle(match calls[3] {
			RenderCall::TemporaryTarget { target, size } => {
				assert_eq!(size, uvec2(640, 480));
				target.0
			}
			ref other => panic!("expected a temporary target, got {other:?}"),
		});
		let uniforms = DrawUniforms {
			model_matrix: instance.model_matrix(),
			inverse_mask: false,
		};

		assert_eq!(calls[0], RenderCall::BindTarget(None));
		assert!(matches!(calls[1], RenderCall::SetCamera(_)));
		assert!(matches!(calls[2], RenderCall::Draw { mask: None, .. }));
		assert_eq!(
			calls[4..],
			[
				RenderCall::BindTarget(Some(target)),
				RenderCall::Clear(Vec4::ZERO),
				RenderCall::Draw {
					mesh: mask_mesh,
					material: MaterialId(0),
					uniforms,
					mask: None,
				},
				RenderCall::BindTarget(None),
				RenderCall::Draw {
					mesh: main_mesh,
					material: MaterialId(1),
					uniforms,
					mask: Some(target),
				},
			]
		);
	}

	#[test]
	fn inverted_masks_are_flagged() {
		let mut masked = quad("Masked", 0, 1, &[0]);
		masked.constant_flags = ConstantFlags::IS_INVERTED_MASK;
		let (mut ctx, instance) = setup(1, vec![quad("Mask", 0, 0, &[]), masked]);
		let mut renderer = Renderer::new();

		frame(&mut renderer, &instance, &mut ctx);

		let inverse: Vec<bool> = ctx
			.calls()
			.iter()
			.filter_map(|call| match call {
				RenderCall::Draw { uniforms, mask, .. } => Some(uniforms.inverse_mask && mask.is_some()),
				_ => None,
			})
			.collect();
		assert_eq!(inverse, [false, false, true]);
	}

	#[test]
	fn masks_in_two_materials_are_two_sub_batches() {
		let (mut ctx, instance) = setup(
			3,
			vec![
				quad("M0", 0, 0, &[]),
				quad("M1", 1, 1, &[]),
				quad("Masked", 2, 2, &[0, 1]),
				quad("Plain", 2, 3, &[]),
			],
		);
		let mut renderer = Renderer::new();

		renderer.begin_frame(&instance, &mut ctx);
		renderer.end_frame(&instance, &mut ctx);
		ctx.take_calls();
		renderer.render(&instance, &camera(), &mut ctx);

		assert_eq!(
			batch_ids(&renderer, &instance),
			[vec!["M0"], vec!["M1"], vec!["Masked"], vec!["Plain"]]
		);
		let mask_id = renderer.batches()[2].mask_id().unwrap();
		let group = renderer.mask_batches(mask_id);
		assert_eq!(group.len(), 2);
		assert_eq!(group[0].drawables(), &[0]);
		assert_eq!(group[1].drawables(), &[1]);

		let calls = ctx.take_calls();
		assert_eq!(count(&calls, |c| matches!(c, RenderCall::Draw { .. })), 6);
		assert_eq!(count(&calls, |c| matches!(c, RenderCall::TemporaryTarget { .. })), 1);

		let draws: Vec<(MaterialId, bool)> = calls
			.iter()
			.filter_map(|call| match call {
				RenderCall::Draw { material, mask, .. } => Some((*material, mask.is_some())),
				_ => None,
			})
			.collect();
		assert_eq!(
			draws,
			[
				(MaterialId(0), false),
				(MaterialId(1), false),
				(MaterialId(0), false),
				(MaterialId(1), false),
				(MaterialId(2), true),
				(MaterialId(2), false),
			]
		);
	}

	#[test]
	fn dropped_mask_leaves_drawable_unmasked() {
		let (mut ctx, instance) = setup(
			1,
			vec![quad("Broken", 5, 0, &[]), quad("Masked", 0, 1, &[0]), quad("Plain", 0, 2, &[])],
		);
		let mut renderer = Renderer::new();

		frame(&mut renderer, &instance, &mut ctx);

		assert_eq!(batch_ids(&renderer, &instance), [vec!["Masked", "Plain"]]);
		assert_eq!(renderer.batches()[0].mask_id(), None);

		let calls = ctx.calls();
		assert_eq!(ctx.draw_count(), 1);
		assert!(calls.iter().any(|c| matches!(c, RenderCall::Draw { mask: None, .. })));
		assert_eq!(count(calls, |c| matches!(c, RenderCall::TemporaryTarget { .. })), 0);
		assert_eq!(count(calls, |c| matches!(c, RenderCall::Clear(_))), 0);
	}

	#[test]
	fn batches_follow_render_order() {
		let (mut ctx, instance) = setup(
			2,
			vec![quad("Front", 0, 2, &[]), quad("Back", 0, 0, &[]), quad("Middle", 1, 1, &[])],
		);
		let mut renderer = Renderer::new();

		frame(&mut renderer, &instance, &mut ctx);

		assert_eq!(batch_ids(&renderer, &instance), [vec!["Back"], vec!["Middle"], vec!["Front"]]);
	}

	#[test]
	fn content_changes_only_refresh_vertices() {
		let (mut ctx, mut instance) = setup(
			2,
			vec![quad("Mask", 0, 0, &[]), quad("Masked", 1, 1, &[0]), quad("Other", 0, 2, &[])],
		);
		let mut renderer = Renderer::new();
		frame(&mut renderer, &instance, &mut ctx);
		ctx.take_calls();

		// a tint change refreshes the main batch holding the mask drawable, but not the mask itself
		let mask = instance.drawable_mut("Mask").unwrap();
		mask.state_mut().multiply_color = Vec4::new(1.0, 0.0, 0.0, 1.0);
		mask.state_mut().dynamic_flags |= DynamicFlags::BLEND_COLOR_DID_CHANGE;
		assert!(!renderer.needs_rebuild(instance.drawables().as_slice()));

		renderer.end_frame(&instance, &mut ctx);
		let calls = ctx.take_calls();
		assert_eq!(calls.len(), 1);
		assert!(matches!(
			&calls[0],
			RenderCall::UploadVertices { mesh, vertices }
				if Some(mesh) == renderer.batches()[0].mesh() && vertices[0].multiply_color.to_le_bytes() == [255, 0, 0, 255]
		));

		// moving it refreshes the mask sub-batch too
		instance.drawables_mut().reset_dynamic_flags();
		let mask = instance.drawable_mut("Mask").unwrap();
		mask.state_mut().dynamic_flags |= DynamicFlags::VERTEX_POSITIONS_DID_CHANGE;

		renderer.end_frame(&instance, &mut ctx);
		let calls = ctx.take_calls();
		assert_eq!(count(&calls, |c| matches!(c, RenderCall::UploadVertices { .. })), 2);
		assert_eq!(count(&calls, |c| !matches!(c, RenderCall::UploadVertices { .. })), 0);

		// unrelated bits do nothing at all
		instance.drawables_mut().reset_dynamic_flags();
		instance.drawable_mut("Other").unwrap().state_mut().dynamic_flags |= DynamicFlags::DRAW_ORDER_DID_CHANGE;
		renderer.end_frame(&instance, &mut ctx);
		assert!(ctx.calls().is_empty());
	}

	#[test]
	fn render_order_change_rebuilds() {
		let (mut ctx, mut instance) = setup(1, vec![quad("A", 0, 0, &[]), quad("B", 0, 1, &[])]);
		let mut renderer = Renderer::new();
		frame(&mut renderer, &instance, &mut ctx);
		ctx.take_calls();

		let a = instance.drawable_mut("A").unwrap();
		a.state_mut().render_order = 5;
		a.state_mut().dynamic_flags |= DynamicFlags::RENDER_ORDER_DID_CHANGE;
		assert!(renderer.needs_rebuild(instance.drawables().as_slice()));

		renderer.end_frame(&instance, &mut ctx);
		let calls = ctx.take_calls();
		assert_eq!(count(&calls, |c| matches!(c, RenderCall::ReleaseMesh(_))), 1);
		assert_eq!(count(&calls, |c| matches!(c, RenderCall::UploadIndices { .. })), 1);
		assert_eq!(batch_ids(&renderer, &instance), [vec!["B", "A"]]);
	}

	#[test]
	fn material_swap_rebuilds_and_splits() {
		let (mut ctx, mut instance) = setup(2, vec![quad("A", 0, 0, &[]), quad("B", 0, 1, &[])]);
		let mut renderer = Renderer::new();
		frame(&mut renderer, &instance, &mut ctx);
		assert_eq!(renderer.batches().len(), 1);

		instance.drawable_mut("B").unwrap().set_material(MaterialId(1));
		assert!(renderer.needs_rebuild(instance.drawables().as_slice()));

		ctx.take_calls();
		frame(&mut renderer, &instance, &mut ctx);
		assert_eq!(batch_ids(&renderer, &instance), [vec!["A"], vec!["B"]]);
		assert_eq!(ctx.draw_count(), 2);
		assert!(!renderer.needs_rebuild(instance.drawables().as_slice()));
	}

	#[test]
	fn render_needs_target_and_binding() {
		let (mut ctx, instance) = setup(1, vec![quad("A", 0, 0, &[])]);
		let (_, other) = setup(1, vec![quad("A", 0, 0, &[])]);
		let mut renderer = Renderer::new();

		// unbound
		renderer.render(&instance, &camera(), &mut ctx);
		assert!(ctx.calls().is_empty());

		renderer.begin_frame(&instance, &mut ctx);
		ctx.take_calls();

		renderer.render(&instance, &Camera::default(), &mut ctx);
		renderer.render(&other, &camera(), &mut ctx);
		renderer.end_frame(&other, &mut ctx);
		assert!(ctx.calls().is_empty());

		renderer.render(&instance, &camera(), &mut ctx);
		assert_eq!(ctx.draw_count(), 1);
	}

	#[test]
	fn reload_rebinds() {
		let mut ctx = RecordingContext::new();
		let model = test_model(&mut ctx, 1, false);
		let core = StaticCore {
			params: Vec::new(),
			drawables: vec![quad("A", 0, 0, &[])],
		};
		let mut instance = new_instance(&model, core.clone());
		let mut renderer = Renderer::new();
		frame(&mut renderer, &instance, &mut ctx);

		let loader = move |_: &Moc| -> Result<Box<dyn ModelCore>, MocError> { Ok(Box::new(core.clone())) };
		instance.reload(&model, &loader).unwrap();
		assert!(!renderer.is_bound_to(&instance));

		ctx.take_calls();
		frame(&mut renderer, &instance, &mut ctx);
		assert!(renderer.is_bound_to(&instance));
		assert_eq!(count(ctx.calls(), |c| matches!(c, RenderCall::ReleaseMesh(_))), 1);
		assert_eq!(ctx.draw_count(), 1);
	}

	#[test]
	fn empty_model_renders_nothing() {
		let (mut ctx, instance) = setup(1, Vec::new());
		let mut renderer = Renderer::new();

		frame(&mut renderer, &instance, &mut ctx);

		assert!(renderer.batches().is_empty());
		assert!(ctx.calls().is_empty());
	}

	#[test]
	fn custom_policy_is_used() {
		let (mut ctx, instance) = setup(1, vec![quad("A", 0, 0, &[]), quad("B", 0, 1, &[])]);
		let mut renderer: Renderer<RecordingContext, _> =
			Renderer::with_policy(|_: &Drawable, _: &Drawable, _: bool| false);

		renderer.begin_frame(&instance, &mut ctx);
		renderer.end_frame(&instance, &mut ctx);
		renderer.render(&instance, &camera(), &mut ctx);

		assert_eq!(renderer.batches().len(), 2);
		assert_eq!(ctx.draw_count(), 2);
	}
}
