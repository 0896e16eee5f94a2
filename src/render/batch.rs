use crate::drawable::Drawable;

use super::policy::BatchPolicy;
use super::vertex_buffers::VertexBuffers;

/// Drawables merged into a single draw call.
#[derive(Debug)]
pub struct Batch<M> {
	pub(super) drawables: Vec<usize>,
	pub(super) mesh: Option<M>,
	pub(super) buffers: VertexBuffers,
	pub(super) mask_id: Option<usize>,
	pub(super) indices_dirty: bool,
	pub(super) vertices_dirty: bool,
}

impl<M> Batch<M> {
	pub(super) fn new(drawables: Vec<usize>, mask_id: Option<usize>) -> Self {
		Self {
			drawables,
			mesh: None,
			buffers: VertexBuffers::default(),
			mask_id,
			indices_dirty: false,
			vertices_dirty: false,
		}
	}

	/// Store indices of the members, in render order.
	pub fn drawables(&self) -> &[usize] {
		&self.drawables
	}

	pub fn first(&self) -> Option<usize> {
		self.drawables.first().copied()
	}

	/// Index of the mask batch group drawn before this batch, if it is masked.
	pub fn mask_id(&self) -> Option<usize> {
		self.mask_id
	}

	pub fn buffers(&self) -> &VertexBuffers {
		&self.buffers
	}

	pub fn mesh(&self) -> Option<&M> {
		self.mesh.as_ref()
	}

	pub(super) fn members<'a>(&'a self, drawables: &'a [Drawable]) -> impl Iterator<Item = &'a Drawable> + 'a {
		self.drawables.iter().filter_map(|&i| drawables.get(i))
	}

	pub(super) fn rebuild_indices(&mut self, drawables: &[Drawable]) {
		let mut buffers = std::mem::take(&mut self.buffers);
		buffers.rebuild_indices(self.members(drawables));
		self.buffers = buffers;
		self.indices_dirty = true;
	}

	pub(super) fn rebuild_vertices(&mut self, drawables: &[Drawable], as_mask: bool) {
		let mut buffers = std::mem::take(&mut self.buffers);
		buffers.rebuild_vertices(self.members(drawables), as_mask);
		self.buffers = buffers;
		self.vertices_dirty = true;
	}
}

/// Splits `order` into runs of drawables the policy lets share a draw call with the run's first member.
///
/// Indices out of range of `drawables` are skipped.
pub fn partition<P: BatchPolicy + ?Sized>(
	policy: &P,
	drawables: &[Drawable],
	order: impl IntoIterator<Item = usize>,
	as_mask: bool,
) -> Vec<Vec<usize>> {
	let mut runs: Vec<Vec<usize>> = Vec::new();

	for index in order {
		let Some(drawable) = drawables.get(index) else {
			continue;
		};

		let fits = match runs.last().and_then(|run| run.first()) {
			Some(&first) => policy.fits(&drawables[first], drawable, as_mask),
			None => false,
		};

		match runs.last_mut() {
			Some(run) if fits => run.push(index),
			_ => runs.push(vec![index]),
		}
	}

	runs
}
