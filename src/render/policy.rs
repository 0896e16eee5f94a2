use crate::drawable::Drawable;

/// Decides whether a drawable can share a draw call with the batch opened by `first`.
///
/// Any `Fn(&Drawable, &Drawable, bool) -> bool` is a policy, so a renderer can be handed a closure:
///
/// ```
/// # use luna2d::drawable::Drawable;
/// # use luna2d::render::{RecordingContext, Renderer};
/// // never batch anything
/// let renderer: Renderer<RecordingContext, _> =
/// 	Renderer::with_policy(|_: &Drawable, _: &Drawable, _: bool| false);
/// ```
pub trait BatchPolicy {
	/// `as_mask` is set while partitioning the masks of a batch, which are never masked themselves.
	fn fits(&self, first: &Drawable, drawable: &Drawable, as_mask: bool) -> bool;
}

impl<F> BatchPolicy for F
where
	F: Fn(&Drawable, &Drawable, bool) -> bool,
{
	fn fits(&self, first: &Drawable, drawable: &Drawable, as_mask: bool) -> bool {
		self(first, drawable, as_mask)
	}
}

/// Batches drawables sharing material and constant flags, and outside of masks also the same mask set.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultBatchPolicy;

impl BatchPolicy for DefaultBatchPolicy {
	fn fits(&self, first: &Drawable, drawable: &Drawable, as_mask: bool) -> bool {
		first.material() == drawable.material()
			&& first.constant_flags() == drawable.constant_flags()
			&& (as_mask || first.has_same_masks(drawable))
	}
}
