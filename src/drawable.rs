use std::collections::HashMap;

use bitflags::bitflags;
use glam::{Vec2, Vec3, Vec4};
use tracing::warn;

use crate::params::hash_id;
use crate::render::MaterialId;

bitflags! {
	/// Flags fixed for the lifetime of a drawable.
	#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
	pub struct ConstantFlags: u8 {
		const BLEND_ADDITIVE = 1 << 0;
		const BLEND_MULTIPLICATIVE = 1 << 1;
		const IS_DOUBLE_SIDED = 1 << 2;
		/// Masks cut the drawable out instead of in.
		const IS_INVERTED_MASK = 1 << 3;
	}
}

bitflags! {
	/// Per-frame change detection bits written by the deformation core.
	///
	/// Everything except `IS_VISIBLE` is cleared before every core update.
	#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
	pub struct DynamicFlags: u8 {
		const IS_VISIBLE = 1 << 0;
		const VISIBILITY_DID_CHANGE = 1 << 1;
		const OPACITY_DID_CHANGE = 1 << 2;
		const DRAW_ORDER_DID_CHANGE = 1 << 3;
		const RENDER_ORDER_DID_CHANGE = 1 << 4;
		const VERTEX_POSITIONS_DID_CHANGE = 1 << 5;
		const BLEND_COLOR_DID_CHANGE = 1 << 6;
	}
}

/// Drawable as described by the deformation core when an instance is created.
#[derive(Clone, Debug)]
pub struct DrawableDesc {
	pub id: String,
	pub texture_index: usize,
	pub vertex_positions: Vec<Vec2>,
	pub vertex_uvs: Vec<Vec2>,
	pub indices: Vec<u16>,
	pub constant_flags: ConstantFlags,
	/// Indices of masking drawables in core order. Negative means unresolved.
	pub masks: Vec<i32>,
	pub state: DrawableState,
}

/// The part of a drawable the deformation core rewrites every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawableState {
	pub opacity: f32,
	pub draw_order: i32,
	pub render_order: i32,
	pub dynamic_flags: DynamicFlags,
	pub multiply_color: Vec4,
	pub screen_color: Vec4,
}

impl Default for DrawableState {
	fn default() -> Self {
		Self {
			opacity: 1.0,
			draw_order: 0,
			render_order: 0,
			dynamic_flags: DynamicFlags::IS_VISIBLE,
			multiply_color: Vec4::ONE,
			screen_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
		}
	}
}

/// One sub-mesh of a deformed model.
#[derive(Clone, Debug)]
pub struct Drawable {
	id: String,
	id_hash: u64,
	texture_index: usize,
	material: MaterialId,
	vertex_positions: Vec<Vec2>,
	vertex_uvs: Vec<Vec2>,
	indices: Vec<u16>,
	constant_flags: ConstantFlags,
	masks: Vec<usize>,
	state: DrawableState,
}

impl Drawable {
	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn id_hash(&self) -> u64 {
		self.id_hash
	}

	pub fn texture_index(&self) -> usize {
		self.texture_index
	}

	pub fn material(&self) -> MaterialId {
		self.material
	}

	/// Swaps the material this drawable renders with. Renderers regroup on the next frame.
	pub fn set_material(&mut self, material: MaterialId) {
		self.material = material;
	}

	pub fn vertex_count(&self) -> usize {
		self.vertex_positions.len()
	}

	pub fn vertex_positions(&self) -> &[Vec2] {
		&self.vertex_positions
	}

	/// Vertex positions for the deformation core to rewrite. UVs and indices never change.
	pub fn vertex_positions_mut(&mut self) -> &mut [Vec2] {
		&mut self.vertex_positions
	}

	pub fn vertex_uvs(&self) -> &[Vec2] {
		&self.vertex_uvs
	}

	pub fn index_count(&self) -> usize {
		self.indices.len()
	}

	pub fn indices(&self) -> &[u16] {
		&self.indices
	}

	pub fn constant_flags(&self) -> ConstantFlags {
		self.constant_flags
	}

	pub fn dynamic_flags(&self) -> DynamicFlags {
		self.state.dynamic_flags
	}

	pub fn state(&self) -> &DrawableState {
		&self.state
	}

	pub fn state_mut(&mut self) -> &mut DrawableState {
		&mut self.state
	}

	pub fn draw_order(&self) -> i32 {
		self.state.draw_order
	}

	pub fn render_order(&self) -> i32 {
		self.state.render_order
	}

	/// Opacity as it should be rendered: 0 while the drawable is hidden.
	pub fn opacity(&self) -> f32 {
		if self.state.dynamic_flags.contains(DynamicFlags::IS_VISIBLE) {
			self.state.opacity
		} else {
			0.0
		}
	}

	/// Multiply color with its alpha scaled by the effective opacity.
	pub fn multiply_color(&self) -> Vec4 {
		let c = self.state.multiply_color;
		Vec4::new(c.x, c.y, c.z, c.w * self.opacity())
	}

	pub fn screen_color(&self) -> Vec3 {
		self.state.screen_color.truncate()
	}

	/// Indices of the drawables masking this one, without duplicates. Unresolved masks are not listed.
	pub fn masks(&self) -> &[usize] {
		&self.masks
	}

	pub fn mask_count(&self) -> usize {
		self.masks.len()
	}

	/// Whether both drawables are masked by the same set of drawables.
	pub fn has_same_masks(&self, other: &Drawable) -> bool {
		self.masks.len() == other.masks.len() && self.masks.iter().all(|m| other.masks.contains(m))
	}
}

/// Handle to a drawable inside the [`Drawables`] of one model instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DrawableId {
	index: u32,
	generation: u32,
}

impl DrawableId {
	pub fn index(&self) -> usize {
		self.index as usize
	}
}

/// All drawables of one model instance.
#[derive(Clone, Debug, Default)]
pub struct Drawables {
	generation: u32,
	drawables: Vec<Drawable>,
	by_id: HashMap<String, u32>,
}

impl Drawables {
	/// Builds the drawable arena from core descriptions.
	///
	/// A drawable whose texture index has no material, or whose mesh is inconsistent, is dropped with a warning.
	/// Mask indices are remapped to the surviving drawables and deduplicated. Masks pointing at dropped or
	/// missing drawables are unresolved and left out.
	pub(crate) fn import(generation: u32, descs: Vec<DrawableDesc>, materials: &[MaterialId]) -> Self {
		let mut remap = Vec::with_capacity(descs.len());
		let mut kept = 0;
		for desc in &descs {
			if is_importable(desc, materials) {
				remap.push(Some(kept));
				kept += 1;
			} else {
				remap.push(None);
			}
		}

		let drawables: Vec<Drawable> = descs
			.into_iter()
			.zip(&remap)
			.filter(|(_, slot)| slot.is_some())
			.map(|(desc, _)| {
				let mut masks = Vec::with_capacity(desc.masks.len());
				for &m in &desc.masks {
					match usize::try_from(m).ok().and_then(|m| remap.get(m).copied().flatten()) {
						Some(m) if !masks.contains(&m) => masks.push(m),
						Some(_) => {}
						None => warn!("Drawable {:?} has an unresolved mask {}", desc.id, m),
					}
				}

				Drawable {
					id_hash: hash_id(&desc.id),
					material: materials[desc.texture_index],
					id: desc.id,
					texture_index: desc.texture_index,
					vertex_positions: desc.vertex_positions,
					vertex_uvs: desc.vertex_uvs,
					indices: desc.indices,
					constant_flags: desc.constant_flags,
					masks,
					state: desc.state,
				}
			})
			.collect();

		let by_id = drawables
			.iter()
			.enumerate()
			.map(|(i, d)| (d.id.clone(), i as u32))
			.collect();

		Self {
			generation,
			drawables,
			by_id,
		}
	}

	pub fn generation(&self) -> u32 {
		self.generation
	}

	pub fn len(&self) -> usize {
		self.drawables.len()
	}

	pub fn is_empty(&self) -> bool {
		self.drawables.is_empty()
	}

	pub fn find(&self, id: &str) -> Option<DrawableId> {
		self.by_id.get(id).map(|&index| DrawableId {
			index,
			generation: self.generation,
		})
	}

	pub fn get(&self, id: DrawableId) -> Option<&Drawable> {
		if id.generation != self.generation {
			return None;
		}
		self.drawables.get(id.index as usize)
	}

	pub fn get_mut(&mut self, id: DrawableId) -> Option<&mut Drawable> {
		if id.generation != self.generation {
			return None;
		}
		self.drawables.get_mut(id.index as usize)
	}

	pub fn as_slice(&self) -> &[Drawable] {
		&self.drawables
	}

	/// Direct access for the deformation core, in store order.
	pub fn as_mut_slice(&mut self) -> &mut [Drawable] {
		&mut self.drawables
	}

	pub fn iter(&self) -> impl Iterator<Item = &Drawable> {
		self.drawables.iter()
	}

	/// Clears every change bit, keeping only visibility.
	pub fn reset_dynamic_flags(&mut self) {
		for drawable in &mut self.drawables {
			drawable.state.dynamic_flags &= DynamicFlags::IS_VISIBLE;
		}
	}
}

fn is_importable(desc: &DrawableDesc, materials: &[MaterialId]) -> bool {
	if desc.texture_index >= materials.len() {
		warn!("Drawable {:?} has an invalid texture index {}", desc.id, desc.texture_index);
		return false;
	}
	if desc.vertex_positions.len() != desc.vertex_uvs.len() {
		warn!(
			"Drawable {:?} has {} vertex positions but {} UVs",
			desc.id,
			desc.vertex_positions.len(),
			desc.vertex_uvs.len()
		);
		return false;
	}
	if let Some(&index) = desc.indices.iter().find(|&&i| i as usize >= desc.vertex_positions.len()) {
		warn!(
			"Drawable {:?} has index {} past its {} vertices",
			desc.id,
			index,
			desc.vertex_positions.len()
		);
		return false;
	}
	true
}
