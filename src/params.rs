use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Hashes a parameter or drawable id the same way for every lookup table.
pub(crate) fn hash_id(id: &str) -> u64 {
	let mut hasher = DefaultHasher::new();
	id.hash(&mut hasher);
	hasher.finish()
}

/// Handle to a parameter inside the [`Params`] of one model instance.
///
/// The handle remembers the generation of the arena it was issued from,
/// so it stops resolving once the owning instance is reloaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamHandle {
	index: u32,
	generation: u32,
}

impl ParamHandle {
	pub fn index(&self) -> usize {
		self.index as usize
	}
}

/// Parameter. A named, bounded scalar channel driving the deformation of a model.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
	id: String,
	id_hash: u64,
	min: f32,
	max: f32,
	default: f32,
	value: f32,
}

impl Param {
	/// Creates a parameter sitting at its default value.
	pub fn new(id: impl Into<String>, min: f32, max: f32, default: f32) -> Self {
		let id = id.into();
		let (min, max) = if min > max { (max, min) } else { (min, max) };

		Self {
			id_hash: hash_id(&id),
			id,
			min,
			max,
			default,
			value: default.clamp(min, max),
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn id_hash(&self) -> u64 {
		self.id_hash
	}

	pub fn min(&self) -> f32 {
		self.min
	}

	pub fn max(&self) -> f32 {
		self.max
	}

	pub fn default_value(&self) -> f32 {
		self.default
	}

	pub fn value(&self) -> f32 {
		self.value
	}

	/// Stores `value` clamped to `[min, max]`.
	pub fn set_value(&mut self, value: f32) {
		self.value = value.max(self.min).min(self.max);
	}

	/// Value mapped onto `[-1, 1]` around 0.
	pub fn normalized_value(&self) -> f32 {
		self.normalized_value_with_base(0.0, -1.0, 1.0)
	}

	/// Value mapped onto `[min, max]` around the middle of that range.
	pub fn normalized_value_in(&self, min: f32, max: f32) -> f32 {
		self.normalized_value_with_base((min + max) * 0.5, min, max)
	}

	/// Maps the current value onto a target range with a bilinear split around the parameter's midpoint.
	///
	/// Values below the midpoint map linearly onto `[min - base, 0]`, values above onto `[0, max - base]`,
	/// so the midpoint always maps to 0 and asymmetric ranges stay continuous.
	/// A degenerate half range maps to 0.
	pub fn normalized_value_with_base(&self, base: f32, min: f32, max: f32) -> f32 {
		let (min, max) = if min > max { (max, min) } else { (min, max) };

		let middle = (self.min + self.max) * 0.5;
		let delta = self.value - middle;

		let (target, denom) = if delta < 0.0 {
			(min - base, self.min - middle)
		} else {
			(max - base, self.max - middle)
		};

		if denom == 0.0 {
			return 0.0;
		}
		target * delta / denom
	}

	pub fn reset(&mut self) {
		self.set_value(self.default);
	}
}

/// All parameters of one model instance, addressed by [`ParamHandle`].
#[derive(Clone, Debug, Default)]
pub struct Params {
	generation: u32,
	params: Vec<Param>,
	by_id: HashMap<String, u32>,
}

impl Params {
	pub(crate) fn new(generation: u32, params: Vec<Param>) -> Self {
		let by_id = params
			.iter()
			.enumerate()
			.map(|(i, p)| (p.id.clone(), i as u32))
			.collect();

		Self {
			generation,
			params,
			by_id,
		}
	}

	pub fn generation(&self) -> u32 {
		self.generation
	}

	pub fn len(&self) -> usize {
		self.params.len()
	}

	pub fn is_empty(&self) -> bool {
		self.params.is_empty()
	}

	/// Resolves a parameter id to a handle valid for this generation.
	pub fn find(&self, id: &str) -> Option<ParamHandle> {
		self.by_id.get(id).map(|&index| ParamHandle {
			index,
			generation: self.generation,
		})
	}

	pub fn get(&self, handle: ParamHandle) -> Option<&Param> {
		if handle.generation != self.generation {
			return None;
		}
		self.params.get(handle.index as usize)
	}

	pub fn get_mut(&mut self, handle: ParamHandle) -> Option<&mut Param> {
		if handle.generation != self.generation {
			return None;
		}
		self.params.get_mut(handle.index as usize)
	}

	pub fn by_id(&self, id: &str) -> Option<&Param> {
		self.find(id).and_then(|h| self.get(h))
	}

	pub fn by_id_mut(&mut self, id: &str) -> Option<&mut Param> {
		self.find(id).and_then(|h| self.get_mut(h))
	}

	pub fn as_slice(&self) -> &[Param] {
		&self.params
	}

	pub fn iter(&self) -> impl Iterator<Item = &Param> {
		self.params.iter()
	}

	pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Param> {
		self.params.iter_mut()
	}

	pub fn reset_to_defaults(&mut self) {
		for param in &mut self.params {
			param.reset();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const EPS: f32 = 1e-6;

	#[test]
	fn set_value_clamps() {
		let mut param = Param::new("ParamAngleX", -30.0, 30.0, 0.0);

		for v in [-1000.0, -30.0, -12.5, 0.0, 29.9, 30.0, 1e9, f32::INFINITY, f32::NEG_INFINITY] {
			param.set_value(v);
			assert!(param.value() >= param.min() && param.value() <= param.max(), "{v}");
		}

		param.set_value(45.0);
		assert_eq!(param.value(), 30.0);
		param.set_value(-45.0);
		assert_eq!(param.value(), -30.0);
	}

	#[test]
	fn normalized_value_is_zero_at_midpoint() {
		let mut param = Param::new("ParamBodyAngleX", -10.0, 30.0, 0.0);
		param.set_value(10.0);

		assert_eq!(param.normalized_value(), 0.0);
		assert_eq!(param.normalized_value_with_base(3.0, -7.0, 20.0), 0.0);
		assert_eq!(param.normalized_value_in(-5.0, 5.0), 0.0);
	}

	#[test]
	fn normalized_value_is_continuous_around_midpoint() {
		let mut param = Param::new("ParamHairFront", 0.0, 1.0, 0.5);

		param.set_value(0.5 - 1e-4);
		let below = param.normalized_value_with_base(0.0, -10.0, 10.0);
		param.set_value(0.5 + 1e-4);
		let above = param.normalized_value_with_base(0.0, -10.0, 10.0);

		assert!(below < 0.0 && above > 0.0);
		assert!((above - below).abs() < 1e-2);
	}

	#[test]
	fn normalized_value_bilinear_split() {
		let mut param = Param::new("ParamAngleZ", -10.0, 30.0, 0.0);

		// lower half [-10, 10) maps onto [min - base, 0)
		param.set_value(-10.0);
		assert!((param.normalized_value_with_base(0.0, -1.0, 1.0) - -1.0).abs() < EPS);
		param.set_value(0.0);
		assert!((param.normalized_value_with_base(0.0, -1.0, 1.0) - -0.5).abs() < EPS);

		// upper half maps onto [0, max - base]
		param.set_value(30.0);
		assert!((param.normalized_value_with_base(0.0, -1.0, 1.0) - 1.0).abs() < EPS);
		assert!((param.normalized_value_with_base(2.0, -1.0, 12.0) - 10.0).abs() < EPS);

		// swapped target range behaves like the ordered one
		assert!((param.normalized_value_with_base(0.0, 1.0, -1.0) - 1.0).abs() < EPS);
	}

	#[test]
	fn degenerate_range_normalizes_to_zero() {
		let mut param = Param::new("ParamFixed", 2.0, 2.0, 2.0);
		param.set_value(5.0);

		assert_eq!(param.value(), 2.0);
		assert_eq!(param.normalized_value(), 0.0);
	}

	#[test]
	fn stale_handles_do_not_resolve() {
		let params = Params::new(0, vec![Param::new("A", 0.0, 1.0, 0.0), Param::new("B", 0.0, 1.0, 1.0)]);
		let handle = params.find("B").unwrap();
		assert_eq!(params.get(handle).unwrap().id(), "B");
		assert!(params.find("C").is_none());

		let reloaded = Params::new(1, params.as_slice().to_vec());
		assert!(reloaded.get(handle).is_none());
		assert!(reloaded.get(reloaded.find("B").unwrap()).is_some());
	}

	#[test]
	fn reset_restores_defaults() {
		let mut params = Params::new(0, vec![Param::new("A", -1.0, 1.0, 0.25)]);
		params.by_id_mut("A").unwrap().set_value(-0.75);
		params.reset_to_defaults();

		assert_eq!(params.by_id("A").unwrap().value(), 0.25);
	}
}
