use core::{
	borrow::Borrow,
	hash::{BuildHasher, Hash},
};
use hashbrown::{
	hash_map::{DefaultHashBuilder, Entry},
	HashMap,
};
use num_traits::{CheckedAdd, CheckedSub, One, Zero};

/// A map whose entries are created on first reference and handed back once their count drops to zero.
pub struct RcHashMap<K, C, V, S = DefaultHashBuilder>(HashMap<K, (C, V), S>)
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: BuildHasher;
impl<K, C, V, S> Default for RcHashMap<K, C, V, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero + Copy,
	S: Default + BuildHasher,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<K, C, V, S> RcHashMap<K, C, V, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero + Copy,
	S: BuildHasher,
{
	#[must_use]
	pub fn new() -> Self
	where
		S: Default,
	{
		Self(HashMap::with_hasher(S::default()))
	}

	/// Increments the count for `k`, calling `v` to create the entry if there is none yet.
	pub fn increment_or_insert_with<F: FnOnce() -> V>(&mut self, k: K, v: F) -> Result<&mut V, CountSaturatedError> {
		match self.0.entry(k) {
			Entry::Occupied(occupied) => {
				let (c, v) = occupied.into_mut();
				*c = c.checked_add(&C::one()).ok_or(CountSaturatedError)?;
				Ok(v)
			}
			Entry::Vacant(vacant) => {
				let (_, v) = vacant.insert((C::one(), v()));
				Ok(v)
			}
		}
	}

	/// Decrements the count for `k`.
	///
	/// Returns the value if this released the last reference, in which case the entry is gone.
	/// Missing entries are left alone.
	pub fn decrement<Q: ?Sized>(&mut self, k: &Q) -> Result<Option<V>, CountSaturatedError>
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		let released = match self.0.get_mut(k) {
			Some((c, _)) => {
				*c = c.checked_sub(&C::one()).ok_or(CountSaturatedError)?;
				c.is_zero()
			}
			None => return Ok(None),
		};
		Ok(if released { self.0.remove(k).map(|(_, v)| v) } else { None })
	}

	#[must_use]
	pub fn count<Q: ?Sized>(&self, k: &Q) -> C
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		self.0.get(k).map_or_else(C::zero, |&(c, _)| c)
	}

	#[must_use]
	pub fn contains_key<Q: ?Sized>(&self, k: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		self.0.contains_key(k)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

#[cfg(test)]
impl<K, C, V, S> RcHashMap<K, C, V, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero + Copy + num_traits::Bounded,
	S: BuildHasher,
{
	/// Pins the count for `k` at its maximum.
	pub(crate) fn saturate<Q: ?Sized>(&mut self, k: &Q)
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		if let Some((c, _)) = self.0.get_mut(k) {
			*c = C::max_value();
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("reference count over- or underflow")]
pub struct CountSaturatedError;
