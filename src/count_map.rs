use core::hash::{BuildHasher, Hash};
use hashbrown::{hash_map::DefaultHashBuilder, HashMap};
use num_traits::{CheckedAdd, One, Zero};

/// A map of checked counters.
#[derive(Debug, Clone)]
pub struct CountMap<K, C = u32, S = DefaultHashBuilder>(HashMap<K, C, S>)
where
	K: Hash + Eq,
	C: CheckedAdd + One + Zero + Copy,
	S: BuildHasher;
impl<K, C, S> Default for CountMap<K, C, S>
where
	K: Hash + Eq,
	C: CheckedAdd + One + Zero + Copy,
	S: Default + BuildHasher,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<K, C, S> CountMap<K, C, S>
where
	K: Hash + Eq,
	C: CheckedAdd + One + Zero + Copy,
	S: BuildHasher,
{
	#[must_use]
	pub fn new() -> Self
	where
		S: Default,
	{
		Self(HashMap::with_hasher(S::default()))
	}

	/// Increments the counter for `k`, returning its new value.
	///
	/// # Errors
	///
	/// Iff the counter is saturated. It then keeps its maximum value.
	pub fn increment(&mut self, k: K) -> Result<C, CountSaturatedError> {
		let c = self.0.entry(k).or_insert_with(C::zero);
		*c = c.checked_add(&C::one()).ok_or(CountSaturatedError)?;
		Ok(*c)
	}

	/// Zero for keys that were never incremented.
	pub fn get(&self, k: &K) -> C {
		self.0.get(k).copied().unwrap_or_else(C::zero)
	}

	/// Sum over all counters, or [`None`] on overflow.
	pub fn total(&self) -> Option<C> {
		self.0.values().try_fold(C::zero(), |sum, c| sum.checked_add(c))
	}

	pub fn iter(&self) -> impl Iterator<Item = (&K, C)> + '_ {
		self.0.iter().map(|(k, c)| (k, *c))
	}

	pub fn is_empty(&self) -> bool {
		self.0.values().all(Zero::is_zero)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountSaturatedError;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts() {
		let mut map = CountMap::<&str>::new();
		assert!(map.is_empty());
		assert_eq!(map.increment("a"), Ok(1));
		assert_eq!(map.increment("a"), Ok(2));
		assert_eq!(map.increment("b"), Ok(1));
		assert_eq!(map.get(&"a"), 2);
		assert_eq!(map.get(&"c"), 0);
		assert_eq!(map.total(), Some(3));
	}

	#[test]
	fn saturates() {
		let mut map = CountMap::<(), u8>::new();
		for _ in 0..255 {
			map.increment(()).unwrap();
		}
		assert_eq!(map.increment(()), Err(CountSaturatedError));
		assert_eq!(map.get(&()), 255);
		assert_eq!(map.total(), Some(255));
	}
}
