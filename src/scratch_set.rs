use core::hash::Hash;
use hashbrown::HashSet;

/// A set that is handed out cleared on each borrow, so its allocation can be reused across many short-lived uses.
#[derive(Debug)]
pub struct ScratchSet<T>(HashSet<T>);
impl<T: Hash + Eq> ScratchSet<T> {
	#[must_use]
	pub fn new() -> Self {
		Self(HashSet::new())
	}

	pub fn temp(&mut self) -> &mut HashSet<T> {
		self.0.clear();
		&mut self.0
	}

	/// Retrieves the set's capacity without clearing it first.
	pub fn capacity(&self) -> usize {
		self.0.capacity()
	}
}

impl<T: Hash + Eq> Default for ScratchSet<T> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn borrows_start_empty() {
		let mut set = ScratchSet::new();
		set.temp().extend(0..10);
		let capacity = set.capacity();
		assert!(capacity >= 10);
		assert!(set.temp().is_empty());
		assert_eq!(set.capacity(), capacity);
	}
}
