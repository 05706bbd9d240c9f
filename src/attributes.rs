//! Attribute synchronization.

use crate::{
	dom::{DomNode, QualifiedName},
	scratch_set::ScratchSet,
};
use hashbrown::{HashMap, HashSet};
use tracing::{error, trace};

/// What [`merge_attributes`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeChanges {
	pub set: usize,
	pub removed: usize,
}

impl AttributeChanges {
	#[must_use]
	pub fn is_empty(self) -> bool {
		self.set == 0 && self.removed == 0
	}
}

/// Makes `target`'s attribute set equal to `source`'s, keyed by (namespace, local name).
///
/// Only attributes that are missing, different or surplus are touched. Children are left alone.
pub fn merge_attributes<N: DomNode>(source: &N, target: &N) -> AttributeChanges {
	merge_attributes_with(&mut ScratchSet::new(), source, target)
}

/// As [`merge_attributes`], but reuses `keys`' allocation.
pub fn merge_attributes_with<N: DomNode>(keys: &mut ScratchSet<QualifiedName>, source: &N, target: &N) -> AttributeChanges {
	merge(keys.temp(), source, target)
}

fn merge<N: DomNode>(source_keys: &mut HashSet<QualifiedName>, source: &N, target: &N) -> AttributeChanges {
	let mut changes = AttributeChanges::default();
	let target_attributes = target.attributes();
	let current: HashMap<&QualifiedName, &str> = target_attributes.iter().map(|a| (&a.name, a.value.as_str())).collect();

	for attribute in source.attributes() {
		if current.get(&attribute.name) != Some(&attribute.value.as_str()) {
			if cfg!(feature = "dangerous-logging") {
				trace!(name = %attribute.name, value = %attribute.value, "Setting attribute.");
			} else {
				trace!(name = %attribute.name, "Setting attribute.");
			}
			if target.set_attribute(&attribute) {
				changes.set += 1;
			} else {
				error!(name = %attribute.name, "Failed to set attribute.");
			}
		}
		source_keys.insert(attribute.name);
	}

	for attribute in &target_attributes {
		if !source_keys.contains(&attribute.name) {
			trace!(name = %attribute.name, "Removing attribute.");
			if target.remove_attribute(&attribute.name) {
				changes.removed += 1;
			} else {
				error!(name = %attribute.name, "Failed to remove attribute.");
			}
		}
	}

	changes
}
