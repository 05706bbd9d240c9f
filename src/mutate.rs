//! Mutation primitives and their accounting.

use crate::{
	count_map::CountMap,
	dom::{DomDocument, DomNode, NodeKind},
};
use core::fmt::{self, Display, Formatter};
use tracing::{error, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mutation {
	AppendChild,
	ReplaceChild,
	RemoveChild,
	RemoveComment,
	SetText,
	SetAttribute,
	RemoveAttribute,
	SetProperty,
}

/// Mutation counts of one render call.
#[derive(Debug, Clone, Default)]
pub struct RenderStats(CountMap<Mutation>);

impl RenderStats {
	#[must_use]
	pub fn get(&self, mutation: Mutation) -> u32 {
		self.0.get(&mutation)
	}

	/// Saturates at [`u32::MAX`].
	#[must_use]
	pub fn total(&self) -> u32 {
		self.0.total().unwrap_or(u32::MAX)
	}

	/// Whether no mutation at all was recorded.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Whether anything other than properties was touched.
	#[must_use]
	pub fn is_structurally_unchanged(&self) -> bool {
		self.0.iter().all(|(&mutation, count)| mutation == Mutation::SetProperty || count == 0)
	}

	pub fn iter(&self) -> impl Iterator<Item = (Mutation, u32)> + '_ {
		self.0.iter().map(|(&mutation, count)| (mutation, count))
	}

	pub(crate) fn record(&mut self, mutation: Mutation, times: usize) {
		for _ in 0..times {
			if self.0.increment(mutation).is_err() {
				return warn!(?mutation, "Mutation counter saturated.");
			}
		}
	}
}

impl Display for RenderStats {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if self.is_empty() {
			return f.write_str("no mutations");
		}
		let mut counts: Vec<_> = self.iter().filter(|&(_, count)| count != 0).collect();
		counts.sort_unstable();
		for (i, (mutation, count)) in counts.into_iter().enumerate() {
			if i != 0 {
				f.write_str(", ")?;
			}
			write!(f, "{:?}: {}", mutation, count)?;
		}
		Ok(())
	}
}

/// Applies insert/replace/remove primitives to a target tree, importing clones into its owning document.
#[derive(Debug)]
pub struct Mutator<D: DomDocument> {
	document: D,
	strip_comments: bool,
	stats: RenderStats,
}

impl<D: DomDocument> Mutator<D> {
	/// With `strip_comments`, inserted clones lose their comment descendants.
	#[must_use]
	pub fn new(document: D, strip_comments: bool) -> Self {
		Self {
			document,
			strip_comments,
			stats: RenderStats::default(),
		}
	}

	#[must_use]
	pub fn stats(&self) -> &RenderStats {
		&self.stats
	}

	#[must_use]
	pub fn into_stats(self) -> RenderStats {
		self.stats
	}

	pub fn record(&mut self, mutation: Mutation, times: usize) {
		self.stats.record(mutation, times);
	}

	#[must_use]
	pub fn document(&self) -> &D {
		&self.document
	}

	/// Appends a deep clone of `source` as `parent`'s last child.
	pub fn append_clone(&mut self, parent: &D::Node, source: &D::Node) -> Option<D::Node> {
		let clone = self.import(source)?;
		trace!(kind = ?source.kind(), "Appending clone.");
		if !parent.append_child(&clone) {
			error!(kind = ?source.kind(), "Failed to append clone.");
			return None;
		}
		self.stats.record(Mutation::AppendChild, 1);
		Some(clone)
	}

	/// Puts a deep clone of `source` where `target` is.
	pub fn replace_with_clone(&mut self, target: &D::Node, source: &D::Node) -> Option<D::Node> {
		let parent = match target.parent() {
			Some(parent) => parent,
			None => {
				error!("Could not find parent node of node to replace. Ignoring.");
				return None;
			}
		};
		let clone = self.import(source)?;
		trace!(old = ?target.kind(), new = ?source.kind(), "Replacing with clone.");
		if !parent.replace_child(&clone, target) {
			error!(old = ?target.kind(), new = ?source.kind(), "Failed to replace node.");
			return None;
		}
		self.stats.record(Mutation::ReplaceChild, 1);
		Some(clone)
	}

	pub fn remove(&mut self, node: &D::Node) -> bool {
		let kind = node.kind();
		let removed = match node.parent() {
			Some(parent) => parent.remove_child(node),
			None => {
				error!(?kind, "Could not find parent node of node to remove. Ignoring.");
				return false;
			}
		};
		if removed {
			trace!(?kind, "Removed node.");
			self.stats.record(if kind == NodeKind::Comment { Mutation::RemoveComment } else { Mutation::RemoveChild }, 1);
		} else {
			error!(?kind, "Failed to remove node.");
		}
		removed
	}

	/// Removes `parent`'s children from `index` onward, returning how many were removed.
	pub fn remove_from(&mut self, parent: &D::Node, index: usize) -> usize {
		let mut removed = 0;
		while let Some(surplus) = parent.child(index) {
			if !self.remove(&surplus) {
				break;
			}
			removed += 1;
		}
		removed
	}

	/// Removes `parent`'s element children from `index` onward and leaves its other children in place.
	pub fn remove_elements_from(&mut self, parent: &D::Node, mut index: usize) -> usize {
		let mut removed = 0;
		while let Some(child) = parent.child(index) {
			if child.kind() == NodeKind::Element && self.remove(&child) {
				removed += 1;
			} else {
				index += 1;
			}
		}
		removed
	}

	/// Moves the children of `fragment`, which were accounted as they were appended to it, to the end of `parent`.
	pub fn insert_fragment(&mut self, parent: &D::Node, fragment: &D::Node) -> bool {
		let count = fragment.child_count();
		trace!(count, "Inserting batched nodes.");
		let inserted = parent.append_child(fragment);
		if !inserted {
			error!(count, "Failed to insert batched nodes.");
		}
		inserted
	}

	/// Makes `text` the only content of `target`, like assigning ***textContent***.
	///
	/// A lone text child is updated in place. Otherwise all children are removed and, unless the text is empty,
	/// replaced with a single new text node.
	pub fn set_text_content(&mut self, target: &D::Node, text: &str) -> bool {
		if let (1, Some(only)) = (target.child_count(), target.child(0)) {
			if only.kind() == NodeKind::Text {
				return self.set_text(&only, text);
			}
		}

		while let Some(child) = target.child(0) {
			if !self.remove(&child) {
				return false;
			}
		}
		if text.is_empty() {
			return true;
		}
		let node = self.document.create_text(text);
		if !target.append_child(&node) {
			error!(kind = ?target.kind(), "Failed to append text.");
			return false;
		}
		self.stats.record(Mutation::AppendChild, 1);
		true
	}

	pub fn set_text(&mut self, target: &D::Node, text: &str) -> bool {
		if cfg!(feature = "dangerous-logging") {
			trace!(kind = ?target.kind(), text, "Setting text.");
		} else {
			trace!(kind = ?target.kind(), "Setting text.");
		}
		let set = target.set_text(text);
		if set {
			self.stats.record(Mutation::SetText, 1);
		} else {
			error!(kind = ?target.kind(), "Failed to set text.");
		}
		set
	}

	/// A detached deep clone of `source` in the target document. Not accounted.
	pub fn import(&self, source: &D::Node) -> Option<D::Node> {
		let clone = match self.document.import_node(source) {
			Some(clone) => clone,
			None => {
				error!(kind = ?source.kind(), "Failed to import node.");
				return None;
			}
		};
		if self.strip_comments {
			strip_comments(&clone);
		}
		Some(clone)
	}
}

/// Removes all comment descendants of a detached clone. Not accounted, as the clone isn't part of the target yet.
fn strip_comments<N: DomNode>(root: &N) {
	let mut pending = vec![root.clone()];
	while let Some(node) = pending.pop() {
		let mut i = 0;
		while let Some(child) = node.child(i) {
			if child.kind() == NodeKind::Comment && node.remove_child(&child) {
				continue;
			}
			pending.push(child);
			i += 1;
		}
	}
}
