use crate::dom::DomNode;

/// A document-order position in a tree, as a stack of `(parent, child index)` frames.
///
/// Positions are indices into the live child list, so removing the current node makes its next sibling current
/// and replacing it keeps the replacement current.
/// The cursor never leaves a frame on its own: once a frame's children run out, [`current`](`Cursor::current`) is [`None`] until [`ascend`](`Cursor::ascend`).
#[derive(Debug, Clone)]
pub struct Cursor<N> {
	frames: Vec<Frame<N>>,
}

#[derive(Debug, Clone)]
struct Frame<N> {
	parent: N,
	index: usize,
}

impl<N: DomNode> Cursor<N> {
	/// Positioned at `root`'s first child. `root` itself is never current.
	#[must_use]
	pub fn new(root: N) -> Self {
		Self {
			frames: vec![Frame { parent: root, index: 0 }],
		}
	}

	#[must_use]
	pub fn current(&self) -> Option<N> {
		self.frames.last().and_then(|frame| frame.parent.child(frame.index))
	}

	/// The node whose children the current frame walks.
	#[must_use]
	pub fn parent(&self) -> Option<&N> {
		self.frames.last().map(|frame| &frame.parent)
	}

	/// Index of the current position among [`parent`](`Cursor::parent`)'s children.
	#[must_use]
	pub fn index(&self) -> usize {
		self.frames.last().map_or(0, |frame| frame.index)
	}

	/// Number of open frames. Zero once the root frame was left.
	#[must_use]
	pub fn depth(&self) -> usize {
		self.frames.len()
	}

	/// Skips the current node's descendants.
	pub fn next_sibling(&mut self) {
		if let Some(frame) = self.frames.last_mut() {
			frame.index += 1;
		}
	}

	/// Enters the current node's children, even if there are none. Returns `false` without a current node.
	pub fn descend(&mut self) -> bool {
		match self.current() {
			Some(node) => {
				self.frames.push(Frame { parent: node, index: 0 });
				true
			}
			None => false,
		}
	}

	/// Leaves the current frame. The position is then on the node that was descended into.
	///
	/// Returns whether a frame is left to continue in.
	pub fn ascend(&mut self) -> bool {
		self.frames.pop();
		!self.frames.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tree::Document;

	#[test]
	fn walks_frames() {
		let document = Document::new();
		let root = document.create_element("r");
		let a = document.create_element("a");
		let b = document.create_element("b");
		a.append_child(&document.create_text("x"));
		root.append_child(&a);
		root.append_child(&b);

		let mut cursor = Cursor::new(root.clone());
		assert!(cursor.current().unwrap().ptr_eq(&a));
		assert!(cursor.descend());
		assert!(cursor.parent().unwrap().ptr_eq(&a));
		assert_eq!(cursor.current().unwrap().text().as_deref(), Some("x"));
		cursor.next_sibling();
		assert!(cursor.current().is_none());
		assert!(cursor.ascend());
		assert!(cursor.current().unwrap().ptr_eq(&a));
		cursor.next_sibling();
		assert!(cursor.current().unwrap().ptr_eq(&b));
		cursor.next_sibling();
		assert!(cursor.current().is_none());
		assert!(!cursor.descend());
		assert!(!cursor.ascend());
		assert_eq!(cursor.depth(), 0);
	}

	#[test]
	fn removal_keeps_position() {
		let document = Document::new();
		let root = document.create_element("r");
		let a = document.create_element("a");
		let b = document.create_element("b");
		root.append_child(&a);
		root.append_child(&b);

		let cursor = Cursor::new(root.clone());
		root.remove_child(&a);
		assert!(cursor.current().unwrap().ptr_eq(&b));
		assert_eq!(cursor.index(), 0);
	}
}
