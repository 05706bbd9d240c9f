//! The node model the reconciler operates on.
//!
//! [`DomNode`] is a cheaply cloneable *handle* to a node in some tree, much like [`web_sys::Node`](https://docs.rs/web-sys/0.3/web_sys/struct.Node.html) is.
//! Mutations go through shared handles, so none of the methods here take `&mut self`.
//!
//! Two implementations ship with this crate: [`crate::tree`] (in-memory) and, with the `web` feature, `crate::web` (browser DOM).

use core::fmt::{self, Debug, Display, Formatter};
use hashbrown::HashMap;
use std::borrow::Cow;

pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
	Element,
	Text,
	Comment,
	/// A parentless container. Only ever used as a temporary root.
	Fragment,
	/// Anything the reconciler has no dedicated handling for (processing instructions, doctypes, …).
	Other,
}

/// A (namespace URI, local name) pair.
///
/// Prefixes are deliberately not part of this: `xlink:href` and `xl:href` name the same attribute if both prefixes are bound to the same URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
	pub namespace: Option<String>,
	pub local_name: String,
}

impl QualifiedName {
	#[must_use]
	pub fn new(local_name: impl Into<String>) -> Self {
		Self { namespace: None, local_name: local_name.into() }
	}

	#[must_use]
	pub fn with_namespace(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
		Self {
			namespace: namespace.map(Into::into),
			local_name: local_name.into(),
		}
	}

	#[must_use]
	pub fn namespace(&self) -> Option<&str> {
		self.namespace.as_deref()
	}

	/// Element name comparison. Unlike `==`, this treats the null namespace and the XHTML namespace as the same.
	#[must_use]
	pub fn matches_element(&self, other: &Self) -> bool {
		self.local_name == other.local_name && element_namespace_eq(self.namespace(), other.namespace())
	}

	#[must_use]
	pub fn is_html(&self, local_name: &str) -> bool {
		self.local_name.eq_ignore_ascii_case(local_name) && element_namespace_eq(self.namespace(), Some(XHTML_NAMESPACE))
	}
}

/// Clark notation, i.e. `{namespace}local`.
impl Display for QualifiedName {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.namespace {
			Some(namespace) => write!(f, "{{{}}}{}", namespace, self.local_name),
			None => f.write_str(&self.local_name),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	pub name: QualifiedName,
	/// Only used to spell the attribute when writing it. Never compared.
	pub prefix: Option<String>,
	pub value: String,
}

impl Attribute {
	#[must_use]
	pub fn new(local_name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			name: QualifiedName::new(local_name),
			prefix: None,
			value: value.into(),
		}
	}

	/// `prefix:local` or just `local`.
	#[must_use]
	pub fn qualified_name(&self) -> Cow<'_, str> {
		match &self.prefix {
			Some(prefix) => Cow::Owned(format!("{}:{}", prefix, self.name.local_name)),
			None => Cow::Borrowed(&self.name.local_name),
		}
	}
}

/// A handle to a node.
///
/// Mutating methods return whether the host applied the change.
/// Implementations should log refusals rather than panic, as the reconciler carries on regardless.
pub trait DomNode: Clone + Debug + Sized {
	type Document: DomDocument<Node = Self>;
	/// Runtime property values, e.g. a [`JsValue`](https://docs.rs/wasm-bindgen/0.2/wasm_bindgen/struct.JsValue.html).
	type Value: Clone + Debug;

	fn kind(&self) -> NodeKind;
	/// [`Some`] iff this is an element.
	fn name(&self) -> Option<QualifiedName>;

	/// The character data of text and comment nodes.
	fn text(&self) -> Option<String>;
	fn set_text(&self, text: &str) -> bool;

	fn attributes(&self) -> Vec<Attribute>;
	fn attribute(&self, name: &QualifiedName) -> Option<String>;
	fn set_attribute(&self, attribute: &Attribute) -> bool;
	fn remove_attribute(&self, name: &QualifiedName) -> bool;

	/// [`None`] if the property doesn't exist on this node.
	fn property(&self, name: &str) -> Option<Self::Value>;
	fn set_property(&self, name: &str, value: Self::Value) -> bool;

	fn parent(&self) -> Option<Self>;
	fn child(&self, index: usize) -> Option<Self>;
	fn child_count(&self) -> usize;
	fn has_children(&self) -> bool {
		self.child_count() != 0
	}

	fn append_child(&self, child: &Self) -> bool;
	fn replace_child(&self, new_child: &Self, old_child: &Self) -> bool;
	fn remove_child(&self, child: &Self) -> bool;

	fn owner_document(&self) -> Self::Document;
	/// Identity comparison.
	fn is_same(&self, other: &Self) -> bool;
}

pub trait DomDocument: Clone + Debug {
	type Node: DomNode<Document = Self>;

	/// Deep-copies `node` (which may belong to another document) into this document.
	fn import_node(&self, node: &Self::Node) -> Option<Self::Node>;
	fn create_fragment(&self) -> Self::Node;
	fn create_text(&self, text: &str) -> Self::Node;
}

fn element_namespace_eq(left: Option<&str>, right: Option<&str>) -> bool {
	match (left, right) {
		(None, Some(namespace)) | (Some(namespace), None) => namespace == XHTML_NAMESPACE,
		(left, right) => left == right,
	}
}

/// Whether two nodes are of the same kind and, for elements, have matching [`QualifiedName`]s.
///
/// This is the test the reconciler uses to decide between updating a node in place and replacing it.
pub fn is_same_kind<N: DomNode>(left: &N, right: &N) -> bool {
	match (left.kind(), right.kind()) {
		(NodeKind::Element, NodeKind::Element) => match (left.name(), right.name()) {
			(Some(l), Some(r)) => l.matches_element(&r),
			_ => false,
		},
		(l, r) => l == r,
	}
}

/// Compares attribute sets by key. Order and prefixes are ignored.
pub fn attributes_eq<N: DomNode>(left: &N, right: &N) -> bool {
	let left = left.attributes();
	let right = right.attributes();
	if left.len() != right.len() {
		return false;
	}
	let index: HashMap<&QualifiedName, &str> = left.iter().map(|a| (&a.name, a.value.as_str())).collect();
	right.iter().all(|a| index.get(&a.name) == Some(&a.value.as_str()))
}

/// Deep structural equality: kinds, names, attribute sets, character data and child order at every depth.
///
/// Runtime properties are not compared.
pub fn is_equal_node<N: DomNode>(left: &N, right: &N) -> bool {
	let mut pending = vec![(left.clone(), right.clone())];
	while let Some((left, right)) = pending.pop() {
		if !is_same_kind(&left, &right) {
			return false;
		}
		match left.kind() {
			NodeKind::Element => {
				if !attributes_eq(&left, &right) {
					return false;
				}
			}
			NodeKind::Text | NodeKind::Comment | NodeKind::Other => {
				if left.text() != right.text() {
					return false;
				}
			}
			NodeKind::Fragment => (),
		}

		let count = left.child_count();
		if count != right.child_count() {
			return false;
		}
		for i in (0..count).rev() {
			match (left.child(i), right.child(i)) {
				(Some(l), Some(r)) => pending.push((l, r)),
				_ => return false,
			}
		}
	}
	true
}

pub fn contains_comment<N: DomNode>(root: &N) -> bool {
	let mut pending = vec![root.clone()];
	while let Some(node) = pending.pop() {
		if node.kind() == NodeKind::Comment {
			return true;
		}
		pending.extend((0..node.child_count()).filter_map(|i| node.child(i)));
	}
	false
}

/// Concatenated character data of all text nodes in `root`'s subtree, in document order.
pub fn text_content<N: DomNode>(root: &N) -> String {
	let mut text = String::new();
	let mut pending = vec![root.clone()];
	while let Some(node) = pending.pop() {
		if node.kind() == NodeKind::Text {
			text.push_str(&node.text().unwrap_or_default());
		}
		pending.extend((0..node.child_count()).rev().filter_map(|i| node.child(i)));
	}
	text
}

/// What [`normalize`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalization {
	/// Text nodes whose data was extended by their merged followers.
	pub rewritten: usize,
	/// Text nodes that were merged into a predecessor or were empty.
	pub removed: usize,
}

/// Merges adjacent text nodes and removes empty ones throughout `root`'s subtree, like the DOM's ***normalize()***.
pub fn normalize<N: DomNode>(root: &N) -> Normalization {
	let mut result = Normalization::default();
	let mut pending = vec![root.clone()];
	while let Some(node) = pending.pop() {
		let mut run: Option<(N, String)> = None;
		let mut i = 0;
		while let Some(child) = node.child(i) {
			if child.kind() != NodeKind::Text {
				flush_text_run(&mut run, &mut result);
				pending.push(child);
				i += 1;
				continue;
			}

			let text = child.text().unwrap_or_default();
			if (text.is_empty() || run.is_some()) && node.remove_child(&child) {
				result.removed += 1;
				if let Some((_, merged)) = &mut run {
					merged.push_str(&text);
				}
				continue;
			}

			flush_text_run(&mut run, &mut result);
			run = Some((child, text));
			i += 1;
		}
		flush_text_run(&mut run, &mut result);
	}
	result
}

fn flush_text_run<N: DomNode>(run: &mut Option<(N, String)>, result: &mut Normalization) {
	if let Some((first, merged)) = run.take() {
		if first.text().as_deref() != Some(merged.as_str()) && first.set_text(&merged) {
			result.rewritten += 1;
		}
	}
}

/// Pre-order search over the descendants of `root` (excluding `root` itself).
pub fn find_descendant<N: DomNode>(root: &N, mut predicate: impl FnMut(&N) -> bool) -> Option<N> {
	let mut pending: Vec<N> = (0..root.child_count()).rev().filter_map(|i| root.child(i)).collect();
	while let Some(node) = pending.pop() {
		if predicate(&node) {
			return Some(node);
		}
		pending.extend((0..node.child_count()).rev().filter_map(|i| node.child(i)));
	}
	None
}
