//! An in-memory document tree.
//!
//! Nodes are reference-counted and own their children. Parent links are weak, so dropping the last handle to a root frees the whole tree.
//!
//! ```
//! use dom_morph::tree::Document;
//!
//! let document = Document::new();
//! let list = document.create_element("ul");
//! let item = document.create_element("li");
//! item.append_child(&document.create_text("one"));
//! list.append_child(&item);
//! list.set_attribute("class", "menu");
//!
//! assert_eq!(list.to_string(), r#"<ul class="menu"><li>one</li></ul>"#);
//! ```

use crate::dom::{self, Attribute, DomDocument, DomNode, NodeKind, QualifiedName};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Display, Formatter},
};
use hashbrown::HashMap;
use quick_xml::escape::escape;
use std::rc::{Rc, Weak};

/// A runtime property value, i.e. state that isn't (necessarily) reflected by an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
	Bool(bool),
	Number(f64),
	Text(String),
}

impl From<bool> for PropertyValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<f64> for PropertyValue {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<&str> for PropertyValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}

impl From<String> for PropertyValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

/// Owning context of a set of nodes. Cheap to clone; clones compare equal.
#[derive(Clone)]
pub struct Document(Rc<DocumentData>);

struct DocumentData {
	default_namespace: Option<String>,
}

impl Debug for Document {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Document").field("default_namespace", &self.0.default_namespace).finish()
	}
}

impl PartialEq for Document {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl Eq for Document {}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl Document {
	/// A document whose [`create_element`](`Document::create_element`) creates elements without namespace.
	#[must_use]
	pub fn new() -> Self {
		Self(Rc::new(DocumentData { default_namespace: None }))
	}

	/// A document whose [`create_element`](`Document::create_element`) creates XHTML elements.
	#[must_use]
	pub fn html() -> Self {
		Self(Rc::new(DocumentData {
			default_namespace: Some(dom::XHTML_NAMESPACE.to_owned()),
		}))
	}

	#[must_use]
	pub fn default_namespace(&self) -> Option<&str> {
		self.0.default_namespace.as_deref()
	}

	#[must_use]
	pub fn create_element(&self, local_name: &str) -> NodeRef {
		self.create_element_ns(self.default_namespace(), local_name)
	}

	/// `qualified_name` may carry a prefix (`svg:rect`), which is kept for serialization only.
	#[must_use]
	pub fn create_element_ns(&self, namespace: Option<&str>, qualified_name: &str) -> NodeRef {
		let (prefix, local_name) = split_qualified(qualified_name);
		self.create(Content::Element(ElementData {
			name: QualifiedName::with_namespace(namespace, local_name),
			prefix: prefix.map(ToOwned::to_owned),
			attributes: Vec::new(),
			properties: HashMap::new(),
		}))
	}

	#[must_use]
	pub fn create_text(&self, text: &str) -> NodeRef {
		self.create(Content::Text(text.to_owned()))
	}

	#[must_use]
	pub fn create_comment(&self, text: &str) -> NodeRef {
		self.create(Content::Comment(text.to_owned()))
	}

	#[must_use]
	pub fn create_fragment(&self) -> NodeRef {
		self.create(Content::Fragment)
	}

	/// Deep copy of `node` owned by this document, including runtime properties.
	#[must_use]
	pub fn import_node(&self, node: &NodeRef) -> NodeRef {
		let root = self.create(node.0.borrow().content.clone());
		let mut pending = vec![(node.clone(), root.clone())];
		while let Some((source, copy)) = pending.pop() {
			for child in source.children() {
				let child_copy = self.create(child.0.borrow().content.clone());
				copy.adopt(&child_copy);
				pending.push((child, child_copy));
			}
		}
		root
	}

	fn create(&self, content: Content) -> NodeRef {
		NodeRef(Rc::new(RefCell::new(NodeData {
			owner: self.clone(),
			parent: Weak::new(),
			children: Vec::new(),
			content,
		})))
	}
}

/// A handle to a node. Cloning the handle doesn't clone the node.
#[derive(Clone)]
pub struct NodeRef(Rc<RefCell<NodeData>>);

struct NodeData {
	owner: Document,
	parent: Weak<RefCell<NodeData>>,
	children: Vec<NodeRef>,
	content: Content,
}

#[derive(Clone)]
enum Content {
	Element(ElementData),
	Text(String),
	Comment(String),
	Fragment,
}

#[derive(Clone)]
struct ElementData {
	name: QualifiedName,
	prefix: Option<String>,
	attributes: Vec<Attribute>,
	properties: HashMap<String, PropertyValue>,
}

impl NodeRef {
	#[must_use]
	pub fn kind(&self) -> NodeKind {
		match self.0.borrow().content {
			Content::Element(_) => NodeKind::Element,
			Content::Text(_) => NodeKind::Text,
			Content::Comment(_) => NodeKind::Comment,
			Content::Fragment => NodeKind::Fragment,
		}
	}

	#[must_use]
	pub fn name(&self) -> Option<QualifiedName> {
		match &self.0.borrow().content {
			Content::Element(element) => Some(element.name.clone()),
			_ => None,
		}
	}

	#[must_use]
	pub fn local_name(&self) -> Option<String> {
		self.name().map(|name| name.local_name)
	}

	#[must_use]
	pub fn text(&self) -> Option<String> {
		match &self.0.borrow().content {
			Content::Text(text) | Content::Comment(text) => Some(text.clone()),
			_ => None,
		}
	}

	/// Returns `false` for anything but text and comment nodes.
	pub fn set_text(&self, value: &str) -> bool {
		match &mut self.0.borrow_mut().content {
			Content::Text(text) | Content::Comment(text) => {
				value.clone_into(text);
				true
			}
			_ => false,
		}
	}

	/// Concatenated text of all descendant text nodes.
	#[must_use]
	pub fn text_content(&self) -> String {
		let mut text = String::new();
		let mut pending = vec![self.clone()];
		while let Some(node) = pending.pop() {
			if let Content::Text(t) = &node.0.borrow().content {
				text.push_str(t);
			}
			pending.extend(node.children().into_iter().rev());
		}
		text
	}

	#[must_use]
	pub fn attributes(&self) -> Vec<Attribute> {
		match &self.0.borrow().content {
			Content::Element(element) => element.attributes.clone(),
			_ => Vec::new(),
		}
	}

	#[must_use]
	pub fn get_attribute(&self, local_name: &str) -> Option<String> {
		self.get_attribute_ns(None, local_name)
	}

	#[must_use]
	pub fn get_attribute_ns(&self, namespace: Option<&str>, local_name: &str) -> Option<String> {
		match &self.0.borrow().content {
			Content::Element(element) => element
				.attributes
				.iter()
				.find(|a| a.name.namespace() == namespace && a.name.local_name == local_name)
				.map(|a| a.value.clone()),
			_ => None,
		}
	}

	pub fn set_attribute(&self, local_name: &str, value: &str) -> bool {
		self.set_attribute_ns(None, local_name, value)
	}

	/// `qualified_name` may carry a prefix (`xlink:href`).
	pub fn set_attribute_ns(&self, namespace: Option<&str>, qualified_name: &str, value: &str) -> bool {
		let (prefix, local_name) = split_qualified(qualified_name);
		self.put_attribute(Attribute {
			name: QualifiedName::with_namespace(namespace, local_name),
			prefix: prefix.map(ToOwned::to_owned),
			value: value.to_owned(),
		})
	}

	fn put_attribute(&self, attribute: Attribute) -> bool {
		match &mut self.0.borrow_mut().content {
			Content::Element(element) => {
				match element.attributes.iter_mut().find(|a| a.name == attribute.name) {
					Some(existing) => existing.value = attribute.value,
					None => element.attributes.push(attribute),
				}
				true
			}
			_ => false,
		}
	}

	pub fn remove_attribute(&self, local_name: &str) -> bool {
		self.remove_attribute_ns(&QualifiedName::new(local_name))
	}

	pub fn remove_attribute_ns(&self, name: &QualifiedName) -> bool {
		match &mut self.0.borrow_mut().content {
			Content::Element(element) => {
				let before = element.attributes.len();
				element.attributes.retain(|a| &a.name != name);
				element.attributes.len() != before
			}
			_ => false,
		}
	}

	#[must_use]
	pub fn property(&self, name: &str) -> Option<PropertyValue> {
		match &self.0.borrow().content {
			Content::Element(element) => element.properties.get(name).cloned(),
			_ => None,
		}
	}

	/// Only elements carry properties.
	pub fn set_property(&self, name: &str, value: impl Into<PropertyValue>) -> bool {
		match &mut self.0.borrow_mut().content {
			Content::Element(element) => {
				element.properties.insert(name.to_owned(), value.into());
				true
			}
			_ => false,
		}
	}

	#[must_use]
	pub fn parent(&self) -> Option<NodeRef> {
		self.0.borrow().parent.upgrade().map(NodeRef)
	}

	#[must_use]
	pub fn children(&self) -> Vec<NodeRef> {
		self.0.borrow().children.clone()
	}

	#[must_use]
	pub fn child(&self, index: usize) -> Option<NodeRef> {
		self.0.borrow().children.get(index).cloned()
	}

	#[must_use]
	pub fn child_count(&self) -> usize {
		self.0.borrow().children.len()
	}

	#[must_use]
	pub fn first_child(&self) -> Option<NodeRef> {
		self.child(0)
	}

	#[must_use]
	pub fn owner_document(&self) -> Document {
		self.0.borrow().owner.clone()
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &NodeRef) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Moves `child` to the end of this node's children.
	///
	/// A fragment `child` stays behind, empty, and its children are moved instead.
	///
	/// Refused (returning `false`) for text/comment parents and anything that would create a cycle.
	pub fn append_child(&self, child: &NodeRef) -> bool {
		if !self.accepts(child) {
			return false;
		}
		if child.kind() == NodeKind::Fragment {
			for grandchild in child.children() {
				grandchild.detach();
				self.adopt(&grandchild);
			}
			return true;
		}
		child.detach();
		self.adopt(child);
		true
	}

	/// Puts `new_child` where `old_child` is. `old_child` ends up parentless.
	pub fn replace_child(&self, new_child: &NodeRef, old_child: &NodeRef) -> bool {
		if new_child.ptr_eq(old_child) {
			return self.index_of(old_child).is_some();
		}
		if !self.accepts(new_child) || new_child.kind() == NodeKind::Fragment || self.index_of(old_child).is_none() {
			return false;
		}
		new_child.detach();
		let index = match self.index_of(old_child) {
			Some(index) => index,
			None => return false,
		};
		self.0.borrow_mut().children[index] = new_child.clone();
		new_child.0.borrow_mut().parent = Rc::downgrade(&self.0);
		old_child.0.borrow_mut().parent = Weak::new();
		true
	}

	pub fn remove_child(&self, child: &NodeRef) -> bool {
		match self.index_of(child) {
			Some(index) => {
				self.0.borrow_mut().children.remove(index);
				child.0.borrow_mut().parent = Weak::new();
				true
			}
			None => false,
		}
	}

	/// Removes this node from its parent, if any.
	pub fn detach(&self) {
		if let Some(parent) = self.parent() {
			parent.remove_child(self);
		}
	}

	fn index_of(&self, child: &NodeRef) -> Option<usize> {
		self.0.borrow().children.iter().position(|c| c.ptr_eq(child))
	}

	fn accepts(&self, child: &NodeRef) -> bool {
		if !matches!(self.kind(), NodeKind::Element | NodeKind::Fragment) {
			return false;
		}
		let mut ancestor = Some(self.clone());
		while let Some(node) = ancestor {
			if node.ptr_eq(child) {
				return false;
			}
			ancestor = node.parent();
		}
		true
	}

	fn adopt(&self, child: &NodeRef) {
		child.0.borrow_mut().parent = Rc::downgrade(&self.0);
		self.0.borrow_mut().children.push(child.clone());
	}
}

fn split_qualified(qualified_name: &str) -> (Option<&str>, &str) {
	match qualified_name.split_once(':') {
		Some((prefix, local_name)) => (Some(prefix), local_name),
		None => (None, qualified_name),
	}
}

impl DomNode for NodeRef {
	type Document = Document;
	type Value = PropertyValue;

	fn kind(&self) -> NodeKind {
		NodeRef::kind(self)
	}

	fn name(&self) -> Option<QualifiedName> {
		NodeRef::name(self)
	}

	fn text(&self) -> Option<String> {
		NodeRef::text(self)
	}

	fn set_text(&self, text: &str) -> bool {
		NodeRef::set_text(self, text)
	}

	fn attributes(&self) -> Vec<Attribute> {
		NodeRef::attributes(self)
	}

	fn attribute(&self, name: &QualifiedName) -> Option<String> {
		self.get_attribute_ns(name.namespace(), &name.local_name)
	}

	fn set_attribute(&self, attribute: &Attribute) -> bool {
		self.put_attribute(attribute.clone())
	}

	fn remove_attribute(&self, name: &QualifiedName) -> bool {
		self.remove_attribute_ns(name)
	}

	fn property(&self, name: &str) -> Option<PropertyValue> {
		NodeRef::property(self, name)
	}

	fn set_property(&self, name: &str, value: PropertyValue) -> bool {
		NodeRef::set_property(self, name, value)
	}

	fn parent(&self) -> Option<Self> {
		NodeRef::parent(self)
	}

	fn child(&self, index: usize) -> Option<Self> {
		NodeRef::child(self, index)
	}

	fn child_count(&self) -> usize {
		NodeRef::child_count(self)
	}

	fn append_child(&self, child: &Self) -> bool {
		NodeRef::append_child(self, child)
	}

	fn replace_child(&self, new_child: &Self, old_child: &Self) -> bool {
		NodeRef::replace_child(self, new_child, old_child)
	}

	fn remove_child(&self, child: &Self) -> bool {
		NodeRef::remove_child(self, child)
	}

	fn owner_document(&self) -> Document {
		NodeRef::owner_document(self)
	}

	fn is_same(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl DomDocument for Document {
	type Node = NodeRef;

	fn import_node(&self, node: &NodeRef) -> Option<NodeRef> {
		Some(Document::import_node(self, node))
	}

	fn create_fragment(&self) -> NodeRef {
		Document::create_fragment(self)
	}

	fn create_text(&self, text: &str) -> NodeRef {
		Document::create_text(self, text)
	}
}

/// Serializes the subtree as XML-style markup. Namespace declarations are only written where they exist as attributes.
impl Display for NodeRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let data = self.0.borrow();
		match &data.content {
			Content::Text(text) => f.write_str(&escape(text.as_str())),
			Content::Comment(text) => write!(f, "<!--{}-->", text),
			Content::Fragment => data.children.iter().try_for_each(|child| Display::fmt(child, f)),
			Content::Element(element) => {
				let tag = match &element.prefix {
					Some(prefix) => format!("{}:{}", prefix, element.name.local_name),
					None => element.name.local_name.clone(),
				};
				write!(f, "<{}", tag)?;
				for attribute in &element.attributes {
					write!(f, " {}=\"{}\"", attribute.qualified_name(), escape(attribute.value.as_str()))?;
				}
				if data.children.is_empty() {
					return f.write_str("/>");
				}
				f.write_str(">")?;
				for child in &data.children {
					Display::fmt(child, f)?;
				}
				write!(f, "</{}>", tag)
			}
		}
	}
}

impl Debug for NodeRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self.name() {
			Some(name) => write!(f, "NodeRef(<{}>)", name),
			None => write!(f, "NodeRef({:?})", self.kind()),
		}
	}
}
