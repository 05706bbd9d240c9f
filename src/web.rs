//! The node model for the browser DOM.
//!
//! Note that [`web_sys::Node`] has inherent methods named like some of [`DomNode`]'s.
//! Call those through the trait (e.g. `DomNode::append_child(&node, &child)`) where the distinction matters.

use crate::{
	dom::{Attribute, DomDocument, DomNode, NodeKind, QualifiedName, XHTML_NAMESPACE, XLINK_NAMESPACE},
	error::LoadError,
	load::SourceLoader,
};
use core::convert::TryInto;
use js_sys::Reflect;
use tracing::{error, instrument, trace};
use wasm_bindgen::{JsCast, JsValue, UnwrapThrowExt};
use web_sys::{CharacterData, Document, DomParser, Element, Node, SupportedType};

impl DomNode for Node {
	type Document = Document;
	type Value = JsValue;

	fn kind(&self) -> NodeKind {
		match self.node_type() {
			Node::ELEMENT_NODE => NodeKind::Element,
			Node::TEXT_NODE | Node::CDATA_SECTION_NODE => NodeKind::Text,
			Node::COMMENT_NODE => NodeKind::Comment,
			Node::DOCUMENT_FRAGMENT_NODE => NodeKind::Fragment,
			_ => NodeKind::Other,
		}
	}

	fn name(&self) -> Option<QualifiedName> {
		self.dyn_ref::<Element>()
			.map(|element| QualifiedName::with_namespace(element.namespace_uri(), element.local_name()))
	}

	fn text(&self) -> Option<String> {
		self.dyn_ref::<CharacterData>().map(CharacterData::data)
	}

	fn set_text(&self, text: &str) -> bool {
		match self.dyn_ref::<CharacterData>() {
			Some(data) => {
				data.set_data(text);
				true
			}
			None => false,
		}
	}

	fn attributes(&self) -> Vec<Attribute> {
		let element = match self.dyn_ref::<Element>() {
			Some(element) => element,
			None => return Vec::new(),
		};
		let attributes = element.attributes();
		(0..attributes.length())
			.filter_map(|i| attributes.item(i))
			.map(|attr| Attribute {
				name: QualifiedName::with_namespace(attr.namespace_uri(), attr.local_name()),
				prefix: attr.prefix(),
				value: attr.value(),
			})
			.collect()
	}

	fn attribute(&self, name: &QualifiedName) -> Option<String> {
		self.dyn_ref::<Element>()?.get_attribute_ns(name.namespace(), &name.local_name)
	}

	fn set_attribute(&self, attribute: &Attribute) -> bool {
		let element = match self.dyn_ref::<Element>() {
			Some(element) => element,
			None => return false,
		};
		match element.set_attribute_ns(attribute.name.namespace(), &attribute.qualified_name(), &attribute.value) {
			Ok(()) => true,
			Err(error) => {
				error!(name = %attribute.name, ?error, "Failed to set attribute.");
				false
			}
		}
	}

	fn remove_attribute(&self, name: &QualifiedName) -> bool {
		let element = match self.dyn_ref::<Element>() {
			Some(element) => element,
			None => return false,
		};
		match element.remove_attribute_ns(name.namespace(), &name.local_name) {
			Ok(()) => true,
			Err(error) => {
				error!(%name, ?error, "Failed to remove attribute.");
				false
			}
		}
	}

	fn property(&self, name: &str) -> Option<JsValue> {
		let key = JsValue::from_str(name);
		match Reflect::has(self, &key) {
			Ok(true) => Reflect::get(self, &key).ok(),
			Ok(false) | Err(_) => None,
		}
	}

	fn set_property(&self, name: &str, value: JsValue) -> bool {
		match Reflect::set(self, &JsValue::from_str(name), &value) {
			Ok(set) => set,
			Err(error) => {
				error!(name, ?error, "Failed to set property.");
				false
			}
		}
	}

	fn parent(&self) -> Option<Self> {
		self.parent_node()
	}

	fn child(&self, index: usize) -> Option<Self> {
		self.child_nodes().item(index.try_into().ok()?)
	}

	fn child_count(&self) -> usize {
		self.child_nodes().length() as usize
	}

	fn has_children(&self) -> bool {
		self.has_child_nodes()
	}

	fn append_child(&self, child: &Self) -> bool {
		Node::append_child(self, child).map_err(|error| trace!(?error, "Host refused append.")).is_ok()
	}

	fn replace_child(&self, new_child: &Self, old_child: &Self) -> bool {
		Node::replace_child(self, new_child, old_child).map_err(|error| trace!(?error, "Host refused replacement.")).is_ok()
	}

	fn remove_child(&self, child: &Self) -> bool {
		Node::remove_child(self, child).map_err(|error| trace!(?error, "Host refused removal.")).is_ok()
	}

	fn owner_document(&self) -> Document {
		match self.dyn_ref::<Document>() {
			Some(document) => document.clone(),
			None => Node::owner_document(self).expect_throw("dom-morph: No owner document found for node."),
		}
	}

	fn is_same(&self, other: &Self) -> bool {
		self.is_same_node(Some(other))
	}
}

impl DomDocument for Document {
	type Node = Node;

	fn import_node(&self, node: &Node) -> Option<Node> {
		match self.import_node_with_deep(node, true) {
			Ok(clone) => Some(clone),
			Err(error) => {
				error!(?error, "Failed to import node.");
				None
			}
		}
	}

	fn create_fragment(&self) -> Node {
		self.create_document_fragment().into()
	}

	fn create_text(&self, text: &str) -> Node {
		self.create_text_node(text).into()
	}
}

/// Parses XML fragments with the browser's own [***DOMParser***](https://developer.mozilla.org/en-US/docs/Web/API/DOMParser).
///
/// The markup is parsed inside a wrapper element that declares the context's namespace (XHTML outside of elements)
/// as default namespace, along with each known prefix and each prefix the context has in scope,
/// so partial content can use `xlink:` and unprefixed element names without declarations.
#[derive(Debug, Clone)]
pub struct WebLoader {
	namespaces: Vec<(String, String)>,
}

impl Default for WebLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl WebLoader {
	/// Knows the `xlink` prefix.
	#[must_use]
	pub fn new() -> Self {
		Self {
			namespaces: vec![("xlink".to_owned(), XLINK_NAMESPACE.to_owned())],
		}
	}

	#[must_use]
	pub fn with_namespace(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
		self.namespaces.push((prefix.into(), namespace.into()));
		self
	}

	fn wrap(&self, markup: &str, context: &Node) -> String {
		let default_namespace = match context.dyn_ref::<Element>() {
			Some(element) => element.namespace_uri().unwrap_or_default(),
			None => XHTML_NAMESPACE.to_owned(),
		};
		let mut wrapped = format!(r#"<dom-morph-root xmlns="{}""#, quick_xml::escape::escape(default_namespace.as_str()));
		for (prefix, namespace) in &self.namespaces {
			let namespace = context.lookup_namespace_uri(Some(prefix.as_str())).unwrap_or_else(|| namespace.clone());
			wrapped.push_str(&format!(r#" xmlns:{}="{}""#, prefix, quick_xml::escape::escape(namespace.as_str())));
		}
		wrapped.push('>');
		wrapped.push_str(markup);
		wrapped.push_str("</dom-morph-root>");
		wrapped
	}
}

impl SourceLoader<Node> for WebLoader {
	#[instrument(skip(markup, context), fields(markup.len = markup.len()))]
	fn load(&self, markup: &str, context: &Node) -> Result<Node, LoadError> {
		let document = DomNode::owner_document(context);
		let parser = DomParser::new().map_err(host_error)?;
		let parsed = parser.parse_from_string(&self.wrap(markup, context), SupportedType::ApplicationXml).map_err(host_error)?;

		if let Some(report) = parsed.get_elements_by_tag_name("parsererror").item(0) {
			return Err(LoadError::Host(report.text_content().unwrap_or_default()));
		}

		let element = parsed
			.document_element()
			.and_then(|root| root.first_element_child())
			.ok_or(LoadError::NoElement)?;
		document.import_node_with_deep(&element, true).map_err(host_error)
	}
}

fn host_error(error: JsValue) -> LoadError {
	LoadError::Host(error.as_string().unwrap_or_else(|| format!("{:?}", error)))
}
