//! Turning markup into source trees.

use crate::{
	dom::{DomNode, XLINK_NAMESPACE, XMLNS_NAMESPACE, XML_NAMESPACE},
	error::LoadError,
	tree::{Document, NodeRef},
};
use hashbrown::HashMap;
use quick_xml::{
	events::{BytesStart, Event},
	name::{Prefix, ResolveResult},
	NsReader,
};
use tracing::{instrument, trace};

/// Parses markup as partial content of `context`, into a node owned by (or importable into) `context`'s document.
///
/// Unprefixed elements take `context`'s namespace, so `<use/>` loaded for a node inside an `<svg>` is an SVG element.
pub trait SourceLoader<N: DomNode> {
	/// Returns the first top-level element.
	///
	/// # Errors
	///
	/// Iff the markup is malformed or contains no element.
	fn load(&self, markup: &str, context: &N) -> Result<N, LoadError>;
}

/// Loads XML fragments into the in-memory [`tree`](`crate::tree`).
///
/// Prefixes that aren't declared in the markup itself are looked up in the loader's own table,
/// so that partial content like `<use xlink:href="#icon"/>` can be loaded without repeating declarations.
/// Unprefixed elements without a default namespace declaration take the document's [default namespace](`Document::default_namespace`),
/// or the context element's namespace when loaded with [`MarkupLoader::load_in`].
#[derive(Debug, Clone)]
pub struct MarkupLoader {
	namespaces: HashMap<String, String>,
}

impl Default for MarkupLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl MarkupLoader {
	/// Knows the `xml` and `xlink` prefixes.
	#[must_use]
	pub fn new() -> Self {
		Self {
			namespaces: [("xml", XML_NAMESPACE), ("xlink", XLINK_NAMESPACE)]
				.iter()
				.map(|&(prefix, namespace)| (prefix.to_owned(), namespace.to_owned()))
				.collect(),
		}
	}

	#[must_use]
	pub fn with_namespace(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
		self.namespaces.insert(prefix.into(), namespace.into());
		self
	}

	/// # Errors
	///
	/// Iff the markup is malformed or contains no element.
	pub fn load_str(&self, markup: &str, document: &Document) -> Result<NodeRef, LoadError> {
		self.parse(markup, document, None)
	}

	/// Loads `markup` as content of `context`.
	///
	/// Unprefixed elements take `context`'s namespace.
	/// Prefixes declared on `context` or its ancestors are in scope, ahead of the loader's table.
	///
	/// # Errors
	///
	/// Iff the markup is malformed or contains no element.
	pub fn load_in(&self, markup: &str, context: &NodeRef) -> Result<NodeRef, LoadError> {
		self.parse(markup, &context.owner_document(), Some(context))
	}

	#[instrument(skip(self, markup, document, context), fields(markup.len = markup.len()))]
	fn parse(&self, markup: &str, document: &Document, context: Option<&NodeRef>) -> Result<NodeRef, LoadError> {
		let default_namespace = match context.and_then(NodeRef::name) {
			Some(name) => name.namespace().map(ToOwned::to_owned),
			None => document.default_namespace().map(ToOwned::to_owned),
		};
		let scope = Scope { default_namespace: default_namespace.as_deref(), context };
		let mut reader = NsReader::from_str(markup);
		let fragment = document.create_fragment();
		let mut open = vec![fragment.clone()];

		loop {
			let parent = match open.last() {
				Some(parent) => parent.clone(),
				None => fragment.clone(),
			};
			match reader.read_event()? {
				Event::Start(start) => {
					let element = self.element(&reader, &start, document, &scope)?;
					parent.append_child(&element);
					open.push(element);
				}
				Event::Empty(start) => {
					let element = self.element(&reader, &start, document, &scope)?;
					parent.append_child(&element);
				}
				Event::End(_) => {
					if open.len() > 1 {
						open.pop();
					}
				}
				Event::Text(text) => {
					parent.append_child(&document.create_text(&text.unescape()?));
				}
				Event::CData(data) => {
					parent.append_child(&document.create_text(&String::from_utf8_lossy(&data)));
				}
				Event::Comment(comment) => {
					parent.append_child(&document.create_comment(&String::from_utf8_lossy(&comment)));
				}
				Event::Eof => break,
				_ => trace!("Skipping declaration, processing instruction or doctype."),
			}
		}

		if open.len() > 1 {
			let name = open.last().and_then(NodeRef::local_name).unwrap_or_default();
			return Err(LoadError::UnclosedElement(name));
		}

		let root = fragment.children().into_iter().find(|child| child.name().is_some()).ok_or(LoadError::NoElement)?;
		root.detach();
		Ok(root)
	}

	fn element(&self, reader: &NsReader<&[u8]>, start: &BytesStart<'_>, document: &Document, scope: &Scope<'_>) -> Result<NodeRef, LoadError> {
		let name = start.name();
		let (resolved, _) = reader.resolve_element(name);
		let namespace = match self.resolve(resolved, name.prefix(), scope)? {
			Some(namespace) => Some(namespace),
			None => scope.default_namespace.map(ToOwned::to_owned),
		};
		let element = document.create_element_ns(namespace.as_deref(), &String::from_utf8_lossy(name.as_ref()));

		for attribute in start.attributes() {
			let attribute = attribute?;
			let key = attribute.key;
			let namespace = if key.as_namespace_binding().is_some() {
				Some(XMLNS_NAMESPACE.to_owned())
			} else if key.prefix().is_none() {
				None
			} else {
				let (resolved, _) = reader.resolve_attribute(key);
				self.resolve(resolved, key.prefix(), scope)?
			};
			element.set_attribute_ns(namespace.as_deref(), &String::from_utf8_lossy(key.as_ref()), &attribute.unescape_value()?);
		}

		Ok(element)
	}

	fn resolve(&self, resolved: ResolveResult<'_>, prefix: Option<Prefix<'_>>, scope: &Scope<'_>) -> Result<Option<String>, LoadError> {
		match resolved {
			ResolveResult::Bound(namespace) => Ok(Some(String::from_utf8_lossy(namespace.as_ref()).into_owned())),
			ResolveResult::Unbound => Ok(None),
			ResolveResult::Unknown(unknown) => {
				let prefix = prefix.map_or_else(|| String::from_utf8_lossy(&unknown).into_owned(), |prefix| String::from_utf8_lossy(prefix.as_ref()).into_owned());
				if let Some(namespace) = scope.context.and_then(|context| declared_namespace(context, &prefix)) {
					trace!(%prefix, %namespace, "Resolved undeclared prefix from context.");
					return Ok(Some(namespace));
				}
				match self.namespaces.get(&prefix) {
					Some(namespace) => {
						trace!(%prefix, %namespace, "Resolved undeclared prefix from loader table.");
						Ok(Some(namespace.clone()))
					}
					None => Err(LoadError::UnboundPrefix(prefix)),
				}
			}
		}
	}
}

struct Scope<'a> {
	default_namespace: Option<&'a str>,
	context: Option<&'a NodeRef>,
}

/// The namespace `prefix` is bound to by an `xmlns:` attribute on `node` or its nearest declaring ancestor.
fn declared_namespace(node: &NodeRef, prefix: &str) -> Option<String> {
	let mut current = Some(node.clone());
	while let Some(node) = current {
		if let Some(namespace) = node.get_attribute_ns(Some(XMLNS_NAMESPACE), prefix) {
			return Some(namespace);
		}
		current = node.parent();
	}
	None
}

impl SourceLoader<NodeRef> for MarkupLoader {
	fn load(&self, markup: &str, context: &NodeRef) -> Result<NodeRef, LoadError> {
		self.load_in(markup, context)
	}
}
