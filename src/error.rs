use crate::dom::QualifiedName;
use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Everything [`Renderer::render`](`crate::Renderer::render`) can fail with.
///
/// Reconciliation is deterministic, so none of these are worth retrying with the same inputs.
#[derive(Debug, Error)]
pub enum RenderError {
	/// The source and target roots have different names while the target is attached to a parent.
	/// `expected` is the source root's name, `found` the target root's.
	#[error("cannot morph attached <{found}> into <{expected}>")]
	StructuralMismatch { expected: QualifiedName, found: QualifiedName },

	#[error("no element matches selector {0:?}")]
	SelectorNotFound(String),

	#[error("source markup could not be loaded")]
	ParseFailure(#[from] LoadError),
}

/// Errors from a [`SourceLoader`](`crate::load::SourceLoader`).
#[derive(Debug, Error)]
pub enum LoadError {
	#[error(transparent)]
	Xml(#[from] quick_xml::Error),

	#[error(transparent)]
	Attribute(#[from] AttrError),

	#[error("namespace prefix {0:?} is not bound")]
	UnboundPrefix(String),

	#[error("element <{0}> is not closed")]
	UnclosedElement(String),

	#[error("markup contains no element")]
	NoElement,

	/// The host refused to parse the markup. Carries its error message.
	#[error("host parser error: {0}")]
	Host(String),
}
