//! The reconciler.

use crate::{
	attributes::merge_attributes_with,
	cursor::Cursor,
	dom::{contains_comment, is_equal_node, is_same_kind, normalize, text_content, DomDocument, DomNode, NodeKind, QualifiedName},
	error::RenderError,
	load::{MarkupLoader, SourceLoader},
	mutate::{Mutation, Mutator, RenderStats},
	properties::synchronize_properties,
	scratch_set::ScratchSet,
	select::{SelectorEngine, SimpleSelector},
	tree::NodeRef,
};
use tracing::{debug, error, info, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, Level};

/// What to render from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a, N> {
	/// An already built tree. It may belong to another document.
	///
	/// It is only read from, except that [`Options::normalize`] merges its adjacent text nodes.
	Node(&'a N),
	/// Markup for the [`Renderer`]'s [`SourceLoader`], loaded as content of the (scoped) target.
	Markup(&'a str),
}

/// How same-named elements whose source has children are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
	/// Replace the target subtree with a clone, unless both are already equal.
	ReplaceNonEmpty,
	/// Merge in place and reconcile the children, preserving node identity at every depth.
	Recurse,
}

impl Default for Strategy {
	fn default() -> Self {
		Self::ReplaceNonEmpty
	}
}

/// Per-call options of [`Renderer::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
	/// Reconcile descendants. Otherwise only the roots' attributes and properties are synchronized.
	pub deep: bool,
	/// Skip comments in the source and remove them from the target.
	pub ignore_comments: bool,
	/// Narrows the source to the first matching descendant.
	pub source_selector: Option<String>,
	/// Narrows the target to the first matching descendant.
	pub target_selector: Option<String>,
	/// Merge-vs-replace policy for same-named elements whose source has children.
	pub strategy: Strategy,
	/// Merge adjacent text nodes and drop empty ones in source and target before reconciling.
	pub normalize: bool,
	/// Reconcile elements only. Other nodes are neither compared nor removed,
	/// and elements without element children get the source's text content instead.
	pub ignore_text: bool,
	/// Collect the nodes appended to one parent in a document fragment and insert them with a single call.
	pub use_fragment: bool,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			deep: true,
			ignore_comments: false,
			source_selector: None,
			target_selector: None,
			strategy: Strategy::default(),
			normalize: true,
			ignore_text: false,
			use_fragment: false,
		}
	}
}

impl Options {
	#[must_use]
	pub fn deep(mut self, deep: bool) -> Self {
		self.deep = deep;
		self
	}

	#[must_use]
	pub fn ignore_comments(mut self, ignore_comments: bool) -> Self {
		self.ignore_comments = ignore_comments;
		self
	}

	#[must_use]
	pub fn source_selector(mut self, selector: impl Into<String>) -> Self {
		self.source_selector = Some(selector.into());
		self
	}

	#[must_use]
	pub fn target_selector(mut self, selector: impl Into<String>) -> Self {
		self.target_selector = Some(selector.into());
		self
	}

	#[must_use]
	pub fn strategy(mut self, strategy: Strategy) -> Self {
		self.strategy = strategy;
		self
	}

	#[must_use]
	pub fn normalize(mut self, normalize: bool) -> Self {
		self.normalize = normalize;
		self
	}

	#[must_use]
	pub fn ignore_text(mut self, ignore_text: bool) -> Self {
		self.ignore_text = ignore_text;
		self
	}

	#[must_use]
	pub fn use_fragment(mut self, use_fragment: bool) -> Self {
		self.use_fragment = use_fragment;
		self
	}
}

/// Morphs target trees into the shape of source trees.
///
/// The loader is only used for [`Source::Markup`], the selector engine only for [`Options::source_selector`] and [`Options::target_selector`].
///
/// # Correct Use
///
/// Node handles that are obtained from the target before a render may afterwards point to nodes that were removed from it.
/// Only nodes that were reconciled in place (text nodes and merged elements) keep their position.
#[derive(Debug, Clone, Default)]
pub struct Renderer<L = MarkupLoader, S = SimpleSelector> {
	loader: L,
	selector: S,
}

impl<L, S> Renderer<L, S> {
	#[must_use]
	pub fn new(loader: L, selector: S) -> Self {
		Self { loader, selector }
	}

	#[must_use]
	pub fn loader(&self) -> &L {
		&self.loader
	}

	#[must_use]
	pub fn selector(&self) -> &S {
		&self.selector
	}

	/// Mutates `target` (or its descendant selected by [`Options::target_selector`]) until it is structurally equal to `source`.
	///
	/// Returns the reconciled node, which is the (scoped) target itself unless it had no parent and a different name than the source root.
	/// In that case, the target is left alone and a clone of the source is returned instead.
	///
	/// # Errors
	///
	/// - [`RenderError::ParseFailure`] iff `source` is markup the loader rejects,
	/// - [`RenderError::SelectorNotFound`] iff a selector in `options` matches nothing,
	/// - [`RenderError::StructuralMismatch`] iff the roots' names differ while the (scoped) target has a parent.
	pub fn render<N>(&self, source: Source<'_, N>, target: &N, options: &Options) -> Result<N, RenderError>
	where
		N: DomNode,
		L: SourceLoader<N>,
		S: SelectorEngine<N>,
	{
		self.render_with_stats(source, target, options).map(|(node, _)| node)
	}

	/// As [`render`](`Renderer::render`), but also returns the counts of applied mutations.
	///
	/// # Errors
	///
	/// As [`render`](`Renderer::render`).
	#[instrument(skip(self, source, target))]
	pub fn render_with_stats<N>(&self, source: Source<'_, N>, target: &N, options: &Options) -> Result<(N, RenderStats), RenderError>
	where
		N: DomNode,
		L: SourceLoader<N>,
		S: SelectorEngine<N>,
	{
		let target = self.scope(target.clone(), options.target_selector.as_deref())?;
		let source = match source {
			Source::Node(node) => node.clone(),
			Source::Markup(markup) => self.loader.load(markup, &target)?,
		};
		let source = self.scope(source, options.source_selector.as_deref())?;

		let document = target.owner_document();
		let mut session = Session::new(document.clone(), options);

		if !is_same_kind(&source, &target) {
			let (expected, found) = (name_of(&source), name_of(&target));
			if target.parent().is_some() {
				return Err(RenderError::StructuralMismatch { expected, found });
			}
			debug!(%expected, %found, "Detached root mismatch. Returning a clone of the source.");
			return match session.mutator.import(&source) {
				Some(clone) => Ok((clone, session.finish())),
				None => Ok((target, session.finish())),
			};
		}

		if options.normalize {
			normalize(&source);
			let normalized = normalize(&target);
			session.mutator.record(Mutation::SetText, normalized.rewritten);
			session.mutator.record(Mutation::RemoveChild, normalized.removed);
		}

		if session.is_unchanged(&source, &target) {
			trace!("Source and target are equal. Only synchronizing properties.");
			session.synchronize_kept(&source, &target);
			return Ok((target, session.finish()));
		}

		let fragment = if target.parent().is_none() && target.kind() != NodeKind::Fragment {
			let fragment = document.create_fragment();
			if fragment.append_child(&target) {
				Some(fragment)
			} else {
				error!("Failed to parent target under a temporary fragment. Continuing without.");
				None
			}
		} else {
			None
		};

		session.merge_root(&source, &target);
		if options.deep {
			session.walk(&source, &target);
		} else if options.ignore_comments {
			session.strip_child_comments(&target);
		}

		if let Some(fragment) = fragment {
			if !fragment.remove_child(&target) {
				error!("Failed to detach target from its temporary fragment.");
			}
		}

		Ok((target, session.finish()))
	}

	fn scope<N>(&self, root: N, selector: Option<&str>) -> Result<N, RenderError>
	where
		N: DomNode,
		S: SelectorEngine<N>,
	{
		match selector {
			Some(selector) => self.selector.query(&root, selector).ok_or_else(|| RenderError::SelectorNotFound(selector.to_owned())),
			None => Ok(root),
		}
	}
}

/// Renders onto an in-memory tree with the default [`Renderer`].
///
/// # Errors
///
/// As [`Renderer::render`].
pub fn render(source: Source<'_, NodeRef>, target: &NodeRef, options: &Options) -> Result<NodeRef, RenderError> {
	Renderer::<MarkupLoader, SimpleSelector>::default().render(source, target, options)
}

fn name_of<N: DomNode>(node: &N) -> QualifiedName {
	node.name().unwrap_or_else(|| {
		QualifiedName::new(match node.kind() {
			NodeKind::Element => "#element",
			NodeKind::Text => "#text",
			NodeKind::Comment => "#comment",
			NodeKind::Fragment => "#document-fragment",
			NodeKind::Other => "#other",
		})
	})
}

enum Step {
	Descend,
	Next,
}

struct Session<'a, N: DomNode> {
	options: &'a Options,
	mutator: Mutator<N::Document>,
	keys: ScratchSet<QualifiedName>,
}

impl<'a, N: DomNode> Session<'a, N> {
	fn new(document: N::Document, options: &'a Options) -> Self {
		Self {
			options,
			mutator: Mutator::new(document, options.ignore_comments),
			keys: ScratchSet::new(),
		}
	}

	fn finish(self) -> RenderStats {
		let stats = self.mutator.into_stats();
		info!("Render mutations: {}", stats);
		if STATIC_MAX_LEVEL >= Level::INFO {
			info!("Scratch heap capacity (attribute keys): {}", self.keys.capacity());
		}
		stats
	}

	fn merge_root(&mut self, source: &N, target: &N) {
		match source.kind() {
			NodeKind::Element => self.merge_element(source, target),
			NodeKind::Text | NodeKind::Comment => self.merge_text(source, target),
			NodeKind::Fragment | NodeKind::Other => (),
		}
	}

	fn merge_element(&mut self, source: &N, target: &N) {
		let changes = merge_attributes_with(&mut self.keys, source, target);
		self.mutator.record(Mutation::SetAttribute, changes.set);
		self.mutator.record(Mutation::RemoveAttribute, changes.removed);
		let properties = synchronize_properties(source, target);
		self.mutator.record(Mutation::SetProperty, properties);
	}

	fn merge_text(&mut self, source: &N, target: &N) {
		if let Some(text) = source.text() {
			if target.text().as_deref() != Some(text.as_str()) {
				self.mutator.set_text(target, &text);
			}
		}
	}

	/// Whether the traversal passes over `node` without reconciling it.
	fn is_skipped(&self, node: &N) -> bool {
		match node.kind() {
			NodeKind::Element => false,
			NodeKind::Comment if self.options.ignore_comments => true,
			_ => self.options.ignore_text,
		}
	}

	/// Children that survive the comment and text policies.
	fn has_children(&self, node: &N) -> bool {
		if self.options.ignore_comments || self.options.ignore_text {
			(0..node.child_count()).filter_map(|i| node.child(i)).any(|child| !self.is_skipped(&child))
		} else {
			node.has_children()
		}
	}

	fn is_unchanged(&self, source: &N, target: &N) -> bool {
		is_equal_node(source, target) && !(self.options.ignore_comments && contains_comment(target))
	}

	/// Copies properties pairwise through two equal subtrees that are kept as they are.
	fn synchronize_kept(&mut self, source: &N, target: &N) {
		let mut pending = vec![(source.clone(), target.clone())];
		while let Some((source, target)) = pending.pop() {
			if source.kind() == NodeKind::Element {
				let properties = synchronize_properties(&source, &target);
				self.mutator.record(Mutation::SetProperty, properties);
			}
			pending.extend((0..source.child_count()).filter_map(|i| Some((source.child(i)?, target.child(i)?))));
		}
	}

	/// Gives an element whose source has no element children the source's text content.
	fn merge_text_content(&mut self, source: &N, target: &N) {
		let text = text_content(source);
		let has_elements = (0..target.child_count()).filter_map(|i| target.child(i)).any(|child| child.kind() == NodeKind::Element);
		if has_elements || text_content(target) != text {
			self.mutator.set_text_content(target, &text);
		}
	}

	fn strip_child_comments(&mut self, target: &N) {
		let mut i = 0;
		while let Some(child) = target.child(i) {
			if child.kind() == NodeKind::Comment && self.mutator.remove(&child) {
				continue;
			}
			i += 1;
		}
	}

	fn walk(&mut self, source: &N, target: &N) {
		if self.options.ignore_text && source.kind() == NodeKind::Element && !self.has_children(source) {
			self.merge_text_content(source, target);
			return;
		}

		let mut sources = Cursor::new(source.clone());
		let mut targets = Cursor::new(target.clone());
		let mut batch: Option<N> = None;

		loop {
			let target_node = targets.current();
			if let Some(node) = target_node.as_ref().filter(|node| self.is_skipped(node)) {
				if !(node.kind() == NodeKind::Comment && self.options.ignore_comments && self.mutator.remove(node)) {
					targets.next_sibling();
				}
				continue;
			}

			let source_node = sources.current();
			if source_node.as_ref().map_or(false, |node| self.is_skipped(node)) {
				sources.next_sibling();
				continue;
			}

			match (source_node, target_node) {
				(None, _) => {
					if let Some(parent) = targets.parent().cloned() {
						let removed = if self.options.ignore_text {
							self.mutator.remove_elements_from(&parent, targets.index())
						} else {
							self.mutator.remove_from(&parent, targets.index())
						};
						if removed != 0 {
							trace!(removed, depth = targets.depth(), "Removed surplus nodes.");
						}
						if let Some(fragment) = batch.take() {
							self.mutator.insert_fragment(&parent, &fragment);
						}
					}
					sources.ascend();
					if !targets.ascend() {
						break;
					}
					sources.next_sibling();
					targets.next_sibling();
				}
				(Some(source), None) => {
					let parent = if self.options.use_fragment {
						Some(batch.get_or_insert_with(|| self.mutator.document().create_fragment()).clone())
					} else {
						targets.parent().cloned()
					};
					if let Some(parent) = parent {
						self.mutator.append_clone(&parent, &source);
					}
					sources.next_sibling();
					targets.next_sibling();
				}
				(Some(source), Some(target)) => {
					let span = trace_span!("Reconciling", source = ?source.kind(), target = ?target.kind(), depth = targets.depth(), index = targets.index());
					let _enter = span.enter();
					match self.reconcile(&source, &target) {
						Step::Descend => {
							sources.descend();
							targets.descend();
						}
						Step::Next => {
							sources.next_sibling();
							targets.next_sibling();
						}
					}
				}
			}
		}
	}

	fn reconcile(&mut self, source: &N, target: &N) -> Step {
		match (source.kind(), target.kind()) {
			(NodeKind::Text, NodeKind::Text) | (NodeKind::Comment, NodeKind::Comment) => {
				self.merge_text(source, target);
				Step::Next
			}
			(NodeKind::Element, NodeKind::Element) if is_same_kind(source, target) => {
				if !self.has_children(source) {
					self.merge_element(source, target);
					if self.options.ignore_text {
						self.merge_text_content(source, target);
						return Step::Next;
					}
					return if target.has_children() { Step::Descend } else { Step::Next };
				}
				match self.options.strategy {
					Strategy::Recurse => {
						self.merge_element(source, target);
						Step::Descend
					}
					Strategy::ReplaceNonEmpty => {
						if self.is_unchanged(source, target) {
							trace!("Subtree unchanged. Keeping it.");
							self.synchronize_kept(source, target);
						} else {
							self.mutator.replace_with_clone(target, source);
						}
						Step::Next
					}
				}
			}
			_ => {
				self.mutator.replace_with_clone(target, source);
				Step::Next
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tree::Document;

	fn load(markup: &str, document: &Document) -> NodeRef {
		MarkupLoader::new().load_str(markup, document).unwrap()
	}

	fn morph(source: &str, target: &str, options: &Options) -> (NodeRef, NodeRef, RenderStats) {
		let document = Document::new();
		let source = load(source, &document);
		let target = load(target, &document);
		let (result, stats) = Renderer::<MarkupLoader, SimpleSelector>::default().render_with_stats(Source::Node(&source), &target, options).unwrap();
		(target, result, stats)
	}

	#[test]
	fn scenario_a_attribute_is_added() {
		let (target, result, stats) = morph(r#"<div id="x"/>"#, "<div/>", &Options::default());
		assert!(result.ptr_eq(&target));
		assert_eq!(target.to_string(), r#"<div id="x"/>"#);
		assert_eq!(stats.get(Mutation::SetAttribute), 1);
		assert_eq!(stats.total(), 1);
	}

	#[test]
	fn scenario_b_missing_child_is_appended() {
		let document = Document::new();
		let source = load("<div><span/><span/></div>", &document);
		let target = load("<div><span/></div>", &document);
		let first = target.first_child().unwrap();

		let (_, stats) = Renderer::<MarkupLoader, SimpleSelector>::default().render_with_stats(Source::Node(&source), &target, &Options::default()).unwrap();
		assert_eq!(target.to_string(), "<div><span/><span/></div>");
		assert!(target.first_child().unwrap().ptr_eq(&first));
		assert_eq!(stats.get(Mutation::AppendChild), 1);
	}

	#[test]
	fn scenario_c_text_identity_is_preserved() {
		let document = Document::new();
		let target = load("<div>goodbye</div>", &document);
		let text = target.first_child().unwrap();
		render(Source::Markup("<div>hello</div>"), &target, &Options::default()).unwrap();
		assert!(target.first_child().unwrap().ptr_eq(&text));
		assert_eq!(text.text().as_deref(), Some("hello"));
	}

	#[test]
	fn scenario_d_target_selector_scopes() {
		let document = Document::new();
		let target = load(r#"<b class="outer"><a/></b>"#, &document);
		let result = render(Source::Markup(r#"<a id="1"/>"#), &target, &Options::default().target_selector("a")).unwrap();
		assert_eq!(target.to_string(), r#"<b class="outer"><a id="1"/></b>"#);
		assert!(result.parent().unwrap().ptr_eq(&target));
	}

	#[test]
	fn scenario_e_mismatched_child_is_replaced() {
		let (target, _, stats) = morph(r#"<div><span/></div>"#, r#"<div><p class="c"/></div>"#, &Options::default());
		assert_eq!(target.to_string(), "<div><span/></div>");
		assert_eq!(stats.get(Mutation::ReplaceChild), 1);
		assert_eq!(stats.get(Mutation::SetAttribute) + stats.get(Mutation::RemoveAttribute), 0);
	}

	#[test]
	fn surplus_is_removed() {
		let (target, _, stats) = morph("<ul><li/></ul>", "<ul><li/>text<li/><!--c--></ul>", &Options::default());
		assert_eq!(target.to_string(), "<ul><li/></ul>");
		assert_eq!(stats.get(Mutation::RemoveChild), 2);
		assert_eq!(stats.get(Mutation::RemoveComment), 1);
	}

	#[test]
	fn childless_source_empties_target() {
		let (target, _, _) = morph(r#"<div><p/></div>"#, r#"<div><p>a<b/>c</p></div>"#, &Options::default());
		assert_eq!(target.to_string(), "<div><p/></div>");
	}

	#[test]
	fn non_empty_same_named_elements_are_replaced_unless_equal() {
		let document = Document::new();
		let source = load("<div><p>a</p><p>b</p></div>", &document);
		let target = load("<div><p>a</p><p>x</p></div>", &document);
		let kept = target.first_child().unwrap();
		let replaced = target.child(1).unwrap();

		render(Source::Node(&source), &target, &Options::default()).unwrap();
		assert_eq!(target.to_string(), "<div><p>a</p><p>b</p></div>");
		assert!(target.first_child().unwrap().ptr_eq(&kept));
		assert!(!target.child(1).unwrap().ptr_eq(&replaced));
		assert!(replaced.parent().is_none());
	}

	#[test]
	fn recurse_strategy_preserves_identity() {
		let document = Document::new();
		let source = load(r#"<div><p class="new"><i>b</i></p></div>"#, &document);
		let target = load(r#"<div><p class="old"><i>x</i><i/></p></div>"#, &document);
		let p = target.first_child().unwrap();
		let i = p.first_child().unwrap();

		let (_, stats) = Renderer::<MarkupLoader, SimpleSelector>::default()
			.render_with_stats(Source::Node(&source), &target, &Options::default().strategy(Strategy::Recurse))
			.unwrap();
		assert_eq!(target.to_string(), r#"<div><p class="new"><i>b</i></p></div>"#);
		assert!(target.first_child().unwrap().ptr_eq(&p));
		assert!(p.first_child().unwrap().ptr_eq(&i));
		assert_eq!(stats.get(Mutation::ReplaceChild), 0);
		assert_eq!(stats.get(Mutation::SetText), 1);
		assert_eq!(stats.get(Mutation::RemoveChild), 1);
	}

	#[test]
	fn shallow_render_only_touches_the_root() {
		let (target, _, _) = morph(r#"<div a="1"><p/></div>"#, r#"<div b="2"><span/></div>"#, &Options::default().deep(false));
		assert_eq!(target.to_string(), r#"<div a="1"><span/></div>"#);
	}

	#[test]
	fn shallow_render_strips_root_comments() {
		let options = Options::default().deep(false).ignore_comments(true);
		let (target, _, stats) = morph(r#"<div a="1"><p/></div>"#, "<div><!--x--><span><!--y--></span><!--z--></div>", &options);
		assert_eq!(target.to_string(), r#"<div a="1"><span><!--y--></span></div>"#);
		assert_eq!(stats.get(Mutation::RemoveComment), 2);
	}

	#[test]
	fn adjacent_source_text_is_merged_first() {
		let document = Document::new();
		let source = document.create_element("p");
		source.append_child(&document.create_text("x"));
		source.append_child(&document.create_text(""));
		source.append_child(&document.create_text("y"));
		let target = load("<p>xy</p>", &document);
		let text = target.first_child().unwrap();

		let renderer = Renderer::<MarkupLoader, SimpleSelector>::default();
		let (_, stats) = renderer.render_with_stats(Source::Node(&source), &target, &Options::default()).unwrap();
		assert_eq!(stats.total(), 0);
		assert_eq!(source.child_count(), 1);
		assert!(target.first_child().unwrap().ptr_eq(&text));

		source.append_child(&document.create_text("z"));
		let (_, stats) = renderer.render_with_stats(Source::Node(&source), &target, &Options::default().normalize(false)).unwrap();
		assert_eq!(target.child_count(), 2);
		assert_eq!(stats.get(Mutation::AppendChild), 1);
	}

	#[test]
	fn split_target_text_is_merged_and_counted() {
		let document = Document::new();
		let target = document.create_element("p");
		target.append_child(&document.create_text("a"));
		target.append_child(&document.create_text("b"));
		let first = target.first_child().unwrap();

		let (_, stats) = Renderer::<MarkupLoader, SimpleSelector>::default()
			.render_with_stats(Source::Markup("<p>ab</p>"), &target, &Options::default())
			.unwrap();
		assert_eq!(target.to_string(), "<p>ab</p>");
		assert!(target.first_child().unwrap().ptr_eq(&first));
		assert_eq!(stats.get(Mutation::SetText), 1);
		assert_eq!(stats.get(Mutation::RemoveChild), 1);
		assert_eq!(stats.total(), 2);
	}

	#[test]
	fn ignoring_text_reconciles_elements_only() {
		let document = Document::new();
		let source = load("<ul><li>one</li><li>two</li><li><b>x</b></li></ul>", &document);
		let target = load("<ul>\n  <li>uno</li>\n  <li>dos</li>\n  <li><b>x</b>!</li>\n  <li>tres</li>\n</ul>", &document);
		let first = target.child(1).unwrap();
		let first_text = first.first_child().unwrap();

		let (_, stats) = Renderer::<MarkupLoader, SimpleSelector>::default()
			.render_with_stats(Source::Node(&source), &target, &Options::default().ignore_text(true).strategy(Strategy::Recurse))
			.unwrap();
		assert_eq!(target.to_string(), "<ul>\n  <li>one</li>\n  <li>two</li>\n  <li><b>x</b>!</li>\n  \n</ul>");
		assert!(target.child(1).unwrap().ptr_eq(&first));
		assert!(first.first_child().unwrap().ptr_eq(&first_text));
		assert_eq!(stats.get(Mutation::SetText), 2);
		assert_eq!(stats.get(Mutation::RemoveChild), 1);
	}

	#[test]
	fn ignoring_text_replaces_element_content_of_leaves() {
		let options = Options::default().ignore_text(true);
		let (target, _, _) = morph("<div><p>x</p></div>", "<div><p><b>x</b></p></div>", &options);
		assert_eq!(target.to_string(), "<div><p>x</p></div>");

		let (target, _, stats) = morph("<p>new</p>", "<p><!--c-->old</p>", &options);
		assert_eq!(target.to_string(), "<p>new</p>");
		assert_eq!(stats.get(Mutation::RemoveComment), 1);
	}

	#[rstest::rstest]
	fn batched_appends_match_direct_appends(#[values(false, true)] use_fragment: bool) {
		let source = "<div><ul><li/><li>a</li><li>b</li></ul><p/><p/></div>";
		let options = Options::default().use_fragment(use_fragment).strategy(Strategy::Recurse);
		let document = Document::new();
		let target = load("<div><ul><li/></ul></div>", &document);
		let li = target.first_child().unwrap().first_child().unwrap();

		let (_, stats) = Renderer::<MarkupLoader, SimpleSelector>::default()
			.render_with_stats(Source::Markup(source), &target, &options)
			.unwrap();
		assert_eq!(target.to_string(), source);
		assert!(target.first_child().unwrap().first_child().unwrap().ptr_eq(&li));
		assert_eq!(stats.get(Mutation::AppendChild), 4);
		assert_eq!(stats.total(), 4);
	}

	#[test]
	fn root_mismatch() {
		let document = Document::new();
		let source = load("<section/>", &document);
		let detached = load("<div/>", &document);
		let result = render(Source::Node(&source), &detached, &Options::default()).unwrap();
		assert_eq!(result.to_string(), "<section/>");
		assert!(!result.ptr_eq(&source));
		assert_eq!(detached.to_string(), "<div/>");

		let main = load("<main><div/></main>", &document);
		let attached = main.first_child().unwrap();
		match render(Source::Node(&source), &attached, &Options::default()) {
			Err(RenderError::StructuralMismatch { expected, found }) => {
				assert_eq!(expected.local_name, "section");
				assert_eq!(found.local_name, "div");
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn detached_target_stays_detached() {
		let (target, _, _) = morph("<div><p/></div>", "<div/>", &Options::default());
		assert!(target.parent().is_none());
		assert_eq!(target.to_string(), "<div><p/></div>");
	}

	#[test]
	fn comments_are_stripped_when_ignored() {
		let options = Options::default().ignore_comments(true);
		let (target, _, stats) = morph("<div><!--s--><p/><i>t<!--x--></i></div>", "<div><!--a--><p/><!--b--></div>", &options);
		assert_eq!(target.to_string(), "<div><p/><i>t</i></div>");
		assert_eq!(stats.get(Mutation::RemoveComment), 2);

		let (target, _, _) = morph("<div/>", "<div><!--only--></div>", &options);
		assert_eq!(target.to_string(), "<div/>");
	}

	#[test]
	fn comments_are_synchronized_by_default() {
		let (target, _, stats) = morph("<div><!--new--></div>", "<div><!--old--></div>", &Options::default());
		assert_eq!(target.to_string(), "<div><!--new--></div>");
		assert_eq!(stats.get(Mutation::SetText), 1);
	}

	#[test]
	fn selectors_that_match_nothing_fail() {
		let document = Document::new();
		let target = load("<div/>", &document);
		assert!(matches!(
			render(Source::Markup("<div/>"), &target, &Options::default().source_selector("p")),
			Err(RenderError::SelectorNotFound(selector)) if selector == "p"
		));
		assert!(matches!(render(Source::Markup("<div>"), &target, &Options::default()), Err(RenderError::ParseFailure(_))));
	}

	#[test]
	fn equal_trees_are_not_touched() {
		let markup = r#"<div a="1"><!--c--><p>t</p>x</div>"#;
		let (_, _, stats) = morph(markup, markup, &Options::default());
		assert_eq!(stats.total(), 0);
		assert_eq!(stats.to_string(), "no mutations");
	}
}
