//! Narrowing a render to a sub-tree.
//!
//! [`SimpleSelector`] understands descendant chains of compound selectors built from
//! `*`, type (`div`), id (`#main`), class (`.section`) and attribute (`[lang]`, `[lang=en]`, `[lang="en"]`) components.

use crate::dom::{find_descendant, DomNode, QualifiedName};
use core::{iter::Peekable, str::CharIndices};
use thiserror::Error;
use tracing::warn;

/// Finds the sub-tree a render should be narrowed to.
pub trait SelectorEngine<N: DomNode> {
	/// The first descendant of `root` in document order that matches `selector`, excluding `root` itself.
	fn query(&self, root: &N, selector: &str) -> Option<N>;
}

/// The default [`SelectorEngine`]. Unparsable selectors match nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleSelector;

impl<N: DomNode> SelectorEngine<N> for SimpleSelector {
	fn query(&self, root: &N, selector: &str) -> Option<N> {
		let parsed = match Selector::parse(selector) {
			Ok(parsed) => parsed,
			Err(error) => {
				warn!(selector, %error, "Could not parse selector.");
				return None;
			}
		};
		find_descendant(root, |node| parsed.matches(node))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
	#[error("empty selector")]
	Empty,
	#[error("unexpected {0:?} at byte {1}")]
	Unexpected(char, usize),
	#[error("unterminated attribute selector")]
	UnterminatedAttribute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Component {
	Universal,
	Type(String),
	Id(String),
	Class(String),
	Attribute { name: String, value: Option<String> },
}

impl Component {
	fn matches<N: DomNode>(&self, name: &QualifiedName, node: &N) -> bool {
		match self {
			Self::Universal => true,
			Self::Type(local_name) => name.is_html(local_name) || &name.local_name == local_name,
			Self::Id(id) => node.attribute(&QualifiedName::new("id")).as_deref() == Some(id.as_str()),
			Self::Class(class) => node
				.attribute(&QualifiedName::new("class"))
				.map_or(false, |classes| classes.split_ascii_whitespace().any(|c| c == class)),
			Self::Attribute { name, value } => match (node.attribute(&QualifiedName::new(name.as_str())), value) {
				(Some(actual), Some(expected)) => &actual == expected,
				(Some(_), None) => true,
				(None, _) => false,
			},
		}
	}
}

/// A parsed selector: compounds separated by descendant combinators (whitespace).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
	compounds: Vec<Vec<Component>>,
}

impl Selector {
	/// # Errors
	///
	/// On syntax this selector subset doesn't cover.
	pub fn parse(selector: &str) -> Result<Self, SelectorError> {
		let compounds = selector.split_ascii_whitespace().map(parse_compound).collect::<Result<Vec<_>, _>>()?;
		if compounds.is_empty() {
			return Err(SelectorError::Empty);
		}
		Ok(Self { compounds })
	}

	/// Ancestors are matched greedily, nearest first, which is exact for descendant-only chains.
	pub fn matches<N: DomNode>(&self, node: &N) -> bool {
		let (last, rest) = match self.compounds.split_last() {
			Some(split) => split,
			None => return false,
		};
		if !compound_matches(last, node) {
			return false;
		}

		let mut rest = rest.iter().rev().peekable();
		let mut ancestor = node.parent();
		while let Some(compound) = rest.peek() {
			match ancestor {
				Some(node) => {
					if compound_matches(compound, &node) {
						rest.next();
					}
					ancestor = node.parent();
				}
				None => return false,
			}
		}
		true
	}
}

fn compound_matches<N: DomNode>(compound: &[Component], node: &N) -> bool {
	match node.name() {
		Some(name) => compound.iter().all(|component| component.matches(&name, node)),
		None => false,
	}
}

fn is_ident(c: char) -> bool {
	c.is_alphanumeric() || matches!(c, '-' | '_') || !c.is_ascii()
}

fn take_ident(chars: &mut Peekable<CharIndices<'_>>) -> String {
	let mut ident = String::new();
	while let Some(&(_, c)) = chars.peek() {
		if !is_ident(c) {
			break;
		}
		ident.push(c);
		chars.next();
	}
	ident
}

fn parse_compound(text: &str) -> Result<Vec<Component>, SelectorError> {
	// `text` is a whitespace-free slice, so the only quoted values possible here are space-free ones.
	let mut components = Vec::new();
	let mut chars = text.char_indices().peekable();

	while let Some(&(at, c)) = chars.peek() {
		let component = match c {
			'*' => {
				chars.next();
				Component::Universal
			}
			'#' | '.' => {
				chars.next();
				let ident = take_ident(&mut chars);
				if ident.is_empty() {
					return Err(SelectorError::Unexpected(c, at));
				}
				if c == '#' {
					Component::Id(ident)
				} else {
					Component::Class(ident)
				}
			}
			'[' => {
				chars.next();
				let name = take_ident(&mut chars);
				if name.is_empty() {
					return Err(SelectorError::Unexpected(c, at));
				}
				let value = match chars.next() {
					Some((_, ']')) => None,
					Some((_, '=')) => {
						let mut value = String::new();
						let quote = match chars.peek() {
							Some(&(_, q)) if q == '"' || q == '\'' => {
								chars.next();
								Some(q)
							}
							_ => None,
						};
						loop {
							match (chars.next(), quote) {
								(Some((_, c)), Some(q)) if c == q => match chars.next() {
									Some((_, ']')) => break,
									Some((at, c)) => return Err(SelectorError::Unexpected(c, at)),
									None => return Err(SelectorError::UnterminatedAttribute),
								},
								(Some((_, ']')), None) => break,
								(Some((_, c)), _) => value.push(c),
								(None, _) => return Err(SelectorError::UnterminatedAttribute),
							}
						}
						Some(value)
					}
					Some((at, c)) => return Err(SelectorError::Unexpected(c, at)),
					None => return Err(SelectorError::UnterminatedAttribute),
				};
				Component::Attribute { name, value }
			}
			c if is_ident(c) => Component::Type(take_ident(&mut chars)),
			c => return Err(SelectorError::Unexpected(c, at)),
		};
		components.push(component);
	}

	Ok(components)
}
