#![doc(html_root_url = "https://docs.rs/dom-morph/0.1.0")]
#![warn(clippy::pedantic)]
//! Morphs a live document tree into the shape of a desired one, in place.
//!
//! Nodes whose subtree didn't change keep their identity, which preserves focus, selection, running media and any
//! state a host attached to them. See [`Renderer`] for the entry point and [`Options`] for what can be tuned.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod attributes;
pub mod cursor;
pub mod dom;
pub mod error;
pub mod load;
pub mod mutate;
pub mod properties;
pub mod render;
pub mod scratch_set;
pub mod select;
pub mod tree;
#[cfg(feature = "web")]
pub mod web;

mod count_map;

pub use error::{LoadError, RenderError};
pub use mutate::{Mutation, RenderStats};
pub use render::{render, Options, Renderer, Source, Strategy};
