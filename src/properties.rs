//! Runtime property synchronization.
//!
//! Some element state isn't observable through attributes (or stops being once a user interacts with the element):
//! the current value of a text field, whether a checkbox is checked, a video's volume.
//! These are copied unconditionally, by a fixed name list per [`ElementClass`].

use crate::dom::{DomNode, QualifiedName};
use tracing::{debug, trace};

/// Selects which property list applies to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementClass {
	Generic,
	/// `<input>` and `<textarea>`.
	FormInput,
	/// `<select>`.
	SelectList,
	/// `<audio>` and `<video>`.
	Media,
	/// `<iframe>`.
	InlineFrame,
}

/// Specific classes by HTML local name. The first match wins.
const CLASSES: &[(ElementClass, &[&str])] = &[
	(ElementClass::FormInput, &["input", "textarea"]),
	(ElementClass::SelectList, &["select"]),
	(ElementClass::Media, &["audio", "video"]),
	(ElementClass::InlineFrame, &["iframe"]),
];

impl ElementClass {
	#[must_use]
	pub fn of(name: &QualifiedName) -> Self {
		CLASSES
			.iter()
			.find(|(_, local_names)| local_names.iter().any(|local_name| name.is_html(local_name)))
			.map_or(Self::Generic, |&(class, _)| class)
	}

	/// Copied in this order. `selectedIndex` and `value` come after `multiple` since the latter constrains them.
	#[must_use]
	pub fn properties(self) -> &'static [&'static str] {
		match self {
			Self::Generic => &[],
			Self::FormInput => &["value", "checked", "indeterminate", "disabled", "readOnly"],
			Self::SelectList => &["multiple", "disabled", "selectedIndex", "value"],
			Self::Media => &["muted", "volume", "playbackRate", "loop", "controls"],
			Self::InlineFrame => &["srcdoc"],
		}
	}
}

/// Copies `target`'s class' properties from `source`, returning how many were set.
///
/// Properties missing on `source` or refused by `target` are skipped. Non-elements are ignored.
pub fn synchronize_properties<N: DomNode>(source: &N, target: &N) -> usize {
	let class = match target.name() {
		Some(name) => ElementClass::of(&name),
		None => return 0,
	};

	let mut count = 0;
	for &name in class.properties() {
		let value = match source.property(name) {
			Some(value) => value,
			None => {
				trace!(?class, name, "Source lacks property. Skipping.");
				continue;
			}
		};
		if target.set_property(name, value) {
			count += 1;
		} else {
			debug!(?class, name, "Target refused property. Skipping.");
		}
	}
	count
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		dom::{SVG_NAMESPACE, XHTML_NAMESPACE},
		tree::{Document, PropertyValue},
	};

	#[test]
	fn classification() {
		assert_eq!(ElementClass::of(&QualifiedName::new("input")), ElementClass::FormInput);
		assert_eq!(ElementClass::of(&QualifiedName::with_namespace(Some(XHTML_NAMESPACE), "textarea")), ElementClass::FormInput);
		assert_eq!(ElementClass::of(&QualifiedName::new("SELECT")), ElementClass::SelectList);
		assert_eq!(ElementClass::of(&QualifiedName::new("video")), ElementClass::Media);
		assert_eq!(ElementClass::of(&QualifiedName::new("iframe")), ElementClass::InlineFrame);
		assert_eq!(ElementClass::of(&QualifiedName::new("div")), ElementClass::Generic);
		assert_eq!(ElementClass::of(&QualifiedName::with_namespace(Some(SVG_NAMESPACE), "video")), ElementClass::Generic);
	}

	#[test]
	fn copies_unconditionally() {
		let document = Document::html();
		let source = document.create_element("input");
		let target = document.create_element("input");
		source.set_property("value", "typed");
		source.set_property("checked", false);
		target.set_property("checked", false);
		target.set_property("value", "stale");

		assert_eq!(synchronize_properties(&source, &target), 2);
		assert_eq!(target.property("value"), Some(PropertyValue::Text("typed".to_owned())));
		assert_eq!(target.property("readOnly"), None);
	}

	#[test]
	fn generic_elements_copy_nothing() {
		let document = Document::new();
		let source = document.create_element("div");
		source.set_property("value", "x");
		let target = document.create_element("div");
		assert_eq!(synchronize_properties(&source, &target), 0);
		assert_eq!(target.property("value"), None);
	}

	#[test]
	fn media_state() {
		let document = Document::new();
		let source = document.create_element("video");
		let target = document.create_element("video");
		source.set_property("muted", true);
		source.set_property("volume", 0.25);
		assert_eq!(synchronize_properties(&source, &target), 2);
		assert_eq!(target.property("volume"), Some(PropertyValue::Number(0.25)));
	}
}
