//! Stage 2: structural allow-list filter
//!
//! Parses the pre-filtered markup, drops every element and attribute the
//! allow-list does not name, and serializes the root element again. Any
//! failure here is not a rejection: the caller keeps the stage 1 output.

use std::collections::HashSet;
use std::fmt;

use quick_xml::escape::unescape;
use regex::Regex;

use crate::config::AllowListConfig;
use crate::dom::{Attribute, Document};
use crate::has_svg_tag;
use crate::prelude::*;

pub const NORMALIZED_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Namespace prefixes whose attributes may survive.
const ALLOWED_ATTR_PREFIXES: &[&str] = &["xmlns", "xlink"];

#[derive(Debug)]
pub(crate) enum StructuralError {
	Parse(String),
	/// Input ended with this many elements still open
	Unbalanced(usize),
	NoRoot,
	Serialize(String),
	/// Serialized output no longer contains an `<svg` element
	LostSvg,
}

impl fmt::Display for StructuralError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StructuralError::Parse(msg) => write!(f, "XML parse error: {}", msg),
			StructuralError::Unbalanced(open) => write!(f, "{} element(s) left unclosed", open),
			StructuralError::NoRoot => write!(f, "no root element"),
			StructuralError::Serialize(msg) => write!(f, "serialization failed: {}", msg),
			StructuralError::LostSvg => write!(f, "no <svg> element after filtering"),
		}
	}
}

impl std::error::Error for StructuralError {}

pub struct StructuralFilter {
	declaration: Regex,
	version: Regex,
	encoding: Regex,
	dangerous_scheme: Regex,
	event_handler: Regex,
}

impl StructuralFilter {
	pub fn new() -> SvResult<Self> {
		Ok(Self {
			declaration: Regex::new(r"^\s*<\?xml(?:\s[^>]*?)?\?>")?,
			version: Regex::new(r#"\bversion\s*=\s*(?:"[^"]+"|'[^']+')"#)?,
			encoding: Regex::new(r#"\bencoding\s*=\s*(?:"[^"]+"|'[^']+')"#)?,
			dangerous_scheme: Regex::new(r"(?i)javascript:|vbscript:|data:text/html")?,
			event_handler: Regex::new(r"(?i)on\w+\s*=")?,
		})
	}

	/// Filter `input`, falling back to `input` unchanged when the structural
	/// pass cannot complete.
	pub fn apply(&self, input: &str, config: &AllowListConfig) -> String {
		match self.filter(input, config) {
			Ok(output) => output,
			Err(err) => {
				warn!("SVG structural filter skipped, keeping pre-filtered content: {}", err);
				input.to_string()
			}
		}
	}

	pub(crate) fn filter(&self, input: &str, config: &AllowListConfig) -> Result<String, StructuralError> {
		let (declaration, body) = match self.declaration.find(input) {
			Some(m) => (Some(m.as_str().trim()), &input[m.end()..]),
			None => (None, input),
		};

		let mut doc = Document::parse(body)?;
		let root = doc.root().ok_or(StructuralError::NoRoot)?;

		let elements = doc.elements(root);
		let doomed: HashSet<_> = elements
			.iter()
			.copied()
			.filter(|&id| doc.element_name(id).is_some_and(|name| !config.allows_tag(name)))
			.collect();

		let mut removed_attrs = 0;
		for &id in elements.iter().filter(|id| !doomed.contains(*id)) {
			if let Some(attributes) = doc.attributes_mut(id) {
				let before = attributes.len();
				attributes.retain(|attr| self.keep_attribute(attr, config));
				removed_attrs += before - attributes.len();
			}
		}

		// Only detach subtree roots, nested doomed elements go with them
		for &id in &elements {
			let parent_doomed = doc.node(id).parent.is_some_and(|p| doomed.contains(&p));
			if doomed.contains(&id) && !parent_doomed {
				debug!("Removing disallowed element <{}>", doc.element_name(id).unwrap_or_default());
				doc.detach(id);
			}
		}
		if doomed.contains(&root) {
			return Err(StructuralError::Serialize("root element is not allowed".into()));
		}
		debug!(
			"SVG structural filter: {} element(s), {} attribute(s) removed",
			doomed.len(),
			removed_attrs
		);

		let serialized = doc.serialize(root)?;
		if serialized.trim().is_empty() {
			return Err(StructuralError::Serialize("empty output".into()));
		}
		if !has_svg_tag(&serialized) {
			return Err(StructuralError::LostSvg);
		}

		Ok(match self.restore_declaration(declaration) {
			Some(decl) => format!("{}\n{}", decl, serialized),
			None => serialized,
		})
	}

	fn keep_attribute(&self, attr: &Attribute, config: &AllowListConfig) -> bool {
		if let Some((prefix, _)) = attr.name.split_once(':') {
			if !ALLOWED_ATTR_PREFIXES.iter().any(|p| p.eq_ignore_ascii_case(prefix)) {
				trace!("dropping namespaced attribute {}", attr.name);
				return false;
			}
		}
		if !config.allows_attribute(&attr.name) {
			trace!("dropping attribute {}", attr.name);
			return false;
		}

		let Ok(value) = unescape(&attr.value) else {
			return false;
		};
		// Browsers ignore embedded whitespace and control characters in schemes
		let compact: String = value.chars().filter(|c| !c.is_whitespace() && !c.is_control()).collect();
		if self.dangerous_scheme.is_match(&compact) || self.event_handler.is_match(&value) {
			debug!("Dropping attribute {} with dangerous value", attr.name);
			return false;
		}
		true
	}

	/// Declaration to put back in front of the serialized root.
	fn restore_declaration(&self, original: Option<&str>) -> Option<String> {
		let decl = original?;
		if self.version.is_match(decl) && self.encoding.is_match(decl) {
			Some(decl.to_string())
		} else {
			Some(NORMALIZED_DECLARATION.to_string())
		}
	}
}


// vim: ts=4
