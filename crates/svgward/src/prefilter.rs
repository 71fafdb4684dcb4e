//! Stage 1: regex pre-filter
//!
//! Runs before the structural pass and is the only line of defense besides
//! the final cleanup when the structural pass has to fall back.

use std::borrow::Cow;

use regex::Regex;

use crate::prelude::*;

/// Inline event handler attribute, quoted or unquoted value.
///
/// Browsers accept an attribute directly after `/` or a closing quote, so
/// those count as separators too. A whitespace or quote separator is
/// captured and put back, a `/` is dropped.
pub(crate) const EVENT_HANDLER_ATTR: &str =
	r#"(?i)(?:([\s"'])|/)on\w+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>"']+)"#;

/// Replacement for rules whose pattern captures the leading separator.
pub(crate) const KEEP_SEPARATOR: &str = "${1}";

/// URL schemes stripped from `href` / `xlink:href`.
const BLOCKED_URL_SCHEMES: &[&str] = &["javascript:", "data:text/html", "vbscript:"];

/// Elements that embed foreign documents, removed with their content.
const EMBEDDING_ELEMENTS: &[&str] = &["iframe", "embed", "object", "applet"];

pub(crate) struct Rule {
	name: &'static str,
	pattern: Regex,
	replacement: &'static str,
}

impl Rule {
	pub(crate) fn new(name: &'static str, pattern: &str, replacement: &'static str) -> SvResult<Self> {
		Ok(Self { name, pattern: Regex::new(pattern)?, replacement })
	}

	/// Apply the rule in place, returning whether anything matched.
	pub(crate) fn apply(&self, text: &mut String) -> bool {
		let replaced = match self.pattern.replace_all(text, self.replacement) {
			Cow::Borrowed(_) => None,
			Cow::Owned(s) => Some(s),
		};
		match replaced {
			Some(s) => {
				trace!("rule {} matched", self.name);
				*text = s;
				true
			}
			None => false,
		}
	}
}

pub struct PreFilter {
	rules: Vec<Rule>,
}

impl PreFilter {
	pub fn new() -> SvResult<Self> {
		let mut rules = vec![
			Rule::new("script", r"(?is)<script\b[^>]*>.*?</script\s*>", "")?,
			Rule::new("script-empty", r"(?i)<script\b[^>]*/\s*>", "")?,
			Rule::new("event-handler", EVENT_HANDLER_ATTR, KEEP_SEPARATOR)?,
		];

		let schemes = BLOCKED_URL_SCHEMES.iter().map(|s| regex::escape(s)).collect::<Vec<_>>().join("|");
		rules.push(Rule::new(
			"dangerous-href",
			&format!(
				r#"(?i)(?:([\s"'])|/)(?:xlink:)?href\s*=\s*(?:"\s*(?:{s})[^"]*"|'\s*(?:{s})[^']*'|(?:{s})[^\s>"']*)"#,
				s = schemes
			),
			KEEP_SEPARATOR,
		)?);

		// Entities first: they usually sit inside a DOCTYPE internal subset
		rules.push(Rule::new("entity", r#"(?is)<!ENTITY\b(?:"[^"]*"|'[^']*'|[^>"'])*>"#, "")?);
		rules.push(Rule::new(
			"doctype",
			r#"(?is)<!DOCTYPE\b(?:"[^"]*"|'[^']*'|\[.*?\]|[^>"'\[])*>"#,
			"",
		)?);
		rules.push(Rule::new("xml-stylesheet", r"(?is)<\?xml-stylesheet\b.*?\?>", "")?);

		for &element in EMBEDDING_ELEMENTS {
			rules.push(Rule::new(element, &format!(r"(?i)<{}\b[^>]*/\s*>", element), "")?);
			rules.push(Rule::new(
				element,
				&format!(r"(?is)<{e}\b[^>]*>.*?</{e}\s*>", e = element),
				"",
			)?);
		}
		// Unpaired leftovers (HTML-style void usage, stray closers)
		rules.push(Rule::new(
			"embedding-tag",
			&format!(r"(?i)</?(?:{})\b[^>]*>", EMBEDDING_ELEMENTS.join("|")),
			"",
		)?);

		rules.push(Rule::new(
			"style-data-uri",
			r#"(?i)\sstyle\s*=\s*(?:"[^"]*data:[^"]*;\s*base64[^"]*"|'[^']*data:[^']*;\s*base64[^']*')"#,
			" ",
		)?);

		Ok(Self { rules })
	}

	pub fn apply(&self, input: &str) -> String {
		let mut text = input.to_string();
		let mut hits = 0;
		for rule in &self.rules {
			if rule.apply(&mut text) {
				hits += 1;
			}
		}
		if hits > 0 {
			debug!("SVG pre-filter: {} rule(s) matched, {} -> {} bytes", hits, input.len(), text.len());
		}
		text
	}
}


// vim: ts=4
