//! Stage 3: final cleanup and minification.

use regex::Regex;

use crate::has_svg_tag;
use crate::prefilter::{Rule, EVENT_HANDLER_ATTR, KEEP_SEPARATOR};
use crate::prelude::*;

pub struct Cleanup {
	rules: Vec<Rule>,
	whitespace: Regex,
	between_tags: Regex,
}

impl Cleanup {
	pub fn new() -> SvResult<Self> {
		Ok(Self {
			rules: vec![
				Rule::new("script-tag", r"(?i)</?script\b[^>]*>", "")?,
				Rule::new("event-handler", EVENT_HANDLER_ATTR, KEEP_SEPARATOR)?,
			],
			whitespace: Regex::new(r"\s+")?,
			between_tags: Regex::new(r">\s+<")?,
		})
	}

	pub fn apply(&self, input: &str) -> SvResult<String> {
		let mut text = input.to_string();
		for rule in &self.rules {
			if rule.apply(&mut text) {
				debug!("SVG cleanup: leftover markup removed by final pass");
			}
		}

		if !has_svg_tag(&text) {
			return Err(Error::NotSvg);
		}

		let text = self.whitespace.replace_all(&text, " ");
		let text = self.between_tags.replace_all(&text, "><");
		Ok(text.trim().to_string())
	}
}


// vim: ts=4
