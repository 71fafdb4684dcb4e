//! Allow-list configuration
//!
//! Names are matched case-insensitively. A config is immutable once built;
//! hosts derive a new one through [`AllowListOverrides`] and swap it in.

use std::collections::HashSet;

use serde::Deserialize;

use crate::prelude::*;

/// Elements kept by the structural filter.
pub const DEFAULT_ALLOWED_TAGS: &[&str] = &[
	"svg",
	"g",
	"path",
	"circle",
	"rect",
	"ellipse",
	"line",
	"polyline",
	"polygon",
	"text",
	"tspan",
	"defs",
	"linearGradient",
	"radialGradient",
	"stop",
	"clipPath",
	"mask",
	"pattern",
	"image",
	"use",
	"symbol",
	"title",
	"desc",
	"metadata",
	"style",
	"foreignObject",
];

/// Attributes kept by the structural filter.
pub const DEFAULT_ALLOWED_ATTRIBUTES: &[&str] = &[
	// Core
	"id",
	"class",
	"style",
	"lang",
	"tabindex",
	"version",
	"baseProfile",
	// Namespaces
	"xmlns",
	"xmlns:xlink",
	"xmlns:svg",
	// References
	"href",
	"xlink:href",
	"xlink:title",
	// Geometry
	"x",
	"y",
	"x1",
	"y1",
	"x2",
	"y2",
	"cx",
	"cy",
	"r",
	"rx",
	"ry",
	"fx",
	"fy",
	"fr",
	"d",
	"points",
	"width",
	"height",
	"viewBox",
	"preserveAspectRatio",
	"transform",
	"pathLength",
	// Styling
	"fill",
	"fill-opacity",
	"fill-rule",
	"stroke",
	"stroke-width",
	"stroke-linecap",
	"stroke-linejoin",
	"stroke-miterlimit",
	"stroke-dasharray",
	"stroke-dashoffset",
	"stroke-opacity",
	"opacity",
	"color",
	"display",
	"visibility",
	"overflow",
	"clip-path",
	"clip-rule",
	"mask",
	"vector-effect",
	"shape-rendering",
	"paint-order",
	// Text
	"font-family",
	"font-size",
	"font-weight",
	"font-style",
	"font-variant",
	"text-anchor",
	"text-decoration",
	"dominant-baseline",
	"alignment-baseline",
	"baseline-shift",
	"letter-spacing",
	"word-spacing",
	"writing-mode",
	"dx",
	"dy",
	"rotate",
	"textLength",
	"lengthAdjust",
	// Gradients, patterns, clipping
	"offset",
	"stop-color",
	"stop-opacity",
	"gradientUnits",
	"gradientTransform",
	"spreadMethod",
	"patternUnits",
	"patternContentUnits",
	"patternTransform",
	"clipPathUnits",
	"maskUnits",
	"maskContentUnits",
	// <style>
	"type",
	"media",
	// ARIA
	"role",
	"focusable",
	"aria-label",
	"aria-labelledby",
	"aria-describedby",
	"aria-hidden",
	"aria-roledescription",
];

fn normalize<I, S>(names: I) -> HashSet<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	names
		.into_iter()
		.map(|name| name.as_ref().trim().to_ascii_lowercase())
		.filter(|name| !name.is_empty())
		.collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowListConfig {
	tags: HashSet<String>,
	attributes: HashSet<String>,
}

impl AllowListConfig {
	/// Build a config from explicit tag and attribute lists.
	///
	/// Fails if either list is empty after normalization.
	pub fn new<T, A, S1, S2>(tags: T, attributes: A) -> SvResult<Self>
	where
		T: IntoIterator<Item = S1>,
		A: IntoIterator<Item = S2>,
		S1: AsRef<str>,
		S2: AsRef<str>,
	{
		let config = Self { tags: normalize(tags), attributes: normalize(attributes) };
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> SvResult<()> {
		if self.tags.is_empty() {
			return Err(Error::Config("allowed tag list is empty".into()));
		}
		if self.attributes.is_empty() {
			return Err(Error::Config("allowed attribute list is empty".into()));
		}
		Ok(())
	}

	pub fn allows_tag(&self, name: &str) -> bool {
		self.tags.contains(&name.to_ascii_lowercase())
	}

	pub fn allows_attribute(&self, name: &str) -> bool {
		self.attributes.contains(&name.to_ascii_lowercase())
	}

	/// Lowercased allowed tag names, sorted
	pub fn tags(&self) -> Vec<&str> {
		let mut tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
		tags.sort_unstable();
		tags
	}

	/// Lowercased allowed attribute names, sorted
	pub fn attributes(&self) -> Vec<&str> {
		let mut attrs: Vec<&str> = self.attributes.iter().map(String::as_str).collect();
		attrs.sort_unstable();
		attrs
	}

	/// Derive a new config with host overrides applied.
	pub fn with_overrides(&self, overrides: &AllowListOverrides) -> SvResult<Self> {
		let config = Self {
			tags: overrides.tags.apply(&self.tags),
			attributes: overrides.attributes.apply(&self.attributes),
		};
		config.validate()?;
		debug!(
			"Allow-list overrides applied: {} tags, {} attributes",
			config.tags.len(),
			config.attributes.len()
		);
		Ok(config)
	}

	/// Parse [`AllowListOverrides`] from JSON and apply them to the defaults.
	pub fn from_json(json: &str) -> SvResult<Self> {
		let overrides: AllowListOverrides = serde_json::from_str(json)?;
		Self::default().with_overrides(&overrides)
	}
}

impl Default for AllowListConfig {
	fn default() -> Self {
		Self {
			tags: normalize(DEFAULT_ALLOWED_TAGS),
			attributes: normalize(DEFAULT_ALLOWED_ATTRIBUTES),
		}
	}
}

/// Host-supplied changes to both allow-lists
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllowListOverrides {
	pub tags: ListOverride,
	pub attributes: ListOverride,
}

/// Changes to a single allow-list.
///
/// `replace` (when present) substitutes the base list, then `add` and
/// `remove` are applied in that order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListOverride {
	pub replace: Option<Vec<String>>,
	pub add: Vec<String>,
	pub remove: Vec<String>,
}

impl ListOverride {
	fn apply(&self, base: &HashSet<String>) -> HashSet<String> {
		let mut set = match &self.replace {
			Some(list) => normalize(list),
			None => base.clone(),
		};
		set.extend(normalize(&self.add));
		for name in normalize(&self.remove) {
			set.remove(&name);
		}
		set
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_is_case_insensitive() {
		let config = AllowListConfig::default();
		assert!(config.allows_tag("linearGradient"));
		assert!(config.allows_tag("LINEARGRADIENT"));
		assert!(config.allows_tag("svg"));
		assert!(!config.allows_tag("script"));
		assert!(!config.allows_tag("a"));
		assert!(config.allows_attribute("viewBox"));
		assert!(config.allows_attribute("viewbox"));
		assert!(config.allows_attribute("xlink:href"));
		assert!(!config.allows_attribute("onload"));
	}

	#[test]
	fn test_new_rejects_empty_lists() {
		assert!(matches!(
			AllowListConfig::new(Vec::<String>::new(), ["fill"]),
			Err(Error::Config(_))
		));
		assert!(matches!(AllowListConfig::new(["svg"], [" "]), Err(Error::Config(_))));
		assert!(AllowListConfig::new(["svg"], ["fill"]).is_ok());
	}

	#[test]
	fn test_overrides_add_and_remove() {
		let overrides = AllowListOverrides {
			tags: ListOverride { add: vec!["a".into()], remove: vec!["foreignObject".into()], ..Default::default() },
			attributes: ListOverride { add: vec!["Data-Name".into()], ..Default::default() },
		};
		let config = AllowListConfig::default().with_overrides(&overrides).unwrap();
		assert!(config.allows_tag("a"));
		assert!(!config.allows_tag("foreignobject"));
		assert!(config.allows_attribute("data-name"));
		// base config is untouched
		assert!(AllowListConfig::default().allows_tag("foreignObject"));
	}

	#[test]
	fn test_overrides_replace() {
		let overrides = AllowListOverrides {
			tags: ListOverride { replace: Some(vec!["svg".into(), "path".into()]), ..Default::default() },
			..Default::default()
		};
		let config = AllowListConfig::default().with_overrides(&overrides).unwrap();
		assert_eq!(config.tags(), vec!["path", "svg"]);
		assert!(config.allows_attribute("fill"));
	}

	#[test]
	fn test_overrides_cannot_empty_a_list() {
		let overrides = AllowListOverrides {
			tags: ListOverride { replace: Some(vec!["svg".into()]), remove: vec!["SVG".into()], ..Default::default() },
			..Default::default()
		};
		assert!(matches!(AllowListConfig::default().with_overrides(&overrides), Err(Error::Config(_))));
	}

	#[test]
	fn test_from_json() {
		let config = AllowListConfig::from_json(
			r#"{"tags": {"add": ["filter", "feGaussianBlur"]}, "attributes": {"add": ["stdDeviation"]}}"#,
		)
		.unwrap();
		assert!(config.allows_tag("fegaussianblur"));
		assert!(config.allows_attribute("stddeviation"));

		assert!(matches!(AllowListConfig::from_json("{not json"), Err(Error::Config(_))));
	}
}

// vim: ts=4
