//! Upload and sanitizer settings
//!
//! Loaded from JSON (camelCase keys). Every field has a default, so an empty
//! object is a valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use svgward::{AllowListConfig, AllowListOverrides, Sanitizer};

use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadSettings {
	/// Use width/height attributes before viewBox when computing dimensions
	pub prefer_dimension_attributes: bool,
	/// Width and height used when dimensions cannot be determined
	pub default_dimension: u32,
	pub sanitize_timeout_ms: u64,
	/// Upper bound for inflated SVGZ content
	pub max_inflated_bytes: usize,
}

impl Default for UploadSettings {
	fn default() -> Self {
		Self {
			prefer_dimension_attributes: false,
			default_dimension: 100,
			sanitize_timeout_ms: 10_000,
			max_inflated_bytes: svgward::DEFAULT_MAX_INFLATED_BYTES,
		}
	}
}

impl UploadSettings {
	pub fn sanitize_timeout(&self) -> Duration {
		Duration::from_millis(self.sanitize_timeout_ms)
	}
}

/// Full host configuration: allow-list overrides and upload settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SvgConfig {
	pub allow_list: AllowListOverrides,
	pub upload: UploadSettings,
}

impl SvgConfig {
	pub fn from_json(json: &str) -> UpResult<Self> {
		let config: SvgConfig = serde_json::from_str(json)?;
		if config.upload.default_dimension == 0 {
			return Err(Error::Config("defaultDimension must be positive".into()));
		}
		Ok(config)
	}

	pub async fn load(path: &Path) -> UpResult<Self> {
		let json = tokio::fs::read_to_string(path).await?;
		let config = Self::from_json(&json)?;
		info!("SVG config loaded from {}", path.display());
		Ok(config)
	}

	pub fn allow_list(&self) -> UpResult<AllowListConfig> {
		Ok(AllowListConfig::default().with_overrides(&self.allow_list)?)
	}

	/// Build a sanitizer with the configured allow-list and limits.
	pub fn sanitizer(&self) -> UpResult<Sanitizer> {
		Ok(Sanitizer::new(self.allow_list()?)?.with_max_inflated_bytes(self.upload.max_inflated_bytes))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_empty_config_uses_defaults() {
		let config = SvgConfig::from_json("{}").unwrap();
		assert_eq!(config.upload, UploadSettings::default());
		assert_eq!(config.allow_list().unwrap(), AllowListConfig::default());
	}

	#[test]
	fn test_parse_full_config() {
		let config = SvgConfig::from_json(
			r#"{
				"allowList": { "tags": { "remove": ["foreignObject"] }, "attributes": { "add": ["data-name"] } },
				"upload": { "preferDimensionAttributes": true, "defaultDimension": 64, "sanitizeTimeoutMs": 500 }
			}"#,
		)
		.unwrap();
		assert!(config.upload.prefer_dimension_attributes);
		assert_eq!(config.upload.default_dimension, 64);
		assert_eq!(config.upload.sanitize_timeout(), Duration::from_millis(500));

		let allow_list = config.allow_list().unwrap();
		assert!(!allow_list.allows_tag("foreignobject"));
		assert!(allow_list.allows_attribute("data-name"));
	}

	#[test]
	fn test_invalid_config() {
		assert!(matches!(SvgConfig::from_json("[]"), Err(Error::Config(_))));
		assert!(matches!(
			SvgConfig::from_json(r#"{"upload": {"defaultDimension": 0}}"#),
			Err(Error::Config(_))
		));

		let config =
			SvgConfig::from_json(r#"{"allowList": {"attributes": {"replace": []}}}"#).unwrap();
		assert!(matches!(config.sanitizer(), Err(Error::Config(_))));
	}
}

// vim: ts=4
