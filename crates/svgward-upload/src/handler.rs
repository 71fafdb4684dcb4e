//! Upload orchestration: detect, authorize, sanitize in place, measure.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use svgward::SharedSanitizer;

use crate::detect;
use crate::dimensions::{self, Dimensions};
use crate::perm::{Actor, UploadPermission};
use crate::prelude::*;
use crate::settings::{SvgConfig, UploadSettings};

/// A file written to staging storage, not yet moved to permanent storage
#[derive(Debug, Clone)]
pub struct StagedUpload {
	pub path: PathBuf,
	pub file_name: String,
	pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
	/// Not an SVG, left untouched
	Passthrough,
	/// Staged file now holds the sanitized SVG
	Sanitized { original_size: u64, size: u64, dim: Dimensions },
}

pub struct UploadHandler {
	sanitizer: Arc<SharedSanitizer>,
	permission: Arc<dyn UploadPermission>,
	settings: UploadSettings,
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
	let mut name = OsString::from(path.as_os_str());
	name.push(suffix);
	PathBuf::from(name)
}

/// Remove a rejected staged file so its bytes are never persisted.
async fn discard(path: &Path) {
	if let Err(err) = tokio::fs::remove_file(path).await {
		warn!("Failed to remove rejected upload {}: {}", path.display(), err);
	}
}

impl UploadHandler {
	pub fn new(
		sanitizer: Arc<SharedSanitizer>,
		permission: Arc<dyn UploadPermission>,
		settings: UploadSettings,
	) -> Self {
		Self { sanitizer, permission, settings }
	}

	pub fn from_config(config: &SvgConfig, permission: Arc<dyn UploadPermission>) -> UpResult<Self> {
		let sanitizer = Arc::new(SharedSanitizer::new(config.sanitizer()?));
		Ok(Self::new(sanitizer, permission, config.upload.clone()))
	}

	pub fn sanitizer(&self) -> &Arc<SharedSanitizer> {
		&self.sanitizer
	}

	/// Whether the staged file has to go through the sanitizer.
	///
	/// Generic binary uploads are sniffed, everything else is decided by
	/// name and declared type.
	pub async fn is_svg_upload(&self, staged: &StagedUpload) -> UpResult<bool> {
		if detect::is_svg_candidate(&staged.file_name, staged.content_type.as_deref()) {
			return Ok(true);
		}
		match staged.content_type.as_deref().map(detect::essence).as_deref() {
			Some("application/octet-stream") => {
				let bytes = tokio::fs::read(&staged.path).await?;
				Ok(detect::looks_like_svg(&bytes))
			}
			_ => Ok(false),
		}
	}

	/// Process a staged upload.
	///
	/// SVG files are replaced in place by their sanitized form. On any
	/// rejection the staged file is removed.
	pub async fn process(&self, actor: &Actor, staged: &StagedUpload) -> UpResult<UploadOutcome> {
		if !self.is_svg_upload(staged).await? {
			return Ok(UploadOutcome::Passthrough);
		}

		if !self.permission.user_can_upload(actor).await {
			warn!("SVG upload denied for {}: {}", actor.id_tag, staged.file_name);
			discard(&staged.path).await;
			return Err(Error::PermissionDenied);
		}

		let bytes = tokio::fs::read(&staged.path).await?;
		let original_size = bytes.len() as u64;

		let sanitized = match self.sanitize(bytes).await {
			Ok(sanitized) => sanitized,
			Err(err) => {
				warn!("SVG upload rejected ({}): {}", staged.file_name, err);
				discard(&staged.path).await;
				return Err(err);
			}
		};

		// Replace atomically so a half-written file is never picked up
		let tmp = sibling_path(&staged.path, ".sanitized");
		let stored = match tokio::fs::write(&tmp, &sanitized).await {
			Ok(()) => tokio::fs::rename(&tmp, &staged.path).await,
			Err(err) => Err(err),
		};
		if let Err(err) = stored {
			// The unsanitized original must not outlive a failed replace
			warn!("Failed to store sanitized upload {}: {}", staged.file_name, err);
			discard(&tmp).await;
			discard(&staged.path).await;
			return Err(err.into());
		}

		let dim = dimensions::dimensions_or_default(&sanitized, &self.settings);
		info!(
			"SVG sanitized: {} {} -> {} bytes, {}x{}",
			staged.file_name,
			original_size,
			sanitized.len(),
			dim.width,
			dim.height
		);

		Ok(UploadOutcome::Sanitized { original_size, size: sanitized.len() as u64, dim })
	}

	async fn sanitize(&self, bytes: Vec<u8>) -> UpResult<Vec<u8>> {
		let sanitizer = self.sanitizer.snapshot();
		let timeout = self.settings.sanitize_timeout();
		let task = tokio::task::spawn_blocking(move || sanitizer.sanitize(&bytes));

		match tokio::time::timeout(timeout, task).await {
			Ok(joined) => Ok(joined??),
			Err(_) => Err(Error::Timeout(timeout)),
		}
	}
}

// vim: ts=4
