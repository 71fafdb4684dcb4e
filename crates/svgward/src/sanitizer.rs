//! Sanitizer entry point: ties the three stages together.

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::cleanup::Cleanup;
use crate::config::AllowListConfig;
use crate::gzip;
use crate::prefilter::PreFilter;
use crate::prelude::*;
use crate::structural::StructuralFilter;

/// Upper bound for inflated SVGZ payloads.
pub const DEFAULT_MAX_INFLATED_BYTES: usize = 32 * 1024 * 1024;

struct Stages {
	prefilter: PreFilter,
	structural: StructuralFilter,
	cleanup: Cleanup,
}

/// SVG sanitizer bound to one allow-list.
///
/// Cheap to clone; compiled patterns are shared. A `Sanitizer` holds no
/// mutable state and can be used from many threads at once.
#[derive(Clone)]
pub struct Sanitizer {
	config: Arc<AllowListConfig>,
	stages: Arc<Stages>,
	max_inflated_bytes: usize,
}

impl Sanitizer {
	pub fn new(config: AllowListConfig) -> SvResult<Self> {
		let stages = Stages {
			prefilter: PreFilter::new()?,
			structural: StructuralFilter::new()?,
			cleanup: Cleanup::new()?,
		};
		Ok(Self {
			config: Arc::new(config),
			stages: Arc::new(stages),
			max_inflated_bytes: DEFAULT_MAX_INFLATED_BYTES,
		})
	}

	pub fn with_max_inflated_bytes(mut self, limit: usize) -> Self {
		self.max_inflated_bytes = limit;
		self
	}

	/// Same patterns and limits, different allow-list.
	pub fn with_config(&self, config: AllowListConfig) -> Self {
		Self { config: Arc::new(config), ..self.clone() }
	}

	pub fn config(&self) -> &AllowListConfig {
		&self.config
	}

	/// Sanitize SVG or SVGZ content.
	///
	/// Gzipped input yields gzipped output. Content the structural stage
	/// cannot parse continues with the pre-filtered markup; only empty,
	/// undecodable, or non-SVG content is rejected.
	pub fn sanitize(&self, content: &[u8]) -> SvResult<Vec<u8>> {
		if content.is_empty() {
			return Err(Error::EmptyInput);
		}

		let compressed = gzip::is_gzip(content);
		let decoded: Cow<'_, [u8]> = if compressed {
			Cow::Owned(gzip::inflate(content, self.max_inflated_bytes)?)
		} else {
			Cow::Borrowed(content)
		};

		let text = std::str::from_utf8(&decoded).map_err(|_| Error::InvalidEncoding)?;
		let text = text.strip_prefix('\u{feff}').unwrap_or(text);

		let filtered = self.stages.prefilter.apply(text);
		let structured = self.stages.structural.apply(&filtered, &self.config);
		let cleaned = self.stages.cleanup.apply(&structured)?;

		debug!("SVG sanitized: {} -> {} bytes (gzip: {})", decoded.len(), cleaned.len(), compressed);

		if compressed {
			gzip::deflate(cleaned.as_bytes())
		} else {
			Ok(cleaned.into_bytes())
		}
	}
}

impl std::fmt::Debug for Sanitizer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Sanitizer")
			.field("config", &self.config)
			.field("max_inflated_bytes", &self.max_inflated_bytes)
			.finish_non_exhaustive()
	}
}

/// A sanitizer whose allow-list can be swapped at runtime.
///
/// Every call works on a snapshot taken when it starts, so a swap is never
/// observed half-way through a call.
pub struct SharedSanitizer {
	current: RwLock<Arc<Sanitizer>>,
}

impl SharedSanitizer {
	pub fn new(sanitizer: Sanitizer) -> Self {
		Self { current: RwLock::new(Arc::new(sanitizer)) }
	}

	pub fn snapshot(&self) -> Arc<Sanitizer> {
		self.current.read().clone()
	}

	/// Atomically replace the allow-list used by subsequent calls.
	pub fn replace_config(&self, config: AllowListConfig) {
		let next = Arc::new(self.snapshot().with_config(config));
		*self.current.write() = next;
		info!("SVG allow-list replaced");
	}

	pub fn sanitize(&self, content: &[u8]) -> SvResult<Vec<u8>> {
		self.snapshot().sanitize(content)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sanitizer() -> Sanitizer {
		Sanitizer::new(AllowListConfig::default()).unwrap()
	}

	#[test]
	fn test_rejects_empty_input() {
		assert!(matches!(sanitizer().sanitize(b""), Err(Error::EmptyInput)));
	}

	#[test]
	fn test_rejects_invalid_utf8() {
		assert!(matches!(sanitizer().sanitize(&[b'<', 0xff, 0xfe, b'>']), Err(Error::InvalidEncoding)));
	}

	#[test]
	fn test_strips_bom() {
		let out = sanitizer().sanitize("\u{feff}<svg><rect/></svg>".as_bytes()).unwrap();
		assert_eq!(out, b"<svg><rect/></svg>");
	}

	#[test]
	fn test_inflate_limit() {
		let padded = format!("<svg>{}</svg>", " ".repeat(2048));
		let compressed = gzip::deflate(padded.as_bytes()).unwrap();
		let small = sanitizer().with_max_inflated_bytes(1024);
		assert!(matches!(small.sanitize(&compressed), Err(Error::TooLarge(1024))));
		assert!(sanitizer().sanitize(&compressed).is_ok());
	}

	#[test]
	fn test_with_config_keeps_limits() {
		let base = sanitizer().with_max_inflated_bytes(10);
		let config = AllowListConfig::new(["svg", "rect"], ["width"]).unwrap();
		let derived = base.with_config(config);
		assert_eq!(derived.max_inflated_bytes, 10);
		assert!(!derived.config().allows_tag("circle"));
	}

	#[test]
	fn test_shared_replace_config() {
		let shared = SharedSanitizer::new(sanitizer());
		let input = b"<svg><circle r=\"1\"/><rect/></svg>";
		assert_eq!(shared.sanitize(input).unwrap(), b"<svg><circle r=\"1\"/><rect/></svg>");

		let before = shared.snapshot();
		shared.replace_config(AllowListConfig::new(["svg", "rect"], ["r"]).unwrap());
		assert_eq!(shared.sanitize(input).unwrap(), b"<svg><rect/></svg>");
		// a snapshot taken earlier keeps its allow-list
		assert!(before.config().allows_tag("circle"));
	}

	#[test]
	fn test_concurrent_use() {
		let sanitizer = sanitizer();
		std::thread::scope(|s| {
			for i in 0..4 {
				let sanitizer = &sanitizer;
				s.spawn(move || {
					let input = format!("<svg><rect width=\"{}\" onclick=\"x()\"/></svg>", i);
					let out = sanitizer.sanitize(input.as_bytes()).unwrap();
					assert_eq!(out, format!("<svg><rect width=\"{}\"/></svg>", i).into_bytes());
				});
			}
		});
	}
}

// vim: ts=4
