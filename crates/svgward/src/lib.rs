//! SVG sanitizer.
//!
//! Turns untrusted SVG or SVGZ bytes into allow-listed SVG markup, or
//! rejects them. Three stages run in order:
//! - a regex pre-filter that strips scripts, event handlers, dangerous URIs,
//!   DTDs and embedded documents,
//! - a structural pass that parses the markup and keeps only allow-listed
//!   elements and attributes (falls back to the pre-filtered markup when the
//!   input does not parse),
//! - a final cleanup that removes leftovers, requires an `<svg>` element and
//!   minifies whitespace.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod cleanup;
pub mod config;
pub(crate) mod dom;
pub mod error;
pub mod gzip;
pub mod prefilter;
pub mod sanitizer;
pub mod structural;

mod prelude;

pub use config::{AllowListConfig, AllowListOverrides, ListOverride};
pub use error::{Error, SvResult};
pub use sanitizer::{Sanitizer, SharedSanitizer, DEFAULT_MAX_INFLATED_BYTES};

/// Sanitize with the built-in allow-list.
///
/// Compiles the stage patterns on every call; keep a [`Sanitizer`] around
/// when sanitizing more than once.
pub fn sanitize(content: &[u8]) -> SvResult<Vec<u8>> {
	Sanitizer::new(AllowListConfig::default())?.sanitize(content)
}

/// Case-insensitive check for an `<svg` start tag. The name has to end
/// there, `<svgfoo` does not count.
pub fn has_svg_tag(text: &str) -> bool {
	text.as_bytes().windows(5).any(|w| {
		w[..4].eq_ignore_ascii_case(b"<svg") && (w[4].is_ascii_whitespace() || matches!(w[4], b'/' | b'>'))
	})
}


// vim: ts=4
