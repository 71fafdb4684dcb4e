//! Error types for the SVG sanitizer
//!
//! Every variant is a rejection: the sanitizer never hands back content it
//! could not vouch for. Structural-stage failures are not represented here,
//! they degrade to the pre-filtered content instead (see `structural`).

use std::fmt;

pub type SvResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// Input was empty
	EmptyInput,
	/// Decoded content is not valid UTF-8
	InvalidEncoding,
	/// Gzip payload could not be inflated
	Decompress(String),
	/// Inflated payload exceeds the configured limit (in bytes)
	TooLarge(usize),
	/// Sanitized output could not be gzipped again
	Compress(String),
	/// No `<svg` element left after sanitization
	NotSvg,
	/// Invalid allow-list configuration
	Config(String),
	Internal(String),
}

impl Error {
	/// Short machine-readable code, mirrors the `E-*` codes used in API errors
	pub fn code(&self) -> &'static str {
		match self {
			Error::EmptyInput => "E-SVG-EMPTY",
			Error::InvalidEncoding => "E-SVG-ENCODING",
			Error::Decompress(_) => "E-SVG-DECOMPRESS",
			Error::TooLarge(_) => "E-SVG-TOOLARGE",
			Error::Compress(_) => "E-SVG-COMPRESS",
			Error::NotSvg => "E-SVG-INVALID",
			Error::Config(_) => "E-SVG-CONFIG",
			Error::Internal(_) => "E-SVG-INTERNAL",
		}
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::EmptyInput => write!(f, "empty input"),
			Error::InvalidEncoding => write!(f, "SVG content is not valid UTF-8"),
			Error::Decompress(msg) => write!(f, "decompression failed: {}", msg),
			Error::TooLarge(limit) => {
				write!(f, "decompressed SVG exceeds the limit of {} bytes", limit)
			}
			Error::Compress(msg) => write!(f, "compression failed: {}", msg),
			Error::NotSvg => write!(f, "not valid SVG after sanitization"),
			Error::Config(msg) => write!(f, "invalid allow-list configuration: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<regex::Error> for Error {
	fn from(err: regex::Error) -> Self {
		Error::Internal(format!("regex error: {}", err))
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Config(err.to_string())
	}
}


// vim: ts=4
