//! Upload error types

use std::fmt;
use std::time::Duration;

pub type UpResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// Actor may not upload SVG files
	PermissionDenied,
	/// Sanitizer rejected the file
	SanitizeFailed(svgward::Error),
	/// Sanitizer did not finish in time
	Timeout(Duration),
	Config(String),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::PermissionDenied => write!(f, "you are not allowed to upload SVG files"),
			Error::SanitizeFailed(err) => write!(f, "file could not be sanitized: {}", err),
			Error::Timeout(after) => write!(f, "file could not be sanitized: timed out after {:?}", after),
			Error::Config(msg) => write!(f, "configuration error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "I/O error: {}", err),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::SanitizeFailed(err) => Some(err),
			Error::Io(err) => Some(err),
			_ => None,
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Error::Io(err)
	}
}

impl From<svgward::Error> for Error {
	fn from(err: svgward::Error) -> Self {
		match err {
			svgward::Error::Config(msg) => Error::Config(msg),
			err => Error::SanitizeFailed(err),
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Config(err.to_string())
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(err: tokio::task::JoinError) -> Self {
		Error::Internal(format!("sanitizer task failed: {}", err))
	}
}

// vim: ts=4
