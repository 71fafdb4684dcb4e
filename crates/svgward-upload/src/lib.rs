//! Upload-side SVG handling.
//!
//! Decides whether an upload is SVG, checks that the uploader may upload
//! SVG at all, runs the sanitizer over the staged file and replaces it with
//! the sanitized bytes, and computes the intrinsic dimensions used for
//! display.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod detect;
pub mod dimensions;
pub mod error;
pub mod handler;
pub mod perm;
pub mod settings;

mod prelude;

pub use dimensions::Dimensions;
pub use error::{Error, UpResult};
pub use handler::{StagedUpload, UploadHandler, UploadOutcome};
pub use perm::{Actor, RolePermission, UploadPermission};
pub use settings::{SvgConfig, UploadSettings};

// vim: ts=4
