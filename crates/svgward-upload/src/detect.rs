//! Decide whether an upload is an SVG candidate.

use std::path::Path;

use svgward::{gzip, has_svg_tag};

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";

pub const SVG_EXTENSIONS: &[&str] = &["svg", "svgz"];

/// SVG by file extension or declared content type.
pub fn is_svg_candidate(file_name: &str, content_type: Option<&str>) -> bool {
	let by_extension = Path::new(file_name)
		.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| SVG_EXTENSIONS.iter().any(|svg| svg.eq_ignore_ascii_case(ext)));

	by_extension || content_type.is_some_and(|ct| essence(ct) == SVG_CONTENT_TYPE)
}

/// Media type without parameters, lowercased.
pub fn essence(content_type: &str) -> String {
	content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// Content sniffing for uploads without a useful name or type.
///
/// Only the first KiB is inspected. Gzip payloads count as candidates, the
/// sanitizer decides after inflating.
pub fn looks_like_svg(data: &[u8]) -> bool {
	if gzip::is_gzip(data) {
		return true;
	}

	let head = &data[..data.len().min(1024)];
	let start = match std::str::from_utf8(head) {
		Ok(s) => s,
		// multi-byte sequence cut by the 1024 byte window
		Err(e) if e.error_len().is_none() => {
			std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default()
		}
		Err(_) => return false,
	};
	let start = start.trim_start_matches('\u{feff}').trim_start();

	start.starts_with('<') && has_svg_tag(start)
}


// vim: ts=4
