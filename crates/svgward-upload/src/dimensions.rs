//! Intrinsic SVG dimensions, read from the root element's `width`, `height`
//! and `viewBox` attributes.
//!
//! Percentages and font-relative units cannot be resolved without a
//! viewport and are rejected; absolute units are converted to CSS pixels.

use std::borrow::Cow;

use quick_xml::{escape::unescape, events::Event, Reader};
use serde::Serialize;
use svgward::gzip;

use crate::prelude::*;
use crate::settings::UploadSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
	pub width: u32,
	pub height: u32,
}

impl Dimensions {
	pub fn square(side: u32) -> Self {
		Self { width: side, height: side }
	}
}

#[derive(Debug, Default)]
struct RootAttributes {
	width: Option<String>,
	height: Option<String>,
	view_box: Option<String>,
}

/// Pixels per unit at 96 dpi.
fn unit_scale(unit: &str) -> Option<f64> {
	Some(match unit.to_ascii_lowercase().as_str() {
		"" | "px" => 1.0,
		"in" => 96.0,
		"cm" => 96.0 / 2.54,
		"mm" => 96.0 / 25.4,
		"pt" => 96.0 / 72.0,
		"pc" => 16.0,
		// %, em, ex, rem, vw, ...
		_ => None?,
	})
}

/// Parse an SVG length into pixels.
pub fn parse_length(value: &str) -> Option<f64> {
	let value = value.trim();
	let number_len = value.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%').len();
	let (number, unit) = value.split_at(number_len);
	let px = number.trim().parse::<f64>().ok()? * unit_scale(unit)?;
	(px.is_finite() && px > 0.0).then_some(px)
}

/// Width and height of a `viewBox` value.
pub fn parse_view_box(value: &str) -> Option<(f64, f64)> {
	let numbers = value
		.split(|c: char| c.is_whitespace() || c == ',')
		.filter(|part| !part.is_empty())
		.map(str::parse::<f64>)
		.collect::<Result<Vec<_>, _>>()
		.ok()?;
	match numbers[..] {
		[_, _, w, h] if w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0 => Some((w, h)),
		_ => None,
	}
}

fn root_attributes(svg: &str) -> Option<RootAttributes> {
	let mut reader = Reader::from_str(svg);
	loop {
		match reader.read_event().ok()? {
			Event::Start(e) | Event::Empty(e) => {
				// The first element is the root; anything but <svg> has no dimensions
				if !e.local_name().as_ref().eq_ignore_ascii_case(b"svg") {
					return None;
				}
				let mut attrs = RootAttributes::default();
				for attr in e.attributes().flatten() {
					let raw = std::str::from_utf8(&attr.value).ok()?;
					let value = unescape(raw).map(Cow::into_owned).ok()?;
					match attr.key.as_ref() {
						b"width" => attrs.width = Some(value),
						b"height" => attrs.height = Some(value),
						b"viewBox" => attrs.view_box = Some(value),
						_ => {}
					}
				}
				return Some(attrs);
			}
			Event::Eof => return None,
			_ => {}
		}
	}
}

fn to_pixels(value: f64) -> u32 {
	value.round().clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Dimensions of an SVG (or SVGZ) document, if they can be determined.
///
/// `prefer_attributes` selects width/height before viewBox.
pub fn extract_dimensions(svg: &[u8], prefer_attributes: bool) -> Option<Dimensions> {
	let inflated;
	let svg = if gzip::is_gzip(svg) {
		inflated = gzip::inflate(svg, svgward::DEFAULT_MAX_INFLATED_BYTES).ok()?;
		&inflated[..]
	} else {
		svg
	};
	let attrs = root_attributes(std::str::from_utf8(svg).ok()?)?;

	let from_attributes = match (&attrs.width, &attrs.height) {
		(Some(w), Some(h)) => parse_length(w).zip(parse_length(h)),
		_ => None,
	};
	let from_view_box = attrs.view_box.as_deref().and_then(parse_view_box);

	let (width, height) = if prefer_attributes {
		from_attributes.or(from_view_box)
	} else {
		from_view_box.or(from_attributes)
	}?;
	Some(Dimensions { width: to_pixels(width), height: to_pixels(height) })
}

/// Dimensions per `settings`, falling back to the configured default.
pub fn dimensions_or_default(svg: &[u8], settings: &UploadSettings) -> Dimensions {
	extract_dimensions(svg, settings.prefer_dimension_attributes).unwrap_or_else(|| {
		debug!("SVG dimensions unavailable, using default {}", settings.default_dimension);
		Dimensions::square(settings.default_dimension)
	})
}


// vim: ts=4
