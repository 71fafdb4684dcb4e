//! SVGZ support: gzip detection, bounded inflate and re-compression.

use std::io::{Read, Write};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use crate::prelude::*;

/// Gzip member header: ID1, ID2 and the deflate compression method.
pub const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];

pub fn is_gzip(data: &[u8]) -> bool {
	data.starts_with(&GZIP_MAGIC)
}

/// Inflate a gzip payload, refusing to produce more than `limit` bytes.
pub fn inflate(data: &[u8], limit: usize) -> SvResult<Vec<u8>> {
	let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
	let mut output = Vec::new();
	GzDecoder::new(data)
		.take(cap)
		.read_to_end(&mut output)
		.map_err(|e| Error::Decompress(e.to_string()))?;

	if output.len() > limit {
		return Err(Error::TooLarge(limit));
	}
	Ok(output)
}

pub fn deflate(data: &[u8]) -> SvResult<Vec<u8>> {
	let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
	encoder.write_all(data).map_err(|e| Error::Compress(e.to_string()))?;
	encoder.finish().map_err(|e| Error::Compress(e.to_string()))
}


// vim: ts=4
