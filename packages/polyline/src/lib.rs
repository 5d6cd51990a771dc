#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Encoded-polyline codec for compact route geometry.
//!
//! Directions providers return route geometry in the delta-encoded text
//! format used by Google's polyline algorithm: each coordinate component
//! is a zig-zag-signed delta from the previous point, scaled by 1e5 and
//! split into 5-bit groups offset into printable ASCII, with bit `0x20`
//! marking a continuation. Decoding is a strict forward scan starting at
//! (0, 0); a truncated or corrupt encoding fails the whole decode rather
//! than yielding partial points.

use safest_geo::Coordinate;
use thiserror::Error;

/// Fixed-point scale: coordinates are encoded as 1e-5 degree integers.
const SCALE: f64 = 1e5;

/// Continuation bit within each 5-bit group.
const CONTINUATION: u64 = 0x20;

/// ASCII offset applied to every encoded group.
const OFFSET: u8 = 63;

/// Errors produced while decoding an encoded polyline.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum PolylineError {
    /// The input ended while a group run was still marked as continuing.
    #[error("polyline truncated: group run unterminated at byte {offset}")]
    Truncated {
        /// Byte offset where input ran out.
        offset: usize,
    },
    /// A byte outside the printable encoded range was encountered.
    #[error("polyline contains invalid byte {byte:#04x} at offset {offset}")]
    InvalidByte {
        /// The offending byte value.
        byte: u8,
        /// Byte offset of the invalid byte.
        offset: usize,
    },
}

/// Decodes an encoded polyline into its coordinate sequence.
///
/// # Errors
///
/// Returns [`PolylineError`] if the encoding is truncated mid-group or
/// contains a byte outside the encoded alphabet. No partial coordinate
/// list is returned on failure.
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut coordinates = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let (dlat, next) = decode_signed(bytes, index)?;
        let (dlng, next) = decode_signed(bytes, next)?;
        lat += dlat;
        lng += dlng;
        coordinates.push(Coordinate::new(lat as f64 / SCALE, lng as f64 / SCALE));
        index = next;
    }

    Ok(coordinates)
}

/// Encodes a coordinate sequence into the compact polyline format.
///
/// Exact inverse of [`decode`]: round-tripping reproduces every point to
/// within the 1e-5 degree fixed-point resolution.
#[must_use]
pub fn encode(coordinates: &[Coordinate]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for coordinate in coordinates {
        #[allow(clippy::cast_possible_truncation)]
        let lat = (coordinate.latitude * SCALE).round() as i64;
        #[allow(clippy::cast_possible_truncation)]
        let lng = (coordinate.longitude * SCALE).round() as i64;
        encode_signed(lat - prev_lat, &mut out);
        encode_signed(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

/// Decodes one zig-zag-signed value starting at `index`, returning the
/// value and the index of the byte after its final group.
fn decode_signed(bytes: &[u8], start: usize) -> Result<(i64, usize), PolylineError> {
    let mut index = start;
    let mut accumulator: u64 = 0;
    let mut shift = 0u32;

    loop {
        let Some(&byte) = bytes.get(index) else {
            return Err(PolylineError::Truncated { offset: index });
        };
        if !(OFFSET..=126).contains(&byte) {
            return Err(PolylineError::InvalidByte {
                byte,
                offset: index,
            });
        }
        let group = u64::from(byte - OFFSET);
        accumulator |= (group & 0x1f) << shift;
        index += 1;
        if group & CONTINUATION == 0 {
            break;
        }
        shift += 5;
        if shift > 60 {
            // A run this long cannot encode a valid 1e-5 degree delta.
            return Err(PolylineError::InvalidByte {
                byte,
                offset: index - 1,
            });
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    let raw = accumulator as i64;
    let value = if raw & 1 == 1 { !(raw >> 1) } else { raw >> 1 };
    Ok((value, index))
}

/// Encodes one value with zig-zag sign folding into 5-bit groups.
fn encode_signed(value: i64, out: &mut String) {
    #[allow(clippy::cast_sign_loss)]
    let mut remaining = (if value < 0 {
        !(value << 1)
    } else {
        value << 1
    }) as u64;

    while remaining >= CONTINUATION {
        #[allow(clippy::cast_possible_truncation)]
        let group = ((remaining & 0x1f) | CONTINUATION) as u8;
        out.push(char::from(group + OFFSET));
        remaining >>= 5;
    }
    #[allow(clippy::cast_possible_truncation)]
    out.push(char::from(remaining as u8 + OFFSET));
}
