//! Encoded polyline codec
//!
//! Values are stored latitude first, as zig-zag deltas in 5-bit chunks offset
//! by 63. Routing responses use precision 6, the classic format precision 5.

use ms_core::LngLat;

use crate::{DataError, DataResult};

/// Precision used by routing shapes
pub const ROUTE_PRECISION: u32 = 6;

/// Decode an encoded polyline
pub fn decode(encoded: &str, precision: u32) -> DataResult<Vec<LngLat>> {
    let factor = 10f64.powi(precision as i32);
    let bytes = encoded.as_bytes();

    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut coordinates = Vec::new();

    while index < bytes.len() {
        lat = accumulate(lat, bytes, &mut index)?;
        lng = accumulate(lng, bytes, &mut index)?;
        coordinates.push(LngLat::new(lng as f64 / factor, lat as f64 / factor));
    }

    Ok(coordinates)
}

/// Encode coordinates as a polyline
pub fn encode(coordinates: &[LngLat], precision: u32) -> String {
    let factor = 10f64.powi(precision as i32);
    let mut out = String::new();
    let mut previous_lat: i64 = 0;
    let mut previous_lng: i64 = 0;

    for coordinate in coordinates {
        let lat = (coordinate.latitude * factor).round() as i64;
        let lng = (coordinate.longitude * factor).round() as i64;
        push_value(lat - previous_lat, &mut out);
        push_value(lng - previous_lng, &mut out);
        previous_lat = lat;
        previous_lng = lng;
    }

    out
}

fn accumulate(total: i64, bytes: &[u8], index: &mut usize) -> DataResult<i64> {
    let start = *index;
    let delta = next_value(bytes, index)?;
    total.checked_add(delta).ok_or(DataError::InvalidPolyline(start))
}

fn next_value(bytes: &[u8], index: &mut usize) -> DataResult<i64> {
    let start = *index;
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes.get(*index).ok_or(DataError::InvalidPolyline(start))?;
        if !(63..=126).contains(&byte) {
            return Err(DataError::InvalidPolyline(*index));
        }
        let chunk = i64::from(byte - 63);
        *index += 1;

        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
        if shift > 60 {
            return Err(DataError::InvalidPolyline(start));
        }
    }

    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}

fn push_value(value: i64, out: &mut String) {
    let mut value = if value < 0 { !(value << 1) } else { value << 1 };
    while value >= 0x20 {
        out.push(char::from((((value & 0x1f) | 0x20) + 63) as u8));
        value >>= 5;
    }
    out.push(char::from((value + 63) as u8));
}
