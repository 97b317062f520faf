//! Address line analysis: street markers, two-column splitting,
//! locality parsing.
//!
//! Printed documents place the billing address and the delivery address
//! side by side on the same text lines. The right-hand occurrence of a
//! street marker (and the last of two postal codes) belongs to the
//! delivery location.

use crate::models::document::Address;

use super::patterns::{LOCALITY, POSTAL_CODE, STREET_MARKER};

/// Whether a line starts with (or contains) a street marker.
pub fn has_street_marker(line: &str) -> bool {
    STREET_MARKER.is_match(line)
}

/// Number of street markers on the line.
pub fn street_marker_count(line: &str) -> usize {
    STREET_MARKER.find_iter(line).count()
}

/// Split a line carrying two street addresses at the second marker.
///
/// `"VIA BERTOLE', 13/15  VIA MEANA, SNC"` splits into the client's own
/// street on the left and the delivery street on the right. Returns
/// `None` when fewer than two markers are present.
pub fn split_double_street(line: &str) -> Option<(String, String)> {
    let mut markers = STREET_MARKER.find_iter(line);
    let _first = markers.next()?;
    let second = markers.next()?;

    let left = line[..second.start()].trim();
    let right = line[second.start()..].trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left.to_string(), right.to_string()))
}

/// Split a line carrying two postal-code/city/province tails at the
/// last postal code. The right-hand part is the delivery locality.
pub fn split_double_locality(line: &str) -> Option<(String, String)> {
    let caps: Vec<_> = POSTAL_CODE.find_iter(line).collect();
    if caps.len() < 2 {
        return None;
    }
    let last = caps.last().unwrap();
    let left = line[..last.start()].trim();
    let right = line[last.start()..].trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left.to_string(), right.to_string()))
}

/// Parse a locality tail `"12050 MAGLIANO ALFIERI CN"` (optionally with
/// a dash or parenthesized province) into (cap, city, province).
pub fn parse_locality(text: &str) -> Option<(String, String, String)> {
    let caps = LOCALITY.captures(text.trim())?;
    let cap = caps[1].to_string();
    let city = caps[2].trim().to_string();
    let province = caps
        .get(3)
        .or_else(|| caps.get(4))?
        .as_str()
        .to_string();
    if city.is_empty() {
        return None;
    }
    Some((cap, city, province))
}

/// Assemble a validated address from a street line and a locality tail.
/// Returns `None` when either half fails its invariant.
pub fn build_address(street: &str, locality: &str) -> Option<Address> {
    let (cap, city, province) = parse_locality(locality)?;
    Address::new(street, cap, city, province)
}
