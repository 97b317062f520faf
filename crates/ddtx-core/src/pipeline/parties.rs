//! Party and delivery-address resolution.
//!
//! The hard case is the two-column print layout: the billing client and
//! the delivery location share the same text lines, client on the left,
//! delivery on the right. Every strategy here is ranked, and the issuer's
//! own identity is used only negatively, to reject false matches.

use tracing::debug;

use crate::models::config::{ClientDirectory, DdtxConfig};
use crate::models::document::{collapse_whitespace, Address, IssuerIdentity, Party};
use crate::rules::address::{
    build_address, has_street_marker, parse_locality, split_double_locality,
    split_double_street, street_marker_count,
};
use crate::rules::partita_iva::{extract_tax_code, PartitaIvaExtractor};
use crate::rules::patterns::{
    mentions_transporter, COMPANY_SUFFIX, POSTAL_CODE, RECIPIENT_MARKER, RECORD_LINE,
    RECORD_LINE_WITH_NAME, TRANSPORTER_MARKER,
};
use crate::rules::FieldExtractor;

/// Resolver output.
#[derive(Debug, Clone, Default)]
pub struct PartyResolution {
    pub client: Party,
    pub delivery_address: Option<Address>,
}

/// Resolve the client party and the delivery address.
///
/// `party` is the span between the delivery marker and the items table
/// when the segmenter found one; name extraction also scans the header,
/// and the VAT number may sit anywhere in the document.
pub fn resolve(
    header: &[String],
    party: Option<&[String]>,
    full_text: &str,
    config: &DdtxConfig,
    warnings: &mut Vec<String>,
) -> PartyResolution {
    let issuer = &config.issuer;

    let mut client = Party::default();
    match client_name(header, party, issuer) {
        Some(name) => client.name = name,
        None => warnings.push("client name not found".to_string()),
    }

    let extractor = PartitaIvaExtractor::new()
        .with_validation(config.extraction.validate_vat_numbers)
        .excluding(issuer.vat_number.clone());
    client.vat_number = extractor.extract(full_text).map(|m| m.value);
    client.tax_code = extract_tax_code(full_text);

    let address_lines: Vec<String> = match party {
        Some(span) if !span.is_empty() => span.to_vec(),
        _ => header.to_vec(),
    };

    let columns = split_columns(&address_lines);
    client.address = columns.client.or_else(|| single_block(&address_lines, issuer));

    let mut delivery = columns
        .delivery
        .or_else(|| single_marker_delivery(&address_lines));

    // The issuer's printed return address must never become the delivery
    // address.
    if let Some(candidate) = &delivery {
        if candidate.same_locality(&issuer.address) {
            debug!(address = %candidate.format(), "discarding issuer locality");
            warnings.push("delivery candidate matched issuer locality, discarded".to_string());
            delivery = None;
        }
    }

    if delivery.is_none() {
        delivery = fixed_location(&client.name, &config.clients);
        if delivery.is_some() {
            debug!(client = %client.name, "delivery address from fixed-location directory");
        }
    }

    // Single block means delivery equals billing.
    if delivery.is_none() {
        delivery = client.address.clone();
    }

    if delivery.is_none() {
        warnings.push("delivery address not resolved".to_string());
    }

    PartyResolution {
        client,
        delivery_address: delivery,
    }
}

/// Ranked client-name search.
///
/// Order: trailing name on the header record line, the line right after a
/// bare record line, a recipient/attention marker, and finally any line
/// carrying a legal-form suffix that is neither the issuer nor a carrier.
fn client_name(
    header: &[String],
    party: Option<&[String]>,
    issuer: &IssuerIdentity,
) -> Option<String> {
    for line in header {
        if let Some(caps) = RECORD_LINE_WITH_NAME.captures(line.trim()) {
            if let Some(name) = accept_name(&caps[5], issuer) {
                return Some(name);
            }
        }
    }

    for (i, line) in header.iter().enumerate() {
        if RECORD_LINE.is_match(line.trim()) {
            if let Some(next) = header.get(i + 1) {
                if let Some(name) = accept_name(next, issuer) {
                    return Some(name);
                }
            }
        }
    }

    let scan: Vec<&String> = header
        .iter()
        .chain(party.into_iter().flatten())
        .collect();

    for line in &scan {
        if let Some(m) = RECIPIENT_MARKER.find(line) {
            if let Some(name) = accept_name(&line[m.end()..], issuer) {
                return Some(name);
            }
        }
    }

    for line in &scan {
        if COMPANY_SUFFIX.is_match(line) {
            if let Some(name) = accept_name(line, issuer) {
                return Some(name);
            }
        }
    }

    None
}

/// Clean and vet a raw name candidate. Rejects the issuer's own name,
/// carrier names, address lines and empty strings; collapses a doubled
/// name to the single occurrence.
fn accept_name(raw: &str, issuer: &IssuerIdentity) -> Option<String> {
    let name = collapse_repetition(&collapse_whitespace(raw));
    if name.is_empty()
        || issuer.matches_name(&name)
        || mentions_transporter(&name)
        || TRANSPORTER_MARKER.is_match(&name)
        || has_street_marker(&name)
        || POSTAL_CODE.is_match(&name)
    {
        return None;
    }
    Some(name)
}

/// Collapse a name that is its own textual repetition:
/// `"DONAC S.R.L. DONAC S.R.L."` becomes `"DONAC S.R.L."`.
fn collapse_repetition(name: &str) -> String {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.len() >= 2 && tokens.len() % 2 == 0 {
        let half = tokens.len() / 2;
        if tokens[..half] == tokens[half..] {
            return tokens[..half].join(" ");
        }
    }
    name.to_string()
}

/// Left/right address pair carved out of a two-column block.
#[derive(Debug, Default)]
struct ColumnSplit {
    client: Option<Address>,
    delivery: Option<Address>,
}

/// Split a two-column address block: a line with two street markers gives
/// the streets, and the nearest following line with two postal codes
/// gives the locality tails.
fn split_columns(lines: &[String]) -> ColumnSplit {
    let mut result = ColumnSplit::default();

    for (i, line) in lines.iter().enumerate() {
        if mentions_transporter(line) {
            continue;
        }
        let Some((left_street, right_street)) = split_double_street(line) else {
            continue;
        };

        for follow in lines.iter().skip(i + 1).take(3) {
            if let Some((left_loc, right_loc)) = split_double_locality(follow) {
                result.client = build_address(&left_street, &left_loc);
                result.delivery = build_address(&right_street, &right_loc);
                return result;
            }
            // a single locality tail serves both columns
            if parse_locality(follow).is_some() {
                result.client = build_address(&left_street, follow);
                result.delivery = build_address(&right_street, follow);
                return result;
            }
        }
    }

    result
}

/// Single street marker, two postal codes on the following line: the
/// right-hand locality is the delivery one.
fn single_marker_delivery(lines: &[String]) -> Option<Address> {
    for (i, line) in lines.iter().enumerate() {
        if mentions_transporter(line) || street_marker_count(line) != 1 {
            continue;
        }
        for follow in lines.iter().skip(i + 1).take(3) {
            if let Some((_, right_loc)) = split_double_locality(follow) {
                if let Some(addr) = build_address(line, &right_loc) {
                    return Some(addr);
                }
            }
        }
    }
    None
}

/// A one-column block: single street line plus single locality line.
fn single_block(lines: &[String], issuer: &IssuerIdentity) -> Option<Address> {
    for (i, line) in lines.iter().enumerate() {
        if mentions_transporter(line) || street_marker_count(line) != 1 {
            continue;
        }
        for follow in lines.iter().skip(i + 1).take(3) {
            if split_double_locality(follow).is_some() {
                continue;
            }
            if let Some(addr) = build_address(line, follow) {
                if !addr.same_locality(&issuer.address) {
                    return Some(addr);
                }
            }
        }
    }
    None
}

/// Last-resort lookup in the caller-supplied fixed-location directory.
/// Keys match as case-insensitive substrings of the client name.
fn fixed_location(client_name: &str, clients: &ClientDirectory) -> Option<Address> {
    if client_name.is_empty() {
        return None;
    }
    let upper = client_name.to_uppercase();
    clients
        .iter()
        .find(|(key, _)| upper.contains(&key.to_uppercase()))
        .and_then(|(_, loc)| loc.to_address())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::FixedLocation;
    use pretty_assertions::assert_eq;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_two_column_delivery() {
        let span = lines(&[
            "Luogo di consegna",
            "VIA BERTOLE', 13/15  VIA MEANA, SNC",
            "10088 VOLPIANO TO 10088 VOLPIANO TO",
        ]);
        let split = split_columns(&span);
        let delivery = split.delivery.unwrap();
        assert_eq!(delivery.street_line, "VIA MEANA, SNC");
        assert_eq!(delivery.postal_code, "10088");
        assert_eq!(delivery.city, "VOLPIANO");

        let client = split.client.unwrap();
        assert_eq!(client.street_line, "VIA BERTOLE', 13/15");
    }

    #[test]
    fn test_issuer_locality_discarded() {
        let header = lines(&["4681 21/05/25 1 5712", "DONAC S.R.L."]);
        let span = lines(&[
            "Luogo di consegna",
            "VIA ROMA, 1  C.SO G. MARCONI, 10/E",
            "12051 ALBA CN 12050 MAGLIANO ALFIERI CN",
        ]);
        let mut warnings = Vec::new();
        let config = DdtxConfig::default();
        let r = resolve(&header, Some(&span), "", &config, &mut warnings);

        // issuer side rejected, fell back to the client's own column
        assert_eq!(
            r.delivery_address.as_ref().map(|a| a.city.as_str()),
            Some("ALBA")
        );
        assert!(warnings.iter().any(|w| w.contains("issuer locality")));
    }

    #[test]
    fn test_client_name_after_record_line() {
        let header = lines(&["4681 21/05/25 1 5712", "DONAC S.R.L."]);
        let config = DdtxConfig::default();
        let mut warnings = Vec::new();
        let r = resolve(&header, None, "", &config, &mut warnings);
        assert_eq!(r.client.name, "DONAC S.R.L.");
    }

    #[test]
    fn test_client_name_on_record_line() {
        let header = lines(&["5023 3/06/25 1 20322 DONAC S.R.L."]);
        assert_eq!(
            client_name(&header, None, &IssuerIdentity::default()),
            Some("DONAC S.R.L.".to_string())
        );
    }

    #[test]
    fn test_issuer_name_rejected() {
        let header = lines(&[
            "4681 21/05/25 1 5712",
            "ALFIERI SPECIALITA' ALIMENTARI S.P.A.",
            "Spett.le BOREALE S.R.L.",
        ]);
        assert_eq!(
            client_name(&header, None, &IssuerIdentity::default()),
            Some("BOREALE S.R.L.".to_string())
        );
    }

    #[test]
    fn test_transporter_rejected() {
        let header = lines(&["4681 21/05/25 1 5712", "S.A.F.I.M. S.P.A."]);
        assert_eq!(client_name(&header, None, &IssuerIdentity::default()), None);
    }

    #[test]
    fn test_doubled_name_collapsed() {
        assert_eq!(
            collapse_repetition("DONAC S.R.L. DONAC S.R.L."),
            "DONAC S.R.L."
        );
        assert_eq!(collapse_repetition("DONAC S.R.L."), "DONAC S.R.L.");
        assert_eq!(
            collapse_repetition("FRESCHI MISTI TORINO"),
            "FRESCHI MISTI TORINO"
        );
    }

    #[test]
    fn test_fixed_location_fallback() {
        let mut config = DdtxConfig::default();
        config.clients.insert(
            "BOREALE".to_string(),
            FixedLocation {
                street_line: "VIA SALUZZO, 65".to_string(),
                postal_code: "12038".to_string(),
                city: "SAVIGLIANO".to_string(),
                province: "CN".to_string(),
            },
        );

        let header = lines(&["4681 21/05/25 1 5712", "Spett.le BOREALE S.R.L."]);
        let mut warnings = Vec::new();
        let r = resolve(&header, None, "", &config, &mut warnings);
        assert_eq!(
            r.delivery_address.as_ref().map(|a| a.street_line.as_str()),
            Some("VIA SALUZZO, 65")
        );
    }

    #[test]
    fn test_single_block_serves_both() {
        let span = lines(&[
            "Luogo di consegna",
            "VIA MEANA, SNC",
            "10088 VOLPIANO TO",
        ]);
        let header = lines(&["4681 21/05/25 1 5712", "DONAC S.R.L."]);
        let config = DdtxConfig::default();
        let mut warnings = Vec::new();
        let r = resolve(&header, Some(&span), "", &config, &mut warnings);

        let delivery = r.delivery_address.unwrap();
        assert_eq!(delivery.street_line, "VIA MEANA, SNC");
        assert_eq!(delivery, r.client.address.unwrap());
    }

    #[test]
    fn test_vat_number_excludes_issuer() {
        let header = lines(&["4681 21/05/25 1 5712", "DONAC S.R.L."]);
        let text = "P.IVA 03247720042\nP.IVA 00622580041";
        let config = DdtxConfig::default();
        let mut warnings = Vec::new();
        let r = resolve(&header, None, text, &config, &mut warnings);
        assert_eq!(r.client.vat_number.as_deref(), Some("00622580041"));
    }

    #[test]
    fn test_nothing_resolved_warns() {
        let header = lines(&["testo qualunque"]);
        let config = DdtxConfig::default();
        let mut warnings = Vec::new();
        let r = resolve(&header, None, "", &config, &mut warnings);
        assert!(r.delivery_address.is_none());
        assert!(warnings.iter().any(|w| w.contains("delivery address")));
        assert!(warnings.iter().any(|w| w.contains("client name")));
    }
}
