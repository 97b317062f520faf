//! Document classification: kind, number, date and customer code from
//! the header region, with filename fallback.

use chrono::NaiveDate;
use tracing::debug;

use crate::models::document::DocumentKind;
use crate::rules::dates::{self, DateExtractor};
use crate::rules::patterns::{
    CREDIT_NOTE_TERM, FILENAME_NUMBER, INVOICE_TERM, ORDER_REFERENCE, RECORD_LINE,
    RECORD_LINE_WITH_NAME, TRANSPORT_TERM,
};
use crate::rules::FieldExtractor;

/// Classifier output.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub kind: Option<DocumentKind>,
    pub document_number: Option<String>,
    pub document_date: Option<NaiveDate>,
    pub customer_code: Option<String>,
    pub order_reference: Option<String>,
}

/// Classify the document from the header span and the filename hint.
///
/// The fixed-width record line `"{number} {date} {page} {customer_code}"`
/// is the highest-confidence source and wins over anything inferred from
/// the filename.
pub fn classify(
    header: &[String],
    filename_hint: &str,
    reference_date: NaiveDate,
    max_date_age_years: i32,
    warnings: &mut Vec<String>,
) -> Classification {
    let mut result = Classification::default();

    for (idx, line) in header.iter().enumerate() {
        let trimmed = line.trim();
        let caps = RECORD_LINE
            .captures(trimmed)
            .or_else(|| RECORD_LINE_WITH_NAME.captures(trimmed));
        if let Some(caps) = caps {
            result.document_number = Some(caps[1].to_string());
            result.customer_code = Some(caps[4].to_string());

            let extractor = DateExtractor::new();
            result.document_date = extractor.extract(&caps[2]).map(|m| m.value);
            debug!(line = idx, "matched header record line");
            break;
        }
    }

    // Filename fallback for number and date
    if result.document_number.is_none() {
        if let Some(caps) = FILENAME_NUMBER.captures(filename_hint) {
            result.document_number = Some(caps[1].to_string());
            warnings.push("document number inferred from filename".to_string());
        }
    }
    if result.document_date.is_none() {
        result.document_date = dates::date_from_filename(filename_hint);
    }

    // Plausibility window on the date
    if let Some(date) = result.document_date {
        if !dates::within_window(date, reference_date, max_date_age_years) {
            warnings.push(format!(
                "document date {} outside plausible window, discarded",
                date.format("%d/%m/%Y")
            ));
            result.document_date = None;
        }
    }

    result.kind = kind_from_filename(filename_hint).or_else(|| kind_from_header(header));
    if result.kind.is_none() {
        debug!("no kind signal, defaulting to invoice");
    }

    result.order_reference = header.iter().find_map(|line| {
        ORDER_REFERENCE
            .captures(line)
            .map(|caps| caps[1].to_string())
    });

    result
}

/// Infer the kind from an explicit type code in the filename.
fn kind_from_filename(filename: &str) -> Option<DocumentKind> {
    let upper = filename.to_uppercase();
    let tokens: Vec<&str> = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    for token in &tokens {
        match *token {
            "DDV" | "DDT" => return Some(DocumentKind::DeliveryNote),
            "NC" | "NCV" => return Some(DocumentKind::CreditNote),
            "FTV" | "FT" | "FATT" | "FATTURA" => return Some(DocumentKind::Invoice),
            _ => {}
        }
    }
    None
}

/// Infer the kind from header vocabulary. A tie between tax and
/// transport terms resolves to a delivery note only when an explicit
/// transport marker is present, otherwise an invoice.
fn kind_from_header(header: &[String]) -> Option<DocumentKind> {
    let joined = header.join("\n");

    if CREDIT_NOTE_TERM.is_match(&joined) {
        return Some(DocumentKind::CreditNote);
    }

    let has_transport = TRANSPORT_TERM.is_match(&joined);
    let has_invoice = INVOICE_TERM.is_match(&joined);

    match (has_invoice, has_transport) {
        (_, true) => Some(DocumentKind::DeliveryNote),
        (true, false) => Some(DocumentKind::Invoice),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_record_line_wins_over_filename() {
        let header = lines(&["4681 21/05/25 1 5712", "DONAC S.R.L."]);
        let mut warnings = Vec::new();
        let c = classify(&header, "DDV_9999_01-01-20.pdf", reference(), 5, &mut warnings);

        assert_eq!(c.document_number.as_deref(), Some("4681"));
        assert_eq!(
            c.document_date,
            NaiveDate::from_ymd_opt(2025, 5, 21)
        );
        assert_eq!(c.customer_code.as_deref(), Some("5712"));
        assert_eq!(c.kind, Some(DocumentKind::DeliveryNote));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_record_line_with_trailing_name() {
        let header = lines(&["5023 3/06/25 1 20322 DONAC S.R.L."]);
        let mut warnings = Vec::new();
        let c = classify(&header, "x.pdf", reference(), 5, &mut warnings);

        assert_eq!(c.document_number.as_deref(), Some("5023"));
        assert_eq!(c.customer_code.as_deref(), Some("20322"));
        assert_eq!(c.document_date, NaiveDate::from_ymd_opt(2025, 6, 3));
    }

    #[test]
    fn test_filename_fallback() {
        let header = lines(&["Spett.le DONAC S.R.L."]);
        let mut warnings = Vec::new();
        let c = classify(&header, "FTV_703205_21-05-25.pdf", reference(), 5, &mut warnings);

        assert_eq!(c.document_number.as_deref(), Some("703205"));
        assert_eq!(c.document_date, NaiveDate::from_ymd_opt(2025, 5, 21));
        assert_eq!(c.kind, Some(DocumentKind::Invoice));
        assert!(warnings.iter().any(|w| w.contains("filename")));
    }

    #[test]
    fn test_future_date_rejected() {
        let header = lines(&["4681 21/05/27 1 5712"]);
        let mut warnings = Vec::new();
        let c = classify(&header, "doc.pdf", reference(), 5, &mut warnings);

        assert_eq!(c.document_date, None);
        assert!(warnings.iter().any(|w| w.contains("plausible window")));
    }

    #[test]
    fn test_stale_date_rejected() {
        let header = lines(&["4681 21/05/02 1 5712"]);
        let mut warnings = Vec::new();
        let c = classify(&header, "doc.pdf", reference(), 5, &mut warnings);
        assert_eq!(c.document_date, None);
    }

    #[test]
    fn test_kind_from_header_vocabulary() {
        assert_eq!(
            kind_from_header(&lines(&["NOTA DI CREDITO N. 42"])),
            Some(DocumentKind::CreditNote)
        );
        assert_eq!(
            kind_from_header(&lines(&["FATTURA ACCOMPAGNATORIA"])),
            Some(DocumentKind::Invoice)
        );
        // tie with explicit transport marker defaults to delivery note
        assert_eq!(
            kind_from_header(&lines(&["FATTURA", "DOCUMENTO DI TRASPORTO D.D.T."])),
            Some(DocumentKind::DeliveryNote)
        );
        assert_eq!(kind_from_header(&lines(&["nessun segnale"])), None);
    }

    #[test]
    fn test_order_reference() {
        let header = lines(&[
            "4681 21/05/25 1 5712",
            "Rif. Ns. Ordine N. 507A865AS02756 del 19/05/25",
        ]);
        let mut warnings = Vec::new();
        let c = classify(&header, "x.pdf", reference(), 5, &mut warnings);
        assert_eq!(c.order_reference.as_deref(), Some("507A865AS02756"));
    }
}
