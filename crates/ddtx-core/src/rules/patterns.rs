//! Common regex patterns for Italian transport documents and invoices.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Fixed-width header record: "{number} {date} {page} {customer_code}".
    // Example: "4681 21/05/25 1 5712"
    pub static ref RECORD_LINE: Regex = Regex::new(
        r"^(\d{4,6})\s+(\d{1,2}/\d{1,2}/\d{2,4})\s+(\d+)\s+(\d{4,5})\s*$"
    ).unwrap();

    // Same record followed by the client name on the one line.
    pub static ref RECORD_LINE_WITH_NAME: Regex = Regex::new(
        r"^(\d{4,6})\s+(\d{1,2}/\d{1,2}/\d{2,4})\s+(\d+)\s+(\d{4,5})\s+(\S.*)$"
    ).unwrap();

    // Structural anchors for layout segmentation.
    pub static ref TABLE_HEADER: Regex = Regex::new(
        r"(?i)\bcodice\b.*\bdescrizione\b|\bdescrizione\b.*\bcodice\b"
    ).unwrap();

    pub static ref TOTALS_LABEL: Regex = Regex::new(
        r"(?i)totale\s+documento"
    ).unwrap();

    pub static ref DELIVERY_MARKER: Regex = Regex::new(
        r"(?i)luogo\s+di\s+consegna"
    ).unwrap();

    // Street markers covering the prefixes seen on printed documents.
    // Dot-terminated abbreviations end on the literal dot: a `\b` after
    // the dot would never match before a following space.
    pub static ref STREET_MARKER: Regex = Regex::new(
        r"(?i)\b(?:(?:VIA|V\.LE|VIALE|CORSO|C\.SO|PIAZZA|P\.ZZA|P\.ZA|STRADA|LOCALITA'?|VICOLO|LARGO|FRAZIONE)\b|(?:LOC|FRAZ)\.)"
    ).unwrap();

    // CAP, five digits.
    pub static ref POSTAL_CODE: Regex = Regex::new(
        r"\b(\d{5})\b"
    ).unwrap();

    // Locality tail: "12050 MAGLIANO ALFIERI CN" or "12050 - MAGLIANO ALFIERI (CN)".
    // The province is either whitespace-separated or parenthesized, so a
    // trailing city syllable can never be mistaken for it.
    pub static ref LOCALITY: Regex = Regex::new(
        r"(\d{5})\s*-?\s*([A-ZÀ-Ù'\. ]+?)(?:\s+([A-Z]{2})|\s*\(([A-Z]{2})\))\s*$"
    ).unwrap();

    // Dates in DD/MM/YY or DD/MM/YYYY form.
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\b"
    ).unwrap();

    // Date embedded in a filename: "DDV_4681_21-05-25.pdf". `\b` would
    // treat the underscore as a word character, so digit runs are fenced
    // explicitly.
    pub static ref FILENAME_DATE: Regex = Regex::new(
        r"(?:^|[^0-9])(\d{1,2})[-_.](\d{1,2})[-_.](\d{2,4})(?:[^0-9]|$)"
    ).unwrap();

    pub static ref FILENAME_NUMBER: Regex = Regex::new(
        r"(?:^|[^0-9])(\d{4,6})(?:[^0-9]|$)"
    ).unwrap();

    // Monetary value with a two-decimal fraction, Italian style.
    pub static ref MONETARY: Regex = Regex::new(
        r"\b\d{1,3}(?:\.\d{3})+,\d{2}\b|\b\d+,\d{2}\b"
    ).unwrap();

    // Partita IVA (labelled and standalone).
    pub static ref VAT_NUMBER: Regex = Regex::new(
        r"(?i)(?:P\.?\s*IVA|PARTITA\s+IVA|COD\.?\s*FISC\.?\s*/?\s*P\.?\s*IVA)[\s.:]*(\d{11})"
    ).unwrap();

    pub static ref VAT_NUMBER_STANDALONE: Regex = Regex::new(
        r"\b(\d{11})\b"
    ).unwrap();

    // Codice fiscale for natural persons.
    pub static ref TAX_CODE: Regex = Regex::new(
        r"\b([A-Z]{6}\d{2}[A-Z]\d{2}[A-Z]\d{3}[A-Z])\b"
    ).unwrap();

    // Recipient/attention markers preceding the client name.
    pub static ref RECIPIENT_MARKER: Regex = Regex::new(
        r"(?i)(?:spett\.?(?:le)?|destinatario|alla\s+cortese\s+attenzione|att\.?ne)[\s.:]*"
    ).unwrap();

    // Carrier section: everything after it belongs to the transporter.
    pub static ref TRANSPORTER_MARKER: Regex = Regex::new(
        r"(?i)\bvettore\b|trasporto\s+a\s+mezzo"
    ).unwrap();

    // Legal-form suffix identifying a company name line.
    pub static ref COMPANY_SUFFIX: Regex = Regex::new(
        r"(?i)\b(S\.?\s?R\.?\s?L\.?|S\.?\s?P\.?\s?A\.?|S\.?\s?N\.?\s?C\.?|S\.?\s?A\.?\s?S\.?|S\.?\s?S\.?|&\s?C\.)"
    ).unwrap();

    // Order reference: "Rif. Ns. Ordine N. 507A865AS02756".
    pub static ref ORDER_REFERENCE: Regex = Regex::new(
        r"(?i)(?:rif\.?\s*(?:ns\.?|vs\.?)?\s*ordine|ordine\s+n(?:r|°)?\.?)[\s.:]*n?\.?\s*([A-Z0-9][A-Z0-9/\-]{2,})"
    ).unwrap();

    // Header vocabulary for document-kind inference.
    pub static ref CREDIT_NOTE_TERM: Regex = Regex::new(
        r"(?i)nota\s+(?:di\s+)?credito"
    ).unwrap();

    pub static ref INVOICE_TERM: Regex = Regex::new(
        r"(?i)\bfattura\b"
    ).unwrap();

    pub static ref TRANSPORT_TERM: Regex = Regex::new(
        r"(?i)documento\s+di\s+trasporto|d\.d\.t\.?"
    ).unwrap();

    // Payment-schedule region of the footer.
    pub static ref PAYMENT_SECTION: Regex = Regex::new(
        r"(?i)scadenz|pagamento"
    ).unwrap();

    // Labels that terminate the line-item table.
    pub static ref NON_ITEM_LABEL: Regex = Regex::new(
        r"(?i)^\s*(bancali|pallets?|merce\s+non\s+disponibile|totale|trasporto|aspetto\s+esteriore|firma)"
    ).unwrap();

    // Article code: at least six alphanumerics containing a digit.
    pub static ref ARTICLE_CODE: Regex = Regex::new(
        r"^[A-Z0-9]{6,}$"
    ).unwrap();
}

/// Units of measure appearing in the table region.
pub const UNITS: &[&str] = &["PZ", "KG", "LT", "CF", "CT", "BT", "SC", "GR"];

/// Whether a token is a recognized unit of measure.
pub fn is_unit_token(token: &str) -> bool {
    UNITS.iter().any(|u| token.eq_ignore_ascii_case(u))
}

/// Whether a token is an article code (>= 6 alphanumerics, at least one digit).
pub fn is_article_code(token: &str) -> bool {
    ARTICLE_CODE.is_match(token) && token.chars().any(|c| c.is_ascii_digit())
}

/// Transporter names that must never be accepted as client or address data.
pub const TRANSPORTER_KEYWORDS: &[&str] = &["SAFIM", "S.A.F.I.M", "SUPEJA", "GALLINO"];

/// Whether a line mentions a known transporter.
pub fn mentions_transporter(line: &str) -> bool {
    let upper = line.to_uppercase();
    TRANSPORTER_KEYWORDS.iter().any(|k| upper.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_line() {
        let caps = RECORD_LINE.captures("4681 21/05/25 1 5712").unwrap();
        assert_eq!(&caps[1], "4681");
        assert_eq!(&caps[2], "21/05/25");
        assert_eq!(&caps[4], "5712");

        assert!(RECORD_LINE.captures("4681 21/05/25 1").is_none());
    }

    #[test]
    fn test_record_line_with_name() {
        let caps = RECORD_LINE_WITH_NAME
            .captures("5023 3/06/25 1 20322 DONAC S.R.L.")
            .unwrap();
        assert_eq!(&caps[1], "5023");
        assert_eq!(&caps[5], "DONAC S.R.L.");
    }

    #[test]
    fn test_anchors() {
        assert!(TABLE_HEADER.is_match("Codice Descrizione UM Quantità Prezzo Importo IVA"));
        assert!(TOTALS_LABEL.is_match("TOTALE DOCUMENTO €"));
        assert!(DELIVERY_MARKER.is_match("Luogo di consegna"));
    }

    #[test]
    fn test_street_marker() {
        assert!(STREET_MARKER.is_match("VIA MEANA, SNC"));
        assert!(STREET_MARKER.is_match("C.SO SUSA, 305/307"));
        assert!(STREET_MARKER.is_match("LOC. TETTI CAGLIERO, 5"));
        assert!(STREET_MARKER.is_match("FRAZ. SAN ROCCO 12"));
        assert!(STREET_MARKER.is_match("LOCALITA' SERRA"));
        assert!(!STREET_MARKER.is_match("MAGLIANO ALFIERI"));
        assert!(!STREET_MARKER.is_match("SBLOCCO MERCI"));
    }

    #[test]
    fn test_unit_and_code_tokens() {
        assert!(is_unit_token("PZ"));
        assert!(is_unit_token("kg"));
        assert!(!is_unit_token("MT"));
        assert!(is_article_code("DL000301"));
        assert!(is_article_code("060041"));
        // pure alpha words are not codes
        assert!(!is_article_code("TRASPORTO"));
        assert!(!is_article_code("DL1"));
    }

    #[test]
    fn test_order_reference() {
        let caps = ORDER_REFERENCE
            .captures("Rif. Ns. Ordine N. 507A865AS02756 del 19/05/25")
            .unwrap();
        assert_eq!(&caps[1], "507A865AS02756");
    }

    #[test]
    fn test_monetary() {
        let found: Vec<&str> = MONETARY
            .find_iter("1.234,56 e 201,62 ma non 12,3 ne 1234.56")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["1.234,56", "201,62"]);
    }
}
