//! Partita IVA (Italian VAT number) extraction and validation, plus
//! codice fiscale matching.

use super::patterns::{TAX_CODE, VAT_NUMBER, VAT_NUMBER_STANDALONE};
use super::{ExtractionMatch, FieldExtractor};

/// Partita IVA extractor.
///
/// The issuer's own VAT number is always excluded: on these documents it
/// is printed near the client's, and mistaking one for the other was the
/// most common mis-extraction in production.
pub struct PartitaIvaExtractor {
    validate: bool,
    exclude: Option<String>,
}

impl PartitaIvaExtractor {
    pub fn new() -> Self {
        Self {
            validate: true,
            exclude: None,
        }
    }

    /// Set whether to validate checksums.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Exclude a specific VAT number (the issuer's) from all results.
    pub fn excluding(mut self, vat_number: impl Into<String>) -> Self {
        self.exclude = Some(vat_number.into());
        self
    }

    fn accept(&self, candidate: &str) -> bool {
        if self
            .exclude
            .as_deref()
            .is_some_and(|e| e == candidate)
        {
            return false;
        }
        !self.validate || validate_partita_iva(candidate)
    }
}

impl Default for PartitaIvaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PartitaIvaExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        // Labelled occurrences first (higher confidence)
        for caps in VAT_NUMBER.captures_iter(text) {
            let vat = caps[1].to_string();
            if self.accept(&vat) {
                let full_match = caps.get(0).unwrap();
                results.push(
                    ExtractionMatch::new(vat, 0.95, full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                );
            }
        }

        // Standalone 11-digit runs (lower confidence)
        for caps in VAT_NUMBER_STANDALONE.captures_iter(text) {
            let vat = caps[1].to_string();
            if results.iter().any(|r| r.value == vat) {
                continue;
            }
            if self.accept(&vat) {
                let full_match = caps.get(0).unwrap();
                results.push(
                    ExtractionMatch::new(vat, 0.7, full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                );
            }
        }

        results
    }
}

/// Validate an Italian partita IVA using the Luhn-variant checksum.
///
/// 11 digits; odd positions (1st, 3rd, ...) weigh 1, even positions
/// weigh 2 with 9 subtracted from two-digit products; the total must be
/// divisible by 10.
pub fn validate_partita_iva(vat: &str) -> bool {
    let digits: Vec<u32> = vat
        .chars()
        .filter(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 11 {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 0 {
                d
            } else {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            }
        })
        .sum();

    sum % 10 == 0
}

/// Extract the first codice fiscale for a natural person, if any.
pub fn extract_tax_code(text: &str) -> Option<String> {
    TAX_CODE
        .captures(text)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_partita_iva() {
        // issuer's real VAT number
        assert!(validate_partita_iva("03247720042"));
        assert!(!validate_partita_iva("03247720041"));
        assert!(!validate_partita_iva("0324772004"));
        assert!(!validate_partita_iva("032477200421"));
    }

    #[test]
    fn test_extract_labelled() {
        let text = "DONAC S.R.L.\nP.IVA 03247720042";
        let extractor = PartitaIvaExtractor::new();
        let result = extractor.extract(text).unwrap();
        assert_eq!(result.value, "03247720042");
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn test_issuer_exclusion() {
        let text = "P.IVA 03247720042 e P.IVA 00622580041";
        let extractor = PartitaIvaExtractor::new().excluding("03247720042");
        let results = extractor.extract_all(text);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value, "00622580041");
    }

    #[test]
    fn test_standalone_lower_confidence() {
        let extractor = PartitaIvaExtractor::new();
        let result = extractor.extract("cliente 00622580041 Torino").unwrap();
        assert_eq!(result.value, "00622580041");
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_tax_code() {
        assert_eq!(
            extract_tax_code("C.F. RSSMRA80A01L219K"),
            Some("RSSMRA80A01L219K".to_string())
        );
        assert_eq!(extract_tax_code("nessun codice"), None);
    }
}
