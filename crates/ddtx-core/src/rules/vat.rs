//! VAT rate helpers for totals computation.

use rust_decimal::Decimal;

use crate::models::document::VatRate;

/// Tax due on a taxable amount at the given rate, rounded to cents.
pub fn line_tax(taxable: Decimal, rate: VatRate) -> Decimal {
    (taxable * rate.percent() / Decimal::from(100)).round_dp(2)
}

/// Find the trailing VAT-rate token of a tokenized item line: the last
/// token that parses against the rate whitelist.
pub fn trailing_rate_token(tokens: &[&str]) -> Option<(usize, VatRate)> {
    tokens
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, t)| VatRate::from_token(t).map(|r| (i, r)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn test_line_tax_rounding() {
        let taxable = Decimal::from_str("184.83").unwrap();
        assert_eq!(
            line_tax(taxable, VatRate::Reduced10),
            Decimal::from_str("18.48").unwrap()
        );
        assert_eq!(line_tax(taxable, VatRate::Zero), Decimal::ZERO);
    }

    #[test]
    fn test_trailing_rate_token() {
        let tokens = vec!["80", "*", "2,3000", "184,00", "10", "10"];
        let refs: Vec<&str> = tokens.iter().copied().collect();
        let (idx, rate) = trailing_rate_token(&refs).unwrap();
        assert_eq!(idx, 5);
        assert_eq!(rate, VatRate::Reduced10);
    }

    #[test]
    fn test_no_rate_token() {
        let tokens = vec!["FRESCHI", "MISTI"];
        assert!(trailing_rate_token(&tokens).is_none());
    }
}
