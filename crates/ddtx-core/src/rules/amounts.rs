//! Locale-aware numeric parsing for document amounts.
//!
//! Printed documents mix grouping periods and decimal commas freely, so
//! parsing follows one rule everywhere: when both separators occur, the
//! one appearing last is the decimal point; a lone comma is decimal; a
//! lone period is a grouping separator when more than two digits follow
//! its last occurrence.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::MONETARY;
use super::{ExtractionMatch, FieldExtractor};

/// Extractor for two-decimal monetary values.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        MONETARY
            .find_iter(text)
            .filter_map(|m| {
                parse_decimal(m.as_str()).map(|value| {
                    ExtractionMatch::new(value, 0.8, m.as_str())
                        .with_position(m.start(), m.end())
                })
            })
            .collect()
    }
}

/// Parse a numeric token using the document separator rule.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let comma = cleaned.rfind(',');
    let period = cleaned.rfind('.');

    let normalized = match (comma, period) {
        (Some(c), Some(p)) if c > p => {
            // comma is decimal, periods group
            cleaned.replace('.', "").replace(',', ".")
        }
        (Some(_), Some(_)) => {
            // period is decimal, commas group
            cleaned.replace(',', "")
        }
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(p)) => {
            let trailing = cleaned.len() - p - 1;
            if trailing > 2 {
                cleaned.replace('.', "")
            } else {
                cleaned
            }
        }
        (None, None) => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

/// Format an amount in Italian style (1.234,56).
pub fn format_italian_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount);
    let (int_part, dec_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let negative = int_part.starts_with('-');
    let digits: Vec<char> = int_part.trim_start_matches('-').chars().collect();

    let mut formatted = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}{},{}", sign, formatted, dec_part)
}
