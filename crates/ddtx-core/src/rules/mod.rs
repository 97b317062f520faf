//! Rule-based field extractors shared by the pipeline stages.

pub mod address;
pub mod amounts;
pub mod dates;
pub mod partita_iva;
pub mod patterns;
pub mod vat;

pub use address::{parse_locality, split_double_locality, split_double_street};
pub use amounts::{format_italian_amount, parse_decimal, AmountExtractor};
pub use dates::{expand_year, DateExtractor};
pub use partita_iva::{extract_tax_code, validate_partita_iva, PartitaIvaExtractor};
pub use vat::line_tax;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// An extracted value with its confidence and provenance.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
