//! Extraction pipeline: segmentation, classification, party resolution,
//! line items, totals, normalization.
//!
//! Every stage is a pure function over text spans; uncertainty is
//! carried in the warnings sequence, never thrown. The only fatal errors
//! are caller-contract violations on the input itself.

pub mod classifier;
pub mod items;
pub mod normalizer;
pub mod parties;
pub mod segmenter;
pub mod totals;

use chrono::NaiveDate;
use tracing::info;

use crate::error::{ParseError, Result};
use crate::models::config::DdtxConfig;
use crate::models::document::{DocumentKind, ParsedDocument, RawDocument};

pub use segmenter::DocumentLayout;

/// Document parser, the single entry point of the crate.
///
/// Holds only read-only configuration, so one instance can serve many
/// documents, concurrently if desired.
#[derive(Debug, Clone, Default)]
pub struct DocumentParser {
    config: DdtxConfig,
    reference_date: Option<NaiveDate>,
}

impl DocumentParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: DdtxConfig) -> Self {
        self.config = config;
        self
    }

    /// Inject the clock used for date-plausibility checks. Defaults to
    /// the local calendar date at call time.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Parse one document. Deterministic for a fixed reference date:
    /// the same input always yields the same output.
    pub fn parse(&self, raw: &RawDocument) -> Result<ParsedDocument> {
        if raw.text.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }
        if raw.text.contains('\u{0}') {
            return Err(ParseError::NotText("input contains NUL bytes".to_string()));
        }

        let reference = self
            .reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let max_age = self.config.extraction.max_date_age_years;

        let mut warnings = Vec::new();
        let layout = segmenter::segment(&raw.text);

        let classification = classifier::classify(
            &layout.header,
            &raw.filename_hint,
            reference,
            max_age,
            &mut warnings,
        );
        let kind = classification.kind.unwrap_or(DocumentKind::Invoice);

        if layout.unparseable {
            warnings.push("unparseable layout: no structural anchors found".to_string());
            let mut doc = ParsedDocument::empty(kind);
            doc.document_number = classification.document_number;
            doc.document_date = classification.document_date;
            doc.customer_code = classification.customer_code;
            doc.warnings = warnings;
            return Ok(doc);
        }

        let resolution = parties::resolve(
            &layout.header,
            layout.party.as_deref(),
            &raw.text,
            &self.config,
            &mut warnings,
        );

        let items = match &layout.items {
            Some(span) => items::parse_items(span, &mut warnings),
            None => {
                warnings.push("unparseable layout: no item table found".to_string());
                Vec::new()
            }
        };

        let totals = totals::reconcile(&items, layout.footer.as_deref(), &raw.text, &mut warnings);

        let doc = normalizer::assemble(kind, classification, resolution, items, totals, warnings);

        info!(
            kind = ?doc.kind,
            number = doc.document_number.as_deref().unwrap_or("-"),
            items = doc.items.len(),
            warnings = doc.warnings.len(),
            "document parsed"
        );
        Ok(doc)
    }
}

/// Parse a document with default configuration.
///
/// Convenience wrapper over [`DocumentParser`] for callers without a
/// client directory or a pinned reference date.
pub fn parse_document(text: &str, filename_hint: &str) -> Result<ParsedDocument> {
    DocumentParser::new().parse(&RawDocument::new(text, filename_hint))
}
