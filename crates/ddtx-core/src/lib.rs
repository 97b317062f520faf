//! Core library for Italian transport-document and invoice extraction.
//!
//! This crate provides:
//! - Layout segmentation of raw extracted text into header, party,
//!   items and footer regions
//! - Document classification (delivery note, invoice, credit note)
//! - Party and two-column delivery-address resolution
//! - Line-item parsing (free-goods markers, discounts, VAT rates)
//! - Totals reconciliation against footer stamps and payment schedules

pub mod error;
pub mod models;
pub mod pipeline;
pub mod rules;

pub use error::{ParseError, Result};
pub use models::config::{ClientDirectory, DdtxConfig, ExtractionConfig, FixedLocation};
pub use models::document::{
    Address, DocumentKind, IssuerIdentity, LineItem, ParsedDocument, Party, RawDocument,
    TotalsBreakdown, VatGroup, VatRate,
};
pub use pipeline::{parse_document, DocumentParser};
pub use rules::{ExtractionMatch, FieldExtractor};
