//! Data models for parsed documents and pipeline configuration.

pub mod config;
pub mod document;

pub use config::{ClientDirectory, DdtxConfig, ExtractionConfig, FixedLocation};
pub use document::{
    Address, DocumentKind, IssuerIdentity, LineItem, ParsedDocument, Party, RawDocument,
    TotalsBreakdown, VatGroup, VatRate, MONEY_TOLERANCE,
};
