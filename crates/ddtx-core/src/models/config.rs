//! Configuration structures for the extraction pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};

use super::document::{Address, IssuerIdentity};

/// Main configuration for the ddtx pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DdtxConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Issuer identity used to reject false client/address matches.
    pub issuer: IssuerIdentity,

    /// Caller-supplied directory of clients with a single fixed location,
    /// used as a last-resort delivery-address fallback. Keys are matched
    /// as case-insensitive substrings of the client name.
    pub clients: ClientDirectory,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Enable partita IVA checksum validation.
    pub validate_vat_numbers: bool,

    /// Maximum age in years a document date may have before it is
    /// rejected as implausible.
    pub max_date_age_years: i32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            validate_vat_numbers: true,
            max_date_age_years: 5,
        }
    }
}

/// Known fixed location for a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedLocation {
    pub street_line: String,
    pub postal_code: String,
    pub city: String,
    pub province: String,
}

impl FixedLocation {
    /// Convert to a validated address, `None` if the entry is malformed.
    pub fn to_address(&self) -> Option<Address> {
        Address::new(
            self.street_line.clone(),
            self.postal_code.clone(),
            self.city.clone(),
            self.province.clone(),
        )
    }
}

/// Directory of per-client fixed locations.
///
/// A BTreeMap keeps lookups deterministic regardless of insertion order.
pub type ClientDirectory = BTreeMap<String, FixedLocation>;

impl DdtxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ParseError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ParseError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ParseError::Config(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| ParseError::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrip() {
        let config = DdtxConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: DdtxConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.extraction.max_date_age_years, 5);
        assert!(back.extraction.validate_vat_numbers);
        assert_eq!(back.issuer.vat_number, "03247720042");
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = DdtxConfig::default();
        config.save(&path).unwrap();
        let back = DdtxConfig::from_file(&path).unwrap();
        assert_eq!(back.issuer.vat_number, config.issuer.vat_number);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            DdtxConfig::from_file(&path),
            Err(ParseError::Config(_))
        ));
        assert!(matches!(
            DdtxConfig::from_file(&dir.path().join("missing.json")),
            Err(ParseError::Config(_))
        ));
    }

    #[test]
    fn test_fixed_location_validation() {
        let good = FixedLocation {
            street_line: "VIA SALUZZO, 65".to_string(),
            postal_code: "12038".to_string(),
            city: "SAVIGLIANO".to_string(),
            province: "CN".to_string(),
        };
        assert!(good.to_address().is_some());

        let bad = FixedLocation {
            postal_code: "123".to_string(),
            ..good
        };
        assert!(bad.to_address().is_none());
    }
}
