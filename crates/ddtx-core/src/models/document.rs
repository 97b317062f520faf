//! Data model for parsed transport documents, invoices and credit notes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rounding tolerance for monetary cross-checks (one cent).
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Raw input handed to the pipeline by the caller.
///
/// Created once, consumed once, never mutated.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Text extracted upstream from the paginated document.
    pub text: String,
    /// Original file name, used only as a low-confidence fallback.
    pub filename_hint: String,
}

impl RawDocument {
    pub fn new(text: impl Into<String>, filename_hint: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filename_hint: filename_hint.into(),
        }
    }
}

/// Kind of commercial document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Transport document accompanying shipped goods (DDT).
    DeliveryNote,
    /// Tax invoice (FT).
    Invoice,
    /// Credit note reversing a prior invoice (NC).
    CreditNote,
}

impl Default for DocumentKind {
    fn default() -> Self {
        Self::Invoice
    }
}

impl DocumentKind {
    /// Whether this kind requires a delivery address on output.
    pub fn requires_delivery_address(&self) -> bool {
        matches!(self, Self::DeliveryNote)
    }

    /// Whether this kind requires the client's VAT number.
    pub fn requires_vat_number(&self) -> bool {
        matches!(self, Self::Invoice | Self::CreditNote)
    }
}

/// A party on the document (the extracted client, or the known issuer).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    /// Full legal name.
    pub name: String,

    /// Italian VAT number (partita IVA, 11 digits).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_number: Option<String>,

    /// Italian fiscal code (codice fiscale).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_code: Option<String>,

    /// Registered address, when it passed validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// A validated postal address.
///
/// Instances can only be built through [`Address::new`], which enforces
/// the hard format invariants: 5-digit postal code, 2-letter province,
/// non-empty street line. A candidate that fails any of them is discarded
/// by the resolvers rather than stored half-broken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street line, e.g. `VIA MEANA, SNC`.
    pub street_line: String,
    /// CAP, exactly five digits.
    pub postal_code: String,
    /// City name.
    pub city: String,
    /// Province code, exactly two letters.
    pub province: String,
}

impl Address {
    /// Build an address, returning `None` if any invariant is unmet.
    pub fn new(
        street_line: impl Into<String>,
        postal_code: impl Into<String>,
        city: impl Into<String>,
        province: impl Into<String>,
    ) -> Option<Self> {
        let street_line = collapse_whitespace(&street_line.into());
        let postal_code = postal_code.into().trim().to_string();
        let city = collapse_whitespace(&city.into());
        let province = province.into().trim().to_uppercase();

        if street_line.is_empty() {
            return None;
        }
        if postal_code.len() != 5 || !postal_code.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if province.len() != 2 || !province.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        Some(Self {
            street_line,
            postal_code,
            city,
            province,
        })
    }

    /// Format as a single display line.
    pub fn format(&self) -> String {
        format!(
            "{} {} {} {}",
            self.street_line, self.postal_code, self.city, self.province
        )
    }

    /// Whether two addresses point at the same locality (CAP + city).
    pub fn same_locality(&self, other: &Address) -> bool {
        self.postal_code == other.postal_code
            && self.city.eq_ignore_ascii_case(&other.city)
    }
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Italian VAT rates in force.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum VatRate {
    /// Zero rate.
    #[serde(rename = "0")]
    Zero,
    /// Super-reduced rate: 4% (staple foods).
    #[serde(rename = "4")]
    Super4,
    /// Reduced rate: 5%.
    #[serde(rename = "5")]
    Reduced5,
    /// Reduced rate: 10% (most food products).
    #[serde(rename = "10")]
    Reduced10,
    /// Standard rate: 22%.
    #[serde(rename = "22")]
    Standard22,
}

impl VatRate {
    /// Parse a rate token against the whitelist, e.g. `"10"`, `"04"`, `"22%"`.
    pub fn from_token(s: &str) -> Option<Self> {
        let s = s.trim().trim_end_matches('%');
        let value: u8 = s.parse().ok()?;
        match value {
            0 => Some(Self::Zero),
            4 => Some(Self::Super4),
            5 => Some(Self::Reduced5),
            10 => Some(Self::Reduced10),
            22 => Some(Self::Standard22),
            _ => None,
        }
    }

    /// The rate as a percentage value (e.g. `10` for 10%).
    pub fn percent(&self) -> Decimal {
        match self {
            Self::Zero => Decimal::ZERO,
            Self::Super4 => Decimal::from(4),
            Self::Reduced5 => Decimal::from(5),
            Self::Reduced10 => Decimal::from(10),
            Self::Standard22 => Decimal::from(22),
        }
    }

    /// Display form, e.g. `10%`.
    pub fn display(&self) -> String {
        format!("{}%", self.percent())
    }
}

/// A single line item from the table region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Article code, e.g. `DL000301`.
    pub code: String,

    /// Article description.
    pub description: String,

    /// Unit of measure (PZ, KG, LT, ...).
    pub unit: String,

    /// Quantity shipped/billed.
    pub quantity: Decimal,

    /// Unit price. For free-goods lines this is the informational
    /// reference price printed next to the marker.
    pub unit_price: Decimal,

    /// Discount percentage, zero when none. Forced to 100 for free goods.
    pub discount_pct: Decimal,

    /// Free-goods (omaggio) line, marked by an asterisk in the source.
    pub is_free_goods: bool,

    /// VAT rate applied to the line.
    pub vat_rate: VatRate,

    /// Line total. Forced to zero for free goods.
    pub line_total: Decimal,
}

impl LineItem {
    /// Check the internal line invariant within the rounding tolerance.
    pub fn is_consistent(&self) -> bool {
        if self.is_free_goods {
            return self.line_total.is_zero() && self.discount_pct == Decimal::from(100);
        }
        let expected = self.quantity
            * self.unit_price
            * (Decimal::ONE - self.discount_pct / Decimal::from(100));
        (expected - self.line_total).abs() <= MONEY_TOLERANCE
    }
}

/// Taxable/tax pairing for one VAT rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatGroup {
    /// VAT rate of this group.
    pub rate: VatRate,
    /// Sum of line totals at this rate.
    pub taxable_amount: Decimal,
    /// Tax computed on the taxable amount.
    pub tax_amount: Decimal,
}

/// Document totals, by rate and aggregated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalsBreakdown {
    /// Per-rate groups, ordered by rate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_vat_rate: Vec<VatGroup>,

    /// Sum of taxable amounts.
    pub subtotal: Decimal,

    /// Sum of tax amounts (possibly recomputed against an explicit total).
    pub vat_total: Decimal,

    /// Document grand total.
    pub grand_total: Decimal,
}

/// Final, validated output of the pipeline.
///
/// Ownership passes entirely to the caller; the pipeline never holds on
/// to it and never mutates it after return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Document kind.
    pub kind: DocumentKind,

    /// Document number, absent when the header could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,

    /// Document date, serialized as `DD/MM/YYYY`.
    #[serde(
        default,
        with = "italian_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub document_date: Option<NaiveDate>,

    /// Customer code printed on the header record line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_code: Option<String>,

    /// Order reference, when the document cites one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_reference: Option<String>,

    /// Billing client.
    pub client: Party,

    /// Resolved delivery address. Never fabricated: absent when no
    /// strategy produced a valid candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<Address>,

    /// Line items in document order.
    pub items: Vec<LineItem>,

    /// Reconciled totals.
    pub totals: TotalsBreakdown,

    /// Ordered warnings accumulated across the pipeline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ParsedDocument {
    /// Empty record for a given kind, used for unparseable layouts.
    pub fn empty(kind: DocumentKind) -> Self {
        Self {
            kind,
            document_number: None,
            document_date: None,
            customer_code: None,
            order_reference: None,
            client: Party::default(),
            delivery_address: None,
            items: Vec::new(),
            totals: TotalsBreakdown::default(),
            warnings: Vec::new(),
        }
    }

    /// Re-run the structural checks and return any issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.document_number.is_none() {
            issues.push("missing document number".to_string());
        }
        if self.client.name.is_empty() {
            issues.push("missing client name".to_string());
        }
        if self.kind.requires_vat_number() && self.client.vat_number.is_none() {
            issues.push("missing client VAT number".to_string());
        }
        if self.kind.requires_delivery_address() && self.delivery_address.is_none() {
            issues.push("missing delivery address".to_string());
        }

        for item in &self.items {
            if !item.is_consistent() {
                issues.push(format!(
                    "line {} total {} inconsistent with quantity/price",
                    item.code, item.line_total
                ));
            }
        }

        let group_subtotal: Decimal = self
            .totals
            .by_vat_rate
            .iter()
            .map(|g| g.taxable_amount)
            .sum();
        if (group_subtotal - self.totals.subtotal).abs() > MONEY_TOLERANCE {
            issues.push(format!(
                "subtotal {} differs from VAT group sum {}",
                self.totals.subtotal, group_subtotal
            ));
        }

        let aggregate = self.totals.subtotal + self.totals.vat_total;
        if (aggregate - self.totals.grand_total).abs() > MONEY_TOLERANCE {
            issues.push(format!(
                "grand total {} differs from subtotal + VAT ({})",
                self.totals.grand_total, aggregate
            ));
        }

        issues
    }
}

/// Identity of the document issuer, used only to reject false matches:
/// the issuer's own name must never become the client, and its printed
/// return address must never become the delivery address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerIdentity {
    /// Legal name as printed on documents.
    pub name: String,
    /// Issuer VAT number.
    pub vat_number: String,
    /// Registered address.
    pub address: Address,
}

impl Default for IssuerIdentity {
    fn default() -> Self {
        Self {
            name: "ALFIERI SPECIALITA' ALIMENTARI S.P.A.".to_string(),
            vat_number: "03247720042".to_string(),
            address: Address::new(
                "C.SO G. MARCONI, 10/E",
                "12050",
                "MAGLIANO ALFIERI",
                "CN",
            )
            .expect("issuer address constant is valid"),
        }
    }
}

impl IssuerIdentity {
    /// Whether a candidate name is the issuer's own legal name: an exact
    /// match after normalization, or containment of the issuer's two
    /// leading significant name tokens (legal-form suffixes and other
    /// short tokens do not count).
    pub fn matches_name(&self, candidate: &str) -> bool {
        let candidate = normalize_name(candidate);
        let own = normalize_name(&self.name);
        if candidate == own {
            return true;
        }

        let mut tokens = own.split_whitespace().filter(|t| t.len() >= 4);
        match (tokens.next(), tokens.next()) {
            (Some(first), Some(second)) => {
                candidate.contains(first) && candidate.contains(second)
            }
            (Some(first), None) => candidate.contains(first),
            _ => false,
        }
    }
}

/// Uppercase and strip punctuation so `S.P.A.` and `SPECIALITA'` compare
/// as `SPA` and `SPECIALITA`.
fn normalize_name(s: &str) -> String {
    let cleaned: String = s
        .to_uppercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    collapse_whitespace(&cleaned)
}

/// `DD/MM/YYYY` serialization for optional dates.
mod italian_date {
    use chrono::NaiveDate;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%d/%m/%Y";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt {
            Some(s) => NaiveDate::parse_from_str(&s, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
