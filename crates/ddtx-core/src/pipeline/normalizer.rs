//! Final assembly: canonicalize fields, run structural validation, and
//! fold every residual issue into the warnings sequence.

use crate::models::document::{collapse_whitespace, DocumentKind, LineItem, ParsedDocument, TotalsBreakdown};
use crate::pipeline::classifier::Classification;
use crate::pipeline::parties::PartyResolution;

/// Assemble the final record from the stage outputs.
///
/// Recoverable issues never raise: structural validation findings are
/// appended to the warnings carried in from the earlier stages.
pub fn assemble(
    kind: DocumentKind,
    classification: Classification,
    resolution: PartyResolution,
    mut items: Vec<LineItem>,
    totals: TotalsBreakdown,
    mut warnings: Vec<String>,
) -> ParsedDocument {
    let mut client = resolution.client;
    client.name = collapse_whitespace(&client.name);

    for item in &mut items {
        item.description = collapse_whitespace(&item.description);
        item.line_total = item.line_total.round_dp(2);
        item.discount_pct = item.discount_pct.round_dp(2);
    }

    let mut doc = ParsedDocument {
        kind,
        document_number: classification.document_number,
        document_date: classification.document_date,
        customer_code: classification.customer_code,
        order_reference: classification.order_reference,
        client,
        delivery_address: resolution.delivery_address,
        items,
        totals,
        warnings: Vec::new(),
    };

    warnings.extend(doc.validate());
    doc.warnings = warnings;
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::Party;
    use rust_decimal::Decimal;

    #[test]
    fn test_validation_findings_become_warnings() {
        let resolution = PartyResolution {
            client: Party {
                name: "DONAC  S.R.L.".to_string(),
                ..Party::default()
            },
            delivery_address: None,
        };
        let doc = assemble(
            DocumentKind::Invoice,
            Classification::default(),
            resolution,
            Vec::new(),
            TotalsBreakdown::default(),
            vec!["delivery address not resolved".to_string()],
        );

        assert_eq!(doc.client.name, "DONAC S.R.L.");
        assert!(doc.warnings.iter().any(|w| w.contains("document number")));
        assert!(doc.warnings.iter().any(|w| w.contains("VAT number")));
        assert_eq!(doc.warnings[0], "delivery address not resolved");
    }

    #[test]
    fn test_monetary_rounding() {
        use crate::models::document::VatRate;
        use std::str::FromStr;

        let item = LineItem {
            code: "060111".to_string(),
            description: "GRISSINI".to_string(),
            unit: "PZ".to_string(),
            quantity: Decimal::from(3),
            unit_price: Decimal::from_str("1.333").unwrap(),
            discount_pct: Decimal::ZERO,
            is_free_goods: false,
            vat_rate: VatRate::Reduced10,
            line_total: Decimal::from_str("3.999").unwrap(),
        };
        let doc = assemble(
            DocumentKind::DeliveryNote,
            Classification::default(),
            PartyResolution::default(),
            vec![item],
            TotalsBreakdown::default(),
            Vec::new(),
        );
        assert_eq!(doc.items[0].line_total, Decimal::from_str("4.00").unwrap());
    }
}
