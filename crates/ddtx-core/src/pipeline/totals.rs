//! Totals reconciliation across line items and footer stamps.
//!
//! Line items give a provisional total; the footer's "TOTALE DOCUMENTO"
//! stamp or the payment schedule can contradict it. The explicit value
//! wins, and the VAT share absorbs the difference: rate misreads are far
//! more common than quantity or price misreads.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::document::{LineItem, TotalsBreakdown, VatGroup, VatRate, MONEY_TOLERANCE};
use crate::rules::amounts::AmountExtractor;
use crate::rules::patterns::{PAYMENT_SECTION, TOTALS_LABEL};
use crate::rules::vat::line_tax;
use crate::rules::FieldExtractor;

/// Build the totals breakdown and reconcile it against the footer.
pub fn reconcile(
    items: &[LineItem],
    footer: Option<&[String]>,
    full_text: &str,
    warnings: &mut Vec<String>,
) -> TotalsBreakdown {
    let mut breakdown = from_items(items);
    let provisional = breakdown.grand_total;

    let footer_lines: Vec<String> = match footer {
        Some(span) => span.to_vec(),
        None => full_text.lines().map(|l| l.to_string()).collect(),
    };

    let explicit = labelled_total(&footer_lines)
        .or_else(|| repeated_installment(&footer_lines));

    match explicit {
        Some(total) => {
            if (total - provisional).abs() > MONEY_TOLERANCE {
                debug!(%provisional, %total, "document total overrides line items");
                warnings.push(format!(
                    "line items sum to {} but the document states {}, VAT recomputed",
                    provisional, total
                ));
                breakdown.grand_total = total;
                breakdown.vat_total = (total - breakdown.subtotal).round_dp(2);
            }
        }
        None => {
            warnings.push("document total not found, line-item total unverified".to_string());
        }
    }

    breakdown
}

/// Group line items by VAT rate and derive the provisional aggregates.
/// Free-goods lines contribute a zero taxable amount by construction.
fn from_items(items: &[LineItem]) -> TotalsBreakdown {
    let mut by_rate: BTreeMap<VatRate, Decimal> = BTreeMap::new();
    for item in items {
        *by_rate.entry(item.vat_rate).or_default() += item.line_total;
    }

    let by_vat_rate: Vec<VatGroup> = by_rate
        .into_iter()
        .map(|(rate, taxable)| VatGroup {
            rate,
            taxable_amount: taxable.round_dp(2),
            tax_amount: line_tax(taxable, rate),
        })
        .collect();

    let subtotal: Decimal = by_vat_rate.iter().map(|g| g.taxable_amount).sum();
    let vat_total: Decimal = by_vat_rate.iter().map(|g| g.tax_amount).sum();

    TotalsBreakdown {
        by_vat_rate,
        subtotal,
        vat_total,
        grand_total: subtotal + vat_total,
    }
}

/// Highest-confidence source: the amount next to the totals label.
/// The grand total is the rightmost amount on the stamp line.
fn labelled_total(lines: &[String]) -> Option<Decimal> {
    let extractor = AmountExtractor::new();
    lines
        .iter()
        .find(|l| TOTALS_LABEL.is_match(l))
        .and_then(|l| extractor.extract_all(l).pop())
        .map(|m| m.value)
}

/// Payment-schedule fallback: a single installment equal to the full
/// total is printed twice in succession on the same line.
fn repeated_installment(lines: &[String]) -> Option<Decimal> {
    let extractor = AmountExtractor::new();
    let mut in_schedule = false;

    for line in lines {
        if PAYMENT_SECTION.is_match(line) {
            in_schedule = true;
        }
        if !in_schedule {
            continue;
        }
        let amounts = extractor.extract_all(line);
        for pair in amounts.windows(2) {
            if pair[0].value == pair[1].value {
                return Some(pair[0].value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(total: &str, rate: VatRate) -> LineItem {
        LineItem {
            code: "060111".to_string(),
            description: "GRISSINI".to_string(),
            unit: "PZ".to_string(),
            quantity: Decimal::ONE,
            unit_price: dec(total),
            discount_pct: Decimal::ZERO,
            is_free_goods: false,
            vat_rate: rate,
            line_total: dec(total),
        }
    }

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_grouping_by_rate() {
        let items = vec![
            item("100.00", VatRate::Reduced10),
            item("84.83", VatRate::Reduced10),
            item("50.00", VatRate::Super4),
        ];
        let b = from_items(&items);

        assert_eq!(b.by_vat_rate.len(), 2);
        assert_eq!(b.by_vat_rate[0].rate, VatRate::Super4);
        assert_eq!(b.by_vat_rate[0].tax_amount, dec("2.00"));
        assert_eq!(b.by_vat_rate[1].taxable_amount, dec("184.83"));
        assert_eq!(b.by_vat_rate[1].tax_amount, dec("18.48"));
        assert_eq!(b.subtotal, dec("234.83"));
        assert_eq!(b.grand_total, dec("255.31"));
    }

    #[test]
    fn test_labelled_total_agrees() {
        let items = vec![item("100.00", VatRate::Reduced10)];
        let footer = lines(&["TOTALE DOCUMENTO 110,00"]);
        let mut warnings = Vec::new();
        let b = reconcile(&items, Some(&footer), "", &mut warnings);

        assert_eq!(b.grand_total, dec("110.00"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_labelled_total_wins_over_items() {
        let items = vec![item("100.00", VatRate::Reduced10)];
        let footer = lines(&["TOTALE DOCUMENTO 108,50"]);
        let mut warnings = Vec::new();
        let b = reconcile(&items, Some(&footer), "", &mut warnings);

        assert_eq!(b.grand_total, dec("108.50"));
        assert_eq!(b.vat_total, dec("8.50"));
        assert_eq!(b.subtotal, dec("100.00"));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_repeated_installment_total() {
        // provisional: 206.75 + 20.68 = 227.43
        let items = vec![item("206.75", VatRate::Reduced10)];
        let footer = lines(&[
            "Pagamento: RI.BA. 30 GG",
            "Scadenze 30/06/25 201,62 201,62",
        ]);
        let mut warnings = Vec::new();
        let b = reconcile(&items, Some(&footer), "", &mut warnings);

        assert_eq!(b.grand_total, dec("201.62"));
        assert_eq!(b.vat_total, dec("-5.13"));
        assert!(warnings.iter().any(|w| w.contains("201.62")));
    }

    #[test]
    fn test_distinct_amounts_not_installment() {
        let footer = lines(&["Scadenze 100,00 101,00"]);
        assert_eq!(repeated_installment(&footer), None);
    }

    #[test]
    fn test_no_total_anywhere_warns() {
        let items = vec![item("100.00", VatRate::Reduced10)];
        let mut warnings = Vec::new();
        let b = reconcile(&items, None, "nessun totale qui", &mut warnings);

        assert_eq!(b.grand_total, dec("110.00"));
        assert!(warnings.iter().any(|w| w.contains("unverified")));
    }
}
