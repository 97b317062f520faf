//! Line-item parsing over the table region.
//!
//! Each row is tokenized on whitespace: leading article code, free-text
//! description up to the first unit-of-measure token, then a numeric tail
//! whose shape varies with discounts and the free-goods marker.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::document::LineItem;
use crate::rules::amounts::parse_decimal;
use crate::rules::patterns::{
    is_article_code, is_unit_token, MONETARY, NON_ITEM_LABEL, TOTALS_LABEL,
};
use crate::rules::vat::trailing_rate_token;

/// Free-goods (omaggio) marker printed between quantity and price.
const FREE_GOODS_MARKER: &str = "*";

/// Parse the items span into ordered line items.
///
/// Parsing stops at the first totals or non-item label. Rows without a
/// recognized unit token are not items and are skipped without error.
pub fn parse_items(span: &[String], warnings: &mut Vec<String>) -> Vec<LineItem> {
    let mut items = Vec::new();

    for line in span {
        if TOTALS_LABEL.is_match(line) || NON_ITEM_LABEL.is_match(line) {
            debug!(line = %line.trim(), "table terminated");
            break;
        }
        match parse_row(line) {
            RowOutcome::Item(item) => items.push(item),
            RowOutcome::Skip => {}
            RowOutcome::Malformed(code) => {
                warnings.push(format!("item row {} has an unreadable numeric tail", code));
            }
        }
    }

    items
}

enum RowOutcome {
    Item(LineItem),
    Skip,
    Malformed(String),
}

fn parse_row(line: &str) -> RowOutcome {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let Some((&code, rest)) = tokens.split_first() else {
        return RowOutcome::Skip;
    };
    let code = code.to_uppercase();
    if !is_article_code(&code) {
        return RowOutcome::Skip;
    }

    let Some(unit_idx) = rest.iter().position(|t| is_unit_token(t)) else {
        return RowOutcome::Skip;
    };
    let description = rest[..unit_idx].join(" ");
    let unit = rest[unit_idx].to_uppercase();
    let tail = &rest[unit_idx + 1..];

    let Some((rate_idx, vat_rate)) = trailing_rate_token(tail) else {
        return RowOutcome::Malformed(code);
    };
    let tail = &tail[..rate_idx];

    let Some(quantity) = tail.first().and_then(|t| parse_decimal(t)) else {
        return RowOutcome::Malformed(code);
    };
    let tail = &tail[1..];

    let is_free_goods = tail.first() == Some(&FREE_GOODS_MARKER);
    let tail = if is_free_goods { &tail[1..] } else { tail };

    // The last two-decimal monetary token before the VAT rate is the
    // line total; what precedes it is unit price and optional discount.
    let total_idx = tail
        .iter()
        .rposition(|t| MONETARY.is_match(t));

    let (line_total, mid) = match total_idx {
        Some(i) => match parse_decimal(tail[i]) {
            Some(total) => (total, &tail[..i]),
            None => return RowOutcome::Malformed(code),
        },
        None => (Decimal::ZERO, tail),
    };

    let mut numerics = mid.iter().filter_map(|t| parse_decimal(t));
    let explicit_price = numerics.next();
    let discount_pct = numerics
        .next()
        .filter(|d| *d >= Decimal::ZERO && *d <= Decimal::from(100))
        .unwrap_or(Decimal::ZERO);

    let unit_price = match explicit_price {
        Some(price) => price,
        None if !quantity.is_zero() => (line_total / quantity).round_dp(4),
        None => Decimal::ZERO,
    };

    let item = if is_free_goods {
        LineItem {
            code,
            description,
            unit,
            quantity,
            unit_price,
            discount_pct: Decimal::from(100),
            is_free_goods: true,
            vat_rate,
            line_total: Decimal::ZERO,
        }
    } else {
        LineItem {
            code,
            description,
            unit,
            quantity,
            unit_price,
            discount_pct,
            is_free_goods: false,
            vat_rate,
            line_total,
        }
    };

    RowOutcome::Item(item)
}
