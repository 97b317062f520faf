//! Layout segmentation: split raw text into header, party, items and
//! footer regions using structural anchor lines.

use tracing::debug;

use crate::rules::patterns::{DELIVERY_MARKER, TABLE_HEADER, TOTALS_LABEL};

/// Segmented document regions. All spans are owned line vectors so the
/// later stages can be tested in isolation.
#[derive(Debug, Clone, Default)]
pub struct DocumentLayout {
    /// Everything before the items table (always present).
    pub header: Vec<String>,
    /// Party/address region, from the delivery marker to the table.
    pub party: Option<Vec<String>>,
    /// Table region, between the table-header anchor and the totals
    /// anchor. Empty when the anchor is absent; downstream stages must
    /// not fabricate line items.
    pub items: Option<Vec<String>>,
    /// Totals/footer region, from the totals anchor to the end.
    pub footer: Option<Vec<String>>,
    /// No anchors at all were found.
    pub unparseable: bool,
}

/// Split raw text on structural anchors.
///
/// Documents are append-only: when an anchor kind repeats, the first
/// occurrence after the header wins and later stamps are treated as
/// footer artifacts.
pub fn segment(text: &str) -> DocumentLayout {
    let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();

    let table_idx = lines.iter().position(|l| TABLE_HEADER.is_match(l));
    let search_from = table_idx.map(|i| i + 1).unwrap_or(0);
    let totals_idx = lines
        .iter()
        .enumerate()
        .skip(search_from)
        .find(|(_, l)| TOTALS_LABEL.is_match(l))
        .map(|(i, _)| i);
    let delivery_idx = lines.iter().position(|l| DELIVERY_MARKER.is_match(l));

    if table_idx.is_none() && totals_idx.is_none() && delivery_idx.is_none() {
        debug!("no structural anchors found, layout is unparseable");
        return DocumentLayout {
            header: lines,
            unparseable: true,
            ..DocumentLayout::default()
        };
    }

    let table_end = table_idx.unwrap_or(lines.len());
    let header_end = table_end.min(totals_idx.unwrap_or(lines.len()));

    let header: Vec<String> = lines[..header_end].to_vec();

    let party = delivery_idx
        .filter(|&i| i < header_end)
        .map(|i| lines[i..header_end].to_vec());

    let items = table_idx.map(|i| {
        let end = totals_idx.unwrap_or(lines.len());
        lines[i + 1..end.max(i + 1)].to_vec()
    });

    let footer = totals_idx.map(|i| lines[i..].to_vec());

    debug!(
        table = ?table_idx,
        totals = ?totals_idx,
        delivery = ?delivery_idx,
        "segmented layout"
    );

    DocumentLayout {
        header,
        party,
        items,
        footer,
        unparseable: false,
    }
}
