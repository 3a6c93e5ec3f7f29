//! Parses AJAX roster fragments into [`Record`]s.
//!
//! Each fragment holds zero or more `div.name_card` blocks in one of two
//! mutually exclusive layouts, distinguished by the `div.inf` profile marker:
//! profile cards (chapter-chair style, name in a classed `strong` or a bold
//! `dd`) and list cards (roster style, label/value table rows only).

use kuchikiki::traits::TendrilSink;
use kuchikiki::{parse_html, NodeRef};
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

use crate::record::{Record, SeenSet};
use crate::region;

static FAX_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^FAX\s*").unwrap());
static OFFICE_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^사무소명칭\s*").unwrap());

#[derive(Debug, Default)]
struct CardFields {
    name: String,
    office: String,
    address: String,
    phone: String,
    fax: String,
}

/// Extracts every card in `html`, in document order. Newly seen identities
/// are added to `seen`; already-seen ones are dropped with a debug log.
/// Cards yielding no name produce nothing.
pub fn parse_cards(html: &str, tab: &str, site: &str, seen: &mut SeenSet) -> Vec<Record> {
    let document = parse_html().one(html);
    let mut records = Vec::new();

    let Ok(cards) = document.select("div.name_card") else {
        return records;
    };
    for card in cards {
        let node = card.as_node();
        let fields = if node.select_first("div.inf").is_ok() {
            parse_profile_card(node)
        } else {
            parse_list_card(node)
        };
        let Some(fields) = fields else { continue };

        if !seen.remember(&fields.name, &fields.phone) {
            info!(site, tab, name = %fields.name, phone = %fields.phone, "duplicate skipped");
            continue;
        }

        let region = region::classify(&fields.address);
        records.push(Record {
            site: site.to_string(),
            tab: tab.to_string(),
            name: fields.name,
            office: fields.office,
            address: fields.address,
            phone: fields.phone,
            fax: fields.fax,
            region,
        });
    }

    records
}

/// Profile layout: name lives in `strong.lc01`, or in a bold-styled `dd`
/// on sites with the older markup. Detail rows sit in a table inside `div.inf`.
fn parse_profile_card(card: &NodeRef) -> Option<CardFields> {
    let inf = card.select_first("div.inf").ok()?;

    let name = match inf.as_node().select_first("strong.lc01") {
        Ok(strong) => text_of(strong.as_node()),
        Err(()) => bold_dd_text(card),
    };
    if name.is_empty() {
        return None;
    }

    let mut fields = CardFields {
        name,
        ..CardFields::default()
    };
    if let Ok(rows) = inf.as_node().select("table tr") {
        for row in rows {
            read_labelled_row(row.as_node(), &mut fields, false);
        }
    }
    Some(fields)
}

/// List layout: no profile marker; every field comes from labelled table rows.
/// The name row may carry the office in its third cell, label-prefixed.
fn parse_list_card(card: &NodeRef) -> Option<CardFields> {
    let mut fields = CardFields::default();
    if let Ok(rows) = card.select("table tr") {
        for row in rows {
            read_labelled_row(row.as_node(), &mut fields, true);
        }
    }
    if fields.name.is_empty() {
        None
    } else {
        Some(fields)
    }
}

/// Reads one `tr` whose first `td` is the field label. `list_layout` enables
/// the 이름/strong-wrapped variants that only appear on roster cards.
fn read_labelled_row(row: &NodeRef, fields: &mut CardFields, list_layout: bool) {
    let cells: Vec<_> = match row.select("td") {
        Ok(cells) => cells.collect(),
        Err(()) => return,
    };
    let Some(label_cell) = cells.first() else {
        return;
    };

    match text_of(label_cell.as_node()).as_str() {
        "이름" if list_layout && cells.len() >= 2 => {
            fields.name = emphasised_text(cells[1].as_node());
            if let Some(third) = cells.get(2) {
                fields.office = strip_label(&OFFICE_LABEL, &text_of(third.as_node()));
            }
        }
        "사무소명칭" if !list_layout && cells.len() >= 2 => {
            fields.office = text_of(cells[1].as_node());
        }
        "사무소 소재지" | "사무소소재지" if cells.len() >= 2 => {
            fields.address = if list_layout {
                emphasised_text(cells[1].as_node())
            } else {
                text_of(cells[1].as_node())
            };
        }
        "일반전화" if cells.len() >= 2 => {
            fields.phone = text_of(cells[1].as_node());
            if let Some(third) = cells.get(2) {
                fields.fax = strip_label(&FAX_LABEL, &text_of(third.as_node()));
            }
        }
        _ => {}
    }
}

/// Name/address cells may wrap their value in a `strong` element.
fn emphasised_text(cell: &NodeRef) -> String {
    match cell.select_first("strong") {
        Ok(strong) => text_of(strong.as_node()),
        Err(()) => text_of(cell),
    }
}

fn bold_dd_text(card: &NodeRef) -> String {
    let Ok(dds) = card.select("dd") else {
        return String::new();
    };
    for dd in dds {
        let style = dd
            .attributes
            .borrow()
            .get("style")
            .unwrap_or_default()
            .to_string();
        if style.contains("font-weight:bold") || style.contains("font-weight: bold") {
            return text_of(dd.as_node());
        }
    }
    String::new()
}

fn strip_label(label: &Regex, text: &str) -> String {
    label.replace(text, "").trim().to_string()
}

fn text_of(node: &NodeRef) -> String {
    node.text_contents().trim().to_string()
}
