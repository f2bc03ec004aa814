use crate::models::{ExtractedTable, RawTableRow};
use crate::utils::error::ScrapeError;
use scraper::{ElementRef, Html, Selector};

fn selector(s: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(s).map_err(|e| ScrapeError::Selector(format!("{}: {:?}", s, e)))
}

/// Text of an element with every fragment trimmed, then joined.
/// `<button>Sales&nbsp;<span>+</span></button>` → "Sales+"
fn cell_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

// ── Login page ────────────────────────────────────────────────────────────────

/// Value of the hidden anti-forgery `<input name=...>` on the login form.
pub fn parse_login_token(html: &str, field: &str) -> Result<String, ScrapeError> {
    let doc = Html::parse_document(html);
    let input_sel = selector("input")?;

    doc.select(&input_sel)
        .find(|input| input.value().attr("name") == Some(field))
        .and_then(|input| input.value().attr("value"))
        .map(|v| v.to_string())
        .ok_or_else(|| ScrapeError::TokenMissing { field: field.to_string() })
}

// ── Statement page ────────────────────────────────────────────────────────────

/// Find the `<heading_tag>` titled exactly `title`, then the first table after it.
///
/// The title is compared against the heading's whole text content (nested
/// elements included) with surrounding whitespace trimmed.
pub fn parse_statement(
    html: &str,
    heading_tag: &str,
    title: &str,
) -> Result<ExtractedTable, ScrapeError> {
    let doc = Html::parse_document(html);

    let heading_sel = selector(heading_tag)?;
    let heading = doc
        .select(&heading_sel)
        .find(|h| h.text().collect::<String>().trim() == title)
        .ok_or_else(|| ScrapeError::SectionNotFound { title: title.to_string() })?;

    let table = next_table(&doc, heading)
        .ok_or_else(|| ScrapeError::TableNotFound { title: title.to_string() })?;

    parse_table(table)
}

/// First `<table>` after `anchor` in document order.
fn next_table<'a>(doc: &'a Html, anchor: ElementRef<'a>) -> Option<ElementRef<'a>> {
    doc.root_element()
        .descendants()
        .skip_while(|node| node.id() != anchor.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

fn parse_table(table: ElementRef<'_>) -> Result<ExtractedTable, ScrapeError> {
    let th_sel = selector("th")?;
    let tr_sel = selector("tr")?;
    let td_sel = selector("td")?;

    // First header is the "Parameters" label column.
    let periods: Vec<String> = table.select(&th_sel).skip(1).map(cell_text).collect();

    let mut rows = Vec::new();
    for tr in table.select(&tr_sel) {
        let mut cells = tr.select(&td_sel).map(cell_text);
        let Some(category) = cells.next() else { continue };
        rows.push(RawTableRow::new(category, cells.collect()));
    }

    Ok(ExtractedTable { periods, rows })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
