// Parser for the gold price table on the quote page
//
// The page carries one bootstrap-styled table; each data row is
// name | buy | sell | converted. Prices use ',' as thousands separator.

use anyhow::Result;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;

use crate::db::{PriceRecord, Snapshot};
use crate::error::GoldError;

/// Rows of the pricing table as styled on the source page
pub const PRICE_TABLE_ROWS: &str = "table.table.table-bordered.table-hover tr";

/// Used when the styled table is not found
const ANY_TABLE_ROWS: &str = "table tr";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| GoldError::Parse(format!("invalid selector {:?}: {}", css, e)).into())
}

/// Parse a price cell: trim, drop ',' grouping, read a non-negative integer.
pub fn parse_price_cell(text: &str) -> Result<i64, GoldError> {
    let cleaned = text.trim().replace(',', "");
    let value = cleaned
        .parse::<i64>()
        .map_err(|e| GoldError::Parse(format!("invalid price {:?}: {}", text.trim(), e)))?;
    if value < 0 {
        return Err(GoldError::Parse(format!("negative price {:?}", text.trim())));
    }
    Ok(value)
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Normalize an instrument label so exact comparison does not depend on how
/// the page composed its diacritics.
pub fn normalize_name(name: &str) -> String {
    name.trim().nfc().collect()
}

/// Turn the quote page into a snapshot.
///
/// Header rows and rows with fewer than three cells are skipped; a row whose
/// price cells do not parse is dropped with a warning. An empty result is
/// returned as-is and left for the caller to judge.
pub fn parse_price_table(html: &str, observed_at: DateTime<Utc>) -> Result<Snapshot> {
    let document = Html::parse_document(html);
    let styled_rows = selector(PRICE_TABLE_ROWS)?;
    let any_rows = selector(ANY_TABLE_ROWS)?;
    let header_sel = selector("th")?;
    let cell_sel = selector("td")?;

    let mut rows: Vec<ElementRef<'_>> = document.select(&styled_rows).collect();
    if rows.is_empty() {
        warn!(
            "No rows matched {:?}, falling back to any table on the page",
            PRICE_TABLE_ROWS
        );
        rows = document.select(&any_rows).collect();
    }

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (index, row) in rows.iter().enumerate() {
        if row.select(&header_sel).next().is_some() {
            continue;
        }

        let cells: Vec<String> = row.select(&cell_sel).map(|c| cell_text(&c)).collect();
        if cells.len() < 3 {
            debug!("Skipping row {} with {} cell(s)", index, cells.len());
            continue;
        }

        let buy_price = match parse_price_cell(&cells[1]) {
            Ok(v) => v,
            Err(e) => {
                warn!("Dropping row {} ({}): buy {}", index, cells[0], e);
                dropped += 1;
                continue;
            }
        };
        let sell_price = match parse_price_cell(&cells[2]) {
            Ok(v) => v,
            Err(e) => {
                warn!("Dropping row {} ({}): sell {}", index, cells[0], e);
                dropped += 1;
                continue;
            }
        };

        records.push(PriceRecord {
            instrument_name: normalize_name(&cells[0]),
            buy_price,
            sell_price,
            converted_note: cells.get(3).cloned().unwrap_or_default(),
            observed_at,
        });
    }

    info!(
        "Parsed {} price row(s), dropped {} malformed row(s)",
        records.len(),
        dropped
    );

    Ok(Snapshot::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 3, 0, 0).unwrap()
    }

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table class="table table-bordered table-hover">
              <thead><tr><th>Loại vàng</th><th>Mua vào</th><th>Bán ra</th><th>Quy đổi</th></tr></thead>
              <tbody>{}</tbody>
            </table></body></html>"#,
            rows
        )
    }

    #[test]
    fn test_parse_price_cell_strips_separators() {
        assert_eq!(parse_price_cell("8,450").unwrap(), 8450);
        assert_eq!(parse_price_cell("  12,345,678 \n").unwrap(), 12_345_678);
        assert_eq!(parse_price_cell("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_price_cell_rejects_garbage() {
        assert!(parse_price_cell("").is_err());
        assert!(parse_price_cell("Liên hệ").is_err());
        assert!(parse_price_cell("8.450").is_err());
        assert!(parse_price_cell("-5").is_err());
    }

    #[test]
    fn test_parses_data_rows_and_skips_header() {
        let html = page(
            r#"<tr><td> Vàng nhẫn khâu 9999 </td><td>8,450</td><td>8,600</td><td> 1 chỉ </td></tr>
               <tr><td>Vàng 18K</td><td>6,100</td><td>6,350</td></tr>"#,
        );
        let snapshot = parse_price_table(&html, now()).unwrap();
        let records = snapshot.records();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].instrument_name, "Vàng nhẫn khâu 9999");
        assert_eq!(records[0].buy_price, 8450);
        assert_eq!(records[0].sell_price, 8600);
        assert_eq!(records[0].converted_note, "1 chỉ");
        assert_eq!(records[0].observed_at, now());
        assert_eq!(records[1].instrument_name, "Vàng 18K");
        assert_eq!(records[1].converted_note, "");
    }

    #[test]
    fn test_malformed_rows_do_not_stop_parsing() {
        let html = page(
            r#"<tr><td>Short row</td><td>100</td></tr>
               <tr><td>Bad buy</td><td>call us</td><td>100</td></tr>
               <tr><td>Bad sell</td><td>100</td><td>n/a</td></tr>
               <tr><td>Good</td><td>1,000</td><td>1,020</td><td>x</td></tr>"#,
        );
        let snapshot = parse_price_table(&html, now()).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.records()[0].instrument_name, "Good");
        assert_eq!(snapshot.records()[0].buy_price, 1000);
    }

    #[test]
    fn test_nested_markup_in_cells() {
        let html = page(
            r#"<tr><td><strong>Vàng</strong> <span>SJC</span></td><td><b>9,100</b></td><td>9,300</td></tr>"#,
        );
        let snapshot = parse_price_table(&html, now()).unwrap();
        assert_eq!(snapshot.records()[0].instrument_name, "Vàng SJC");
        assert_eq!(snapshot.records()[0].buy_price, 9100);
    }

    #[test]
    fn test_falls_back_to_unstyled_table() {
        let html = r#"<table><tr><th>a</th></tr><tr><td>Plain</td><td>10</td><td>11</td></tr></table>"#;
        let snapshot = parse_price_table(html, now()).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.records()[0].sell_price, 11);
    }

    #[test]
    fn test_styled_table_wins_over_other_tables() {
        let html = format!(
            "<table><tr><td>Other</td><td>1</td><td>2</td></tr></table>{}",
            page("<tr><td>Styled</td><td>3</td><td>4</td></tr>")
        );
        let snapshot = parse_price_table(&html, now()).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.records()[0].instrument_name, "Styled");
    }

    #[test]
    fn test_page_without_tables_is_empty() {
        let snapshot = parse_price_table("<html><body><p>maintenance</p>", now()).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_names_are_nfc_normalized() {
        // "à" written as 'a' + combining grave accent
        let decomposed = "Va\u{0300}ng 24K";
        let html = page(&format!("<tr><td>{}</td><td>1</td><td>2</td></tr>", decomposed));
        let snapshot = parse_price_table(&html, now()).unwrap();
        assert_eq!(snapshot.records()[0].instrument_name, "Vàng 24K");
    }
}
