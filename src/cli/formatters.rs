//! Output formatting module for CLI display
//!
//! Keeps terminal presentation (tables, colors, JSON) apart from the
//! scrape and storage logic.

use colored::Colorize;
use goldwatch::db::{HistoryRow, PriceRecord, Snapshot};
use goldwatch::utils::format_vnd;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

/// Pretty JSON for anything serializable, with a JSON error object on failure
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

#[derive(Tabled)]
struct PriceRow {
    #[tabled(rename = "Instrument")]
    instrument: String,
    #[tabled(rename = "Buy")]
    buy: String,
    #[tabled(rename = "Sell")]
    sell: String,
    #[tabled(rename = "Converted")]
    converted: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&PriceRecord> for PriceRow {
    fn from(r: &PriceRecord) -> Self {
        PriceRow {
            instrument: r.instrument_name.clone(),
            buy: format_vnd(r.buy_price),
            sell: format_vnd(r.sell_price),
            converted: r.converted_note.clone(),
            updated: r
                .observed_at
                .with_timezone(&chrono::Local)
                .format("%d/%m/%Y %H:%M")
                .to_string(),
        }
    }
}

/// Snapshot as a terminal table, with the tracked instrument highlighted
pub fn format_snapshot_table(snapshot: &Snapshot, tracked: &str) -> String {
    let rows: Vec<PriceRow> = snapshot
        .records()
        .iter()
        .map(|r| {
            let mut row = PriceRow::from(r);
            if r.instrument_name == tracked {
                row.instrument = row.instrument.yellow().bold().to_string();
            }
            row
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..3), Alignment::right());

    format!(
        "\n{} {} instrument(s)\n\n{}\n",
        "💰".yellow().bold(),
        snapshot.len(),
        table
    )
}

/// History rows as a terminal table
pub fn format_history_table(rows: &[HistoryRow]) -> String {
    #[derive(Tabled)]
    struct HistoryLine {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(inline)]
        price: PriceRow,
    }

    let lines: Vec<HistoryLine> = rows
        .iter()
        .map(|row| HistoryLine {
            id: row.id,
            price: PriceRow::from(&row.record),
        })
        .collect();

    let mut table = Table::new(&lines);
    table.with(Style::modern());
    table.modify(Columns::new(2..4), Alignment::right());
    format!("{}\n", table)
}

/// Message for commands that find nothing stored yet
pub fn format_empty(what: &str) -> String {
    format!(
        "{} No {} found\nRun a cycle first using: {} once\n",
        "ℹ".blue().bold(),
        what,
        "goldwatch".bold()
    )
}
