// Database module - latest snapshot file and SQLite price history

pub mod models;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::GoldError;
pub use models::{HistoryRow, PriceRecord, Snapshot};

/// Open database connection
pub fn open_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {:?}", parent))?;
    }
    let conn =
        Connection::open(db_path).context(format!("Failed to open database at {:?}", db_path))?;
    Ok(conn)
}

/// Create the history table if it does not exist yet
pub fn init_schema(conn: &Connection) -> Result<()> {
    let schema_sql = include_str!("schema.sql");
    conn.execute_batch(schema_sql)
        .context("Failed to execute schema")?;
    Ok(())
}

/// Insert one history row, returns the new row id
pub fn insert_price(conn: &Connection, record: &PriceRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO gold_prices (type, buy, sell, converted, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.instrument_name,
            record.buy_price.to_string(),
            record.sell_price.to_string(),
            record.converted_note,
            record.observed_at,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// List history rows, newest first
pub fn list_history(
    conn: &Connection,
    limit: usize,
    instrument: Option<&str>,
) -> Result<Vec<HistoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, type, buy, sell, converted, updated_at
         FROM gold_prices
         WHERE ?1 IS NULL OR type = ?1
         ORDER BY id DESC
         LIMIT ?2",
    )?;

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![instrument, limit], history_row_from_row)?;

    let mut history = Vec::new();
    for row in rows {
        history.push(row.context("Failed to read history row")?);
    }
    Ok(history)
}

fn history_row_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryRow> {
    Ok(HistoryRow {
        id: row.get(0)?,
        record: PriceRecord {
            instrument_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            buy_price: get_price_text(row, 2)?,
            sell_price: get_price_text(row, 3)?,
            converted_note: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            observed_at: row.get(5)?,
        },
    })
}

/// Prices are persisted as text; parse them back into integers.
fn get_price_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<i64> {
    let text: String = row.get(idx)?;
    text.trim().parse::<i64>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Durable home of the latest snapshot and the price history.
///
/// The SQLite connection is opened per call and dropped before returning,
/// so nothing is held open between cycles.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    latest_path: PathBuf,
    db_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(latest_path: impl Into<PathBuf>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            latest_path: latest_path.into(),
            db_path: db_path.into(),
        }
    }

    pub fn latest_path(&self) -> &Path {
        &self.latest_path
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Load the snapshot written by the previous cycle.
    ///
    /// A missing file (first run) or an undecodable one yields an empty
    /// snapshot so the cycle can carry on.
    pub fn read_latest(&self) -> Result<Snapshot> {
        let data = match std::fs::read_to_string(&self.latest_path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "No latest snapshot at {:?} yet, starting from an empty one",
                    self.latest_path
                );
                return Ok(Snapshot::default());
            }
            Err(e) => {
                return Err(GoldError::Io(e))
                    .with_context(|| format!("Failed to read {:?}", self.latest_path));
            }
        };

        match serde_json::from_str::<Snapshot>(&data) {
            Ok(snapshot) => {
                debug!(
                    "Loaded latest snapshot with {} record(s) from {:?}",
                    snapshot.len(),
                    self.latest_path
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(
                    "Latest snapshot at {:?} is not valid JSON ({}), ignoring it",
                    self.latest_path, e
                );
                Ok(Snapshot::default())
            }
        }
    }

    /// Replace the latest snapshot. Written to a sibling temp file first and
    /// renamed into place, so readers never see a half-written file.
    pub fn write_latest(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self
            .latest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(snapshot)
            .context("Failed to serialize latest snapshot")?;

        let tmp_path = temp_sibling(&self.latest_path);
        std::fs::write(&tmp_path, json)
            .with_context(|| format!("Failed to write {:?}", tmp_path))?;
        std::fs::rename(&tmp_path, &self.latest_path).with_context(|| {
            format!(
                "Failed to move {:?} into place at {:?}",
                tmp_path, self.latest_path
            )
        })?;

        debug!(
            "Wrote latest snapshot ({} record(s)) to {:?}",
            snapshot.len(),
            self.latest_path
        );
        Ok(())
    }

    /// Append every record to the history table.
    ///
    /// A failing insert is logged and skipped; the rest still go in.
    /// Returns how many rows were inserted, or a storage error when not a
    /// single row of a non-empty snapshot made it.
    pub fn append_history(&self, snapshot: &Snapshot) -> Result<usize> {
        let conn = open_db(&self.db_path)?;
        init_schema(&conn)?;

        let mut inserted = 0;
        for record in snapshot {
            match insert_price(&conn, record) {
                Ok(_) => inserted += 1,
                Err(e) => warn!(
                    "Failed to insert history row for {}: {:#}",
                    record.instrument_name, e
                ),
            }
        }

        if inserted == 0 && !snapshot.is_empty() {
            return Err(GoldError::Storage(format!(
                "none of {} price row(s) could be inserted into {:?}",
                snapshot.len(),
                self.db_path
            ))
            .into());
        }

        info!(
            "Appended {}/{} price row(s) to history at {:?}",
            inserted,
            snapshot.len(),
            self.db_path
        );
        Ok(inserted)
    }

    /// Most recent history rows, optionally for a single instrument.
    /// No database yet means no history; the file is not created here.
    pub fn recent_history(&self, limit: usize, instrument: Option<&str>) -> Result<Vec<HistoryRow>> {
        if !self.db_path.exists() {
            debug!("No history database at {:?} yet", self.db_path);
            return Ok(Vec::new());
        }
        let conn = open_db(&self.db_path)?;
        init_schema(&conn)?;
        list_history(&conn, limit, instrument)
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
