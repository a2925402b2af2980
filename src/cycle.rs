// Cycle orchestration - fetch, parse, persist, report, notify

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use reqwest::Client;
use std::fmt;
use tracing::{error, info};

use crate::config::Config;
use crate::db::{Snapshot, SnapshotStore};
use crate::error::GoldError;
use crate::notify::{self, Channel, DispatchSummary};
use crate::reports::{DeltaFormatter, Report};
use crate::schedule::next_run;
use crate::scraping::{self, parse_price_table};

/// What one processed cycle produced
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub snapshot: Snapshot,
    pub previous: Snapshot,
    pub report: Report,
    /// History rows written, `None` when the history store failed
    pub history_rows: Option<usize>,
    pub latest_written: bool,
}

/// Runs cycles one at a time against a fixed configuration
pub struct CycleRunner {
    config: Config,
    client: Client,
    store: SnapshotStore,
    formatter: DeltaFormatter,
    channels: Vec<Channel>,
}

impl CycleRunner {
    pub fn new(config: Config) -> Result<Self> {
        let client = scraping::build_client(config.http_timeout)?;
        let store = SnapshotStore::new(&config.latest_path, &config.db_path);
        let formatter = DeltaFormatter::new(&config.tracked_instrument, &config.time_format);
        let channels = Channel::from_config(&config.notify);

        Ok(Self {
            config,
            client,
            store,
            formatter,
            channels,
        })
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    fn parse_non_empty(&self, html: &str, observed_at: DateTime<Utc>) -> Result<Snapshot> {
        let snapshot = parse_price_table(html, observed_at)?;
        if snapshot.is_empty() {
            return Err(GoldError::EmptySnapshot(self.config.source_url.clone()).into());
        }
        Ok(snapshot)
    }

    /// Parse a fetched page, rotate the latest snapshot, append history and
    /// build the report.
    ///
    /// An empty parse aborts the cycle before anything is written. Failures
    /// to persist are logged; the report is still produced.
    pub fn process<Tz>(&self, html: &str, now: &DateTime<Tz>) -> Result<CycleReport>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let snapshot = self.parse_non_empty(html, now.with_timezone(&Utc))?;
        let previous = self
            .store
            .read_latest()
            .context("Failed to load previous snapshot")?;

        let latest_written = match self.store.write_latest(&snapshot) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to write latest snapshot: {:#}", e);
                false
            }
        };

        let history_rows = match self.store.append_history(&snapshot) {
            Ok(n) => Some(n),
            Err(e) => {
                error!("Failed to append price history: {:#}", e);
                None
            }
        };

        let report = self.formatter.format(&snapshot, &previous, now);

        Ok(CycleReport {
            snapshot,
            previous,
            report,
            history_rows,
            latest_written,
        })
    }

    /// Build the report for a page without touching storage or channels
    pub fn preview<Tz>(&self, html: &str, now: &DateTime<Tz>) -> Result<CycleReport>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let snapshot = self.parse_non_empty(html, now.with_timezone(&Utc))?;
        let previous = self
            .store
            .read_latest()
            .context("Failed to load previous snapshot")?;
        let report = self.formatter.format(&snapshot, &previous, now);

        Ok(CycleReport {
            snapshot,
            previous,
            report,
            history_rows: None,
            latest_written: false,
        })
    }

    pub async fn fetch(&self) -> Result<String> {
        scraping::fetch_page(&self.client, &self.config.source_url).await
    }

    /// One full cycle: fetch, process, notify
    pub async fn run_once(&self) -> Result<(CycleReport, DispatchSummary)> {
        let html = self.fetch().await?;
        let outcome = self.process(&html, &Local::now())?;
        let summary =
            notify::dispatch(&self.client, &self.channels, &outcome.report.to_string()).await;

        info!(
            "Gold prices updated: {} record(s), {} notification(s) delivered",
            outcome.snapshot.len(),
            summary.delivered
        );
        Ok((outcome, summary))
    }

    /// Sleep until each slot and run a cycle; a failed cycle waits for the
    /// next slot. Runs until the process is stopped.
    pub async fn run_forever(&self) -> Result<()> {
        info!(
            "Scheduler started with {} daily slot(s), tracking {}",
            self.config.schedule.len(),
            self.config.tracked_instrument
        );

        loop {
            let now = Local::now();
            let next = next_run(&now, &self.config.schedule)
                .ok_or_else(|| GoldError::Config("no schedule slots configured".into()))?;
            let wait = (next.clone() - now).to_std().unwrap_or_default();

            info!("Waiting until {} for the next run", next.format("%H:%M %d/%m/%Y"));
            tokio::time::sleep(wait).await;

            if let Err(e) = self.run_once().await {
                match e.downcast_ref::<GoldError>() {
                    Some(GoldError::EmptySnapshot(_)) | Some(GoldError::Fetch(_)) => {
                        error!("Skipping this cycle: {:#}", e)
                    }
                    _ => error!("Cycle failed: {:#}", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use tempfile::TempDir;

    fn runner(dir: &TempDir) -> CycleRunner {
        let toml = format!(
            "latest_path = {:?}\ndb_path = {:?}\n",
            dir.path().join("latest.json"),
            dir.path().join("gold.db")
        );
        CycleRunner::new(Config::from_toml(&toml).unwrap()).unwrap()
    }

    fn at(day: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, day, 10, 0, 0)
            .unwrap()
    }

    fn page(buy: &str) -> String {
        format!(
            r#"<table class="table table-bordered table-hover">
               <tr><th>Loại</th><th>Mua</th><th>Bán</th></tr>
               <tr><td>Vàng nhẫn khâu 9999</td><td>{}</td><td>102</td></tr></table>"#,
            buy
        )
    }

    #[test]
    fn test_empty_page_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);
        let err = runner.process("<p>down for maintenance</p>", &at(1)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GoldError>(),
            Some(GoldError::EmptySnapshot(_))
        ));
        assert!(!runner.store().latest_path().exists());
        assert!(!runner.store().db_path().exists());
    }

    #[test]
    fn test_preview_does_not_persist() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);
        let outcome = runner.preview(&page("100"), &at(1)).unwrap();
        assert_eq!(outcome.snapshot.len(), 1);
        assert!(!outcome.latest_written);
        assert!(!runner.store().latest_path().exists());
    }

    #[test]
    fn test_process_rotates_latest() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);

        let first = runner.process(&page("100"), &at(1)).unwrap();
        assert!(first.previous.is_empty());
        assert!(first.latest_written);
        assert_eq!(first.history_rows, Some(1));

        let second = runner.process(&page("105"), &at(2)).unwrap();
        assert_eq!(second.previous, first.snapshot);
        assert_eq!(runner.store().read_latest().unwrap(), second.snapshot);
        assert!(second
            .report
            .to_string()
            .contains("giá mua tăng 5.000 ₫/chỉ"));
    }
}
