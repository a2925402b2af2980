use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One quoted gold product as scraped from the pricing table.
///
/// Prices are stored in thousands of VND: multiply by 1000 for display.
/// Field names on the wire follow the latest-snapshot JSON file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceRecord {
    #[serde(rename = "type")]
    pub instrument_name: String,
    #[serde(rename = "buy")]
    pub buy_price: i64,
    #[serde(rename = "sell")]
    pub sell_price: i64,
    #[serde(rename = "converted", default)]
    pub converted_note: String,
    #[serde(rename = "updated_at")]
    pub observed_at: DateTime<Utc>,
}

/// All records captured in one scrape cycle, in page order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Snapshot {
    records: Vec<PriceRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<PriceRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Last record whose name equals `instrument` exactly.
    pub fn find(&self, instrument: &str) -> Option<&PriceRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.instrument_name == instrument)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a PriceRecord;
    type IntoIter = std::slice::Iter<'a, PriceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A row read back from the `gold_prices` history table
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRow {
    pub id: i64,
    #[serde(flatten)]
    pub record: PriceRecord,
}
