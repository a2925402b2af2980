use chrono::{DateTime, TimeZone};
use std::fmt::{self, Write as _};
use tracing::warn;

use super::{Report, ReportBuilder};
use crate::db::Snapshot;
use crate::utils::format_vnd;

/// Instrument reported in notifications unless configured otherwise
pub const DEFAULT_TRACKED_INSTRUMENT: &str = "Vàng nhẫn khâu 9999";

/// Direction of one price since the previous snapshot. Amounts are magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Increased(i64),
    Decreased(i64),
    Unchanged,
}

impl Movement {
    pub fn between(previous: i64, current: i64) -> Self {
        let delta = current - previous;
        match delta.cmp(&0) {
            std::cmp::Ordering::Greater => Movement::Increased(delta),
            std::cmp::Ordering::Less => Movement::Decreased(-delta),
            std::cmp::Ordering::Equal => Movement::Unchanged,
        }
    }

    /// Commentary line for one side of the quote ("mua" or "bán")
    fn sentence(&self, side: &str) -> String {
        match self {
            Movement::Increased(d) => format!(
                "> Hôm nay giá {} tăng {}/chỉ so với trước đó",
                side,
                format_vnd(*d)
            ),
            Movement::Decreased(d) => format!(
                "> Hôm nay giá {} giảm {}/chỉ so với trước đó",
                side,
                format_vnd(*d)
            ),
            Movement::Unchanged => format!("> Hôm nay giá {} không đổi so với trước đó", side),
        }
    }
}

/// Tracked instrument's current quote and its movement.
///
/// A side missing from either snapshot counts as zero; `baseline_missing`
/// and `current_missing` say when that happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedDelta {
    pub instrument: String,
    pub current_buy: i64,
    pub current_sell: i64,
    pub buy: Movement,
    pub sell: Movement,
    pub baseline_missing: bool,
    pub current_missing: bool,
}

pub fn compute_delta(current: &Snapshot, previous: &Snapshot, instrument: &str) -> TrackedDelta {
    let now = current.find(instrument);
    let before = previous.find(instrument);

    let (current_buy, current_sell) = now.map_or((0, 0), |r| (r.buy_price, r.sell_price));
    let (previous_buy, previous_sell) = before.map_or((0, 0), |r| (r.buy_price, r.sell_price));

    TrackedDelta {
        instrument: instrument.to_string(),
        current_buy,
        current_sell,
        buy: Movement::between(previous_buy, current_buy),
        sell: Movement::between(previous_sell, current_sell),
        baseline_missing: before.is_none(),
        current_missing: now.is_none(),
    }
}

/// Renders the notification text for the tracked instrument
#[derive(Debug, Clone)]
pub struct DeltaFormatter {
    tracked_instrument: String,
    time_format: String,
}

impl DeltaFormatter {
    pub fn new(tracked_instrument: impl Into<String>, time_format: impl Into<String>) -> Self {
        Self {
            tracked_instrument: tracked_instrument.into(),
            time_format: time_format.into(),
        }
    }

    pub fn format<Tz>(&self, current: &Snapshot, previous: &Snapshot, now: &DateTime<Tz>) -> Report
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let delta = compute_delta(current, previous, &self.tracked_instrument);
        if delta.current_missing {
            warn!(
                "{} is missing from the new snapshot, reporting zero prices",
                self.tracked_instrument
            );
        }
        if delta.baseline_missing {
            warn!(
                "{} has no previous price, comparing against zero",
                self.tracked_instrument
            );
        }
        self.render(&delta, now)
    }

    pub fn render<Tz>(&self, delta: &TrackedDelta, now: &DateTime<Tz>) -> Report
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        ReportBuilder::new()
            .line(format!("Giá vàng hôm nay - {} 💰", self.timestamp(now)))
            .line(format!(
                "• {}: Mua {}/chỉ - Bán {}/chỉ",
                delta.instrument,
                format_vnd(delta.current_buy),
                format_vnd(delta.current_sell)
            ))
            .line(delta.buy.sentence("mua"))
            .line(delta.sell.sentence("bán"))
            .build()
    }

    fn timestamp<Tz>(&self, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut out = String::new();
        if write!(out, "{}", now.format(&self.time_format)).is_err() {
            warn!(
                "Invalid time format {:?}, using RFC 3339",
                self.time_format
            );
            return now.to_rfc3339();
        }
        out
    }
}
