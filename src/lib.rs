//! Goldwatch - gold price scraper and notifier
//!
//! This library scrapes the gold price table, keeps the latest snapshot and
//! a SQLite history, and renders the tracked instrument's change for the
//! Telegram and Slack notifications.

pub mod config;
pub mod cycle;
pub mod db;
pub mod error;
pub mod notify;
pub mod reports;
pub mod schedule;
pub mod scraping;
pub mod utils;
