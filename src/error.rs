//! Error handling for goldwatch
//!
//! Defines the domain error type and establishes a unified Result type
//! using anyhow for context chaining and error propagation.

use thiserror::Error;

/// Core error types for the scrape-store-notify cycle
#[derive(Error, Debug)]
pub enum GoldError {
    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no price rows found at {0}")]
    EmptySnapshot(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("notification error: {0}")]
    Notify(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for goldwatch operations
pub type Result<T> = anyhow::Result<T>;
