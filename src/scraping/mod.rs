// Web scraping module - fetches the quote page and parses its price table

pub mod gold_table;

pub use gold_table::{parse_price_cell, parse_price_table};

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::info;

use crate::error::GoldError;

/// Default page listing the gold prices
pub const DEFAULT_SOURCE_URL: &str = "https://hoakimnguyen.com/tra-cuu-gia-vang/";

/// Build the HTTP client shared by the fetcher and the notification channels
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent("Mozilla/5.0 (compatible; GoldwatchBot/1.0)")
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// Download the quote page. Anything but 200 OK is an error.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    info!("Fetching gold prices from {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| GoldError::Fetch(e.to_string()))
        .with_context(|| format!("Failed to send request to {}", url))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(GoldError::Fetch(format!("HTTP {}", status.as_u16())).into());
    }

    let body = response
        .text()
        .await
        .context("Failed to read response body")?;
    Ok(body)
}
