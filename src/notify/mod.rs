// Notification channels - Telegram bot API and Slack incoming webhook

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::NotifyConfig;
use crate::error::GoldError;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// One configured delivery target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    Telegram { token: String, chat_id: String },
    Slack { webhook_url: String },
}

/// Outcome of pushing one report to every channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

impl Channel {
    /// Channels with complete configuration; the rest are skipped silently.
    pub fn from_config(cfg: &NotifyConfig) -> Vec<Channel> {
        let mut channels = Vec::new();

        let token = cfg.telegram_token.trim();
        let chat_id = cfg.telegram_chat_id.trim();
        if !token.is_empty() && !chat_id.is_empty() {
            channels.push(Channel::Telegram {
                token: token.to_string(),
                chat_id: chat_id.to_string(),
            });
        }

        let webhook_url = cfg.slack_webhook_url.trim();
        if !webhook_url.is_empty() {
            channels.push(Channel::Slack {
                webhook_url: webhook_url.to_string(),
            });
        }

        channels
    }

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Telegram { .. } => "telegram",
            Channel::Slack { .. } => "slack",
        }
    }

    fn endpoint(&self) -> String {
        match self {
            Channel::Telegram { token, .. } => {
                format!("{}/bot{}/sendMessage", TELEGRAM_API_BASE, token)
            }
            Channel::Slack { webhook_url } => webhook_url.clone(),
        }
    }

    /// JSON body carrying `text`
    pub fn payload(&self, text: &str) -> Value {
        match self {
            Channel::Telegram { chat_id, .. } => json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }),
            Channel::Slack { .. } => json!({ "text": text }),
        }
    }

    pub async fn send(&self, client: &Client, text: &str) -> Result<()> {
        let response = client
            .post(self.endpoint())
            .json(&self.payload(text))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.name()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GoldError::Notify(format!(
                "{} returned {}: {}",
                self.name(),
                status,
                body.trim()
            ))
            .into());
        }

        debug!("Delivered report via {}", self.name());
        Ok(())
    }
}

/// Push `text` to every channel. Failures are logged and counted, never fatal.
pub async fn dispatch(client: &Client, channels: &[Channel], text: &str) -> DispatchSummary {
    let mut summary = DispatchSummary::default();

    if channels.is_empty() {
        info!("No notification channels configured, skipping delivery");
        return summary;
    }

    for channel in channels {
        match channel.send(client, text).await {
            Ok(()) => summary.delivered += 1,
            Err(e) => {
                warn!("Notification via {} failed: {:#}", channel.name(), e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Notifications sent: {} delivered, {} failed",
        summary.delivered, summary.failed
    );
    summary
}
