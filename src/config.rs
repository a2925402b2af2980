//! Runtime configuration
//!
//! Loaded once at startup from a TOML file and passed down explicitly.
//! A missing or invalid file is fatal: without it there is nowhere to send
//! the report.

use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveTime;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::GoldError;
use crate::reports::delta::DEFAULT_TRACKED_INSTRUMENT;
use crate::schedule::{parse_slot, DEFAULT_SLOTS};
use crate::scraping::gold_table::normalize_name;
use crate::scraping::DEFAULT_SOURCE_URL;

const APP_DIR: &str = "goldwatch";
const LOCAL_CONFIG_FILE: &str = "goldwatch.toml";
const DEFAULT_TIME_FORMAT: &str = "%H:%M %d/%m/%Y";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// On-disk shape of the config file. Older key names are accepted as aliases.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct ConfigFile {
    #[serde(alias = "telegramToken")]
    telegram_token: String,
    #[serde(alias = "telegramChatId")]
    telegram_chat_id: String,
    #[serde(alias = "slack_webhook", alias = "slackWebhookUrl")]
    slack_webhook_url: String,
    #[serde(alias = "format_time", alias = "timeFormatPattern")]
    time_format: String,
    #[serde(alias = "gpt_key", alias = "gptApiKey")]
    gpt_api_key: Option<String>,
    source_url: String,
    tracked_instrument: String,
    latest_path: Option<PathBuf>,
    db_path: Option<PathBuf>,
    schedule: Vec<String>,
    http_timeout_secs: u64,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            telegram_token: String::new(),
            telegram_chat_id: String::new(),
            slack_webhook_url: String::new(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            gpt_api_key: None,
            source_url: DEFAULT_SOURCE_URL.to_string(),
            tracked_instrument: DEFAULT_TRACKED_INSTRUMENT.to_string(),
            latest_path: None,
            db_path: None,
            schedule: DEFAULT_SLOTS.iter().map(|s| s.to_string()).collect(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Credentials for the notification channels. Empty means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyConfig {
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub slack_webhook_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub notify: NotifyConfig,
    /// chrono strftime pattern for the report header
    pub time_format: String,
    /// Accepted for compatibility; nothing reads it
    pub gpt_api_key: Option<String>,
    pub source_url: String,
    pub tracked_instrument: String,
    pub latest_path: PathBuf,
    pub db_path: PathBuf,
    pub schedule: Vec<NaiveTime>,
    pub http_timeout: Duration,
}

impl Config {
    /// Read and validate the config file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse and validate config text. Relative paths are kept as written.
    pub fn from_toml(text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| GoldError::Config(e.to_string()))?;
        Self::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Result<Self> {
        let time_format = resolve_time_format(&file.time_format)?;

        if file.schedule.is_empty() {
            return Err(GoldError::Config("schedule must list at least one slot".into()).into());
        }
        let schedule = file
            .schedule
            .iter()
            .map(|s| parse_slot(s))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if file.http_timeout_secs == 0 {
            return Err(GoldError::Config("http_timeout_secs must be positive".into()).into());
        }
        if file.source_url.trim().is_empty() {
            return Err(GoldError::Config("source_url must not be empty".into()).into());
        }

        let tracked_instrument = normalize_name(&file.tracked_instrument);
        if tracked_instrument.is_empty() {
            return Err(GoldError::Config("tracked_instrument must not be empty".into()).into());
        }

        let latest_path = match file.latest_path {
            Some(path) => path,
            None => default_data_dir().join("latest.json"),
        };
        let db_path = match file.db_path {
            Some(path) => path,
            None => default_data_dir().join("gold.db"),
        };

        Ok(Self {
            notify: NotifyConfig {
                telegram_token: file.telegram_token,
                telegram_chat_id: file.telegram_chat_id,
                slack_webhook_url: file.slack_webhook_url,
            },
            time_format,
            gpt_api_key: file.gpt_api_key.filter(|k| !k.is_empty()),
            source_url: file.source_url.trim().to_string(),
            tracked_instrument,
            latest_path,
            db_path,
            schedule,
            http_timeout: Duration::from_secs(file.http_timeout_secs),
        })
    }
}

/// Go reference-time tokens and their strftime equivalents, longest first
const GO_LAYOUT_TOKENS: &[(&str, &str)] = &[
    ("2006", "%Y"),
    ("Monday", "%A"),
    ("January", "%B"),
    ("Mon", "%a"),
    ("Jan", "%b"),
    ("MST", "%Z"),
    ("15", "%H"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("01", "%m"),
    ("02", "%d"),
    ("06", "%y"),
    ("PM", "%p"),
];

/// Check a strftime pattern. Values without any `%` item are legacy Go
/// layouts (`15:04 02/01/2006`) and get translated token by token.
fn resolve_time_format(pattern: &str) -> Result<String, GoldError> {
    let pattern = if pattern.contains('%') {
        pattern.to_string()
    } else {
        let converted = go_layout_to_strftime(pattern).ok_or_else(|| {
            GoldError::Config(format!(
                "time_format {:?} has no strftime items; use a pattern such as {:?}",
                pattern, DEFAULT_TIME_FORMAT
            ))
        })?;
        info!(
            "Converted legacy time layout {:?} to strftime {:?}",
            pattern, converted
        );
        converted
    };

    if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
        return Err(GoldError::Config(format!(
            "time_format {:?} is not a valid strftime pattern",
            pattern
        )));
    }
    Ok(pattern)
}

/// Translate a Go time layout, or `None` when it holds no Go token at all
fn go_layout_to_strftime(layout: &str) -> Option<String> {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;
    let mut matched = false;

    'scan: while let Some(c) = rest.chars().next() {
        for (token, item) in GO_LAYOUT_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(item);
                rest = tail;
                matched = true;
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    matched.then_some(out)
}

/// `<data_home>/goldwatch`, or the working directory when no data home exists
pub fn default_data_dir() -> PathBuf {
    dir_spec::data_home()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Pick the config file: explicit path, then `./goldwatch.toml`, then
/// `<config_home>/goldwatch/config.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Ok(local);
    }

    let config_home = dir_spec::config_home().ok_or_else(|| {
        GoldError::Config(format!(
            "no {} in the working directory and no config directory available",
            LOCAL_CONFIG_FILE
        ))
    })?;
    Ok(config_home.join(APP_DIR).join("config.toml"))
}
