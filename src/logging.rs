//! Structured Logging for the Staking Core
//!
//! Provides structured logging with:
//! - JSON output for log aggregation on mainnet nodes
//! - Per-component targets (`gbtc::store`, `gbtc::reward`, `gbtc::redemption`, `gbtc::hint`)
//! - Side-channel diagnostics for spends the parsers reject
//!
//! # Usage
//!
//! ```rust,ignore
//! use gbtc_stake::logging::{init_logging, LogLevel};
//!
//! // Initialize at startup
//! init_logging(LogLevel::Info, true)?; // JSON mode for production
//! ```

use serde::Serialize;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::types::{mojo_to_gbtc_string, Bytes32};

// ============================================================================
// Log Levels
// ============================================================================

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// Event categories for structured logging
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Stake record store writes
    Store,
    /// Reward coin creation
    Reward,
    /// Stake metadata and redemption checks
    Redemption,
    /// Hint derivation
    Hint,
    /// Startup and configuration
    System,
}

/// Structured log event
#[derive(Debug, Serialize)]
pub struct LogEvent {
    /// Event timestamp (ISO 8601)
    pub timestamp: String,
    pub level: String,
    pub category: EventCategory,
    pub message: String,
    /// Block height the event belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    /// Additional structured data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for rejected input
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEvent {
    pub fn new(level: LogLevel, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: format!("{:?}", level).to_uppercase(),
            category,
            message: message.into(),
            height: None,
            data: None,
            error: None,
        }
    }

    pub fn with_height(mut self, height: i64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(ErrorDetails {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    /// Render this event as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": \"failed to serialize log\", \"message\": \"{}\"}}",
                self.message
            )
        })
    }
}

// ============================================================================
// Component Events
// ============================================================================

/// Log a committed store write (apply_block or rollback)
pub fn log_store_event(operation: &str, height: i64, inserted: usize, updated: usize) {
    let event = LogEvent::new(LogLevel::Debug, EventCategory::Store, operation)
        .with_height(height)
        .with_data(serde_json::json!({
            "inserted": inserted,
            "updated": updated
        }));

    tracing::debug!(target: "gbtc::store", "{}", event.to_json());
}

/// Log the reward coins created for one height
pub fn log_reward_event(kind: &str, height: u32, coins: usize, total_mojo: u64) {
    let event = LogEvent::new(LogLevel::Info, EventCategory::Reward, kind)
        .with_height(height as i64)
        .with_data(serde_json::json!({
            "coins": coins,
            "total_mojo": total_mojo,
            "total_gbtc": mojo_to_gbtc_string(total_mojo)
        }));

    tracing::info!(target: "gbtc::reward", "{}", event.to_json());
}

/// Log a spend excluded from stake bookkeeping
///
/// Parsers return `None` for these; this is the only trace they leave.
pub fn log_rejected_spend(coin_id: &Bytes32, code: &str, reason: &str) {
    let event = LogEvent::new(LogLevel::Warn, EventCategory::Redemption, "rejected stake spend")
        .with_data(serde_json::json!({ "coin_id": coin_id.to_hex() }))
        .with_error(code, reason);

    tracing::warn!(target: "gbtc::redemption", "{}", event.to_json());
}

/// Log a created coin whose hint was too long to persist
pub fn log_rejected_hint(coin_id: &Bytes32, hint_len: usize) {
    let event = LogEvent::new(LogLevel::Warn, EventCategory::Hint, "oversized hint ignored")
        .with_data(serde_json::json!({
            "coin_id": coin_id.to_hex(),
            "hint_len": hint_len
        }));

    tracing::warn!(target: "gbtc::hint", "{}", event.to_json());
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the logging system
///
/// # Arguments
/// * `level` - Minimum log level to output
/// * `json_format` - Use JSON format (recommended for production)
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = format!("{:?}", level).to_lowercase();
        EnvFilter::new(format!("gbtc={},gbtc_stake={}", level, level))
    });

    if json_format {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE),
        );

        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE),
        );

        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

/// Initialize logging from StakeConfig
pub fn init_from_config(config: &crate::config::StakeConfig) -> Result<(), LoggingError> {
    let level = LogLevel::from(config.log_level.as_str());
    let json_format = config.network == crate::config::Network::Mainnet;

    init_logging(level, json_format)
}

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}
