//! Shared types for socklog
//!
//! This crate contains data structures used across multiple socklog crates.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Connection Types
// ============================================================================

/// Default delay between reconnect attempts, in milliseconds
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 3000;

/// Default cap on consecutive reconnect attempts
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// WebSocket endpoint and reconnect policy
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WebSocketConfig {
    /// Endpoint URL (`ws://` or `wss://`)
    pub url: String,

    /// Whether to reconnect automatically after the connection closes
    #[serde(default = "default_reconnect")]
    pub reconnect: bool,

    /// Constant delay before each reconnect attempt
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    /// Attempts allowed before giving up silently
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

fn default_reconnect() -> bool {
    true
}

fn default_reconnect_interval_ms() -> u64 {
    DEFAULT_RECONNECT_INTERVAL_MS
}

fn default_max_reconnect_attempts() -> u32 {
    DEFAULT_MAX_RECONNECT_ATTEMPTS
}

impl WebSocketConfig {
    /// Create a config for `url` with default reconnect settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: default_reconnect(),
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }

    pub fn with_reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Reconnect delay as a `Duration`
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

/// Connection lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    /// Lowercase label, as shown in status lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }

    /// Placeholder text for a view with no visible entries
    pub fn empty_state_message(&self) -> &'static str {
        match self {
            Self::Connecting => "Connecting...",
            Self::Connected => "Waiting for messages...",
            Self::Disconnected | Self::Error => "No messages to display",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Log Types
// ============================================================================

/// Opaque identifier assigned to an entry at ingestion
///
/// Ids grow monotonically within a process, so a larger id always means a
/// later arrival.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single ingested message
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    /// Unique id assigned at ingestion
    pub id: EntryId,

    /// Wall-clock time the frame was received
    pub timestamp: DateTime<Utc>,

    /// Parsed payload, or the raw text as a JSON string if parsing failed
    pub data: serde_json::Value,

    /// Whether `data` came from a successful JSON parse
    pub is_json: bool,

    /// Frame text as received
    pub raw: String,
}

impl LogEntry {
    /// Whether the payload should be rendered verbatim rather than re-serialized
    pub fn is_plain_text(&self) -> bool {
        self.data.is_string()
    }
}

/// Shared entry handle, cheap to clone into snapshots and notifications
pub type ArcLogEntry = Arc<LogEntry>;

/// Visibility filter applied by the log store
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Case-insensitive substring matched against the raw frame
    pub search: Option<String>,
}

impl LogFilter {
    /// Build a filter from search box text; empty text matches everything
    pub fn from_search(text: &str) -> Self {
        if text.is_empty() {
            Self::default()
        } else {
            Self {
                search: Some(text.to_string()),
            }
        }
    }

    /// The active search term, if any
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    /// Check if the filter matches everything
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none()
    }
}
