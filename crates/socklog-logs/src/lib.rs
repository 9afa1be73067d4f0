//! Log processing for socklog
//!
//! This crate provides the WebSocket connection manager, the bounded log
//! store with filtering and pause, and JSON highlighting for display.

mod ansi;
mod connection;
mod emitter;
mod filter;
mod parser;
mod store;

pub mod highlight;
pub mod json;

pub use ansi::{colorize, render_entry_ansi};
pub use connection::{ConnectionEvent, ConnectionManager};
pub use emitter::{Emitter, Subscription, SubscriptionId};
pub use filter::CompiledFilter;
pub use highlight::{RenderOptions, escape_html, format_timestamp, render_entry};
pub use parser::LogParser;
pub use store::{DEFAULT_CAPACITY, LogStore, StoreEvent};

// Re-export types used in our public API
pub use socklog_types::{ArcLogEntry, ConnectionStatus, LogEntry, LogFilter, WebSocketConfig};
