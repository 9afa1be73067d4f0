use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde_json::Value;

use socklog_types::{EntryId, LogEntry};

/// Next entry id, shared by every parser in the process
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Log parser turning inbound frames into entries
pub struct LogParser;

impl LogParser {
    /// Parse a raw frame into a LogEntry
    ///
    /// Never fails: a frame that is not valid JSON is kept as an opaque string.
    pub fn parse(raw: &str) -> LogEntry {
        let (data, is_json) = match Self::try_parse_json(raw) {
            Some(value) => (value, true),
            None => (Value::String(raw.to_string()), false),
        };

        LogEntry {
            id: Self::next_id(),
            timestamp: Utc::now(),
            data,
            is_json,
            raw: raw.to_string(),
        }
    }

    /// Allocate a fresh entry id
    pub fn next_id() -> EntryId {
        EntryId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    fn try_parse_json(content: &str) -> Option<Value> {
        serde_json::from_str(content).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_object() {
        let entry = LogParser::parse(r#"{"type":"order.placed","orderId":"ORD-789"}"#);
        assert!(entry.is_json);
        assert_eq!(entry.data["orderId"], "ORD-789");
        assert!(!entry.is_plain_text());
    }

    #[test]
    fn test_parse_invalid_json_degrades_to_text() {
        let raw = r#"{"type": "truncated"#;
        let entry = LogParser::parse(raw);
        assert!(!entry.is_json);
        assert_eq!(entry.data, Value::String(raw.to_string()));
        assert_eq!(entry.raw, raw);
        assert!(entry.is_plain_text());
    }

    #[test]
    fn test_parse_json_scalars() {
        let entry = LogParser::parse("42");
        assert!(entry.is_json);
        assert_eq!(entry.data, Value::from(42));

        // A JSON string literal is still rendered as plain text
        let entry = LogParser::parse(r#""hello""#);
        assert!(entry.is_json);
        assert!(entry.is_plain_text());
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let first = LogParser::parse("a");
        let second = LogParser::parse("b");
        assert!(second.id > first.id);
    }

    #[test]
    fn test_parse_empty_frame() {
        let entry = LogParser::parse("");
        assert!(!entry.is_json);
        assert_eq!(entry.raw, "");
    }
}
