use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use socklog_logs::highlight::DEFAULT_INDENT;
use socklog_logs::{DEFAULT_CAPACITY, RenderOptions, WebSocketConfig};
use socklog_ws::{ConnectError, WsConnector};

use crate::Args;

/// Errors loading or resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no URL given on the command line or in the config file")]
    MissingUrl,

    #[error(transparent)]
    Url(#[from] ConnectError),
}

/// How entries are written to stdout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ANSI colored text
    #[default]
    Text,
    /// Highlighted HTML fragments
    Html,
}

/// Optional settings read from a TOML file
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub buffer_size: Option<usize>,
    pub reconnect: Option<bool>,
    pub reconnect_interval_ms: Option<u64>,
    pub max_reconnect_attempts: Option<u32>,
    pub indent: Option<usize>,
    pub expanded: Option<bool>,
    pub search: Option<String>,
    pub format: Option<OutputFormat>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Fully resolved settings for a run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub connection: WebSocketConfig,
    pub buffer_size: usize,
    pub render: RenderOptions,
    pub format: OutputFormat,
}

impl Settings {
    /// Merge command line over file over defaults
    pub fn resolve(args: &Args, file: FileConfig) -> Result<Self, ConfigError> {
        let url = args.url.clone().or(file.url).ok_or(ConfigError::MissingUrl)?;

        // Reject bad URLs up front instead of as a connection error
        WsConnector::request_for(&url)?;

        let mut connection = WebSocketConfig::new(url);
        if args.no_reconnect {
            connection = connection.with_reconnect(false);
        } else if let Some(reconnect) = file.reconnect {
            connection = connection.with_reconnect(reconnect);
        }
        if let Some(ms) = args.reconnect_interval.or(file.reconnect_interval_ms) {
            connection = connection.with_reconnect_interval(Duration::from_millis(ms));
        }
        if let Some(attempts) = args.max_reconnect_attempts.or(file.max_reconnect_attempts) {
            connection = connection.with_max_reconnect_attempts(attempts);
        }

        let render = RenderOptions {
            indent: args.indent.or(file.indent).unwrap_or(DEFAULT_INDENT),
            expanded: args.expanded || file.expanded.unwrap_or(false),
            search: args.search.clone().or(file.search),
        };

        Ok(Self {
            connection,
            buffer_size: args.buffer_size.or(file.buffer_size).unwrap_or(DEFAULT_CAPACITY),
            render,
            format: args.format.or(file.format).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("socklog").chain(argv.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(&args(&["ws://localhost:8080"]), FileConfig::default())
            .expect("resolves");

        assert_eq!(settings.connection, WebSocketConfig::new("ws://localhost:8080"));
        assert_eq!(settings.buffer_size, DEFAULT_CAPACITY);
        assert_eq!(settings.render, RenderOptions::default());
        assert_eq!(settings.format, OutputFormat::Text);
    }

    #[test]
    fn test_file_values_fill_gaps() {
        let file = FileConfig::parse(
            r#"
            url = "wss://logs.example.com/stream"
            buffer_size = 250
            reconnect_interval_ms = 500
            expanded = true
            indent = 2
            format = "html"
            "#,
        )
        .expect("valid toml");

        let settings = Settings::resolve(&args(&[]), file).expect("resolves");
        assert_eq!(settings.connection.url, "wss://logs.example.com/stream");
        assert_eq!(settings.connection.reconnect_interval_ms, 500);
        assert_eq!(settings.buffer_size, 250);
        assert!(settings.render.expanded);
        assert_eq!(settings.render.indent, 2);
        assert_eq!(settings.format, OutputFormat::Html);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig {
            url: Some("ws://from-file".to_string()),
            buffer_size: Some(10),
            reconnect: Some(true),
            max_reconnect_attempts: Some(5),
            search: Some("file".to_string()),
            ..FileConfig::default()
        };
        let args = args(&[
            "ws://from-cli",
            "--buffer-size",
            "20",
            "--no-reconnect",
            "--max-reconnect-attempts",
            "1",
            "--search",
            "cli",
        ]);

        let settings = Settings::resolve(&args, file).expect("resolves");
        assert_eq!(settings.connection.url, "ws://from-cli");
        assert!(!settings.connection.reconnect);
        assert_eq!(settings.connection.max_reconnect_attempts, 1);
        assert_eq!(settings.buffer_size, 20);
        assert_eq!(settings.render.search.as_deref(), Some("cli"));
    }

    #[test]
    fn test_missing_url() {
        let err = Settings::resolve(&args(&[]), FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingUrl));
    }

    #[test]
    fn test_non_websocket_url_rejected() {
        let err = Settings::resolve(&args(&["http://localhost"]), FileConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Url(_)));
    }

    #[test]
    fn test_unknown_file_keys_rejected() {
        assert!(FileConfig::parse("bufer_size = 3").is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let err = FileConfig::load(Path::new("/nonexistent/socklog.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/socklog.toml"));
    }
}
