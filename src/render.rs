use std::io::{self, Write};

use chrono::Local;
use crossterm::style::Stylize;

use socklog_logs::{
    ArcLogEntry, ConnectionStatus, LogStore, RenderOptions, StoreEvent, escape_html,
    format_timestamp, render_entry, render_entry_ansi,
};
use socklog_types::EntryId;

use crate::config::OutputFormat;

/// Writes store and connection changes to an output stream
pub struct Renderer<W: Write> {
    out: W,
    format: OutputFormat,
    options: RenderOptions,
    status: ConnectionStatus,
    /// Newest entry already written
    last_shown: Option<EntryId>,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, format: OutputFormat, options: RenderOptions) -> Self {
        Self {
            out,
            format,
            options,
            status: ConnectionStatus::default(),
            last_shown: None,
        }
    }

    pub fn status_changed(&mut self, status: ConnectionStatus, store: &LogStore) -> io::Result<()> {
        self.status = status;
        self.notice(&format!("connection {}", status))?;
        if store.filtered().is_empty() {
            self.notice(status.empty_state_message())?;
        }
        self.out.flush()
    }

    pub fn handle(&mut self, event: &StoreEvent, store: &LogStore) -> io::Result<()> {
        match event {
            StoreEvent::LogAdded(_) => {
                let last = self.last_shown;
                let fresh: Vec<_> = store
                    .filtered()
                    .into_iter()
                    .take_while(|e| last.is_none_or(|id| e.id > id))
                    .collect();
                self.write_entries(&fresh)?;
            }
            StoreEvent::FilterChanged(filter) => {
                self.options.search = filter.search.clone();
                let visible = store.filtered();
                match filter.search_term() {
                    Some(term) => self.notice(&format!(
                        "search \"{}\": {} of {}",
                        term,
                        visible.len(),
                        store.len()
                    ))?,
                    None => self.notice("search cleared")?,
                }
                if visible.is_empty() {
                    self.notice(self.status.empty_state_message())?;
                }
                self.write_entries(&visible)?;
            }
            StoreEvent::PauseChanged(paused) => {
                self.notice(if *paused { "paused" } else { "resumed" })?;
            }
            StoreEvent::LogsCleared => {
                self.notice("cleared")?;
                self.notice(self.status.empty_state_message())?;
            }
        }
        self.out.flush()
    }

    /// Write `entries` (newest first) oldest first, like a tail
    fn write_entries(&mut self, entries: &[ArcLogEntry]) -> io::Result<()> {
        for entry in entries.iter().rev() {
            self.write_entry(entry)?;
        }
        if let Some(newest) = entries.first() {
            self.last_shown = self.last_shown.max(Some(newest.id));
        }
        Ok(())
    }

    fn write_entry(&mut self, entry: &ArcLogEntry) -> io::Result<()> {
        let timestamp = format_timestamp(&entry.timestamp.with_timezone(&Local));
        match self.format {
            OutputFormat::Text => {
                let body = render_entry_ansi(entry, &self.options);
                writeln!(self.out, "{} {}", timestamp.dark_grey(), body)
            }
            OutputFormat::Html => {
                let body = render_entry(entry, &self.options);
                let class = if entry.is_json { "log-entry" } else { "log-entry log-text" };
                writeln!(
                    self.out,
                    r#"<div class="{}"><span class="log-timestamp">{}</span><pre class="log-content">{}</pre></div>"#,
                    class, timestamp, body
                )
            }
        }
    }

    fn notice(&mut self, text: &str) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.out, "{}", format!("-- {} --", text).dim()),
            OutputFormat::Html => writeln!(
                self.out,
                r#"<div class="log-notice">{}</div>"#,
                escape_html(text)
            ),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
