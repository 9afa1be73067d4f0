//! HTML rendering of log payloads.
//!
//! Payloads are tokenized with [`crate::json::tokenize`], escaped, wrapped in
//! classed spans and joined with `<wbr>` so long lines wrap between tokens.
//! Search highlighting runs last, over the finished markup, and only ever
//! touches text between tags.

use std::borrow::Cow;

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use serde_json::Value;

use socklog_types::LogEntry;

use crate::filter::literal_pattern;
use crate::json::{Token, TokenKind, tokenize};

/// Default indent width for expanded entries
pub const DEFAULT_INDENT: usize = 4;

/// Zero-width break opportunity placed between token fragments
const TOKEN_SEPARATOR: &str = "<wbr>";

const HIGHLIGHT_OPEN: &str = r#"<span class="json-highlight">"#;
const HIGHLIGHT_CLOSE: &str = "</span>";

/// Semantic class of a rendered token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Key,
    String,
    Value,
    Punctuation,
}

impl TokenClass {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Key => "json-key",
            Self::String => "json-string",
            Self::Value => "json-value",
            Self::Punctuation => "json-punctuation",
        }
    }
}

/// How a single entry should be rendered
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Spaces per level when expanded
    pub indent: usize,
    /// Pretty-print instead of compact output
    pub expanded: bool,
    /// Term to highlight, if any
    pub search: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            expanded: false,
            search: None,
        }
    }
}

impl RenderOptions {
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

/// Render an entry as HTML markup safe to inject verbatim
pub fn render_entry(entry: &LogEntry, options: &RenderOptions) -> String {
    let source = source_text(entry, options.expanded, options.indent);
    let markup = json_markup(&source);
    match options.search_term() {
        Some(term) => highlight_matches(&markup, term),
        None => markup,
    }
}

/// Text to tokenize for an entry
///
/// Plain string payloads are used verbatim; anything else is re-serialized,
/// compact when collapsed and indented when expanded.
pub fn source_text(entry: &LogEntry, expanded: bool, indent: usize) -> Cow<'_, str> {
    if entry.is_plain_text() {
        return Cow::Borrowed(entry.data.as_str().unwrap_or(&entry.raw));
    }

    let serialized = if expanded {
        to_pretty(&entry.data, indent)
    } else {
        serde_json::to_string(&entry.data).ok()
    };

    match serialized {
        Some(text) => Cow::Owned(text),
        None => Cow::Borrowed(&entry.raw),
    }
}

fn to_pretty(value: &Value, indent: usize) -> Option<String> {
    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer).ok()?;
    String::from_utf8(buf).ok()
}

/// Class for each token; `None` for whitespace
///
/// A string is a key when the very next token is a `:`.
pub fn classify(tokens: &[Token<'_>]) -> Vec<Option<TokenClass>> {
    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| match token.kind {
            TokenKind::Whitespace => None,
            TokenKind::Punctuation => Some(TokenClass::Punctuation),
            TokenKind::Value => Some(TokenClass::Value),
            TokenKind::String => {
                let is_key = tokens
                    .get(i + 1)
                    .is_some_and(|next| next.kind == TokenKind::Punctuation && next.text == ":");
                Some(if is_key {
                    TokenClass::Key
                } else {
                    TokenClass::String
                })
            }
        })
        .collect()
}

/// Tokenize, escape and wrap `text` in classed spans
pub fn json_markup(text: &str) -> String {
    let tokens = tokenize(text);
    let classes = classify(&tokens);

    let fragments: Vec<String> = tokens
        .iter()
        .zip(classes)
        .map(|(token, class)| {
            let escaped = escape_html(token.text);
            match class {
                Some(class) => format!(r#"<span class="{}">{}</span>"#, class.css_class(), escaped),
                None => escaped.into_owned(),
            }
        })
        .collect();

    fragments.join(TOKEN_SEPARATOR)
}

/// Wrap case-insensitive literal matches of `term` in highlight spans
///
/// Tags in `markup` are copied through untouched. Text between tags is
/// decoded, matched, then re-escaped, so a match can neither land inside a
/// tag nor split an entity.
///
/// Each text segment is matched on its own. A term that only occurs across
/// token boundaries, such as `"a":1`, still passes the store filter but gets
/// no highlight.
pub fn highlight_matches(markup: &str, term: &str) -> String {
    if term.is_empty() {
        return markup.to_string();
    }

    let re = match literal_pattern(term) {
        Ok(re) => re,
        Err(err) => {
            tracing::debug!("search term not highlightable: {err}");
            return markup.to_string();
        }
    };

    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while !rest.is_empty() {
        let end = if rest.starts_with('<') {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            out.push_str(&rest[..end]);
            end
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            let text = unescape_html(&rest[..end]);

            let mut last = 0;
            for m in re.find_iter(&text) {
                if m.is_empty() {
                    continue;
                }
                out.push_str(&escape_html(&text[last..m.start()]));
                out.push_str(HIGHLIGHT_OPEN);
                out.push_str(&escape_html(m.as_str()));
                out.push_str(HIGHLIGHT_CLOSE);
                last = m.end();
            }
            out.push_str(&escape_html(&text[last..]));
            end
        };
        rest = &rest[end..];
    }

    out
}

/// Escape `&`, `<` and `>`
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Inverse of [`escape_html`]
fn unescape_html(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let (decoded, len) = if rest.starts_with("&amp;") {
            ('&', 5)
        } else if rest.starts_with("&lt;") {
            ('<', 4)
        } else if rest.starts_with("&gt;") {
            ('>', 4)
        } else {
            ('&', 1)
        };
        out.push(decoded);
        rest = &rest[len..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Wall-clock time as `HH:MM:SS.mmm` (24 hour)
pub fn format_timestamp<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    timestamp.format("%H:%M:%S%.3f").to_string()
}
