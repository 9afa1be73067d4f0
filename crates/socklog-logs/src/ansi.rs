//! Terminal rendering of the same token stream the HTML renderer uses.

use std::borrow::Cow;
use std::fmt::Write;

use crossterm::style::{Color, Stylize, style};

use socklog_types::{LogEntry, LogFilter};

use crate::filter::CompiledFilter;
use crate::highlight::{RenderOptions, TokenClass, classify, source_text};
use crate::json::tokenize;

fn class_color(class: TokenClass) -> Color {
    match class {
        TokenClass::Key => Color::Cyan,
        TokenClass::String => Color::Green,
        TokenClass::Value => Color::Yellow,
        TokenClass::Punctuation => Color::DarkGrey,
    }
}

/// Render an entry with ANSI colors, search matches shown reversed
pub fn render_entry_ansi(entry: &LogEntry, options: &RenderOptions) -> String {
    let source = source_text(entry, options.expanded, options.indent);
    let search = options
        .search_term()
        .map(|term| CompiledFilter::new(&LogFilter::from_search(term)));
    colorize(&source, search.as_ref())
}

/// Color `text` token by token
///
/// Control characters from the payload are made visible, so the only escape
/// sequences in the output are the ones added here.
pub fn colorize(text: &str, search: Option<&CompiledFilter>) -> String {
    let tokens = tokenize(text);
    let classes = classify(&tokens);
    let mut out = String::with_capacity(text.len() * 2);

    for (token, class) in tokens.iter().zip(classes) {
        let text = printable(token.text);
        let Some(class) = class else {
            out.push_str(&text);
            continue;
        };
        let color = class_color(class);

        let matches = search.map(|f| f.find_matches(&text)).unwrap_or_default();
        let mut last = 0;
        for (start, end) in matches {
            if start > last {
                let _ = write!(out, "{}", style(&text[last..start]).with(color));
            }
            let _ = write!(out, "{}", style(&text[start..end]).with(color).reverse());
            last = end;
        }
        if last < text.len() {
            let _ = write!(out, "{}", style(&text[last..]).with(color));
        }
    }

    out
}

/// Replace control characters other than `\n` and `\t` with visible forms
///
/// C0 controls map to their Unicode control pictures (`ESC` becomes `␛`),
/// `DEL` to `␡`, and C1 controls to `\u{..}` escapes.
fn printable(text: &str) -> Cow<'_, str> {
    let is_unsafe = |c: char| c.is_control() && c != '\n' && c != '\t';
    if !text.contains(is_unsafe) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            c if !is_unsafe(c) => out.push(c),
            '\u{0}'..='\u{1f}' => {
                out.push(char::from_u32(0x2400 + c as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
            }
            '\u{7f}' => out.push('\u{2421}'),
            _ => out.extend(c.escape_unicode()),
        }
    }
    Cow::Owned(out)
}
