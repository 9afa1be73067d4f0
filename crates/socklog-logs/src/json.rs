//! Flat JSON tokenizer used for highlighting.
//!
//! This is a scanner, not a parser: it never builds a tree and never fails.
//! Input that is not valid JSON still tokenizes, with anything unrecognised
//! falling into [`TokenKind::Value`]. Concatenating the token texts always
//! reproduces the input exactly.

/// Lexical class of a token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Whitespace,
    /// One of `{ } [ ] : ,`
    Punctuation,
    /// A double-quoted string, quotes included
    String,
    /// Numbers, literals and any malformed fragment
    Value,
}

/// A slice of the input with its class
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

fn is_structural(c: char) -> bool {
    matches!(c, '{' | '}' | '[' | ']' | ':' | ',')
}

fn is_value_char(c: char) -> bool {
    !c.is_whitespace() && !is_structural(c) && c != '"'
}

/// Split `input` into tokens, left to right
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = input;

    while let Some(first) = rest.chars().next() {
        let (kind, len) = if first.is_whitespace() {
            (TokenKind::Whitespace, run_length(rest, char::is_whitespace))
        } else if is_structural(first) {
            (TokenKind::Punctuation, first.len_utf8())
        } else if first == '"' {
            match string_length(rest) {
                Some(len) => (TokenKind::String, len),
                // Unterminated string: keep the remainder as one value
                None => (TokenKind::Value, rest.len()),
            }
        } else {
            (TokenKind::Value, run_length(rest, is_value_char))
        };

        let (text, tail) = rest.split_at(len);
        tokens.push(Token { kind, text });
        rest = tail;
    }

    tokens
}

/// Byte length of the leading run of chars satisfying `pred`
fn run_length(s: &str, pred: impl Fn(char) -> bool) -> usize {
    s.char_indices()
        .find(|&(_, c)| !pred(c))
        .map_or(s.len(), |(i, _)| i)
}

/// Byte length of the quoted string at the start of `s`, closing quote
/// included, or `None` if it never closes
fn string_length(s: &str) -> Option<usize> {
    let mut chars = s.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => return Some(i + 1),
            _ => {}
        }
    }
    None
}
