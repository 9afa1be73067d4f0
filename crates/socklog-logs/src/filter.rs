use regex::{Regex, RegexBuilder};

use socklog_types::{LogEntry, LogFilter};

/// Compiled form of a [`LogFilter`]
///
/// The search term is matched literally and case-insensitively against the
/// raw frame text. Case-insensitivity uses Unicode simple case folding, so
/// `s` also matches `ſ` and `k` matches the Kelvin sign `K`.
#[derive(Clone)]
pub struct CompiledFilter {
    /// Literal, case-insensitive pattern (if any)
    regex: Option<Regex>,

    /// Lowercased term, used when the pattern exceeds regex size limits
    fallback: Option<String>,

    /// Filter this was compiled from
    filter: LogFilter,
}

impl CompiledFilter {
    pub fn new(filter: &LogFilter) -> Self {
        let mut compiled = Self {
            regex: None,
            fallback: None,
            filter: filter.clone(),
        };

        if let Some(term) = filter.search_term() {
            match literal_pattern(term) {
                Ok(re) => compiled.regex = Some(re),
                Err(err) => {
                    tracing::debug!("search term too large for regex, using substring scan: {err}");
                    compiled.fallback = Some(term.to_lowercase());
                }
            }
        }

        compiled
    }

    /// Check if a log entry matches this filter
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.matches_text(&entry.raw)
    }

    pub fn matches_text(&self, text: &str) -> bool {
        match (&self.regex, &self.fallback) {
            (Some(re), _) => re.is_match(text),
            (None, Some(term)) => text.to_lowercase().contains(term.as_str()),
            (None, None) => true,
        }
    }

    /// Find all match positions in a string (for highlighting)
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.regex {
            Some(re) => re
                .find_iter(text)
                .filter(|m| !m.is_empty())
                .map(|m| (m.start(), m.end()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Get the filter this was compiled from
    pub fn filter(&self) -> &LogFilter {
        &self.filter
    }

    /// Check if filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.regex.is_none() && self.fallback.is_none()
    }
}

impl Default for CompiledFilter {
    fn default() -> Self {
        Self::new(&LogFilter::default())
    }
}

impl std::fmt::Debug for CompiledFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFilter")
            .field("search", &self.filter.search)
            .finish()
    }
}

/// Case-insensitive regex matching `term` literally
pub(crate) fn literal_pattern(term: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
}
