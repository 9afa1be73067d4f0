use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use socklog_types::{ArcLogEntry, LogFilter};

use crate::emitter::{Emitter, Subscription, SubscriptionId};
use crate::filter::CompiledFilter;

/// Default number of retained entries
pub const DEFAULT_CAPACITY: usize = 1000;

/// Change notifications published by [`LogStore`]
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    /// An entry was retained; carries the entry, not the filtered view
    LogAdded(ArcLogEntry),
    FilterChanged(LogFilter),
    PauseChanged(bool),
    LogsCleared,
}

struct StoreState {
    /// Newest first
    entries: VecDeque<ArcLogEntry>,
    filter: CompiledFilter,
    paused: bool,
}

/// Bounded, newest-first log store with live filter and pause
///
/// Clones share the same entries and subscribers, so controls and renderers
/// can each hold a handle.
#[derive(Clone)]
pub struct LogStore {
    state: Arc<RwLock<StoreState>>,

    /// Maximum retained entries, at least 1
    capacity: usize,

    events: Arc<Emitter<StoreEvent>>,
}

impl LogStore {
    /// Create a new store retaining at most `capacity` entries
    ///
    /// A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            tracing::warn!("log store capacity 0 is invalid, clamping to 1");
            1
        } else {
            capacity
        };

        Self {
            state: Arc::new(RwLock::new(StoreState {
                entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
                filter: CompiledFilter::default(),
                paused: false,
            })),
            capacity,
            events: Arc::new(Emitter::new()),
        }
    }

    pub fn subscribe(&self) -> Subscription<StoreEvent> {
        self.events.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Add an entry as the newest, evicting the oldest beyond capacity
    ///
    /// Dropped silently while paused.
    pub fn add(&self, entry: impl Into<ArcLogEntry>) {
        let mut state = self.state.write();
        if state.paused {
            return;
        }

        let entry = entry.into();
        state.entries.push_front(Arc::clone(&entry));
        if state.entries.len() > self.capacity {
            state.entries.pop_back();
        }

        // Emitting under the lock keeps notification order equal to mutation order
        self.events.emit(StoreEvent::LogAdded(entry));
    }

    /// Clear all entries
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        self.events.emit(StoreEvent::LogsCleared);
    }

    /// Get all entries, newest first
    pub fn all(&self) -> Vec<ArcLogEntry> {
        self.state.read().entries.iter().cloned().collect()
    }

    /// Get entries matching the current filter, newest first
    pub fn filtered(&self) -> Vec<ArcLogEntry> {
        let state = self.state.read();
        state
            .entries
            .iter()
            .filter(|e| state.filter.matches(e))
            .cloned()
            .collect()
    }

    /// Current filter
    pub fn filter(&self) -> LogFilter {
        self.state.read().filter.filter().clone()
    }

    /// Replace the filter; entries are untouched
    pub fn set_filter(&self, filter: LogFilter) {
        let mut state = self.state.write();
        state.filter = CompiledFilter::new(&filter);
        self.events.emit(StoreEvent::FilterChanged(filter));
    }

    /// Set the filter from search box text
    pub fn set_search(&self, text: &str) {
        self.set_filter(LogFilter::from_search(text));
    }

    pub fn is_paused(&self) -> bool {
        self.state.read().paused
    }

    /// Pause or resume ingestion; stored entries are unaffected
    pub fn set_paused(&self, paused: bool) {
        let mut state = self.state.write();
        state.paused = paused;
        self.events.emit(StoreEvent::PauseChanged(paused));
    }

    /// Flip the pause flag, returning the new value
    pub fn toggle_pause(&self) -> bool {
        let mut state = self.state.write();
        state.paused = !state.paused;
        let paused = state.paused;
        self.events.emit(StoreEvent::PauseChanged(paused));
        paused
    }

    /// Retained entry count (before filtering)
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
