use std::time::Duration;

use async_trait::async_trait;

use crate::debounce::Debouncer;
use crate::models::Suggestion;

pub const DEFAULT_MIN_CHARS: usize = 2;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Caller-supplied lookup behind an autocomplete field.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn fetch(&self, query: &str) -> Vec<Suggestion>;
}

/// Identifies one lookup. Results are applied only while the ticket's
/// generation is still the field's latest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    generation: u64,
    pub query: String,
}

/// Text input with a suggestion panel. The typed value is always reflected
/// immediately; lookups run on the debounced value.
pub struct AutocompleteField {
    value: String,
    open: bool,
    items: Vec<Suggestion>,
    min_chars: usize,
    generation: u64,
    torn_down: bool,
    debouncer: Debouncer<String>,
}

impl AutocompleteField {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            value: initial.into(),
            open: false,
            items: Vec::new(),
            min_chars: DEFAULT_MIN_CHARS,
            generation: 0,
            torn_down: false,
            debouncer: Debouncer::new(DEFAULT_DEBOUNCE),
        }
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    pub fn with_debounce(mut self, quiet: Duration) -> Self {
        self.debouncer = Debouncer::new(quiet);
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn items(&self) -> &[Suggestion] {
        &self.items
    }

    /// What the panel shows: nothing unless it is open and has entries.
    pub fn visible_items(&self) -> &[Suggestion] {
        if self.open {
            self.items.as_slice()
        } else {
            &[]
        }
    }

    pub fn on_change_text(&mut self, text: impl Into<String>) {
        if self.torn_down {
            return;
        }
        self.value = text.into();
        self.open = true;
        self.debouncer.push(self.value.clone());
    }

    /// Starts a lookup for a settled value. Values shorter than the minimum
    /// close the panel and return `None`; no fetch should be issued.
    pub fn begin_query(&mut self, debounced: &str) -> Option<QueryTicket> {
        if self.torn_down {
            return None;
        }
        self.generation += 1;

        let query = debounced.trim();
        if query.chars().count() < self.min_chars {
            self.items.clear();
            self.open = false;
            return None;
        }

        Some(QueryTicket {
            generation: self.generation,
            query: query.to_string(),
        })
    }

    /// Applies lookup results unless a newer lookup started, a suggestion was
    /// selected, or the field was torn down in the meantime.
    pub fn apply_results(&mut self, ticket: &QueryTicket, items: Vec<Suggestion>) -> bool {
        if self.torn_down || ticket.generation != self.generation {
            tracing::trace!(query = %ticket.query, "discarding superseded suggestions");
            return false;
        }
        self.open = !items.is_empty();
        self.items = items;
        true
    }

    pub async fn settle(&mut self, debounced: &str, source: &dyn SuggestionSource) {
        let Some(ticket) = self.begin_query(debounced) else {
            return;
        };
        let items = source.fetch(&ticket.query).await;
        self.apply_results(&ticket, items);
    }

    /// Waits for the next debounced value and settles it. Returns `false`
    /// once the field is torn down.
    pub async fn pump(&mut self, source: &dyn SuggestionSource) -> bool {
        if self.torn_down {
            return false;
        }
        match self.debouncer.recv().await {
            Some(debounced) => {
                self.settle(&debounced, source).await;
                true
            }
            None => false,
        }
    }

    pub fn select(&mut self, suggestion: &Suggestion) {
        self.value = suggestion.label.clone();
        self.open = false;
        // Typing that has not settled yet, and lookups in flight, no longer
        // describe the field.
        self.debouncer.cancel();
        self.generation += 1;
    }

    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.open = false;
        self.debouncer.cancel();
    }
}
