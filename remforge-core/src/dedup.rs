use std::collections::HashSet;

use crate::models::Flashcard;

/// Session-scoped duplicate filter over card fingerprints. Owned by one
/// generation session, never shared across runs.
#[derive(Clone, Debug, Default)]
pub struct DuplicateFilter {
    seen: HashSet<String>,
    duplicates: u64,
}

impl DuplicateFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the card's fingerprint has not been registered yet. A repeat
    /// bumps the duplicate counter.
    pub fn is_new(&mut self, card: &Flashcard) -> bool {
        if self.seen.contains(&card.fingerprint()) {
            self.duplicates += 1;
            false
        } else {
            true
        }
    }

    pub fn register(&mut self, card: &Flashcard) {
        self.seen.insert(card.fingerprint());
    }

    /// Accept and register the card if unseen; otherwise drop it and count
    /// a duplicate.
    pub fn admit(&mut self, card: &Flashcard) -> bool {
        if self.is_new(card) {
            self.register(card);
            true
        } else {
            false
        }
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
