use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{CardKind, Direction, Flashcard};

/// Counters for one generation session.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationStats {
    pub total_cards: u64,
    pub by_kind: BTreeMap<CardKind, u64>,
    pub topics_processed: u64,
    pub provider_calls: u64,
    /// Card kinds that failed and yielded nothing. Lets a caller tell a
    /// topic with nothing to teach apart from a topic whose kinds all broke.
    pub kind_failures: u64,
}

impl GenerationStats {
    pub fn record(&mut self, card: &Flashcard) {
        self.total_cards += 1;
        *self.by_kind.entry(card.kind).or_default() += 1;
    }
}

/// Snapshot recomputed from scratch on every format call.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatStats {
    pub total_cards: u64,
    pub by_kind: BTreeMap<CardKind, u64>,
    pub by_direction: BTreeMap<Direction, u64>,
    /// Distinct parent strings seen, a proxy for hierarchy depth.
    pub parent_groups: u64,
    pub escaped_cards: u64,
}

impl FormatStats {
    pub(crate) fn record(&mut self, card: &Flashcard, escaped: bool) {
        self.total_cards += 1;
        *self.by_kind.entry(card.kind).or_default() += 1;
        *self.by_direction.entry(card.direction).or_default() += 1;
        if escaped {
            self.escaped_cards += 1;
        }
    }
}
