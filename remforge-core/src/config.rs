use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KindToggles {
    pub concept: bool,
    pub basic: bool,
    pub cloze: bool,
    pub descriptor: bool,
    pub multiline_concept: bool,
    pub list_answer: bool,
    pub multiple_choice: bool,
}

impl KindToggles {
    /// Every kind disabled. Handy as a starting point when only a few kinds
    /// are wanted.
    pub fn none() -> Self {
        Self {
            concept: false,
            basic: false,
            cloze: false,
            descriptor: false,
            multiline_concept: false,
            list_answer: false,
            multiple_choice: false,
        }
    }
}

impl Default for KindToggles {
    fn default() -> Self {
        Self {
            concept: true,
            basic: true,
            cloze: true,
            descriptor: true,
            multiline_concept: true,
            list_answer: true,
            multiple_choice: true,
        }
    }
}

/// Resolved generation settings, one named field per knob. Built once by the
/// caller; the policy never reads files or environment variables itself.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub kinds: KindToggles,
    pub concept_separator: String,
    pub basic_separator: String,
    pub max_basic_cards: usize,
    pub max_cloze_cards: usize,
    pub max_descriptor_cards: usize,
    /// Content length above which a multiline concept card is produced.
    pub multiline_threshold: usize,
    pub min_choice_examples: usize,
    pub max_choice_items: usize,
    pub concept_temperature: f32,
    pub basic_temperature: f32,
    pub cloze_temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            kinds: KindToggles::default(),
            concept_separator: "::".to_string(),
            basic_separator: ">>".to_string(),
            max_basic_cards: 3,
            max_cloze_cards: 2,
            max_descriptor_cards: 3,
            multiline_threshold: 200,
            min_choice_examples: 3,
            max_choice_items: 4,
            concept_temperature: 0.3,
            basic_temperature: 0.4,
            cloze_temperature: 0.3,
        }
    }
}
