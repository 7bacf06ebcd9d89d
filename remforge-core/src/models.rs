use serde::{Deserialize, Serialize};

pub const FINGERPRINT_LEN: usize = 8;
pub const FINGERPRINT_SEP: &str = "||";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Concept,
    Basic,
    Cloze,
    Descriptor,
    MultilineConcept,
    ListAnswer,
    MultipleChoice,
}

impl CardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Concept => "concept",
            CardKind::Basic => "basic",
            CardKind::Cloze => "cloze",
            CardKind::Descriptor => "descriptor",
            CardKind::MultilineConcept => "multiline_concept",
            CardKind::ListAnswer => "list_answer",
            CardKind::MultipleChoice => "multiple_choice",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
    Bidirectional,
    Disabled,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Bidirectional => "bidirectional",
            Direction::Disabled => "disabled",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub subtopics: Vec<Topic>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub key_concepts: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Topic {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            subtopics: Vec::new(),
            examples: Vec::new(),
            key_concepts: Vec::new(),
            difficulty: Difficulty::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
    pub kind: CardKind,
    pub front: String,
    pub back: String,
    /// Weak reference: matched by value against other cards' text at
    /// format time, never an owning link.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub list_items: Vec<String>,
    #[serde(default)]
    pub correct_choice_index: usize,
    /// Emit multiline concepts as `front :::` instead of an indented
    /// `front ::` block.
    #[serde(default)]
    pub triple_delimiter: bool,
    /// Supplementary text attached below the card as an Extra Card Detail
    /// reference. Not part of the card identity.
    #[serde(default)]
    pub extra_detail: Option<String>,
}

impl Flashcard {
    pub fn new(kind: CardKind, front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            kind,
            front: front.into(),
            back: back.into(),
            parent: None,
            tags: Vec::new(),
            difficulty: Difficulty::default(),
            direction: Direction::default(),
            list_items: Vec::new(),
            correct_choice_index: 0,
            triple_delimiter: false,
            extra_detail: None,
        }
    }

    /// Short deterministic digest over the defining fields, used for
    /// deduplication. Equal fields always hash equal.
    pub fn fingerprint(&self) -> String {
        let mut content = format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.front,
            self.back,
            self.kind.as_str(),
            self.direction.as_str(),
            sep = FINGERPRINT_SEP,
        );
        if !self.list_items.is_empty() {
            content.push_str(FINGERPRINT_SEP);
            content.push_str(&self.list_items.join(","));
        }
        let digest = format!("{:x}", md5::compute(content.as_bytes()));
        digest[..FINGERPRINT_LEN].to_string()
    }

    /// Whether the serializer can emit this card at all. List-style cards
    /// need at least one item; everything except cloze and list kinds needs
    /// a back side.
    pub fn is_emittable(&self) -> bool {
        if self.front.trim().is_empty() {
            return false;
        }
        match self.kind {
            CardKind::ListAnswer | CardKind::MultipleChoice => !self.list_items.is_empty(),
            CardKind::Cloze => true,
            _ => !self.back.trim().is_empty(),
        }
    }
}
