use crate::models::Topic;

/// Longest slice of topic content a concept prompt carries.
pub const CONCEPT_CONTENT_LIMIT: usize = 500;
/// Longest slice of topic content a cloze prompt carries.
pub const CLOZE_CONTENT_LIMIT: usize = 300;

const BASIC_EXAMPLE_LIMIT: usize = 3;
const BASIC_CONCEPT_LIMIT: usize = 5;

const CONCEPT_TEMPLATE: &str = "\
Write exactly one concept flashcard for the topic \"{topic}\"{context}.

Material:
{content}

Answer with a single line of the form:
Term {separator} Definition

Use the topic's key term on the left and a definition of at most 25 words on the right.";

const BASIC_TEMPLATE: &str = "\
Write up to {max} question-and-answer flashcards about \"{topic}\"{context}.

Material:
{content}
{examples}{concepts}
Answer with one card per line of the form:
Question {separator} Answer";

const CLOZE_TEMPLATE: &str = "\
Write up to {max} cloze deletion sentences about \"{topic}\"{context}.

Material:
{content}

Wrap the hidden term of each sentence in double curly braces, for example:
The capital of France is {{Paris}}.
Answer with one sentence per line.";

/// Prompt templates for the kinds that call the text-generation capability.
///
/// Recognized placeholders: `{topic}`, `{content}`, `{context}`,
/// `{separator}`, `{max}`, `{examples}`, `{concepts}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptSet {
    pub concept: String,
    pub basic: String,
    pub cloze: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            concept: CONCEPT_TEMPLATE.to_string(),
            basic: BASIC_TEMPLATE.to_string(),
            cloze: CLOZE_TEMPLATE.to_string(),
        }
    }
}

impl PromptSet {
    pub fn concept_prompt(&self, topic: &Topic, parent: Option<&str>, separator: &str) -> String {
        self.concept
            .replace("{topic}", &topic.name)
            .replace("{content}", &truncate(&topic.content, CONCEPT_CONTENT_LIMIT))
            .replace("{context}", &context_note(parent))
            .replace("{separator}", separator)
    }

    pub fn basic_prompt(
        &self,
        topic: &Topic,
        parent: Option<&str>,
        separator: &str,
        max: usize,
    ) -> String {
        self.basic
            .replace("{topic}", &topic.name)
            .replace("{content}", &topic.content)
            .replace("{context}", &context_note(parent))
            .replace("{separator}", separator)
            .replace("{max}", &max.to_string())
            .replace("{examples}", &listed("Examples", &topic.examples, BASIC_EXAMPLE_LIMIT))
            .replace(
                "{concepts}",
                &listed("Key concepts", &topic.key_concepts, BASIC_CONCEPT_LIMIT),
            )
    }

    pub fn cloze_prompt(&self, topic: &Topic, parent: Option<&str>, max: usize) -> String {
        self.cloze
            .replace("{topic}", &topic.name)
            .replace("{content}", &truncate(&topic.content, CLOZE_CONTENT_LIMIT))
            .replace("{context}", &context_note(parent))
            .replace("{max}", &max.to_string())
    }
}

fn context_note(parent: Option<&str>) -> String {
    match parent {
        Some(name) => format!(" (part of {name})"),
        None => String::new(),
    }
}

fn listed(label: &str, entries: &[String], limit: usize) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let shown: Vec<&str> = entries.iter().take(limit).map(String::as_str).collect();
    format!("{label}: {}\n", shown.join(", "))
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
