use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use log::{debug, warn};

use crate::config::GenerationConfig;
use crate::dedup::DuplicateFilter;
use crate::errors::GenError;
use crate::format::has_cloze_span;
use crate::models::{CardKind, Direction, Flashcard, Topic};
use crate::prompts::PromptSet;
use crate::provider::{Backoff, TextGenerator};
use crate::stats::GenerationStats;

/// Duplicate set and counters for one generation run. Constructed and owned
/// by the caller; never ambient state.
#[derive(Debug, Default)]
pub struct GenerationSession {
    pub filter: DuplicateFilter,
    pub stats: GenerationStats,
}

impl GenerationSession {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Decides which card kinds to attempt for a topic and turns provider
/// responses into cards. One instance serves a whole run.
pub struct CardGenerator {
    provider: Arc<dyn TextGenerator>,
    config: GenerationConfig,
    prompts: PromptSet,
    backoff: Backoff,
}

impl CardGenerator {
    pub fn new(provider: Arc<dyn TextGenerator>, config: GenerationConfig) -> Self {
        Self {
            provider,
            config,
            prompts: PromptSet::default(),
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Generate cards for a topic and all its subtopics, depth first.
    /// Subtopic cards are flattened into the returned sequence with their
    /// parent context set to the enclosing topic's name. A failing kind
    /// never aborts the walk; it is logged, counted, and yields nothing.
    pub async fn generate(
        &self,
        topic: &Topic,
        parent_context: Option<&str>,
        session: &mut GenerationSession,
    ) -> Vec<Flashcard> {
        self.generate_boxed(topic, parent_context, session).await
    }

    fn generate_boxed<'a>(
        &'a self,
        topic: &'a Topic,
        parent_context: Option<&'a str>,
        session: &'a mut GenerationSession,
    ) -> Pin<Box<dyn Future<Output = Vec<Flashcard>> + Send + 'a>> {
        Box::pin(async move {
            session.stats.topics_processed += 1;
            debug!("generating cards for '{}'", topic.name);
            let mut cards = Vec::new();

            if self.config.kinds.concept {
                match self.concept_card(topic, parent_context, &mut session.stats).await {
                    Ok(batch) => self.admit_all(batch, session, &mut cards),
                    Err(e) => note_failure(session, topic, CardKind::Concept, e),
                }
            }
            if self.config.kinds.basic {
                match self.basic_cards(topic, parent_context, &mut session.stats).await {
                    Ok(batch) => self.admit_all(batch, session, &mut cards),
                    Err(e) => note_failure(session, topic, CardKind::Basic, e),
                }
            }
            if self.config.kinds.cloze && topic_has_cloze_material(topic) {
                match self.cloze_cards(topic, parent_context, &mut session.stats).await {
                    Ok(batch) => self.admit_all(batch, session, &mut cards),
                    Err(e) => note_failure(session, topic, CardKind::Cloze, e),
                }
            }
            if self.config.kinds.descriptor {
                self.admit_all(self.descriptor_cards(topic), session, &mut cards);
            }
            if self.config.kinds.multiline_concept {
                if let Some(card) = self.multiline_card(topic, parent_context) {
                    self.admit(card, session, &mut cards);
                }
            }
            if self.config.kinds.list_answer {
                if let Some(card) = self.list_card(topic, parent_context) {
                    self.admit(card, session, &mut cards);
                }
            }
            if self.config.kinds.multiple_choice {
                if let Some(card) = self.choice_card(topic, parent_context) {
                    self.admit(card, session, &mut cards);
                }
            }

            for sub in &topic.subtopics {
                let nested = self
                    .generate_boxed(sub, Some(&topic.name), &mut *session)
                    .await;
                cards.extend(nested);
            }

            cards
        })
    }

    async fn call(
        &self,
        prompt: &str,
        temperature: f32,
        stats: &mut GenerationStats,
    ) -> Result<String, GenError> {
        stats.provider_calls += 1;
        self.provider
            .generate_with_backoff(prompt, temperature, &self.backoff)
            .await
    }

    async fn concept_card(
        &self,
        topic: &Topic,
        parent: Option<&str>,
        stats: &mut GenerationStats,
    ) -> Result<Vec<Flashcard>, GenError> {
        let separator = self.config.concept_separator.as_str();
        let prompt = self.prompts.concept_prompt(topic, parent, separator);
        let response = self.call(&prompt, self.config.concept_temperature, stats).await?;
        let (front, back) = response
            .split_once(separator)
            .ok_or(GenError::Parse("term/definition separator"))?;
        let mut card = Flashcard::new(CardKind::Concept, front.trim(), back.trim());
        card.parent = parent.map(str::to_string);
        card.tags = vec![topic.name.clone()];
        card.difficulty = topic.difficulty;
        Ok(vec![card])
    }

    async fn basic_cards(
        &self,
        topic: &Topic,
        parent: Option<&str>,
        stats: &mut GenerationStats,
    ) -> Result<Vec<Flashcard>, GenError> {
        let separator = self.config.basic_separator.as_str();
        let prompt =
            self.prompts
                .basic_prompt(topic, parent, separator, self.config.max_basic_cards);
        let response = self.call(&prompt, self.config.basic_temperature, stats).await?;
        let mut cards = Vec::new();
        for line in response.lines() {
            if cards.len() >= self.config.max_basic_cards {
                break;
            }
            let Some((front, back)) = line.split_once(separator) else {
                continue;
            };
            let mut card = Flashcard::new(CardKind::Basic, front.trim(), back.trim());
            card.parent = parent.map(str::to_string);
            card.tags = vec![topic.name.clone()];
            card.difficulty = topic.difficulty;
            cards.push(card);
        }
        if cards.is_empty() {
            return Err(GenError::Parse("question/answer separator"));
        }
        Ok(cards)
    }

    async fn cloze_cards(
        &self,
        topic: &Topic,
        parent: Option<&str>,
        stats: &mut GenerationStats,
    ) -> Result<Vec<Flashcard>, GenError> {
        let prompt = self
            .prompts
            .cloze_prompt(topic, parent, self.config.max_cloze_cards);
        let response = self.call(&prompt, self.config.cloze_temperature, stats).await?;
        let mut cards = Vec::new();
        for line in response.lines() {
            if cards.len() >= self.config.max_cloze_cards {
                break;
            }
            let line = line.trim();
            if !has_cloze_span(line) {
                continue;
            }
            // Back stays empty by convention; the span carries the answer.
            let mut card = Flashcard::new(CardKind::Cloze, line, "");
            card.parent = parent.map(str::to_string);
            card.tags = vec![topic.name.clone()];
            card.difficulty = topic.difficulty;
            cards.push(card);
        }
        if cards.is_empty() {
            return Err(GenError::Parse("cloze span"));
        }
        Ok(cards)
    }

    fn descriptor_cards(&self, topic: &Topic) -> Vec<Flashcard> {
        let mut cards = Vec::new();
        for concept in topic
            .key_concepts
            .iter()
            .take(self.config.max_descriptor_cards)
        {
            let mut card = Flashcard::new(
                CardKind::Descriptor,
                concept.clone(),
                format!("Key concept of {}", topic.name),
            );
            card.direction = Direction::Bidirectional;
            // Descriptors hang off the topic's own card in the hierarchy.
            card.parent = Some(topic.name.clone());
            card.tags = vec![topic.name.clone(), "key_concept".to_string()];
            card.difficulty = topic.difficulty;
            cards.push(card);
        }
        cards
    }

    fn multiline_card(&self, topic: &Topic, parent: Option<&str>) -> Option<Flashcard> {
        if topic.content.chars().count() <= self.config.multiline_threshold {
            return None;
        }
        let mut card = Flashcard::new(
            CardKind::MultilineConcept,
            topic.name.clone(),
            topic.content.clone(),
        );
        card.parent = parent.map(str::to_string);
        card.tags = vec![topic.name.clone(), "multiline".to_string()];
        card.difficulty = topic.difficulty;
        Some(card)
    }

    fn list_card(&self, topic: &Topic, parent: Option<&str>) -> Option<Flashcard> {
        if topic.key_concepts.len() <= 1 {
            return None;
        }
        let mut card = Flashcard::new(
            CardKind::ListAnswer,
            format!("What are the key concepts of {}?", topic.name),
            "",
        );
        card.list_items = topic.key_concepts.clone();
        card.parent = parent.map(str::to_string);
        card.tags = vec![topic.name.clone(), "list".to_string()];
        card.difficulty = topic.difficulty;
        Some(card)
    }

    fn choice_card(&self, topic: &Topic, parent: Option<&str>) -> Option<Flashcard> {
        if topic.examples.len() < self.config.min_choice_examples {
            return None;
        }
        let mut card = Flashcard::new(
            CardKind::MultipleChoice,
            format!("Which is an example of {}?", topic.name),
            "",
        );
        card.list_items = topic
            .examples
            .iter()
            .take(self.config.max_choice_items)
            .cloned()
            .collect();
        card.correct_choice_index = 0;
        card.parent = parent.map(str::to_string);
        card.tags = vec![topic.name.clone(), "multiple_choice".to_string()];
        card.difficulty = topic.difficulty;
        Some(card)
    }

    fn admit(&self, card: Flashcard, session: &mut GenerationSession, out: &mut Vec<Flashcard>) {
        if session.filter.admit(&card) {
            session.stats.record(&card);
            out.push(card);
        }
    }

    fn admit_all(
        &self,
        batch: Vec<Flashcard>,
        session: &mut GenerationSession,
        out: &mut Vec<Flashcard>,
    ) {
        for card in batch {
            self.admit(card, session, out);
        }
    }
}

fn topic_has_cloze_material(topic: &Topic) -> bool {
    !topic.key_concepts.is_empty() || !topic.examples.is_empty()
}

fn note_failure(session: &mut GenerationSession, topic: &Topic, kind: CardKind, err: GenError) {
    warn!(
        "{} generation failed for '{}': {}",
        kind.as_str(),
        topic.name,
        err
    );
    session.stats.kind_failures += 1;
}
