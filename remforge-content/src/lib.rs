//! Loads YAML course outlines into the core topic tree and rejects input
//! that is too thin to generate from.

use log::debug;
use remforge_core::{ContentError, Difficulty, Topic};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Topics with less content than this carry too little signal to prompt from.
pub const MIN_CONTENT_LEN: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
    pub metadata: Metadata,
    pub topics: Vec<Topic>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Metadata {
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
}

pub fn load_course(path: &Path) -> Result<Course, ContentError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| ContentError::Io(format!("{}: {e}", path.display())))?;
    parse_course(&raw)
}

pub fn parse_course(raw: &str) -> Result<Course, ContentError> {
    let mut course: Course =
        serde_yaml::from_str(raw).map_err(|e| ContentError::Parse(e.to_string()))?;
    normalize_course(&mut course);
    validate_course(&course)?;
    debug!(
        "parsed course '{}' with {} top-level topics",
        course.metadata.subject,
        course.topics.len()
    );
    Ok(course)
}

pub fn validate_course(course: &Course) -> Result<(), ContentError> {
    if course.metadata.subject.is_empty() {
        return Err(invalid("metadata.subject", "subject must not be empty"));
    }
    if course.topics.is_empty() {
        return Err(invalid("topics", "course has no topics"));
    }
    for (i, topic) in course.topics.iter().enumerate() {
        validate_topic(topic, &format!("topics[{i}]"))?;
    }
    Ok(())
}

fn validate_topic(topic: &Topic, path: &str) -> Result<(), ContentError> {
    if topic.name.is_empty() {
        return Err(invalid(path, "topic name must not be empty"));
    }
    if topic.content.chars().count() < MIN_CONTENT_LEN {
        return Err(invalid(
            path,
            format!("content shorter than {MIN_CONTENT_LEN} characters"),
        ));
    }
    for (i, sub) in topic.subtopics.iter().enumerate() {
        validate_topic(sub, &format!("{path}.subtopics[{i}]"))?;
    }
    Ok(())
}

fn normalize_course(course: &mut Course) {
    course.metadata.subject = course.metadata.subject.trim().to_string();
    for topic in &mut course.topics {
        normalize_topic(topic);
    }
}

fn normalize_topic(topic: &mut Topic) {
    topic.name = topic.name.trim().to_string();
    topic.content = topic.content.trim().to_string();
    for sub in &mut topic.subtopics {
        normalize_topic(sub);
    }
}

fn invalid(path: &str, reason: impl Into<String>) -> ContentError {
    ContentError::InvalidTopic {
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// Shape summary of a loaded course, for `validate` output and dry runs.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ContentStats {
    pub total_topics: u64,
    pub max_depth: u64,
    pub total_examples: u64,
    pub total_key_concepts: u64,
    pub content_chars: u64,
    pub by_difficulty: BTreeMap<Difficulty, u64>,
}

pub fn course_stats(course: &Course) -> ContentStats {
    let mut stats = ContentStats::default();
    for topic in &course.topics {
        add_topic_stats(topic, 0, &mut stats);
    }
    stats
}

fn add_topic_stats(topic: &Topic, depth: u64, stats: &mut ContentStats) {
    stats.total_topics += 1;
    stats.max_depth = stats.max_depth.max(depth);
    stats.total_examples += topic.examples.len() as u64;
    stats.total_key_concepts += topic.key_concepts.len() as u64;
    stats.content_chars += topic.content.chars().count() as u64;
    *stats.by_difficulty.entry(topic.difficulty).or_insert(0) += 1;
    for sub in &topic.subtopics {
        add_topic_stats(sub, depth + 1, stats);
    }
}
