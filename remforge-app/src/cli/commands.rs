use crate::cli::opts::*;
use crate::config::{AppConfig, OutputSettings};

use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use remforge_anthropic::AnthropicGenerator;
use remforge_content::{course_stats, load_course, Course};
use remforge_core::{
    CardGenerator, CardKind, FormatStats, GenerationConfig, GenerationSession, ProviderConfig,
    ProviderInfo, RemNoteFormatter, TextGenerator, Topic,
};
use remforge_openai::OpenAiGenerator;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn run_cli(args: Cli) -> Result<()> {
    let config = AppConfig::load(args.config.as_deref())?;
    match args.cmd {
        Command::Generate(cmd) => cmd_generate(config, cmd).await,
        Command::Validate(cmd) => cmd_validate(cmd),
    }
}

async fn cmd_generate(mut config: AppConfig, args: GenerateArgs) -> Result<()> {
    if let Some(kind) = args.provider {
        config.provider.provider = kind;
    }

    let course = load_course(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    info!(
        "loaded '{}' ({} top-level topics)",
        course.metadata.subject,
        course.topics.len()
    );

    if args.dry_run {
        print_dry_run(&course, &config.generation);
        return Ok(());
    }

    let provider = open_provider(&config, args.model.as_deref())?;
    let generator = CardGenerator::new(provider.clone(), config.generation.clone())
        .with_backoff(config.backoff());

    let mut session = GenerationSession::new();
    let mut cards = Vec::new();
    for topic in &course.topics {
        info!("generating cards for '{}'", topic.name);
        cards.extend(generator.generate(topic, None, &mut session).await);
    }

    let hierarchy = config.output.hierarchy && !args.flat;
    let mut formatter = RemNoteFormatter::new();
    let document = formatter.format_cards(&cards, hierarchy);

    write_output(&args.output, &course, &config.output, formatter.stats(), &document)?;
    print_summary(&session, formatter.stats(), provider.info());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> Result<()> {
    let course = load_course(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let stats = course_stats(&course);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("subject:        {}", course.metadata.subject);
    println!("topics:         {}", stats.total_topics);
    println!("max depth:      {}", stats.max_depth);
    println!("examples:       {}", stats.total_examples);
    println!("key concepts:   {}", stats.total_key_concepts);
    println!("content chars:  {}", stats.content_chars);
    for (difficulty, count) in &stats.by_difficulty {
        println!("  {:<13} {}", difficulty.as_str(), count);
    }
    println!("ok");
    Ok(())
}

// ===== Helpers =====

fn open_provider(config: &AppConfig, cli_model: Option<&str>) -> Result<Arc<dyn TextGenerator>> {
    let kind = config.provider.provider;
    let provider_config = ProviderConfig {
        model: resolve_model(kind, cli_model, &config.provider.model),
        api_key: api_key(kind)?,
        max_tokens: config.provider.max_tokens,
        timeout: Duration::from_secs(config.provider.timeout_secs),
    };
    match kind {
        ProviderKind::Openai => {
            let g = OpenAiGenerator::new(provider_config)?;
            Ok(Arc::new(g))
        }
        ProviderKind::Anthropic => {
            let g = AnthropicGenerator::new(provider_config)?;
            Ok(Arc::new(g))
        }
    }
}

fn resolve_model(kind: ProviderKind, cli: Option<&str>, configured: &str) -> String {
    if let Some(model) = cli {
        return model.to_string();
    }
    if !configured.is_empty() {
        return configured.to_string();
    }
    match kind {
        ProviderKind::Openai => "gpt-4o-mini".to_string(),
        ProviderKind::Anthropic => "claude-3-5-haiku-latest".to_string(),
    }
}

fn api_key(kind: ProviderKind) -> Result<String> {
    let var = match kind {
        ProviderKind::Openai => "OPENAI_API_KEY",
        ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
    };
    std::env::var(var).with_context(|| format!("{var} is not set; export it or add it to .env"))
}

fn print_dry_run(course: &Course, config: &GenerationConfig) {
    println!("dry run: no provider calls will be made\n");
    println!("{}", course.metadata.subject);
    for topic in &course.topics {
        print_topic_tree(topic, 1);
    }
    let mut by_kind = BTreeMap::new();
    for topic in &course.topics {
        estimate_cards(topic, config, &mut by_kind);
    }
    let total: u64 = by_kind.values().sum();
    println!("\nestimated cards: up to {total}");
    for (kind, count) in &by_kind {
        println!("  {:<18} up to {}", kind.as_str(), count);
    }
}

fn print_topic_tree(topic: &Topic, level: usize) {
    println!(
        "{}- {} ({} chars, {} concepts, {} examples)",
        "  ".repeat(level),
        topic.name,
        topic.content.chars().count(),
        topic.key_concepts.len(),
        topic.examples.len()
    );
    for sub in &topic.subtopics {
        print_topic_tree(sub, level + 1);
    }
}

fn estimate_cards(topic: &Topic, config: &GenerationConfig, by_kind: &mut BTreeMap<CardKind, u64>) {
    let kinds = &config.kinds;
    if kinds.concept {
        *by_kind.entry(CardKind::Concept).or_default() += 1;
    }
    if kinds.basic && config.max_basic_cards > 0 {
        *by_kind.entry(CardKind::Basic).or_default() += config.max_basic_cards as u64;
    }
    if kinds.cloze
        && config.max_cloze_cards > 0
        && (!topic.key_concepts.is_empty() || !topic.examples.is_empty())
    {
        *by_kind.entry(CardKind::Cloze).or_default() += config.max_cloze_cards as u64;
    }
    let descriptors = topic.key_concepts.len().min(config.max_descriptor_cards);
    if kinds.descriptor && descriptors > 0 {
        *by_kind.entry(CardKind::Descriptor).or_default() += descriptors as u64;
    }
    if kinds.multiline_concept && topic.content.chars().count() > config.multiline_threshold {
        *by_kind.entry(CardKind::MultilineConcept).or_default() += 1;
    }
    if kinds.list_answer && topic.key_concepts.len() > 1 {
        *by_kind.entry(CardKind::ListAnswer).or_default() += 1;
    }
    if kinds.multiple_choice && topic.examples.len() >= config.min_choice_examples {
        *by_kind.entry(CardKind::MultipleChoice).or_default() += 1;
    }
    for sub in &topic.subtopics {
        estimate_cards(sub, config, by_kind);
    }
}

fn write_output(
    path: &Path,
    course: &Course,
    output: &OutputSettings,
    stats: &FormatStats,
    document: &str,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let mut out = String::new();
    if output.stats_header {
        out.push_str(&import_header(course, stats));
    }
    out.push_str(document);
    if !document.ends_with('\n') {
        out.push('\n');
    }
    std::fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {} cards to {}", stats.total_cards, path.display());
    Ok(())
}

fn import_header(course: &Course, stats: &FormatStats) -> String {
    let kinds: Vec<String> = stats
        .by_kind
        .iter()
        .map(|(kind, count)| format!("{count} {}", kind.as_str()))
        .collect();

    let mut header = String::new();
    header.push_str("# RemNote Flashcard Import\n");
    header.push_str(&format!("# Subject: {}\n", course.metadata.subject));
    header.push_str(&format!(
        "# Generated on: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    header.push_str(&format!("# Total cards: {}\n", stats.total_cards));
    if !kinds.is_empty() {
        header.push_str(&format!("# Cards: {}\n", kinds.join(", ")));
    }
    header.push_str(&format!("# Parent groups: {}\n", stats.parent_groups));
    header.push_str(&format!("# Escaped cards: {}\n", stats.escaped_cards));
    header.push_str("#\n");
    header.push_str("# Import: RemNote > omnibar > 'Import' > paste this file's contents\n\n");
    header
}

fn print_summary(session: &GenerationSession, stats: &FormatStats, info: ProviderInfo) {
    println!();
    println!("topics processed:   {}", session.stats.topics_processed);
    println!("cards accepted:     {}", session.stats.total_cards);
    println!("duplicates dropped: {}", session.filter.duplicates());
    println!("kind failures:      {}", session.stats.kind_failures);
    println!(
        "provider requests:  {} ({} tokens, {} {})",
        info.requests, info.total_tokens, info.name, info.model
    );
    for (kind, count) in &session.stats.by_kind {
        println!("  {:<18} {}", kind.as_str(), count);
    }
    println!("escaped cards:      {}", stats.escaped_cards);
    println!("parent groups:      {}", stats.parent_groups);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_resolution_prefers_cli_then_config() {
        assert_eq!(
            resolve_model(ProviderKind::Openai, Some("gpt-4.1"), "from-config"),
            "gpt-4.1"
        );
        assert_eq!(
            resolve_model(ProviderKind::Openai, None, "from-config"),
            "from-config"
        );
        assert_eq!(resolve_model(ProviderKind::Openai, None, ""), "gpt-4o-mini");
        assert_eq!(
            resolve_model(ProviderKind::Anthropic, None, ""),
            "claude-3-5-haiku-latest"
        );
    }

    #[test]
    fn estimate_follows_topic_shape() {
        let mut topic = Topic::new("Queues", "About queues");
        topic.key_concepts = vec!["fifo".into(), "backpressure".into()];
        topic.examples = vec!["kafka".into(), "sqs".into(), "rabbitmq".into()];
        let mut sub = Topic::new("Priority queues", "x".repeat(250));
        sub.key_concepts = vec!["heap".into()];
        topic.subtopics.push(sub);

        let config = GenerationConfig::default();
        let mut by_kind = BTreeMap::new();
        estimate_cards(&topic, &config, &mut by_kind);

        assert_eq!(by_kind[&CardKind::Concept], 2);
        assert_eq!(by_kind[&CardKind::Basic], 6);
        assert_eq!(by_kind[&CardKind::Cloze], 4);
        assert_eq!(by_kind[&CardKind::Descriptor], 3);
        assert_eq!(by_kind[&CardKind::MultilineConcept], 1);
        assert_eq!(by_kind[&CardKind::ListAnswer], 1);
        assert_eq!(by_kind[&CardKind::MultipleChoice], 1);
    }
}
