use remforge_core::{escape_text, CardKind, Direction, Flashcard, RemNoteFormatter};

fn card(kind: CardKind, front: &str, back: &str) -> Flashcard {
    Flashcard::new(kind, front, back)
}

fn bidi(kind: CardKind, front: &str, back: &str) -> Flashcard {
    let mut c = card(kind, front, back);
    c.direction = Direction::Bidirectional;
    c
}

#[test]
fn concept_directions_follow_the_table() {
    let mut f = RemNoteFormatter::new();
    let mut c = card(CardKind::Concept, "Lambda Architecture", "Data pattern");

    c.direction = Direction::Bidirectional;
    assert_eq!(
        f.format_cards(&[c.clone()], false),
        "Lambda Architecture :: Data pattern"
    );
    c.direction = Direction::Forward;
    assert_eq!(
        f.format_cards(&[c.clone()], false),
        "Lambda Architecture :> Data pattern"
    );
    c.direction = Direction::Backward;
    assert_eq!(
        f.format_cards(&[c.clone()], false),
        "Lambda Architecture :< Data pattern"
    );
    c.direction = Direction::Disabled;
    assert_eq!(
        f.format_cards(&[c], false),
        "Lambda Architecture =- Data pattern"
    );
}

#[test]
fn basic_and_descriptor_directions_follow_the_table() {
    let mut f = RemNoteFormatter::new();

    let mut b = card(CardKind::Basic, "Q", "A");
    assert_eq!(f.format_cards(&[b.clone()], false), "Q >> A");
    b.direction = Direction::Backward;
    assert_eq!(f.format_cards(&[b.clone()], false), "Q << A");
    b.direction = Direction::Bidirectional;
    assert_eq!(f.format_cards(&[b], false), "Q <> A");

    let mut d = card(CardKind::Descriptor, "F", "B");
    assert_eq!(f.format_cards(&[d.clone()], false), "F ;> B");
    d.direction = Direction::Backward;
    assert_eq!(f.format_cards(&[d.clone()], false), "F ;< B");
    d.direction = Direction::Bidirectional;
    assert_eq!(f.format_cards(&[d.clone()], false), "F ;; B");
    d.direction = Direction::Disabled;
    assert_eq!(f.format_cards(&[d], false), "F =- B");
}

#[test]
fn separator_tokens_are_escaped() {
    let mut f = RemNoteFormatter::new();
    let c = card(CardKind::Basic, "A::B", "C");
    assert_eq!(f.format_cards(&[c], false), "A: :B >> C");
    assert_eq!(f.stats().escaped_cards, 1);
}

#[test]
fn repeated_tokens_are_fully_neutralized() {
    let (escaped, changed) = escape_text("a:::b and c>>>>d plus <<< and ;;; or <><> #[[x]]");
    assert!(changed);
    for token in ["::", ">>", "<<", ";;", "<>", "#[[", "]]"] {
        assert!(!escaped.contains(token), "token {token:?} survived in {escaped:?}");
    }
}

#[test]
fn escaping_preserves_validated_cloze_spans() {
    let (escaped, changed) = escape_text("keep {{a::b}} but :: not this");
    assert!(changed);
    assert!(escaped.contains("{{a::b}}"));
    assert!(escaped.ends_with(": : not this"));
}

#[test]
fn valid_cloze_front_passes_verbatim() {
    let mut f = RemNoteFormatter::new();
    let c = card(CardKind::Cloze, "X causes {{Y}}", "");
    assert_eq!(f.format_cards(&[c], false), "X causes {{Y}}");
    assert_eq!(f.stats().escaped_cards, 0);
}

#[test]
fn broken_cloze_front_is_escaped_plain_text() {
    let mut f = RemNoteFormatter::new();
    let c = card(CardKind::Cloze, "X {{Y :: Z", "");
    assert_eq!(f.format_cards(&[c], false), "X {{Y : : Z");
    assert_eq!(f.stats().escaped_cards, 1);
}

#[test]
fn multiline_double_mode_indents_the_block() {
    let mut f = RemNoteFormatter::new();
    let c = card(CardKind::MultilineConcept, "Kafka", "A log.\\nA bus.");
    assert_eq!(
        f.format_cards(&[c], false),
        "Kafka ::\n    A log.\n    A bus."
    );
}

#[test]
fn multiline_triple_mode_uses_triple_delimiter() {
    let mut f = RemNoteFormatter::new();
    let mut c = card(CardKind::MultilineConcept, "Kafka", "A log.\\n\\nA bus.");
    c.triple_delimiter = true;
    assert_eq!(
        f.format_cards(&[c], false),
        "Kafka :::\n    A log.\n    A bus."
    );
}

#[test]
fn list_answer_emits_numbered_block() {
    let mut f = RemNoteFormatter::new();
    let mut c = card(CardKind::ListAnswer, "Key concepts of X?", "");
    c.list_items = vec!["alpha".to_string(), "beta".to_string()];
    assert_eq!(
        f.format_cards(&[c], false),
        "Key concepts of X? >>1.\n    alpha\n    beta"
    );
}

#[test]
fn multiple_choice_moves_correct_item_first() {
    let mut f = RemNoteFormatter::new();
    let mut c = card(CardKind::MultipleChoice, "Which?", "");
    c.list_items = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    c.correct_choice_index = 2;
    assert_eq!(
        f.format_cards(&[c], false),
        "Which? >>A)\n    c\n    a\n    b"
    );
}

#[test]
fn list_card_without_items_is_not_emitted() {
    let mut f = RemNoteFormatter::new();
    let c = card(CardKind::ListAnswer, "Empty?", "");
    assert_eq!(f.format_cards(&[c], false), "");
    assert_eq!(f.stats().total_cards, 1);
}

#[test]
fn hierarchy_indents_three_levels() {
    let root = bidi(CardKind::Concept, "Systems", "Study of systems");
    let mut child = bidi(CardKind::Concept, "Queues", "Buffering");
    child.parent = Some("Systems".to_string());
    let mut grandchild = bidi(CardKind::Descriptor, "FIFO", "Key concept of Queues");
    grandchild.parent = Some("Queues".to_string());

    let mut f = RemNoteFormatter::new();
    let doc = f.format_cards(&[root, child, grandchild], true);
    let lines: Vec<&str> = doc.lines().collect();
    assert_eq!(lines[0], "Systems :: Study of systems");
    assert_eq!(lines[1], "    Queues :: Buffering");
    assert_eq!(lines[2], "        FIFO ;; Key concept of Queues");
}

#[test]
fn parent_matches_back_text_too() {
    let mut root = card(CardKind::Concept, "What is Kafka?", "Kafka");
    root.direction = Direction::Forward;
    let mut child = card(CardKind::Basic, "Durable?", "Yes");
    child.parent = Some("Kafka".to_string());

    let mut f = RemNoteFormatter::new();
    let doc = f.format_cards(&[root, child], true);
    assert_eq!(doc, "What is Kafka? :> Kafka\n    Durable? >> Yes");
}

#[test]
fn unmatched_parent_becomes_top_level_group() {
    let mut a = bidi(CardKind::Concept, "Pods", "Smallest unit");
    a.parent = Some("Kubernetes".to_string());
    let mut b = bidi(CardKind::Concept, "Services", "Stable endpoint");
    b.parent = Some("Kubernetes".to_string());

    let mut f = RemNoteFormatter::new();
    let doc = f.format_cards(&[a, b], true);
    assert_eq!(
        doc,
        "Kubernetes\n    Pods :: Smallest unit\n    Services :: Stable endpoint"
    );
    assert_eq!(f.stats().parent_groups, 1);
}

#[test]
fn parent_cycle_emits_every_card_exactly_once() {
    let mut ping = bidi(CardKind::Concept, "Ping", "Request half");
    ping.parent = Some("Pong".to_string());
    let mut pong = bidi(CardKind::Concept, "Pong", "Reply half");
    pong.parent = Some("Ping".to_string());

    let mut f = RemNoteFormatter::new();
    let doc = f.format_cards(&[ping, pong], true);
    assert_eq!(doc, "Ping :: Request half\n    Pong :: Reply half");
    assert_eq!(f.stats().total_cards, 2);
}

#[test]
fn three_card_cycle_flushes_after_the_roots() {
    let mut alpha = bidi(CardKind::Concept, "Alpha", "First in ring");
    alpha.parent = Some("Gamma".to_string());
    let mut beta = bidi(CardKind::Concept, "Beta", "Second in ring");
    beta.parent = Some("Alpha".to_string());
    let mut gamma = bidi(CardKind::Concept, "Gamma", "Third in ring");
    gamma.parent = Some("Beta".to_string());
    let solo = bidi(CardKind::Concept, "Solo", "Lone card");

    let mut f = RemNoteFormatter::new();
    let doc = f.format_cards(&[alpha, beta, gamma, solo], true);
    let lines: Vec<&str> = doc.lines().collect();
    assert_eq!(lines[0], "Solo :: Lone card");
    assert_eq!(lines[1], "Alpha :: First in ring");
    assert_eq!(lines[2], "    Beta :: Second in ring");
    assert_eq!(lines[3], "        Gamma :: Third in ring");
    assert_eq!(lines.len(), 4);
}

#[test]
fn nested_card_blocks_indent_every_line() {
    let root = bidi(CardKind::Concept, "Logs", "Append-only records");
    let mut child = card(CardKind::ListAnswer, "Log types?", "");
    child.parent = Some("Logs".to_string());
    child.list_items = vec!["wal".to_string(), "binlog".to_string()];

    let mut f = RemNoteFormatter::new();
    let doc = f.format_cards(&[root, child], true);
    assert_eq!(
        doc,
        "Logs :: Append-only records\n    Log types? >>1.\n        wal\n        binlog"
    );
}

#[test]
fn extra_detail_emits_reference_line() {
    let mut c = bidi(CardKind::Concept, "Kafka", "Event log");
    c.extra_detail = Some("See also :: partitions".to_string());
    let mut f = RemNoteFormatter::new();
    assert_eq!(
        f.format_cards(&[c], false),
        "Kafka :: Event log\n    #[[Extra Card Detail]] See also : : partitions"
    );
    assert_eq!(f.stats().escaped_cards, 1);
}

#[test]
fn extra_detail_indents_with_its_card() {
    let root = bidi(CardKind::Concept, "Logs", "Append-only records");
    let mut child = bidi(CardKind::Concept, "WAL", "Write-ahead log");
    child.parent = Some("Logs".to_string());
    child.extra_detail = Some("fsync before ack".to_string());

    let mut f = RemNoteFormatter::new();
    let doc = f.format_cards(&[root, child], true);
    assert_eq!(
        doc,
        "Logs :: Append-only records\n    WAL :: Write-ahead log\n        #[[Extra Card Detail]] fsync before ack"
    );
}

#[test]
fn flat_mode_appends_tags() {
    let mut c = bidi(CardKind::Concept, "Raft", "Consensus algorithm");
    c.tags = vec!["Distributed Systems".to_string()];
    let mut f = RemNoteFormatter::new();
    assert_eq!(
        f.format_cards(&[c], false),
        "Raft :: Consensus algorithm #Distributed Systems"
    );
}

#[test]
fn stats_cover_kinds_directions_and_parents() {
    let a = bidi(CardKind::Concept, "A", "B");
    let mut b = card(CardKind::Basic, "C::D", "E");
    b.parent = Some("A".to_string());
    let mut c = card(CardKind::Cloze, "F {{G}}", "");
    c.parent = Some("Z".to_string());

    let mut f = RemNoteFormatter::new();
    f.format_cards(&[a, b, c], true);
    let stats = f.stats();
    assert_eq!(stats.total_cards, 3);
    assert_eq!(stats.by_kind[&CardKind::Concept], 1);
    assert_eq!(stats.by_kind[&CardKind::Basic], 1);
    assert_eq!(stats.by_kind[&CardKind::Cloze], 1);
    assert_eq!(stats.by_direction[&Direction::Bidirectional], 1);
    assert_eq!(stats.by_direction[&Direction::Forward], 2);
    assert_eq!(stats.parent_groups, 2);
    assert_eq!(stats.escaped_cards, 1);
}

#[test]
fn empty_input_formats_to_empty_document() {
    let mut f = RemNoteFormatter::new();
    assert_eq!(f.format_cards(&[], true), "");
    assert_eq!(f.stats().total_cards, 0);
}
