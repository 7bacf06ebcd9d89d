use remforge_core::{
    CardKind, Direction, DuplicateFilter, Flashcard, GenerationStats, FINGERPRINT_LEN,
};

#[test]
fn equal_fields_hash_equal() {
    let a = Flashcard::new(CardKind::Concept, "Front", "Back");
    let b = Flashcard::new(CardKind::Concept, "Front", "Back");
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint().len(), FINGERPRINT_LEN);
}

#[test]
fn any_defining_field_changes_the_fingerprint() {
    let base = Flashcard::new(CardKind::Concept, "Front", "Back");

    let mut front = base.clone();
    front.front = "Other".to_string();
    let mut back = base.clone();
    back.back = "Other".to_string();
    let mut kind = base.clone();
    kind.kind = CardKind::Basic;
    let mut direction = base.clone();
    direction.direction = Direction::Backward;
    let mut items = base.clone();
    items.list_items = vec!["x".to_string()];

    for variant in [front, back, kind, direction, items] {
        assert_ne!(base.fingerprint(), variant.fingerprint());
    }
}

#[test]
fn extra_detail_does_not_change_the_fingerprint() {
    let base = Flashcard::new(CardKind::Concept, "Front", "Back");
    let mut detailed = base.clone();
    detailed.extra_detail = Some("supplementary note".to_string());
    assert_eq!(base.fingerprint(), detailed.fingerprint());
}

#[test]
fn list_items_participate_in_the_fingerprint() {
    let mut a = Flashcard::new(CardKind::ListAnswer, "F", "");
    a.list_items = vec!["x".to_string(), "y".to_string()];
    let mut b = a.clone();
    b.list_items = vec!["x".to_string(), "z".to_string()];
    assert_ne!(a.fingerprint(), b.fingerprint());
}

#[test]
fn filter_accepts_exactly_one_of_equal_cards() {
    let mut filter = DuplicateFilter::new();
    let a = Flashcard::new(CardKind::Concept, "F", "B");
    let b = Flashcard::new(CardKind::Concept, "F", "B");

    assert!(filter.admit(&a));
    assert!(!filter.admit(&b));
    assert_eq!(filter.duplicates(), 1);
    assert_eq!(filter.len(), 1);
}

#[test]
fn is_new_and_register_compose_like_admit() {
    let mut filter = DuplicateFilter::new();
    let card = Flashcard::new(CardKind::Basic, "Q", "A");

    assert!(filter.is_new(&card));
    filter.register(&card);
    assert!(!filter.is_new(&card));
    assert_eq!(filter.duplicates(), 1);
}

#[test]
fn direction_distinguishes_otherwise_equal_cards() {
    let mut filter = DuplicateFilter::new();
    let forward = Flashcard::new(CardKind::Concept, "F", "B");
    let mut backward = forward.clone();
    backward.direction = Direction::Backward;

    assert!(filter.admit(&forward));
    assert!(filter.admit(&backward));
    assert_eq!(filter.duplicates(), 0);
}

#[test]
fn generation_stats_count_by_kind() {
    let mut stats = GenerationStats::default();
    stats.record(&Flashcard::new(CardKind::Concept, "A", "B"));
    stats.record(&Flashcard::new(CardKind::Concept, "C", "D"));
    stats.record(&Flashcard::new(CardKind::Cloze, "E {{F}}", ""));

    assert_eq!(stats.total_cards, 3);
    assert_eq!(stats.by_kind[&CardKind::Concept], 2);
    assert_eq!(stats.by_kind[&CardKind::Cloze], 1);
}

#[test]
fn kind_wire_names_match_serde() {
    let kinds = [
        CardKind::Concept,
        CardKind::Basic,
        CardKind::Cloze,
        CardKind::Descriptor,
        CardKind::MultilineConcept,
        CardKind::ListAnswer,
        CardKind::MultipleChoice,
    ];
    for kind in kinds {
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{}\"", kind.as_str()));
    }
    for direction in [
        Direction::Forward,
        Direction::Backward,
        Direction::Bidirectional,
        Direction::Disabled,
    ] {
        let json = serde_json::to_string(&direction).unwrap();
        assert_eq!(json, format!("\"{}\"", direction.as_str()));
    }
}
