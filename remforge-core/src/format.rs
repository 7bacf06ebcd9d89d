use std::collections::{HashMap, HashSet};

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{CardKind, Direction, Flashcard};
use crate::stats::FormatStats;

/// One indentation level in the emitted document.
pub const INDENT: &str = "    ";

/// Well-formed cloze span: one pair of double braces, nothing nested.
static CLOZE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{[^{}]+\}\}").unwrap());

/// Tokens the import dialect treats as syntax, with their neutralized forms.
const ESCAPES: [(&str, &str); 7] = [
    ("::", ": :"),
    (">>", "> >"),
    ("<<", "< <"),
    (";;", "; ;"),
    ("<>", "< >"),
    ("#[[", "#[ ["),
    ("]]", "] ]"),
];

pub fn has_cloze_span(text: &str) -> bool {
    CLOZE_SPAN.is_match(text)
}

/// Neutralize syntax tokens by inserting a single space inside each, leaving
/// validated cloze spans untouched. Returns the escaped text and whether
/// anything changed.
pub fn escape_text(text: &str) -> (String, bool) {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in CLOZE_SPAN.find_iter(text) {
        out.push_str(&escape_segment(&text[last..span.start()]));
        out.push_str(span.as_str());
        last = span.end();
    }
    out.push_str(&escape_segment(&text[last..]));
    let changed = out != text;
    (out, changed)
}

fn escape_segment(segment: &str) -> String {
    let mut out = segment.to_string();
    for (token, neutral) in ESCAPES {
        // One replace pass can leave a fresh occurrence behind
        // (":::" becomes ": ::"), so repeat until none remain.
        while out.contains(token) {
            out = out.replace(token, neutral);
        }
    }
    out
}

fn delimiter(kind: CardKind, direction: Direction) -> &'static str {
    if direction == Direction::Disabled {
        return "=-";
    }
    match (kind, direction) {
        (CardKind::Concept, Direction::Forward) => ":>",
        (CardKind::Concept, Direction::Backward) => ":<",
        (CardKind::Concept, _) => "::",
        (CardKind::Basic, Direction::Forward) => ">>",
        (CardKind::Basic, Direction::Backward) => "<<",
        (CardKind::Basic, _) => "<>",
        (CardKind::Descriptor, Direction::Forward) => ";>",
        (CardKind::Descriptor, Direction::Backward) => ";<",
        (CardKind::Descriptor, _) => ";;",
        // Kinds with their own emission rules never reach here.
        _ => "::",
    }
}

/// How syntax tokens are neutralized. Space insertion is the only strategy
/// the importer round-trips; substitute glyphs are not recognized and must
/// not be used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EscapeStyle {
    #[default]
    SpaceInsert,
}

/// Serializes accepted cards into the RemNote import dialect.
pub struct RemNoteFormatter {
    escape_style: EscapeStyle,
    stats: FormatStats,
}

impl Default for RemNoteFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl RemNoteFormatter {
    pub fn new() -> Self {
        Self::with_escape_style(EscapeStyle::default())
    }

    /// The escaping strategy is fixed for the formatter's lifetime.
    pub fn with_escape_style(escape_style: EscapeStyle) -> Self {
        Self {
            escape_style,
            stats: FormatStats::default(),
        }
    }

    /// Statistics from the most recent format call.
    pub fn stats(&self) -> &FormatStats {
        &self.stats
    }

    /// Render cards into one import document. Statistics are recomputed from
    /// scratch on every call.
    pub fn format_cards(&mut self, cards: &[Flashcard], group_by_hierarchy: bool) -> String {
        self.stats = FormatStats::default();
        if cards.is_empty() {
            return String::new();
        }
        let rendered: Vec<Option<String>> = cards.iter().map(|c| self.render_card(c)).collect();
        self.stats.parent_groups = distinct_parents(cards);
        if group_by_hierarchy {
            self.format_hierarchical(cards, &rendered)
        } else {
            self.format_flat(cards, &rendered)
        }
    }

    fn escape(&self, text: &str) -> (String, bool) {
        match self.escape_style {
            EscapeStyle::SpaceInsert => escape_text(text),
        }
    }

    fn render_card(&mut self, card: &Flashcard) -> Option<String> {
        if !card.is_emittable() {
            warn!("skipping {} card without emittable content", card.kind.as_str());
            self.stats.record(card, false);
            return None;
        }
        let (text, escaped) = self.render_emittable(card);
        self.stats.record(card, escaped);
        Some(text)
    }

    fn render_emittable(&self, card: &Flashcard) -> (String, bool) {
        let (mut text, mut escaped) = match card.kind {
            CardKind::Cloze => self.render_cloze(card),
            CardKind::MultilineConcept => self.render_multiline(card),
            CardKind::ListAnswer => self.render_list(card),
            CardKind::MultipleChoice => self.render_choice(card),
            _ => self.render_plain(card),
        };
        if let Some(detail) = card.extra_detail.as_deref() {
            let (detail, e) = self.escape(detail);
            escaped |= e;
            text.push_str(&format!("\n{INDENT}#[[Extra Card Detail]] {detail}"));
        }
        (text, escaped)
    }

    fn render_plain(&self, card: &Flashcard) -> (String, bool) {
        let (front, f) = self.escape(&card.front);
        let (back, b) = self.escape(&card.back);
        let delim = delimiter(card.kind, card.direction);
        (format!("{front} {delim} {back}"), f || b)
    }

    fn render_cloze(&self, card: &Flashcard) -> (String, bool) {
        if has_cloze_span(&card.front) {
            // A valid span passes through verbatim, direction ignored.
            (card.front.clone(), false)
        } else {
            self.escape(&card.front)
        }
    }

    fn render_multiline(&self, card: &Flashcard) -> (String, bool) {
        let (front, f) = self.escape(&card.front);
        let (back, b) = self.escape(&card.back);
        // Literal \n markers in generated content become real line breaks.
        let back = back.replace("\\n", "\n");
        let mut lines = Vec::new();
        if card.triple_delimiter {
            lines.push(format!("{front} :::"));
            for line in back.lines().map(str::trim).filter(|l| !l.is_empty()) {
                lines.push(format!("{INDENT}{line}"));
            }
        } else {
            lines.push(format!("{front} ::"));
            for line in back.lines() {
                lines.push(format!("{INDENT}{line}"));
            }
        }
        (lines.join("\n"), f || b)
    }

    fn render_list(&self, card: &Flashcard) -> (String, bool) {
        let (front, f) = self.escape(&card.front);
        let mut escaped_any = f;
        let mut lines = vec![format!("{front} >>1.")];
        for item in &card.list_items {
            let (item, e) = self.escape(item);
            escaped_any |= e;
            lines.push(format!("{INDENT}{item}"));
        }
        (lines.join("\n"), escaped_any)
    }

    fn render_choice(&self, card: &Flashcard) -> (String, bool) {
        let (front, f) = self.escape(&card.front);
        let mut escaped_any = f;
        let mut items = card.list_items.clone();
        // Import convention: the first nested item is the correct answer.
        let correct = card.correct_choice_index;
        if correct != 0 && correct < items.len() {
            let item = items.remove(correct);
            items.insert(0, item);
        }
        let mut lines = vec![format!("{front} >>A)")];
        for item in &items {
            let (item, e) = self.escape(item);
            escaped_any |= e;
            lines.push(format!("{INDENT}{item}"));
        }
        (lines.join("\n"), escaped_any)
    }

    fn format_flat(&self, cards: &[Flashcard], rendered: &[Option<String>]) -> String {
        let mut lines = Vec::new();
        for (card, text) in cards.iter().zip(rendered) {
            let Some(text) = text else {
                continue;
            };
            let mut line = text.clone();
            if !card.tags.is_empty() {
                let tags: Vec<String> = card.tags.iter().map(|t| format!("#{t}")).collect();
                line.push(' ');
                line.push_str(&tags.join(" "));
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    /// Arena-style grouping: one pass builds a first-occurrence name to index
    /// lookup over every card's front then back, each parented card resolves
    /// to at most one attachment point, and emission tracks placement so a
    /// card appears exactly once even when parent references form a cycle.
    fn format_hierarchical(&self, cards: &[Flashcard], rendered: &[Option<String>]) -> String {
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        for (i, card) in cards.iter().enumerate() {
            by_name.entry(card.front.as_str()).or_insert(i);
        }
        for (i, card) in cards.iter().enumerate() {
            if !card.back.is_empty() {
                by_name.entry(card.back.as_str()).or_insert(i);
            }
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); cards.len()];
        let mut orphan_groups: Vec<(&str, Vec<usize>)> = Vec::new();
        let mut orphan_index: HashMap<&str, usize> = HashMap::new();
        for (i, card) in cards.iter().enumerate() {
            let Some(parent) = card.parent.as_deref() else {
                continue;
            };
            match by_name.get(parent) {
                Some(&j) if j != i => children[j].push(i),
                _ => {
                    let slot = *orphan_index.entry(parent).or_insert_with(|| {
                        orphan_groups.push((parent, Vec::new()));
                        orphan_groups.len() - 1
                    });
                    orphan_groups[slot].1.push(i);
                }
            }
        }

        let mut out: Vec<String> = Vec::new();
        let mut placed = vec![false; cards.len()];
        for (i, card) in cards.iter().enumerate() {
            if card.parent.is_none() {
                self.emit_subtree(i, 0, rendered, &children, &mut placed, &mut out);
            }
        }
        for (parent, members) in &orphan_groups {
            // An unmatched parent becomes its own top-level group, headed by
            // the parent text itself.
            let (heading, _) = self.escape(parent);
            out.push(heading);
            for &i in members {
                self.emit_subtree(i, 1, rendered, &children, &mut placed, &mut out);
            }
        }
        // Parent cycles leave cards unreachable from any root or orphan
        // group; flush them at top level rather than dropping them.
        for i in 0..cards.len() {
            if !placed[i] {
                self.emit_subtree(i, 0, rendered, &children, &mut placed, &mut out);
            }
        }
        out.join("\n")
    }

    fn emit_subtree(
        &self,
        index: usize,
        level: usize,
        rendered: &[Option<String>],
        children: &[Vec<usize>],
        placed: &mut [bool],
        out: &mut Vec<String>,
    ) {
        if placed[index] {
            return;
        }
        placed[index] = true;
        let child_level = match &rendered[index] {
            Some(text) => {
                out.push(indent_block(text, level));
                level + 1
            }
            // No line to hang children off; keep them at this level.
            None => level,
        };
        for &child in &children[index] {
            self.emit_subtree(child, child_level, rendered, children, placed, out);
        }
    }
}

fn indent_block(text: &str, level: usize) -> String {
    if level == 0 {
        return text.to_string();
    }
    let indent = INDENT.repeat(level);
    text.lines()
        .map(|line| format!("{indent}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn distinct_parents(cards: &[Flashcard]) -> u64 {
    let parents: HashSet<&str> = cards.iter().filter_map(|c| c.parent.as_deref()).collect();
    parents.len() as u64
}
