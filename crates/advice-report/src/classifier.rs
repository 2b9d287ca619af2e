/// Classifier for free-text advisory output.
///
/// The input is whatever the language model produced: headings in several
/// shapes, bullets, numbered lists, or plain paragraphs. The classifier walks it
/// line by line as a small state machine (current category + pending items)
/// and files every meaningful line under exactly one category.
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::heading::HeadingMatcher;
use crate::registry::{CategoryDefinition, CategoryRegistry, DEFAULT_GENERAL_TITLE, GENERAL_KEY};

/// A leading bullet glyph, or `N.` / `N)`, then whitespace. Capture 1 is the content.
pub const LIST_ITEM_PATTERN: &str = r"^(?:[•\-*–·]|\d+[.)])\s+(.*)$";

/// List items must be longer than this (in characters) after marker stripping.
const MIN_LIST_ITEM_CHARS: usize = 3;
/// Free-form lines must be longer than this (in characters) to count as advice.
const MIN_PARAGRAPH_CHARS: usize = 15;

/// Advice items filed under one category key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceSection {
    pub key: &'static str,
    pub items: Vec<String>,
}

/// Ordered mapping from category key to advice items.
///
/// Sections appear in the order their key was first filled. A section is never
/// empty and no item is blank. The registry that resolved the keys travels with
/// the mapping so renderers can find icon and title for the general fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedAdvice {
    sections: Vec<AdviceSection>,
    registry: CategoryRegistry,
}

impl ClassifiedAdvice {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Number of categories with content.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn sections(&self) -> &[AdviceSection] {
        &self.sections
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sections.iter().map(|s| s.key)
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.items.as_slice())
    }

    /// Every item across every category, in mapping order.
    pub fn items(&self) -> impl Iterator<Item = &str> + '_ {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter().map(String::as_str))
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn category(&self, key: &str) -> Option<&CategoryDefinition> {
        self.registry.lookup(key)
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Append items to `key`, creating the section if needed. Blank items are dropped.
    fn append(&mut self, key: &'static str, items: Vec<String>) {
        let mut items: Vec<String> = items
            .into_iter()
            .filter(|item| !item.trim().is_empty())
            .collect();
        if items.is_empty() {
            return;
        }
        match self.sections.iter_mut().find(|s| s.key == key) {
            Some(section) => section.items.append(&mut items),
            None => self.sections.push(AdviceSection { key, items }),
        }
    }
}

static CLASSIFIER: LazyLock<Classifier> = LazyLock::new(Classifier::new);

/// Classify raw advisory text. Pure and deterministic.
pub fn classify(raw: &str) -> ClassifiedAdvice {
    CLASSIFIER.classify(raw)
}

/// The shared classifier, for callers that need its line predicates.
pub fn classifier() -> &'static Classifier {
    &CLASSIFIER
}

pub struct Classifier {
    headings: HeadingMatcher,
    list_item_re: Regex,
    bold_span_re: Regex,
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            headings: HeadingMatcher::new(),
            list_item_re: Regex::new(LIST_ITEM_PATTERN).expect("valid regex"),
            bold_span_re: Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"),
        }
    }

    pub fn classify(&self, raw: &str) -> ClassifiedAdvice {
        let mut advice = ClassifiedAdvice::default();
        let mut current: Option<&'static str> = None;
        let mut pending: Vec<String> = Vec::new();

        for (line_number, line) in raw
            .lines()
            .map(str::trim)
            .enumerate()
            .filter(|(_, l)| !l.is_empty())
        {
            if let Some(label) = self.headings.match_heading(line) {
                flush(&mut advice, current, &mut pending);
                current = Some(advice.registry.resolve_heading(label));
                continue;
            }

            let item = match self.list_item_content(line) {
                Some(content) => {
                    let content = self.emphasize(content);
                    if content.chars().count() <= MIN_LIST_ITEM_CHARS {
                        trace!(line_number = line_number + 1, "list item too short, skipping");
                        continue;
                    }
                    content
                }
                None if line.chars().count() > MIN_PARAGRAPH_CHARS => line.to_string(),
                None => {
                    trace!(line_number = line_number + 1, content = line, "line too short, skipping");
                    continue;
                }
            };

            if current.is_none() {
                advice.registry.ensure_general(DEFAULT_GENERAL_TITLE);
                current = Some(GENERAL_KEY);
            }
            pending.push(item);
        }

        flush(&mut advice, current, &mut pending);

        debug!(
            categories = advice.len(),
            items = advice.item_count(),
            general = advice.registry.general().is_some(),
            "advice classified"
        );
        advice
    }

    /// Whether `line` is a heading, a list line, or a paragraph long enough to file.
    pub fn is_content_line(&self, line: &str) -> bool {
        let line = line.trim();
        self.headings.is_heading(line)
            || self.list_item_re.is_match(line)
            || line.chars().count() > MIN_PARAGRAPH_CHARS
    }

    pub fn headings(&self) -> &HeadingMatcher {
        &self.headings
    }

    /// Strip a leading bullet glyph or `N.` / `N)` marker, returning the content.
    fn list_item_content<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.list_item_re
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }

    /// Turn `**bold**` spans into the display emphasis marker.
    fn emphasize(&self, content: &str) -> String {
        self.bold_span_re
            .replace_all(content, "<em>$1</em>")
            .trim()
            .to_string()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

fn flush(advice: &mut ClassifiedAdvice, current: Option<&'static str>, pending: &mut Vec<String>) {
    if pending.is_empty() {
        return;
    }
    let items = std::mem::take(pending);
    if let Some(key) = current {
        advice.append(key, items);
    }
}
