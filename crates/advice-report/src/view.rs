/// Structured card view of classified advice.
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifiedAdvice;

pub const NO_RECOMMENDATIONS: &str = "No recommendations available.";

const EMPHASIS_OPEN: &str = "<em>";
const EMPHASIS_CLOSE: &str = "</em>";

/// One display card: a category with its escaped advice items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AdviceCard {
    /// Icon identifier, e.g. "droplet" or "general".
    pub icon: String,
    /// Category title, e.g. "Salinity Management".
    pub title: String,
    /// Advice items, HTML-escaped except for `<em>` emphasis markers.
    pub items: Vec<String>,
}

impl AdviceCard {
    fn placeholder() -> Self {
        Self {
            icon: "info".to_string(),
            title: "Recommendations".to_string(),
            items: vec![NO_RECOMMENDATIONS.to_string()],
        }
    }
}

/// Render classified advice as cards, in mapping order.
///
/// Always returns at least one card: empty advice yields a single placeholder.
pub fn render_cards(advice: &ClassifiedAdvice) -> Vec<AdviceCard> {
    if advice.is_empty() {
        return vec![AdviceCard::placeholder()];
    }

    advice
        .sections()
        .iter()
        .map(|section| {
            let (icon, title) = match advice.category(section.key) {
                Some(def) => (def.icon.to_string(), def.title.to_string()),
                None => ("general".to_string(), section.key.to_string()),
            };
            AdviceCard {
                icon,
                title: escape_html(&title),
                items: section.items.iter().map(|item| escape_item(item)).collect(),
            }
        })
        .collect()
}

/// Escape an advice item for HTML display, keeping `<em>`/`</em>` markers intact.
pub fn escape_item(item: &str) -> String {
    item.split(EMPHASIS_OPEN)
        .map(|chunk| {
            chunk
                .split(EMPHASIS_CLOSE)
                .map(escape_html)
                .collect::<Vec<_>>()
                .join(EMPHASIS_CLOSE)
        })
        .collect::<Vec<_>>()
        .join(EMPHASIS_OPEN)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Remove emphasis markers, leaving the plain display text.
pub fn strip_emphasis(item: &str) -> String {
    item.replace(EMPHASIS_OPEN, "").replace(EMPHASIS_CLOSE, "")
}
