/// Category registry for advisory text.
///
/// The six built-in categories live in an immutable static table. Each
/// classification pass gets its own [`CategoryRegistry`], which layers the
/// lazily-created "general" fallback on top of that table without sharing it
/// across calls.
use std::borrow::Cow;

/// Key of the fallback category for content that matches no built-in heading.
pub const GENERAL_KEY: &str = "general";

/// Title given to the fallback category when content appears before any heading.
pub const DEFAULT_GENERAL_TITLE: &str = "Recommendations";

/// One advice category: stable key, display icon, display title, and the
/// vocabulary commonly found under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDefinition {
    pub key: &'static str,
    pub icon: &'static str,
    pub title: Cow<'static, str>,
    pub keywords: &'static [&'static str],
}

/// Built-in categories, in resolution order. Earlier entries win ties.
pub static BUILTIN_CATEGORIES: [CategoryDefinition; 6] = [
    CategoryDefinition {
        key: "technique",
        icon: "settings",
        title: Cow::Borrowed("Farming Technique Optimization"),
        keywords: &["raft", "stake", "technique", "method", "culture", "spat"],
    },
    CategoryDefinition {
        key: "salinity",
        icon: "droplet",
        title: Cow::Borrowed("Salinity Management"),
        keywords: &["salinity", "ppt", "salt", "brackish", "freshwater"],
    },
    CategoryDefinition {
        key: "weather",
        icon: "cloud-lightning",
        title: Cow::Borrowed("Weather & Disaster Preparedness"),
        keywords: &["typhoon", "flood", "storm", "weather", "disaster", "rain"],
    },
    CategoryDefinition {
        key: "environmental",
        icon: "activity",
        title: Cow::Borrowed("Environmental Monitoring"),
        keywords: &["monitor", "water quality", "temperature", "oxygen", "ph", "turbidity"],
    },
    CategoryDefinition {
        key: "timing",
        icon: "clock",
        title: Cow::Borrowed("Production Timing"),
        keywords: &["harvest", "season", "schedule", "timing", "month"],
    },
    CategoryDefinition {
        key: "best-practices",
        icon: "leaf",
        title: Cow::Borrowed("Best Practices & Sustainability"),
        keywords: &["sustainab", "practice", "community", "record", "training"],
    },
];

/// Per-call view of the category table.
///
/// Built-ins are read straight from [`BUILTIN_CATEGORIES`]; the general
/// fallback is created at most once per registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryRegistry {
    general: Option<CategoryDefinition>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtins() -> &'static [CategoryDefinition] {
        &BUILTIN_CATEGORIES
    }

    /// Look up a category by key. Unknown keys yield `None`.
    pub fn lookup(&self, key: &str) -> Option<&CategoryDefinition> {
        BUILTIN_CATEGORIES
            .iter()
            .find(|c| c.key == key)
            .or_else(|| self.general.as_ref().filter(|g| g.key == key))
    }

    /// Return the general fallback, creating it with `title` on first use.
    ///
    /// Later calls return the existing entry unchanged; the first title wins.
    pub fn ensure_general(&mut self, title: &str) -> &CategoryDefinition {
        self.general.get_or_insert_with(|| CategoryDefinition {
            key: GENERAL_KEY,
            icon: "general",
            title: Cow::Owned(title.to_string()),
            keywords: &[],
        })
    }

    pub fn general(&self) -> Option<&CategoryDefinition> {
        self.general.as_ref()
    }

    /// Resolve a heading label to a category key.
    ///
    /// A built-in matches when the lower-cased label contains its key, or when
    /// its key contains the label's first word. Labels matching nothing fall
    /// back to the general category, titled with the label as written.
    pub fn resolve_heading(&mut self, label: &str) -> &'static str {
        let lowered = label.to_lowercase();
        let first_token = lowered.split_whitespace().next();

        let matched = BUILTIN_CATEGORIES.iter().find(|c| {
            lowered.contains(c.key) || first_token.is_some_and(|token| c.key.contains(token))
        });

        match matched {
            Some(category) => category.key,
            None => {
                self.ensure_general(label);
                GENERAL_KEY
            }
        }
    }
}
