/// Section heading detection for advisory text.
///
/// Two heading shapes are recognized on a trimmed line:
/// - `**Label**` or `__Label__`, with no further emphasis delimiter inside
/// - `# Label`, `### Label`, ... (one or more `#` then whitespace)
use regex::Regex;

pub struct HeadingMatcher {
    bold_re: Regex,
    underscore_re: Regex,
    hash_re: Regex,
}

impl HeadingMatcher {
    pub fn new() -> Self {
        Self {
            bold_re: Regex::new(r"^\*\*([^*]+)\*\*$").expect("valid regex"),
            underscore_re: Regex::new(r"^__([^_]+)__$").expect("valid regex"),
            hash_re: Regex::new(r"^#+\s+(.+)$").expect("valid regex"),
        }
    }

    /// Return the heading label if `line` is a heading.
    ///
    /// The label is trimmed and loses a single trailing `:`. A label that ends
    /// up empty is not a heading, so `** **` falls through to content handling.
    pub fn match_heading<'a>(&self, line: &'a str) -> Option<&'a str> {
        let line = line.trim();
        let caps = self
            .bold_re
            .captures(line)
            .or_else(|| self.underscore_re.captures(line))
            .or_else(|| self.hash_re.captures(line))?;
        let inner = caps.get(1)?.as_str().trim();
        let label = inner.strip_suffix(':').unwrap_or(inner).trim_end();
        (!label.is_empty()).then_some(label)
    }

    pub fn is_heading(&self, line: &str) -> bool {
        self.match_heading(line).is_some()
    }
}

impl Default for HeadingMatcher {
    fn default() -> Self {
        Self::new()
    }
}
