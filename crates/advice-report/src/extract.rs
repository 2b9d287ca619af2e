/// Extraction of the recommendation body from raw model output.
///
/// Models often open with a sentence of chatter ("Sure! Here are...") before the
/// first category heading. Everything before the first heading line is dropped.
/// After it, blank lines and every line the classifier can file are kept, so
/// extraction never costs the classifier an item. Without any heading line, the
/// text is cut at the first inline heading-like span, or returned trimmed.
use std::sync::LazyLock;

use regex::Regex;

use crate::classifier::classifier;

static INLINE_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*[^*]+\*\*|#+\s+[^\n]+").expect("valid regex"));

pub fn extract_recommendations(raw: &str) -> String {
    let classifier = classifier();

    let mut kept: Vec<&str> = Vec::new();
    let mut started = false;

    for line in raw.lines() {
        let trimmed = line.trim();
        if !started {
            if !classifier.headings().is_heading(trimmed) {
                continue;
            }
            started = true;
        }
        if trimmed.is_empty() || classifier.is_content_line(trimmed) {
            kept.push(line);
        }
    }

    if !started {
        return match INLINE_HEADING_RE.find(raw) {
            Some(m) => raw[m.start()..].trim().to_string(),
            None => raw.trim().to_string(),
        };
    }

    kept.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;

    #[test]
    fn drops_preamble_and_short_chatter() {
        let raw = "Sure! Here are the recommendations you asked for.\n\n**Salinity Management**\n• Keep salinity near 20 ppt\n\nGood luck!\n### Production Timing\n1. Harvest before the rainy season";
        assert_eq!(
            extract_recommendations(raw),
            "**Salinity Management**\n• Keep salinity near 20 ppt\n\n### Production Timing\n1. Harvest before the rainy season"
        );
    }

    #[test]
    fn keeps_every_item_the_classifier_files() {
        for marker in ["•", "-", "*", "–", "·", "1.", "2)"] {
            let raw = format!(
                "**Salinity Management**\n{marker} Keep salinity between 15 and 25 ppt\nDilute with river water at high tide\n### Weather\n{marker} Secure rafts before typhoon season"
            );
            let direct = classify(&raw);
            let extracted = classify(&extract_recommendations(&raw));
            assert_eq!(direct.item_count(), 3, "marker {marker}");
            assert_eq!(extracted.item_count(), direct.item_count(), "marker {marker}");
            assert_eq!(extracted, direct, "marker {marker}");
        }
    }

    #[test]
    fn preamble_never_reaches_the_classifier() {
        let raw = "Here is a long friendly preamble sentence.\n**Salinity Management**\n– Keep salinity between 15 and 25 ppt";
        let advice = classify(&extract_recommendations(raw));
        assert_eq!(advice.keys().collect::<Vec<_>>(), ["salinity"]);
        assert_eq!(advice.item_count(), 1);
    }

    #[test]
    fn inline_heading_without_heading_line() {
        let raw = "Intro text then **Salinity** tips follow here";
        assert_eq!(extract_recommendations(raw), "**Salinity** tips follow here");
    }

    #[test]
    fn no_heading_returns_trimmed_raw() {
        assert_eq!(extract_recommendations("  just some advice  \n"), "just some advice");
        assert_eq!(extract_recommendations(""), "");
    }
}
