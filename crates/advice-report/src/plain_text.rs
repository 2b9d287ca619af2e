/// Plain-text (clipboard) export of classified advice.
///
/// Flattening drops category boundaries: every item becomes one bulleted line,
/// in mapping order, with no category headers between them.
use crate::classifier::ClassifiedAdvice;
use crate::view::NO_RECOMMENDATIONS;

pub const BULLET: &str = "• ";

pub fn to_plain_text(advice: &ClassifiedAdvice) -> String {
    if advice.is_empty() {
        return NO_RECOMMENDATIONS.to_string();
    }
    flatten(advice)
        .iter()
        .map(|item| format!("{BULLET}{item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Clipboard text for a result that may never have been classified.
///
/// Without classification the raw model text is copied as-is (trimmed).
pub fn clipboard_text(advice: Option<&ClassifiedAdvice>, raw: &str) -> String {
    match advice {
        Some(advice) => to_plain_text(advice),
        None if raw.trim().is_empty() => NO_RECOMMENDATIONS.to_string(),
        None => raw.trim().to_string(),
    }
}

/// Every item across every category, in mapping order.
pub fn flatten(advice: &ClassifiedAdvice) -> Vec<&str> {
    advice.items().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use quickcheck_macros::quickcheck;

    #[test]
    fn empty_mapping_gives_placeholder() {
        assert_eq!(to_plain_text(&classify("")), "No recommendations available.");
    }

    #[test]
    fn items_are_bulleted_without_category_markers() {
        let advice = classify(
            "**Salinity Management**\n- Monitor **salinity** levels\n### Weather Preparedness\n- Secure rafts before storms",
        );
        assert_eq!(
            to_plain_text(&advice),
            "• Monitor <em>salinity</em> levels\n• Secure rafts before storms"
        );
    }

    #[test]
    fn clipboard_falls_back_to_raw_text() {
        assert_eq!(clipboard_text(None, "  raw advice \n"), "raw advice");
        assert_eq!(clipboard_text(None, "   "), NO_RECOMMENDATIONS);
        let advice = classify("- Replace worn ropes");
        assert_eq!(clipboard_text(Some(&advice), "ignored"), "• Replace worn ropes");
    }

    #[quickcheck]
    fn flatten_keeps_every_item_on_its_own_line(text: String) -> bool {
        let advice = classify(&text);
        let exported = to_plain_text(&advice);
        if advice.is_empty() {
            return exported == NO_RECOMMENDATIONS;
        }
        let lines: Vec<&str> = exported.split('\n').collect();
        lines.len() == advice.item_count()
            && lines
                .iter()
                .zip(advice.items())
                .all(|(line, item)| line.strip_prefix(BULLET) == Some(item))
    }
}
