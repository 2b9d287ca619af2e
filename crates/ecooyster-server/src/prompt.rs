use advice_report::prediction::NumericResult;
use oyster_common::advisor::ChatMessage;

const SYSTEM_PROMPT: &str = "You are a concise expert. Output only the final recommendations, \
with no explanations, reasoning or meta-commentary.";

/// Section headers the model is asked to emit. Each resolves to a built-in category.
pub const SECTION_HEADERS: [&str; 6] = [
    "Farming Technique Optimization",
    "Salinity Management",
    "Weather & Disaster Preparedness",
    "Environmental Monitoring",
    "Production Timing",
    "Best Practices & Sustainability",
];

fn events(count: u32) -> String {
    if count == 1 {
        "1 event".to_string()
    } else {
        format!("{count} events")
    }
}

/// System and user messages asking for recommendations aligned with `result`.
pub fn advice_messages(result: &NumericResult) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(user_prompt(result)),
    ]
}

fn user_prompt(result: &NumericResult) -> String {
    let production = result.display_value();
    let inputs = &result.inputs;
    let technique = inputs.technique.name();
    let salinity = inputs.salinity;
    let typhoons = events(inputs.typhoon_count);
    let floods = events(inputs.flood_count);

    let mut prompt = format!(
        "You are an aquaculture consultant specializing in oyster farming. Write recommendations \
         aligned with a predicted oyster production of {production} metric tons using the \
         {technique}.\n\n\
         Input data:\n\
         - Predicted production: {production} metric tons\n\
         - Salinity: {salinity} ppt\n\
         - Farming technique: {technique}\n\
         - Typhoons: {typhoons}\n\
         - Floods: {floods}\n\n\
         Requirements:\n\
         1. Every recommendation must reflect the predicted production of {production} metric tons.\n\
         2. Suggestions must be specific to the {technique}.\n\
         3. Give practical, actionable steps that improve yield and sustainability.\n\
         4. Account for the salinity of {salinity} ppt and the recorded weather events.\n\
         5. Start directly with the first category header. Do not add an introduction.\n\n\
         Use exactly these bold headers, each followed by two bullet points starting with \"• \":\n\n"
    );
    for header in SECTION_HEADERS {
        prompt.push_str(&format!("**{header}**\n• ...\n• ...\n\n"));
    }
    prompt.push_str(&format!(
        "Begin immediately with \"**{}**\".",
        SECTION_HEADERS[0]
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use advice_report::classifier::classify;
    use advice_report::prediction::{predict, FarmInputs};

    #[test]
    fn prompt_interpolates_inputs() {
        let result = predict(FarmInputs::new(22.5, 2, 1, 3).unwrap());
        let messages = advice_messages(&result);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");

        let user = &messages[1].content;
        assert!(user.contains(&format!("{} metric tons", result.display_value())));
        assert!(user.contains("Stake method"));
        assert!(user.contains("Salinity: 22.5 ppt"));
        assert!(user.contains("Typhoons: 1 event\n"));
        assert!(user.contains("Floods: 3 events"));
        assert!(user.ends_with("Begin immediately with \"**Farming Technique Optimization**\"."));
    }

    #[test]
    fn requested_headers_resolve_to_builtin_categories() {
        let text: String = SECTION_HEADERS
            .iter()
            .map(|h| format!("**{h}**\n• Follow this piece of advice\n"))
            .collect();
        let advice = classify(&text);
        let keys: Vec<&str> = advice.keys().collect();
        assert_eq!(
            keys,
            ["technique", "salinity", "weather", "environmental", "timing", "best-practices"]
        );
    }
}
