use std::fmt::Write as _;

use pipeline::Experience;

/// Renders `experience` as a single user message.
///
/// The message has up to four sections, each omitted when empty: the origin,
/// interpretations already attached earlier in the history (oldest first), the
/// elaboration chain in execution order, and the expected response schema.
pub fn render_prompt(experience: &Experience) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(origin) = experience.origin() {
        sections.push(format!("Origin:\n{origin}"));
    }

    let mut earlier: Vec<&Experience> = experience
        .ancestors()
        .filter(|node| node.interpretation().is_some())
        .collect();
    earlier.reverse();
    if !earlier.is_empty() {
        let mut section = String::from("Earlier interpretations:");
        for node in earlier {
            if let Some(interpretation) = node.interpretation() {
                let _ = write!(section, "\n- [{}] {}", node.source(), interpretation.content);
            }
        }
        sections.push(section);
    }

    if let Some(elaboration) = experience.elaboration() {
        let mut section = String::from("Work through these steps:");
        for (index, link) in elaboration.chain().into_iter().enumerate() {
            let _ = write!(section, "\n{}. [{}] {}", index + 1, link.source(), link.prompt());
        }
        sections.push(section);

        if let Some(schema) = elaboration.effective_schema() {
            let rendered = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
            sections.push(format!(
                "Respond with a single JSON value matching this schema:\n{rendered}"
            ));
        }
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pipeline::{Confidence, Content, Elaboration, Interpretation, StageName};
    use serde_json::json;

    use super::*;

    fn name(value: &str) -> StageName {
        StageName::new(value).unwrap()
    }

    #[test]
    fn renders_origin_and_chain_in_order() {
        let first = Arc::new(Elaboration::new(name("sensation"), "What is observed?", None, None));
        let second = Arc::new(Elaboration::new(
            name("sensory-gating"),
            "What matters?",
            Some(json!({"type": "object"})),
            Some(first),
        ));
        let experience = Experience::from_origin("The sky is blue").with_elaboration(Some(second));

        let prompt = render_prompt(&experience);

        assert!(prompt.starts_with("Origin:\nThe sky is blue"));
        let sensation = prompt.find("1. [sensation] What is observed?").unwrap();
        let gating = prompt.find("2. [sensory-gating] What matters?").unwrap();
        assert!(sensation < gating);
        assert!(prompt.contains("matching this schema"));
        assert!(!prompt.contains("Earlier interpretations"));
    }

    #[test]
    fn includes_earlier_interpretations_oldest_first() {
        let answered = |source: &str, text: &str, previous: Experience| {
            Experience::following(name(source), previous).with_interpretation(Interpretation::new(
                Content::Text(text.to_owned()),
                "test",
                Some(Confidence::certain()),
            ))
        };
        let perceived = answered("perception", "blue light", Experience::from_origin("sky"));
        let comprehended = answered("comprehension", "scattering", perceived);
        let current = Experience::following(name("recollection"), comprehended);

        let prompt = render_prompt(&current);

        let perception = prompt.find("- [perception] blue light").unwrap();
        let comprehension = prompt.find("- [comprehension] scattering").unwrap();
        assert!(perception < comprehension);
        assert!(!prompt.contains("Work through these steps"));
    }
}
