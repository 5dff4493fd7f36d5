//! The fixed frame-description prompt shared by both provider variants.

/// Single-turn prompt sent with every sampled frame.
///
/// The structure matters for retrieval quality: descriptions that name the
/// same aspects in the same order embed consistently, which keeps nearby
/// frames of one scene close together in vector space.
pub const DESCRIPTION_PROMPT: &str = "\
Describe this video frame for a search index. Cover, in order:
1. A one-sentence scene summary.
2. Location type (indoor/outdoor, and what kind of place).
3. Time of day and lighting.
4. Weather, if visible.
5. People or other subjects, and what they are doing.
6. Notable visible objects.
7. What covers the ground and what the sky looks like, if visible.
8. Overall composition (camera angle, framing, movement cues).
Be factual and specific; do not speculate beyond what is visible.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_required_aspect() {
        for aspect in [
            "scene summary",
            "Location type",
            "Time of day",
            "Weather",
            "subjects",
            "objects",
            "ground",
            "sky",
            "composition",
        ] {
            assert!(
                DESCRIPTION_PROMPT.contains(aspect),
                "prompt missing aspect: {}",
                aspect
            );
        }
    }
}
