//! Prompt templates for AI-assisted character creation.

/// System prompt for name and general character suggestions.
pub const SYSTEM_PROMPT_CHARACTER_CREATION: &str = "\
You are a creative writing assistant helping an author develop characters for their visual novel story.

Your role is to:
- Provide creative, genre-appropriate suggestions
- Help flesh out character details
- Maintain consistency with the story's tone
- Offer options without being prescriptive

Keep responses concise and focused on the specific request.
";

/// System prompt for appearance expansion.
pub const SYSTEM_PROMPT_APPEARANCE: &str = "\
You are helping describe character appearances for a visual novel.

Focus on:
- Visual details that would translate well to art
- Distinctive features that make characters memorable
- Genre-appropriate aesthetics
- Consistency in description style
";

/// System prompt for personality development.
pub const SYSTEM_PROMPT_PERSONALITY: &str = "\
You are helping develop character personalities for a visual novel.

Focus on:
- Traits that create interesting story dynamics
- Personality aspects that affect dialogue and choices
- Character depth through contradictions and growth potential
- Genre-appropriate archetypes with unique twists
";

/// System prompt for backstory development.
pub const SYSTEM_PROMPT_BACKSTORY: &str = "\
You are helping develop character backstories for a visual novel.

Focus on:
- Motivations and formative experiences
- Connections to other characters and plot
- Secrets and hidden depths
- Story hooks for character arcs
";

/// System prompt for the freeform brainstorming chat.
pub const SYSTEM_PROMPT_CHAT: &str = "\
You are a creative writing assistant helping an author develop \
their visual novel story. Be helpful, creative, and supportive.";

/// Build a prompt asking for character name suggestions.
pub fn name_suggestion_prompt(genre: &str, role: &str, count: usize) -> String {
    format!(
        r#"Suggest {count} character names for a {role} in a {genre} story.

Requirements:
- Names should fit the genre and role
- Include a mix of styles (modern, traditional, unique)
- Names should be memorable and easy to pronounce
- Consider cultural diversity

Return ONLY the names, one per line, no numbering or explanations.
"#
    )
}

/// Build a prompt expanding a brief appearance description into the
/// structured JSON shape the wizard parses.
pub fn appearance_expansion_prompt(brief_description: &str, genre: &str) -> String {
    format!(
        r#"Expand this brief character appearance description into structured details for a {genre} story.

Brief description: "{brief_description}"

Provide detailed descriptions for each of these aspects in JSON format:
{{
  "hair": {{
    "color": "description of hair color",
    "style": "how the hair is styled",
    "length": "hair length"
  }},
  "eyes": {{
    "color": "eye color",
    "shape": "eye shape description"
  }},
  "skin_tone": "skin tone description",
  "height": "height descriptor (short, average, tall)",
  "build": "body build description",
  "distinctive_features": ["list of notable features"],
  "clothing_style": "typical clothing style",
  "accessories": ["common accessories"]
}}

Keep descriptions concise (1-3 words each when possible).
Return ONLY the JSON, no other text.
"#
    )
}

/// Build a prompt asking for personality trait suggestions.
pub fn trait_suggestion_prompt(
    role: &str,
    existing_traits: &[String],
    genre: &str,
    count: usize,
) -> String {
    let existing = if existing_traits.is_empty() {
        "none yet".to_string()
    } else {
        existing_traits.join(", ")
    };

    format!(
        r#"Suggest {count} personality traits for a {role} character in a {genre} story.

Already chosen traits: {existing}

Requirements:
- Traits should complement the existing ones
- Include a mix of positive traits and interesting flaws
- Consider traits that create good story dynamics
- Traits should fit the genre conventions

Return ONLY the traits, one per line, no numbering or explanations.
Each trait should be 1-2 words.
"#
    )
}

/// Build a prompt expanding brief backstory notes into full prose.
pub fn backstory_expansion_prompt(notes: &str, character_name: &str, genre: &str) -> String {
    format!(
        r#"Expand these brief backstory notes into a detailed character backstory for {character_name} in a {genre} story.

Notes: "{notes}"

Write a 2-3 paragraph backstory that:
- Incorporates all the user's notes
- Adds context and motivation
- Creates hooks for story development
- Maintains consistency with the genre
- Suggests formative life events

Write in third person, past tense.
Keep it under 500 words.
"#
    )
}

/// Build a prompt asking for backstory development questions.
pub fn backstory_questions_prompt(
    character_name: &str,
    role: &str,
    genre: &str,
    count: usize,
) -> String {
    format!(
        r#"Generate {count} thought-provoking questions to help develop the backstory of {character_name}, a {role} in a {genre} story.

Questions should:
- Reveal character motivations and fears
- Create opportunities for interesting plot connections
- Help define relationships and conflicts
- Be specific enough to inspire detailed answers
- Fit the genre conventions

Return ONLY the questions, one per line, no numbering.
"#
    )
}

/// Build a prompt checking a trait list for contradictions.
pub fn trait_contradiction_prompt(traits: &[String]) -> String {
    let traits_str = traits.join(", ");
    format!(
        r#"Analyze these personality traits for potential contradictions:
{traits_str}

If any traits seem to contradict each other, list each contradictory pair.
If there are no contradictions, respond with "No contradictions found."

Format for contradictions:
trait1 - trait2: brief explanation of why they conflict

Consider that some "contradictions" can actually create interesting character depth.
Only flag truly incompatible trait combinations.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_prompt_mentions_genre_and_role() {
        let prompt = name_suggestion_prompt("fantasy", "protagonist", 5);
        assert!(prompt.contains("5 character names"));
        assert!(prompt.contains("protagonist"));
        assert!(prompt.contains("fantasy"));
    }

    #[test]
    fn test_trait_prompt_lists_existing_traits() {
        let existing = vec!["curious".to_string(), "stubborn".to_string()];
        let prompt = trait_suggestion_prompt("antagonist", &existing, "mystery", 3);
        assert!(prompt.contains("curious, stubborn"));

        let prompt = trait_suggestion_prompt("antagonist", &[], "mystery", 3);
        assert!(prompt.contains("none yet"));
    }

    #[test]
    fn test_appearance_prompt_embeds_description() {
        let prompt = appearance_expansion_prompt("tall and scarred", "horror");
        assert!(prompt.contains("\"tall and scarred\""));
        assert!(prompt.contains("distinctive_features"));
    }
}
