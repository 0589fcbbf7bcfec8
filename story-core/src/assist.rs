//! AI-assisted authoring features built on the Ollama client.
//!
//! The assistant is a collaborator, never a dependency: the persistence
//! layer works without it, and suggestion features return empty results
//! when the endpoint is unreachable so wizards can continue manually.

use crate::character::CharacterAppearance;
use crate::config::LlmConfig;
use crate::prompts;
use futures::Stream;
use ollama::{ChatRequest, Message, Ollama};
use std::pin::Pin;

/// Token stream from the assistant.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ollama::Error>> + Send>>;

/// Creative-suggestion service consulted by the character wizard and the
/// brainstorming chat.
#[derive(Clone)]
pub struct StoryAssistant {
    client: Ollama,
}

impl StoryAssistant {
    pub fn new(config: LlmConfig) -> Self {
        let client = Ollama::new(config.host.clone())
            .with_model(config.model.clone())
            .with_connect_timeout(config.connect_timeout());
        Self { client }
    }

    pub fn from_env() -> Self {
        Self::new(LlmConfig::from_env())
    }

    /// The endpoint this assistant talks to, for diagnostics.
    pub fn host(&self) -> &str {
        self.client.host()
    }

    /// Whether the endpoint currently responds (cached per process).
    pub async fn is_available(&self) -> bool {
        self.client.is_available().await
    }

    /// Forget the cached availability so the next check probes again.
    pub fn reset_availability(&self) {
        self.client.reset_availability()
    }

    /// Suggest character names; empty when the assistant is unreachable.
    pub async fn suggest_names(&self, genre: &str, role: &str, count: usize) -> Vec<String> {
        if !self.is_available().await {
            return Vec::new();
        }
        match self
            .generate(
                prompts::name_suggestion_prompt(genre, role, count),
                prompts::SYSTEM_PROMPT_CHARACTER_CREATION,
            )
            .await
        {
            Ok(response) => non_empty_lines(&response).take(count).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Expand a brief description into structured appearance details.
    ///
    /// Returns `None` when the response carries no parseable JSON object.
    pub async fn expand_appearance(
        &self,
        brief: &str,
        genre: &str,
    ) -> Result<Option<CharacterAppearance>, ollama::Error> {
        let response = self
            .generate(
                prompts::appearance_expansion_prompt(brief, genre),
                prompts::SYSTEM_PROMPT_APPEARANCE,
            )
            .await?;
        Ok(parse_appearance_json(&response))
    }

    /// Suggest personality traits; empty when the assistant is unreachable.
    pub async fn suggest_traits(
        &self,
        role: &str,
        existing: &[String],
        genre: &str,
        count: usize,
    ) -> Vec<String> {
        if !self.is_available().await {
            return Vec::new();
        }
        match self
            .generate(
                prompts::trait_suggestion_prompt(role, existing, genre, count),
                prompts::SYSTEM_PROMPT_PERSONALITY,
            )
            .await
        {
            Ok(response) => non_empty_lines(&response).take(count).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Expand brief notes into a full backstory.
    pub async fn expand_backstory(
        &self,
        notes: &str,
        character_name: &str,
        genre: &str,
    ) -> Result<String, ollama::Error> {
        self.generate(
            prompts::backstory_expansion_prompt(notes, character_name, genre),
            prompts::SYSTEM_PROMPT_BACKSTORY,
        )
        .await
    }

    /// Generate guiding questions for backstory development; empty when
    /// the assistant is unreachable.
    pub async fn backstory_questions(
        &self,
        character_name: &str,
        role: &str,
        genre: &str,
        count: usize,
    ) -> Vec<String> {
        if !self.is_available().await {
            return Vec::new();
        }
        match self
            .generate(
                prompts::backstory_questions_prompt(character_name, role, genre, count),
                prompts::SYSTEM_PROMPT_BACKSTORY,
            )
            .await
        {
            Ok(response) => non_empty_lines(&response)
                .filter(|line| line.ends_with('?'))
                .take(count)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Check a trait list for contradictory pairs; empty when fewer than
    /// two traits are given or the assistant is unreachable.
    pub async fn check_trait_contradictions(&self, traits: &[String]) -> Vec<(String, String)> {
        if traits.len() < 2 || !self.is_available().await {
            return Vec::new();
        }
        match self
            .generate(
                prompts::trait_contradiction_prompt(traits),
                prompts::SYSTEM_PROMPT_PERSONALITY,
            )
            .await
        {
            Ok(response) => parse_contradictions(&response),
            Err(_) => Vec::new(),
        }
    }

    /// Stream a chat response, optionally carrying project context.
    pub async fn chat_stream(
        &self,
        message: &str,
        context: Option<&str>,
    ) -> Result<TextStream, ollama::Error> {
        let mut system = prompts::SYSTEM_PROMPT_CHAT.to_string();
        if let Some(context) = context {
            system.push_str(&format!("\n\nProject context:\n{context}"));
        }

        let request = ChatRequest::new(vec![Message::user(message)]).with_system(system);
        self.client.chat_stream(request).await
    }

    async fn generate(&self, prompt: String, system: &str) -> Result<String, ollama::Error> {
        let request = ChatRequest::new(vec![Message::user(prompt)]).with_system(system);
        self.client.chat(request).await
    }
}

fn non_empty_lines(response: &str) -> impl Iterator<Item = String> + '_ {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

/// Extract the first `{...}` span from a response and parse it as an
/// appearance, clamping the list fields to their limits.
fn parse_appearance_json(response: &str) -> Option<CharacterAppearance> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }

    let mut appearance: CharacterAppearance =
        serde_json::from_str(&response[start..=end]).ok()?;
    appearance.distinctive_features.truncate(10);
    appearance.accessories.truncate(10);
    Some(appearance)
}

/// Parse `trait1 - trait2: explanation` lines into pairs.
fn parse_contradictions(response: &str) -> Vec<(String, String)> {
    if response.to_lowercase().contains("no contradiction") {
        return Vec::new();
    }

    let mut pairs = Vec::new();
    for line in response.lines() {
        let Some((pair_part, _)) = line.split_once(':') else {
            continue;
        };
        let Some((first, second)) = pair_part.split_once(" - ") else {
            continue;
        };
        let first = first.trim();
        let second = second.trim();
        if !first.is_empty() && !second.is_empty() {
            pairs.push((first.to_string(), second.to_string()));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_appearance_json_with_surrounding_text() {
        let response = r#"Here is the appearance you asked for:
{
  "hair": {"color": "black", "style": "short"},
  "eyes": {"color": "brown"},
  "height": "tall",
  "distinctive_features": ["scar on chin"]
}
Hope that helps!"#;

        let appearance = parse_appearance_json(response).expect("Should parse");
        assert_eq!(
            appearance.hair.as_ref().unwrap().color.as_deref(),
            Some("black")
        );
        assert_eq!(
            appearance.eyes.as_ref().unwrap().color.as_deref(),
            Some("brown")
        );
        assert_eq!(appearance.height.as_deref(), Some("tall"));
        assert_eq!(appearance.distinctive_features, vec!["scar on chin"]);
    }

    #[test]
    fn test_parse_appearance_json_no_json() {
        assert!(parse_appearance_json("I cannot help with that.").is_none());
    }

    #[test]
    fn test_parse_appearance_clamps_lists() {
        let features: Vec<String> = (0..15).map(|i| format!("\"feature {i}\"")).collect();
        let response = format!(
            "{{\"distinctive_features\": [{}]}}",
            features.join(", ")
        );

        let appearance = parse_appearance_json(&response).expect("Should parse");
        assert_eq!(appearance.distinctive_features.len(), 10);
    }

    #[test]
    fn test_parse_contradictions() {
        let response = "\
brave - cowardly: these directly oppose each other
generous - greedy: incompatible attitudes toward others";

        let pairs = parse_contradictions(response);
        assert_eq!(
            pairs,
            vec![
                ("brave".to_string(), "cowardly".to_string()),
                ("generous".to_string(), "greedy".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_contradictions_none_found() {
        assert!(parse_contradictions("No contradictions found.").is_empty());
    }

    #[test]
    fn test_parse_contradictions_ignores_malformed_lines() {
        let response = "\
some preamble without the format
brave - cowardly: conflict";

        let pairs = parse_contradictions(response);
        assert_eq!(pairs.len(), 1);
    }
}
