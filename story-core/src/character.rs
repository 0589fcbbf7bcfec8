//! Character records: the structured profile of one story character.
//!
//! A character is built up in wizard phases (basics, appearance,
//! personality, backstory, relationships); every section beyond basics is
//! optional. Character identity is the case-insensitive `basics.name`.

use crate::error::StoryError;
use crate::sanitize::is_valid_character_name;
use crate::timestamp_now;
use serde::{Deserialize, Serialize};

/// Character's role in the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterRole {
    Protagonist,
    LoveInterest,
    Antagonist,
    #[default]
    Supporting,
    Background,
}

impl CharacterRole {
    /// Get the display name.
    pub fn name(&self) -> &'static str {
        match self {
            CharacterRole::Protagonist => "protagonist",
            CharacterRole::LoveInterest => "love_interest",
            CharacterRole::Antagonist => "antagonist",
            CharacterRole::Supporting => "supporting",
            CharacterRole::Background => "background",
        }
    }

    pub fn all() -> &'static [CharacterRole] {
        &[
            CharacterRole::Protagonist,
            CharacterRole::LoveInterest,
            CharacterRole::Antagonist,
            CharacterRole::Supporting,
            CharacterRole::Background,
        ]
    }

    /// Parse a role string; `None` for unrecognized input.
    pub fn parse(value: &str) -> Option<CharacterRole> {
        let lower = value.trim().to_lowercase();
        CharacterRole::all()
            .iter()
            .copied()
            .find(|role| role.name() == lower)
    }
}

/// Type of relationship between characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Family,
    Friend,
    Enemy,
    Romantic,
    Professional,
    Acquaintance,
}

impl RelationshipType {
    /// Get the display name.
    pub fn name(&self) -> &'static str {
        match self {
            RelationshipType::Family => "family",
            RelationshipType::Friend => "friend",
            RelationshipType::Enemy => "enemy",
            RelationshipType::Romantic => "romantic",
            RelationshipType::Professional => "professional",
            RelationshipType::Acquaintance => "acquaintance",
        }
    }

    pub fn all() -> &'static [RelationshipType] {
        &[
            RelationshipType::Family,
            RelationshipType::Friend,
            RelationshipType::Enemy,
            RelationshipType::Romantic,
            RelationshipType::Professional,
            RelationshipType::Acquaintance,
        ]
    }

    /// Parse a relationship type string; `None` for unrecognized input.
    pub fn parse(value: &str) -> Option<RelationshipType> {
        let lower = value.trim().to_lowercase();
        RelationshipType::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == lower)
    }
}

/// Basic character identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterBasics {
    /// Character name, unique within the project (case-insensitive).
    pub name: String,
    #[serde(default)]
    pub age: Option<u16>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub role: CharacterRole,
}

impl CharacterBasics {
    /// Create validated basics with the given name and role.
    ///
    /// The name is trimmed; its original casing is preserved.
    pub fn new(name: &str, role: CharacterRole) -> Result<Self, StoryError> {
        Ok(Self {
            name: validate_name(name)?,
            age: None,
            gender: None,
            role,
        })
    }

    pub fn with_age(mut self, age: u16) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    fn validate(&self) -> Result<(), StoryError> {
        validate_name(&self.name)?;
        if let Some(age) = self.age {
            if age > 500 {
                return Err(StoryError::Validation {
                    field: "age",
                    message: "age must be between 0 and 500".to_string(),
                });
            }
        }
        check_opt_len("gender", self.gender.as_deref(), 50)?;
        Ok(())
    }
}

/// Hair appearance details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HairDescription {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub length: Option<String>,
}

/// Eye appearance details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeDescription {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub shape: Option<String>,
}

/// Physical appearance details for consistent visual generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAppearance {
    #[serde(default)]
    pub hair: Option<HairDescription>,
    #[serde(default)]
    pub eyes: Option<EyeDescription>,
    #[serde(default)]
    pub skin_tone: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub build: Option<String>,
    /// Notable features (scars, birthmarks, etc.).
    #[serde(default)]
    pub distinctive_features: Vec<String>,
    #[serde(default)]
    pub clothing_style: Option<String>,
    #[serde(default)]
    pub accessories: Vec<String>,
}

impl CharacterAppearance {
    fn validate(&self) -> Result<(), StoryError> {
        if let Some(hair) = &self.hair {
            check_opt_len("hair color", hair.color.as_deref(), 50)?;
            check_opt_len("hair style", hair.style.as_deref(), 50)?;
            check_opt_len("hair length", hair.length.as_deref(), 50)?;
        }
        if let Some(eyes) = &self.eyes {
            check_opt_len("eye color", eyes.color.as_deref(), 50)?;
            check_opt_len("eye shape", eyes.shape.as_deref(), 50)?;
        }
        check_opt_len("skin_tone", self.skin_tone.as_deref(), 50)?;
        check_opt_len("height", self.height.as_deref(), 50)?;
        check_opt_len("build", self.build.as_deref(), 50)?;
        check_list_len("distinctive_features", &self.distinctive_features, 10)?;
        check_opt_len("clothing_style", self.clothing_style.as_deref(), 200)?;
        check_list_len("accessories", &self.accessories, 10)?;
        Ok(())
    }
}

/// Personality traits for consistent dialogue and behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterPersonality {
    /// Core personality traits (3-5).
    #[serde(default)]
    pub primary_traits: Vec<String>,
    #[serde(default)]
    pub secondary_traits: Vec<String>,
    #[serde(default)]
    pub flaws: Vec<String>,
    /// How they speak (formal, casual, etc.).
    #[serde(default)]
    pub speaking_style: Option<String>,
    #[serde(default)]
    pub speech_quirks: Vec<String>,
    #[serde(default)]
    pub motivations: Vec<String>,
    #[serde(default)]
    pub fears: Vec<String>,
    /// Hidden aspects of personality.
    #[serde(default)]
    pub secrets: Vec<String>,
}

impl CharacterPersonality {
    fn validate(&self) -> Result<(), StoryError> {
        check_list_len("primary_traits", &self.primary_traits, 5)?;
        check_list_len("secondary_traits", &self.secondary_traits, 3)?;
        check_list_len("flaws", &self.flaws, 3)?;
        check_opt_len("speaking_style", self.speaking_style.as_deref(), 100)?;
        check_list_len("speech_quirks", &self.speech_quirks, 5)?;
        check_list_len("motivations", &self.motivations, 5)?;
        check_list_len("fears", &self.fears, 5)?;
        check_list_len("secrets", &self.secrets, 5)?;
        Ok(())
    }
}

/// Character history and background.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterBackstory {
    /// Brief backstory summary. Required when a backstory is present.
    pub summary: String,
    /// Detailed backstory.
    #[serde(default)]
    pub full: Option<String>,
    /// Formative life events.
    #[serde(default)]
    pub key_events: Vec<String>,
    /// Things other characters don't know.
    #[serde(default)]
    pub secrets: Vec<String>,
}

impl CharacterBackstory {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    pub fn with_full(mut self, full: impl Into<String>) -> Self {
        self.full = Some(full.into());
        self
    }

    fn validate(&self) -> Result<(), StoryError> {
        check_required_len("backstory summary", &self.summary, 500)?;
        check_opt_len("backstory full", self.full.as_deref(), 5000)?;
        check_list_len("key_events", &self.key_events, 10)?;
        check_list_len("backstory secrets", &self.secrets, 5)?;
        Ok(())
    }
}

/// A relationship to another character in the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Name of the related character.
    pub target_character: String,
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    /// Description of the relationship dynamic.
    pub dynamic: String,
    /// How they felt about each other initially.
    #[serde(default)]
    pub initial_feeling: Option<String>,
    #[serde(default)]
    pub history: Option<String>,
    /// Sources of conflict or tension.
    #[serde(default)]
    pub tension_points: Vec<String>,
}

impl Relationship {
    pub fn new(
        target_character: impl Into<String>,
        kind: RelationshipType,
        dynamic: impl Into<String>,
    ) -> Self {
        Self {
            target_character: target_character.into(),
            kind,
            dynamic: dynamic.into(),
            initial_feeling: None,
            history: None,
            tension_points: Vec::new(),
        }
    }

    pub fn with_initial_feeling(mut self, feeling: impl Into<String>) -> Self {
        self.initial_feeling = Some(feeling.into());
        self
    }

    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        self.history = Some(history.into());
        self
    }

    /// Check whether this relationship targets the given character name.
    pub fn targets(&self, name: &str) -> bool {
        self.target_character.to_lowercase() == name.to_lowercase()
    }

    fn validate(&self) -> Result<(), StoryError> {
        check_required_len("target_character", &self.target_character, 100)?;
        check_required_len("relationship dynamic", &self.dynamic, 200)?;
        check_opt_len("initial_feeling", self.initial_feeling.as_deref(), 200)?;
        check_opt_len("relationship history", self.history.as_deref(), 500)?;
        check_list_len("tension_points", &self.tension_points, 5)?;
        Ok(())
    }
}

/// Complete character profile combining all wizard phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub basics: CharacterBasics,
    #[serde(default)]
    pub appearance: Option<CharacterAppearance>,
    #[serde(default)]
    pub personality: Option<CharacterPersonality>,
    #[serde(default)]
    pub backstory: Option<CharacterBackstory>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Derived trigger tag for downstream image-generation tooling.
    #[serde(default)]
    pub lora_trigger: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Character {
    /// Create a character with only the basics filled in.
    pub fn new(basics: CharacterBasics) -> Self {
        let now = timestamp_now();
        Self {
            basics,
            appearance: None,
            personality: None,
            backstory: None,
            relationships: Vec::new(),
            lora_trigger: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn with_appearance(mut self, appearance: CharacterAppearance) -> Self {
        self.appearance = Some(appearance);
        self
    }

    pub fn with_personality(mut self, personality: CharacterPersonality) -> Self {
        self.personality = Some(personality);
        self
    }

    pub fn with_backstory(mut self, backstory: CharacterBackstory) -> Self {
        self.backstory = Some(backstory);
        self
    }

    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Check every section against its field constraints.
    pub fn validate(&self) -> Result<(), StoryError> {
        self.basics.validate()?;
        if let Some(appearance) = &self.appearance {
            appearance.validate()?;
        }
        if let Some(personality) = &self.personality {
            personality.validate()?;
        }
        if let Some(backstory) = &self.backstory {
            backstory.validate()?;
        }
        for relationship in &self.relationships {
            relationship.validate()?;
        }
        Ok(())
    }

    /// How complete the profile is, as a percentage in steps of 20.
    ///
    /// Counts basics (always present), appearance, personality, backstory,
    /// and having at least one relationship.
    pub fn completion_percentage(&self) -> u8 {
        let sections = [
            true,
            self.appearance.is_some(),
            self.personality.is_some(),
            self.backstory.is_some(),
            !self.relationships.is_empty(),
        ];
        let filled = sections.iter().filter(|&&s| s).count();
        (filled * 100 / sections.len()) as u8
    }

    /// Derive the LoRA trigger string from name and appearance.
    ///
    /// Order-sensitive: name, hair (color then style), eye color, then up
    /// to two distinctive features, joined with `", "`.
    pub fn generate_lora_trigger(&self) -> String {
        let base = self.basics.name.to_lowercase().replace(' ', "_");

        let Some(appearance) = &self.appearance else {
            return base;
        };

        let mut parts = vec![base];

        if let Some(hair) = &appearance.hair {
            let hair_parts: Vec<&str> = [hair.color.as_deref(), hair.style.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if !hair_parts.is_empty() {
                parts.push(format!("{}_hair", hair_parts.join("_")));
            }
        }

        if let Some(color) = appearance.eyes.as_ref().and_then(|e| e.color.as_deref()) {
            parts.push(format!("{color}_eyes"));
        }

        for feature in appearance.distinctive_features.iter().take(2) {
            parts.push(feature.to_lowercase().replace(' ', "_"));
        }

        parts.join(", ")
    }
}

fn validate_name(name: &str) -> Result<String, StoryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoryError::Validation {
            field: "name",
            message: "character name cannot be empty".to_string(),
        });
    }
    if trimmed.chars().count() > 100 {
        return Err(StoryError::Validation {
            field: "name",
            message: "character name must be at most 100 characters".to_string(),
        });
    }
    if !is_valid_character_name(trimmed) {
        return Err(StoryError::Validation {
            field: "name",
            message: "character name can only contain letters, numbers, spaces, \
                      hyphens, underscores, and apostrophes"
                .to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn check_required_len(field: &'static str, value: &str, max: usize) -> Result<(), StoryError> {
    if value.trim().is_empty() {
        return Err(StoryError::Validation {
            field,
            message: "cannot be empty".to_string(),
        });
    }
    check_len(field, value, max)
}

fn check_opt_len(field: &'static str, value: Option<&str>, max: usize) -> Result<(), StoryError> {
    match value {
        Some(value) => check_len(field, value, max),
        None => Ok(()),
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), StoryError> {
    if value.chars().count() > max {
        return Err(StoryError::Validation {
            field,
            message: format!("must be at most {max} characters"),
        });
    }
    Ok(())
}

fn check_list_len(field: &'static str, list: &[String], max: usize) -> Result<(), StoryError> {
    if list.len() > max {
        return Err(StoryError::Validation {
            field,
            message: format!("maximum {max} items allowed"),
        });
    }
    Ok(())
}
