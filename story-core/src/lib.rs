//! Visual novel story project engine.
//!
//! This crate provides:
//! - Validated project and character records
//! - A filesystem persistence layer with a character index
//! - Relationship dependency rules with cascade delete
//! - AI-assisted authoring via a local Ollama endpoint
//!
//! # Quick Start
//!
//! ```ignore
//! use story_core::{Character, CharacterBasics, CharacterRole, CharacterStore, ProjectStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), story_core::StoryError> {
//!     let projects = ProjectStore::new();
//!     let path = projects
//!         .create_project("My Visual Novel", "Romance", "A love story.", ".")
//!         .await?;
//!
//!     let characters = CharacterStore::new(&path);
//!     let basics = CharacterBasics::new("Alex Chen", CharacterRole::Protagonist)?;
//!     characters.create_character(&mut Character::new(basics)).await?;
//!     Ok(())
//! }
//! ```

pub mod assist;
pub mod character;
pub mod character_store;
pub mod config;
pub mod error;
pub mod index;
pub mod project;
pub mod project_store;
pub mod prompts;
pub mod sanitize;

// Primary public API
pub use assist::{StoryAssistant, TextStream};
pub use character::{
    Character, CharacterAppearance, CharacterBackstory, CharacterBasics, CharacterPersonality,
    CharacterRole, EyeDescription, HairDescription, Relationship, RelationshipType,
};
pub use character_store::{CharacterStore, CharacterSummary, DESCRIPTION_FILE};
pub use config::LlmConfig;
pub use error::StoryError;
pub use index::{CharacterIndex, CharacterIndexEntry};
pub use project::Project;
pub use project_store::{
    ProjectStore, ProjectSummary, CHARACTERS_DIR, CHARACTERS_INDEX, STORY_DATA_DIR, STORY_JSON,
};

// Re-export the client error type so callers can match on assistant
// failures without depending on the client crate directly.
pub use ollama::Error as LlmError;

/// Current time as seconds since the Unix epoch.
pub fn timestamp_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", now.as_secs())
}
