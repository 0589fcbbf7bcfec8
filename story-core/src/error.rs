//! Error types for story project operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from record construction and store operations.
#[derive(Debug, Error)]
pub enum StoryError {
    /// A field value violated its construction-time constraints.
    /// Never persisted: validation runs before any write.
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Project not found at: {}", path.display())]
    ProjectNotFound { path: PathBuf },

    /// The project directory exists but its structure is broken.
    /// Carries every violation found, not just the first.
    #[error("Invalid project structure: {}", errors.join("; "))]
    ProjectInvalid { errors: Vec<String> },

    #[error("Project already exists: {name}")]
    ProjectExists { name: String },

    #[error("Character not found: {name}")]
    CharacterNotFound { name: String },

    #[error("Character already exists: {name}")]
    CharacterExists { name: String },

    /// Deletion blocked by other characters' relationship references.
    /// Retry with the forced variant to cascade.
    #[error("Cannot delete '{name}': referenced by characters: {}", dependents.join(", "))]
    RelationshipDependency {
        name: String,
        dependents: Vec<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
