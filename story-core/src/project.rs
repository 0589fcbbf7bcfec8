//! Project record: the root configuration of a story project.

use crate::error::StoryError;
use crate::sanitize::is_valid_project_name;
use crate::timestamp_now;
use serde::{Deserialize, Serialize};

/// Root project configuration stored in `story.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project name, also the source of the directory name.
    pub name: String,
    /// Story genre, normalized to lowercase.
    pub genre: String,
    /// Brief story synopsis.
    pub synopsis: String,
    /// When the project was created. Immutable thereafter.
    pub created_at: String,
}

impl Project {
    /// Create a validated project record.
    ///
    /// All fields are trimmed; the genre is normalized to lowercase.
    pub fn new(name: &str, genre: &str, synopsis: &str) -> Result<Self, StoryError> {
        let name = validate_name(name)?;
        let genre = validate_genre(genre)?;
        let synopsis = validate_synopsis(synopsis)?;

        Ok(Self {
            name,
            genre,
            synopsis,
            created_at: timestamp_now(),
        })
    }

    /// Re-check a record read from disk against the field constraints.
    pub fn validate(&self) -> Result<(), StoryError> {
        validate_name(&self.name)?;
        validate_genre(&self.genre)?;
        validate_synopsis(&self.synopsis)?;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, StoryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoryError::Validation {
            field: "name",
            message: "project name cannot be empty".to_string(),
        });
    }
    if trimmed.chars().count() > 100 {
        return Err(StoryError::Validation {
            field: "name",
            message: "project name must be at most 100 characters".to_string(),
        });
    }
    if !is_valid_project_name(trimmed) {
        return Err(StoryError::Validation {
            field: "name",
            message: "project name can only contain letters, numbers, spaces, \
                      hyphens, and underscores"
                .to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn validate_genre(genre: &str) -> Result<String, StoryError> {
    let trimmed = genre.trim();
    if trimmed.is_empty() {
        return Err(StoryError::Validation {
            field: "genre",
            message: "genre cannot be empty".to_string(),
        });
    }
    if trimmed.chars().count() > 50 {
        return Err(StoryError::Validation {
            field: "genre",
            message: "genre must be at most 50 characters".to_string(),
        });
    }
    Ok(trimmed.to_lowercase())
}

fn validate_synopsis(synopsis: &str) -> Result<String, StoryError> {
    let trimmed = synopsis.trim();
    if trimmed.is_empty() {
        return Err(StoryError::Validation {
            field: "synopsis",
            message: "synopsis cannot be empty".to_string(),
        });
    }
    if trimmed.chars().count() > 2000 {
        return Err(StoryError::Validation {
            field: "synopsis",
            message: "synopsis must be at most 2000 characters".to_string(),
        });
    }
    Ok(trimmed.to_string())
}
