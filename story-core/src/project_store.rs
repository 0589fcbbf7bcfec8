//! Project lifecycle: creation, validation, opening, summary.

use crate::error::StoryError;
use crate::index::CharacterIndex;
use crate::project::Project;
use crate::sanitize::sanitize_for_filesystem;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio::fs;

/// Project record file at the project root.
pub const STORY_JSON: &str = "story.json";
/// Data directory under the project root.
pub const STORY_DATA_DIR: &str = "story_data";
/// Character directory under `story_data/`.
pub const CHARACTERS_DIR: &str = "characters";
/// Character index file under `story_data/`.
pub const CHARACTERS_INDEX: &str = "characters_index.json";

/// Summary of a project for display.
#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub name: String,
    pub genre: String,
    pub synopsis: String,
    pub character_count: usize,
    /// Modification time of the record file, as seconds since the epoch.
    pub last_modified: String,
}

/// Service for project-level operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectStore;

impl ProjectStore {
    pub fn new() -> Self {
        Self
    }

    /// Create a new project under `parent_dir`.
    ///
    /// Validates the record fields, then creates the directory skeleton
    /// and writes `story.json` plus an empty character index:
    ///
    /// ```text
    /// <sanitized_name>/
    /// ├── story.json
    /// └── story_data/
    ///     ├── characters_index.json
    ///     └── characters/
    /// ```
    ///
    /// The writes are sequential, not atomic; a crash mid-way can leave a
    /// partial skeleton behind.
    pub async fn create_project(
        &self,
        name: &str,
        genre: &str,
        synopsis: &str,
        parent_dir: impl AsRef<Path>,
    ) -> Result<PathBuf, StoryError> {
        let project = Project::new(name, genre, synopsis)?;

        let project_path = parent_dir
            .as_ref()
            .join(sanitize_for_filesystem(&project.name));
        if project_path.exists() {
            return Err(StoryError::ProjectExists { name: project.name });
        }

        let story_data = project_path.join(STORY_DATA_DIR);
        fs::create_dir_all(story_data.join(CHARACTERS_DIR)).await?;

        let record = serde_json::to_string_pretty(&project)?;
        fs::write(project_path.join(STORY_JSON), record).await?;

        let index = serde_json::to_string_pretty(&CharacterIndex::new())?;
        fs::write(story_data.join(CHARACTERS_INDEX), index).await?;

        Ok(project_path)
    }

    /// Structural check that never fails: returns every violation found
    /// rather than stopping at the first.
    pub async fn validate_project(&self, path: impl AsRef<Path>) -> (bool, Vec<String>) {
        let path = path.as_ref();
        let mut errors = Vec::new();

        if !path.exists() {
            errors.push(format!(
                "Project directory does not exist: {}",
                path.display()
            ));
            return (false, errors);
        }
        if !path.is_dir() {
            errors.push(format!("Path is not a directory: {}", path.display()));
            return (false, errors);
        }

        let story_json = path.join(STORY_JSON);
        if !story_json.is_file() {
            errors.push(format!("Missing {STORY_JSON}"));
        } else {
            match fs::read_to_string(&story_json).await {
                Ok(content) => match serde_json::from_str::<Project>(&content) {
                    Ok(project) => {
                        if let Err(e) = project.validate() {
                            errors.push(format!("Invalid project data in {STORY_JSON}: {e}"));
                        }
                    }
                    Err(e) => errors.push(format!("Invalid JSON in {STORY_JSON}: {e}")),
                },
                Err(e) => errors.push(format!("Unreadable {STORY_JSON}: {e}")),
            }
        }

        let story_data = path.join(STORY_DATA_DIR);
        if !story_data.is_dir() {
            errors.push(format!("Missing {STORY_DATA_DIR} directory"));
        } else if !story_data.join(CHARACTERS_DIR).is_dir() {
            errors.push(format!("Missing {STORY_DATA_DIR}/{CHARACTERS_DIR} directory"));
        }

        (errors.is_empty(), errors)
    }

    /// Open and validate an existing project.
    ///
    /// A missing root directory or record file is `ProjectNotFound`; any
    /// other structural violation is `ProjectInvalid` with the full error
    /// list from [`validate_project`](Self::validate_project).
    pub async fn open_project(&self, path: impl AsRef<Path>) -> Result<Project, StoryError> {
        let path = path.as_ref();

        let (is_valid, errors) = self.validate_project(path).await;
        if !is_valid {
            if !path.exists() || !path.join(STORY_JSON).is_file() {
                return Err(StoryError::ProjectNotFound {
                    path: path.to_path_buf(),
                });
            }
            return Err(StoryError::ProjectInvalid { errors });
        }

        let content = fs::read_to_string(path.join(STORY_JSON)).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Get a display summary of the project.
    ///
    /// The character count comes from the index; an unreadable index falls
    /// back to counting character subdirectories.
    pub async fn project_summary(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<ProjectSummary, StoryError> {
        let path = path.as_ref();
        let project = self.open_project(path).await?;

        let index_path = path.join(STORY_DATA_DIR).join(CHARACTERS_INDEX);
        let character_count = match fs::read_to_string(&index_path).await {
            Ok(content) => match serde_json::from_str::<CharacterIndex>(&content) {
                Ok(index) => index.len(),
                Err(_) => count_character_dirs(path).await,
            },
            Err(_) => count_character_dirs(path).await,
        };

        let metadata = fs::metadata(path.join(STORY_JSON)).await?;
        let last_modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs().to_string())
            .unwrap_or_default();

        Ok(ProjectSummary {
            name: project.name,
            genre: project.genre,
            synopsis: project.synopsis,
            character_count,
            last_modified,
        })
    }
}

async fn count_character_dirs(project_path: &Path) -> usize {
    let characters_dir = project_path.join(STORY_DATA_DIR).join(CHARACTERS_DIR);
    let mut count = 0;
    if let Ok(mut entries) = fs::read_dir(&characters_dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.path().is_dir() {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_project_writes_skeleton() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = ProjectStore::new();

        let path = store
            .create_project("My Visual Novel", "Romance", "Love story.", temp_dir.path())
            .await
            .expect("Create should succeed");

        assert!(path.ends_with("my_visual_novel"));
        assert!(path.join(STORY_JSON).is_file());
        assert!(path.join(STORY_DATA_DIR).join(CHARACTERS_INDEX).is_file());
        assert!(path.join(STORY_DATA_DIR).join(CHARACTERS_DIR).is_dir());
    }

    #[tokio::test]
    async fn test_validate_accumulates_all_errors() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = ProjectStore::new();

        // Bare directory: both the record and the data directory are missing
        let (is_valid, errors) = store.validate_project(temp_dir.path()).await;
        assert!(!is_valid);
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn test_open_missing_project_is_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = ProjectStore::new();

        let result = store.open_project(temp_dir.path().join("nope")).await;
        assert!(matches!(result, Err(StoryError::ProjectNotFound { .. })));
    }

    #[tokio::test]
    async fn test_open_broken_project_is_invalid() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = ProjectStore::new();

        let path = store
            .create_project("Broken", "drama", "Synopsis.", temp_dir.path())
            .await
            .unwrap();
        std::fs::remove_dir_all(path.join(STORY_DATA_DIR)).unwrap();

        let result = store.open_project(&path).await;
        assert!(matches!(result, Err(StoryError::ProjectInvalid { .. })));
    }
}
