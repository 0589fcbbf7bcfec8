//! Character record store: CRUD, index synchronization, dependency rules.
//!
//! The store is the only writer of `story_data/characters/` and the index
//! file; callers never touch the layout directly. Per character the
//! lifecycle is `absent -> created -> updated* -> deleted`.

use crate::character::{Character, CharacterRole};
use crate::error::StoryError;
use crate::index::{CharacterIndex, CharacterIndexEntry};
use crate::project_store::{CHARACTERS_DIR, CHARACTERS_INDEX, STORY_DATA_DIR};
use crate::sanitize::sanitize_for_filesystem;
use crate::timestamp_now;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the record file inside each character directory.
pub const DESCRIPTION_FILE: &str = "description.json";

/// Summary row for character listings.
#[derive(Debug, Clone, Serialize)]
pub struct CharacterSummary {
    pub name: String,
    pub role: CharacterRole,
    pub age: Option<u16>,
    /// Completion percentage; 0 when the record could not be read.
    pub completion: u8,
}

/// Store for the character records and index of one project.
#[derive(Debug, Clone)]
pub struct CharacterStore {
    project_path: PathBuf,
    characters_dir: PathBuf,
    index_path: PathBuf,
}

impl CharacterStore {
    /// Create a store rooted at the given project directory.
    pub fn new(project_path: impl AsRef<Path>) -> Self {
        let project_path = project_path.as_ref().to_path_buf();
        let story_data = project_path.join(STORY_DATA_DIR);
        Self {
            characters_dir: story_data.join(CHARACTERS_DIR),
            index_path: story_data.join(CHARACTERS_INDEX),
            project_path,
        }
    }

    /// Create a new character.
    ///
    /// Stamps both timestamps, fills in a missing `lora_trigger`, writes
    /// the record file, and upserts the index entry. Fails with
    /// `CharacterExists` when a directory for the sanitized name is
    /// already present.
    pub async fn create_character(
        &self,
        character: &mut Character,
    ) -> Result<PathBuf, StoryError> {
        self.ensure_project()?;
        character.validate()?;

        let char_dir = self.character_dir(&character.basics.name);
        if char_dir.exists() {
            return Err(StoryError::CharacterExists {
                name: character.basics.name.clone(),
            });
        }
        fs::create_dir_all(&char_dir).await?;

        let now = timestamp_now();
        character.created_at = now.clone();
        character.updated_at = now;
        if character.lora_trigger.is_none() {
            character.lora_trigger = Some(character.generate_lora_trigger());
        }

        let content = serde_json::to_string_pretty(character)?;
        fs::write(char_dir.join(DESCRIPTION_FILE), content).await?;

        let mut index = self.load_index().await?;
        index.add_entry(self.index_entry(character));
        self.save_index(&index).await?;

        Ok(char_dir)
    }

    /// Load a character by name (case-insensitive).
    ///
    /// The index is consulted first; a stale or missing entry falls back
    /// to the directory derived from the sanitized name. The record file
    /// is the source of truth either way.
    pub async fn get_character(&self, name: &str) -> Result<Character, StoryError> {
        self.ensure_project()?;

        let index = self.load_index().await.unwrap_or_default();
        if let Some(entry) = index.get_entry(name) {
            let char_file = self
                .project_path
                .join(STORY_DATA_DIR)
                .join(&entry.path)
                .join(DESCRIPTION_FILE);
            if char_file.exists() {
                if let Ok(character) = read_character(&char_file).await {
                    return Ok(character);
                }
            }
        }

        let char_file = self.character_file(name);
        if char_file.exists() {
            if let Ok(character) = read_character(&char_file).await {
                return Ok(character);
            }
        }

        Err(StoryError::CharacterNotFound {
            name: name.to_string(),
        })
    }

    /// Update an existing character.
    ///
    /// Refreshes `updated_at` and, when an appearance is present,
    /// recomputes the `lora_trigger` unconditionally so appearance edits
    /// are always reflected. Overwrites the record and upserts the index.
    pub async fn update_character(&self, character: &mut Character) -> Result<(), StoryError> {
        self.ensure_project()?;
        character.validate()?;

        let name = character.basics.name.clone();
        let mut char_file = self.character_file(&name);
        if !char_file.exists() {
            let index = self.load_index().await.unwrap_or_default();
            if let Some(entry) = index.get_entry(&name) {
                char_file = self
                    .project_path
                    .join(STORY_DATA_DIR)
                    .join(&entry.path)
                    .join(DESCRIPTION_FILE);
            }
            if !char_file.exists() {
                return Err(StoryError::CharacterNotFound { name });
            }
        }

        character.updated_at = timestamp_now();
        if character.appearance.is_some() {
            character.lora_trigger = Some(character.generate_lora_trigger());
        }

        let content = serde_json::to_string_pretty(character)?;
        fs::write(&char_file, content).await?;

        let mut index = self.load_index().await?;
        index.add_entry(self.index_entry(character));
        self.save_index(&index).await?;

        Ok(())
    }

    /// Delete a character, optionally cascading into dependent records.
    ///
    /// Without `force`, any character holding a relationship to the target
    /// blocks deletion with `RelationshipDependency` and nothing is
    /// mutated. With `force`, matching relationship entries are stripped
    /// from each dependent (best-effort: a dependent that fails to load is
    /// skipped), then the directory tree and index entry are removed.
    ///
    /// Returns the names of the affected dependents.
    pub async fn delete_character(
        &self,
        name: &str,
        force: bool,
    ) -> Result<Vec<String>, StoryError> {
        self.ensure_project()?;

        let mut char_dir = self.character_dir(name);
        if !char_dir.exists() {
            let index = self.load_index().await.unwrap_or_default();
            if let Some(entry) = index.get_entry(name) {
                char_dir = self.project_path.join(STORY_DATA_DIR).join(&entry.path);
            }
            if !char_dir.exists() {
                return Err(StoryError::CharacterNotFound {
                    name: name.to_string(),
                });
            }
        }

        let dependencies = self.relationship_dependencies(name).await?;

        if !dependencies.is_empty() && !force {
            return Err(StoryError::RelationshipDependency {
                name: name.to_string(),
                dependents: dependencies,
            });
        }

        for dep_name in &dependencies {
            let Ok(mut dependent) = self.get_character(dep_name).await else {
                continue;
            };
            dependent.relationships.retain(|rel| !rel.targets(name));
            self.update_character(&mut dependent).await?;
        }

        fs::remove_dir_all(&char_dir).await?;

        let mut index = self.load_index().await?;
        index.remove_entry(name);
        self.save_index(&index).await?;

        Ok(dependencies)
    }

    /// List all characters, optionally filtered by role.
    ///
    /// Identity, role, and age come from the index; each record is loaded
    /// for its completion percentage, failing open to 0 when unreadable.
    /// An unrecognized filter string means "no filter".
    pub async fn list_characters(
        &self,
        role_filter: Option<&str>,
    ) -> Result<Vec<CharacterSummary>, StoryError> {
        self.ensure_project()?;

        let filter = role_filter.and_then(CharacterRole::parse);
        let index = self.load_index().await?;

        let mut result = Vec::new();
        for entry in &index.characters {
            if let Some(role) = filter {
                if entry.role != role {
                    continue;
                }
            }

            let completion = match self.get_character(&entry.name).await {
                Ok(character) => character.completion_percentage(),
                Err(_) => 0,
            };

            result.push(CharacterSummary {
                name: entry.name.clone(),
                role: entry.role,
                age: entry.age,
                completion,
            });
        }

        Ok(result)
    }

    /// Check whether a character is indexed.
    pub async fn character_exists(&self, name: &str) -> bool {
        if self.ensure_project().is_err() {
            return false;
        }
        self.load_index()
            .await
            .unwrap_or_default()
            .get_entry(name)
            .is_some()
    }

    /// Names of all other characters whose relationships reference `name`.
    ///
    /// This is the same scan `delete_character` uses, exposed for
    /// pre-delete confirmation prompts.
    pub async fn relationship_dependencies(
        &self,
        name: &str,
    ) -> Result<Vec<String>, StoryError> {
        self.ensure_project()?;

        let lower = name.to_lowercase();
        let index = self.load_index().await?;

        let mut dependencies = Vec::new();
        for entry in &index.characters {
            if entry.name.to_lowercase() == lower {
                continue;
            }
            let Ok(character) = self.get_character(&entry.name).await else {
                continue;
            };
            if character.relationships.iter().any(|rel| rel.targets(name)) {
                dependencies.push(entry.name.clone());
            }
        }

        Ok(dependencies)
    }

    /// Rebuild the index from scratch by scanning character directories.
    ///
    /// This is the repair path for index/record divergence. Directories
    /// whose record is missing or unparsable are skipped.
    pub async fn rebuild_index(&self) -> Result<(), StoryError> {
        self.ensure_project()?;

        let mut index = CharacterIndex::new();
        let mut entries = fs::read_dir(&self.characters_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let record_file = path.join(DESCRIPTION_FILE);
            if !record_file.exists() {
                continue;
            }
            let Ok(character) = read_character(&record_file).await else {
                continue;
            };

            let dir_name = entry.file_name().to_string_lossy().to_string();
            index.add_entry(CharacterIndexEntry {
                name: character.basics.name.clone(),
                role: character.basics.role,
                age: character.basics.age,
                path: format!("{CHARACTERS_DIR}/{dir_name}"),
                updated_at: character.updated_at.clone(),
            });
        }

        self.save_index(&index).await
    }

    fn ensure_project(&self) -> Result<(), StoryError> {
        if !self.project_path.exists() || !self.characters_dir.is_dir() {
            return Err(StoryError::ProjectNotFound {
                path: self.project_path.clone(),
            });
        }
        Ok(())
    }

    async fn load_index(&self) -> Result<CharacterIndex, StoryError> {
        if !self.index_path.exists() {
            return Ok(CharacterIndex::new());
        }
        let content = fs::read_to_string(&self.index_path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn save_index(&self, index: &CharacterIndex) -> Result<(), StoryError> {
        let content = serde_json::to_string_pretty(index)?;
        fs::write(&self.index_path, content).await?;
        Ok(())
    }

    fn character_dir(&self, name: &str) -> PathBuf {
        self.characters_dir.join(sanitize_for_filesystem(name))
    }

    fn character_file(&self, name: &str) -> PathBuf {
        self.character_dir(name).join(DESCRIPTION_FILE)
    }

    fn index_entry(&self, character: &Character) -> CharacterIndexEntry {
        CharacterIndexEntry {
            name: character.basics.name.clone(),
            role: character.basics.role,
            age: character.basics.age,
            path: format!(
                "{CHARACTERS_DIR}/{}",
                sanitize_for_filesystem(&character.basics.name)
            ),
            updated_at: character.updated_at.clone(),
        }
    }
}

async fn read_character(path: &Path) -> Result<Character, StoryError> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterBasics;
    use crate::project_store::ProjectStore;
    use tempfile::TempDir;

    async fn sample_project(temp_dir: &TempDir) -> PathBuf {
        ProjectStore::new()
            .create_project("Test Project", "fantasy", "A test story.", temp_dir.path())
            .await
            .expect("Create project should succeed")
    }

    fn character(name: &str) -> Character {
        Character::new(CharacterBasics::new(name, CharacterRole::Supporting).unwrap())
    }

    #[tokio::test]
    async fn test_create_requires_project_skeleton() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = CharacterStore::new(temp_dir.path().join("missing"));

        let result = store.create_character(&mut character("Alex")).await;
        assert!(matches!(result, Err(StoryError::ProjectNotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_stamps_timestamps_and_trigger() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let project = sample_project(&temp_dir).await;
        let store = CharacterStore::new(&project);

        let mut alex = character("Alex Chen");
        let dir = store.create_character(&mut alex).await.unwrap();

        assert!(dir.ends_with("alex_chen"));
        assert!(!alex.created_at.is_empty());
        assert_eq!(alex.created_at, alex.updated_at);
        assert_eq!(alex.lora_trigger.as_deref(), Some("alex_chen"));
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let project = sample_project(&temp_dir).await;
        let store = CharacterStore::new(&project);

        store.create_character(&mut character("Alex")).await.unwrap();

        // Same sanitized directory, different casing
        let result = store.create_character(&mut character("ALEX")).await;
        assert!(matches!(result, Err(StoryError::CharacterExists { .. })));
    }

    #[tokio::test]
    async fn test_update_absent_character_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let project = sample_project(&temp_dir).await;
        let store = CharacterStore::new(&project);

        let result = store.update_character(&mut character("Ghost")).await;
        assert!(matches!(result, Err(StoryError::CharacterNotFound { .. })));
    }

    #[tokio::test]
    async fn test_get_falls_back_to_direct_path_when_index_stale() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let project = sample_project(&temp_dir).await;
        let store = CharacterStore::new(&project);

        store
            .create_character(&mut character("Alex Chen"))
            .await
            .unwrap();

        // Wipe the index; the record file still resolves
        std::fs::write(
            project.join(STORY_DATA_DIR).join(CHARACTERS_INDEX),
            "{\"characters\":[]}",
        )
        .unwrap();

        let loaded = store.get_character("alex chen").await.unwrap();
        assert_eq!(loaded.basics.name, "Alex Chen");
    }
}
