//! QA tests for project and character persistence.
//!
//! These tests exercise the stores against a real (temporary) filesystem:
//! index/record consistency, cascade deletes, and the repair path.

use std::path::PathBuf;
use story_core::{
    Character, CharacterAppearance, CharacterBackstory, CharacterBasics, CharacterPersonality,
    CharacterRole, CharacterStore, EyeDescription, HairDescription, ProjectStore, Relationship,
    RelationshipType, StoryError, CHARACTERS_DIR, CHARACTERS_INDEX, STORY_DATA_DIR, STORY_JSON,
};
use tempfile::TempDir;

async fn create_test_project(temp_dir: &TempDir) -> PathBuf {
    ProjectStore::new()
        .create_project("Test Project", "Fantasy", "A test story.", temp_dir.path())
        .await
        .expect("Project creation should succeed")
}

fn basics(name: &str, role: CharacterRole) -> CharacterBasics {
    CharacterBasics::new(name, role).expect("Name should be valid")
}

fn alex_chen() -> Character {
    Character::new(basics("Alex Chen", CharacterRole::Protagonist)).with_appearance(
        CharacterAppearance {
            hair: Some(HairDescription {
                color: Some("black".to_string()),
                ..Default::default()
            }),
            eyes: Some(EyeDescription {
                color: Some("brown".to_string()),
                shape: None,
            }),
            ..Default::default()
        },
    )
}

// =============================================================================
// Project lifecycle
// =============================================================================

#[tokio::test]
async fn test_create_then_open_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = ProjectStore::new();

    let path = store
        .create_project("  Test Project  ", "Fantasy", "  A test story.  ", temp_dir.path())
        .await
        .expect("Create should succeed");

    let opened = store.open_project(&path).await.expect("Open should succeed");

    assert_eq!(opened.name, "Test Project");
    assert_eq!(opened.genre, "fantasy"); // normalized to lowercase
    assert_eq!(opened.synopsis, "A test story.");
    assert!(!opened.created_at.is_empty());
}

#[tokio::test]
async fn test_duplicate_project_conflicts_without_damage() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = ProjectStore::new();

    let path = create_test_project(&temp_dir).await;

    let result = store
        .create_project("Test Project", "horror", "Different story.", temp_dir.path())
        .await;
    assert!(matches!(result, Err(StoryError::ProjectExists { .. })));

    // First project untouched
    let opened = store.open_project(&path).await.expect("Open should succeed");
    assert_eq!(opened.genre, "fantasy");
}

#[tokio::test]
async fn test_project_summary_counts_characters() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = create_test_project(&temp_dir).await;
    let characters = CharacterStore::new(&path);

    let mut alex = alex_chen();
    characters.create_character(&mut alex).await.unwrap();

    let summary = ProjectStore::new()
        .project_summary(&path)
        .await
        .expect("Summary should succeed");

    assert_eq!(summary.name, "Test Project");
    assert_eq!(summary.character_count, 1);
    assert!(!summary.last_modified.is_empty());
}

#[tokio::test]
async fn test_project_summary_falls_back_to_directory_count() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = create_test_project(&temp_dir).await;
    let characters = CharacterStore::new(&path);

    let mut alex = alex_chen();
    characters.create_character(&mut alex).await.unwrap();

    // Corrupt the index; the summary should count directories instead
    std::fs::write(
        path.join(STORY_DATA_DIR).join(CHARACTERS_INDEX),
        "not json at all",
    )
    .unwrap();

    let summary = ProjectStore::new()
        .project_summary(&path)
        .await
        .expect("Summary should succeed");
    assert_eq!(summary.character_count, 1);
}

// =============================================================================
// Character round-trip and identity
// =============================================================================

#[tokio::test]
async fn test_character_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = create_test_project(&temp_dir).await;
    let store = CharacterStore::new(&path);

    let mut original = alex_chen()
        .with_personality(CharacterPersonality {
            primary_traits: vec!["curious".to_string(), "determined".to_string()],
            flaws: vec!["impulsive".to_string()],
            speaking_style: Some("casual and warm".to_string()),
            ..Default::default()
        })
        .with_backstory(
            CharacterBackstory::new("A journalism student uncovering family secrets."),
        );

    store
        .create_character(&mut original)
        .await
        .expect("Create should succeed");

    let loaded = store
        .get_character("Alex Chen")
        .await
        .expect("Get should succeed");

    assert_eq!(loaded.basics, original.basics);
    assert_eq!(loaded.appearance, original.appearance);
    assert_eq!(loaded.personality, original.personality);
    assert_eq!(loaded.backstory, original.backstory);
    assert_eq!(loaded.relationships, original.relationships);
    assert_eq!(
        loaded.lora_trigger.as_deref(),
        Some("alex_chen, black_hair, brown_eyes")
    );
}

#[tokio::test]
async fn test_lookup_is_case_insensitive() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = create_test_project(&temp_dir).await;
    let store = CharacterStore::new(&path);

    let mut alex = alex_chen();
    store.create_character(&mut alex).await.unwrap();

    let loaded = store
        .get_character("alex chen")
        .await
        .expect("Lowercase lookup should succeed");
    assert_eq!(loaded.basics.name, "Alex Chen");

    assert!(store.character_exists("ALEX CHEN").await);
}

#[tokio::test]
async fn test_get_missing_character_not_found() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = create_test_project(&temp_dir).await;
    let store = CharacterStore::new(&path);

    let result = store.get_character("Nobody").await;
    assert!(matches!(result, Err(StoryError::CharacterNotFound { .. })));
}

#[tokio::test]
async fn test_update_recomputes_lora_trigger() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = create_test_project(&temp_dir).await;
    let store = CharacterStore::new(&path);

    let mut alex = alex_chen();
    store.create_character(&mut alex).await.unwrap();

    // Change the hair color; the trigger must follow even though one is set
    let mut loaded = store.get_character("Alex Chen").await.unwrap();
    loaded.appearance.as_mut().unwrap().hair = Some(HairDescription {
        color: Some("silver".to_string()),
        ..Default::default()
    });
    store.update_character(&mut loaded).await.unwrap();

    let reloaded = store.get_character("Alex Chen").await.unwrap();
    assert_eq!(
        reloaded.lora_trigger.as_deref(),
        Some("alex_chen, silver_hair, brown_eyes")
    );
}

// =============================================================================
// Relationship dependencies and cascade delete
// =============================================================================

async fn project_with_relationship(temp_dir: &TempDir) -> (PathBuf, CharacterStore) {
    let path = create_test_project(temp_dir).await;
    let store = CharacterStore::new(&path);

    let mut alex = alex_chen();
    store.create_character(&mut alex).await.unwrap();

    let mut maya = Character::new(basics("Maya Torres", CharacterRole::LoveInterest))
        .with_relationship(
            Relationship::new("Alex Chen", RelationshipType::Romantic, "Slow-burn rivals")
                .with_initial_feeling("annoyance"),
        );
    store.create_character(&mut maya).await.unwrap();

    (path, store)
}

#[tokio::test]
async fn test_delete_blocked_by_dependency() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (path, store) = project_with_relationship(&temp_dir).await;

    let result = store.delete_character("Alex Chen", false).await;
    match result {
        Err(StoryError::RelationshipDependency { name, dependents }) => {
            assert_eq!(name, "Alex Chen");
            assert_eq!(dependents, vec!["Maya Torres".to_string()]);
        }
        other => panic!("Expected RelationshipDependency, got {other:?}"),
    }

    // Nothing was mutated
    assert!(path
        .join(STORY_DATA_DIR)
        .join(CHARACTERS_DIR)
        .join("alex_chen")
        .exists());
    let maya = store.get_character("Maya Torres").await.unwrap();
    assert_eq!(maya.relationships.len(), 1);
}

#[tokio::test]
async fn test_forced_delete_cascades() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (path, store) = project_with_relationship(&temp_dir).await;

    let affected = store
        .delete_character("alex chen", true)
        .await
        .expect("Forced delete should succeed");
    assert_eq!(affected, vec!["Maya Torres".to_string()]);

    // Directory and index entry are gone
    assert!(!path
        .join(STORY_DATA_DIR)
        .join(CHARACTERS_DIR)
        .join("alex_chen")
        .exists());
    assert!(!store.character_exists("Alex Chen").await);

    // Maya's dangling relationship was stripped
    let maya = store.get_character("Maya Torres").await.unwrap();
    assert!(maya.relationships.is_empty());
}

#[tokio::test]
async fn test_dependency_scan_matches_delete() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (_path, store) = project_with_relationship(&temp_dir).await;

    let deps = store
        .relationship_dependencies("ALEX CHEN")
        .await
        .expect("Scan should succeed");
    assert_eq!(deps, vec!["Maya Torres".to_string()]);

    let deps = store
        .relationship_dependencies("Maya Torres")
        .await
        .expect("Scan should succeed");
    assert!(deps.is_empty());
}

// =============================================================================
// Listing and completion
// =============================================================================

#[tokio::test]
async fn test_example_scenario_listing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = create_test_project(&temp_dir).await;
    let store = CharacterStore::new(&path);

    // Basics + appearance only: 2 of 5 sections -> 40%
    let mut alex = alex_chen();
    store.create_character(&mut alex).await.unwrap();

    let listed = store.list_characters(None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Alex Chen");
    assert_eq!(listed[0].role, CharacterRole::Protagonist);
    assert_eq!(listed[0].completion, 40);
}

#[tokio::test]
async fn test_list_with_role_filter() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = create_test_project(&temp_dir).await;
    let store = CharacterStore::new(&path);

    let mut alex = alex_chen();
    store.create_character(&mut alex).await.unwrap();
    let mut extra = Character::new(basics("Extra Guy", CharacterRole::Background));
    store.create_character(&mut extra).await.unwrap();

    let protagonists = store.list_characters(Some("protagonist")).await.unwrap();
    assert_eq!(protagonists.len(), 1);
    assert_eq!(protagonists[0].name, "Alex Chen");

    // Unrecognized filter means no filter, not an error
    let everyone = store.list_characters(Some("villain")).await.unwrap();
    assert_eq!(everyone.len(), 2);
}

#[tokio::test]
async fn test_list_fails_open_on_unreadable_record() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = create_test_project(&temp_dir).await;
    let store = CharacterStore::new(&path);

    let mut alex = alex_chen();
    store.create_character(&mut alex).await.unwrap();

    // Corrupt the record file; listing still succeeds with completion 0
    std::fs::write(
        path.join(STORY_DATA_DIR)
            .join(CHARACTERS_DIR)
            .join("alex_chen")
            .join("description.json"),
        "garbage",
    )
    .unwrap();

    let listed = store.list_characters(None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].completion, 0);
}

// =============================================================================
// Index repair
// =============================================================================

#[tokio::test]
async fn test_rebuild_index_skips_unparsable_directories() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = create_test_project(&temp_dir).await;
    let store = CharacterStore::new(&path);

    let mut alex = alex_chen();
    store.create_character(&mut alex).await.unwrap();
    let mut maya = Character::new(basics("Maya Torres", CharacterRole::LoveInterest));
    store.create_character(&mut maya).await.unwrap();

    // One corrupt directory and one without a record file
    let characters_dir = path.join(STORY_DATA_DIR).join(CHARACTERS_DIR);
    std::fs::create_dir(characters_dir.join("corrupt")).unwrap();
    std::fs::write(characters_dir.join("corrupt").join("description.json"), "{").unwrap();
    std::fs::create_dir(characters_dir.join("empty")).unwrap();

    // Blow the index away, then rebuild it from the record files
    std::fs::remove_file(path.join(STORY_DATA_DIR).join(CHARACTERS_INDEX)).unwrap();
    store.rebuild_index().await.expect("Rebuild should succeed");

    let listed = store.list_characters(None).await.unwrap();
    let mut names: Vec<_> = listed.iter().map(|c| c.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Alex Chen", "Maya Torres"]);
}

#[tokio::test]
async fn test_index_file_shape_on_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = create_test_project(&temp_dir).await;
    let store = CharacterStore::new(&path);

    let mut alex = alex_chen();
    store.create_character(&mut alex).await.unwrap();

    let content =
        std::fs::read_to_string(path.join(STORY_DATA_DIR).join(CHARACTERS_INDEX)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();

    let entry = &value["characters"][0];
    assert_eq!(entry["name"], "Alex Chen");
    assert_eq!(entry["role"], "protagonist");
    assert_eq!(entry["path"], "characters/alex_chen");
    assert!(entry["updated_at"].is_string());

    // Project record sits at the root as story.json
    assert!(path.join(STORY_JSON).is_file());
}
