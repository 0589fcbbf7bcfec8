//! Phased character creation and editing wizard.
//!
//! Walks the author through basics, appearance, personality, backstory,
//! and relationships. Each phase offers AI assistance when the local
//! endpoint responds and degrades to manual entry when it does not.

use crate::ui;
use std::path::Path;
use story_core::sanitize::is_valid_character_name;
use story_core::{
    Character, CharacterAppearance, CharacterBackstory, CharacterBasics, CharacterPersonality,
    CharacterRole, CharacterStore, EyeDescription, HairDescription, ProjectStore, Relationship,
    RelationshipType, StoryAssistant,
};

type WizardResult<T> = Result<T, Box<dyn std::error::Error>>;

const PHASES: usize = 5;

/// Run the five-phase creation wizard and save the result.
pub async fn run_create(project_path: &Path, prefill_name: Option<String>) -> WizardResult<()> {
    let store = CharacterStore::new(project_path);
    let assistant = StoryAssistant::from_env();
    let genre = project_genre(project_path).await;

    ui::print_header("Character Creation Wizard");

    let basics = phase_basics(&assistant, prefill_name, &genre).await?;

    if store.character_exists(&basics.name).await {
        ui::print_error(&format!("Character '{}' already exists.", basics.name));
        ui::print_info("Use 'story edit character' to modify existing characters.");
        std::process::exit(1);
    }

    let role = basics.role.name();
    let appearance = phase_appearance(&assistant, &genre).await?;
    let personality = phase_personality(&assistant, role, &genre).await?;
    let backstory = phase_backstory(&assistant, &basics.name, role, &genre).await?;
    phase_relationships_info(&store).await?;

    let mut character = Character::new(basics);
    character.appearance = appearance;
    character.personality = personality;
    character.backstory = backstory;

    display_review(&character);

    if ui::confirm("Save this character?", true)? {
        store.create_character(&mut character).await?;
        ui::print_success(&format!(
            "Character '{}' created successfully!",
            character.basics.name
        ));
    } else {
        ui::print_warning("Character creation cancelled.");
    }
    Ok(())
}

/// Load a character, offer a section menu, and persist the edit.
pub async fn run_edit(project_path: &Path, name: &str) -> WizardResult<()> {
    let store = CharacterStore::new(project_path);
    let assistant = StoryAssistant::from_env();
    let genre = project_genre(project_path).await;

    let mut character = store.get_character(name).await?;

    ui::print_header(&format!("Editing: {}", character.basics.name));
    display_review(&character);

    println!();
    ui::print_dim("Edit options:");
    println!("  1. Basics (age, gender, role)");
    println!("  2. Appearance");
    println!("  3. Personality");
    println!("  4. Backstory");
    println!("  5. Relationships");
    println!("  6. Save and exit");
    println!("  7. Cancel");

    let choice = loop {
        let input = ui::prompt_with_hint("Choose option", "1-7, default 6")?;
        if input.is_empty() {
            break 6;
        }
        match input.parse::<u8>() {
            Ok(n @ 1..=7) => break n,
            _ => ui::print_warning("Pick an option between 1 and 7."),
        }
    };

    let char_name = character.basics.name.clone();
    let char_role = character.basics.role.name();

    match choice {
        7 => {
            ui::print_warning("Edit cancelled.");
            return Ok(());
        }
        6 => {
            ui::print_info("No changes made.");
            return Ok(());
        }
        1 => character.basics = phase_basics(&assistant, Some(char_name), &genre).await?,
        2 => character.appearance = phase_appearance(&assistant, &genre).await?,
        3 => character.personality = phase_personality(&assistant, char_role, &genre).await?,
        4 => {
            character.backstory =
                phase_backstory(&assistant, &char_name, char_role, &genre).await?
        }
        5 => edit_relationships(&store, &mut character).await?,
        _ => unreachable!(),
    }

    store.update_character(&mut character).await?;
    ui::print_success(&format!("Character '{}' updated!", character.basics.name));
    Ok(())
}

// ============================================================================
// Wizard phases
// ============================================================================

async fn phase_basics(
    assistant: &StoryAssistant,
    prefill: Option<String>,
    genre: &str,
) -> WizardResult<CharacterBasics> {
    ui::phase_header("Basics", 1, PHASES);

    let name = match prefill {
        Some(name) => {
            ui::print_dim(&format!("Character name: {name}"));
            name
        }
        None => {
            ui::print_dim("Enter a name, or press Enter for AI suggestions");
            let mut name = prompt_character_name(true)?;
            if name.is_empty() {
                ui::print_dim("Getting AI suggestions...");
                let suggestions = assistant.suggest_names(genre, "protagonist", 5).await;
                if suggestions.is_empty() {
                    ui::print_dim("No suggestions available.");
                } else {
                    ui::print_dim("Suggestions:");
                    for (i, suggestion) in suggestions.iter().enumerate() {
                        println!("  {}. {suggestion}", i + 1);
                    }
                }
                name = prompt_character_name(false)?;
            }
            name
        }
    };

    let age_input = ui::prompt_with_hint("Age", "optional, Enter to skip")?;
    let age = age_input.parse::<u16>().ok();

    let gender = ui::prompt_with_hint("Gender", "optional")?;

    ui::print_dim("Available roles:");
    for (i, role) in CharacterRole::all().iter().enumerate() {
        println!("  {}. {}", i + 1, role.name());
    }
    let role = loop {
        let input = ui::prompt_with_hint("Role", "number or name, default supporting")?;
        if input.is_empty() {
            break CharacterRole::Supporting;
        }
        if let Ok(n) = input.parse::<usize>() {
            if let Some(role) = CharacterRole::all().get(n.wrapping_sub(1)) {
                break *role;
            }
        }
        if let Some(role) = CharacterRole::parse(&input) {
            break role;
        }
        ui::print_warning("Pick a number from the list or a role name.");
    };

    let mut basics = CharacterBasics::new(&name, role)?;
    if let Some(age) = age {
        basics = basics.with_age(age);
    }
    if !gender.is_empty() {
        basics = basics.with_gender(gender);
    }
    Ok(basics)
}

async fn phase_appearance(
    assistant: &StoryAssistant,
    genre: &str,
) -> WizardResult<Option<CharacterAppearance>> {
    ui::phase_header("Appearance", 2, PHASES);
    ui::print_dim("Describe the character's appearance, or skip for now.");
    ui::print_dim("A brief description can be expanded by the AI.");

    let brief = ui::prompt_with_hint("Brief appearance description", "Enter to skip")?;
    if brief.is_empty() {
        return Ok(None);
    }

    if assistant.is_available().await {
        ui::print_dim("Expanding description...");
        match assistant.expand_appearance(&brief, genre).await {
            Ok(Some(expanded)) => {
                ui::print_dim("AI expanded appearance:");
                display_appearance(&expanded);
                if ui::confirm("Use this appearance?", true)? {
                    return Ok(Some(expanded));
                }
            }
            Ok(None) => ui::print_warning("Could not parse the AI response."),
            Err(e) => ui::print_warning(&format!("AI expansion unavailable: {e}")),
        }
    }

    ui::print_dim("Manual entry:");
    let hair_color = ui::prompt_with_hint("Hair color", "Enter to skip")?;
    let eye_color = ui::prompt_with_hint("Eye color", "Enter to skip")?;

    Ok(Some(CharacterAppearance {
        hair: (!hair_color.is_empty()).then(|| HairDescription {
            color: Some(hair_color),
            ..Default::default()
        }),
        eyes: (!eye_color.is_empty()).then(|| EyeDescription {
            color: Some(eye_color),
            shape: None,
        }),
        ..Default::default()
    }))
}

async fn phase_personality(
    assistant: &StoryAssistant,
    role: &str,
    genre: &str,
) -> WizardResult<Option<CharacterPersonality>> {
    ui::phase_header("Personality", 3, PHASES);
    ui::print_dim("Define personality traits (3-5 recommended).");

    if assistant.is_available().await {
        ui::print_dim("Getting trait suggestions...");
        let suggestions = assistant.suggest_traits(role, &[], genre, 5).await;
        if !suggestions.is_empty() {
            ui::print_dim("Suggested traits:");
            for (i, suggestion) in suggestions.iter().enumerate() {
                println!("  {}. {suggestion}", i + 1);
            }
        }
    }

    let traits_input = ui::prompt_with_hint("Primary traits", "comma-separated, Enter to skip")?;
    if traits_input.is_empty() {
        return Ok(None);
    }

    let mut primary_traits = split_list(&traits_input);
    primary_traits.truncate(5);

    // Flag contradictory picks; the author decides whether to keep them
    for (first, second) in assistant.check_trait_contradictions(&primary_traits).await {
        ui::print_warning(&format!("'{first}' and '{second}' may contradict each other."));
    }

    let flaws_input = ui::prompt_with_hint("Character flaws", "comma-separated, Enter to skip")?;
    let mut flaws = split_list(&flaws_input);
    flaws.truncate(3);

    let speaking_style = ui::prompt_with_hint("Speaking style", "e.g. formal, casual, sarcastic")?;

    Ok(Some(CharacterPersonality {
        primary_traits,
        flaws,
        speaking_style: (!speaking_style.is_empty()).then_some(speaking_style),
        ..Default::default()
    }))
}

async fn phase_backstory(
    assistant: &StoryAssistant,
    name: &str,
    role: &str,
    genre: &str,
) -> WizardResult<Option<CharacterBackstory>> {
    ui::phase_header("Backstory", 4, PHASES);
    ui::print_dim("Provide a brief backstory summary.");

    if assistant.is_available().await {
        ui::print_dim("Getting guiding questions...");
        let questions = assistant.backstory_questions(name, role, genre, 3).await;
        if !questions.is_empty() {
            ui::print_dim("Consider these questions:");
            for question in &questions {
                println!("  • {question}");
            }
        }
    }

    let summary = ui::prompt_with_hint("Backstory summary", "Enter to skip")?;
    if summary.is_empty() {
        return Ok(None);
    }

    if ui::confirm("Would you like AI to expand this backstory?", false)? {
        ui::print_dim("Expanding backstory...");
        match assistant.expand_backstory(&summary, name, genre).await {
            Ok(expanded) => {
                println!("\n{expanded}\n");
                if ui::confirm("Use expanded version?", true)? {
                    return Ok(Some(
                        CharacterBackstory::new(summary.as_str()).with_full(expanded),
                    ));
                }
            }
            Err(e) => ui::print_warning(&format!("Expansion unavailable: {e}")),
        }
    }

    Ok(Some(CharacterBackstory::new(summary)))
}

async fn phase_relationships_info(store: &CharacterStore) -> WizardResult<()> {
    ui::phase_header("Relationships", 5, PHASES);

    let characters = store.list_characters(None).await?;
    if characters.is_empty() {
        ui::print_dim("No other characters exist yet.");
        ui::print_dim("Relationships can be added later.");
    } else {
        ui::print_dim("Existing characters you could relate to:");
        for character in &characters {
            println!("  • {} ({})", character.name, character.role.name());
        }
        ui::print_dim("Relationships can be added with 'story edit character'.");
    }
    println!();
    Ok(())
}

// ============================================================================
// Relationship editor
// ============================================================================

async fn edit_relationships(
    store: &CharacterStore,
    character: &mut Character,
) -> WizardResult<()> {
    loop {
        println!();
        if character.relationships.is_empty() {
            ui::print_dim("No relationships yet.");
        } else {
            ui::print_dim("Current relationships:");
            for (i, rel) in character.relationships.iter().enumerate() {
                println!(
                    "  {}. {} ({}) - {}",
                    i + 1,
                    rel.target_character,
                    rel.kind.name(),
                    rel.dynamic
                );
            }
        }

        let action = ui::prompt_with_hint("Relationships", "a = add, r = remove, Enter = done")?;
        match action.to_lowercase().as_str() {
            "" | "d" | "done" => return Ok(()),
            "a" | "add" => add_relationship(store, character).await?,
            "r" | "remove" => remove_relationship(character)?,
            _ => ui::print_warning("Use 'a', 'r', or Enter."),
        }
    }
}

async fn add_relationship(store: &CharacterStore, character: &mut Character) -> WizardResult<()> {
    let own_name = character.basics.name.to_lowercase();
    let others: Vec<_> = store
        .list_characters(None)
        .await?
        .into_iter()
        .filter(|c| c.name.to_lowercase() != own_name)
        .collect();

    if others.is_empty() {
        ui::print_info("No other characters to relate to yet.");
        return Ok(());
    }

    ui::print_dim("Existing characters:");
    for other in &others {
        println!("  • {} ({})", other.name, other.role.name());
    }

    let target = ui::prompt("Target character")?;
    if target.is_empty() {
        return Ok(());
    }
    if !store.character_exists(&target).await {
        ui::print_warning(&format!("No character named '{target}' in this project."));
        return Ok(());
    }

    ui::print_dim("Relationship types:");
    for (i, kind) in RelationshipType::all().iter().enumerate() {
        println!("  {}. {}", i + 1, kind.name());
    }
    let kind = loop {
        let input = ui::prompt("Type")?;
        if let Ok(n) = input.parse::<usize>() {
            if let Some(kind) = RelationshipType::all().get(n.wrapping_sub(1)) {
                break *kind;
            }
        }
        if let Some(kind) = RelationshipType::parse(&input) {
            break kind;
        }
        ui::print_warning("Pick a number from the list or a type name.");
    };

    let dynamic = prompt_non_empty("Relationship dynamic")?;
    let feeling = ui::prompt_with_hint("Initial feeling", "Enter to skip")?;
    let history = ui::prompt_with_hint("History", "Enter to skip")?;

    let mut relationship = Relationship::new(target, kind, dynamic);
    if !feeling.is_empty() {
        relationship = relationship.with_initial_feeling(feeling);
    }
    if !history.is_empty() {
        relationship = relationship.with_history(history);
    }
    character.relationships.push(relationship);
    Ok(())
}

fn remove_relationship(character: &mut Character) -> WizardResult<()> {
    if character.relationships.is_empty() {
        ui::print_info("Nothing to remove.");
        return Ok(());
    }

    let input = ui::prompt_with_hint("Remove which", "number, Enter to cancel")?;
    if input.is_empty() {
        return Ok(());
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=character.relationships.len()).contains(&n) => {
            let removed = character.relationships.remove(n - 1);
            ui::print_success(&format!(
                "Removed relationship with {}.",
                removed.target_character
            ));
        }
        _ => ui::print_warning("Not a valid entry number."),
    }
    Ok(())
}

// ============================================================================
// Display and input helpers
// ============================================================================

fn display_review(character: &Character) {
    ui::print_header("Character Review");

    ui::print_field("Name", &character.basics.name);
    ui::print_field("Role", character.basics.role.name());
    if let Some(age) = character.basics.age {
        ui::print_field("Age", &age.to_string());
    }
    if let Some(gender) = &character.basics.gender {
        ui::print_field("Gender", gender);
    }

    if let Some(appearance) = &character.appearance {
        if let Some(color) = appearance.hair.as_ref().and_then(|h| h.color.as_deref()) {
            ui::print_field("Hair", color);
        }
        if let Some(color) = appearance.eyes.as_ref().and_then(|e| e.color.as_deref()) {
            ui::print_field("Eyes", color);
        }
    }

    if let Some(personality) = &character.personality {
        if !personality.primary_traits.is_empty() {
            ui::print_field("Traits", &personality.primary_traits.join(", "));
        }
        if !personality.flaws.is_empty() {
            ui::print_field("Flaws", &personality.flaws.join(", "));
        }
    }

    if let Some(backstory) = &character.backstory {
        let summary: String = backstory.summary.chars().take(50).collect();
        if summary.len() < backstory.summary.len() {
            ui::print_field("Backstory", &format!("{summary}..."));
        } else {
            ui::print_field("Backstory", &summary);
        }
    }

    if !character.relationships.is_empty() {
        ui::print_field(
            "Relations",
            &character.relationships.len().to_string(),
        );
    }

    println!();
    ui::print_dim(&format!(
        "Profile completion: {}%",
        character.completion_percentage()
    ));
}

fn display_appearance(appearance: &CharacterAppearance) {
    if let Some(hair) = &appearance.hair {
        let parts: Vec<&str> = [
            hair.color.as_deref(),
            hair.style.as_deref(),
            hair.length.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !parts.is_empty() {
            ui::print_field("Hair", &parts.join(" "));
        }
    }
    if let Some(eyes) = &appearance.eyes {
        let parts: Vec<&str> = [eyes.color.as_deref(), eyes.shape.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !parts.is_empty() {
            ui::print_field("Eyes", &parts.join(" "));
        }
    }
    if let Some(skin) = &appearance.skin_tone {
        ui::print_field("Skin", skin);
    }
    if let Some(height) = &appearance.height {
        ui::print_field("Height", height);
    }
    if let Some(build) = &appearance.build {
        ui::print_field("Build", build);
    }
    if !appearance.distinctive_features.is_empty() {
        ui::print_field("Features", &appearance.distinctive_features.join(", "));
    }
}

async fn project_genre(project_path: &Path) -> String {
    ProjectStore::new()
        .open_project(project_path)
        .await
        .map(|p| p.genre)
        .unwrap_or_else(|_| "general".to_string())
}

fn prompt_character_name(allow_empty: bool) -> WizardResult<String> {
    loop {
        let name = ui::prompt("Character name")?;
        if name.is_empty() {
            if allow_empty {
                return Ok(name);
            }
            ui::print_error("Character name cannot be empty");
            continue;
        }
        if is_valid_character_name(&name) {
            return Ok(name);
        }
        ui::print_error(
            "Invalid name. Use only letters, numbers, spaces, hyphens, \
             underscores, and apostrophes.",
        );
    }
}

fn prompt_non_empty(label: &str) -> WizardResult<String> {
    loop {
        let value = ui::prompt(label)?;
        if !value.is_empty() {
            return Ok(value);
        }
        ui::print_error(&format!("{label} cannot be empty"));
    }
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
