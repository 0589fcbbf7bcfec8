//! Subcommand implementations for the story binary.

use crate::ui;
use crate::wizard;
use futures::StreamExt;
use std::path::PathBuf;
use story_core::sanitize::{is_valid_project_name, sanitize_for_filesystem};
use story_core::{CharacterStore, ProjectStore, StoryAssistant, StoryError};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// `story init [NAME] [--genre G] [--synopsis S] [--path P]`
pub async fn init_project(args: &[String]) -> CommandResult {
    let mut name = positional(args);
    let genre_opt = option_value(args, "--genre", "-g");
    let synopsis_opt = option_value(args, "--synopsis", "-s");
    let parent_dir = option_value(args, "--path", "-p")
        .map(PathBuf::from)
        .unwrap_or(std::env::current_dir()?);

    if name.is_none() {
        ui::print_header("Create New Story Project");
        name = Some(prompt_project_name()?);
    }
    let name = name.unwrap();

    if !is_valid_project_name(name.trim()) {
        return Err("Invalid project name. Use only letters, numbers, spaces, \
                    hyphens, and underscores."
            .into());
    }

    // Catch the duplicate before prompting for more input
    let project_path = parent_dir.join(sanitize_for_filesystem(name.trim()));
    if project_path.exists() {
        return Err(format!("Project already exists: {}", project_path.display()).into());
    }

    let genre = match genre_opt {
        Some(genre) => genre,
        None => {
            ui::print_dim("Examples: romance, mystery, fantasy, sci-fi, horror, drama");
            prompt_non_empty("Genre")?
        }
    };
    let synopsis = match synopsis_opt {
        Some(synopsis) => synopsis,
        None => {
            ui::print_dim("Briefly describe your story (1-3 sentences)");
            prompt_non_empty("Synopsis")?
        }
    };

    let created = ProjectStore::new()
        .create_project(&name, &genre, &synopsis, &parent_dir)
        .await?;

    println!();
    ui::print_success(&format!("Created project: {}", name.trim()));
    ui::print_field("Genre", &genre.trim().to_lowercase());
    ui::print_field("Synopsis", synopsis.trim());
    ui::print_field("Location", &created.display().to_string());
    println!();
    ui::print_dim("Next steps:");
    ui::print_dim(&format!(
        "  cd {}",
        created.file_name().unwrap_or_default().to_string_lossy()
    ));
    ui::print_dim("  story new character   - Create your first character");
    ui::print_dim("  story chat            - Brainstorm with AI");
    Ok(())
}

/// `story open [PATH]`
pub async fn open_project(args: &[String]) -> CommandResult {
    let path = positional(args)
        .map(PathBuf::from)
        .unwrap_or(std::env::current_dir()?);

    let summary = ProjectStore::new().project_summary(&path).await?;

    ui::print_header(&format!("Project: {}", summary.name));
    ui::print_field("Genre", &summary.genre);
    ui::print_field("Synopsis", &summary.synopsis);
    ui::print_field("Characters", &summary.character_count.to_string());
    ui::print_field("Modified", &format!("{} (epoch)", summary.last_modified));
    Ok(())
}

/// `story new character [--name N]`
pub async fn new_character(args: &[String]) -> CommandResult {
    let project_path = current_project().await?;
    let prefill = option_value(args, "--name", "-n");
    wizard::run_create(&project_path, prefill).await
}

/// `story edit character <NAME>`
pub async fn edit_character(args: &[String]) -> CommandResult {
    let name = positional(args).ok_or("Usage: story edit character <NAME>")?;
    let project_path = current_project().await?;
    wizard::run_edit(&project_path, &name).await
}

/// `story list characters [--role R] [--json]`
pub async fn list_characters(args: &[String]) -> CommandResult {
    let project_path = current_project().await?;
    let store = CharacterStore::new(&project_path);

    let role = option_value(args, "--role", "-r");
    let characters = store.list_characters(role.as_deref()).await?;

    if characters.is_empty() {
        ui::print_info("No characters found.");
        if let Some(role) = role {
            ui::print_info(&format!("No characters with role '{role}'."));
        }
        ui::print_info("Use 'story new character' to create one.");
        return Ok(());
    }

    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(&characters)?);
        return Ok(());
    }

    println!();
    println!(
        "  {:<24} {:<14} {:>4}  {:>10}",
        "Name", "Role", "Age", "Completion"
    );
    for character in &characters {
        let age = character
            .age
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<24} {:<14} {:>4}  {:>9}%",
            character.name,
            character.role.name(),
            age,
            character.completion
        );
    }
    Ok(())
}

/// `story delete character <NAME> [--force]`
pub async fn delete_character(args: &[String]) -> CommandResult {
    let name = positional(args).ok_or("Usage: story delete character <NAME> [--force]")?;
    let force = has_flag(args, "--force", "-f");

    let project_path = current_project().await?;
    let store = CharacterStore::new(&project_path);

    let character = store.get_character(&name).await?;
    let dependencies = store.relationship_dependencies(&name).await?;

    if !dependencies.is_empty() && !force {
        ui::print_warning(&format!(
            "Character '{name}' is referenced by other characters:"
        ));
        for dependent in &dependencies {
            println!("  • {dependent}");
        }
        ui::print_info("Use --force to delete anyway (will remove relationships).");
        std::process::exit(1);
    }

    ui::print_header(&format!("Delete character: {}", character.basics.name));
    ui::print_field("Role", character.basics.role.name());
    ui::print_field(
        "Completion",
        &format!("{}%", character.completion_percentage()),
    );
    if !dependencies.is_empty() {
        ui::print_warning(&format!(
            "This will remove relationships from: {}",
            dependencies.join(", ")
        ));
    }

    if !ui::confirm("Are you sure you want to delete this character?", false)? {
        ui::print_info("Deletion cancelled.");
        return Ok(());
    }

    let affected = store.delete_character(&name, force).await?;
    ui::print_success(&format!("Character '{name}' deleted."));
    if !affected.is_empty() {
        ui::print_info(&format!(
            "Removed relationships from: {}",
            affected.join(", ")
        ));
    }
    Ok(())
}

/// `story chat` - interactive brainstorming session.
pub async fn chat() -> CommandResult {
    ui::print_header("Story Chat");
    ui::print_dim("Interactive AI assistant for story development");

    let context = project_context().await;
    if context.is_some() {
        ui::print_info("Project context detected and loaded.");
    } else {
        ui::print_warning("No project context (not in a project directory).");
        ui::print_info("Chat will work, but without project-specific context.");
    }
    println!();

    let assistant = StoryAssistant::from_env();

    ui::print_dim("Checking LLM connection...");
    if !assistant.is_available().await {
        ui::print_error("LLM is not available.");
        ui::print_info(&format!("Make sure Ollama is running at: {}", assistant.host()));
        ui::print_info("Start Ollama with: ollama serve");
        return Err("LLM unavailable".into());
    }
    ui::print_success("Connected to LLM");
    ui::print_dim("Commands: 'exit' or 'quit' to leave, 'clear' to reset");
    println!();

    loop {
        let input = ui::prompt("You")?;
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" | "q" => {
                ui::print_dim("Goodbye!");
                return Ok(());
            }
            "clear" => {
                ui::clear_screen()?;
                ui::print_dim("Chat cleared. Context retained.");
                continue;
            }
            _ => {}
        }

        println!();
        match assistant.chat_stream(&input, context.as_deref()).await {
            Ok(mut stream) => {
                let mut wrote = false;
                while let Some(chunk) = stream.next().await {
                    match chunk {
                        Ok(text) => {
                            print!("{text}");
                            use std::io::Write;
                            std::io::stdout().flush()?;
                            wrote = true;
                        }
                        Err(e) => {
                            if wrote {
                                println!();
                            }
                            ui::print_error(&format!("Stream error: {e}"));
                            break;
                        }
                    }
                }
                println!();
                println!();
            }
            Err(e) if e.is_recoverable() => {
                ui::print_error("Lost connection to LLM.");
                ui::print_info("Attempting to reconnect...");
                assistant.reset_availability();
                if !assistant.is_available().await {
                    ui::print_error("Could not reconnect. Exiting chat.");
                    return Ok(());
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// `story rebuild-index`
pub async fn rebuild_index() -> CommandResult {
    let project_path = current_project().await?;
    CharacterStore::new(&project_path).rebuild_index().await?;
    ui::print_success("Character index rebuilt from record files.");
    Ok(())
}

/// Resolve the current directory as a project, with guidance on failure.
async fn current_project() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = std::env::current_dir()?;
    let (is_valid, _) = ProjectStore::new().validate_project(&path).await;
    if !is_valid {
        ui::print_error("No valid project found in current directory.");
        ui::print_info("Use 'story init <name>' to create a new project,");
        ui::print_info("or 'cd' into an existing project directory.");
        return Err(StoryError::ProjectNotFound { path }.into());
    }
    Ok(path)
}

/// Project context for the chat system prompt, when inside a project.
async fn project_context() -> Option<String> {
    let path = std::env::current_dir().ok()?;
    let project = ProjectStore::new().open_project(&path).await.ok()?;
    Some(format!(
        "Project: {}\nGenre: {}\nSynopsis: {}",
        project.name, project.genre, project.synopsis
    ))
}

fn prompt_project_name() -> Result<String, Box<dyn std::error::Error>> {
    loop {
        let name = ui::prompt("Project name")?;
        if name.is_empty() {
            ui::print_error("Project name cannot be empty");
            continue;
        }
        if is_valid_project_name(&name) {
            return Ok(name);
        }
        ui::print_error(
            "Invalid name. Use only letters, numbers, spaces, hyphens, and underscores.",
        );
    }
}

fn prompt_non_empty(label: &str) -> Result<String, Box<dyn std::error::Error>> {
    loop {
        let value = ui::prompt(label)?;
        if !value.is_empty() {
            return Ok(value);
        }
        ui::print_error(&format!("{label} cannot be empty"));
    }
}

// Minimal argv helpers: first non-flag token and `--opt value` pairs.

fn positional(args: &[String]) -> Option<String> {
    let mut skip_next = false;
    for (i, arg) in args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with('-') {
            skip_next = takes_value(arg) && args.get(i + 1).is_some();
            continue;
        }
        return Some(arg.clone());
    }
    None
}

fn option_value(args: &[String], long: &str, short: &str) -> Option<String> {
    args.iter()
        .position(|a| a == long || a == short)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], long: &str, short: &str) -> bool {
    args.iter().any(|a| a == long || a == short)
}

fn takes_value(flag: &str) -> bool {
    matches!(
        flag,
        "--genre" | "-g" | "--synopsis" | "-s" | "--path" | "-p" | "--name" | "-n" | "--role"
            | "-r"
    )
}
