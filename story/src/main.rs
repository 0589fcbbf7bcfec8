//! Story CLI: terminal wizard for visual-novel story projects.
//!
//! Creates a project folder, walks the author through structured prompts
//! to build character records, and optionally enriches answers via a
//! local Ollama endpoint.
//!
//! ```bash
//! story init "My Visual Novel" --genre romance --synopsis "A love story."
//! story new character
//! story list characters --role protagonist
//! ```

mod commands;
mod ui;
mod wizard;

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    if args.iter().any(|a| a == "--version" || a == "-v") {
        println!("story {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(e) = dispatch(&args).await {
        ui::print_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn dispatch(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let rest = &args[1..];

    match args[0].as_str() {
        "init" => commands::init_project(rest).await,
        "open" => commands::open_project(rest).await,
        "new" => match rest.first().map(String::as_str) {
            Some("character") => commands::new_character(&rest[1..]).await,
            _ => usage_error("Usage: story new character [--name <NAME>]"),
        },
        "edit" => match rest.first().map(String::as_str) {
            Some("character") => commands::edit_character(&rest[1..]).await,
            _ => usage_error("Usage: story edit character <NAME>"),
        },
        "list" => match rest.first().map(String::as_str) {
            Some("characters") => commands::list_characters(&rest[1..]).await,
            _ => usage_error("Usage: story list characters [--role <ROLE>] [--json]"),
        },
        "delete" => match rest.first().map(String::as_str) {
            Some("character") => commands::delete_character(&rest[1..]).await,
            _ => usage_error("Usage: story delete character <NAME> [--force]"),
        },
        "chat" => commands::chat().await,
        "rebuild-index" => commands::rebuild_index().await,
        other => usage_error(&format!(
            "Unknown command: {other}. Run 'story --help' for usage."
        )),
    }
}

fn usage_error(message: &str) -> Result<(), Box<dyn std::error::Error>> {
    Err(message.to_string().into())
}

fn print_help() {
    println!("Story CLI - visual novel story builder");
    println!();
    println!("USAGE:");
    println!("  story <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  init [NAME]               Create a new story project");
    println!("  open [PATH]               Open a project and show its summary");
    println!("  new character             Create a character through the wizard");
    println!("  edit character <NAME>     Edit an existing character");
    println!("  list characters           List characters in the project");
    println!("  delete character <NAME>   Delete a character");
    println!("  chat                      Brainstorm with the AI assistant");
    println!("  rebuild-index             Rebuild the character index from disk");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help                Show this help message");
    println!("  -v, --version             Show version");
    println!();
    println!("INIT OPTIONS:");
    println!("  --genre, -g <GENRE>       Story genre (e.g. romance, mystery, fantasy)");
    println!("  --synopsis, -s <TEXT>     Brief story synopsis");
    println!("  --path, -p <DIR>          Parent directory (default: current directory)");
    println!();
    println!("LIST OPTIONS:");
    println!("  --role, -r <ROLE>         Filter by role (protagonist, love_interest,");
    println!("                            antagonist, supporting, background)");
    println!("  --json                    Output as JSON");
    println!();
    println!("DELETE OPTIONS:");
    println!("  --force, -f               Delete even when other characters hold");
    println!("                            relationships to this one");
    println!();
    println!("ENVIRONMENT:");
    println!("  STORY_OLLAMA_HOST         Ollama base URL (default: http://localhost:11434)");
    println!("  STORY_MODEL               Model name (default: qwen3:32b)");
    println!("  STORY_LLM_TIMEOUT         Connect timeout in seconds (default: 10)");
    println!();
    println!("EXAMPLES:");
    println!("  story init \"My Visual Novel\" -g romance -s \"A love story.\"");
    println!("  story new character --name \"Alex Chen\"");
    println!("  story delete character \"Alex Chen\" --force");
}
