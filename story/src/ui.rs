//! Styled terminal output and prompt helpers.

use crossterm::style::Stylize;
use std::io::{self, Write};

pub fn print_success(message: &str) {
    println!("{} {message}", "✓".green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {message}", "✗".red().bold());
}

pub fn print_warning(message: &str) {
    println!("{} {message}", "⚠".yellow());
}

pub fn print_info(message: &str) {
    println!("{} {message}", "ℹ".cyan());
}

pub fn print_dim(message: &str) {
    println!("{}", message.dark_grey());
}

pub fn print_header(title: &str) {
    println!("\n{}\n", title.bold());
}

/// Print a wizard phase banner like `── Phase 2/5: Appearance ──`.
pub fn phase_header(title: &str, number: usize, total: usize) {
    println!(
        "\n{}",
        format!("── Phase {number}/{total}: {title} ──")
            .yellow()
            .bold()
    );
}

/// Print a labelled field row for review displays.
pub fn print_field(label: &str, value: &str) {
    // Pad before styling so the ANSI codes don't skew the column width
    let label = format!("{:<12}", format!("{label}:"));
    println!("  {} {value}", label.dark_grey());
}

/// Prompt for a line of input, returning the trimmed answer.
pub fn prompt(label: &str) -> io::Result<String> {
    print!("{}: ", label.cyan());
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Prompt with a dimmed hint, e.g. `Age (optional, Enter to skip):`.
pub fn prompt_with_hint(label: &str, hint: &str) -> io::Result<String> {
    print!("{} {}: ", label.cyan(), format!("({hint})").dark_grey());
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask a yes/no question. Empty input takes the default.
pub fn confirm(question: &str, default: bool) -> io::Result<bool> {
    let hint = if default { "Y/n" } else { "y/N" };
    loop {
        print!("{} [{hint}]: ", question.cyan());
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        match line.trim().to_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => print_warning("Please answer y or n."),
        }
    }
}

/// Clear the screen and move the cursor home.
pub fn clear_screen() -> io::Result<()> {
    use crossterm::cursor::MoveTo;
    use crossterm::terminal::{Clear, ClearType};

    crossterm::execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))
}
