//! Filesystem-name sanitization and input validation helpers.

/// Convert a human-entered name to a filesystem-safe directory token.
///
/// Lowercases, replaces spaces with underscores, and strips apostrophes.
/// Distinct names can sanitize to the same token ("Jo Anne" and "Jo_Anne"
/// both become `jo_anne`); the stores do not detect such collisions.
pub fn sanitize_for_filesystem(name: &str) -> String {
    name.to_lowercase().replace(' ', "_").replace('\'', "")
}

/// Check whether a project name is valid for filesystem use.
///
/// Valid names start with a letter or digit and contain only letters,
/// digits, spaces, hyphens, and underscores.
pub fn is_valid_project_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_')
}

/// Check whether a character name is valid for filesystem use.
///
/// Valid names start with a letter and contain only letters, digits,
/// spaces, hyphens, underscores, and apostrophes.
pub fn is_valid_character_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' || c == '\'')
}
