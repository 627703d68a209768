pub const MAX_PLAYER_NAME_LENGTH: usize = 20;
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";

/// Collapses whitespace and caps the length; blank or missing names become the default.
pub fn sanitize_player_name(name: Option<&str>) -> String {
    let cleaned = name
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if cleaned.is_empty() {
        return DEFAULT_PLAYER_NAME.to_string();
    }
    cleaned.chars().take(MAX_PLAYER_NAME_LENGTH).collect()
}
