//! Utility functions shared across modules.

/// Characters removed from game titles before they become file names.
///
/// The Windows reserved set, plus `!` which several frontends treat as a
/// command prefix in ROM names.
const STRIPPED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '!'];

/// Sanitize a game title for use as a shortcut file name.
///
/// Reserved and control characters are stripped rather than replaced, and
/// leading/trailing whitespace and trailing dots are trimmed. Inner spaces
/// are kept, so titles stay readable in a frontend's game list.
///
/// # Examples
///
/// ```
/// use storefront_sync_core::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("My Game!"), "My Game");
/// assert_eq!(sanitize_filename("Half-Life 2: Episode One"), "Half-Life 2 Episode One");
/// assert_eq!(sanitize_filename("  spaced  "), "spaced");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && !STRIPPED_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .trim_end_matches('.')
        .trim_end()
        .to_string()
}
