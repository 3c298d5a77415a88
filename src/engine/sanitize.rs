use regex::{NoExpand, Regex};

use crate::catalog::Character;

/// Stands in for a character's own name in displayed ability text.
pub const PLACEHOLDER: &str = "<This Character>";

/// Replaces whole-word, case-insensitive occurrences of `name` in `ability`.
///
/// A word boundary is only required on a side of the name that is itself a
/// word character, so names such as "Devil's Advocate" or "Pit-Hag" still
/// match.
pub fn replace_name(ability: &str, name: &str, replacement: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return ability.to_string();
    }
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let lead = if is_word(name.chars().next()) { r"\b" } else { "" };
    let trail = if is_word(name.chars().last()) { r"\b" } else { "" };
    let pattern = format!("(?i){lead}{}{trail}", regex::escape(name));

    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(ability, NoExpand(replacement)).into_owned(),
        Err(e) => {
            log::warn!("cannot build name pattern for {name:?}: {e}");
            ability.to_string()
        }
    }
}

/// The character's ability with its own name hidden behind [`PLACEHOLDER`].
pub fn hide_own_name(character: &Character) -> String {
    replace_name(&character.ability, &character.name, PLACEHOLDER)
}

/// The character's ability rewritten as if it belonged to `target_name`.
pub fn attribute_to(character: &Character, target_name: &str) -> String {
    replace_name(&character.ability, &character.name, target_name)
}
