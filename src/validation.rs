//! Player-id validation and normalization.
//!
//! Player ids arrive from the command layer as arbitrary external
//! identifiers (chat user ids, node ids). The engine keys everything by the
//! normalized form: trimmed, lowercased, length- and charset-checked.

use thiserror::Error;

use crate::engine::errors::EngineError;

/// Maximum normalized id length; generous for any chat platform id.
pub const MAX_PLAYER_ID_LEN: usize = 64;

/// Player-id validation errors with helpful messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayerIdError {
    #[error("player id is empty")]
    Empty,

    #[error("player id is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("player id contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },
}

impl From<PlayerIdError> for EngineError {
    fn from(e: PlayerIdError) -> Self {
        EngineError::InvalidArgument(e.to_string())
    }
}

/// Normalize an external identifier into a store key: trim surrounding
/// whitespace, lowercase ASCII. Alphanumerics plus `_ - # @ .` are
/// accepted; anything else is rejected rather than silently dropped.
pub fn normalize_player_id(raw: &str) -> Result<String, PlayerIdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PlayerIdError::Empty);
    }
    if trimmed.len() > MAX_PLAYER_ID_LEN {
        return Err(PlayerIdError::TooLong {
            max: MAX_PLAYER_ID_LEN,
        });
    }
    let invalid: String = trimmed
        .chars()
        .filter(|c| !is_allowed(*c))
        .collect();
    if !invalid.is_empty() {
        return Err(PlayerIdError::InvalidCharacters { chars: invalid });
    }
    Ok(trimmed.to_ascii_lowercase())
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '#' | '@' | '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_lowercases() {
        assert_eq!(normalize_player_id("  Alice42 ").unwrap(), "alice42");
        assert_eq!(normalize_player_id("Node#1234").unwrap(), "node#1234");
    }

    #[test]
    fn numeric_chat_ids_pass_through() {
        assert_eq!(
            normalize_player_id("1356952258444525750").unwrap(),
            "1356952258444525750"
        );
    }

    #[test]
    fn empty_and_whitespace_rejected() {
        assert_eq!(normalize_player_id(""), Err(PlayerIdError::Empty));
        assert_eq!(normalize_player_id("   "), Err(PlayerIdError::Empty));
    }

    #[test]
    fn overlong_rejected() {
        let long = "x".repeat(MAX_PLAYER_ID_LEN + 1);
        assert!(matches!(
            normalize_player_id(&long),
            Err(PlayerIdError::TooLong { .. })
        ));
    }

    #[test]
    fn control_and_path_characters_rejected() {
        assert!(matches!(
            normalize_player_id("a/b"),
            Err(PlayerIdError::InvalidCharacters { .. })
        ));
        assert!(matches!(
            normalize_player_id("a\nb"),
            Err(PlayerIdError::InvalidCharacters { .. })
        ));
    }
}
