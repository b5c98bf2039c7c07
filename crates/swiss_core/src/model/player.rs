//! Player and tournament identity records.
//!
//! # Invariants
//! - `uuid` is stable and never reused.
//! - Display names are trimmed and non-blank; they need not be unique.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a registered player.
pub type PlayerId = Uuid;

/// Stable identifier of a tournament.
pub type TournamentId = Uuid;

/// A registered competitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub uuid: PlayerId,
    pub name: String,
}

/// A tournament scoping standings and match history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub uuid: TournamentId,
    pub name: String,
}

/// Rejected display name for a player or tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlankNameError;

impl Display for BlankNameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "name must not be blank")
    }
}

impl Error for BlankNameError {}

impl Player {
    /// Creates a player with a generated id and a normalized name.
    pub fn new(name: impl Into<String>) -> Result<Self, BlankNameError> {
        Ok(Self {
            uuid: Uuid::new_v4(),
            name: normalize_name(name.into())?,
        })
    }
}

impl Tournament {
    /// Creates a tournament with a generated id and a normalized name.
    pub fn new(name: impl Into<String>) -> Result<Self, BlankNameError> {
        Ok(Self {
            uuid: Uuid::new_v4(),
            name: normalize_name(name.into())?,
        })
    }
}

fn normalize_name(value: String) -> Result<String, BlankNameError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BlankNameError);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{BlankNameError, Player, Tournament};

    #[test]
    fn names_are_trimmed() {
        let player = Player::new("  Ada Lovelace ").unwrap();
        assert_eq!(player.name, "Ada Lovelace");
    }

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(Tournament::new(" \t ").unwrap_err(), BlankNameError);
        assert_eq!(Player::new("").unwrap_err(), BlankNameError);
    }

    #[test]
    fn generated_ids_are_distinct() {
        let first = Player::new("Same").unwrap();
        let second = Player::new("Same").unwrap();
        assert_ne!(first.uuid, second.uuid);
    }
}
