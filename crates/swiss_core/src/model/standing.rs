//! Standings, match history and round pairing records.
//!
//! # Invariants
//! - `MatchRecord` values are immutable facts; storage keeps them append-only.
//! - A bye increments `bye_count` and `score` but never `matches_played`.
//! - A `Pairing` never outlives the round computation that produced it.

use crate::model::player::{PlayerId, TournamentId};
use serde::{Deserialize, Serialize};

/// Cumulative record of one player within one tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingEntry {
    pub player_id: PlayerId,
    pub name: String,
    /// Accumulated points from matches and byes.
    pub score: i64,
    pub matches_played: u32,
    pub bye_count: u32,
    /// Sum of the current scores of every distinct opponent faced.
    ///
    /// This is a strength-of-schedule value, not a count of opponents' wins.
    pub opponent_strength: i64,
}

impl StandingEntry {
    /// Returns whether this player has already been exempted from a round.
    pub fn has_had_bye(&self) -> bool {
        self.bye_count > 0
    }
}

/// Classification of a reported match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    WinLoss,
    Draw,
}

impl MatchOutcome {
    pub fn from_draw_flag(is_draw: bool) -> Self {
        if is_draw {
            Self::Draw
        } else {
            Self::WinLoss
        }
    }

    pub fn is_draw(self) -> bool {
        matches!(self, Self::Draw)
    }
}

/// Append-only fact describing one played match.
///
/// For a draw `winner` and `loser` only record the reporting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Monotonic report sequence within the database.
    pub match_id: i64,
    pub tournament_id: TournamentId,
    pub winner: PlayerId,
    pub loser: PlayerId,
    pub outcome: MatchOutcome,
}

impl MatchRecord {
    /// Returns whether this match was played between `a` and `b` in any order.
    pub fn involves_pair(&self, a: PlayerId, b: PlayerId) -> bool {
        (self.winner == a && self.loser == b) || (self.winner == b && self.loser == a)
    }
}

/// One entry of a round's pairing list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pairing {
    /// Two players meeting this round; `first` is the higher ranked.
    Match {
        first: StandingEntry,
        second: StandingEntry,
        /// Set when no opponent without a prior meeting was left for `first`.
        is_rematch: bool,
    },
    /// Round exemption; `recipient` reflects the credited bye.
    Bye { recipient: StandingEntry },
}

impl Pairing {
    /// Player ids taking part in this pairing, higher ranked first.
    pub fn players(&self) -> Vec<PlayerId> {
        match self {
            Self::Match { first, second, .. } => vec![first.player_id, second.player_id],
            Self::Bye { recipient } => vec![recipient.player_id],
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Self::Bye { .. })
    }
}
