//! Standings use-case service.
//!
//! # Responsibility
//! - Rank a tournament's players from a repository snapshot.
//!
//! # Invariants
//! - Read-only: never writes through the repository.
//! - Ranking is deterministic; remaining ties keep registration order.

use crate::model::player::TournamentId;
use crate::model::standing::StandingEntry;
use crate::repo::tournament_repo::{RepoResult, TournamentRepository};
use log::debug;
use std::cmp::Reverse;

/// Ranked view over tournament standings.
pub struct StandingsService<R: TournamentRepository> {
    repo: R,
}

impl<R: TournamentRepository> StandingsService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the tournament's standings, best first.
    ///
    /// # Errors
    /// - `RepoError::UnknownTournament` when the tournament does not exist.
    /// - An empty list is returned when nobody is registered.
    pub fn get_standings(&self, tournament_id: TournamentId) -> RepoResult<Vec<StandingEntry>> {
        let entries = self.repo.fetch_standings(tournament_id)?;
        let ranked = rank_standings(entries);
        debug!(
            "event=standings_get module=standings status=ok tournament={tournament_id} players={}",
            ranked.len()
        );
        Ok(ranked)
    }
}

/// Orders entries by score, then opponent strength, then matches played,
/// all descending.
///
/// The sort is stable, so entries that tie on every key keep input order.
pub fn rank_standings(mut entries: Vec<StandingEntry>) -> Vec<StandingEntry> {
    entries.sort_by_key(|entry| {
        (
            Reverse(entry.score),
            Reverse(entry.opponent_strength),
            Reverse(entry.matches_played),
        )
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::rank_standings;
    use crate::model::standing::StandingEntry;
    use uuid::Uuid;

    fn entry(name: &str, score: i64, opponent_strength: i64, matches_played: u32) -> StandingEntry {
        StandingEntry {
            player_id: Uuid::new_v4(),
            name: name.to_string(),
            score,
            matches_played,
            bye_count: 0,
            opponent_strength,
        }
    }

    fn names(entries: &[StandingEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn score_ranks_first() {
        let ranked = rank_standings(vec![
            entry("low", 0, 9, 3),
            entry("high", 6, 0, 2),
            entry("mid", 3, 3, 2),
        ]);
        assert_eq!(names(&ranked), ["high", "mid", "low"]);
    }

    #[test]
    fn opponent_strength_breaks_score_ties() {
        let ranked = rank_standings(vec![entry("weak", 3, 1, 2), entry("strong", 3, 6, 2)]);
        assert_eq!(names(&ranked), ["strong", "weak"]);
    }

    #[test]
    fn matches_played_breaks_remaining_ties() {
        let ranked = rank_standings(vec![entry("rested", 3, 3, 1), entry("busy", 3, 3, 2)]);
        assert_eq!(names(&ranked), ["busy", "rested"]);
    }

    #[test]
    fn full_ties_keep_input_order() {
        let ranked = rank_standings(vec![
            entry("a", 0, 0, 0),
            entry("b", 0, 0, 0),
            entry("c", 0, 0, 0),
        ]);
        assert_eq!(names(&ranked), ["a", "b", "c"]);
    }
}
