//! Swiss-system tournament core.
//!
//! Ranks players from persisted standings and pairs each round, awarding a
//! bye when the pool is odd and avoiding rematches while an alternative
//! exists.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::player::{BlankNameError, Player, PlayerId, Tournament, TournamentId};
pub use model::scoring::{ScoringRules, ScoringRulesError};
pub use model::standing::{MatchOutcome, MatchRecord, Pairing, StandingEntry};
pub use repo::tournament_repo::{
    RepoError, RepoResult, SqliteTournamentRepository, TournamentRepository,
};
pub use service::pairing_service::{
    plan_round, select_bye_recipient, PairingError, PairingService, RoundPlan,
};
pub use service::standings_service::{rank_standings, StandingsService};
pub use service::tournament_service::{TournamentService, TournamentServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
