//! Swiss round pairing engine.
//!
//! # Responsibility
//! - Turn a ranked standings snapshot into one round of disjoint pairings.
//! - Award the round's bye when the pool is odd.
//!
//! # Invariants
//! - Every ranked player appears exactly once: in one match or as the bye.
//! - The bye goes to the lowest ranked player without a previous bye; if
//!   every player already had one the round fails instead of repeating.
//! - A rematch is only produced when the top remaining player has met every
//!   other remaining player.
//! - Output is a pure function of the snapshot and match history; the bye
//!   award is the only write and happens after the whole round is planned.
//!
//! # Concurrency
//! - Callers must serialize pairing per tournament. Two concurrent calls can
//!   select the same bye recipient.

use crate::model::player::{PlayerId, TournamentId};
use crate::model::standing::{Pairing, StandingEntry};
use crate::repo::tournament_repo::{RepoError, TournamentRepository};
use crate::service::standings_service::StandingsService;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from round pairing.
#[derive(Debug)]
pub enum PairingError {
    /// Tournament id is not known to storage.
    UnknownTournament(TournamentId),
    /// Odd pool where every player already received a bye.
    NoEligibleByeRecipient { pool_size: usize },
    /// Storage read or write failed; the original error is kept as source.
    PersistenceFailure(RepoError),
}

impl Display for PairingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTournament(id) => write!(f, "tournament not found: {id}"),
            Self::NoEligibleByeRecipient { pool_size } => write!(
                f,
                "all {pool_size} players already received a bye; cannot pair odd round"
            ),
            Self::PersistenceFailure(err) => write!(f, "persistence failure: {err}"),
        }
    }
}

impl Error for PairingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PersistenceFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PairingError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UnknownTournament(id) => Self::UnknownTournament(id),
            other => Self::PersistenceFailure(other),
        }
    }
}

impl PairingError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownTournament(_) => "unknown_tournament",
            Self::NoEligibleByeRecipient { .. } => "no_eligible_bye_recipient",
            Self::PersistenceFailure(_) => "persistence_failure",
        }
    }
}

/// Pairing decisions for one round before any bye is credited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundPlan {
    /// Bye recipient as ranked, without the upcoming award applied.
    pub bye: Option<StandingEntry>,
    /// `Pairing::Match` entries in rank order.
    pub matches: Vec<Pairing>,
}

impl RoundPlan {
    pub fn rematch_count(&self) -> usize {
        self.matches
            .iter()
            .filter(|pairing| matches!(pairing, Pairing::Match { is_rematch: true, .. }))
            .count()
    }
}

/// Returns the index of the lowest ranked entry that never had a bye.
pub fn select_bye_recipient(ranks: &[StandingEntry]) -> Option<usize> {
    (0..ranks.len()).rev().find(|&index| !ranks[index].has_had_bye())
}

/// Plans one round from ranked standings.
///
/// `have_met` answers whether two players already played each other in this
/// tournament. Each top remaining player takes the closest ranked opponent it
/// has not met; when none is left it takes the next ranked player anyway.
pub fn plan_round<F>(
    mut ranks: Vec<StandingEntry>,
    mut have_met: F,
) -> Result<RoundPlan, PairingError>
where
    F: FnMut(PlayerId, PlayerId) -> Result<bool, RepoError>,
{
    let bye = if ranks.len() % 2 == 1 {
        let index = select_bye_recipient(&ranks).ok_or(PairingError::NoEligibleByeRecipient {
            pool_size: ranks.len(),
        })?;
        Some(ranks.remove(index))
    } else {
        None
    };

    let mut matches = Vec::with_capacity(ranks.len() / 2);
    while ranks.len() >= 2 {
        let first = ranks.remove(0);

        let mut fresh_opponent = None;
        for (index, candidate) in ranks.iter().enumerate() {
            if !have_met(first.player_id, candidate.player_id)? {
                fresh_opponent = Some(index);
                break;
            }
        }

        let (index, is_rematch) = match fresh_opponent {
            Some(index) => (index, false),
            None => (0, true),
        };
        let second = ranks.remove(index);
        matches.push(Pairing::Match {
            first,
            second,
            is_rematch,
        });
    }

    Ok(RoundPlan { bye, matches })
}

/// Pairing engine bound to one repository.
pub struct PairingService<R: TournamentRepository> {
    repo: R,
}

impl<R: TournamentRepository> PairingService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Generates the next round's pairings, bye first when there is one.
    ///
    /// # Side effects
    /// - Credits the bye recipient with `bye_points` and one bye in a single
    ///   repository transaction. Nothing else is written.
    ///
    /// # Errors
    /// - `UnknownTournament`, `NoEligibleByeRecipient` or
    ///   `PersistenceFailure`; no partial round is ever returned.
    pub fn generate_pairings(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<Pairing>, PairingError> {
        let started_at = Instant::now();
        info!("event=pairing_generate module=pairing status=start tournament={tournament_id}");

        match self.generate_round(tournament_id) {
            Ok(pairings) => {
                info!(
                    "event=pairing_generate module=pairing status=ok tournament={tournament_id} pairings={} bye={} duration_ms={}",
                    pairings.len(),
                    pairings.first().is_some_and(Pairing::is_bye),
                    started_at.elapsed().as_millis()
                );
                Ok(pairings)
            }
            Err(err) => {
                error!(
                    "event=pairing_generate module=pairing status=error tournament={tournament_id} duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                Err(err)
            }
        }
    }

    fn generate_round(&self, tournament_id: TournamentId) -> Result<Vec<Pairing>, PairingError> {
        let ranks = StandingsService::new(&self.repo).get_standings(tournament_id)?;
        let plan = plan_round(ranks, |first, second| {
            self.repo.have_met(tournament_id, first, second)
        })?;

        let rematches = plan.rematch_count();
        if rematches > 0 {
            warn!(
                "event=pairing_rematch module=pairing status=ok tournament={tournament_id} rematches={rematches}"
            );
        }

        let mut pairings = Vec::with_capacity(plan.matches.len() + 1);
        if let Some(mut recipient) = plan.bye {
            let bonus = self.repo.scoring().bye_points;
            self.repo.record_bye(tournament_id, recipient.player_id, bonus)?;
            recipient.score += bonus;
            recipient.bye_count += 1;
            info!(
                "event=bye_award module=pairing status=ok tournament={tournament_id} player={} bonus={bonus}",
                recipient.player_id
            );
            pairings.push(Pairing::Bye { recipient });
        }
        pairings.extend(plan.matches);
        Ok(pairings)
    }
}
