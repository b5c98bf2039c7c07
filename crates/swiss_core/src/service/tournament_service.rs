//! Tournament administration use-case service.
//!
//! # Responsibility
//! - Create tournaments and register players.
//! - Validate and report match results.
//!
//! # Invariants
//! - A player never plays themselves.
//! - Both players of a reported match are entered in the tournament.

use crate::model::player::{BlankNameError, Player, PlayerId, Tournament, TournamentId};
use crate::model::standing::MatchRecord;
use crate::repo::tournament_repo::{RepoError, TournamentRepository};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from tournament administration.
#[derive(Debug)]
pub enum TournamentServiceError {
    /// Tournament or player name is blank after trim.
    InvalidName,
    /// Winner and loser are the same player.
    SelfMatch(PlayerId),
    UnknownTournament(TournamentId),
    NotRegistered {
        tournament_id: TournamentId,
        player_id: PlayerId,
    },
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for TournamentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "name must not be blank"),
            Self::SelfMatch(id) => write!(f, "player {id} cannot play against themselves"),
            Self::UnknownTournament(id) => write!(f, "tournament not found: {id}"),
            Self::NotRegistered {
                tournament_id,
                player_id,
            } => write!(
                f,
                "player {player_id} is not registered in tournament {tournament_id}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TournamentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TournamentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UnknownTournament(id) => Self::UnknownTournament(id),
            RepoError::NotRegistered {
                tournament_id,
                player_id,
            } => Self::NotRegistered {
                tournament_id,
                player_id,
            },
            other => Self::Repo(other),
        }
    }
}

impl From<BlankNameError> for TournamentServiceError {
    fn from(_: BlankNameError) -> Self {
        Self::InvalidName
    }
}

/// Tournament administration facade.
pub struct TournamentService<R: TournamentRepository> {
    repo: R,
}

impl<R: TournamentRepository> TournamentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an empty tournament.
    pub fn create_tournament(
        &self,
        name: impl Into<String>,
    ) -> Result<Tournament, TournamentServiceError> {
        let tournament = Tournament::new(name)?;
        self.repo.create_tournament(&tournament)?;
        info!(
            "event=tournament_create module=tournament status=ok tournament={}",
            tournament.uuid
        );
        Ok(tournament)
    }

    /// Registers a new player with a clean record.
    ///
    /// Registration order is the final ranking tiebreak.
    pub fn register_player(
        &self,
        tournament_id: TournamentId,
        name: impl Into<String>,
    ) -> Result<Player, TournamentServiceError> {
        let player = Player::new(name)?;
        self.repo.register_player(tournament_id, &player)?;
        info!(
            "event=player_register module=tournament status=ok tournament={tournament_id} player={}",
            player.uuid
        );
        Ok(player)
    }

    pub fn count_players(&self, tournament_id: TournamentId) -> Result<usize, TournamentServiceError> {
        Ok(self.repo.count_players(tournament_id)?)
    }

    /// Reports one played match.
    ///
    /// For a draw the `winner`/`loser` order carries no meaning.
    pub fn report_match(
        &self,
        tournament_id: TournamentId,
        winner: PlayerId,
        loser: PlayerId,
        is_draw: bool,
    ) -> Result<MatchRecord, TournamentServiceError> {
        if winner == loser {
            return Err(TournamentServiceError::SelfMatch(winner));
        }
        let record = self
            .repo
            .record_match(tournament_id, winner, loser, is_draw)?;
        info!(
            "event=match_report module=tournament status=ok tournament={tournament_id} match_id={} draw={is_draw}",
            record.match_id
        );
        Ok(record)
    }

    /// Lists reported matches in report order.
    pub fn match_history(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<MatchRecord>, TournamentServiceError> {
        Ok(self.repo.list_matches(tournament_id)?)
    }
}
