//! Tournament repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide standings snapshots and match-history lookups.
//! - Record match results and bye awards atomically.
//!
//! # Invariants
//! - Standings reflect only already reported matches and byes.
//! - `matches` and `byes` rows are never updated or deleted.
//! - Standings rows come back in registration order; ranking is done above
//!   this layer.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::player::{Player, PlayerId, Tournament, TournamentId};
use crate::model::scoring::ScoringRules;
use crate::model::standing::{MatchOutcome, MatchRecord, StandingEntry};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const STANDINGS_SELECT_SQL: &str = "SELECT
    e.player_uuid AS player_uuid,
    p.name AS name,
    e.score AS score,
    e.matches_played AS matches_played,
    e.bye_count AS bye_count,
    COALESCE((
        SELECT SUM(o.score)
        FROM tournament_entries o
        WHERE o.tournament_uuid = e.tournament_uuid
          AND o.player_uuid IN (
              SELECT m.loser_uuid FROM matches m
              WHERE m.tournament_uuid = e.tournament_uuid
                AND m.winner_uuid = e.player_uuid
              UNION
              SELECT m.winner_uuid FROM matches m
              WHERE m.tournament_uuid = e.tournament_uuid
                AND m.loser_uuid = e.player_uuid
          )
    ), 0) AS opponent_strength
FROM tournament_entries e
JOIN players p ON p.uuid = e.player_uuid
WHERE e.tournament_uuid = ?1
ORDER BY e.entry_seq ASC";

const REQUIRED_TABLES: [&str; 5] = [
    "players",
    "tournaments",
    "tournament_entries",
    "matches",
    "byes",
];

/// Result type used by tournament repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from tournament repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Tournament id is not known to storage.
    UnknownTournament(TournamentId),
    /// Player is not entered in the tournament.
    NotRegistered {
        tournament_id: TournamentId,
        player_id: PlayerId,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UnknownTournament(id) => write!(f, "tournament not found: {id}"),
            Self::NotRegistered {
                tournament_id,
                player_id,
            } => write!(
                f,
                "player {player_id} is not registered in tournament {tournament_id}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "tournament repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "tournament repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid tournament data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for standings, match history and byes.
pub trait TournamentRepository {
    /// Point table applied by `record_match` and used for bye bonuses.
    fn scoring(&self) -> &ScoringRules;
    fn create_tournament(&self, tournament: &Tournament) -> RepoResult<()>;
    fn tournament_exists(&self, tournament_id: TournamentId) -> RepoResult<bool>;
    /// Creates `player` and enters it into the tournament with a clean record.
    fn register_player(&self, tournament_id: TournamentId, player: &Player) -> RepoResult<()>;
    fn count_players(&self, tournament_id: TournamentId) -> RepoResult<usize>;
    /// Returns unranked standings rows in registration order.
    fn fetch_standings(&self, tournament_id: TournamentId) -> RepoResult<Vec<StandingEntry>>;
    fn have_met(
        &self,
        tournament_id: TournamentId,
        first: PlayerId,
        second: PlayerId,
    ) -> RepoResult<bool>;
    fn has_received_bye(&self, tournament_id: TournamentId, player_id: PlayerId)
        -> RepoResult<bool>;
    /// Credits `bonus_score` and one bye without touching `matches_played`.
    ///
    /// Not idempotent: callers must not retry blindly.
    fn record_bye(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        bonus_score: i64,
    ) -> RepoResult<()>;
    /// Appends a match record and updates both standings entries.
    fn record_match(
        &self,
        tournament_id: TournamentId,
        winner: PlayerId,
        loser: PlayerId,
        is_draw: bool,
    ) -> RepoResult<MatchRecord>;
    /// Lists match records in report order.
    fn list_matches(&self, tournament_id: TournamentId) -> RepoResult<Vec<MatchRecord>>;
}

impl<R: TournamentRepository + ?Sized> TournamentRepository for &R {
    fn scoring(&self) -> &ScoringRules {
        (**self).scoring()
    }

    fn create_tournament(&self, tournament: &Tournament) -> RepoResult<()> {
        (**self).create_tournament(tournament)
    }

    fn tournament_exists(&self, tournament_id: TournamentId) -> RepoResult<bool> {
        (**self).tournament_exists(tournament_id)
    }

    fn register_player(&self, tournament_id: TournamentId, player: &Player) -> RepoResult<()> {
        (**self).register_player(tournament_id, player)
    }

    fn count_players(&self, tournament_id: TournamentId) -> RepoResult<usize> {
        (**self).count_players(tournament_id)
    }

    fn fetch_standings(&self, tournament_id: TournamentId) -> RepoResult<Vec<StandingEntry>> {
        (**self).fetch_standings(tournament_id)
    }

    fn have_met(
        &self,
        tournament_id: TournamentId,
        first: PlayerId,
        second: PlayerId,
    ) -> RepoResult<bool> {
        (**self).have_met(tournament_id, first, second)
    }

    fn has_received_bye(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> RepoResult<bool> {
        (**self).has_received_bye(tournament_id, player_id)
    }

    fn record_bye(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        bonus_score: i64,
    ) -> RepoResult<()> {
        (**self).record_bye(tournament_id, player_id, bonus_score)
    }

    fn record_match(
        &self,
        tournament_id: TournamentId,
        winner: PlayerId,
        loser: PlayerId,
        is_draw: bool,
    ) -> RepoResult<MatchRecord> {
        (**self).record_match(tournament_id, winner, loser, is_draw)
    }

    fn list_matches(&self, tournament_id: TournamentId) -> RepoResult<Vec<MatchRecord>> {
        (**self).list_matches(tournament_id)
    }
}

/// SQLite-backed tournament repository.
pub struct SqliteTournamentRepository<'conn> {
    conn: &'conn Connection,
    scoring: ScoringRules,
}

impl<'conn> SqliteTournamentRepository<'conn> {
    /// Creates a repository with default scoring after validating schema readiness.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::try_with_scoring(conn, ScoringRules::default())
    }

    /// Creates a repository with a custom point table.
    pub fn try_with_scoring(conn: &'conn Connection, scoring: ScoringRules) -> RepoResult<Self> {
        scoring
            .validate()
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        ensure_connection_ready(conn)?;
        Ok(Self { conn, scoring })
    }

    fn ensure_tournament(&self, tournament_id: TournamentId) -> RepoResult<()> {
        if tournament_exists_on(self.conn, tournament_id)? {
            Ok(())
        } else {
            Err(RepoError::UnknownTournament(tournament_id))
        }
    }
}

impl TournamentRepository for SqliteTournamentRepository<'_> {
    fn scoring(&self) -> &ScoringRules {
        &self.scoring
    }

    fn create_tournament(&self, tournament: &Tournament) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO tournaments (uuid, name) VALUES (?1, ?2);",
            params![tournament.uuid.to_string(), tournament.name.as_str()],
        )?;
        Ok(())
    }

    fn tournament_exists(&self, tournament_id: TournamentId) -> RepoResult<bool> {
        tournament_exists_on(self.conn, tournament_id)
    }

    fn register_player(&self, tournament_id: TournamentId, player: &Player) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !tournament_exists_on(&tx, tournament_id)? {
            return Err(RepoError::UnknownTournament(tournament_id));
        }

        tx.execute(
            "INSERT INTO players (uuid, name) VALUES (?1, ?2);",
            params![player.uuid.to_string(), player.name.as_str()],
        )?;
        tx.execute(
            "INSERT INTO tournament_entries (tournament_uuid, player_uuid, entry_seq)
             VALUES (
                ?1,
                ?2,
                (SELECT COALESCE(MAX(entry_seq), 0) + 1
                 FROM tournament_entries
                 WHERE tournament_uuid = ?1)
             );",
            params![tournament_id.to_string(), player.uuid.to_string()],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn count_players(&self, tournament_id: TournamentId) -> RepoResult<usize> {
        self.ensure_tournament(tournament_id)?;
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tournament_entries WHERE tournament_uuid = ?1;",
            [tournament_id.to_string()],
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("invalid player count `{count}`")))
    }

    fn fetch_standings(&self, tournament_id: TournamentId) -> RepoResult<Vec<StandingEntry>> {
        self.ensure_tournament(tournament_id)?;

        let mut stmt = self.conn.prepare(STANDINGS_SELECT_SQL)?;
        let mut rows = stmt.query([tournament_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_standing_row(row)?);
        }
        Ok(entries)
    }

    fn have_met(
        &self,
        tournament_id: TournamentId,
        first: PlayerId,
        second: PlayerId,
    ) -> RepoResult<bool> {
        let met: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM matches
                WHERE tournament_uuid = ?1
                  AND ((winner_uuid = ?2 AND loser_uuid = ?3)
                    OR (winner_uuid = ?3 AND loser_uuid = ?2))
            );",
            params![
                tournament_id.to_string(),
                first.to_string(),
                second.to_string()
            ],
            |row| row.get(0),
        )?;
        Ok(met == 1)
    }

    fn has_received_bye(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> RepoResult<bool> {
        let bye_count: Option<i64> = self
            .conn
            .query_row(
                "SELECT bye_count
                 FROM tournament_entries
                 WHERE tournament_uuid = ?1 AND player_uuid = ?2;",
                params![tournament_id.to_string(), player_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match bye_count {
            Some(count) => Ok(count > 0),
            None => {
                ensure_registered(self.conn, tournament_id, player_id)?;
                Ok(false)
            }
        }
    }

    fn record_bye(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        bonus_score: i64,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_registered(&tx, tournament_id, player_id)?;

        tx.execute(
            "UPDATE tournament_entries
             SET score = score + ?3,
                 bye_count = bye_count + 1
             WHERE tournament_uuid = ?1 AND player_uuid = ?2;",
            params![tournament_id.to_string(), player_id.to_string(), bonus_score],
        )?;
        tx.execute(
            "INSERT INTO byes (tournament_uuid, player_uuid, bonus_points)
             VALUES (?1, ?2, ?3);",
            params![tournament_id.to_string(), player_id.to_string(), bonus_score],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn record_match(
        &self,
        tournament_id: TournamentId,
        winner: PlayerId,
        loser: PlayerId,
        is_draw: bool,
    ) -> RepoResult<MatchRecord> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_registered(&tx, tournament_id, winner)?;
        ensure_registered(&tx, tournament_id, loser)?;

        let (winner_points, loser_points) = if is_draw {
            (self.scoring.draw_points, self.scoring.draw_points)
        } else {
            (self.scoring.win_points, self.scoring.loss_points)
        };

        tx.execute(
            "INSERT INTO matches (tournament_uuid, winner_uuid, loser_uuid, is_draw)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                tournament_id.to_string(),
                winner.to_string(),
                loser.to_string(),
                bool_to_int(is_draw),
            ],
        )?;
        let match_id = tx.last_insert_rowid();

        for (player_id, points) in [(winner, winner_points), (loser, loser_points)] {
            tx.execute(
                "UPDATE tournament_entries
                 SET score = score + ?3,
                     matches_played = matches_played + 1
                 WHERE tournament_uuid = ?1 AND player_uuid = ?2;",
                params![tournament_id.to_string(), player_id.to_string(), points],
            )?;
        }

        tx.commit()?;
        Ok(MatchRecord {
            match_id,
            tournament_id,
            winner,
            loser,
            outcome: MatchOutcome::from_draw_flag(is_draw),
        })
    }

    fn list_matches(&self, tournament_id: TournamentId) -> RepoResult<Vec<MatchRecord>> {
        self.ensure_tournament(tournament_id)?;

        let mut stmt = self.conn.prepare(
            "SELECT match_id, winner_uuid, loser_uuid, is_draw
             FROM matches
             WHERE tournament_uuid = ?1
             ORDER BY match_id ASC;",
        )?;
        let mut rows = stmt.query([tournament_id.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let is_draw = match row.get::<_, i64>("is_draw")? {
                0 => false,
                1 => true,
                other => {
                    return Err(RepoError::InvalidData(format!(
                        "invalid is_draw value `{other}` in matches.is_draw"
                    )));
                }
            };
            records.push(MatchRecord {
                match_id: row.get("match_id")?,
                tournament_id,
                winner: parse_uuid(&row.get::<_, String>("winner_uuid")?, "matches.winner_uuid")?,
                loser: parse_uuid(&row.get::<_, String>("loser_uuid")?, "matches.loser_uuid")?,
                outcome: MatchOutcome::from_draw_flag(is_draw),
            });
        }
        Ok(records)
    }
}

fn parse_standing_row(row: &Row<'_>) -> RepoResult<StandingEntry> {
    let player_text: String = row.get("player_uuid")?;
    Ok(StandingEntry {
        player_id: parse_uuid(&player_text, "tournament_entries.player_uuid")?,
        name: row.get("name")?,
        score: row.get("score")?,
        matches_played: parse_counter(row.get("matches_played")?, "matches_played")?,
        bye_count: parse_counter(row.get("bye_count")?, "bye_count")?,
        opponent_strength: row.get("opponent_strength")?,
    })
}

fn parse_counter(value: i64, column: &'static str) -> RepoResult<u32> {
    u32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid counter `{value}` in tournament_entries.{column}"
        ))
    })
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_registered(
    conn: &Connection,
    tournament_id: TournamentId,
    player_id: PlayerId,
) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM tournament_entries
            WHERE tournament_uuid = ?1 AND player_uuid = ?2
        );",
        params![tournament_id.to_string(), player_id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        return Ok(());
    }
    if !tournament_exists_on(conn, tournament_id)? {
        return Err(RepoError::UnknownTournament(tournament_id));
    }
    Err(RepoError::NotRegistered {
        tournament_id,
        player_id,
    })
}

fn tournament_exists_on(conn: &Connection, tournament_id: TournamentId) -> RepoResult<bool> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM tournaments WHERE uuid = ?1;",
            [tournament_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(exists.is_some())
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}
