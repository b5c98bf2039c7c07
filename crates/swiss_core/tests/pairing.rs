use rusqlite::{params, Connection};
use std::collections::HashSet;
use swiss_core::db::open_db_in_memory;
use swiss_core::{
    Pairing, PairingError, PairingService, Player, PlayerId, SqliteTournamentRepository,
    StandingsService, TournamentId, TournamentRepository, TournamentService,
};
use uuid::Uuid;

struct Fixture {
    conn: Connection,
}

impl Fixture {
    fn new() -> Self {
        Self {
            conn: open_db_in_memory().unwrap(),
        }
    }

    fn repo(&self) -> SqliteTournamentRepository<'_> {
        SqliteTournamentRepository::try_new(&self.conn).unwrap()
    }

    fn pair(&self, tournament_id: TournamentId) -> Result<Vec<Pairing>, PairingError> {
        PairingService::new(self.repo()).generate_pairings(tournament_id)
    }

    fn tournament_with(&self, count: usize) -> (TournamentId, Vec<Player>) {
        let service = TournamentService::new(self.repo());
        let tournament = service.create_tournament("Swiss Cup").unwrap();
        let players = (1..=count)
            .map(|index| {
                service
                    .register_player(tournament.uuid, format!("P{index}"))
                    .unwrap()
            })
            .collect();
        (tournament.uuid, players)
    }

    fn set_score(&self, tournament_id: TournamentId, player: &Player, score: i64) {
        self.conn
            .execute(
                "UPDATE tournament_entries SET score = ?3
                 WHERE tournament_uuid = ?1 AND player_uuid = ?2;",
                params![tournament_id.to_string(), player.uuid.to_string(), score],
            )
            .unwrap();
    }

    fn win(&self, tournament_id: TournamentId, winner: PlayerId, loser: PlayerId) {
        TournamentService::new(self.repo())
            .report_match(tournament_id, winner, loser, false)
            .unwrap();
    }
}

fn names(pairings: &[Pairing]) -> Vec<Vec<String>> {
    pairings
        .iter()
        .map(|pairing| match pairing {
            Pairing::Match { first, second, .. } => vec![first.name.clone(), second.name.clone()],
            Pairing::Bye { recipient } => vec![recipient.name.clone()],
        })
        .collect()
}

fn assert_everyone_once(pairings: &[Pairing], players: &[Player]) {
    let seen: Vec<PlayerId> = pairings.iter().flat_map(Pairing::players).collect();
    let unique: HashSet<PlayerId> = seen.iter().copied().collect();
    let expected: HashSet<PlayerId> = players.iter().map(|player| player.uuid).collect();
    assert_eq!(seen.len(), players.len());
    assert_eq!(unique, expected);
}

#[test]
fn even_pool_pairs_adjacent_scores() {
    let fixture = Fixture::new();
    let (tournament_id, players) = fixture.tournament_with(4);
    for (player, score) in players.iter().zip([9, 6, 3, 0]) {
        fixture.set_score(tournament_id, player, score);
    }

    let pairings = fixture.pair(tournament_id).unwrap();
    assert_eq!(names(&pairings), [["P1", "P2"], ["P3", "P4"]]);
    assert_everyone_once(&pairings, &players);
}

#[test]
fn odd_pool_gives_lowest_rank_the_bye() {
    let fixture = Fixture::new();
    let (tournament_id, players) = fixture.tournament_with(5);
    for (player, score) in players.iter().zip([9, 6, 3, 3, 0]) {
        fixture.set_score(tournament_id, player, score);
    }

    let pairings = fixture.pair(tournament_id).unwrap();
    assert_eq!(
        names(&pairings),
        [vec!["P5"], vec!["P1", "P2"], vec!["P3", "P4"]]
    );
    assert_everyone_once(&pairings, &players);

    match &pairings[0] {
        Pairing::Bye { recipient } => {
            assert_eq!(recipient.score, 3);
            assert_eq!(recipient.bye_count, 1);
            assert_eq!(recipient.matches_played, 0);
        }
        other => panic!("expected bye first, got {other:?}"),
    }

    let repo = fixture.repo();
    assert!(repo.has_received_bye(tournament_id, players[4].uuid).unwrap());
    let stored = repo
        .fetch_standings(tournament_id)
        .unwrap()
        .into_iter()
        .find(|entry| entry.player_id == players[4].uuid)
        .unwrap();
    assert_eq!((stored.score, stored.bye_count, stored.matches_played), (3, 1, 0));
}

#[test]
fn prior_opponent_is_skipped_for_next_closest() {
    let fixture = Fixture::new();
    let (tournament_id, players) = fixture.tournament_with(4);
    fixture.win(tournament_id, players[0].uuid, players[1].uuid);

    let standings = StandingsService::new(fixture.repo())
        .get_standings(tournament_id)
        .unwrap();
    let order: Vec<&str> = standings.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(order, ["P1", "P2", "P3", "P4"]);

    let pairings = fixture.pair(tournament_id).unwrap();
    assert_eq!(names(&pairings), [["P1", "P3"], ["P2", "P4"]]);
}

#[test]
fn exhausted_history_falls_back_to_rematch() {
    let fixture = Fixture::new();
    let (tournament_id, players) = fixture.tournament_with(4);
    for loser in &players[1..] {
        fixture.win(tournament_id, players[0].uuid, loser.uuid);
    }

    let pairings = fixture.pair(tournament_id).unwrap();
    assert_eq!(pairings.len(), 2);
    assert_everyone_once(&pairings, &players);
    match &pairings[0] {
        Pairing::Match {
            first, is_rematch, ..
        } => {
            assert_eq!(first.player_id, players[0].uuid);
            assert!(*is_rematch);
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn byes_rotate_until_everyone_had_one() {
    let fixture = Fixture::new();
    let (tournament_id, players) = fixture.tournament_with(5);
    let mut bye_recipients = HashSet::new();

    for _ in 0..players.len() {
        let pairings = fixture.pair(tournament_id).unwrap();
        assert_everyone_once(&pairings, &players);

        let recipient = match &pairings[0] {
            Pairing::Bye { recipient } => recipient.player_id,
            other => panic!("expected bye first, got {other:?}"),
        };
        assert!(bye_recipients.insert(recipient), "bye repeated");

        for pairing in &pairings[1..] {
            if let Pairing::Match { first, second, .. } = pairing {
                fixture.win(tournament_id, first.player_id, second.player_id);
            }
        }

        let standings = fixture.repo().fetch_standings(tournament_id).unwrap();
        let total_played: u32 = standings.iter().map(|entry| entry.matches_played).sum();
        assert_eq!(total_played % 2, 0);
    }

    let err = fixture.pair(tournament_id).unwrap_err();
    assert!(matches!(
        err,
        PairingError::NoEligibleByeRecipient { pool_size: 5 }
    ));
}

#[test]
fn rematch_flag_matches_history_across_rounds() {
    let fixture = Fixture::new();
    let (tournament_id, players) = fixture.tournament_with(8);

    for _ in 0..4 {
        let pairings = fixture.pair(tournament_id).unwrap();
        assert_eq!(pairings.len(), 4);
        assert_everyone_once(&pairings, &players);

        let repo = fixture.repo();
        for pairing in &pairings {
            let Pairing::Match {
                first,
                second,
                is_rematch,
            } = pairing
            else {
                panic!("even pool must not produce a bye");
            };
            let met = repo
                .have_met(tournament_id, first.player_id, second.player_id)
                .unwrap();
            assert_eq!(met, *is_rematch);
        }
        for pairing in &pairings {
            if let Pairing::Match { first, second, .. } = pairing {
                fixture.win(tournament_id, first.player_id, second.player_id);
            }
        }
    }
}

#[test]
fn unknown_tournament_is_reported() {
    let fixture = Fixture::new();
    let missing = Uuid::new_v4();

    let err = fixture.pair(missing).unwrap_err();
    assert!(matches!(err, PairingError::UnknownTournament(id) if id == missing));
}

#[test]
fn empty_and_single_player_pools() {
    let fixture = Fixture::new();
    let (empty_id, _) = fixture.tournament_with(0);
    assert!(fixture.pair(empty_id).unwrap().is_empty());

    let (solo_id, solo) = fixture.tournament_with(1);
    let pairings = fixture.pair(solo_id).unwrap();
    assert_eq!(pairings.len(), 1);
    assert_eq!(pairings[0].players(), [solo[0].uuid]);
    assert!(pairings[0].is_bye());
}

#[test]
fn failed_bye_write_leaves_no_partial_state() {
    let fixture = Fixture::new();
    let (tournament_id, players) = fixture.tournament_with(3);
    fixture
        .conn
        .execute_batch(
            "CREATE TRIGGER byes_reject BEFORE INSERT ON byes
             BEGIN
                 SELECT RAISE(ABORT, 'bye ledger unavailable');
             END;",
        )
        .unwrap();

    let err = fixture.pair(tournament_id).unwrap_err();
    assert!(matches!(err, PairingError::PersistenceFailure(_)));
    assert!(std::error::Error::source(&err).is_some());

    let standings = fixture.repo().fetch_standings(tournament_id).unwrap();
    assert_eq!(standings.len(), players.len());
    for entry in standings {
        assert_eq!((entry.score, entry.bye_count), (0, 0));
    }
}
