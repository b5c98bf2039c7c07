//! Persistence collaborator contracts and SQLite implementation.
//!
//! # Responsibility
//! - Define the storage contract consumed by standings and pairing.
//! - Isolate SQLite query details from ranking and pairing logic.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`UnknownTournament`,
//!   `NotRegistered`) in addition to DB transport errors.
//! - Multi-statement writes are transactional: all or nothing.

pub mod tournament_repo;
