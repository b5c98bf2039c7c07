//! Domain model for Swiss-system tournaments.
//!
//! # Responsibility
//! - Define the records exchanged between storage, standings and pairing.
//! - Keep scoring configuration next to the values it produces.
//!
//! # Invariants
//! - Players and tournaments are identified by stable uuids.
//! - Standings are only changed through match or bye reporting.

pub mod player;
pub mod scoring;
pub mod standing;
