//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into standings, pairing and administration
//!   APIs.
//! - Keep CLI callers decoupled from storage details.

pub mod pairing_service;
pub mod standings_service;
pub mod tournament_service;
