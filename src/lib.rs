//! # Matchpoint
//!
//! A tournament bracket engine: the subsystem of a tournament-management
//! backend that generates tournament structures, seeds participants into
//! them, advances winners and losers as results are reported, resolves
//! byes, computes standings, and re-seeds qualifiers into a follow-on
//! playoff bracket.
//!
//! Registration, rosters, uploads, and notifications are external
//! collaborators: the engine consumes an accepted-participant list and
//! tournament metadata from them, and exposes a bracket read model and
//! status transitions back.
//!
//! ## Architecture
//!
//! Every bracket is an indexed in-memory match arena
//! ([`bracket::BracketGraph`]) with optional forward links for the
//! winner and, in double elimination, the loser. The pure layers build
//! and mutate arenas:
//!
//! - [`seeding`]: seed rank to slot index, recursive halving
//! - [`bracket`]: single/double elimination builders and the read model
//! - [`progression`]: result application, advancement, bye cascade
//! - [`round_robin`]: circle-method fixtures, snake draft, standings
//! - [`playoffs`]: qualifier selection and re-seeding
//! - [`scoring`]: battle-royale placement/kill scoring
//!
//! The managers in each module wrap the pure layers with per-tournament
//! locking and transactional persistence over PostgreSQL ([`db`]); every
//! multi-row mutation commits or rolls back as one unit.
//!
//! ## Example
//!
//! ```
//! use matchpoint::bracket::{seeded_slots, single_elimination};
//! use matchpoint::progression;
//! use matchpoint::tournament::{ParticipantRef, SourceKind};
//! use uuid::Uuid;
//!
//! let entrants: Vec<ParticipantRef> = (0..5)
//!     .map(|i| ParticipantRef {
//!         id: Uuid::new_v4(),
//!         display_name: format!("player-{i}"),
//!         picture_ref: None,
//!         source_kind: SourceKind::Player,
//!     })
//!     .collect();
//!
//! // Five entrants seed into a bracket of eight with three byes, which
//! // resolve without any score submission.
//! let mut graph = single_elimination(&seeded_slots(&entrants)).unwrap();
//! let outcome = progression::resolve_byes(&mut graph).unwrap();
//! assert!(outcome.byes_resolved >= 3);
//! ```

/// Engine error taxonomy.
pub mod errors;
pub use errors::{EngineError, EngineResult};

/// Tournament metadata, participants, and catalog glue.
pub mod tournament;
pub use tournament::{
    BracketKind, ParticipantId, ParticipantRef, TournamentId, TournamentMeta, TournamentStatus,
};

/// Seed-rank to bracket-slot mapping.
pub mod seeding;
pub use seeding::{bracket_size_for, seed_slot};

/// Elimination bracket construction, persistence, and read model.
pub mod bracket;
pub use bracket::{BracketGraph, BracketManager, BracketSummary, BracketView};

/// Match progression: results, advancement, byes.
pub mod progression;
pub use progression::{MatchOutcome, ProgressionManager};

/// Round-robin group stage.
pub mod round_robin;
pub use round_robin::{GroupManager, Standing};

/// Playoff qualification and re-seeding.
pub mod playoffs;
pub use playoffs::PlayoffManager;

/// Battle-royale scoring.
pub mod scoring;

/// PostgreSQL pooling.
pub mod db;
pub use db::{Database, DatabaseConfig};
