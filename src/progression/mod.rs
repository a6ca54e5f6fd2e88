//! Match progression: result submission, advancement, and bye
//! resolution.
//!
//! The pure state machine lives in [`engine`] and operates on the
//! in-memory match arena; [`ProgressionManager`] wraps it with
//! per-tournament locking and transactional persistence. A match moves
//! `Scheduled -> ScoreRecorded` exactly once; tournament-wide progress
//! is the aggregate of match states plus the advancement side effects.

pub mod engine;
pub mod manager;
pub mod models;

pub use engine::{is_complete, resolve_byes, reset_result, submit_result, ProgressionOutcome};
pub use manager::ProgressionManager;
pub use models::{ByeResolution, MatchOutcome};
