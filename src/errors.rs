//! Engine error types.

use thiserror::Error;

use crate::tournament::{FixtureId, GroupId, MatchId, TournamentId};

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or out-of-range input
    #[error("validation failed: {0}")]
    Validation(String),

    /// Tournament not found
    #[error("tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    /// Match not found
    #[error("match not found: {0}")]
    MatchNotFound(MatchId),

    /// Group not found
    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    /// Fixture not found
    #[error("fixture not found: {0}")]
    FixtureNotFound(FixtureId),

    /// Operation collides with existing state (duplicate bracket,
    /// re-scored match, duplicate group membership)
    #[error("conflict: {0}")]
    Conflict(String),

    /// A required prior stage has not finished
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The bye cascade hit its iteration cap without converging
    #[error("bye cascade stopped after {processed} resolutions without converging")]
    PartialCompletion { processed: usize },

    /// Database error
    #[error("database error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Get a client-safe error message that doesn't leak storage internals.
    ///
    /// Database and serialization failures are collapsed to a generic
    /// message; everything else in the taxonomy is safe to surface.
    pub fn client_message(&self) -> String {
        match self {
            EngineError::Storage(_) | EngineError::Serialization(_) => {
                "internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Whether a retry of the same call can reasonably succeed.
    ///
    /// `PartialCompletion` and storage failures are transient; the rest of
    /// the taxonomy reports a state the caller has to change first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::PartialCompletion { .. } | EngineError::Storage(_)
        )
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
