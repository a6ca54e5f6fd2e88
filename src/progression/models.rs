//! Progression result models.

use serde::{Deserialize, Serialize};

use crate::tournament::{MatchId, ParticipantId, TournamentId};

/// What a result submission did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub match_id: MatchId,
    pub tournament_id: TournamentId,
    pub winner_id: ParticipantId,
    pub score1: i32,
    pub score2: i32,
    /// Byes auto-resolved by the cascade this submission triggered
    pub byes_resolved: usize,
    /// Whether this result decided the tournament
    pub tournament_completed: bool,
}

/// Result of an explicit bye-resolution sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ByeResolution {
    pub tournament_id: TournamentId,
    /// Matches auto-finalized; zero when the sweep found nothing new
    pub processed_count: usize,
    pub tournament_completed: bool,
}
