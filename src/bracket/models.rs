//! Match-graph models and the bracket read model.

use serde::{Deserialize, Serialize};

use crate::tournament::{BracketKind, MatchId, ParticipantId, TournamentId};

/// Section of a bracket a match belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BracketSection {
    /// The main bracket (the only one in single elimination)
    Winners,
    /// Double elimination only: the second-chance bracket
    Losers,
    /// Double elimination only: winners champion vs losers champion
    GrandFinals,
}

impl BracketSection {
    pub fn as_str(self) -> &'static str {
        match self {
            BracketSection::Winners => "winners",
            BracketSection::Losers => "losers",
            BracketSection::GrandFinals => "grand_finals",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "winners" => Some(BracketSection::Winners),
            "losers" => Some(BracketSection::Losers),
            "grand_finals" => Some(BracketSection::GrandFinals),
            _ => None,
        }
    }
}

/// Per-match progression state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchState {
    /// Waiting for entrants and/or a reported score
    Scheduled,
    /// Terminal: a winner has been determined (by score or by bye)
    ScoreRecorded,
}

impl MatchState {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchState::Scheduled => "scheduled",
            MatchState::ScoreRecorded => "score_recorded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(MatchState::Scheduled),
            "score_recorded" => Some(MatchState::ScoreRecorded),
            _ => None,
        }
    }
}

/// Whether a match participant has played their match yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    NotPlayed,
    Played,
}

impl SlotStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotStatus::NotPlayed => "not_played",
            SlotStatus::Played => "played",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_played" => Some(SlotStatus::NotPlayed),
            "played" => Some(SlotStatus::Played),
            _ => None,
        }
    }
}

/// Summary returned by bracket generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketSummary {
    pub tournament_id: TournamentId,
    pub kind: BracketKind,
    /// Power-of-two grid size the entrants were seeded into
    pub bracket_size: usize,
    /// Accepted entrants actually placed
    pub entrants: usize,
    /// Empty first-round slots
    pub byes: usize,
    /// Rounds in the winners bracket
    pub rounds: u32,
    /// Total matches across all sections
    pub matches: usize,
}

/// One participant slot in the read model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrantView {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub picture_ref: Option<String>,
    pub status: SlotStatus,
    pub is_winner: bool,
    pub result_text: Option<String>,
}

/// One match in the read model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchView {
    pub id: MatchId,
    pub round: u32,
    pub position: u32,
    pub state: MatchState,
    pub score1: Option<i32>,
    pub score2: Option<i32>,
    pub winner_id: Option<ParticipantId>,
    pub next_match_id: Option<MatchId>,
    pub loser_match_id: Option<MatchId>,
    pub position_hint: Option<i32>,
    pub entrants: Vec<EntrantView>,
}

/// Matches of one round, in position order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundView {
    pub round: u32,
    pub matches: Vec<MatchView>,
}

/// One bracket section with its rounds in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionView {
    pub section: BracketSection,
    pub rounds: Vec<RoundView>,
}

/// Full bracket read model for UI rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketView {
    pub tournament_id: TournamentId,
    pub sections: Vec<SectionView>,
}
