//! Tournament metadata and participant models.
//!
//! These rows are owned by the external catalog and registration
//! subsystems; the engine reads them and only ever writes status
//! transitions back.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tournament ID type
pub type TournamentId = i64;

/// Match ID type
pub type MatchId = i64;

/// Group ID type
pub type GroupId = i64;

/// Round-robin fixture ID type
pub type FixtureId = i64;

/// Participant ID type (assigned by the registration subsystem)
pub type ParticipantId = Uuid;

/// Bracket format of a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BracketKind {
    /// One loss eliminates
    SingleElimination,
    /// Losers drop to a parallel bracket; a second loss eliminates
    DoubleElimination,
    /// All-pairs group play
    RoundRobin,
    /// Placement/kill scoring, no match graph
    BattleRoyale,
}

impl BracketKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BracketKind::SingleElimination => "single_elimination",
            BracketKind::DoubleElimination => "double_elimination",
            BracketKind::RoundRobin => "round_robin",
            BracketKind::BattleRoyale => "battle_royale",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single_elimination" => Some(BracketKind::SingleElimination),
            "double_elimination" => Some(BracketKind::DoubleElimination),
            "round_robin" => Some(BracketKind::RoundRobin),
            "battle_royale" => Some(BracketKind::BattleRoyale),
            _ => None,
        }
    }

    /// Whether this format materializes an elimination match graph.
    pub fn is_elimination(self) -> bool {
        matches!(
            self,
            BracketKind::SingleElimination | BracketKind::DoubleElimination
        )
    }
}

/// Tournament lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentStatus {
    Draft,
    RegistrationOpen,
    Ongoing,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentStatus::Draft => "draft",
            TournamentStatus::RegistrationOpen => "registration_open",
            TournamentStatus::Ongoing => "ongoing",
            TournamentStatus::Completed => "completed",
            TournamentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(TournamentStatus::Draft),
            "registration_open" => Some(TournamentStatus::RegistrationOpen),
            "ongoing" => Some(TournamentStatus::Ongoing),
            "completed" => Some(TournamentStatus::Completed),
            "cancelled" => Some(TournamentStatus::Cancelled),
            _ => None,
        }
    }
}

/// Whether entries are individual players or teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Participation {
    Individual,
    Team,
}

impl Participation {
    pub fn as_str(self) -> &'static str {
        match self {
            Participation::Individual => "individual",
            Participation::Team => "team",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "individual" => Some(Participation::Individual),
            "team" => Some(Participation::Team),
            _ => None,
        }
    }
}

/// Where a participant entry originates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Player,
    Team,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Player => "player",
            SourceKind::Team => "team",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "player" => Some(SourceKind::Player),
            "team" => Some(SourceKind::Team),
            _ => None,
        }
    }
}

/// An accepted participant as handed over by registration.
///
/// Immutable once referenced by a match; the engine copies the display
/// fields into match participants so later roster edits never rewrite
/// history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRef {
    pub id: ParticipantId,
    pub display_name: String,
    pub picture_ref: Option<String>,
    pub source_kind: SourceKind,
}

/// Per-tournament engine settings, stored as a JSON document on the
/// tournament row. Absent fields fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// League points for a round-robin win
    pub points_per_win: i32,
    /// League points for a round-robin draw (both sides)
    pub points_per_draw: i32,
    /// Standings rows per group that qualify for playoffs
    pub qualifiers_per_group: u32,
    /// Battle-royale points per kill
    pub kill_point_factor: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            points_per_win: 3,
            points_per_draw: 1,
            qualifiers_per_group: 2,
            kill_point_factor: 1,
        }
    }
}

/// Tournament metadata read from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentMeta {
    pub id: TournamentId,
    pub name: String,
    pub kind: BracketKind,
    pub participation: Participation,
    pub max_participants: i32,
    pub status: TournamentStatus,
    pub settings: EngineSettings,
}
