//! Group-stage models.

use serde::{Deserialize, Serialize};

use crate::tournament::{FixtureId, GroupId, ParticipantId, TournamentId};

/// A round-robin group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub tournament_id: TournamentId,
    pub name: String,
    /// The first group created for a stage
    pub is_primary: bool,
}

/// Membership of one participant in one group (unique pair)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub participant_id: ParticipantId,
}

/// One row of a group table.
///
/// Created zeroed at group creation, mutated incrementally as fixture
/// results arrive, and only ever deleted on a full stage reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub tournament_id: TournamentId,
    pub group_id: GroupId,
    pub participant_id: ParticipantId,
    pub matches_played: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub score_for: i32,
    pub score_against: i32,
    pub points: i32,
    /// 1-based rank within the group, rewritten after every update
    pub position: i32,
}

impl Standing {
    /// A zeroed row for a fresh group member.
    pub fn zeroed(
        tournament_id: TournamentId,
        group_id: GroupId,
        participant_id: ParticipantId,
        position: i32,
    ) -> Self {
        Self {
            tournament_id,
            group_id,
            participant_id,
            matches_played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            score_for: 0,
            score_against: 0,
            points: 0,
            position,
        }
    }

    /// Goal difference from this row's perspective.
    pub fn score_difference(&self) -> i32 {
        self.score_for - self.score_against
    }
}

/// Fixture lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixtureStatus {
    Scheduled,
    Completed,
}

impl FixtureStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FixtureStatus::Scheduled => "scheduled",
            FixtureStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(FixtureStatus::Scheduled),
            "completed" => Some(FixtureStatus::Completed),
            _ => None,
        }
    }
}

/// One scheduled pairing inside a group.
///
/// A completed fixture with no winner is a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    pub group_id: GroupId,
    pub round: i32,
    pub participant1_id: ParticipantId,
    pub participant2_id: ParticipantId,
    pub score1: Option<i32>,
    pub score2: Option<i32>,
    pub winner_id: Option<ParticipantId>,
    pub status: FixtureStatus,
}

/// A group together with its ranked table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStandings {
    pub group: Group,
    pub rows: Vec<Standing>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_zeroed_standing() {
        let row = Standing::zeroed(1, 2, Uuid::new_v4(), 4);
        assert_eq!(row.matches_played, 0);
        assert_eq!(row.points, 0);
        assert_eq!(row.position, 4);
        assert_eq!(row.score_difference(), 0);
    }

    #[test]
    fn test_fixture_status_round_trips_through_strings() {
        for status in [FixtureStatus::Scheduled, FixtureStatus::Completed] {
            assert_eq!(FixtureStatus::parse(status.as_str()), Some(status));
        }
    }
}
