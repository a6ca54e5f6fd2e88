//! Battle-royale scoring.
//!
//! Battle royale has no match graph: a round produces a placement and a
//! kill count per participant, and points are a placement-table lookup
//! plus kills times a factor. Kept separate from the bracket engine; it
//! consumes the same participant identities and nothing else.

use serde::{Deserialize, Serialize};

use crate::tournament::ParticipantId;

/// Points per finishing placement, best placement first.
///
/// Placements beyond the table score zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementTable {
    points: Vec<i64>,
}

impl Default for PlacementTable {
    fn default() -> Self {
        Self {
            points: vec![12, 9, 7, 5, 4, 3, 2, 1],
        }
    }
}

impl PlacementTable {
    pub fn new(points: Vec<i64>) -> Self {
        Self { points }
    }

    /// Points for a 1-based placement.
    pub fn points_for(&self, placement: u32) -> i64 {
        if placement == 0 {
            return 0;
        }
        self.points
            .get(placement as usize - 1)
            .copied()
            .unwrap_or(0)
    }
}

/// One participant's raw round result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEntry {
    pub participant_id: ParticipantId,
    /// 1-based finishing placement
    pub placement: u32,
    pub kills: u32,
}

/// A scored participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRoyaleScore {
    pub participant_id: ParticipantId,
    pub placement: u32,
    pub kills: u32,
    pub placement_points: i64,
    pub kill_points: i64,
    pub total: i64,
}

/// Score a battle-royale round.
///
/// Returns entries ranked by total points descending; ties break on
/// kills, then participant id for a reproducible order.
pub fn score_round(
    entries: &[RoundEntry],
    kill_factor: i64,
    table: &PlacementTable,
) -> Vec<BattleRoyaleScore> {
    let mut scored: Vec<BattleRoyaleScore> = entries
        .iter()
        .map(|entry| {
            let placement_points = table.points_for(entry.placement);
            let kill_points = i64::from(entry.kills) * kill_factor;
            BattleRoyaleScore {
                participant_id: entry.participant_id,
                placement: entry.placement,
                kills: entry.kills,
                placement_points,
                kill_points,
                total: placement_points + kill_points,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| b.kills.cmp(&a.kills))
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    });

    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::ParticipantId;
    use uuid::Uuid;

    #[test]
    fn test_placement_lookup() {
        let table = PlacementTable::default();
        assert_eq!(table.points_for(1), 12);
        assert_eq!(table.points_for(8), 1);
        assert_eq!(table.points_for(9), 0);
        assert_eq!(table.points_for(0), 0);
    }

    #[test]
    fn test_kills_can_outscore_placement() {
        let first = RoundEntry {
            participant_id: Uuid::new_v4(),
            placement: 1,
            kills: 0,
        };
        let hunter = RoundEntry {
            participant_id: Uuid::new_v4(),
            placement: 4,
            kills: 5,
        };

        let scored = score_round(&[first.clone(), hunter.clone()], 2, &PlacementTable::default());

        // 5 + 5 * 2 = 15 beats 12.
        assert_eq!(scored[0].participant_id, hunter.participant_id);
        assert_eq!(scored[0].total, 15);
        assert_eq!(scored[1].total, 12);
    }

    #[test]
    fn test_ties_break_on_kills_then_id() {
        let mut ids: Vec<ParticipantId> = (0..2).map(|_| Uuid::new_v4()).collect();
        let entries = vec![
            RoundEntry {
                participant_id: ids[0],
                placement: 2,
                kills: 3,
            },
            RoundEntry {
                participant_id: ids[1],
                placement: 5,
                kills: 8,
            },
        ];

        // 9 + 3 = 12 vs 4 + 8 = 12: more kills wins the tie.
        let scored = score_round(&entries, 1, &PlacementTable::default());
        assert_eq!(scored[0].participant_id, entries[1].participant_id);

        // Identical everything: id order decides.
        let entries: Vec<RoundEntry> = ids
            .iter()
            .map(|&id| RoundEntry {
                participant_id: id,
                placement: 3,
                kills: 1,
            })
            .collect();
        let scored = score_round(&entries, 1, &PlacementTable::default());
        ids.sort();
        assert_eq!(scored[0].participant_id, ids[0]);
    }
}
