//! Standings bookkeeping and ranking.

use super::models::Standing;

/// League points awarded per result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsRule {
    pub win: i32,
    pub draw: i32,
}

impl Default for PointsRule {
    fn default() -> Self {
        Self { win: 3, draw: 1 }
    }
}

/// Fold one finalized fixture into both sides' rows.
///
/// Each row is updated from its own perspective; a draw credits both
/// sides with the draw points.
pub fn apply_fixture_result(
    side1: &mut Standing,
    side2: &mut Standing,
    score1: i32,
    score2: i32,
    points: PointsRule,
) {
    side1.matches_played += 1;
    side2.matches_played += 1;
    side1.score_for += score1;
    side1.score_against += score2;
    side2.score_for += score2;
    side2.score_against += score1;

    if score1 > score2 {
        side1.wins += 1;
        side1.points += points.win;
        side2.losses += 1;
    } else if score2 > score1 {
        side2.wins += 1;
        side2.points += points.win;
        side1.losses += 1;
    } else {
        side1.draws += 1;
        side2.draws += 1;
        side1.points += points.draw;
        side2.points += points.draw;
    }
}

/// Sort a group table into rank order and rewrite positions.
///
/// Points descending, then score difference, then score for; remaining
/// ties break on participant id so the order is reproducible across
/// runs.
pub fn rank(rows: &mut [Standing]) {
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.score_difference().cmp(&a.score_difference()))
            .then_with(|| b.score_for.cmp(&a.score_for))
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    });

    for (index, row) in rows.iter_mut().enumerate() {
        row.position = (index + 1) as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::ParticipantId;
    use uuid::Uuid;

    fn row(participant_id: ParticipantId) -> Standing {
        Standing::zeroed(1, 1, participant_id, 0)
    }

    #[test]
    fn test_win_awards_three_points() {
        let mut a = row(Uuid::new_v4());
        let mut b = row(Uuid::new_v4());
        apply_fixture_result(&mut a, &mut b, 3, 0, PointsRule::default());

        assert_eq!(a.points, 3);
        assert_eq!(a.wins, 1);
        assert_eq!(a.score_for, 3);
        assert_eq!(a.score_against, 0);
        assert_eq!(b.points, 0);
        assert_eq!(b.losses, 1);
        assert_eq!(b.score_for, 0);
        assert_eq!(b.score_against, 3);
        assert_eq!(a.matches_played, 1);
        assert_eq!(b.matches_played, 1);
    }

    #[test]
    fn test_draw_awards_one_point_each() {
        let mut a = row(Uuid::new_v4());
        let mut b = row(Uuid::new_v4());
        apply_fixture_result(&mut a, &mut b, 1, 1, PointsRule::default());

        assert_eq!(a.points, 1);
        assert_eq!(b.points, 1);
        assert_eq!(a.draws, 1);
        assert_eq!(b.draws, 1);
        assert_eq!(a.wins + a.losses + b.wins + b.losses, 0);
    }

    #[test]
    fn test_rank_orders_by_points_then_difference_then_scored() {
        let ids: Vec<ParticipantId> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut rows: Vec<Standing> = ids.iter().map(|&id| row(id)).collect();

        rows[0].points = 6;
        rows[1].points = 6;
        rows[1].score_for = 5;
        rows[1].score_against = 1; // diff 4
        rows[0].score_for = 4;
        rows[0].score_against = 2; // diff 2
        rows[2].points = 3;
        rows[3].points = 3;
        rows[2].score_for = 2;
        rows[2].score_against = 2;
        rows[3].score_for = 4;
        rows[3].score_against = 4; // same diff, more scored

        rank(&mut rows);

        assert_eq!(rows[0].participant_id, ids[1]);
        assert_eq!(rows[1].participant_id, ids[0]);
        assert_eq!(rows[2].participant_id, ids[3]);
        assert_eq!(rows[3].participant_id, ids[2]);
        assert_eq!(
            rows.iter().map(|r| r.position).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn test_rank_breaks_full_ties_by_participant_id() {
        let mut ids: Vec<ParticipantId> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut rows: Vec<Standing> = ids.iter().map(|&id| row(id)).collect();

        rank(&mut rows);

        ids.sort();
        assert_eq!(
            rows.iter().map(|r| r.participant_id).collect::<Vec<_>>(),
            ids
        );
    }

    #[test]
    fn test_spec_group_scenario() {
        // A beats B 3-0, C beats D 3-0, A beats C 2-1, B beats D 2-0,
        // A beats D 1-0, B draws C 1-1: A is undefeated first, then the
        // rest order by points and goal difference.
        let ids: Vec<ParticipantId> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut rows: Vec<Standing> = ids.iter().map(|&id| row(id)).collect();
        let points = PointsRule::default();

        let fixtures = [
            (0usize, 1usize, 3, 0),
            (2, 3, 3, 0),
            (0, 2, 2, 1),
            (1, 3, 2, 0),
            (0, 3, 1, 0),
            (1, 2, 1, 1),
        ];
        for (i, j, s1, s2) in fixtures {
            let (left, right) = if i < j {
                let (head, tail) = rows.split_at_mut(j);
                (&mut head[i], &mut tail[0])
            } else {
                unreachable!("fixtures are listed with i < j");
            };
            apply_fixture_result(left, right, s1, s2, points);
        }

        rank(&mut rows);

        // A: 9 points. B: 4 (win + draw). C: 4 (win + draw) but better
        // goal difference than B. D: 0.
        assert_eq!(rows[0].participant_id, ids[0]);
        assert_eq!(rows[0].points, 9);
        assert_eq!(rows[1].participant_id, ids[2]);
        assert_eq!(rows[2].participant_id, ids[1]);
        assert_eq!(rows[3].participant_id, ids[3]);
    }
}
