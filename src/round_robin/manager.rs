//! Group manager: group creation, fixture scheduling, and results.

use std::sync::Arc;

use log::info;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::models::{Fixture, FixtureStatus, Group, GroupStandings, Standing};
use super::scheduler::{round_robin_pairings, snake_groups};
use super::standings::{apply_fixture_result, rank, PointsRule};
use crate::errors::{EngineError, EngineResult};
use crate::tournament::{
    catalog, BracketKind, FixtureId, GroupId, ParticipantId, TournamentId, TournamentStatus,
};

/// Group manager
#[derive(Clone)]
pub struct GroupManager {
    pool: Arc<PgPool>,
}

impl GroupManager {
    /// Create a new group manager
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create the round-robin groups for a tournament.
    ///
    /// Participants are snake-drafted across `num_groups` groups by seed
    /// (default one group), then every group gets zeroed standings and a
    /// full circle-method fixture schedule. One transaction covers
    /// groups, memberships, standings, and fixtures; the tournament
    /// moves to `Ongoing`.
    ///
    /// # Errors
    ///
    /// * `Validation` - wrong format, no groups requested, or too few
    ///   participants for the requested group count
    /// * `Conflict` - groups already exist for the tournament
    pub async fn create_groups(
        &self,
        tournament_id: TournamentId,
        num_groups: Option<usize>,
    ) -> EngineResult<Vec<Group>> {
        let group_count = num_groups.unwrap_or(1);
        if group_count == 0 {
            return Err(EngineError::Validation(
                "at least one group must be requested".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let meta = catalog::fetch_meta_for_update(&mut tx, tournament_id).await?;
        if meta.kind != BracketKind::RoundRobin {
            return Err(EngineError::Validation(format!(
                "{} tournaments do not use group play",
                meta.kind.as_str()
            )));
        }

        let existing =
            sqlx::query("SELECT COUNT(*) AS n FROM groups WHERE tournament_id = $1")
                .bind(tournament_id)
                .fetch_one(&mut *tx)
                .await?;
        if existing.get::<i64, _>("n") > 0 {
            return Err(EngineError::Conflict(format!(
                "tournament {tournament_id} already has groups"
            )));
        }

        let participants = catalog::accepted_participants(&mut tx, tournament_id).await?;
        if participants.len() < 2 * group_count {
            return Err(EngineError::Validation(format!(
                "{} groups need at least {} participants, found {}",
                group_count,
                2 * group_count,
                participants.len()
            )));
        }

        let buckets = snake_groups(participants.len(), group_count);
        let mut groups = Vec::with_capacity(group_count);

        for (bucket_index, member_indices) in buckets.into_iter().enumerate() {
            let name = group_name(bucket_index);
            let row = sqlx::query(
                r#"
                INSERT INTO groups (tournament_id, name, is_primary)
                VALUES ($1, $2, $3)
                RETURNING id
                "#,
            )
            .bind(tournament_id)
            .bind(&name)
            .bind(bucket_index == 0)
            .fetch_one(&mut *tx)
            .await?;
            let group_id: GroupId = row.get("id");

            for (member_position, &participant_index) in member_indices.iter().enumerate() {
                let participant = &participants[participant_index];

                sqlx::query(
                    "INSERT INTO group_memberships (group_id, participant_id) VALUES ($1, $2)",
                )
                .bind(group_id)
                .bind(participant.id)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    INSERT INTO standings
                        (tournament_id, group_id, participant_id, matches_played,
                         wins, draws, losses, score_for, score_against, points, position)
                    VALUES ($1, $2, $3, 0, 0, 0, 0, 0, 0, 0, $4)
                    "#,
                )
                .bind(tournament_id)
                .bind(group_id)
                .bind(participant.id)
                .bind((member_position + 1) as i32)
                .execute(&mut *tx)
                .await?;
            }

            for (round_index, pairs) in
                round_robin_pairings(member_indices.len()).into_iter().enumerate()
            {
                for (home, away) in pairs {
                    sqlx::query(
                        r#"
                        INSERT INTO round_robin_fixtures
                            (group_id, round, participant1_id, participant2_id, status)
                        VALUES ($1, $2, $3, $4, $5)
                        "#,
                    )
                    .bind(group_id)
                    .bind((round_index + 1) as i32)
                    .bind(participants[member_indices[home]].id)
                    .bind(participants[member_indices[away]].id)
                    .bind(FixtureStatus::Scheduled.as_str())
                    .execute(&mut *tx)
                    .await?;
                }
            }

            groups.push(Group {
                id: group_id,
                tournament_id,
                name,
                is_primary: bucket_index == 0,
            });
        }

        catalog::set_status(&mut tx, tournament_id, TournamentStatus::Ongoing).await?;
        tx.commit().await?;

        info!(
            "created {} round-robin groups for tournament {tournament_id} with {} participants",
            groups.len(),
            participants.len()
        );

        Ok(groups)
    }

    /// Record a fixture result and refresh the group table.
    ///
    /// Draws are allowed; `winner_id` stays null for them. The fixture
    /// update, both standings rows, and the rewritten positions commit
    /// as one transaction. Returns the refreshed table in rank order.
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown fixture
    /// * `Conflict` - the fixture was already completed
    /// * `Validation` - negative scores
    pub async fn record_fixture_result(
        &self,
        fixture_id: FixtureId,
        score1: i32,
        score2: i32,
    ) -> EngineResult<Vec<Standing>> {
        if score1 < 0 || score2 < 0 {
            return Err(EngineError::Validation(
                "scores must be non-negative".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let tournament_id = owning_tournament(&mut tx, fixture_id).await?;
        let meta = catalog::fetch_meta_for_update(&mut tx, tournament_id).await?;

        // Re-read under the tournament lock; a concurrent submission may
        // have completed the fixture before the lock was granted.
        let fixture = fetch_fixture(&mut tx, fixture_id).await?;
        if fixture.status == FixtureStatus::Completed {
            return Err(EngineError::Conflict(format!(
                "fixture {fixture_id} already has a recorded result"
            )));
        }

        let winner_id = if score1 > score2 {
            Some(fixture.participant1_id)
        } else if score2 > score1 {
            Some(fixture.participant2_id)
        } else {
            None
        };

        sqlx::query(
            r#"
            UPDATE round_robin_fixtures
            SET score1 = $1, score2 = $2, winner_id = $3, status = $4
            WHERE id = $5
            "#,
        )
        .bind(score1)
        .bind(score2)
        .bind(winner_id)
        .bind(FixtureStatus::Completed.as_str())
        .bind(fixture_id)
        .execute(&mut *tx)
        .await?;

        let mut side1 =
            fetch_standing(&mut tx, fixture.group_id, fixture.participant1_id).await?;
        let mut side2 =
            fetch_standing(&mut tx, fixture.group_id, fixture.participant2_id).await?;

        let points = PointsRule {
            win: meta.settings.points_per_win,
            draw: meta.settings.points_per_draw,
        };
        apply_fixture_result(&mut side1, &mut side2, score1, score2, points);
        update_standing(&mut tx, &side1).await?;
        update_standing(&mut tx, &side2).await?;

        let mut table = fetch_group_standings(&mut tx, fixture.group_id).await?;
        rank(&mut table);
        for row in &table {
            sqlx::query(
                "UPDATE standings SET position = $1 WHERE group_id = $2 AND participant_id = $3",
            )
            .bind(row.position)
            .bind(row.group_id)
            .bind(row.participant_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(table)
    }

    /// Ranked tables for every group of a tournament.
    pub async fn standings(&self, tournament_id: TournamentId) -> EngineResult<Vec<GroupStandings>> {
        let mut tx = self.pool.begin().await?;

        catalog::fetch_meta(&mut tx, tournament_id).await?;

        let group_rows = sqlx::query(
            "SELECT id, tournament_id, name, is_primary
             FROM groups WHERE tournament_id = $1 ORDER BY id",
        )
        .bind(tournament_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut result = Vec::with_capacity(group_rows.len());
        for row in group_rows {
            let group = Group {
                id: row.get("id"),
                tournament_id: row.get("tournament_id"),
                name: row.get("name"),
                is_primary: row.get("is_primary"),
            };
            let mut rows = fetch_group_standings(&mut tx, group.id).await?;
            rows.sort_by_key(|r| r.position);
            result.push(GroupStandings { group, rows });
        }

        tx.commit().await?;
        Ok(result)
    }
}

/// Letter names for the first 26 groups, numbered beyond that.
fn group_name(index: usize) -> String {
    if index < 26 {
        let letter = (b'A' + index as u8) as char;
        format!("Group {letter}")
    } else {
        format!("Group {}", index + 1)
    }
}

async fn owning_tournament(
    tx: &mut Transaction<'_, Postgres>,
    fixture_id: FixtureId,
) -> EngineResult<TournamentId> {
    let row = sqlx::query(
        r#"
        SELECT g.tournament_id
        FROM round_robin_fixtures f
        JOIN groups g ON g.id = f.group_id
        WHERE f.id = $1
        "#,
    )
    .bind(fixture_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(EngineError::FixtureNotFound(fixture_id))?;

    Ok(row.get("tournament_id"))
}

async fn fetch_fixture(
    tx: &mut Transaction<'_, Postgres>,
    fixture_id: FixtureId,
) -> EngineResult<Fixture> {
    let row = sqlx::query(
        r#"
        SELECT id, group_id, round, participant1_id, participant2_id,
               score1, score2, winner_id, status
        FROM round_robin_fixtures
        WHERE id = $1
        "#,
    )
    .bind(fixture_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(EngineError::FixtureNotFound(fixture_id))?;

    let status_str: String = row.get("status");
    let status = FixtureStatus::parse(&status_str)
        .ok_or_else(|| EngineError::Validation(format!("unknown fixture status: {status_str}")))?;

    Ok(Fixture {
        id: row.get("id"),
        group_id: row.get("group_id"),
        round: row.get("round"),
        participant1_id: row.get("participant1_id"),
        participant2_id: row.get("participant2_id"),
        score1: row.get("score1"),
        score2: row.get("score2"),
        winner_id: row.get("winner_id"),
        status,
    })
}

fn standing_from_row(row: &PgRow) -> Standing {
    Standing {
        tournament_id: row.get("tournament_id"),
        group_id: row.get("group_id"),
        participant_id: row.get("participant_id"),
        matches_played: row.get("matches_played"),
        wins: row.get("wins"),
        draws: row.get("draws"),
        losses: row.get("losses"),
        score_for: row.get("score_for"),
        score_against: row.get("score_against"),
        points: row.get("points"),
        position: row.get("position"),
    }
}

async fn fetch_standing(
    tx: &mut Transaction<'_, Postgres>,
    group_id: GroupId,
    participant_id: ParticipantId,
) -> EngineResult<Standing> {
    let row = sqlx::query(
        r#"
        SELECT tournament_id, group_id, participant_id, matches_played,
               wins, draws, losses, score_for, score_against, points, position
        FROM standings
        WHERE group_id = $1 AND participant_id = $2
        "#,
    )
    .bind(group_id)
    .bind(participant_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| {
        EngineError::Precondition(format!(
            "no standings row for participant {participant_id} in group {group_id}"
        ))
    })?;

    Ok(standing_from_row(&row))
}

async fn update_standing(
    tx: &mut Transaction<'_, Postgres>,
    standing: &Standing,
) -> EngineResult<()> {
    sqlx::query(
        r#"
        UPDATE standings
        SET matches_played = $1, wins = $2, draws = $3, losses = $4,
            score_for = $5, score_against = $6, points = $7
        WHERE group_id = $8 AND participant_id = $9
        "#,
    )
    .bind(standing.matches_played)
    .bind(standing.wins)
    .bind(standing.draws)
    .bind(standing.losses)
    .bind(standing.score_for)
    .bind(standing.score_against)
    .bind(standing.points)
    .bind(standing.group_id)
    .bind(standing.participant_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub(crate) async fn fetch_group_standings(
    tx: &mut Transaction<'_, Postgres>,
    group_id: GroupId,
) -> EngineResult<Vec<Standing>> {
    let rows = sqlx::query(
        r#"
        SELECT tournament_id, group_id, participant_id, matches_played,
               wins, draws, losses, score_for, score_against, points, position
        FROM standings
        WHERE group_id = $1
        "#,
    )
    .bind(group_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.iter().map(standing_from_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_names() {
        assert_eq!(group_name(0), "Group A");
        assert_eq!(group_name(1), "Group B");
        assert_eq!(group_name(25), "Group Z");
        assert_eq!(group_name(26), "Group 27");
    }
}
