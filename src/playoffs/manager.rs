//! Playoff manager: qualifies from finalized standings into a fresh
//! elimination bracket.

use std::sync::Arc;

use log::info;
use sqlx::{PgPool, Row};

use super::qualifier::{seed_playoff_slots, Qualifier};
use crate::bracket::models::{BracketSection, BracketSummary};
use crate::bracket::{builder, store};
use crate::errors::{EngineError, EngineResult};
use crate::progression::engine as progression;
use crate::tournament::{
    catalog, BracketKind, ParticipantRef, SourceKind, TournamentId, TournamentStatus,
};

/// Playoff manager
#[derive(Clone)]
pub struct PlayoffManager {
    pool: Arc<PgPool>,
}

impl PlayoffManager {
    /// Create a new playoff manager
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Build the playoff bracket from finalized round-robin standings.
    ///
    /// Takes the top `qualifiers_per_group` rows of every group (falling
    /// back to the tournament's configured default), re-seeds them so
    /// group winners are spread apart and round-1 group rematches are
    /// avoided where an alternative slot exists, and materializes a
    /// single-elimination bracket through the same path as first-stage
    /// generation. Initial byes resolve inside the same transaction.
    ///
    /// # Errors
    ///
    /// * `Precondition` - the tournament has no groups, or any fixture
    ///   is still unplayed
    /// * `Conflict` - an elimination bracket already exists
    /// * `Validation` - fewer than two qualifiers
    pub async fn create_playoffs(
        &self,
        tournament_id: TournamentId,
        qualifiers_per_group: Option<u32>,
    ) -> EngineResult<BracketSummary> {
        let mut tx = self.pool.begin().await?;

        let meta = catalog::fetch_meta_for_update(&mut tx, tournament_id).await?;
        let per_group = qualifiers_per_group.unwrap_or(meta.settings.qualifiers_per_group);
        if per_group == 0 {
            return Err(EngineError::Validation(
                "at least one qualifier per group is required".to_string(),
            ));
        }

        let group_rows = sqlx::query(
            "SELECT id FROM groups WHERE tournament_id = $1 ORDER BY id",
        )
        .bind(tournament_id)
        .fetch_all(&mut *tx)
        .await?;
        if group_rows.is_empty() {
            return Err(EngineError::Precondition(format!(
                "tournament {tournament_id} has no round-robin groups"
            )));
        }

        let unplayed = sqlx::query(
            r#"
            SELECT COUNT(*) AS n
            FROM round_robin_fixtures f
            JOIN groups g ON g.id = f.group_id
            WHERE g.tournament_id = $1 AND f.status <> 'completed'
            "#,
        )
        .bind(tournament_id)
        .fetch_one(&mut *tx)
        .await?;
        let unplayed: i64 = unplayed.get("n");
        if unplayed > 0 {
            return Err(EngineError::Precondition(format!(
                "{unplayed} group fixtures are still unplayed"
            )));
        }

        let existing = store::count_matches(&mut tx, tournament_id).await?;
        if existing > 0 {
            return Err(EngineError::Conflict(format!(
                "tournament {tournament_id} already has an elimination bracket"
            )));
        }

        let mut qualifiers = Vec::new();
        for row in &group_rows {
            let group_id: i64 = row.get("id");
            let top = sqlx::query(
                r#"
                SELECT s.group_id, s.position, s.participant_id,
                       e.display_name, e.picture_ref, e.source_kind
                FROM standings s
                JOIN tournament_entries e
                  ON e.tournament_id = s.tournament_id
                 AND e.participant_id = s.participant_id
                WHERE s.group_id = $1
                ORDER BY s.position
                LIMIT $2
                "#,
            )
            .bind(group_id)
            .bind(per_group as i64)
            .fetch_all(&mut *tx)
            .await?;

            for standing in top {
                let source_str: String = standing.get("source_kind");
                let source_kind = SourceKind::parse(&source_str).ok_or_else(|| {
                    EngineError::Validation(format!("unknown source kind: {source_str}"))
                })?;

                qualifiers.push(Qualifier {
                    participant: ParticipantRef {
                        id: standing.get("participant_id"),
                        display_name: standing.get("display_name"),
                        picture_ref: standing.get("picture_ref"),
                        source_kind,
                    },
                    group_id: standing.get("group_id"),
                    rank: standing.get::<i32, _>("position") as u32,
                });
            }
        }

        let slots = seed_playoff_slots(&qualifiers)?;
        let bracket_size = slots.len();
        let participant_slots: Vec<Option<ParticipantRef>> = slots
            .into_iter()
            .map(|slot| slot.map(|q| q.participant))
            .collect();

        let mut graph = builder::single_elimination(&participant_slots)?;
        let resolved = progression::resolve_byes(&mut graph)?;
        store::insert_graph(&mut tx, tournament_id, &mut graph).await?;
        catalog::set_status(&mut tx, tournament_id, TournamentStatus::Ongoing).await?;

        tx.commit().await?;

        info!(
            "created playoffs for tournament {tournament_id}: {} qualifiers from {} groups, {} byes resolved",
            qualifiers.len(),
            group_rows.len(),
            resolved.byes_resolved
        );

        Ok(BracketSummary {
            tournament_id,
            kind: BracketKind::SingleElimination,
            bracket_size,
            entrants: qualifiers.len(),
            byes: bracket_size - qualifiers.len(),
            rounds: graph
                .nodes()
                .iter()
                .filter(|n| n.section == BracketSection::Winners)
                .map(|n| n.round)
                .max()
                .unwrap_or(0),
            matches: graph.len(),
        })
    }
}
