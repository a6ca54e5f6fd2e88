//! Transactional entry points for match progression.
//!
//! Each operation takes the tournament's row lock, loads the match graph
//! into the arena, runs the pure engine, and writes back only the dirty
//! nodes. Everything a call does commits or rolls back as one unit, so a
//! half-advanced bracket is never observable.

use std::sync::Arc;

use log::info;
use sqlx::{PgPool, Row};

use super::engine;
use super::models::{ByeResolution, MatchOutcome};
use crate::bracket::store;
use crate::errors::{EngineError, EngineResult};
use crate::tournament::{catalog, MatchId, TournamentId, TournamentStatus};

/// Match progression manager
#[derive(Clone)]
pub struct ProgressionManager {
    pool: Arc<PgPool>,
}

impl ProgressionManager {
    /// Create a new progression manager
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Record a reported score and advance the bracket.
    ///
    /// The winner moves along the match's forward link, the loser along
    /// its loser link (double elimination), byes cascade to a fixed
    /// point, and a decided terminal match completes the tournament.
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown match
    /// * `Conflict` - the match already has a recorded result
    /// * `Validation` - negative scores or a draw
    /// * `Precondition` - the match does not have two participants yet
    pub async fn submit_match_result(
        &self,
        match_id: MatchId,
        score1: i32,
        score2: i32,
    ) -> EngineResult<MatchOutcome> {
        let mut tx = self.pool.begin().await?;

        let tournament_id = owning_tournament(&mut tx, match_id).await?;
        let meta = catalog::fetch_meta_for_update(&mut tx, tournament_id).await?;

        let (mut graph, index_of) = store::load_graph(&mut tx, tournament_id).await?;
        // The graph may have been rebuilt between the ownership probe
        // and the lock; the id map is authoritative.
        let index = *index_of
            .get(&match_id)
            .ok_or(EngineError::MatchNotFound(match_id))?;

        let outcome = engine::submit_result(&mut graph, index, score1, score2)?;
        store::persist_nodes(&mut tx, &graph, outcome.dirty.iter().copied()).await?;

        if outcome.tournament_completed && meta.status != TournamentStatus::Completed {
            catalog::set_status(&mut tx, tournament_id, TournamentStatus::Completed).await?;
            info!("tournament {tournament_id} completed by match {match_id}");
        }

        tx.commit().await?;

        let node = graph.node(index);
        let winner_id = node
            .winner_id
            .ok_or_else(|| EngineError::Validation("recorded match lost its winner".to_string()))?;

        Ok(MatchOutcome {
            match_id,
            tournament_id,
            winner_id,
            score1,
            score2,
            byes_resolved: outcome.byes_resolved,
            tournament_completed: outcome.tournament_completed,
        })
    }

    /// Sweep the bracket for unresolved byes.
    ///
    /// Idempotent: a second call with no new byes reports a processed
    /// count of zero and leaves the bracket untouched.
    pub async fn resolve_byes(&self, tournament_id: TournamentId) -> EngineResult<ByeResolution> {
        let mut tx = self.pool.begin().await?;

        let meta = catalog::fetch_meta_for_update(&mut tx, tournament_id).await?;
        let (mut graph, _) = store::load_graph(&mut tx, tournament_id).await?;

        if graph.is_empty() {
            return Err(EngineError::Precondition(format!(
                "tournament {tournament_id} has no bracket to resolve"
            )));
        }

        let outcome = engine::resolve_byes(&mut graph)?;
        store::persist_nodes(&mut tx, &graph, outcome.dirty.iter().copied()).await?;

        if outcome.tournament_completed && meta.status != TournamentStatus::Completed {
            catalog::set_status(&mut tx, tournament_id, TournamentStatus::Completed).await?;
        }

        tx.commit().await?;

        Ok(ByeResolution {
            tournament_id,
            processed_count: outcome.byes_resolved,
            tournament_completed: outcome.tournament_completed,
        })
    }

    /// Clear a recorded result so the match can be re-scored.
    ///
    /// Refused with `Conflict` once a downstream match has recorded its
    /// own result.
    pub async fn reset_match(&self, match_id: MatchId) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        let tournament_id = owning_tournament(&mut tx, match_id).await?;
        catalog::fetch_meta_for_update(&mut tx, tournament_id).await?;

        let (mut graph, index_of) = store::load_graph(&mut tx, tournament_id).await?;
        let index = *index_of
            .get(&match_id)
            .ok_or(EngineError::MatchNotFound(match_id))?;

        let outcome = engine::reset_result(&mut graph, index)?;
        store::persist_nodes(&mut tx, &graph, outcome.dirty.iter().copied()).await?;

        tx.commit().await?;

        info!("cleared result of match {match_id} in tournament {tournament_id}");
        Ok(())
    }
}

async fn owning_tournament(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    match_id: MatchId,
) -> EngineResult<TournamentId> {
    let row = sqlx::query("SELECT tournament_id FROM matches WHERE id = $1")
        .bind(match_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(EngineError::MatchNotFound(match_id))?;

    Ok(row.get("tournament_id"))
}
