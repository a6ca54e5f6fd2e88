//! Match-graph persistence.
//!
//! Maps the in-memory arena to the `matches` / `match_participants`
//! tables. Rows are inserted in reverse arena order: links always point
//! to higher indices, so walking backwards guarantees every link target
//! already has a database id. All functions run on the caller's
//! transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Postgres, Row, Transaction};

use super::graph::{BracketGraph, Entrant, MatchNode, NodeIndex};
use super::models::{BracketSection, MatchState, SlotStatus};
use crate::errors::{EngineError, EngineResult};
use crate::tournament::{MatchId, ParticipantRef, SourceKind, TournamentId};

/// Number of matches already materialized for a tournament.
pub(crate) async fn count_matches(
    tx: &mut Transaction<'_, Postgres>,
    tournament_id: TournamentId,
) -> EngineResult<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM matches WHERE tournament_id = $1")
        .bind(tournament_id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(row.get("n"))
}

/// Drop a tournament's whole match graph (forced regeneration).
pub(crate) async fn delete_bracket(
    tx: &mut Transaction<'_, Postgres>,
    tournament_id: TournamentId,
) -> EngineResult<()> {
    sqlx::query(
        "DELETE FROM match_participants
         WHERE match_id IN (SELECT id FROM matches WHERE tournament_id = $1)",
    )
    .bind(tournament_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM matches WHERE tournament_id = $1")
        .bind(tournament_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// Insert a freshly built graph, assigning database ids to every node.
pub(crate) async fn insert_graph(
    tx: &mut Transaction<'_, Postgres>,
    tournament_id: TournamentId,
    graph: &mut BracketGraph,
) -> EngineResult<()> {
    let mut ids: Vec<Option<MatchId>> = vec![None; graph.len()];

    for index in (0..graph.len()).rev() {
        let node = graph.node(index);

        let next_id = resolve_link(&ids, node.next)?;
        let loser_id = resolve_link(&ids, node.loser_next)?;
        let (score1, score2) = split_score(node.score);

        let row = sqlx::query(
            r#"
            INSERT INTO matches
                (tournament_id, section, round, position, state,
                 score1, score2, winner_id, next_match_id, loser_match_id,
                 position_hint, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(tournament_id)
        .bind(node.section.as_str())
        .bind(node.round as i32)
        .bind(node.position as i32)
        .bind(node.state.as_str())
        .bind(score1)
        .bind(score2)
        .bind(node.winner_id)
        .bind(next_id)
        .bind(loser_id)
        .bind(node.position_hint)
        .bind(completion_stamp(node))
        .fetch_one(&mut **tx)
        .await?;

        let match_id: MatchId = row.get("id");
        ids[index] = Some(match_id);

        for (slot, entrant) in node.entrants.iter().enumerate() {
            insert_entrant(tx, match_id, slot, entrant).await?;
        }
    }

    for (index, id) in ids.into_iter().enumerate() {
        graph.node_mut(index).id = id;
    }

    Ok(())
}

/// Load a tournament's match graph back into an arena.
///
/// Nodes are ordered by (section, round, position), which reproduces the
/// builders' forward-link ordering; also returns the id-to-index map.
pub(crate) async fn load_graph(
    tx: &mut Transaction<'_, Postgres>,
    tournament_id: TournamentId,
) -> EngineResult<(BracketGraph, HashMap<MatchId, NodeIndex>)> {
    let rows = sqlx::query(
        r#"
        SELECT id, section, round, position, state, score1, score2,
               winner_id, next_match_id, loser_match_id, position_hint
        FROM matches
        WHERE tournament_id = $1
        "#,
    )
    .bind(tournament_id)
    .fetch_all(&mut **tx)
    .await?;

    let mut keyed: Vec<(BracketSection, i32, i32, usize)> = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let section_str: String = row.get("section");
        let section = BracketSection::parse(&section_str).ok_or_else(|| {
            EngineError::Validation(format!("unknown bracket section: {section_str}"))
        })?;
        keyed.push((section, row.get("round"), row.get("position"), i));
    }
    keyed.sort_unstable_by_key(|&(section, round, position, _)| (section, round, position));

    let mut graph = BracketGraph::new();
    let mut index_of: HashMap<MatchId, NodeIndex> = HashMap::with_capacity(rows.len());
    let mut links: Vec<(NodeIndex, Option<MatchId>, Option<MatchId>)> =
        Vec::with_capacity(rows.len());

    for &(section, round, position, i) in &keyed {
        let row = &rows[i];
        let match_id: MatchId = row.get("id");

        let state_str: String = row.get("state");
        let state = MatchState::parse(&state_str)
            .ok_or_else(|| EngineError::Validation(format!("unknown match state: {state_str}")))?;

        let mut node = MatchNode::new(section, round as u32, position as u32);
        node.id = Some(match_id);
        node.state = state;
        node.winner_id = row.get("winner_id");
        node.position_hint = row.get("position_hint");
        let score1: Option<i32> = row.get("score1");
        let score2: Option<i32> = row.get("score2");
        node.score = match (score1, score2) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        };

        let index = graph.push(node);
        index_of.insert(match_id, index);
        links.push((index, row.get("next_match_id"), row.get("loser_match_id")));
    }

    for (index, next_id, loser_id) in links {
        let node = graph.node_mut(index);
        node.next = resolve_id(&index_of, next_id)?;
        node.loser_next = resolve_id(&index_of, loser_id)?;
    }

    let entrant_rows = sqlx::query(
        r#"
        SELECT mp.match_id, mp.participant_id, mp.display_name, mp.picture_ref,
               mp.source_kind, mp.status, mp.is_winner, mp.result_text
        FROM match_participants mp
        JOIN matches m ON m.id = mp.match_id
        WHERE m.tournament_id = $1
        ORDER BY mp.match_id, mp.slot
        "#,
    )
    .bind(tournament_id)
    .fetch_all(&mut **tx)
    .await?;

    for row in entrant_rows {
        let match_id: MatchId = row.get("match_id");
        let index = *index_of.get(&match_id).ok_or_else(|| {
            EngineError::Validation(format!("participant row references unknown match {match_id}"))
        })?;

        let source_str: String = row.get("source_kind");
        let source_kind = SourceKind::parse(&source_str)
            .ok_or_else(|| EngineError::Validation(format!("unknown source kind: {source_str}")))?;
        let status_str: String = row.get("status");
        let status = SlotStatus::parse(&status_str).ok_or_else(|| {
            EngineError::Validation(format!("unknown participant status: {status_str}"))
        })?;

        graph.node_mut(index).entrants.push(Entrant {
            participant: ParticipantRef {
                id: row.get("participant_id"),
                display_name: row.get("display_name"),
                picture_ref: row.get("picture_ref"),
                source_kind,
            },
            status,
            is_winner: row.get("is_winner"),
            result_text: row.get("result_text"),
        });
    }

    Ok((graph, index_of))
}

/// Write back every dirty node: match row update plus a participant
/// rewrite. Rewriting the (at most two) participant rows keeps inserts,
/// updates, and removals on one code path.
pub(crate) async fn persist_nodes(
    tx: &mut Transaction<'_, Postgres>,
    graph: &BracketGraph,
    dirty: impl IntoIterator<Item = NodeIndex>,
) -> EngineResult<()> {
    for index in dirty {
        let node = graph.node(index);
        let match_id = node.id.ok_or_else(|| {
            EngineError::Validation("cannot persist a match that was never inserted".to_string())
        })?;
        let (score1, score2) = split_score(node.score);

        sqlx::query(
            r#"
            UPDATE matches
            SET state = $1, score1 = $2, score2 = $3, winner_id = $4,
                completed_at = $5
            WHERE id = $6
            "#,
        )
        .bind(node.state.as_str())
        .bind(score1)
        .bind(score2)
        .bind(node.winner_id)
        .bind(completion_stamp(node))
        .bind(match_id)
        .execute(&mut **tx)
        .await?;

        sqlx::query("DELETE FROM match_participants WHERE match_id = $1")
            .bind(match_id)
            .execute(&mut **tx)
            .await?;

        for (slot, entrant) in node.entrants.iter().enumerate() {
            insert_entrant(tx, match_id, slot, entrant).await?;
        }
    }

    Ok(())
}

async fn insert_entrant(
    tx: &mut Transaction<'_, Postgres>,
    match_id: MatchId,
    slot: usize,
    entrant: &Entrant,
) -> EngineResult<()> {
    sqlx::query(
        r#"
        INSERT INTO match_participants
            (match_id, slot, participant_id, display_name, picture_ref,
             source_kind, status, is_winner, result_text)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(match_id)
    .bind(slot as i16)
    .bind(entrant.participant.id)
    .bind(&entrant.participant.display_name)
    .bind(&entrant.participant.picture_ref)
    .bind(entrant.participant.source_kind.as_str())
    .bind(entrant.status.as_str())
    .bind(entrant.is_winner)
    .bind(&entrant.result_text)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn resolve_link(ids: &[Option<MatchId>], target: Option<NodeIndex>) -> EngineResult<Option<MatchId>> {
    match target {
        Some(index) => ids
            .get(index)
            .copied()
            .flatten()
            .map(Some)
            .ok_or_else(|| {
                EngineError::Validation("bracket links must point to a later match".to_string())
            }),
        None => Ok(None),
    }
}

fn resolve_id(
    index_of: &HashMap<MatchId, NodeIndex>,
    id: Option<MatchId>,
) -> EngineResult<Option<NodeIndex>> {
    match id {
        Some(id) => index_of
            .get(&id)
            .copied()
            .map(Some)
            .ok_or_else(|| EngineError::Validation(format!("dangling match link to {id}"))),
        None => Ok(None),
    }
}

fn split_score(score: Option<(i32, i32)>) -> (Option<i32>, Option<i32>) {
    match score {
        Some((a, b)) => (Some(a), Some(b)),
        None => (None, None),
    }
}

/// Decided matches carry the time their result landed; anything still
/// scheduled (including a freshly reset match) carries none.
fn completion_stamp(node: &MatchNode) -> Option<DateTime<Utc>> {
    (node.state == MatchState::ScoreRecorded).then(Utc::now)
}
