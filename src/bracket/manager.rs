//! Bracket manager for generating and reading elimination brackets.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{info, warn};
use sqlx::PgPool;

use super::builder;
use super::graph::BracketGraph;
use super::models::{
    BracketSection, BracketSummary, BracketView, EntrantView, MatchView, RoundView, SectionView,
};
use super::store;
use crate::errors::{EngineError, EngineResult};
use crate::progression::engine as progression;
use crate::tournament::{catalog, BracketKind, TournamentId, TournamentStatus};

/// Bracket manager
#[derive(Clone)]
pub struct BracketManager {
    pool: Arc<PgPool>,
}

impl BracketManager {
    /// Create a new bracket manager
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Generate the elimination bracket for a tournament.
    ///
    /// Seeds the accepted participants into a power-of-two grid, builds
    /// the match graph for the tournament's format, resolves the initial
    /// byes, and persists everything in one transaction. The tournament
    /// moves to `Ongoing`.
    ///
    /// # Errors
    ///
    /// * `Validation` - fewer than two accepted participants, or the
    ///   tournament's format has no elimination bracket
    /// * `Conflict` - matches already exist and `force` was not passed;
    ///   with `force` the old graph is replaced atomically
    pub async fn generate(
        &self,
        tournament_id: TournamentId,
        force: bool,
    ) -> EngineResult<BracketSummary> {
        let mut tx = self.pool.begin().await?;

        let meta = catalog::fetch_meta_for_update(&mut tx, tournament_id).await?;
        if !meta.kind.is_elimination() {
            return Err(EngineError::Validation(format!(
                "{} tournaments do not use an elimination bracket",
                meta.kind.as_str()
            )));
        }

        let existing = store::count_matches(&mut tx, tournament_id).await?;
        if existing > 0 {
            if !force {
                return Err(EngineError::Conflict(format!(
                    "tournament {tournament_id} already has a bracket; pass force to rebuild"
                )));
            }
            warn!("rebuilding bracket for tournament {tournament_id}, dropping {existing} matches");
            store::delete_bracket(&mut tx, tournament_id).await?;
        }

        let participants = catalog::accepted_participants(&mut tx, tournament_id).await?;
        if participants.len() < 2 {
            return Err(EngineError::Validation(format!(
                "at least two accepted participants are required, found {}",
                participants.len()
            )));
        }

        let slots = builder::seeded_slots(&participants);
        let bracket_size = slots.len();
        let mut graph = match meta.kind {
            BracketKind::DoubleElimination => builder::double_elimination(&slots)?,
            _ => builder::single_elimination(&slots)?,
        };

        let resolved = progression::resolve_byes(&mut graph)?;
        store::insert_graph(&mut tx, tournament_id, &mut graph).await?;
        catalog::set_status(&mut tx, tournament_id, TournamentStatus::Ongoing).await?;

        tx.commit().await?;

        info!(
            "generated {} bracket for tournament {tournament_id}: {} matches, {} byes resolved",
            meta.kind.as_str(),
            graph.len(),
            resolved.byes_resolved
        );

        Ok(summarize(tournament_id, meta.kind, bracket_size, participants.len(), &graph))
    }

    /// Full bracket read model: sections in order, rounds in order,
    /// matches in position order with their participants.
    pub async fn bracket(&self, tournament_id: TournamentId) -> EngineResult<BracketView> {
        let mut tx = self.pool.begin().await?;

        catalog::fetch_meta(&mut tx, tournament_id).await?;
        let (graph, _) = store::load_graph(&mut tx, tournament_id).await?;

        tx.commit().await?;

        Ok(view_of(tournament_id, &graph))
    }
}

fn summarize(
    tournament_id: TournamentId,
    kind: BracketKind,
    bracket_size: usize,
    entrants: usize,
    graph: &BracketGraph,
) -> BracketSummary {
    let rounds = graph
        .nodes()
        .iter()
        .filter(|n| n.section == BracketSection::Winners)
        .map(|n| n.round)
        .max()
        .unwrap_or(0);

    BracketSummary {
        tournament_id,
        kind,
        bracket_size,
        entrants,
        byes: bracket_size - entrants,
        rounds,
        matches: graph.len(),
    }
}

fn view_of(tournament_id: TournamentId, graph: &BracketGraph) -> BracketView {
    let mut sections: BTreeMap<BracketSection, BTreeMap<u32, Vec<MatchView>>> = BTreeMap::new();

    for node in graph.nodes() {
        let entrants = node
            .entrants
            .iter()
            .map(|e| EntrantView {
                participant_id: e.participant.id,
                display_name: e.participant.display_name.clone(),
                picture_ref: e.participant.picture_ref.clone(),
                status: e.status,
                is_winner: e.is_winner,
                result_text: e.result_text.clone(),
            })
            .collect();

        let (score1, score2) = match node.score {
            Some((a, b)) => (Some(a), Some(b)),
            None => (None, None),
        };

        let view = MatchView {
            id: node.id.unwrap_or_default(),
            round: node.round,
            position: node.position,
            state: node.state,
            score1,
            score2,
            winner_id: node.winner_id,
            next_match_id: node.next.and_then(|t| graph.node(t).id),
            loser_match_id: node.loser_next.and_then(|t| graph.node(t).id),
            position_hint: node.position_hint,
            entrants,
        };

        sections
            .entry(node.section)
            .or_default()
            .entry(node.round)
            .or_default()
            .push(view);
    }

    BracketView {
        tournament_id,
        sections: sections
            .into_iter()
            .map(|(section, rounds)| SectionView {
                section,
                rounds: rounds
                    .into_iter()
                    .map(|(round, mut matches)| {
                        matches.sort_by_key(|m| m.position);
                        RoundView { round, matches }
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::builder::{seeded_slots, single_elimination};
    use crate::tournament::{ParticipantRef, SourceKind};
    use uuid::Uuid;

    fn participants(n: usize) -> Vec<ParticipantRef> {
        (0..n)
            .map(|i| ParticipantRef {
                id: Uuid::new_v4(),
                display_name: format!("entrant-{i}"),
                picture_ref: None,
                source_kind: SourceKind::Player,
            })
            .collect()
    }

    #[test]
    fn test_summary_counts_byes_and_rounds() {
        let entrants = participants(5);
        let graph = single_elimination(&seeded_slots(&entrants)).unwrap();
        let summary = summarize(7, BracketKind::SingleElimination, 8, 5, &graph);

        assert_eq!(summary.bracket_size, 8);
        assert_eq!(summary.byes, 3);
        assert_eq!(summary.rounds, 3);
        assert_eq!(summary.matches, 7);
    }

    #[test]
    fn test_view_groups_matches_by_round() {
        let entrants = participants(8);
        let graph = single_elimination(&seeded_slots(&entrants)).unwrap();
        let view = view_of(7, &graph);

        assert_eq!(view.sections.len(), 1);
        let rounds = &view.sections[0].rounds;
        assert_eq!(rounds.len(), 3);
        assert_eq!(rounds[0].matches.len(), 4);
        assert_eq!(rounds[2].matches.len(), 1);

        // Positions are in order within each round.
        let positions: Vec<u32> = rounds[0].matches.iter().map(|m| m.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }
}
