//! Pure match-progression logic.
//!
//! Everything here operates on an in-memory [`BracketGraph`]; the
//! manager owns loading it from and persisting it back to storage.
//! Every mutation records the touched nodes in a dirty set so the
//! manager can write back exactly what changed.

use std::collections::BTreeSet;

use crate::bracket::{BracketGraph, MatchState, NodeIndex, SlotStatus};
use crate::bracket::graph::Entrant;
use crate::errors::{EngineError, EngineResult};
use crate::tournament::ParticipantRef;

/// Result text recorded on a slot that advanced without playing.
const BYE_RESULT: &str = "Bye";

/// What a progression call changed
#[derive(Debug, Clone, Default)]
pub struct ProgressionOutcome {
    /// Matches auto-finalized by the bye cascade
    pub byes_resolved: usize,
    /// Whether the terminal match is now decided
    pub tournament_completed: bool,
    /// Arena indices whose rows must be rewritten
    pub dirty: BTreeSet<NodeIndex>,
}

/// Record a reported score on a match and advance its outcome.
///
/// Requires two entrants and a `Scheduled` state. Draws are rejected:
/// elimination matches must produce a winner. The winner moves along the
/// match's `next` link and the loser along `loser_next` (double
/// elimination), both under the insert-if-absent rule so a retried call
/// cannot double-insert. The bye cascade then runs to a fixed point.
///
/// # Errors
///
/// * `Validation` - negative scores or a draw
/// * `Conflict` - the match already has a recorded result
/// * `Precondition` - fewer than two entrants are present
pub fn submit_result(
    graph: &mut BracketGraph,
    index: NodeIndex,
    score1: i32,
    score2: i32,
) -> EngineResult<ProgressionOutcome> {
    if score1 < 0 || score2 < 0 {
        return Err(EngineError::Validation(
            "scores must be non-negative".to_string(),
        ));
    }
    if score1 == score2 {
        return Err(EngineError::Validation(
            "draws are not permitted in elimination matches".to_string(),
        ));
    }

    {
        let node = graph.node(index);
        if node.state == MatchState::ScoreRecorded || node.winner_id.is_some() {
            return Err(EngineError::Conflict(
                "match already has a recorded result".to_string(),
            ));
        }
        if node.entrants.len() != 2 {
            return Err(EngineError::Precondition(format!(
                "match has {} of the 2 required participants",
                node.entrants.len()
            )));
        }
    }

    let mut dirty = BTreeSet::new();
    let winner_slot = usize::from(score2 > score1);
    let scores = [score1, score2];

    {
        let node = graph.node_mut(index);
        node.score = Some((score1, score2));
        node.state = MatchState::ScoreRecorded;
        for (slot, entrant) in node.entrants.iter_mut().enumerate() {
            entrant.status = SlotStatus::Played;
            entrant.is_winner = slot == winner_slot;
            entrant.result_text = Some(format!("{}-{}", scores[slot], scores[1 - slot]));
        }
        let winner_id = node.entrants[winner_slot].participant.id;
        node.winner_id = Some(winner_id);
    }
    dirty.insert(index);

    advance(graph, index, &mut dirty)?;
    let byes_resolved = cascade(graph, &mut dirty)?;

    Ok(ProgressionOutcome {
        byes_resolved,
        tournament_completed: is_complete(graph),
        dirty,
    })
}

/// Run the bye cascade to a fixed point.
///
/// Idempotent: with no newly resolvable byes the outcome reports zero
/// and the graph is untouched.
pub fn resolve_byes(graph: &mut BracketGraph) -> EngineResult<ProgressionOutcome> {
    let mut dirty = BTreeSet::new();
    let byes_resolved = cascade(graph, &mut dirty)?;
    Ok(ProgressionOutcome {
        byes_resolved,
        tournament_completed: is_complete(graph),
        dirty,
    })
}

/// Clear a recorded result so the match can be re-scored.
///
/// Refused once either advanced participant has played downstream:
/// unwinding a deeper subtree is an operator decision, not an engine
/// one.
pub fn reset_result(
    graph: &mut BracketGraph,
    index: NodeIndex,
) -> EngineResult<ProgressionOutcome> {
    let (next, loser_next, winner_id, loser_id) = {
        let node = graph.node(index);
        if node.state != MatchState::ScoreRecorded {
            return Err(EngineError::Conflict(
                "match has no recorded result to clear".to_string(),
            ));
        }
        (
            node.next,
            node.loser_next,
            node.winner_id,
            node.loser().map(|e| e.participant.id),
        )
    };

    for target in [next, loser_next].into_iter().flatten() {
        if graph.node(target).state == MatchState::ScoreRecorded {
            return Err(EngineError::Conflict(
                "a downstream match already has a recorded result".to_string(),
            ));
        }
    }

    let mut dirty = BTreeSet::new();

    if let (Some(target), Some(winner_id)) = (next, winner_id) {
        remove_entrant(graph, target, winner_id, &mut dirty);
    }
    if let (Some(target), Some(loser_id)) = (loser_next, loser_id) {
        remove_entrant(graph, target, loser_id, &mut dirty);
    }

    let node = graph.node_mut(index);
    node.state = MatchState::Scheduled;
    node.score = None;
    node.winner_id = None;
    for entrant in &mut node.entrants {
        entrant.status = SlotStatus::NotPlayed;
        entrant.is_winner = false;
        entrant.result_text = None;
    }
    dirty.insert(index);

    Ok(ProgressionOutcome {
        byes_resolved: 0,
        tournament_completed: false,
        dirty,
    })
}

/// Whether the bracket's terminal match has been decided.
pub fn is_complete(graph: &BracketGraph) -> bool {
    graph
        .terminal()
        .is_some_and(|t| graph.node(t).state == MatchState::ScoreRecorded)
}

/// Move a decided match's winner (and loser, in double elimination) into
/// the linked matches.
fn advance(
    graph: &mut BracketGraph,
    from: NodeIndex,
    dirty: &mut BTreeSet<NodeIndex>,
) -> EngineResult<()> {
    let (next, loser_next, winner, loser) = {
        let node = graph.node(from);
        (
            node.next,
            node.loser_next,
            node.winner().map(|e| e.participant.clone()),
            node.loser().map(|e| e.participant.clone()),
        )
    };

    if let (Some(target), Some(participant)) = (next, winner) {
        insert_if_absent(graph, target, participant, dirty)?;
    }
    if let (Some(target), Some(participant)) = (loser_next, loser) {
        insert_if_absent(graph, target, participant, dirty)?;
    }

    Ok(())
}

/// Insert a participant into a match unless already present.
///
/// The idempotency guard against retried calls; overflowing a match's
/// two slots means the stored graph is corrupt.
fn insert_if_absent(
    graph: &mut BracketGraph,
    target: NodeIndex,
    participant: ParticipantRef,
    dirty: &mut BTreeSet<NodeIndex>,
) -> EngineResult<()> {
    let node = graph.node_mut(target);
    if node.has_entrant(participant.id) {
        return Ok(());
    }
    if node.entrants.len() >= 2 {
        return Err(EngineError::Conflict(format!(
            "match at {} round {} position {} already has two participants",
            node.section.as_str(),
            node.round,
            node.position
        )));
    }
    node.entrants.push(Entrant::new(participant));
    dirty.insert(target);
    Ok(())
}

fn remove_entrant(
    graph: &mut BracketGraph,
    target: NodeIndex,
    participant_id: uuid::Uuid,
    dirty: &mut BTreeSet<NodeIndex>,
) {
    let node = graph.node_mut(target);
    let before = node.entrants.len();
    node.entrants.retain(|e| e.participant.id != participant_id);
    if node.entrants.len() != before {
        dirty.insert(target);
    }
}

/// Resolve byes until nothing changes.
///
/// A match is a bye only when it holds exactly one entrant, has no
/// winner, and every feeder that could still deliver an opponent is
/// settled. A settled feeder is either decided or void: a void match
/// holds no entrants, all of its own feeders are settled, and so it can
/// never produce anyone. Feeders always sit at lower arena indices, so
/// one ascending sweep computes the settled table.
///
/// Each pass over the arena resolves every currently eligible bye;
/// resolution can make deeper matches eligible, so passes repeat up to
/// one more than the number of round layers. Exceeding the cap means
/// the stored links are corrupt and is reported as `PartialCompletion`
/// rather than looping forever.
fn cascade(graph: &mut BracketGraph, dirty: &mut BTreeSet<NodeIndex>) -> EngineResult<usize> {
    let feeders = graph.feeder_table();
    let cap = graph.round_total() + 1;
    let mut processed = 0usize;

    for _ in 0..cap {
        let settled = settled_table(graph, &feeders);
        let mut changed = false;

        for index in 0..graph.len() {
            {
                let node = graph.node(index);
                if node.state != MatchState::Scheduled
                    || node.winner_id.is_some()
                    || node.entrants.len() != 1
                {
                    continue;
                }
                if !feeders[index].iter().all(|&f| settled[f]) {
                    continue;
                }
            }

            let node = graph.node_mut(index);
            let entrant = &mut node.entrants[0];
            entrant.status = SlotStatus::Played;
            entrant.is_winner = true;
            entrant.result_text = Some(BYE_RESULT.to_string());
            let winner_id = entrant.participant.id;
            node.winner_id = Some(winner_id);
            node.state = MatchState::ScoreRecorded;

            dirty.insert(index);
            advance(graph, index, dirty)?;
            processed += 1;
            changed = true;
        }

        if !changed {
            return Ok(processed);
        }
    }

    Err(EngineError::PartialCompletion { processed })
}

fn settled_table(graph: &BracketGraph, feeders: &[Vec<NodeIndex>]) -> Vec<bool> {
    let mut settled = vec![false; graph.len()];
    for index in 0..graph.len() {
        let node = graph.node(index);
        settled[index] = match node.state {
            MatchState::ScoreRecorded => true,
            MatchState::Scheduled => {
                node.entrants.is_empty() && feeders[index].iter().all(|&f| settled[f])
            }
        };
    }
    settled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::builder::{double_elimination, seeded_slots, single_elimination};
    use crate::bracket::models::BracketSection;
    use crate::tournament::{ParticipantId, SourceKind};
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

    /// Index of the first scheduled match with two entrants.
    fn next_playable(graph: &BracketGraph) -> Option<NodeIndex> {
        (0..graph.len()).find(|&i| {
            let node = graph.node(i);
            node.state == MatchState::Scheduled && node.entrants.len() == 2
        })
    }

    /// Play every playable match until the bracket completes; returns
    /// the champion.
    fn play_out(graph: &mut BracketGraph) -> ParticipantId {
        resolve_byes(graph).unwrap();
        let mut guard = 0;
        while let Some(index) = next_playable(graph) {
            submit_result(graph, index, 2, 1).unwrap();
            guard += 1;
            assert!(guard <= graph.len() * 2, "bracket failed to converge");
        }
        let terminal = graph.terminal().unwrap();
        graph.node(terminal).winner_id.unwrap()
    }

    #[test]
    fn test_submit_result_records_and_advances_winner() {
        let entrants = participants(4);
        let mut graph = single_elimination(&seeded_slots(&entrants)).unwrap();

        let outcome = submit_result(&mut graph, 0, 3, 1).unwrap();
        assert_eq!(outcome.byes_resolved, 0);
        assert!(!outcome.tournament_completed);
        assert!(outcome.dirty.contains(&0));

        let played = graph.node(0);
        assert_eq!(played.state, MatchState::ScoreRecorded);
        assert_eq!(played.score, Some((3, 1)));
        let winner_id = played.winner_id.unwrap();

        let final_match = graph.node(2);
        assert!(final_match.has_entrant(winner_id));
        assert_eq!(final_match.entrants.len(), 1);
    }

    #[test]
    fn test_submit_result_rejects_draws_and_negative_scores() {
        let entrants = participants(2);
        let mut graph = single_elimination(&seeded_slots(&entrants)).unwrap();

        assert!(matches!(
            submit_result(&mut graph, 0, 2, 2),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            submit_result(&mut graph, 0, -1, 0),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_submit_result_rejects_rescore() {
        let entrants = participants(2);
        let mut graph = single_elimination(&seeded_slots(&entrants)).unwrap();

        submit_result(&mut graph, 0, 1, 0).unwrap();
        assert!(matches!(
            submit_result(&mut graph, 0, 0, 1),
            Err(EngineError::Conflict(_))
        ));
    }

    #[test]
    fn test_submit_result_requires_two_entrants() {
        let entrants = participants(5);
        let mut graph = single_elimination(&seeded_slots(&entrants)).unwrap();

        let short = (0..graph.len())
            .find(|&i| graph.node(i).entrants.len() == 1)
            .unwrap();
        assert!(matches!(
            submit_result(&mut graph, short, 1, 0),
            Err(EngineError::Precondition(_))
        ));
    }

    #[test]
    fn test_bye_cascade_resolves_five_entrant_bracket() {
        let entrants = participants(5);
        let mut graph = single_elimination(&seeded_slots(&entrants)).unwrap();

        let outcome = resolve_byes(&mut graph).unwrap();
        // Three empty slots in round 1; one chain cascades into round 2.
        assert!(outcome.byes_resolved >= 3);
        assert!(!outcome.tournament_completed);

        // Every remaining scheduled match can still be fed.
        let second = resolve_byes(&mut graph).unwrap();
        assert_eq!(second.byes_resolved, 0);
        assert!(second.dirty.is_empty());
    }

    #[test]
    fn test_bye_does_not_fire_while_feeder_is_pending() {
        let entrants = participants(4);
        let mut graph = single_elimination(&seeded_slots(&entrants)).unwrap();

        // Decide one semifinal; the final now holds one entrant but its
        // other feeder is still playable, so it must not auto-resolve.
        submit_result(&mut graph, 0, 1, 0).unwrap();
        let outcome = resolve_byes(&mut graph).unwrap();
        assert_eq!(outcome.byes_resolved, 0);
        assert_eq!(graph.node(2).state, MatchState::Scheduled);
    }

    #[test]
    fn test_single_elimination_plays_to_completion() {
        for n in [2usize, 3, 5, 8, 13, 16] {
            let entrants = participants(n);
            let mut graph = single_elimination(&seeded_slots(&entrants)).unwrap();
            let champion = play_out(&mut graph);
            assert!(entrants.iter().any(|p| p.id == champion));
            assert!(is_complete(&graph));
        }
    }

    #[test]
    fn test_double_elimination_grand_finals_gets_both_champions() {
        let entrants = participants(8);
        let mut graph = double_elimination(&seeded_slots(&entrants)).unwrap();

        // Play winners and losers brackets until only grand finals is
        // left.
        resolve_byes(&mut graph).unwrap();
        let gf = graph.terminal().unwrap();
        let mut guard = 0;
        while let Some(index) = next_playable(&graph) {
            if index == gf {
                break;
            }
            submit_result(&mut graph, index, 2, 0).unwrap();
            guard += 1;
            assert!(guard <= graph.len() * 2);
        }

        let wb_final = graph
            .nodes()
            .iter()
            .position(|n| n.section == BracketSection::Winners && n.next == Some(gf))
            .unwrap();
        let lb_final = graph
            .nodes()
            .iter()
            .position(|n| n.section == BracketSection::Losers && n.next == Some(gf))
            .unwrap();

        let wb_champion = graph.node(wb_final).winner_id.unwrap();
        let lb_champion = graph.node(lb_final).winner_id.unwrap();
        assert_ne!(wb_champion, lb_champion);

        let finals = graph.node(gf);
        assert_eq!(finals.entrants.len(), 2);
        assert!(finals.has_entrant(wb_champion));
        assert!(finals.has_entrant(lb_champion));
    }

    #[test]
    fn test_double_elimination_plays_to_completion() {
        for n in [2usize, 3, 4, 6, 8] {
            let entrants = participants(n);
            let mut graph = double_elimination(&seeded_slots(&entrants)).unwrap();
            let champion = play_out(&mut graph);
            assert!(entrants.iter().any(|p| p.id == champion));
        }
    }

    #[test]
    fn test_advancement_is_idempotent() {
        let entrants = participants(4);
        let mut graph = single_elimination(&seeded_slots(&entrants)).unwrap();

        submit_result(&mut graph, 0, 1, 0).unwrap();
        let final_before = graph.node(2).entrants.len();

        // A retried advancement of the same winner must be a no-op.
        let mut dirty = BTreeSet::new();
        advance(&mut graph, 0, &mut dirty).unwrap();
        assert_eq!(graph.node(2).entrants.len(), final_before);
        assert!(dirty.is_empty());
    }

    #[test]
    fn test_reset_clears_result_and_downstream_entrant() {
        let entrants = participants(4);
        let mut graph = single_elimination(&seeded_slots(&entrants)).unwrap();

        submit_result(&mut graph, 0, 1, 0).unwrap();
        let outcome = reset_result(&mut graph, 0).unwrap();
        assert!(outcome.dirty.contains(&0));
        assert!(outcome.dirty.contains(&2));

        let node = graph.node(0);
        assert_eq!(node.state, MatchState::Scheduled);
        assert!(node.winner_id.is_none());
        assert!(node.score.is_none());
        assert!(graph.node(2).entrants.is_empty());

        // Re-scoring now succeeds.
        submit_result(&mut graph, 0, 0, 1).unwrap();
    }

    #[test]
    fn test_reset_refused_once_downstream_played() {
        let entrants = participants(4);
        let mut graph = single_elimination(&seeded_slots(&entrants)).unwrap();

        submit_result(&mut graph, 0, 1, 0).unwrap();
        submit_result(&mut graph, 1, 1, 0).unwrap();
        submit_result(&mut graph, 2, 1, 0).unwrap();

        assert!(matches!(
            reset_result(&mut graph, 0),
            Err(EngineError::Conflict(_))
        ));
    }

    #[test]
    fn test_cascade_cap_reports_partial_completion() {
        // Hand-build a corrupt graph: a six-match bye chain that all
        // claims round 1, so the layer-derived cap is exhausted before
        // the chain finishes cascading.
        let people = participants(2);
        let mut graph = BracketGraph::new();
        for i in 0..6 {
            let mut node = crate::bracket::graph::MatchNode::new(BracketSection::Winners, 1, i);
            if i < 5 {
                node.next = Some(i as usize + 1);
            }
            graph.push(node);
        }
        graph
            .node_mut(0)
            .entrants
            .push(Entrant::new(people[0].clone()));

        let result = resolve_byes(&mut graph);
        assert!(matches!(
            result,
            Err(EngineError::PartialCompletion { .. })
        ));
    }
}
