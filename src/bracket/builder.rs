//! Elimination bracket construction.
//!
//! Builders take a seeded slot array (power-of-two length, `None` for
//! byes) and return a validated in-memory [`BracketGraph`]. Persistence
//! happens elsewhere; everything here is pure.

use super::graph::{BracketGraph, Entrant, MatchNode};
use super::models::BracketSection;
use crate::errors::{EngineError, EngineResult};
use crate::seeding::{bracket_size_for, seed_slot};
use crate::tournament::ParticipantRef;

/// Seed an ordered participant list into a canonical slot array.
///
/// The list order is the seed order; slot indices come from the seeding
/// function, so unfilled slots (byes) end up adjacent to the strongest
/// seeds.
pub fn seeded_slots(participants: &[ParticipantRef]) -> Vec<Option<ParticipantRef>> {
    let size = bracket_size_for(participants.len());
    let mut slots: Vec<Option<ParticipantRef>> = vec![None; size];
    for (seed, participant) in participants.iter().enumerate() {
        slots[seed_slot(seed, size)] = Some(participant.clone());
    }
    slots
}

fn check_slots(slots: &[Option<ParticipantRef>]) -> EngineResult<(usize, u32)> {
    let size = slots.len();
    if size < 2 || !size.is_power_of_two() {
        return Err(EngineError::Validation(format!(
            "slot array length must be a power of two >= 2, got {size}"
        )));
    }
    let filled = slots.iter().flatten().count();
    if filled < 2 {
        return Err(EngineError::Validation(
            "at least two participants are required to build a bracket".to_string(),
        ));
    }
    Ok((size, size.trailing_zeros()))
}

fn fill_round_one(node: &mut MatchNode, slots: &[Option<ParticipantRef>], position: usize) {
    node.position_hint = Some((2 * position) as i32);
    for slot in [2 * position, 2 * position + 1] {
        if let Some(participant) = &slots[slot] {
            node.entrants.push(Entrant::new(participant.clone()));
        }
    }
}

/// Build a single-elimination bracket.
///
/// `bracket_size - 1` matches across `log2(bracket_size)` rounds; the
/// winner of round `r` position `p` advances to round `r + 1` position
/// `p / 2`, and the final is the single terminal match.
pub fn single_elimination(slots: &[Option<ParticipantRef>]) -> EngineResult<BracketGraph> {
    let (size, rounds) = check_slots(slots)?;
    let mut graph = BracketGraph::new();

    let mut offsets = Vec::with_capacity(rounds as usize);
    let mut next_offset = 0usize;
    for round in 1..=rounds {
        offsets.push(next_offset);
        next_offset += size >> round;
    }

    for round in 1..=rounds {
        let count = size >> round;
        for position in 0..count {
            let mut node = MatchNode::new(BracketSection::Winners, round, position as u32);
            if round < rounds {
                node.next = Some(offsets[round as usize] + position / 2);
            }
            if round == 1 {
                fill_round_one(&mut node, slots, position);
            }
            graph.push(node);
        }
    }

    graph.validate()?;
    Ok(graph)
}

/// Matches in losers-bracket round `l` for a winners bracket of `size`.
///
/// Losers rounds come in pairs: a minor round that absorbs a fresh wave
/// of winners-bracket losers, then a major round that consolidates. The
/// sizes run size/4, size/4, size/8, size/8, ... down to 1, 1.
fn losers_round_size(size: usize, round: u32) -> usize {
    size >> (((round + 1) / 2) + 1)
}

/// Build a double-elimination bracket.
///
/// On top of the winners bracket this adds the losers bracket and a
/// grand-finals match fed by both section champions. Every winners
/// match's loser link is fixed at build time: round 1 losers pair up in
/// losers round 1 (one match per two winners matches), and each later
/// winners round drops its losers into the corresponding minor losers
/// round. With only two entrants the losers bracket is empty and the
/// winners final's loser drops straight into grand finals.
pub fn double_elimination(slots: &[Option<ParticipantRef>]) -> EngineResult<BracketGraph> {
    let (size, wb_rounds) = check_slots(slots)?;
    let mut graph = BracketGraph::new();

    let mut wb_offsets = Vec::with_capacity(wb_rounds as usize);
    let mut next_offset = 0usize;
    for round in 1..=wb_rounds {
        wb_offsets.push(next_offset);
        next_offset += size >> round;
    }

    let lb_rounds = if wb_rounds >= 2 { 2 * (wb_rounds - 1) } else { 0 };
    let mut lb_offsets = Vec::with_capacity(lb_rounds as usize);
    for round in 1..=lb_rounds {
        lb_offsets.push(next_offset);
        next_offset += losers_round_size(size, round);
    }

    let grand_finals = next_offset;

    for round in 1..=wb_rounds {
        let count = size >> round;
        for position in 0..count {
            let mut node = MatchNode::new(BracketSection::Winners, round, position as u32);
            node.next = if round < wb_rounds {
                Some(wb_offsets[round as usize] + position / 2)
            } else {
                Some(grand_finals)
            };
            node.loser_next = Some(if lb_rounds == 0 {
                grand_finals
            } else if round == 1 {
                lb_offsets[0] + position / 2
            } else {
                lb_offsets[(2 * (round - 1) - 1) as usize] + position
            });
            if round == 1 {
                fill_round_one(&mut node, slots, position);
            }
            graph.push(node);
        }
    }

    for round in 1..=lb_rounds {
        let count = losers_round_size(size, round);
        for position in 0..count {
            let mut node = MatchNode::new(BracketSection::Losers, round, position as u32);
            node.next = if round < lb_rounds {
                // Odd rounds keep their size into the next round; even
                // (minor) rounds halve into the next major round.
                let target = if round % 2 == 1 { position } else { position / 2 };
                Some(lb_offsets[round as usize] + target)
            } else {
                Some(grand_finals)
            };
            graph.push(node);
        }
    }

    graph.push(MatchNode::new(BracketSection::GrandFinals, 1, 0));

    graph.validate()?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::models::MatchState;
    use crate::tournament::SourceKind;
    use proptest::prelude::*;
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
    fn test_seeded_slots_places_top_seeds_apart() {
        let entrants = participants(8);
        let slots = seeded_slots(&entrants);
        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0].as_ref().map(|p| p.id), Some(entrants[0].id));
        assert_eq!(slots[7].as_ref().map(|p| p.id), Some(entrants[1].id));
    }

    #[test]
    fn test_seeded_slots_pads_to_power_of_two() {
        let entrants = participants(5);
        let slots = seeded_slots(&entrants);
        assert_eq!(slots.len(), 8);
        assert_eq!(slots.iter().flatten().count(), 5);
    }

    #[test]
    fn test_single_elimination_shape() {
        let entrants = participants(8);
        let graph = single_elimination(&seeded_slots(&entrants)).unwrap();

        assert_eq!(graph.len(), 7);
        assert_eq!(graph.terminal(), Some(6));
        let round_counts: Vec<usize> = (1..=3)
            .map(|r| graph.nodes().iter().filter(|n| n.round == r).count())
            .collect();
        assert_eq!(round_counts, vec![4, 2, 1]);
    }

    #[test]
    fn test_single_elimination_five_entrants_has_three_byes() {
        let entrants = participants(5);
        let graph = single_elimination(&seeded_slots(&entrants)).unwrap();

        let round_one: Vec<_> = graph.nodes().iter().filter(|n| n.round == 1).collect();
        assert_eq!(round_one.len(), 4);

        let with_two = round_one.iter().filter(|n| n.entrants.len() == 2).count();
        let with_fewer = round_one.iter().filter(|n| n.entrants.len() < 2).count();
        assert_eq!(with_two, 1);
        assert_eq!(with_fewer, 3);
    }

    #[test]
    fn test_single_elimination_rejects_single_entrant() {
        let entrants = participants(1);
        let slots = seeded_slots(&entrants);
        assert!(matches!(
            single_elimination(&slots),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_double_elimination_shape_for_eight() {
        let entrants = participants(8);
        let graph = double_elimination(&seeded_slots(&entrants)).unwrap();

        // 7 winners + 6 losers + grand finals
        assert_eq!(graph.len(), 14);

        let losers_counts: Vec<usize> = (1..=4)
            .map(|r| {
                graph
                    .nodes()
                    .iter()
                    .filter(|n| n.section == BracketSection::Losers && n.round == r)
                    .count()
            })
            .collect();
        assert_eq!(losers_counts, vec![2, 2, 1, 1]);

        let finals = graph
            .nodes()
            .iter()
            .filter(|n| n.section == BracketSection::GrandFinals)
            .count();
        assert_eq!(finals, 1);
    }

    #[test]
    fn test_double_elimination_every_winners_match_has_loser_link() {
        let entrants = participants(8);
        let graph = double_elimination(&seeded_slots(&entrants)).unwrap();

        for node in graph.nodes() {
            match node.section {
                BracketSection::Winners => {
                    let target = node.loser_next.expect("winners match must drop its loser");
                    assert_ne!(graph.node(target).section, BracketSection::Winners);
                }
                BracketSection::Losers => assert!(node.loser_next.is_none()),
                BracketSection::GrandFinals => {
                    assert!(node.next.is_none());
                    assert!(node.loser_next.is_none());
                }
            }
        }
    }

    #[test]
    fn test_double_elimination_two_entrants_skips_losers_bracket() {
        let entrants = participants(2);
        let graph = double_elimination(&seeded_slots(&entrants)).unwrap();

        assert_eq!(graph.len(), 2);
        let wb_final = graph.node(0);
        assert_eq!(wb_final.next, Some(1));
        assert_eq!(wb_final.loser_next, Some(1));
    }

    proptest! {
        #[test]
        fn prop_single_elimination_match_count(n in 2usize..=64) {
            let entrants = participants(n);
            let graph = single_elimination(&seeded_slots(&entrants)).unwrap();
            let size = n.next_power_of_two();
            prop_assert_eq!(graph.len(), size - 1);
            prop_assert_eq!(
                graph.nodes().iter().filter(|m| m.round == 1).count(),
                size / 2
            );
        }

        #[test]
        fn prop_single_elimination_links_form_one_tree(n in 2usize..=64) {
            let entrants = participants(n);
            let graph = single_elimination(&seeded_slots(&entrants)).unwrap();

            // Every non-terminal node reaches the terminal by following
            // next links.
            let terminal = graph.terminal().unwrap();
            for start in 0..graph.len() {
                let mut cursor = start;
                let mut hops = 0;
                while let Some(next) = graph.node(cursor).next {
                    cursor = next;
                    hops += 1;
                    prop_assert!(hops <= graph.len());
                }
                prop_assert_eq!(cursor, terminal);
            }
        }

        #[test]
        fn prop_double_elimination_match_count(n in 2usize..=64) {
            let entrants = participants(n);
            let graph = double_elimination(&seeded_slots(&entrants)).unwrap();
            let size = n.next_power_of_two();
            // 2 * size - 2 total: size - 1 winners, size - 2 losers,
            // plus grand finals.
            prop_assert_eq!(graph.len(), 2 * size - 2);
            prop_assert!(graph.nodes().iter().all(|m| m.state == MatchState::Scheduled));
        }
    }
}
