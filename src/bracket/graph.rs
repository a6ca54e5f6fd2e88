//! In-memory match arena.
//!
//! A bracket is a directed acyclic graph of matches. The database models
//! it with foreign-key links (`next_match_id`, `loser_match_id`); in
//! memory the same graph is an indexed arena with `Option<NodeIndex>`
//! links, so a whole bracket can be built, validated, and progressed
//! before a single row is written. Builders append nodes so that every
//! link points to a strictly higher index, which keeps the graph acyclic
//! by construction and makes a single ascending sweep sufficient for
//! feeder-dependent computations.

use std::collections::HashMap;

use super::models::{BracketSection, MatchState, SlotStatus};
use crate::errors::{EngineError, EngineResult};
use crate::tournament::{MatchId, ParticipantId, ParticipantRef};

/// Arena index of a match node
pub type NodeIndex = usize;

/// A participant occupying one of a match's two slots
#[derive(Debug, Clone)]
pub struct Entrant {
    pub participant: ParticipantRef,
    pub status: SlotStatus,
    pub is_winner: bool,
    pub result_text: Option<String>,
}

impl Entrant {
    pub fn new(participant: ParticipantRef) -> Self {
        Self {
            participant,
            status: SlotStatus::NotPlayed,
            is_winner: false,
            result_text: None,
        }
    }
}

/// One match in the arena
#[derive(Debug, Clone)]
pub struct MatchNode {
    /// Database id, `None` until the graph is persisted
    pub id: Option<MatchId>,
    pub section: BracketSection,
    /// 1-based round within the section
    pub round: u32,
    /// 0-based position within round and section
    pub position: u32,
    pub state: MatchState,
    pub score: Option<(i32, i32)>,
    pub winner_id: Option<ParticipantId>,
    /// Where the winner advances
    pub next: Option<NodeIndex>,
    /// Double elimination: where the loser drops
    pub loser_next: Option<NodeIndex>,
    /// First-round slot index this match descends from, for UI layout
    pub position_hint: Option<i32>,
    /// 0, 1 (bye), or 2 entrants
    pub entrants: Vec<Entrant>,
}

impl MatchNode {
    pub fn new(section: BracketSection, round: u32, position: u32) -> Self {
        Self {
            id: None,
            section,
            round,
            position,
            state: MatchState::Scheduled,
            score: None,
            winner_id: None,
            next: None,
            loser_next: None,
            position_hint: None,
            entrants: Vec::with_capacity(2),
        }
    }

    pub fn has_entrant(&self, participant_id: ParticipantId) -> bool {
        self.entrants
            .iter()
            .any(|e| e.participant.id == participant_id)
    }

    /// The entrant that lost this match, if it was played with two.
    pub fn loser(&self) -> Option<&Entrant> {
        if self.entrants.len() != 2 {
            return None;
        }
        let winner_id = self.winner_id?;
        self.entrants.iter().find(|e| e.participant.id != winner_id)
    }

    /// The winning entrant, once recorded.
    pub fn winner(&self) -> Option<&Entrant> {
        let winner_id = self.winner_id?;
        self.entrants.iter().find(|e| e.participant.id == winner_id)
    }
}

/// Indexed match arena
#[derive(Debug, Clone, Default)]
pub struct BracketGraph {
    nodes: Vec<MatchNode>,
}

impl BracketGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: MatchNode) -> NodeIndex {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: NodeIndex) -> &MatchNode {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut MatchNode {
        &mut self.nodes[index]
    }

    pub fn nodes(&self) -> &[MatchNode] {
        &self.nodes
    }

    /// The single match no winner advances out of.
    pub fn terminal(&self) -> Option<NodeIndex> {
        self.nodes.iter().position(|n| n.next.is_none())
    }

    /// Arena index for a persisted match id.
    pub fn index_of(&self, match_id: MatchId) -> Option<NodeIndex> {
        self.nodes.iter().position(|n| n.id == Some(match_id))
    }

    /// Inbound links per node: which matches advance a participant here.
    ///
    /// Builders only ever link forward, so every feeder index is smaller
    /// than the fed index.
    pub fn feeder_table(&self) -> Vec<Vec<NodeIndex>> {
        let mut feeders = vec![Vec::new(); self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(target) = node.next {
                feeders[target].push(index);
            }
            if let Some(target) = node.loser_next {
                feeders[target].push(index);
            }
        }
        feeders
    }

    /// Number of distinct (section, round) layers; the bye cascade's
    /// iteration cap derives from it.
    pub fn round_total(&self) -> usize {
        let mut layers: Vec<(BracketSection, u32)> = self
            .nodes
            .iter()
            .map(|n| (n.section, n.round))
            .collect();
        layers.sort_unstable();
        layers.dedup();
        layers.len()
    }

    /// Structural validation: forward-only links, slot capacity, unique
    /// positions, and a single terminal match.
    pub fn validate(&self) -> EngineResult<()> {
        if self.nodes.is_empty() {
            return Err(EngineError::Validation("bracket has no matches".to_string()));
        }

        let mut positions: HashMap<(BracketSection, u32, u32), NodeIndex> = HashMap::new();
        let mut terminals = 0usize;

        for (index, node) in self.nodes.iter().enumerate() {
            if node.entrants.len() > 2 {
                return Err(EngineError::Validation(format!(
                    "match at round {} position {} holds more than two participants",
                    node.round, node.position
                )));
            }

            for target in [node.next, node.loser_next].into_iter().flatten() {
                if target <= index || target >= self.nodes.len() {
                    return Err(EngineError::Validation(
                        "bracket links must point to a later match".to_string(),
                    ));
                }
            }

            if node.next.is_none() {
                terminals += 1;
            }

            let key = (node.section, node.round, node.position);
            if positions.insert(key, index).is_some() {
                return Err(EngineError::Validation(format!(
                    "duplicate match position: {} round {} position {}",
                    node.section.as_str(),
                    node.round,
                    node.position
                )));
            }
        }

        if terminals != 1 {
            return Err(EngineError::Validation(format!(
                "bracket must have exactly one terminal match, found {terminals}"
            )));
        }

        Ok(())
    }
}
