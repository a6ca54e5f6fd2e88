//! Playoff qualifier selection and re-seeding.
//!
//! Pure: takes the qualifiers read from finalized standings and produces
//! the slot array the bracket builder materializes.

use crate::errors::{EngineError, EngineResult};
use crate::seeding::{bracket_size_for, seed_slot};
use crate::tournament::{GroupId, ParticipantRef};

/// One standings row that qualified for the playoffs
#[derive(Debug, Clone)]
pub struct Qualifier {
    pub participant: ParticipantRef,
    pub group_id: GroupId,
    /// 1-based rank within the group
    pub rank: u32,
}

/// Seed qualifiers into a playoff slot array.
///
/// Group winners go first, in group order, at the canonical seed slots,
/// which spreads them maximally across the bracket. Each later rank is
/// then placed wave by wave with a greedy rule: take the first open slot
/// whose round-1 opponent is not a group-mate, falling back to the first
/// open slot when every alternative collides. Unfilled slots stay `None`
/// and resolve as byes.
pub fn seed_playoff_slots(qualifiers: &[Qualifier]) -> EngineResult<Vec<Option<Qualifier>>> {
    if qualifiers.len() < 2 {
        return Err(EngineError::Validation(format!(
            "playoffs need at least two qualifiers, found {}",
            qualifiers.len()
        )));
    }

    let size = bracket_size_for(qualifiers.len());
    let mut slots: Vec<Option<Qualifier>> = vec![None; size];

    let winners = qualifiers.iter().filter(|q| q.rank == 1);
    for (index, qualifier) in winners.enumerate() {
        let slot = seed_slot(index, size);
        if slots[slot].is_some() {
            return Err(EngineError::Validation(
                "more group winners than bracket slots".to_string(),
            ));
        }
        slots[slot] = Some(qualifier.clone());
    }

    let max_rank = qualifiers.iter().map(|q| q.rank).max().unwrap_or(1);
    for rank in 2..=max_rank {
        for qualifier in qualifiers.iter().filter(|q| q.rank == rank) {
            let slot = pick_slot(&slots, qualifier.group_id)?;
            slots[slot] = Some(qualifier.clone());
        }
    }

    Ok(slots)
}

/// First open slot avoiding a same-group round-1 opponent, else the
/// first open slot outright.
fn pick_slot(slots: &[Option<Qualifier>], group_id: GroupId) -> EngineResult<usize> {
    let mut fallback = None;

    for (slot, occupant) in slots.iter().enumerate() {
        if occupant.is_some() {
            continue;
        }
        if fallback.is_none() {
            fallback = Some(slot);
        }
        // Round 1 pairs adjacent slots; the opponent is the slot with
        // the low bit flipped.
        let collides = slots[slot ^ 1]
            .as_ref()
            .is_some_and(|opponent| opponent.group_id == group_id);
        if !collides {
            return Ok(slot);
        }
    }

    fallback.ok_or_else(|| {
        EngineError::Validation("no open slot left for a qualifier".to_string())
    })
}
