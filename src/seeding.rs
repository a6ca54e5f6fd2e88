//! Seed-rank to bracket-slot mapping.
//!
//! Pure integer math, no persisted state. The mapping controls initial
//! bracket placement so that strong seeds meet as late as possible: seed
//! 0 and seed 1 land in opposite halves, seeds 0..4 in distinct quarters,
//! and in general seeds 0..2^m land in distinct blocks of size
//! `bracket_size / 2^m`.

/// Map a seed rank to its first-round slot index in a power-of-two
/// bracket.
///
/// Seed 0 takes slot 0 and seed 1 takes the last slot; from there the
/// problem halves recursively: even ranks stay in the top half, odd
/// ranks reflect into the bottom half.
///
/// # Panics
///
/// Panics if `bracket_size` is not a power of two or `seed` is out of
/// range. Callers always derive both from the same participant list, so
/// a violation is a programming error rather than bad input.
pub fn seed_slot(seed: usize, bracket_size: usize) -> usize {
    assert!(
        bracket_size.is_power_of_two(),
        "bracket size must be a power of two"
    );
    assert!(seed < bracket_size, "seed rank out of range");

    if seed == 0 {
        return 0;
    }
    if seed % 2 == 1 {
        (bracket_size - 1) - seed_slot(seed / 2, bracket_size / 2)
    } else {
        seed_slot(seed / 2, bracket_size / 2)
    }
}

/// Canonical slot for every seed rank, in rank order.
pub fn slot_order(bracket_size: usize) -> Vec<usize> {
    (0..bracket_size)
        .map(|seed| seed_slot(seed, bracket_size))
        .collect()
}

/// Smallest power of two that fits `n` entrants (minimum 2).
pub fn bracket_size_for(n: usize) -> usize {
    n.max(2).next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_anchor_seeds() {
        for k in 1..=8 {
            let size = 1 << k;
            assert_eq!(seed_slot(0, size), 0);
            assert_eq!(seed_slot(1, size), size - 1);
        }
    }

    #[test]
    fn test_known_order_for_eight() {
        assert_eq!(slot_order(8), vec![0, 7, 3, 4, 1, 6, 2, 5]);
    }

    #[test]
    fn test_known_order_for_four() {
        assert_eq!(slot_order(4), vec![0, 3, 1, 2]);
    }

    #[test]
    fn test_bracket_size_for() {
        assert_eq!(bracket_size_for(2), 2);
        assert_eq!(bracket_size_for(3), 4);
        assert_eq!(bracket_size_for(5), 8);
        assert_eq!(bracket_size_for(8), 8);
        assert_eq!(bracket_size_for(9), 16);
        assert_eq!(bracket_size_for(1), 2);
    }

    proptest! {
        #[test]
        fn prop_slots_are_a_bijection(k in 1usize..=8) {
            let size = 1 << k;
            let slots: HashSet<usize> = slot_order(size).into_iter().collect();
            prop_assert_eq!(slots.len(), size);
            prop_assert!(slots.iter().all(|&s| s < size));
        }

        #[test]
        fn prop_top_seeds_occupy_distinct_blocks(k in 1usize..=8, m in 1usize..=8) {
            // Seeds 0..2^m must land in 2^m distinct blocks of size
            // size / 2^m, which is exactly "cannot meet before the last
            // m rounds".
            let m = m.min(k);
            let size = 1usize << k;
            let block = size >> m;
            let blocks: HashSet<usize> = (0..(1 << m))
                .map(|seed| seed_slot(seed, size) / block)
                .collect();
            prop_assert_eq!(blocks.len(), 1 << m);
        }

        #[test]
        fn prop_first_round_opponent_is_always_weaker_half(k in 2usize..=8) {
            // The slot paired with seed 0 in round 1 (slot 1) belongs to
            // a seed from the bottom half of the rank list.
            let size = 1 << k;
            let order = slot_order(size);
            let opponent_seed = order.iter().position(|&s| s == 1).unwrap();
            prop_assert!(opponent_seed >= size / 2);
        }
    }
}
