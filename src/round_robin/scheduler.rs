//! Fixture scheduling: circle-method rounds and snake group assignment.
//!
//! Both routines are pure and operate on indices; the manager maps
//! indices back to participants when it materializes rows.

/// All-pairs fixture rounds for `count` participants via the circle
/// method.
///
/// Index 0 is the fixed anchor; the remaining entries form a ring that
/// rotates one position after each round, the entry leaving the tail
/// moving to the head. An odd `count` is padded with a virtual bye
/// entry whose pairings are omitted, so every round has at most
/// `count / 2` fixtures and every unordered pair of real participants
/// appears in exactly one round.
pub fn round_robin_pairings(count: usize) -> Vec<Vec<(usize, usize)>> {
    if count < 2 {
        return Vec::new();
    }

    let padded = if count % 2 == 1 { count + 1 } else { count };
    let mut ring: Vec<usize> = (1..padded).collect();
    let mut rounds = Vec::with_capacity(padded - 1);

    for _ in 0..padded - 1 {
        let mut pairs = Vec::with_capacity(padded / 2);

        let seats: Vec<usize> = std::iter::once(0).chain(ring.iter().copied()).collect();
        for i in 0..padded / 2 {
            let home = seats[i];
            let away = seats[padded - 1 - i];
            // Indices >= count are the virtual bye.
            if home < count && away < count {
                pairs.push((home, away));
            }
        }

        rounds.push(pairs);

        if let Some(tail) = ring.pop() {
            ring.insert(0, tail);
        }
    }

    rounds
}

/// Distribute seeds across `group_count` groups with a snake draft.
///
/// Wave k hands out one participant per group, alternating direction
/// (0, 1, ..., G-1, G-1, ..., 1, 0, 0, 1, ...) so total seed strength
/// stays balanced. Returns, per group, the indices of its members in
/// seed order.
pub fn snake_groups(count: usize, group_count: usize) -> Vec<Vec<usize>> {
    let mut groups = vec![Vec::new(); group_count.max(1)];
    let g = groups.len();

    for index in 0..count {
        let wave = index / g;
        let offset = index % g;
        let target = if wave % 2 == 0 { offset } else { g - 1 - offset };
        groups[target].push(index);
    }

    groups
}
