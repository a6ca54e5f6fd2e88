//! Round-robin group stage: scheduling, results, and standings.
//!
//! Groups are drawn with a snake draft over the seed order, fixtures
//! come from the circle method, and the standings calculator keeps each
//! group's table ranked as results arrive. Finalized tables feed the
//! [`crate::playoffs`] qualifier.

pub mod manager;
pub mod models;
pub mod scheduler;
pub mod standings;

pub use manager::GroupManager;
pub use models::{Fixture, FixtureStatus, Group, GroupMembership, GroupStandings, Standing};
pub use scheduler::{round_robin_pairings, snake_groups};
pub use standings::{apply_fixture_result, rank, PointsRule};
