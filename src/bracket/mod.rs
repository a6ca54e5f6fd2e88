//! Elimination bracket construction, persistence, and read model.
//!
//! A bracket is built as a pure in-memory match arena ([`BracketGraph`]),
//! validated, and only then written to storage in a single transaction.
//! The same arena shape is what the progression engine mutates when
//! results arrive.
//!
//! ## Example
//!
//! ```
//! use matchpoint::bracket::{seeded_slots, single_elimination};
//! use matchpoint::tournament::{ParticipantRef, SourceKind};
//! use uuid::Uuid;
//!
//! let entrants: Vec<ParticipantRef> = (0..5)
//!     .map(|i| ParticipantRef {
//!         id: Uuid::new_v4(),
//!         display_name: format!("player-{i}"),
//!         picture_ref: None,
//!         source_kind: SourceKind::Player,
//!     })
//!     .collect();
//!
//! let graph = single_elimination(&seeded_slots(&entrants)).unwrap();
//! assert_eq!(graph.len(), 7); // bracket size 8 -> 7 matches
//! ```

pub mod builder;
pub mod graph;
pub mod manager;
pub mod models;
pub(crate) mod store;

pub use builder::{double_elimination, seeded_slots, single_elimination};
pub use graph::{BracketGraph, Entrant, MatchNode, NodeIndex};
pub use manager::BracketManager;
pub use models::{
    BracketSection, BracketSummary, BracketView, EntrantView, MatchState, MatchView, RoundView,
    SectionView, SlotStatus,
};
