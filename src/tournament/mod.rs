//! Tournament metadata, participants, and catalog glue.
//!
//! The tournament catalog and the registration subsystem are external
//! collaborators: they own tournament rows and the accepted-participant
//! list. This module holds the read-side models the engine consumes and
//! the status-transition write it exposes back.

pub(crate) mod catalog;
pub mod models;

pub use models::{
    BracketKind, EngineSettings, FixtureId, GroupId, MatchId, ParticipantId, ParticipantRef,
    Participation, SourceKind, TournamentId, TournamentMeta, TournamentStatus,
};
