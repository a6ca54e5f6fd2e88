//! Read/write glue against the externally owned catalog tables.
//!
//! The catalog and registration subsystems own `tournaments` and
//! `tournament_entries`; everything here either reads them or applies the
//! one write the engine is allowed: a status transition. All functions
//! run on the caller's transaction so the write joins the caller's atomic
//! unit.

use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};

use super::models::{
    BracketKind, EngineSettings, Participation, ParticipantRef, SourceKind, TournamentId,
    TournamentMeta, TournamentStatus,
};
use crate::errors::{EngineError, EngineResult};

const META_COLUMNS: &str = "id, name, kind, participation, max_participants, status, settings";

fn meta_from_row(row: &PgRow) -> EngineResult<TournamentMeta> {
    let kind_str: String = row.get("kind");
    let kind = BracketKind::parse(&kind_str)
        .ok_or_else(|| EngineError::Validation(format!("unknown bracket kind: {kind_str}")))?;

    let status_str: String = row.get("status");
    let status = TournamentStatus::parse(&status_str)
        .ok_or_else(|| EngineError::Validation(format!("unknown tournament status: {status_str}")))?;

    let participation_str: String = row.get("participation");
    let participation = Participation::parse(&participation_str).ok_or_else(|| {
        EngineError::Validation(format!("unknown participation type: {participation_str}"))
    })?;

    let settings = match row.get::<Option<serde_json::Value>, _>("settings") {
        Some(value) => serde_json::from_value(value)?,
        None => EngineSettings::default(),
    };

    Ok(TournamentMeta {
        id: row.get("id"),
        name: row.get("name"),
        kind,
        participation,
        max_participants: row.get("max_participants"),
        status,
        settings,
    })
}

/// Fetch tournament metadata without locking (read models).
pub(crate) async fn fetch_meta(
    tx: &mut Transaction<'_, Postgres>,
    tournament_id: TournamentId,
) -> EngineResult<TournamentMeta> {
    let row = sqlx::query(&format!(
        "SELECT {META_COLUMNS} FROM tournaments WHERE id = $1"
    ))
    .bind(tournament_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(EngineError::TournamentNotFound(tournament_id))?;

    meta_from_row(&row)
}

/// Fetch tournament metadata, taking a row lock for the remainder of the
/// transaction. The lock is the per-tournament mutual exclusion point:
/// every mutating engine operation acquires it first, so two concurrent
/// calls on the same tournament serialize here.
pub(crate) async fn fetch_meta_for_update(
    tx: &mut Transaction<'_, Postgres>,
    tournament_id: TournamentId,
) -> EngineResult<TournamentMeta> {
    let row = sqlx::query(&format!(
        "SELECT {META_COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE"
    ))
    .bind(tournament_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(EngineError::TournamentNotFound(tournament_id))?;

    meta_from_row(&row)
}

/// Accepted participants in seed order.
pub(crate) async fn accepted_participants(
    tx: &mut Transaction<'_, Postgres>,
    tournament_id: TournamentId,
) -> EngineResult<Vec<ParticipantRef>> {
    let rows = sqlx::query(
        r#"
        SELECT participant_id, display_name, picture_ref, source_kind
        FROM tournament_entries
        WHERE tournament_id = $1 AND accepted
        ORDER BY seed, participant_id
        "#,
    )
    .bind(tournament_id)
    .fetch_all(&mut **tx)
    .await?;

    let mut participants = Vec::with_capacity(rows.len());
    for row in rows {
        let source_str: String = row.get("source_kind");
        let source_kind = SourceKind::parse(&source_str)
            .ok_or_else(|| EngineError::Validation(format!("unknown source kind: {source_str}")))?;

        participants.push(ParticipantRef {
            id: row.get("participant_id"),
            display_name: row.get("display_name"),
            picture_ref: row.get("picture_ref"),
            source_kind,
        });
    }

    Ok(participants)
}

/// Transition the tournament status. Visible to the catalog as the only
/// side effect the engine has on its rows.
pub(crate) async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    tournament_id: TournamentId,
    status: TournamentStatus,
) -> EngineResult<()> {
    sqlx::query("UPDATE tournaments SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(tournament_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
