//! Note import endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use matchdeck_core::parse_notes;

use crate::db::NoteRepository;
use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::deck_path;
use crate::AppState;

/// POST /api/decks/{path}/import
pub async fn import(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResponse>> {
    let deck_path = deck_path(&path)?;

    let target = deck_path.clone();
    let (imported, summary) = state
        .with_repo(move |repo| {
            let note_type = repo.get_note_type(request.note_type_id)?.ok_or_else(|| {
                ApiError::NotFound(format!("note type {}", request.note_type_id))
            })?;

            let notes = parse_notes(&request.content, &note_type.fields)?;
            let summary = repo.import_notes(&target, note_type.id, &notes)?;
            Ok((notes.len(), summary))
        })
        .await?;

    tracing::info!(
        deck = %deck_path,
        notes = imported,
        created = summary.cards_created,
        "imported notes"
    );

    Ok(Json(ImportResponse {
        deck_path,
        imported,
        summary,
    }))
}
