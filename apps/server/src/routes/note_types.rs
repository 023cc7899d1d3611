//! Note type endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::db::NoteRepository;
use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/note-types
pub async fn list(State(state): State<AppState>) -> Result<Json<NoteTypeListResponse>> {
    let note_types = state
        .with_repo(|repo| Ok(repo.list_note_types()?))
        .await?;
    Ok(Json(NoteTypeListResponse { note_types }))
}

/// POST /api/note-types
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateNoteTypeRequest>,
) -> Result<(StatusCode, Json<NoteType>)> {
    let note_type = state
        .with_repo(move |repo| Ok(repo.create_note_type(&request.name, &request.fields)?))
        .await?;
    tracing::info!(id = note_type.id, name = %note_type.name, "created note type");
    Ok((StatusCode::CREATED, Json(note_type)))
}

/// GET /api/note-types/{id}/fields
pub async fn fields(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NoteTypeFieldsResponse>> {
    let note_type = state
        .with_repo(move |repo| {
            repo.get_note_type(id)?
                .ok_or_else(|| ApiError::NotFound(format!("note type {id}")))
        })
        .await?;

    Ok(Json(NoteTypeFieldsResponse {
        id: note_type.id,
        name: note_type.name,
        fields: note_type.fields,
    }))
}
