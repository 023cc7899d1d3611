//! Deck endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::db::date_utils::current_study_day;
use crate::db::{DeckRepository, SettingsRepository};
use crate::error::Result;
use crate::models::*;
use crate::routes::deck_path;
use crate::AppState;

/// GET /api/decks
pub async fn list(State(state): State<AppState>) -> Result<Json<DeckListResponse>> {
    let decks = state
        .with_repo(|repo| {
            let global = repo.get_global_settings()?;
            Ok(repo.get_all_decks(&current_study_day(global.daily_reset_hour))?)
        })
        .await?;
    Ok(Json(DeckListResponse { decks }))
}

/// GET /api/decks/{path}/note-types
pub async fn note_types(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<NoteTypeListResponse>> {
    let path = deck_path(&path)?;
    let note_types = state
        .with_repo(move |repo| Ok(repo.get_deck_note_types(&path)?))
        .await?;
    Ok(Json(NoteTypeListResponse { note_types }))
}
