//! Settings endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::db::SettingsRepository;
use crate::error::Result;
use crate::models::*;
use crate::routes::deck_path;
use crate::AppState;

/// GET /api/settings
pub async fn get_all(State(state): State<AppState>) -> Result<Json<AllSettingsResponse>> {
    let response = state
        .with_repo(|repo| {
            let global = repo.get_global_settings()?;
            let decks = repo
                .get_all_deck_settings()?
                .into_iter()
                .map(|s| (s.deck_path.clone(), s))
                .collect();
            Ok(AllSettingsResponse { global, decks })
        })
        .await?;

    Ok(Json(response))
}

/// PUT /api/settings/global
pub async fn update_global(
    State(state): State<AppState>,
    Json(request): Json<UpdateGlobalSettingsRequest>,
) -> Result<Json<GlobalSettings>> {
    let settings = state
        .with_repo(move |repo| {
            let mut current = repo.get_global_settings()?;

            if let Some(new_cards_per_day) = request.new_cards_per_day {
                current.new_cards_per_day = new_cards_per_day;
            }
            if let Some(reviews_per_day) = request.reviews_per_day {
                current.reviews_per_day = reviews_per_day;
            }
            if let Some(daily_reset_hour) = request.daily_reset_hour {
                current.daily_reset_hour = daily_reset_hour;
            }
            if let Some(learning_steps) = request.learning_steps {
                current.learning_steps = learning_steps;
            }

            repo.save_global_settings(&current)?;
            Ok(current)
        })
        .await?;

    Ok(Json(settings))
}

/// PUT /api/settings/deck/{path}
pub async fn update_deck(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Json(request): Json<UpdateDeckSettingsRequest>,
) -> Result<Json<DeckSettings>> {
    // None values clear the override
    let settings = DeckSettings {
        deck_path: deck_path(&path)?,
        new_cards_per_day: request.new_cards_per_day,
        reviews_per_day: request.reviews_per_day,
    };

    let saved = settings.clone();
    state
        .with_repo(move |repo| Ok(repo.save_deck_settings(&saved)?))
        .await?;
    Ok(Json(settings))
}

/// DELETE /api/settings/deck/{path}
pub async fn delete_deck(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let path = deck_path(&path)?;
    let deleted = state
        .with_repo(move |repo| Ok(repo.delete_deck_settings(&path)?))
        .await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
