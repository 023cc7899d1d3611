//! Card endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::db::{CardRepository, StateRepository};
use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/cards/{id}/state
pub async fn get_state(
    State(state): State<AppState>,
    Path(card_id): Path<i64>,
) -> Result<Json<CardStateResponse>> {
    let card_state = state
        .with_repo(move |repo| {
            if repo.get_card(card_id)?.is_none() {
                return Err(ApiError::NotFound(format!("card {card_id}")));
            }
            Ok(repo.get_card_state(card_id)?.unwrap_or_default())
        })
        .await?;

    Ok(Json(CardStateResponse {
        card_id,
        state: card_state,
    }))
}
