//! Matching session endpoints

use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use matchdeck_core::{MatchSession, TileKind};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::deck_path;
use crate::services::grading;
use crate::services::selection::{build_pool, PoolRequest};
use crate::services::sessions::SessionEntry;
use crate::AppState;

fn session_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("match session {id}"))
}

fn to_response(id: Uuid, entry: &SessionEntry, events: Vec<TickEvent>) -> MatchResponse {
    let selection = &entry.selection;
    let view = entry.engine.view();

    MatchResponse {
        id,
        deck_path: entry.deck_path.clone(),
        selection: SelectionSummary {
            mode: entry.mode,
            learn: selection.learn_count,
            review: selection.review_count,
            new: selection.new_count,
            pairs: entry.engine.pair_count(),
        },
        view,
        events,
        update_stats: entry.engine.config().update_stats,
        graded: entry.graded,
        write_back_error: entry.last_error.clone(),
    }
}

/// POST /api/matches
pub async fn start(
    State(state): State<AppState>,
    Json(request): Json<StartMatchRequest>,
) -> Result<(StatusCode, Json<MatchResponse>)> {
    request.config.validate()?;
    let deck_path = deck_path(&request.deck_path)?;

    let pool_request = PoolRequest {
        deck_path: deck_path.clone(),
        note_type_id: request.note_type_id,
        vocab_field: request.vocab_field,
        meaning_field: request.meaning_field,
        audio_field: request.audio_field,
        mode: request.mode,
    };
    let pool = state
        .with_repo(move |repo| {
            build_pool(repo, &pool_request, &Local::now(), &mut rand::rng())
        })
        .await?;

    let engine = MatchSession::new(pool.pairs, request.config)?;
    let entry = SessionEntry::new(
        engine,
        deck_path.clone(),
        request.mode,
        pool.selection,
        Instant::now(),
    );
    let id = state.sessions.insert(entry);
    tracing::info!(%id, deck = %deck_path, "started match session");

    let response = state
        .sessions
        .with_session(id, Instant::now(), |entry, events| {
            to_response(id, entry, events)
        })
        .ok_or_else(|| session_not_found(id))?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/matches/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>> {
    state
        .sessions
        .with_session(id, Instant::now(), |entry, events| {
            to_response(id, entry, events)
        })
        .map(Json)
        .ok_or_else(|| session_not_found(id))
}

/// POST /api/matches/{id}/vocab/{tile}
pub async fn select_vocab(
    State(state): State<AppState>,
    Path((id, tile)): Path<(Uuid, usize)>,
) -> Result<Json<SelectResponse>> {
    select(&state, id, TileKind::Vocab, tile)
}

/// POST /api/matches/{id}/meaning/{tile}
pub async fn select_meaning(
    State(state): State<AppState>,
    Path((id, tile)): Path<(Uuid, usize)>,
) -> Result<Json<SelectResponse>> {
    select(&state, id, TileKind::Meaning, tile)
}

fn select(state: &AppState, id: Uuid, kind: TileKind, tile: usize) -> Result<Json<SelectResponse>> {
    let (result, session) = state
        .sessions
        .with_session(id, Instant::now(), |entry, events| {
            let outcome = match kind {
                TileKind::Vocab => entry.engine.select_vocab(tile),
                TileKind::Meaning => entry.engine.select_meaning(tile),
            }?;
            Ok::<_, ApiError>((outcome, to_response(id, entry, events)))
        })
        .ok_or_else(|| session_not_found(id))??;

    if let SelectOutcome::Correct(hit) = &result {
        if let Some(rating) = hit.grade {
            grading::spawn_write_back(
                state.repository.clone(),
                state.sessions.clone(),
                id,
                hit.card_id,
                rating,
            );
        }
    }

    Ok(Json(SelectResponse { result, session }))
}

/// POST /api/matches/{id}/next
pub async fn next_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NextPageResponse>> {
    let (change, session) = state
        .sessions
        .with_session(id, Instant::now(), |entry, events| {
            let change = entry.engine.next_page()?;
            Ok::<_, ApiError>((change, to_response(id, entry, events)))
        })
        .ok_or_else(|| session_not_found(id))??;

    if change == PageChange::Finished {
        let score = session.view.score;
        tracing::info!(%id, correct = score.correct, wrong = score.wrong, "match session finished");
    }

    Ok(Json(NextPageResponse { change, session }))
}

/// DELETE /api/matches/{id}
pub async fn end(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    if !state.sessions.remove(id) {
        return Err(session_not_found(id));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
