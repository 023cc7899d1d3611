//! Common test utilities and fixtures for integration tests.
//!
//! Every context gets its own in-memory SQLite database, so tests run in
//! parallel without cleanup.

#![allow(dead_code)]

pub mod fixtures;

use std::time::Duration;

use axum::Router;
use axum_test::TestServer;
use serde_json::Value;

use matchdeck_server::db::SqliteRepository;
use matchdeck_server::{router, AppState};

/// Test context holding the application state behind the router.
pub struct TestContext {
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        let repository =
            SqliteRepository::open_in_memory().expect("Failed to open in-memory database");
        Self {
            state: AppState::new(repository),
        }
    }

    /// Context whose matching sessions expire after `idle_timeout`.
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        let repository =
            SqliteRepository::open_in_memory().expect("Failed to open in-memory database");
        Self {
            state: AppState::with_idle_timeout(repository, idle_timeout),
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).expect("Failed to start test server")
    }
}

/// Create the vocab note type and return its ID.
pub async fn create_vocab_note_type(server: &TestServer) -> i64 {
    let response = server
        .post("/api/note-types")
        .json(&fixtures::vocab_note_type_request())
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().unwrap()
}

/// Create the vocab note type and import `count` notes into `deck`.
pub async fn seed_deck(server: &TestServer, deck: &str, count: usize) -> i64 {
    let note_type_id = create_vocab_note_type(server).await;
    import_into(server, deck, note_type_id, &fixtures::sample_notes(count, 1)).await;
    note_type_id
}

pub async fn import_into(server: &TestServer, deck: &str, note_type_id: i64, content: &str) {
    let response = server
        .post(&format!("/api/decks/{}/import", fixtures::encode_path(deck)))
        .json(&fixtures::import_request(note_type_id, content))
        .await;
    response.assert_status_ok();
}

/// ID of the tile showing `text` on the current page.
pub fn tile_id(session: &Value, kind: &str, text: &str) -> u64 {
    session["page"][kind]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["text"] == text)
        .unwrap_or_else(|| panic!("no {kind} tile with text {text}"))["id"]
        .as_u64()
        .unwrap()
}
