//! Note type, import, deck and card API tests.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::fixtures;
use common::TestContext;

/// Health check responds without touching the database.
#[tokio::test]
async fn test_health() {
    let server = TestContext::new().server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

/// Test creating and listing note types.
#[tokio::test]
async fn test_create_note_type() {
    let server = TestContext::new().server();
    let id = common::create_vocab_note_type(&server).await;

    let response = server.get(&format!("/api/note-types/{id}/fields")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "Vocab");
    assert_eq!(body["fields"], json!(["Word", "Meaning", "Audio"]));

    let response = server.get("/api/note-types").await;
    let body: Value = response.json();
    assert_eq!(body["note_types"].as_array().unwrap().len(), 1);
}

/// Test duplicate note type names are a conflict.
#[tokio::test]
async fn test_duplicate_note_type() {
    let server = TestContext::new().server();
    common::create_vocab_note_type(&server).await;

    let response = server
        .post("/api/note-types")
        .json(&fixtures::vocab_note_type_request())
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "conflict");
}

/// Test fields of an unknown note type.
#[tokio::test]
async fn test_unknown_note_type_fields() {
    let server = TestContext::new().server();
    let response = server.get("/api/note-types/42/fields").await;
    response.assert_status_not_found();
}

/// Test importing notes creates one card per note.
#[tokio::test]
async fn test_import_notes() {
    let server = TestContext::new().server();
    let note_type_id = common::create_vocab_note_type(&server).await;

    let response = server
        .post("/api/decks/spanish/import")
        .json(&fixtures::import_request(
            note_type_id,
            &fixtures::sample_notes(4, 1),
        ))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["deck_path"], "spanish");
    assert_eq!(body["imported"], 4);
    assert_eq!(body["cards_created"], 4);
    assert_eq!(body["note_ids"].as_array().unwrap().len(), 4);
}

/// Test re-importing notes with IDs updates them instead of adding cards.
#[tokio::test]
async fn test_reimport_with_ids() {
    let server = TestContext::new().server();
    let note_type_id = common::create_vocab_note_type(&server).await;
    let content = "ID: 10\nWord: gato\nMeaning: cat\n\nID: 11\nWord: perro\nMeaning: dog";

    common::import_into(&server, "spanish", note_type_id, content).await;
    let response = server
        .post("/api/decks/spanish/import")
        .json(&fixtures::import_request(note_type_id, content))
        .await;

    let body: Value = response.json();
    assert_eq!(body["cards_created"], 0);
    assert_eq!(body["cards_updated"], 2);
    assert_eq!(body["note_ids"], json!([10, 11]));
}

/// Test malformed import content is rejected with its line number.
#[tokio::test]
async fn test_import_parse_error() {
    let server = TestContext::new().server();
    let note_type_id = common::create_vocab_note_type(&server).await;

    let response = server
        .post("/api/decks/spanish/import")
        .json(&fixtures::import_request(note_type_id, "ID: x\nWord: gato"))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "parse_error");
    assert!(body["message"].as_str().unwrap().contains("line 1"));
}

/// Test importing with an unknown note type.
#[tokio::test]
async fn test_import_unknown_note_type() {
    let server = TestContext::new().server();
    let response = server
        .post("/api/decks/spanish/import")
        .json(&fixtures::import_request(99, "Word: gato"))
        .await;
    response.assert_status_not_found();
}

/// Test list decks is empty for a new collection.
#[tokio::test]
async fn test_list_decks_empty() {
    let server = TestContext::new().server();
    let response = server.get("/api/decks").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["decks"].as_array().unwrap().is_empty());
}

/// Test list decks after import.
#[tokio::test]
async fn test_list_decks_after_import() {
    let server = TestContext::new().server();
    let note_type_id = common::seed_deck(&server, "spanish", 3).await;
    common::import_into(
        &server,
        "spanish/verbs",
        note_type_id,
        &fixtures::sample_notes(2, 10),
    )
    .await;

    let response = server.get("/api/decks").await;
    let body: Value = response.json();
    let decks = body["decks"].as_array().unwrap();
    assert_eq!(decks.len(), 2);

    let verbs = decks.iter().find(|d| d["path"] == "spanish/verbs").unwrap();
    assert_eq!(verbs["name"], "verbs");
    assert_eq!(verbs["card_count"], 2);
    assert_eq!(verbs["new_count"], 2);
    assert_eq!(verbs["due_count"], 0);
}

/// Test note types used in a deck include its subdecks.
#[tokio::test]
async fn test_deck_note_types() {
    let server = TestContext::new().server();
    let note_type_id = common::create_vocab_note_type(&server).await;
    common::import_into(
        &server,
        "spanish/verbs",
        note_type_id,
        &fixtures::sample_notes(1, 1),
    )
    .await;

    let response = server.get("/api/decks/spanish/note-types").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["note_types"][0]["id"], note_type_id);

    let response = server.get("/api/decks/french/note-types").await;
    let body: Value = response.json();
    assert!(body["note_types"].as_array().unwrap().is_empty());
}

/// Test card state of a fresh card and of a missing card.
#[tokio::test]
async fn test_card_state() {
    let server = TestContext::new().server();
    let note_type_id = common::create_vocab_note_type(&server).await;
    common::import_into(&server, "spanish", note_type_id, "ID: 5\nWord: gato\nMeaning: cat").await;

    // The first card of a fresh collection gets ID 1.
    let response = server.get("/api/cards/1/state").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["state"]["status"], "new");
    assert_eq!(body["state"]["reviews_count"], 0);

    let response = server.get("/api/cards/999/state").await;
    response.assert_status_not_found();
}
