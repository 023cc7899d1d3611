//! Test fixtures and factory functions for creating test data.

use serde_json::{json, Value};

/// Field names of the vocab note type.
pub const VOCAB_FIELDS: [&str; 3] = ["Word", "Meaning", "Audio"];

pub fn vocab_note_type_request() -> Value {
    json!({ "name": "Vocab", "fields": VOCAB_FIELDS })
}

/// Generate importable notes `w{n}` / `m{n}` with a sound tag each.
///
/// # Arguments
/// * `count` - Number of notes to generate
/// * `first` - Number of the first note
pub fn sample_notes(count: usize, first: usize) -> String {
    (first..first + count)
        .map(|n| format!("Word: w{n}\nMeaning: m{n}\nAudio: [sound:w{n}.mp3]\n"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn import_request(note_type_id: i64, content: &str) -> Value {
    json!({ "note_type_id": note_type_id, "content": content })
}

/// Start-match request body; `extra` fields are merged in.
pub fn start_match_request(deck: &str, note_type_id: i64, extra: Value) -> Value {
    let mut body = json!({
        "deck_path": deck,
        "note_type_id": note_type_id,
        "vocab_field": "Word",
        "meaning_field": "Meaning",
        "audio_field": "Audio",
        "page_size": 3
    });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            body.insert(key.clone(), value.clone());
        }
    }
    body
}

/// Percent-encode the `/` separators of a deck path for use in a URL.
pub fn encode_path(deck: &str) -> String {
    deck.replace('/', "%2F")
}
