//! `[sound:...]` tags embedded in note fields.

use regex::Regex;
use std::sync::LazyLock;

static SOUND_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[sound:(.*?)\]").expect("sound tag pattern is valid"));

/// File names referenced by sound tags, in order of appearance.
pub fn sound_tags(text: &str) -> Vec<String> {
    SOUND_TAG
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// The text with all sound tags removed.
pub fn strip_sound_tags(text: &str) -> String {
    SOUND_TAG.replace_all(text, "").trim().to_string()
}
