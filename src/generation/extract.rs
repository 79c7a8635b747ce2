//! JSON extraction from free-form completion text.
//!
//! Candidates are tried in order: every fenced block (```json ... ``` or ``` ... ```),
//! then the whole trimmed text.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Bodies of fenced code blocks, in order of appearance.
pub fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        // the info string (e.g. `json`) runs to the end of the opening line
        let Some(newline) = after_open.find('\n') else {
            break;
        };
        let body = &after_open[newline + 1..];
        let Some(close) = body.find("```") else {
            break;
        };
        blocks.push(body[..close].trim());
        rest = &body[close + 3..];
    }
    blocks
}

/// Extraction candidates: fenced blocks first, then the whole text.
pub fn candidates(text: &str) -> Vec<&str> {
    let mut all = fenced_blocks(text);
    let whole = text.trim();
    if !whole.is_empty() && !all.contains(&whole) {
        all.push(whole);
    }
    all
}

/// First candidate that parses as JSON at all.
pub fn extract_value(text: &str, stage: &'static str) -> Result<Value, ApiError> {
    candidates(text)
        .into_iter()
        .find_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
        .ok_or_else(|| {
            ApiError::parse(
                stage,
                format!("no JSON found in response ({} chars)", text.len()),
            )
        })
}

/// First candidate that deserializes into `T`.
pub fn extract_matching<T: DeserializeOwned>(text: &str, stage: &'static str) -> Result<T, ApiError> {
    let mut last_error = None;
    for candidate in candidates(text) {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e.to_string()),
        }
    }
    Err(ApiError::parse(
        stage,
        match last_error {
            Some(e) => format!("no JSON matching the expected schema: {}", e),
            None => "empty response".to_string(),
        },
    ))
}
