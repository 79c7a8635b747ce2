//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, ErrorKind};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match retry_hint(e) {
        Some(hint) => format!("Error: {}\n{}", e, hint),
        None => format!("Error: {}", e),
    }
}

/// Manual retry action for failures where every tier came up empty or a wait ran out.
pub fn retry_hint(e: &ApiError) -> Option<&'static str> {
    match e.kind() {
        ErrorKind::CacheMiss => Some(
            "No plan could be produced. Check provider connectivity, then retry the same command.",
        ),
        ErrorKind::Timeout => Some("Still running. Retry the same command later to check again."),
        ErrorKind::StatusNotCompleted => {
            Some("Wait for the batch to complete (`mealplan status --watch`), then retry.")
        }
        _ => None,
    }
}

/// Process exit code per error kind
pub fn exit_code(e: &ApiError) -> i32 {
    match e.kind() {
        ErrorKind::InvalidRequest | ErrorKind::Config => 2,
        _ => 1,
    }
}
