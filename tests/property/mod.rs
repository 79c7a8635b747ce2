//! Property-based tests for preference hashing and batch status

mod preference_hash;
mod status_progress;
