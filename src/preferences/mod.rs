//! Preference normalization and hashing
//!
//! Raw [`PreferenceSnapshot`]s are canonicalized into [`CanonicalPreferences`] and
//! digested into a [`PreferenceHash`], the staleness signal carried by cache entries.

pub mod canonical;
pub mod hasher;
pub mod snapshot;

pub use canonical::{normalize_list, normalize_text, CanonicalPreferences, RoutineProfile};
pub use hasher::{hash_canonical, hash_preferences, PreferenceHash};
pub use snapshot::{PreferenceSnapshot, RoutineContext, RoutineDay, SkillLevel, TimePreference};
