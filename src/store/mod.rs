//! Storage tiers
//!
//! The durable tier ([`DurableStore`]) is authoritative and keyed by
//! `(user, date, meal)` for bundles and `(user, week)` for batch status. Bundles are
//! stored as separate records (decision, one recipe per slot, bookkeeping) with no
//! cross-record transaction, so readers assemble and check completeness themselves
//! via [`load_bundle`].
//!
//! The local tier ([`LocalCache`]) is keyed by `(date, meal)` only, short-lived, and
//! never guaranteed fresh.

pub mod local;
pub mod memory;
pub mod persistence;

pub use local::FileLocalCache;
pub use memory::{MemoryDurableStore, MemoryLocalCache};
pub use persistence::SledDurableStore;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::batch::GenerationStatus;
use crate::error::StorageError;
use crate::menu::{CourseSlot, MenuBundle, MenuDecision, MenuRecipe};
use crate::preferences::PreferenceHash;
use crate::provider::TokenUsage;
use crate::types::{week_start, Hash, MealType, UserId};

/// Durable address of one bundle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BundleKey {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub meal_type: MealType,
}

impl BundleKey {
    pub fn new(user_id: UserId, date: NaiveDate, meal_type: MealType) -> Self {
        Self {
            user_id,
            date,
            meal_type,
        }
    }

    pub fn storage_key(&self) -> String {
        format!("{}/{}/{}", self.user_id, self.date, self.meal_type)
    }

    pub fn recipe_key(&self, slot: CourseSlot) -> String {
        format!("{}/{}", self.storage_key(), slot)
    }
}

impl fmt::Display for BundleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Durable address of a week batch status. The week is normalized to its Monday.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusKey {
    pub user_id: UserId,
    pub week_start: NaiveDate,
}

impl StatusKey {
    pub fn new(user_id: UserId, any_day_of_week: NaiveDate) -> Self {
        Self {
            user_id,
            week_start: week_start(any_day_of_week),
        }
    }

    pub fn storage_key(&self) -> String {
        format!("{}/{}", self.user_id, self.week_start)
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Bookkeeping persisted alongside a bundle. Outside the resolution contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Generating model identifier
    pub model: String,
    pub usage: TokenUsage,
    pub cost_usd: f64,
    pub preference_hash: PreferenceHash,
    pub created_at_ms: u64,
    /// BLAKE3 of the bundle's JSON encoding
    pub content_hash: Hash,
}

/// A complete bundle read back from the durable tier.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleRecord {
    pub key: BundleKey,
    pub bundle: MenuBundle,
    /// Absent when the bookkeeping write has not landed (or failed).
    pub meta: Option<RecordMeta>,
}

/// Local-tier entry: a bundle plus the preferences it was generated under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub bundle: MenuBundle,
    pub preference_hash: PreferenceHash,
    pub stored_at_ms: u64,
}

impl CacheEntry {
    pub fn new(bundle: MenuBundle, preference_hash: PreferenceHash, stored_at_ms: u64) -> Self {
        Self {
            bundle,
            preference_hash,
            stored_at_ms,
        }
    }

    pub fn is_expired(&self, ttl: Duration, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.stored_at_ms) > ttl.as_millis() as u64
    }
}

/// Durable key-value tier
pub trait DurableStore: Send + Sync {
    fn get_decision(&self, key: &BundleKey) -> Result<Option<MenuDecision>, StorageError>;
    fn put_decision(&self, key: &BundleKey, decision: &MenuDecision) -> Result<(), StorageError>;

    fn get_recipe(
        &self,
        key: &BundleKey,
        slot: CourseSlot,
    ) -> Result<Option<MenuRecipe>, StorageError>;
    /// Stored under `recipe.slot`.
    fn put_recipe(&self, key: &BundleKey, recipe: &MenuRecipe) -> Result<(), StorageError>;

    fn get_record_meta(&self, key: &BundleKey) -> Result<Option<RecordMeta>, StorageError>;
    /// Also indexes `meta.content_hash -> key`.
    fn put_record_meta(&self, key: &BundleKey, meta: &RecordMeta) -> Result<(), StorageError>;

    fn get_status(&self, key: &StatusKey) -> Result<Option<GenerationStatus>, StorageError>;
    fn put_status(&self, status: &GenerationStatus) -> Result<(), StorageError>;

    /// Most recent bundle key recorded with this content hash
    fn find_by_content_hash(&self, content_hash: &Hash) -> Result<Option<BundleKey>, StorageError>;
}

/// Local ephemeral tier. Implementations treat expired entries as absent.
pub trait LocalCache: Send + Sync {
    fn get(&self, date: NaiveDate, meal_type: MealType) -> Result<Option<CacheEntry>, StorageError>;
    fn put(&self, date: NaiveDate, meal_type: MealType, entry: &CacheEntry)
        -> Result<(), StorageError>;
    fn remove(&self, date: NaiveDate, meal_type: MealType) -> Result<(), StorageError>;
}

/// Assemble a bundle from its durable records.
///
/// Returns `None` unless the decision and a recipe for every course slot are all
/// present; a partially written bundle is indistinguishable from a missing one.
pub fn load_bundle(
    store: &dyn DurableStore,
    key: &BundleKey,
) -> Result<Option<BundleRecord>, StorageError> {
    let Some(decision) = store.get_decision(key)? else {
        return Ok(None);
    };

    let mut recipes = Vec::with_capacity(CourseSlot::ALL.len());
    for slot in CourseSlot::ALL {
        match store.get_recipe(key, slot)? {
            Some(recipe) => recipes.push(recipe),
            None => return Ok(None),
        }
    }

    let bundle = match MenuBundle::assemble(decision, recipes) {
        Ok(bundle) => bundle,
        Err(_) => return Ok(None),
    };
    let meta = store.get_record_meta(key)?;

    Ok(Some(BundleRecord {
        key: key.clone(),
        bundle,
        meta,
    }))
}

/// Write a bundle as decision, then recipes, then bookkeeping.
///
/// Each write is independent; a failure part-way leaves an incomplete bundle that
/// [`load_bundle`] reports as absent.
pub fn save_bundle(
    store: &dyn DurableStore,
    key: &BundleKey,
    bundle: &MenuBundle,
    meta: &RecordMeta,
) -> Result<(), StorageError> {
    store.put_decision(key, bundle.decision())?;
    for recipe in bundle.recipes() {
        store.put_recipe(key, recipe)?;
    }
    store.put_record_meta(key, meta)
}
