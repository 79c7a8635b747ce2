//! In-memory tiers, for tests and ephemeral runs.

use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

use crate::batch::GenerationStatus;
use crate::error::StorageError;
use crate::menu::{CourseSlot, MenuDecision, MenuRecipe};
use crate::store::{BundleKey, CacheEntry, DurableStore, LocalCache, RecordMeta, StatusKey};
use crate::types::{now_millis, Hash, MealType};

#[derive(Default)]
pub struct MemoryDurableStore {
    decisions: RwLock<HashMap<BundleKey, MenuDecision>>,
    recipes: RwLock<HashMap<(BundleKey, CourseSlot), MenuRecipe>>,
    records: RwLock<HashMap<BundleKey, RecordMeta>>,
    statuses: RwLock<HashMap<StatusKey, GenerationStatus>>,
    content_index: RwLock<HashMap<Hash, BundleKey>>,
}

impl MemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored decisions
    pub fn decision_count(&self) -> usize {
        self.decisions.read().len()
    }
}

impl DurableStore for MemoryDurableStore {
    fn get_decision(&self, key: &BundleKey) -> Result<Option<MenuDecision>, StorageError> {
        Ok(self.decisions.read().get(key).cloned())
    }

    fn put_decision(&self, key: &BundleKey, decision: &MenuDecision) -> Result<(), StorageError> {
        self.decisions.write().insert(key.clone(), decision.clone());
        Ok(())
    }

    fn get_recipe(
        &self,
        key: &BundleKey,
        slot: CourseSlot,
    ) -> Result<Option<MenuRecipe>, StorageError> {
        Ok(self.recipes.read().get(&(key.clone(), slot)).cloned())
    }

    fn put_recipe(&self, key: &BundleKey, recipe: &MenuRecipe) -> Result<(), StorageError> {
        self.recipes
            .write()
            .insert((key.clone(), recipe.slot), recipe.clone());
        Ok(())
    }

    fn get_record_meta(&self, key: &BundleKey) -> Result<Option<RecordMeta>, StorageError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn put_record_meta(&self, key: &BundleKey, meta: &RecordMeta) -> Result<(), StorageError> {
        self.records.write().insert(key.clone(), meta.clone());
        self.content_index
            .write()
            .insert(meta.content_hash, key.clone());
        Ok(())
    }

    fn get_status(&self, key: &StatusKey) -> Result<Option<GenerationStatus>, StorageError> {
        Ok(self.statuses.read().get(key).cloned())
    }

    fn put_status(&self, status: &GenerationStatus) -> Result<(), StorageError> {
        self.statuses.write().insert(status.key(), status.clone());
        Ok(())
    }

    fn find_by_content_hash(&self, content_hash: &Hash) -> Result<Option<BundleKey>, StorageError> {
        Ok(self.content_index.read().get(content_hash).cloned())
    }
}

/// In-memory local tier with an optional TTL
#[derive(Default)]
pub struct MemoryLocalCache {
    entries: RwLock<HashMap<(NaiveDate, MealType), CacheEntry>>,
    ttl: Option<Duration>,
}

impl MemoryLocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl LocalCache for MemoryLocalCache {
    fn get(&self, date: NaiveDate, meal_type: MealType) -> Result<Option<CacheEntry>, StorageError> {
        let entry = self.entries.read().get(&(date, meal_type)).cloned();
        Ok(match (entry, self.ttl) {
            (Some(entry), Some(ttl)) if entry.is_expired(ttl, now_millis()) => None,
            (entry, _) => entry,
        })
    }

    fn put(
        &self,
        date: NaiveDate,
        meal_type: MealType,
        entry: &CacheEntry,
    ) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert((date, meal_type), entry.clone());
        Ok(())
    }

    fn remove(&self, date: NaiveDate, meal_type: MealType) -> Result<(), StorageError> {
        self.entries.write().remove(&(date, meal_type));
        Ok(())
    }
}
