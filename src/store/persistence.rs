//! Sled-backed durable tier

use crate::batch::GenerationStatus;
use crate::error::StorageError;
use crate::menu::{CourseSlot, MenuDecision, MenuRecipe};
use crate::store::{BundleKey, DurableStore, RecordMeta, StatusKey};
use crate::types::Hash;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

const DECISIONS_TREE: &str = "decisions";
const RECIPES_TREE: &str = "recipes";
const RECORDS_TREE: &str = "records";
const STATUS_TREE: &str = "status";
const CONTENT_INDEX_TREE: &str = "content_index";

/// Sled-based implementation of DurableStore
///
/// One tree per record kind; values are bincode.
pub struct SledDurableStore {
    db: sled::Db,
    decisions: sled::Tree,
    recipes: sled::Tree,
    records: sled::Tree,
    status: sled::Tree,
    content_index: sled::Tree,
}

fn sled_error(action: &str, e: sled::Error) -> StorageError {
    StorageError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("Failed to {}: {}", action, e),
    ))
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(value).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: format!("Failed to serialize: {}", e),
    })
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, StorageError> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: format!("Failed to deserialize: {}", e),
    })
}

impl SledDurableStore {
    /// Open (or create) the database at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| sled_error("open sled database", e))?;
        let open = |name: &str| {
            db.open_tree(name)
                .map_err(|e| sled_error(&format!("open tree {}", name), e))
        };
        Ok(Self {
            decisions: open(DECISIONS_TREE)?,
            recipes: open(RECIPES_TREE)?,
            records: open(RECORDS_TREE)?,
            status: open(STATUS_TREE)?,
            content_index: open(CONTENT_INDEX_TREE)?,
            db,
        })
    }

    fn read<T: DeserializeOwned>(tree: &sled::Tree, key: &str) -> Result<Option<T>, StorageError> {
        match tree
            .get(key.as_bytes())
            .map_err(|e| sled_error(&format!("read {}", key), e))?
        {
            Some(value) => Ok(Some(decode(key, &value)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(tree: &sled::Tree, key: &str, value: &T) -> Result<(), StorageError> {
        let bytes = encode(key, value)?;
        tree.insert(key.as_bytes(), bytes)
            .map_err(|e| sled_error(&format!("write {}", key), e))?;
        Ok(())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| sled_error("flush database", e))?;
        Ok(())
    }

    /// All stored statuses, in key order
    pub fn list_statuses(&self) -> Result<Vec<GenerationStatus>, StorageError> {
        let mut statuses = Vec::new();
        for item in self.status.iter() {
            let (key, value) = item.map_err(|e| sled_error("iterate status", e))?;
            statuses.push(decode(&String::from_utf8_lossy(&key), &value)?);
        }
        Ok(statuses)
    }
}

impl DurableStore for SledDurableStore {
    fn get_decision(&self, key: &BundleKey) -> Result<Option<MenuDecision>, StorageError> {
        Self::read(&self.decisions, &key.storage_key())
    }

    fn put_decision(&self, key: &BundleKey, decision: &MenuDecision) -> Result<(), StorageError> {
        Self::write(&self.decisions, &key.storage_key(), decision)
    }

    fn get_recipe(
        &self,
        key: &BundleKey,
        slot: CourseSlot,
    ) -> Result<Option<MenuRecipe>, StorageError> {
        Self::read(&self.recipes, &key.recipe_key(slot))
    }

    fn put_recipe(&self, key: &BundleKey, recipe: &MenuRecipe) -> Result<(), StorageError> {
        Self::write(&self.recipes, &key.recipe_key(recipe.slot), recipe)
    }

    fn get_record_meta(&self, key: &BundleKey) -> Result<Option<RecordMeta>, StorageError> {
        Self::read(&self.records, &key.storage_key())
    }

    fn put_record_meta(&self, key: &BundleKey, meta: &RecordMeta) -> Result<(), StorageError> {
        Self::write(&self.records, &key.storage_key(), meta)?;
        let index_value = encode(&key.storage_key(), key)?;
        self.content_index
            .insert(meta.content_hash, index_value)
            .map_err(|e| sled_error("write content index", e))?;
        Ok(())
    }

    fn get_status(&self, key: &StatusKey) -> Result<Option<GenerationStatus>, StorageError> {
        Self::read(&self.status, &key.storage_key())
    }

    fn put_status(&self, status: &GenerationStatus) -> Result<(), StorageError> {
        Self::write(&self.status, &status.key().storage_key(), status)
    }

    fn find_by_content_hash(&self, content_hash: &Hash) -> Result<Option<BundleKey>, StorageError> {
        match self
            .content_index
            .get(content_hash)
            .map_err(|e| sled_error("read content index", e))?
        {
            Some(value) => Ok(Some(decode(&hex::encode(content_hash), &value)?)),
            None => Ok(None),
        }
    }
}
