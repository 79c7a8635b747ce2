//! File-backed local tier
//!
//! Entries live at `{root}/{date}/{meal}.json` and survive process restarts. Writes
//! go to a temp file that is renamed into place, so a reader sees either the old
//! entry or the new one.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::error::StorageError;
use crate::store::{CacheEntry, LocalCache};
use crate::types::{now_millis, MealType};

pub struct FileLocalCache {
    root: PathBuf,
    ttl: Duration,
    write_seq: AtomicU64,
}

impl FileLocalCache {
    /// Create the cache directory if needed.
    pub fn new<P: AsRef<Path>>(root: P, ttl: Duration) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to create local cache directory at {:?}: {}", root, e),
            ))
        })?;
        Ok(Self {
            root,
            ttl,
            write_seq: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entry_path(&self, date: NaiveDate, meal_type: MealType) -> PathBuf {
        self.root
            .join(date.to_string())
            .join(format!("{}.json", meal_type))
    }
}

impl LocalCache for FileLocalCache {
    /// Expired entries are deleted and reported as absent.
    fn get(&self, date: NaiveDate, meal_type: MealType) -> Result<Option<CacheEntry>, StorageError> {
        let path = self.entry_path(date, meal_type);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read local entry {:?}: {}", path, e),
            ))
        })?;
        let entry: CacheEntry = serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
            key: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if entry.is_expired(self.ttl, now_millis()) {
            debug!(date = %date, meal = %meal_type, "Local entry expired");
            let _ = fs::remove_file(&path);
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn put(
        &self,
        date: NaiveDate,
        meal_type: MealType,
        entry: &CacheEntry,
    ) -> Result<(), StorageError> {
        let path = self.entry_path(date, meal_type);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::IoError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory {:?}: {}", parent, e),
                ))
            })?;
        }

        let serialized = serde_json::to_vec_pretty(entry).map_err(|e| StorageError::Corrupt {
            key: path.display().to_string(),
            reason: format!("Failed to serialize entry: {}", e),
        })?;

        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let temp_path = path.with_extension(format!("json.{}.{}.tmp", std::process::id(), seq));
        fs::write(&temp_path, &serialized).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to write local entry to {:?}: {}", temp_path, e),
            ))
        })?;
        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to rename temp file to {:?}: {}", path, e),
            ))
        })?;
        Ok(())
    }

    fn remove(&self, date: NaiveDate, meal_type: MealType) -> Result<(), StorageError> {
        let path = self.entry_path(date, meal_type);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }
}
