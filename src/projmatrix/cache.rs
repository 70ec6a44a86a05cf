//! Memoization of matrix rows, keyed by basic bin.
//!
//! Consistency contract: a row read back for a key is always the row which
//! computing it afresh would produce. Rows are pure functions of the bin and
//! the (immutable) geometry, so concurrent writers of the same key race
//! benignly: the first row stored wins, and the others are discarded.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;
use tracing::{trace, warn};

use crate::error::{ProjError, Result};
use crate::projdata::BinKey;
use crate::projmatrix::SystemMatrixRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Maximum number of rows held. Unbounded if absent. When full, the
    /// oldest row is evicted. Zero is rejected by `check_valid`.
    pub capacity: Option<usize>,
    /// Recompute rows found in the cache, and fail if they differ from the
    /// cached ones
    pub check_consistency: bool,
}

impl Default for CacheConfig {
    fn default() -> Self { Self { enabled: true, capacity: None, check_consistency: false } }
}

impl CacheConfig {
    pub fn disabled() -> Self { Self { enabled: false, ..Self::default() } }
    pub fn bounded(capacity: usize) -> Self { Self { capacity: Some(capacity), ..Self::default() } }

    pub fn check_valid(&self) -> Result<()> {
        match self.capacity {
            Some(0) => Err(ProjError::Config("row cache capacity must be at least 1: use `enabled = false` to disable caching".into())),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    rows: HashMap<BinKey, Arc<SystemMatrixRow>>,
    /// Insertion order, for eviction
    order: VecDeque<BinKey>,
    evicting: bool,
}

#[derive(Debug)]
pub struct RowCache {
    config: CacheConfig,
    store: RwLock<Store>,
}

impl RowCache {

    pub fn new(config: CacheConfig) -> Self {
        Self { config, store: RwLock::new(Store::default()) }
    }

    pub fn config(&self) -> CacheConfig { self.config }

    // Rows are complete whenever the lock is released, so a poisoned lock
    // still guards a usable map.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Store> { self.store.read().unwrap_or_else(PoisonError::into_inner) }
    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Store> { self.store.write().unwrap_or_else(PoisonError::into_inner) }

    pub fn len(&self) -> usize { self.read().rows.len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn clear(&self) {
        let mut store = self.write();
        store.rows.clear();
        store.order.clear();
        store.evicting = false;
    }

    pub fn get(&self, key: &BinKey) -> Option<Arc<SystemMatrixRow>> {
        if !self.config.enabled { return None }
        self.read().rows.get(key).cloned()
    }

    /// Store `row` under `key`, unless a row is already there. Returns the
    /// row held for `key` after the call.
    pub fn insert(&self, key: BinKey, row: SystemMatrixRow) -> Result<Arc<SystemMatrixRow>> {
        if !self.config.enabled { return Ok(Arc::new(row)) }
        let mut store = self.write();
        if let Some(existing) = store.rows.get(&key) {
            if self.config.check_consistency && **existing != row {
                return Err(ProjError::CacheInconsistency(format!("two different rows computed for {key:?}")))
            }
            return Ok(Arc::clone(existing))
        }
        if let Some(capacity) = self.config.capacity {
            while store.rows.len() >= capacity {
                if !store.evicting {
                    warn!(capacity, "row cache full: evicting oldest rows");
                    store.evicting = true;
                }
                match store.order.pop_front() {
                    Some(oldest) => { store.rows.remove(&oldest); }
                    None => break,
                }
            }
        }
        let row = Arc::new(row);
        store.rows.insert(key, Arc::clone(&row));
        store.order.push_back(key);
        Ok(row)
    }

    /// The cached row for `key`, computing and storing it if absent
    pub fn get_or_compute(&self, key: BinKey, compute: impl FnOnce() -> Result<SystemMatrixRow>) -> Result<Arc<SystemMatrixRow>> {
        match self.get(&key) {
            Some(cached) if self.config.check_consistency => {
                if *cached != compute()? {
                    return Err(ProjError::CacheInconsistency(format!("cached row for {key:?} differs from recomputed row")))
                }
                Ok(cached)
            }
            Some(cached) => Ok(cached),
            None => {
                trace!(?key, "row cache miss");
                self.insert(key, compute()?)
            }
        }
    }
}
