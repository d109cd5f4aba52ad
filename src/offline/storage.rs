//! Named cache generations
//!
//! Mirrors the browser Cache Storage model: a set of named caches, each a map
//! from request URL to stored response. Both levels sit behind `RwLock`s so
//! concurrent fetch interceptions can read while an install writes.

use crate::core::sync::{handle_rwlock_read, handle_rwlock_write};
use crate::offline::error::{CacheError, CacheResult};
use crate::offline::network::FetchResponse;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

fn storage_error(message: String) -> CacheError {
    CacheError::Storage { message }
}

/// One named cache
#[derive(Debug)]
pub struct CacheGeneration {
    name: String,
    entries: RwLock<HashMap<String, FetchResponse>>,
}

impl CacheGeneration {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored response for a URL
    pub fn lookup(&self, url: &str) -> CacheResult<Option<FetchResponse>> {
        let entries = handle_rwlock_read(self.entries.read(), storage_error)?;
        Ok(entries.get(url).cloned())
    }

    /// Store or replace the response for a URL
    pub fn put(&self, url: &str, response: FetchResponse) -> CacheResult<()> {
        let mut entries = handle_rwlock_write(self.entries.write(), storage_error)?;
        entries.insert(url.to_string(), response);
        Ok(())
    }

    /// Store a batch of responses under one write lock
    pub fn put_all(&self, batch: Vec<(String, FetchResponse)>) -> CacheResult<()> {
        let mut entries = handle_rwlock_write(self.entries.write(), storage_error)?;
        entries.extend(batch);
        Ok(())
    }

    pub fn urls(&self) -> CacheResult<Vec<String>> {
        let entries = handle_rwlock_read(self.entries.read(), storage_error)?;
        let mut urls: Vec<String> = entries.keys().cloned().collect();
        urls.sort();
        Ok(urls)
    }

    pub fn len(&self) -> CacheResult<usize> {
        Ok(handle_rwlock_read(self.entries.read(), storage_error)?.len())
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// All cache generations known to the process
#[derive(Debug, Default)]
pub struct CacheStorage {
    generations: RwLock<BTreeMap<String, Arc<CacheGeneration>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a generation by name, creating it empty if missing
    pub fn open(&self, name: &str) -> CacheResult<Arc<CacheGeneration>> {
        if let Some(existing) = self.get(name)? {
            return Ok(existing);
        }
        let mut generations = handle_rwlock_write(self.generations.write(), storage_error)?;
        let generation = generations
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CacheGeneration::new(name)));
        Ok(Arc::clone(generation))
    }

    /// Existing generation by name
    pub fn get(&self, name: &str) -> CacheResult<Option<Arc<CacheGeneration>>> {
        let generations = handle_rwlock_read(self.generations.read(), storage_error)?;
        Ok(generations.get(name).cloned())
    }

    /// Names of all generations, sorted
    pub fn keys(&self) -> CacheResult<Vec<String>> {
        let generations = handle_rwlock_read(self.generations.read(), storage_error)?;
        Ok(generations.keys().cloned().collect())
    }

    /// Drop a generation; returns whether it existed
    pub fn delete(&self, name: &str) -> CacheResult<bool> {
        let mut generations = handle_rwlock_write(self.generations.write(), storage_error)?;
        Ok(generations.remove(name).is_some())
    }

    /// Look a URL up across every generation, oldest name first
    pub fn lookup_any(&self, url: &str) -> CacheResult<Option<FetchResponse>> {
        let generations: Vec<Arc<CacheGeneration>> = {
            let guard = handle_rwlock_read(self.generations.read(), storage_error)?;
            guard.values().cloned().collect()
        };
        for generation in generations {
            if let Some(hit) = generation.lookup(url)? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }
}
