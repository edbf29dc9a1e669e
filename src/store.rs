//! Result storage keyed by opaque handles
//!
//! Each published result is write-once; the store only locks its map, never
//! a result, so pages of one handle can be served while another comparison
//! is being published.

use crate::error::{ReconError, Result};
use crate::result::{ComparisonResult, OutputRow, Summary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Opaque identifier of a stored result
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultHandle(String);

impl ResultHandle {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines and listings
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for ResultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResultHandle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ResultHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// When stored results are dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Kept until `evict`/`clear` is called
    Manual,
    /// At most `max` results; publishing beyond that drops the oldest
    MaxEntries { max: usize },
    /// Results expire `seconds` after publication
    Ttl { seconds: u64 },
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        EvictionPolicy::Manual
    }
}

/// One page of output rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub rows: Vec<OutputRow>,
    pub page: usize,
    pub size: usize,
    pub total_rows: usize,
    pub has_more: bool,
}

impl Page {
    pub fn total_pages(&self) -> usize {
        self.total_rows.div_ceil(self.size)
    }
}

struct Entry {
    result: Arc<ComparisonResult>,
    published: Instant,
}

/// Shared handle → result map
pub struct ResultStore {
    entries: RwLock<HashMap<ResultHandle, Entry>>,
    policy: EvictionPolicy,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(EvictionPolicy::Manual)
    }
}

impl ResultStore {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy,
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Publish a finished result under a fresh handle
    pub fn put(&self, result: ComparisonResult) -> ResultHandle {
        let handle = ResultHandle::generate();
        self.insert(handle.clone(), result);
        handle
    }

    /// Publish a result under a known handle, replacing any previous one
    pub fn insert(&self, handle: ResultHandle, result: ComparisonResult) {
        let entry = Entry {
            result: Arc::new(result),
            published: Instant::now(),
        };

        let mut entries = self.entries.write();
        entries.insert(handle.clone(), entry);
        self.apply_policy(&mut entries, &handle);
        log::debug!("Stored result {} ({} held)", handle.short(), entries.len());
    }

    /// Shared reference to a stored result
    pub fn get(&self, handle: &ResultHandle) -> Result<Arc<ComparisonResult>> {
        let entries = self.entries.read();
        match entries.get(handle) {
            Some(entry) if !self.is_expired(entry) => Ok(Arc::clone(&entry.result)),
            _ => Err(ReconError::not_found(handle.as_str())),
        }
    }

    /// Rows `[(page - 1) * size, page * size)`; pages are 1-indexed
    pub fn page(&self, handle: &ResultHandle, page: usize, size: usize) -> Result<Page> {
        if page == 0 {
            return Err(ReconError::invalid_input("Page numbers start at 1"));
        }
        if size == 0 {
            return Err(ReconError::invalid_input("Page size must be greater than 0"));
        }

        let result = self.get(handle)?;
        let total_rows = result.rows.len();
        let start = (page - 1).saturating_mul(size).min(total_rows);
        let end = start.saturating_add(size).min(total_rows);

        Ok(Page {
            rows: result.rows[start..end].to_vec(),
            page,
            size,
            total_rows,
            has_more: page.saturating_mul(size) < total_rows,
        })
    }

    /// Every row of a result in emitted order
    pub fn stream(&self, handle: &ResultHandle) -> Result<Vec<OutputRow>> {
        Ok(self.get(handle)?.rows.clone())
    }

    pub fn summary(&self, handle: &ResultHandle) -> Result<Summary> {
        Ok(self.get(handle)?.summary.clone())
    }

    /// Drop a result; returns whether it was present
    pub fn evict(&self, handle: &ResultHandle) -> bool {
        self.entries.write().remove(handle).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Live handles, oldest first
    pub fn handles(&self) -> Vec<ResultHandle> {
        let entries = self.entries.read();
        let mut live: Vec<(&ResultHandle, &Entry)> = entries
            .iter()
            .filter(|(_, entry)| !self.is_expired(entry))
            .collect();
        live.sort_by_key(|(_, entry)| entry.published);
        live.into_iter().map(|(handle, _)| handle.clone()).collect()
    }

    /// Number of live results
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|entry| !self.is_expired(entry))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        match self.policy {
            EvictionPolicy::Ttl { seconds } => entry.published.elapsed() >= Duration::from_secs(seconds),
            _ => false,
        }
    }

    fn apply_policy(&self, entries: &mut HashMap<ResultHandle, Entry>, just_published: &ResultHandle) {
        match self.policy {
            EvictionPolicy::Manual => {}
            EvictionPolicy::Ttl { .. } => {
                entries.retain(|handle, entry| handle == just_published || !self.is_expired(entry));
            }
            EvictionPolicy::MaxEntries { max } => {
                let max = max.max(1);
                while entries.len() > max {
                    let oldest = entries
                        .iter()
                        .filter(|(handle, _)| *handle != just_published)
                        .min_by_key(|(_, entry)| entry.published)
                        .map(|(handle, _)| handle.clone());
                    match oldest {
                        Some(handle) => {
                            log::debug!("Evicting result {}", handle.short());
                            entries.remove(&handle);
                        }
                        None => break,
                    }
                }
            }
        }
    }
}
