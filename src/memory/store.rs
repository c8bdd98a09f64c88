//! Memory stores
//!
//! The analysis core only ever reads a snapshot of the corpus via
//! [`MemoryStore::load_all`]. Mutation, search and persistence live here.
//!
//! Two implementations are provided:
//! - [`InMemoryStore`]: `tokio::sync::RwLock` backed, for tests and embedding
//! - [`JsonFileStore`]: the same, persisted to a JSON array file after every
//!   mutation. Loading skips malformed entries instead of failing the whole
//!   corpus, and writes them back untouched.

use super::record::{MemoryPatch, MemoryRecord};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage interface for the memory corpus
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Snapshot of every record, in insertion order.
    async fn load_all(&self) -> Result<Vec<MemoryRecord>>;

    /// Insert a new record. Fails if the id already exists.
    async fn add(&self, record: MemoryRecord) -> Result<()>;

    /// Apply a partial update and return the updated record.
    async fn update(&self, id: &str, patch: MemoryPatch) -> Result<MemoryRecord>;

    /// Delete a record, returning it.
    async fn delete(&self, id: &str) -> Result<MemoryRecord>;

    /// Case-insensitive substring search over content, tags and related files.
    async fn search(&self, text: &str) -> Result<Vec<MemoryRecord>> {
        Ok(substring_search(&self.load_all().await?, text))
    }

    /// Word-overlap ranked search.
    async fn fuzzy_search(&self, text: &str) -> Result<Vec<MemoryRecord>> {
        Ok(fuzzy_rank(&self.load_all().await?, text))
    }
}

/// Filter records whose content, tags or related files contain `text`.
pub fn substring_search(records: &[MemoryRecord], text: &str) -> Vec<MemoryRecord> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    records
        .iter()
        .filter(|r| {
            r.content.to_lowercase().contains(&needle)
                || r.tags.iter().any(|t| t.to_lowercase().contains(&needle))
                || r
                    .related_files
                    .iter()
                    .flatten()
                    .any(|f| f.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Rank records by how many query words they contain (ties keep corpus order).
pub fn fuzzy_rank(records: &[MemoryRecord], text: &str) -> Vec<MemoryRecord> {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, &MemoryRecord)> = records
        .iter()
        .map(|r| {
            let haystack = format!("{} {}", r.content, r.tags.join(" ")).to_lowercase();
            let hits = words.iter().filter(|w| haystack.contains(w.as_str())).count();
            (hits, r)
        })
        .filter(|(hits, _)| *hits > 0)
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, r)| r.clone()).collect()
}

/// In-memory store for the memory corpus
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<MemoryRecord>>>,
}

impl InMemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Create a store seeded with records
    pub fn with_records(records: Vec<MemoryRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn load_all(&self) -> Result<Vec<MemoryRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn add(&self, record: MemoryRecord) -> Result<()> {
        insert(&mut *self.records.write().await, record)
    }

    async fn update(&self, id: &str, patch: MemoryPatch) -> Result<MemoryRecord> {
        patch_in(&mut *self.records.write().await, id, patch)
    }

    async fn delete(&self, id: &str) -> Result<MemoryRecord> {
        remove(&mut *self.records.write().await, id)
    }
}

/// JSON-file backed store
///
/// Entries that fail to parse are kept verbatim and written back after the
/// known records on every persist.
pub struct JsonFileStore {
    path: PathBuf,
    records: Arc<RwLock<Vec<MemoryRecord>>>,
    preserved: Vec<serde_json::Value>,
}

impl JsonFileStore {
    /// Open a store file, creating an empty corpus if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let (records, preserved) = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => parse_corpus(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Vec::new(), Vec::new()),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            path = %path.display(),
            count = records.len(),
            preserved = preserved.len(),
            "Memory store opened"
        );

        Ok(Self {
            path,
            records: Arc::new(RwLock::new(records)),
            preserved,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &[MemoryRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut entries = records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        entries.extend(self.preserved.iter().cloned());
        let json = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Run `change` against a copy of the corpus and swap it in only once
    /// the copy is on disk.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut Vec<MemoryRecord>) -> Result<T> + Send,
    ) -> Result<T> {
        let mut records = self.records.write().await;
        let mut next = records.clone();
        let out = change(&mut next)?;
        self.persist(&next).await?;
        *records = next;
        Ok(out)
    }
}

#[async_trait]
impl MemoryStore for JsonFileStore {
    async fn load_all(&self) -> Result<Vec<MemoryRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn add(&self, record: MemoryRecord) -> Result<()> {
        self.commit(|records| insert(records, record)).await
    }

    async fn update(&self, id: &str, patch: MemoryPatch) -> Result<MemoryRecord> {
        self.commit(|records| patch_in(records, id, patch)).await
    }

    async fn delete(&self, id: &str) -> Result<MemoryRecord> {
        self.commit(|records| remove(records, id)).await
    }
}

/// Parse a corpus file.
///
/// Returns the records that deserialize plus the raw entries that do not, so
/// callers can skip the latter for analysis without losing them.
pub fn parse_corpus(raw: &str) -> Result<(Vec<MemoryRecord>, Vec<serde_json::Value>)> {
    if raw.trim().is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let entries: Vec<serde_json::Value> = serde_json::from_str(raw)
        .map_err(|e| Error::Store(format!("memory file is not a JSON array: {}", e)))?;

    let mut records = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<MemoryRecord>(entry.clone()) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping unrecognized memory entry");
                skipped.push(entry);
            }
        }
    }
    Ok((records, skipped))
}

fn insert(records: &mut Vec<MemoryRecord>, record: MemoryRecord) -> Result<()> {
    if records.iter().any(|r| r.id == record.id) {
        return Err(Error::Conflict(record.id));
    }
    records.push(record);
    Ok(())
}

fn patch_in(records: &mut [MemoryRecord], id: &str, patch: MemoryPatch) -> Result<MemoryRecord> {
    let record = records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    record.apply(patch);
    Ok(record.clone())
}

fn remove(records: &mut Vec<MemoryRecord>, id: &str) -> Result<MemoryRecord> {
    let index = records
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    Ok(records.remove(index))
}
