//! Extraction cache (`llm-cache.json`) and the cache-or-extract decision.
//!
//! The cache is an explicit value: [`ExtractionCache::load`] before the run,
//! [`ExtractionCache::reconcile`] once per document, [`ExtractionCache::store`]
//! after the run. An entry is reused only when its stored hash matches the
//! document's current content hash.
//!
//! A failed extraction yields empty metadata and that empty result is cached
//! under the current hash, so the document is not re-sent until its bytes
//! change. With extraction disabled, misses yield empty metadata and leave
//! the cache untouched.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

use crate::extractor::MetadataExtractor;
use crate::models::{CacheEntry, ManualMetadata};
use crate::output::write_json_atomic;

/// How a document's metadata was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Stored entry with a matching hash.
    Hit,
    /// Provider returned metadata.
    Extracted,
    /// Provider failed; empty metadata was cached.
    Failed,
    /// Extraction disabled; nothing cached.
    Skipped,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractionCache {
    entries: BTreeMap<String, CacheEntry>,
    dirty: bool,
}

impl ExtractionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the cache file. A missing file is an empty cache; an unreadable
    /// or malformed file is logged and treated as empty. Malformed entries
    /// inside an otherwise valid file are dropped individually.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    "Failed to read {}, starting with empty cache: {}",
                    path.display(),
                    e
                );
                return Self::new();
            }
        };

        match Self::parse(&content) {
            Ok(cache) => {
                tracing::debug!("loaded {} cache entries from {}", cache.len(), path.display());
                cache
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse {}, starting with empty cache: {}",
                    path.display(),
                    e
                );
                Self::new()
            }
        }
    }

    /// Parses cache JSON. Fails only when the document is not a JSON object.
    pub fn parse(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let object = value
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("cache root is not a JSON object"))?;

        let mut entries = BTreeMap::new();
        for (path, raw) in object {
            match raw.get("hash").and_then(|h| h.as_str()) {
                Some(hash) if raw.is_object() => {
                    entries.insert(
                        path.clone(),
                        CacheEntry {
                            hash: hash.to_string(),
                            metadata: ManualMetadata::from_json(raw),
                        },
                    );
                }
                _ => tracing::warn!("dropping malformed cache entry for {}", path),
            }
        }

        Ok(Self {
            entries,
            dirty: false,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn get(&self, path: &str) -> Option<&CacheEntry> {
        self.entries.get(path)
    }

    /// Stored metadata for `path` if it was extracted from `hash`.
    pub fn lookup(&self, path: &str, hash: &str) -> Option<&ManualMetadata> {
        self.entries
            .get(path)
            .filter(|entry| entry.hash == hash)
            .map(|entry| &entry.metadata)
    }

    pub fn insert(&mut self, path: &str, hash: &str, metadata: ManualMetadata) {
        self.entries.insert(
            path.to_string(),
            CacheEntry {
                hash: hash.to_string(),
                metadata,
            },
        );
        self.dirty = true;
    }

    /// Returns cached metadata on a hash match, otherwise asks the extractor
    /// and records the result.
    pub async fn reconcile(
        &mut self,
        path: &str,
        hash: &str,
        text: &str,
        extractor: Option<&dyn MetadataExtractor>,
    ) -> (ManualMetadata, Lookup) {
        if let Some(metadata) = self.lookup(path, hash) {
            tracing::info!("using cached metadata for {}", path);
            return (metadata.clone(), Lookup::Hit);
        }

        let Some(extractor) = extractor else {
            tracing::debug!("extraction disabled, no metadata for {}", path);
            return (ManualMetadata::default(), Lookup::Skipped);
        };

        let (metadata, lookup) = match extractor.extract(text).await {
            Ok(metadata) => (metadata, Lookup::Extracted),
            Err(e) => {
                tracing::error!("{} extraction failed for {}: {:#}", extractor.name(), path, e);
                (ManualMetadata::default(), Lookup::Failed)
            }
        };

        self.insert(path, hash, metadata.clone());
        tracing::info!("updated metadata for {}", path);
        (metadata, lookup)
    }

    /// Writes the cache when at least one entry changed. Returns whether a
    /// write happened.
    pub fn store(&mut self, path: &Path) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        write_json_atomic(path, &self.entries)
            .with_context(|| format!("Failed to write cache file: {}", path.display()))?;
        self.dirty = false;
        Ok(true)
    }
}
