// Durable state module
//
// The build numbering sequence survives across invocations, not just across
// the process lifetime. This module provides the CounterStore abstraction
// over that durable state plus the file-backed implementation used by the
// CLI and an in-memory implementation for tests and embedding.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;

/// Key under which the last allocated build index is persisted.
pub const LAST_INDEX_KEY: &str = "LastIndexFromAutoBuild";

/// Durable integer key-value store for the build-numbering sequence.
///
/// `get` defaults to 0 for absent keys. Implementations are not required to
/// be safe against concurrent writers; the pipeline assumes one build in
/// flight per project at a time.
pub trait CounterStore {
    fn get(&self, key: &str) -> Result<i64>;
    fn set(&mut self, key: &str, value: i64) -> Result<()>;
}

/// File-backed counter store, persisted as a small JSON object.
///
/// Values are written back on every `set`, so state survives a crash between
/// allocation and the build engine run.
#[derive(Debug, Clone)]
pub struct PrefsCounterStore {
    path: Utf8PathBuf,
    values: IndexMap<String, i64>,
}

impl PrefsCounterStore {
    /// Open the store at `path`, loading existing values if the file exists.
    pub fn open<P: AsRef<Utf8Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let values = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prefs store: {path}"))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse prefs store: {path}"))?
        } else {
            IndexMap::new()
        };

        Ok(Self { path, values })
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create prefs directory: {parent}"))?;
            }
        }

        let json = serde_json::to_string_pretty(&self.values)
            .context("Failed to serialize prefs store")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write prefs store: {}", self.path))?;

        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl CounterStore for PrefsCounterStore {
    fn get(&self, key: &str) -> Result<i64> {
        Ok(self.values.get(key).copied().unwrap_or(0))
    }

    fn set(&mut self, key: &str, value: i64) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.persist()?;
        tracing::debug!("Persisted counter {key}={value} to {}", self.path);
        Ok(())
    }
}

/// In-memory counter store for tests and single-shot embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    values: IndexMap<String, i64>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounterStore {
    fn get(&self, key: &str) -> Result<i64> {
        Ok(self.values.get(key).copied().unwrap_or(0))
    }

    fn set(&mut self, key: &str, value: i64) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
