//! storage.rs - Pluggable persistence for the rule registry.
//!
//! The store writes through a [`StorageBackend`] it owns, so callers decide
//! where rules live: a JSON file on disk for the CLI, memory for tests and
//! one-shot embedding. The file backend writes atomically (temp file plus
//! rename) under advisory locks so concurrent processes never observe a
//! half-written registry.
//!
//! License: MIT OR Apache-2.0

use log::debug;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::RedactGateError;
use crate::rules::RuleRegistry;

const REGISTRY_FILE_TMP_SUFFIX: &str = ".tmp";

/// Durable storage for the registry document.
///
/// `persist` must be atomic from a reader's perspective: after it returns,
/// a subsequent `load` sees either the previous document or the new one,
/// never a mixture.
pub trait StorageBackend: Send + Sync {
    /// Loads the persisted registry, or `None` when no document exists yet.
    fn load(&self) -> Result<Option<RuleRegistry>, RedactGateError>;

    /// Durably writes the full registry document.
    fn persist(&self, registry: &RuleRegistry) -> Result<(), RedactGateError>;
}

/// Conventional location of the registry document for callers that do not
/// supply their own path.
pub fn default_registry_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("redactgate")
        .join("rules.json")
}

fn persistence_error(path: &Path, source: io::Error) -> RedactGateError {
    RedactGateError::Persistence {
        path: path.to_path_buf(),
        source,
    }
}

/// File-backed storage: one pretty-printed JSON document per registry.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<RuleRegistry>, RedactGateError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut f = OpenOptions::new()
            .read(true)
            .open(&self.path)
            .map_err(|e| persistence_error(&self.path, e))?;
        fs2::FileExt::lock_shared(&f).map_err(|e| persistence_error(&self.path, e))?;

        let mut raw = Vec::new();
        let read_result = f.read_to_end(&mut raw);
        fs2::FileExt::unlock(&f).map_err(|e| persistence_error(&self.path, e))?;
        read_result.map_err(|e| persistence_error(&self.path, e))?;

        if raw.is_empty() {
            return Ok(None);
        }

        let registry: RuleRegistry = serde_json::from_slice(&raw).map_err(|e| {
            RedactGateError::Registry(format!(
                "failed to decode {}: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!(
            "Loaded rule registry from {}: {} rules, {} rule sets.",
            self.path.display(),
            registry.rules.len(),
            registry.rule_sets.len()
        );
        Ok(Some(registry))
    }

    fn persist(&self, registry: &RuleRegistry) -> Result<(), RedactGateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| persistence_error(&self.path, e))?;
        }

        let json = serde_json::to_vec_pretty(registry).map_err(|e| {
            persistence_error(&self.path, io::Error::new(io::ErrorKind::InvalidData, e))
        })?;

        let tmp_path = self.path.with_extension(format!(
            "{}{}",
            self.path
                .extension()
                .map(|s| s.to_string_lossy())
                .unwrap_or_default(),
            REGISTRY_FILE_TMP_SUFFIX
        ));
        {
            let mut tmp = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|e| persistence_error(&tmp_path, e))?;
            fs2::FileExt::lock_exclusive(&tmp).map_err(|e| persistence_error(&tmp_path, e))?;
            let write_result = tmp.write_all(&json).and_then(|_| tmp.flush());
            fs2::FileExt::unlock(&tmp).map_err(|e| persistence_error(&tmp_path, e))?;
            write_result.map_err(|e| persistence_error(&tmp_path, e))?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| persistence_error(&self.path, e))?;
        debug!("Persisted rule registry to {}.", self.path.display());
        Ok(())
    }
}

/// Ephemeral storage for tests and one-shot callers. Contents are lost when
/// the backend is dropped.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    document: Mutex<Option<RuleRegistry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self) -> Result<Option<RuleRegistry>, RedactGateError> {
        Ok(self.document.lock().unwrap().clone())
    }

    fn persist(&self, registry: &RuleRegistry) -> Result<(), RedactGateError> {
        *self.document.lock().unwrap() = Some(registry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_round_trips() {
        let backend = MemoryBackend::new();
        assert!(backend.load().unwrap().is_none());

        let mut registry = RuleRegistry::default();
        registry.default_rule_set = "default".to_string();
        backend.persist(&registry).unwrap();

        let loaded = backend.load().unwrap().unwrap();
        assert_eq!(loaded.default_rule_set, "default");
    }

    #[test]
    fn test_json_file_backend_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("rules.json"));
        assert!(backend.load().unwrap().is_none());
    }
}
