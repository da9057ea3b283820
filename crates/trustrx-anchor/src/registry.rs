//! # Record Registry
//!
//! The application's own record metadata, each entry holding a copy of the
//! ledger receipt for its anchor. The ledger stays the authority on what
//! was committed; the registry only remembers where to look.
//!
//! Backed by a concurrent map and persisted as pretty-printed JSON.

use std::path::Path;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use trustrx_core::{Fingerprint, RecordId};

use crate::outcome::AnchorReceipt;

/// Errors from registry access and persistence.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No record with this id.
    #[error("unknown record {0}")]
    UnknownRecord(RecordId),

    /// Reading or writing the registry file failed.
    #[error("registry file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The registry file is not valid registry JSON.
    #[error("registry file {path} is malformed: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
}

/// Descriptive fields supplied when a record is anchored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Display name, usually the original file name.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub size_bytes: u64,
}

/// A record whose fingerprint has been committed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoredRecord {
    pub record_id: RecordId,
    #[serde(flatten)]
    pub metadata: RecordMetadata,
    pub receipt: AnchorReceipt,
}

#[derive(Serialize, Deserialize)]
struct RegistryFile {
    records: Vec<AnchoredRecord>,
}

/// Concurrent registry of anchored records.
#[derive(Debug, Default)]
pub struct RecordRegistry {
    records: DashMap<RecordId, AnchoredRecord>,
}

impl RecordRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, replacing any record with the same id.
    pub fn insert(&self, record: AnchoredRecord) -> RecordId {
        let id = record.record_id;
        self.records.insert(id, record);
        id
    }

    pub fn get(&self, id: &RecordId) -> Option<AnchoredRecord> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    /// Records whose anchored fingerprint equals `fingerprint`.
    pub fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> Vec<AnchoredRecord> {
        let mut found: Vec<AnchoredRecord> = self
            .records
            .iter()
            .filter(|entry| entry.value().receipt.fingerprint == *fingerprint)
            .map(|entry| entry.value().clone())
            .collect();
        sort_records(&mut found);
        found
    }

    /// All records, oldest commit first.
    pub fn list(&self) -> Vec<AnchoredRecord> {
        let mut all: Vec<AnchoredRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sort_records(&mut all);
        all
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load a registry file. A missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no registry file, starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(RegistryError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let file: RegistryFile =
            serde_json::from_str(&text).map_err(|source| RegistryError::Malformed {
                path: path.display().to_string(),
                source,
            })?;
        let registry = Self::new();
        for record in file.records {
            registry.insert(record);
        }
        tracing::debug!(path = %path.display(), records = registry.len(), "loaded registry");
        Ok(registry)
    }

    /// Write the registry as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        let io_err = |source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let file = RegistryFile {
            records: self.list(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| RegistryError::Malformed {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)
    }
}

fn sort_records(records: &mut [AnchoredRecord]) {
    records.sort_by(|a, b| {
        a.receipt
            .committed_at
            .cmp(&b.receipt.committed_at)
            .then_with(|| a.record_id.cmp(&b.record_id))
    });
}
