//! Per-item metadata persistence.
//!
//! Editors attach a caption, description, alt text, link override and link
//! target to each gallery item. Records are grouped by **container** (the
//! folder a folder gallery reads from) and keyed by the item key inside it.
//!
//! Two interchangeable backends implement [`MetadataStore`]:
//!
//! - [`FileStore`]: one `metadata.json` document per container folder. Every
//!   write loads the whole document, mutates it and atomically replaces it
//!   while holding an exclusive lock on the container.
//! - [`DatabaseStore`]: one SQLite row per `(container, key)`; an upsert is a
//!   single statement.
//!
//! ## Merge semantics
//!
//! `upsert` merges field-by-field: fields set in the incoming record replace
//! the stored ones, unset fields keep their stored value. Concurrent edits to
//! the same field resolve last-writer-wins.

mod database;
mod file;

pub use database::DatabaseStore;
pub use file::{DOCUMENT_NAME, FileStore};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed metadata document {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Where a folder gallery keeps its item metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    #[default]
    Database,
    File,
}

/// Editable metadata for one item. `None` means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_target: Option<String>,
}

impl MetadataRecord {
    /// Overlay the fields set in `patch` onto `self`.
    pub fn merge(&mut self, patch: &MetadataRecord) {
        fn take(dst: &mut Option<String>, src: &Option<String>) {
            if let Some(v) = src {
                *dst = Some(v.clone());
            }
        }
        take(&mut self.caption, &patch.caption);
        take(&mut self.description, &patch.description);
        take(&mut self.alt, &patch.alt);
        take(&mut self.custom_url, &patch.custom_url);
        take(&mut self.custom_target, &patch.custom_target);
    }

    pub fn is_empty(&self) -> bool {
        self.caption.is_none()
            && self.description.is_none()
            && self.alt.is_none()
            && self.custom_url.is_none()
            && self.custom_target.is_none()
    }
}

/// All records of one container, keyed by item key.
pub type RecordMap = BTreeMap<String, MetadataRecord>;

/// Key-value persistence of item metadata.
///
/// `get` on an unknown container returns an empty map; it never fails for
/// "not found".
pub trait MetadataStore: Send + Sync {
    fn get(&self, container: &str) -> Result<RecordMap, MetadataError>;

    /// Merge `patch` into the record at `key`, returning the stored result.
    fn upsert(
        &self,
        container: &str,
        key: &str,
        patch: &MetadataRecord,
    ) -> Result<MetadataRecord, MetadataError>;

    /// Remove the record at `key`. Returns whether a record existed.
    fn delete(&self, container: &str, key: &str) -> Result<bool, MetadataError>;

    /// Replace every record of a container in one write.
    fn replace_all(&self, container: &str, records: &RecordMap) -> Result<(), MetadataError>;
}
