//! Sidecar JSON metadata: one document per container folder.
//!
//! ## Layout
//!
//! ```text
//! gallery-a/
//! ├── metadata.json          # { "a.jpg": { "caption": "..." }, ... }
//! ├── .metadata.json.lock    # advisory lock target, never read
//! ├── a.jpg
//! └── b.jpg
//! ```
//!
//! A missing document is an empty record set. Older upload documents in the
//! `{"items": [{"file": "a.jpg", ...}]}` shape are read transparently and
//! rewritten in the keyed shape on the next write.
//!
//! ## Concurrency
//!
//! Writers take an exclusive OS file lock on the container's lock file for
//! the whole load-modify-store cycle, so writers in other processes are
//! serialized too. The new document is written to a temporary file in the
//! same folder and renamed over the old one: readers take no lock and see
//! either the old or the new document, never a partial one.

use super::{MetadataError, MetadataRecord, MetadataStore, RecordMap};
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the per-container metadata document.
pub const DOCUMENT_NAME: &str = "metadata.json";

const LOCK_NAME: &str = ".metadata.json.lock";

/// [`MetadataStore`] keeping one JSON document per container folder.
///
/// Container ids are folder paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStore;

impl FileStore {
    pub fn new() -> Self {
        Self
    }

    pub fn document_path(container: &str) -> PathBuf {
        Path::new(container).join(DOCUMENT_NAME)
    }

    fn load(container: &str) -> Result<RecordMap, MetadataError> {
        let path = Self::document_path(container);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(RecordMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(RecordMap::new());
        }
        let doc: Document = serde_json::from_str(&content)
            .map_err(|source| MetadataError::Malformed { path, source })?;
        Ok(doc.into_records())
    }

    fn store(container: &str, records: &RecordMap) -> Result<(), MetadataError> {
        let dir = Path::new(container);
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(Self::document_path(container))
            .map_err(|e| MetadataError::Io(e.error))?;
        Ok(())
    }

    /// Run a load-modify-store cycle under the container lock.
    fn modify<T>(
        container: &str,
        f: impl FnOnce(&mut RecordMap) -> T,
    ) -> Result<T, MetadataError> {
        let _lock = ContainerLock::acquire(Path::new(container))?;
        let mut records = Self::load(container)?;
        let out = f(&mut records);
        Self::store(container, &records)?;
        Ok(out)
    }
}

impl MetadataStore for FileStore {
    fn get(&self, container: &str) -> Result<RecordMap, MetadataError> {
        Self::load(container)
    }

    fn upsert(
        &self,
        container: &str,
        key: &str,
        patch: &MetadataRecord,
    ) -> Result<MetadataRecord, MetadataError> {
        let merged = Self::modify(container, |records| {
            let entry = records.entry(key.to_string()).or_default();
            entry.merge(patch);
            entry.clone()
        })?;
        tracing::debug!("metadata upsert {container}/{key} (file)");
        Ok(merged)
    }

    fn delete(&self, container: &str, key: &str) -> Result<bool, MetadataError> {
        let _lock = match ContainerLock::acquire(Path::new(container)) {
            Ok(lock) => lock,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let mut records = Self::load(container)?;
        let removed = records.remove(key).is_some();
        if removed {
            Self::store(container, &records)?;
        }
        tracing::debug!("metadata delete {container}/{key} (file): removed={removed}");
        Ok(removed)
    }

    fn replace_all(&self, container: &str, records: &RecordMap) -> Result<(), MetadataError> {
        Self::modify(container, |stored| *stored = records.clone())?;
        tracing::debug!("metadata rewrite {container}: {} records (file)", records.len());
        Ok(())
    }
}

/// Exclusive lock on a container, released when dropped.
struct ContainerLock {
    file: File,
}

impl ContainerLock {
    fn acquire(dir: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(dir.join(LOCK_NAME))?;
        file.lock()?;
        Ok(Self { file })
    }
}

impl Drop for ContainerLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("failed to release metadata lock: {e}");
        }
    }
}

/// On-disk shapes accepted when reading.
#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Legacy(LegacyDocument),
    Keyed(RecordMap),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LegacyDocument {
    items: Vec<LegacyEntry>,
}

#[derive(Deserialize)]
struct LegacyEntry {
    file: String,
    #[serde(flatten)]
    record: MetadataRecord,
}

impl Document {
    fn into_records(self) -> RecordMap {
        match self {
            Document::Keyed(records) => records,
            Document::Legacy(doc) => {
                let mut records = RecordMap::new();
                for entry in doc.items {
                    records
                        .entry(entry.file)
                        .or_default()
                        .merge(&non_empty(entry.record));
                }
                records
            }
        }
    }
}

/// Upload forms submit empty strings for untouched fields.
fn non_empty(record: MetadataRecord) -> MetadataRecord {
    let keep = |v: Option<String>| v.filter(|s| !s.is_empty());
    MetadataRecord {
        caption: keep(record.caption),
        description: keep(record.description),
        alt: keep(record.alt),
        custom_url: keep(record.custom_url),
        custom_target: keep(record.custom_target),
    }
}
