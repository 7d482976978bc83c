//! Folder resolver: image files in a directory, joined with stored metadata.
//!
//! ```text
//! gallery-a/               container id = "gallery-a" (see [`container_id`])
//! ├── metadata.json        only with `metadata = "file"`
//! ├── 010-dawn.jpg         key "010-dawn.jpg", title "dawn"
//! └── trips/
//!     └── x.jpg            key "trips/x.jpg" (recursive only)
//! ```
//!
//! Items come back in lister order. Dimensions are read from the image
//! headers in parallel; a file whose header cannot be read keeps
//! `dimensions = None` rather than being dropped.

use super::{FolderSource, ResolveError, Resolved, Stores};
use crate::metadata::MetadataRecord;
use crate::naming;
use crate::store::StoreError;
use crate::types::{Dimensions, MediaItem, SourceKind};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Component, Path, PathBuf};

pub(crate) fn resolve(
    source: &FolderSource,
    stores: &Stores<'_>,
) -> Result<Resolved, ResolveError> {
    let root = Path::new(&source.path);
    let files = stores
        .lister
        .list_image_files(root, source.recursive)
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ResolveError::NotFound(source.path.clone()),
            _ => StoreError::new("filesystem", format!("{}: {e}", source.path)).into(),
        })?;

    let container = container_id(&source.path);
    let container = container.as_str();
    let records = stores.metadata(source.metadata)?.get(container)?;

    let mut resolved = Resolved::default();
    let mut entries: Vec<(PathBuf, String)> = Vec::with_capacity(files.len());
    for path in files {
        match item_key(root, &path) {
            Some(key) => entries.push((path, key)),
            None => resolved.skip(path.to_string_lossy(), "path is not valid UTF-8"),
        }
    }

    resolved.items = entries
        .into_par_iter()
        .map(|(path, key)| {
            let mut item = folder_item(container, &path, key);
            if let Some(record) = records.get(&item.key) {
                apply_record(&mut item, record);
            }
            item
        })
        .collect();
    Ok(resolved)
}

/// Canonical spelling of a folder path, used as its metadata container id.
///
/// `gallery/`, `gallery/.` and `./gallery` all name the container `gallery`.
pub fn container_id(path: &str) -> String {
    let canonical: PathBuf = Path::new(path.trim())
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if canonical.as_os_str().is_empty() {
        return ".".to_string();
    }
    canonical.to_string_lossy().to_string()
}

/// Stable item id: a short digest of container and key.
pub fn item_id(container: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(container.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

/// `/`-joined path of `path` relative to `root`.
fn item_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel
        .components()
        .map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    let parts = parts?;
    (!parts.is_empty()).then(|| parts.join("/"))
}

fn folder_item(container: &str, path: &Path, key: String) -> MediaItem {
    let filename = key.rsplit('/').next().unwrap_or(&key).to_string();
    let dimensions = match image::image_dimensions(path) {
        Ok((width, height)) => Some(Dimensions { width, height }),
        Err(e) => {
            tracing::debug!("no dimensions for {}: {e}", path.display());
            None
        }
    };
    MediaItem {
        id: item_id(container, &key),
        source: SourceKind::Folder,
        title: naming::display_title(&filename),
        url: path.to_string_lossy().to_string(),
        filename,
        key,
        dimensions,
        ..Default::default()
    }
}

fn apply_record(item: &mut MediaItem, record: &MetadataRecord) {
    item.caption = record.caption.clone();
    item.description = record.description.clone();
    item.alt = record.alt.clone();
    item.custom_url = record.custom_url.clone();
    item.custom_target = record.custom_target.clone();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::metadata::{DatabaseStore, FileStore, MetadataStore, StorageMode};
    use crate::source::SourceConfig;
    use crate::store::{FsLister, ImageLister};
    use crate::test_helpers::write_image;
    use std::fs;
    use tempfile::TempDir;

    fn folder(tmp: &TempDir, recursive: bool) -> FolderSource {
        FolderSource {
            path: tmp.path().to_string_lossy().to_string(),
            recursive,
            metadata: StorageMode::File,
        }
    }

    fn resolve_with(
        source: &FolderSource,
        lister: &dyn ImageLister,
    ) -> Result<Resolved, ResolveError> {
        let catalog = Catalog::default();
        let stores = Stores {
            content: &catalog,
            taxonomy: &catalog,
            lister,
            file_metadata: &FileStore,
            database_metadata: None,
        };
        resolve(source, &stores)
    }

    fn resolve_in_database(path: String, db: &DatabaseStore) -> Resolved {
        let catalog = Catalog::default();
        let stores = Stores {
            content: &catalog,
            taxonomy: &catalog,
            lister: &FsLister,
            file_metadata: &FileStore,
            database_metadata: Some(db as &dyn MetadataStore),
        };
        let source = FolderSource {
            path,
            recursive: false,
            metadata: StorageMode::Database,
        };
        resolve(&source, &stores).unwrap()
    }

    // =========================================================================
    // Listing
    // =========================================================================

    #[test]
    fn lists_images_with_keys_and_titles() {
        let tmp = TempDir::new().unwrap();
        write_image(&tmp.path().join("010-dawn-light.jpg"), 4, 3);
        write_image(&tmp.path().join("b.png"), 2, 2);
        fs::write(tmp.path().join("readme.txt"), "x").unwrap();

        let resolved = resolve_with(&folder(&tmp, false), &FsLister).unwrap();
        let keys: Vec<&str> = resolved.items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["010-dawn-light.jpg", "b.png"]);
        assert_eq!(resolved.items[0].title.as_deref(), Some("dawn light"));
        assert_eq!(
            resolved.items[0].dimensions,
            Some(Dimensions { width: 4, height: 3 })
        );
        assert!(resolved.items.iter().all(|i| i.source == SourceKind::Folder));
        assert!(resolved.skipped.is_empty());
    }

    #[test]
    fn unreadable_header_keeps_item_without_dimensions() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.jpg"), "not an image").unwrap();

        let resolved = resolve_with(&folder(&tmp, false), &FsLister).unwrap();
        assert_eq!(resolved.items.len(), 1);
        assert_eq!(resolved.items[0].dimensions, None);
    }

    #[test]
    fn recursive_keys_use_forward_slashes() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("trips/2024")).unwrap();
        fs::write(tmp.path().join("trips/2024/x.jpg"), "x").unwrap();

        let resolved = resolve_with(&folder(&tmp, true), &FsLister).unwrap();
        assert_eq!(resolved.items[0].key, "trips/2024/x.jpg");
        assert_eq!(resolved.items[0].filename, "x.jpg");
    }

    #[test]
    fn missing_folder_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let source = FolderSource {
            path: tmp.path().join("gone").to_string_lossy().to_string(),
            ..folder(&tmp, false)
        };
        let result = resolve_with(&source, &FsLister);
        assert!(matches!(result, Err(ResolveError::NotFound(_))));
    }

    #[test]
    fn lister_failure_is_store_unavailable() {
        struct Failing;
        impl ImageLister for Failing {
            fn list_image_files(&self, _: &Path, _: bool) -> io::Result<Vec<PathBuf>> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            }
        }
        let tmp = TempDir::new().unwrap();
        let result = resolve_with(&folder(&tmp, false), &Failing);
        assert!(matches!(result, Err(ResolveError::StoreUnavailable(_))));
    }

    // =========================================================================
    // Metadata join
    // =========================================================================

    #[test]
    fn joins_file_metadata_by_key() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.jpg"), "x").unwrap();
        fs::write(tmp.path().join("b.jpg"), "x").unwrap();
        let source = folder(&tmp, false);
        FileStore
            .upsert(
                &source.path,
                "b.jpg",
                &MetadataRecord {
                    caption: Some("Dusk".into()),
                    custom_target: Some("_blank".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let resolved = resolve_with(&source, &FsLister).unwrap();
        assert_eq!(resolved.items[0].caption, None);
        assert_eq!(resolved.items[1].caption.as_deref(), Some("Dusk"));
        assert_eq!(resolved.items[1].custom_target.as_deref(), Some("_blank"));
    }

    #[test]
    fn database_mode_without_database_is_invalid() {
        let tmp = TempDir::new().unwrap();
        let source = FolderSource {
            metadata: StorageMode::Database,
            ..folder(&tmp, false)
        };
        let result = resolve_with(&source, &FsLister);
        assert!(matches!(result, Err(ResolveError::InvalidConfig(_))));
    }

    #[test]
    fn resolve_through_source_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.jpg"), "x").unwrap();
        let catalog = Catalog::default();
        let stores = Stores {
            content: &catalog,
            taxonomy: &catalog,
            lister: &FsLister,
            file_metadata: &FileStore,
            database_metadata: None,
        };
        let resolved = SourceConfig::Folder(folder(&tmp, false))
            .resolve(&stores)
            .unwrap();
        assert_eq!(resolved.items.len(), 1);
    }

    #[test]
    fn database_metadata_joins_across_path_spellings() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.jpg"), "x").unwrap();
        let base = tmp.path().to_string_lossy().to_string();
        let db = DatabaseStore::in_memory().unwrap();
        db.upsert(
            &container_id(&base),
            "a.jpg",
            &MetadataRecord {
                caption: Some("c".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let plain = resolve_in_database(base.clone(), &db);
        let slashed = resolve_in_database(format!("{base}/"), &db);
        let dotted = resolve_in_database(format!("{base}/./"), &db);
        for resolved in [&plain, &slashed, &dotted] {
            assert_eq!(resolved.items[0].caption.as_deref(), Some("c"));
            assert_eq!(resolved.items[0].id, plain.items[0].id);
        }
    }

    // =========================================================================
    // Ids
    // =========================================================================

    #[test]
    fn container_id_drops_trailing_separators_and_dots() {
        assert_eq!(container_id("/srv/gallery"), "/srv/gallery");
        assert_eq!(container_id("/srv/gallery/"), "/srv/gallery");
        assert_eq!(container_id("/srv/./gallery/."), "/srv/gallery");
        assert_eq!(container_id("./gallery"), "gallery");
        assert_eq!(container_id("."), ".");
        assert_eq!(container_id("./"), ".");
    }

    #[test]
    fn item_ids_are_stable_and_scoped_to_container() {
        assert_eq!(item_id("/g", "a.jpg"), item_id("/g", "a.jpg"));
        assert_ne!(item_id("/g", "a.jpg"), item_id("/h", "a.jpg"));
        assert_ne!(item_id("/g", "a.jpg"), item_id("/g", "b.jpg"));
        assert_eq!(item_id("/g", "a.jpg").len(), 16);
    }
}
