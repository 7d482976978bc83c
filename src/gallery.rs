//! Resolution orchestrator.
//!
//! [`resolve_gallery`] turns one gallery's settings into everything the
//! renderer needs, in a single stateless pass:
//!
//! ```text
//! SourceConfig ──resolve──▶ items ──tag──▶ captions ──sort──▶ items
//!                                                             │
//!                          facets (full set, policy) ◀────────┘
//! ```
//!
//! Resolver errors are returned unchanged, so "no images" (an empty
//! [`Gallery`]) stays distinguishable from "resolution failed". Nothing is
//! cached between calls.

use crate::config::GalleryConfig;
use crate::facets::{FacetDefinition, compute_facets};
use crate::filter::{FilterState, FilteringOptions, apply_filter};
use crate::naming;
use crate::source::{ResolveError, SkippedItem, Stores};
use crate::store::{AttachmentId, TaxonomyStore};
use crate::thumbnails::{ResizeArgs, resize_args};
use crate::types::{FacetTag, MediaItem, SourceKind};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Item order applied after resolution. Every sort is stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    /// Keep resolver order.
    #[default]
    #[serde(alias = "default")]
    Source,
    Filename,
    #[serde(alias = "filename-desc")]
    FilenameDesc,
    Caption,
    /// By `MediaItem::sort_value`; items without one go last.
    SortField,
}

/// Which slice of the sorted items to return. `page` counts from 1;
/// `page_size` 0 means everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagingHint {
    pub page: usize,
    pub page_size: usize,
}

/// One resolved gallery.
#[derive(Debug, Serialize)]
pub struct Gallery {
    pub source: SourceKind,
    pub items: Vec<MediaItem>,
    /// Facets of the filtering taxonomy as displayed, counted over all items.
    pub facets: Vec<FacetDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtering: Option<FilteringOptions>,
    pub thumbnail: ResizeArgs,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedItem>,
}

impl Gallery {
    pub fn page(&self, hint: PagingHint) -> &[MediaItem] {
        if hint.page_size == 0 {
            return &self.items;
        }
        let start = hint
            .page
            .saturating_sub(1)
            .saturating_mul(hint.page_size)
            .min(self.items.len());
        let end = start.saturating_add(hint.page_size).min(self.items.len());
        &self.items[start..end]
    }

    pub fn filter(&self, state: &FilterState) -> Vec<&MediaItem> {
        apply_filter(&self.items, state)
    }
}

pub fn resolve_gallery(
    config: &GalleryConfig,
    stores: &Stores<'_>,
) -> Result<Gallery, ResolveError> {
    let resolved = config.source.resolve(stores)?;
    let mut items = resolved.items;

    let taxonomy = config.filtering.taxonomy.as_str();
    if config.source.kind() != SourceKind::Folder {
        tag_items(&mut items, stores.taxonomy, taxonomy);
    }
    config.captions.apply(&mut items);
    sort_items(&mut items, config.sort);

    let facets = config
        .filtering
        .facet_policy()
        .surface(compute_facets(&items, taxonomy));

    tracing::debug!(
        "gallery resolved: {} items, {} facets, {} skipped",
        items.len(),
        facets.len(),
        resolved.skipped.len()
    );
    Ok(Gallery {
        source: config.source.kind(),
        items,
        facets,
        filtering: config.filtering.options(),
        thumbnail: resize_args(&config.thumbnails),
        skipped: resolved.skipped,
    })
}

/// Attach each item's terms in `taxonomy` as facet tags. A failed lookup
/// leaves that item untagged.
fn tag_items(items: &mut [MediaItem], store: &dyn TaxonomyStore, taxonomy: &str) {
    if !store.has_taxonomy(taxonomy) {
        tracing::debug!("filtering taxonomy '{taxonomy}' not present, items stay untagged");
        return;
    }
    items.par_iter_mut().for_each(|item| {
        let Ok(id) = item.key.parse::<AttachmentId>() else {
            return;
        };
        match store.terms_for_item(id, taxonomy) {
            Ok(terms) => {
                for term in terms {
                    item.add_tag(FacetTag {
                        taxonomy: taxonomy.to_string(),
                        key: term.slug,
                        label: term.name,
                    });
                }
            }
            Err(e) => tracing::warn!("no facet tags for item {}: {e}", item.id),
        }
    });
}

fn by_filename(a: &MediaItem, b: &MediaItem) -> Ordering {
    naming::compare_filenames(&a.filename, &b.filename).then_with(|| a.key.cmp(&b.key))
}

/// Present values first, compared case-insensitively.
fn by_optional_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_items(items: &mut [MediaItem], sort: SortOption) {
    match sort {
        SortOption::Source => {}
        SortOption::Filename => items.sort_by(by_filename),
        SortOption::FilenameDesc => items.sort_by(|a, b| by_filename(b, a)),
        SortOption::Caption => {
            items.sort_by(|a, b| by_optional_text(a.caption.as_deref(), b.caption.as_deref()))
        }
        SortOption::SortField => items.sort_by(|a, b| {
            by_optional_text(a.sort_value.as_deref(), b.sort_value.as_deref())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterMode, FilterType};
    use crate::metadata::{FileStore, MetadataRecord, MetadataStore, StorageMode};
    use crate::source::{FolderSource, SourceConfig, TagSource};
    use crate::store::FsLister;
    use crate::test_helpers::*;

    fn named(filename: &str, key: &str) -> MediaItem {
        MediaItem {
            filename: filename.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    fn run(config: &GalleryConfig) -> Result<Gallery, ResolveError> {
        let catalog = sample_catalog();
        let stores = Stores {
            content: &catalog,
            taxonomy: &catalog,
            lister: &FsLister,
            file_metadata: &FileStore,
            database_metadata: None,
        };
        resolve_gallery(config, &stores)
    }

    fn folder_config(path: &str, sort: SortOption) -> GalleryConfig {
        GalleryConfig {
            source: SourceConfig::Folder(FolderSource {
                path: path.to_string(),
                recursive: false,
                metadata: StorageMode::File,
            }),
            sort,
            ..Default::default()
        }
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    #[test]
    fn filename_sorts_are_mutually_reverse() {
        let base = vec![named("b.jpg", "b"), named("C.jpg", "C"), named("a.jpg", "a")];
        let mut asc = base.clone();
        sort_items(&mut asc, SortOption::Filename);
        let mut desc = base;
        sort_items(&mut desc, SortOption::FilenameDesc);

        assert_eq!(item_keys(&asc), vec!["a", "b", "C"]);
        let mut reversed = item_keys(&desc);
        reversed.reverse();
        assert_eq!(item_keys(&asc), reversed);
    }

    #[test]
    fn filename_ties_break_on_key() {
        let mut items = vec![named("x.jpg", "trips/x.jpg"), named("x.jpg", "home/x.jpg")];
        sort_items(&mut items, SortOption::Filename);
        assert_eq!(item_keys(&items), vec!["home/x.jpg", "trips/x.jpg"]);
    }

    #[test]
    fn caption_sort_is_stable_and_puts_missing_last() {
        let captioned = |key: &str, caption: Option<&str>| MediaItem {
            key: key.into(),
            caption: caption.map(String::from),
            ..Default::default()
        };
        let mut items = vec![
            captioned("1", Some("b")),
            captioned("2", None),
            captioned("3", Some("A")),
            captioned("4", Some("B")),
        ];
        sort_items(&mut items, SortOption::Caption);
        assert_eq!(item_keys(&items), vec!["3", "1", "4", "2"]);
    }

    #[test]
    fn source_order_is_untouched() {
        let mut items = vec![named("b.jpg", "b"), named("a.jpg", "a")];
        sort_items(&mut items, SortOption::Source);
        assert_eq!(item_keys(&items), vec!["b", "a"]);
    }

    // =========================================================================
    // resolve_gallery
    // =========================================================================

    #[test]
    fn folder_gallery_sorted_by_filename() {
        let tmp = setup_folder(&["b.jpg", "a.jpg"]);
        let path = tmp.path().to_string_lossy().to_string();
        let gallery = run(&folder_config(&path, SortOption::FilenameDesc)).unwrap();
        assert_eq!(item_keys(&gallery.items), vec!["b.jpg", "a.jpg"]);
        assert!(gallery.facets.is_empty());
        assert!(gallery.filtering.is_none());
    }

    #[test]
    fn missing_folder_surfaces_error() {
        let tmp = setup_folder(&[]);
        let path = tmp.path().join("gone").to_string_lossy().to_string();
        let result = run(&folder_config(&path, SortOption::Filename));
        assert!(matches!(result, Err(ResolveError::NotFound(_))));
    }

    #[test]
    fn custom_captions_render_before_sorting() {
        let tmp = setup_folder(&["a.jpg", "b.jpg"]);
        let path = tmp.path().to_string_lossy().to_string();
        FileStore
            .upsert(
                &path,
                "a.jpg",
                &MetadataRecord {
                    caption: Some("zulu".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let mut config = folder_config(&path, SortOption::Caption);
        config.captions.kind = crate::caption::CaptionType::Custom;
        config.captions.template = "{{caption}}{{title}}".into();

        let gallery = run(&config).unwrap();
        // "b" has no stored caption and would sort last without the template.
        assert_eq!(item_captions(&gallery.items), vec![Some("b"), Some("zulua")]);
    }

    #[test]
    fn tag_gallery_carries_tags_and_facets() {
        let mut config = GalleryConfig {
            source: SourceConfig::TagSet(TagSource {
                terms: vec![1, 2],
                ..Default::default()
            }),
            ..Default::default()
        };
        config.filtering.kind = FilterType::Tags;
        config.filtering.mode = FilterMode::Union;

        let gallery = run(&config).unwrap();
        assert!(gallery.items.iter().all(|i| i.source == SourceKind::TagSet));
        let beach = find_item(&gallery.items, "11");
        assert_eq!(beach.tag_labels("media_tag"), vec!["Sea", "Sky"]);

        let facets: Vec<(&str, usize)> = gallery
            .facets
            .iter()
            .map(|f| (f.key.as_str(), f.count))
            .collect();
        assert_eq!(facets, vec![("sea", 2), ("sky", 2), ("forest", 1)]);
        assert_eq!(gallery.filtering.as_ref().unwrap().mode, FilterMode::Union);

        let state = FilterState::with_active(FilterMode::Union, ["forest"]);
        let visible: Vec<&str> = gallery.filter(&state).iter().map(|i| i.key.as_str()).collect();
        assert_eq!(visible, vec!["12"]);
    }

    #[test]
    fn facets_ignore_paging() {
        let config = GalleryConfig {
            source: SourceConfig::TagSet(TagSource {
                terms: vec![1, 2],
                ..Default::default()
            }),
            ..Default::default()
        };
        let gallery = run(&config).unwrap();
        let page = gallery.page(PagingHint { page: 2, page_size: 2 });
        assert_eq!(page.len(), 1);
        assert_eq!(gallery.facets.iter().map(|f| f.count).sum::<usize>(), 5);
    }

    // =========================================================================
    // Paging
    // =========================================================================

    #[test]
    fn page_slices_and_clamps() {
        let gallery = Gallery {
            source: SourceKind::Folder,
            items: (0..5).map(|i| named("x.jpg", &i.to_string())).collect(),
            facets: Vec::new(),
            filtering: None,
            thumbnail: ResizeArgs::default(),
            skipped: Vec::new(),
        };
        let keys = |hint| item_keys(gallery.page(hint)).join(",");
        assert_eq!(keys(PagingHint { page: 1, page_size: 2 }), "0,1");
        assert_eq!(keys(PagingHint { page: 3, page_size: 2 }), "4");
        assert_eq!(keys(PagingHint { page: 9, page_size: 2 }), "");
        assert_eq!(keys(PagingHint { page: 0, page_size: 0 }), "0,1,2,3,4");
    }
}
