//! Datasource resolvers.
//!
//! A gallery draws its images from exactly one source. [`SourceConfig`] is the
//! closed set of source kinds; [`SourceConfig::resolve`] dispatches to the
//! matching resolver and returns a normalized, ordered item list.
//!
//! | Kind | Resolver | Backing store |
//! |------|----------|---------------|
//! | `folder` | [`folder`] | filesystem + metadata store |
//! | `tag_set` | [`terms`] | taxonomy + attachments |
//! | `category_set` | [`terms`] | taxonomy + attachments |
//! | `query` | [`query`] | post query + attachments |
//!
//! ## Failure model
//!
//! Resolution-level failures (missing folder, malformed config, backing store
//! errors) are returned as [`ResolveError`]. A failure confined to one item is
//! recorded as a [`SkippedItem`] and the item is left out; it never fails the
//! whole call.
//!
//! Resolvers only read. Metadata writes go through
//! [`MetadataStore`](crate::metadata::MetadataStore) directly.

pub mod folder;
pub mod query;
pub mod terms;

use crate::metadata::{MetadataError, MetadataStore, StorageMode};
use crate::store::{
    Attachment, CombineMode, ContentStore, ImageLister, PostId, StoreError, TaxonomyStore, TermId,
};
use crate::types::{Dimensions, MediaItem, SourceKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid source config: {0}")]
    InvalidConfig(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

/// Default attachment taxonomies.
pub const TAG_TAXONOMY: &str = "media_tag";
pub const CATEGORY_TAXONOMY: &str = "media_category";

/// Which source a gallery reads from, with that source's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Folder(FolderSource),
    TagSet(TagSource),
    CategorySet(CategorySource),
    Query(QuerySource),
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Folder(FolderSource::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderSource {
    pub path: String,
    pub recursive: bool,
    pub metadata: StorageMode,
}

impl Default for FolderSource {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
            recursive: false,
            metadata: StorageMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSource {
    pub taxonomy: String,
    pub terms: Vec<TermId>,
    pub mode: CombineMode,
}

impl Default for TagSource {
    fn default() -> Self {
        Self {
            taxonomy: TAG_TAXONOMY.to_string(),
            terms: Vec::new(),
            mode: CombineMode::Union,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorySource {
    pub taxonomy: String,
    pub terms: Vec<TermId>,
    pub mode: CombineMode,
    pub include_descendants: bool,
}

impl Default for CategorySource {
    fn default() -> Self {
        Self {
            taxonomy: CATEGORY_TAXONOMY.to_string(),
            terms: Vec::new(),
            mode: CombineMode::Union,
            include_descendants: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySource {
    pub post_type: String,
    pub limit: usize,
    pub exclude: Vec<PostId>,
    /// Optional `"taxonomy:term"` restriction.
    pub taxonomy: Option<String>,
    pub overrides: PropertyOverrides,
}

impl Default for QuerySource {
    fn default() -> Self {
        Self {
            post_type: "post".to_string(),
            limit: 10,
            exclude: Vec::new(),
            taxonomy: None,
            overrides: PropertyOverrides::default(),
        }
    }
}

/// Post properties forced onto every item a query returns.
///
/// Each value names a post property; see [`Post::property`](crate::store::Post::property).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropertyOverrides {
    pub link: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub class: Option<String>,
    pub sort: Option<String>,
}

/// Everything a resolver may read from. Built once by the caller and passed
/// explicitly into every resolution.
pub struct Stores<'a> {
    pub content: &'a dyn ContentStore,
    pub taxonomy: &'a dyn TaxonomyStore,
    pub lister: &'a dyn ImageLister,
    pub file_metadata: &'a dyn MetadataStore,
    pub database_metadata: Option<&'a dyn MetadataStore>,
}

impl Stores<'_> {
    pub fn metadata(&self, mode: StorageMode) -> Result<&dyn MetadataStore, ResolveError> {
        match mode {
            StorageMode::File => Ok(self.file_metadata),
            StorageMode::Database => self.database_metadata.ok_or_else(|| {
                ResolveError::InvalidConfig("database metadata storage is not configured".into())
            }),
        }
    }
}

/// An item left out of a resolution because it alone could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    pub reference: String,
    pub reason: String,
}

/// Output of one resolver call, in resolver order.
#[derive(Debug, Default)]
pub struct Resolved {
    pub items: Vec<MediaItem>,
    pub skipped: Vec<SkippedItem>,
}

impl Resolved {
    pub(crate) fn skip(&mut self, reference: impl Into<String>, reason: impl ToString) {
        let skipped = SkippedItem {
            reference: reference.into(),
            reason: reason.to_string(),
        };
        tracing::warn!("skipping item {}: {}", skipped.reference, skipped.reason);
        self.skipped.push(skipped);
    }
}

impl SourceConfig {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceConfig::Folder(_) => SourceKind::Folder,
            SourceConfig::TagSet(_) => SourceKind::TagSet,
            SourceConfig::CategorySet(_) => SourceKind::CategorySet,
            SourceConfig::Query(_) => SourceKind::Query,
        }
    }

    /// Reject parameter combinations no resolver can act on.
    pub fn validate(&self) -> Result<(), ResolveError> {
        let invalid = |msg: &str| Err(ResolveError::InvalidConfig(msg.to_string()));
        match self {
            SourceConfig::Folder(f) if f.path.trim().is_empty() => invalid("folder path is empty"),
            SourceConfig::TagSet(t) if t.taxonomy.trim().is_empty() => invalid("taxonomy is empty"),
            SourceConfig::TagSet(t) if t.terms.is_empty() => invalid("no terms selected"),
            SourceConfig::CategorySet(c) if c.taxonomy.trim().is_empty() => {
                invalid("taxonomy is empty")
            }
            SourceConfig::CategorySet(c) if c.terms.is_empty() => invalid("no terms selected"),
            SourceConfig::Query(q) if q.post_type.trim().is_empty() => {
                invalid("post type is empty")
            }
            SourceConfig::Query(q) if q.limit == 0 => invalid("query limit must be at least 1"),
            SourceConfig::Query(q) => match q.taxonomy.as_deref() {
                Some(raw) if crate::store::TaxonomyFilter::parse(raw).is_none() => Err(
                    ResolveError::InvalidConfig(format!(
                        "taxonomy filter '{raw}' is not in 'taxonomy:term' form"
                    )),
                ),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Validate, then run the resolver for this source kind.
    pub fn resolve(&self, stores: &Stores<'_>) -> Result<Resolved, ResolveError> {
        self.validate()?;
        let resolved = match self {
            SourceConfig::Folder(f) => folder::resolve(f, stores)?,
            SourceConfig::TagSet(t) => terms::resolve(
                &terms::TermQuery {
                    kind: SourceKind::TagSet,
                    taxonomy: &t.taxonomy,
                    terms: &t.terms,
                    mode: t.mode,
                    include_descendants: false,
                },
                stores,
            )?,
            SourceConfig::CategorySet(c) => terms::resolve(
                &terms::TermQuery {
                    kind: SourceKind::CategorySet,
                    taxonomy: &c.taxonomy,
                    terms: &c.terms,
                    mode: c.mode,
                    include_descendants: c.include_descendants,
                },
                stores,
            )?,
            SourceConfig::Query(q) => query::resolve(q, stores)?,
        };
        tracing::debug!(
            "resolved {} source: {} items, {} skipped",
            self.kind().as_str(),
            resolved.items.len(),
            resolved.skipped.len()
        );
        Ok(resolved)
    }
}

/// Normalize a CMS attachment into a gallery item.
pub(crate) fn attachment_item(attachment: Attachment, source: SourceKind) -> MediaItem {
    let dimensions = match (attachment.width, attachment.height) {
        (Some(width), Some(height)) => Some(Dimensions { width, height }),
        _ => None,
    };
    MediaItem {
        id: attachment.id.to_string(),
        source,
        key: attachment.id.to_string(),
        filename: attachment.filename,
        url: attachment.url,
        title: attachment.title,
        caption: attachment.caption,
        description: attachment.description,
        alt: attachment.alt,
        custom_url: attachment.custom_url,
        custom_target: attachment.custom_target,
        dimensions,
        meta: attachment.meta,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_folder_source_from_toml() {
        let source: SourceConfig = toml::from_str(
            r#"
kind = "folder"
path = "/gallery-a"
metadata = "file"
"#,
        )
        .unwrap();
        assert_eq!(
            source,
            SourceConfig::Folder(FolderSource {
                path: "/gallery-a".into(),
                recursive: false,
                metadata: StorageMode::File,
            })
        );
    }

    #[test]
    fn parses_category_source_with_defaults() {
        let source: SourceConfig = toml::from_str(
            r#"
kind = "category_set"
terms = [4, 9]
include_descendants = true
"#,
        )
        .unwrap();
        let SourceConfig::CategorySet(c) = source else {
            panic!("expected category source");
        };
        assert_eq!(c.taxonomy, CATEGORY_TAXONOMY);
        assert_eq!(c.terms, vec![4, 9]);
        assert_eq!(c.mode, CombineMode::Union);
        assert!(c.include_descendants);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let result: Result<SourceConfig, _> = toml::from_str("kind = \"instagram\"");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_empty_terms() {
        let source = SourceConfig::TagSet(TagSource::default());
        assert!(matches!(source.validate(), Err(ResolveError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_malformed_taxonomy_filter() {
        let source = SourceConfig::Query(QuerySource {
            taxonomy: Some("category".into()),
            ..Default::default()
        });
        assert!(matches!(source.validate(), Err(ResolveError::InvalidConfig(_))));
    }

    #[test]
    fn validate_accepts_defaults_with_terms() {
        let source = SourceConfig::TagSet(TagSource {
            terms: vec![1],
            ..Default::default()
        });
        assert!(source.validate().is_ok());
        assert!(SourceConfig::default().validate().is_ok());
    }

    #[test]
    fn attachment_item_keeps_dimensions_and_meta() {
        let mut attachment = Attachment {
            id: 12,
            url: "https://cdn/x.jpg".into(),
            filename: "x.jpg".into(),
            width: Some(800),
            height: Some(600),
            ..Default::default()
        };
        attachment.meta.insert("credit".into(), "AP".into());

        let item = attachment_item(attachment, SourceKind::TagSet);
        assert_eq!(item.id, "12");
        assert_eq!(item.source, SourceKind::TagSet);
        assert_eq!(item.dimensions, Some(Dimensions { width: 800, height: 600 }));
        assert_eq!(item.meta["credit"], "AP");
    }
}
