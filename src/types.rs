//! Shared types produced by resolution and consumed by the facet engine and
//! the rendering layer.
//!
//! A [`MediaItem`] is created by exactly one resolver during one resolution
//! pass. It is serialized as-is for the renderer, so the field names here are
//! the data contract.

use serde::{Deserialize, Serialize};

/// Which resolver produced an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Folder,
    TagSet,
    CategorySet,
    Query,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Folder => "folder",
            SourceKind::TagSet => "tag_set",
            SourceKind::CategorySet => "category_set",
            SourceKind::Query => "query",
        }
    }
}

/// Pixel dimensions of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A filterable attribute carried by an item.
///
/// `key` is the stable facet identity (the term slug); `label` is what the
/// filter button shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetTag {
    pub taxonomy: String,
    pub key: String,
    pub label: String,
}

/// One normalized image in a resolved gallery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// External identity: attachment id for taxonomy/query items, a digest of
    /// `(container, key)` for folder items.
    pub id: String,
    pub source: SourceKind,
    /// Resolver-local key. Relative path for folder items, attachment id otherwise.
    pub key: String,
    /// Bare filename used by the filename sorts.
    pub filename: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,
    /// Value used by the `sort_field` sort option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    /// Post the item was extracted from (query resolver only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_post: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<FacetTag>,
    /// Free-form attachment meta, exposed to caption templates as `postmeta.*`.
    #[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub meta: std::collections::BTreeMap<String, String>,
}

impl MediaItem {
    /// Add a facet tag unless one with the same taxonomy and key is present.
    /// Insertion order is preserved.
    pub fn add_tag(&mut self, tag: FacetTag) {
        let exists = self
            .tags
            .iter()
            .any(|t| t.taxonomy == tag.taxonomy && t.key == tag.key);
        if !exists {
            self.tags.push(tag);
        }
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.iter().any(|t| t.key == key)
    }

    /// Tag labels in the given taxonomy, the shape the client filter reads.
    pub fn tag_labels(&self, taxonomy: &str) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|t| t.taxonomy == taxonomy)
            .map(|t| t.label.as_str())
            .collect()
    }
}
