//! Boundary contracts for the external stores the resolvers read from.
//!
//! The CMS owns posts, attachments and taxonomies; this crate only queries
//! them through [`ContentStore`] and [`TaxonomyStore`]. Folder galleries read
//! the filesystem through [`ImageLister`], whose production implementation is
//! [`FsLister`].
//!
//! Store errors are passed through unchanged. Resolvers never retry: a slow
//! or failing backend surfaces its own error to the caller.

use crate::naming;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub type PostId = u64;
pub type TermId = u64;
pub type AttachmentId = u64;

#[derive(Error, Debug)]
#[error("{store} unavailable: {message}")]
pub struct StoreError {
    pub store: &'static str,
    pub message: String,
}

impl StoreError {
    pub fn new(store: &'static str, message: impl Into<String>) -> Self {
        Self {
            store,
            message: message.into(),
        }
    }
}

/// How several term matches combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    #[default]
    #[serde(alias = "Union")]
    Union,
    #[serde(alias = "Intersect")]
    Intersect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TermId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub id: AttachmentId,
    pub url: String,
    pub filename: String,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub description: Option<String>,
    pub alt: Option<String>,
    pub custom_url: Option<String>,
    pub custom_target: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub meta: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: PostId,
    pub post_type: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub date: String,
    pub permalink: String,
    pub menu_order: i64,
    pub meta: BTreeMap<String, String>,
}

impl Post {
    /// Look up a named post property.
    ///
    /// Canonical names (`ID`, `post_title`, `post_excerpt`, `post_content`,
    /// `post_date`, `permalink`, `menu_order`) resolve to post fields; any
    /// other name is treated as a post meta key.
    pub fn property(&self, name: &str) -> Option<String> {
        let value = match name {
            "ID" | "id" => self.id.to_string(),
            "post_title" | "title" => self.title.clone(),
            "post_excerpt" | "excerpt" => self.excerpt.clone(),
            "post_content" | "content" => self.content.clone(),
            "post_date" | "date" => self.date.clone(),
            "permalink" | "url" => self.permalink.clone(),
            // Zero-padded so lexical order matches numeric order.
            "menu_order" => format!("{:020}", self.menu_order.saturating_add(i64::MAX / 2)),
            other => return self.meta.get(other).cloned(),
        };
        Some(value)
    }
}

/// A `"taxonomy:term"` restriction on a post query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyFilter {
    pub taxonomy: String,
    pub term: String,
}

impl TaxonomyFilter {
    /// Parse the `"taxonomy:term"` form. Both halves must be non-empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let (taxonomy, term) = raw.trim().split_once(':')?;
        let (taxonomy, term) = (taxonomy.trim(), term.trim());
        if taxonomy.is_empty() || term.is_empty() {
            return None;
        }
        Some(Self {
            taxonomy: taxonomy.to_string(),
            term: term.to_string(),
        })
    }
}

/// Parameters of one content store query.
#[derive(Debug, Clone)]
pub struct PostQuery<'a> {
    pub post_type: &'a str,
    pub limit: usize,
    pub exclude: &'a [PostId],
    pub taxonomy: Option<&'a TaxonomyFilter>,
}

/// Posts and attachments owned by the CMS.
pub trait ContentStore: Sync {
    fn query_posts(&self, query: &PostQuery<'_>) -> Result<Vec<Post>, StoreError>;

    /// First eligible image attachment of a post, if it has one.
    fn first_attachment(&self, post: &Post) -> Result<Option<Attachment>, StoreError>;

    fn attachment(&self, id: AttachmentId) -> Result<Option<Attachment>, StoreError>;
}

/// Attachment taxonomies owned by the CMS.
pub trait TaxonomyStore: Sync {
    fn has_taxonomy(&self, taxonomy: &str) -> bool;

    fn terms_for_item(&self, item: AttachmentId, taxonomy: &str) -> Result<Vec<Term>, StoreError>;

    fn items_for_terms(
        &self,
        taxonomy: &str,
        terms: &[TermId],
        mode: CombineMode,
    ) -> Result<Vec<AttachmentId>, StoreError>;

    /// All terms below `term` in a hierarchical taxonomy, excluding `term`.
    fn descendants(&self, taxonomy: &str, term: TermId) -> Result<Vec<TermId>, StoreError>;
}

/// Enumerates image files under a folder.
pub trait ImageLister: Sync {
    /// Image files under `root`, in a deterministic order. A missing root is
    /// reported as `io::ErrorKind::NotFound`.
    fn list_image_files(&self, root: &Path, recursive: bool) -> io::Result<Vec<PathBuf>>;
}

/// [`ImageLister`] over the real filesystem.
///
/// Entries are visited depth-first with siblings sorted by name. Non-image
/// entries and unreadable subtrees are skipped rather than failing the walk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLister;

impl ImageLister for FsLister {
    fn list_image_files(&self, root: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
        let meta = std::fs::metadata(root)?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not a directory: {}", root.display()),
            ));
        }

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(e) if e.file_type().is_file() && naming::is_image_path(e.path()) => {
                    files.push(e.into_path());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("skipping unreadable entry under {}: {e}", root.display())
                }
            }
        }
        Ok(files)
    }
}
