//! JSON snapshot of CMS content.
//!
//! A [`Catalog`] holds the posts, attachments and attachment taxonomies a
//! gallery may draw from, and answers the [`ContentStore`] and
//! [`TaxonomyStore`] queries against them. The CLI loads one from disk; tests
//! build them inline.
//!
//! ```json
//! {
//!   "taxonomies": {
//!     "media_tag": [{ "id": 1, "slug": "sea", "name": "Sea" }]
//!   },
//!   "attachments": [
//!     { "id": 10, "url": "https://cdn/10.jpg", "filename": "10.jpg",
//!       "terms": { "media_tag": [1] } }
//!   ],
//!   "posts": [
//!     { "id": 7, "post_type": "post", "title": "Hello",
//!       "attachments": [10], "terms": { "category": ["news"] } }
//!   ]
//! }
//! ```
//!
//! Posts are returned newest first (`date` descending, then id descending).

use crate::store::{
    Attachment, AttachmentId, CombineMode, ContentStore, Post, PostQuery, StoreError,
    TaxonomyStore, Term, TermId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub taxonomies: BTreeMap<String, Vec<Term>>,
    pub attachments: Vec<CatalogAttachment>,
    pub posts: Vec<CatalogPost>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogAttachment {
    #[serde(flatten)]
    pub attachment: Attachment,
    /// Term ids per taxonomy.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub terms: BTreeMap<String, Vec<TermId>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogPost {
    #[serde(flatten)]
    pub post: Post,
    /// Attached images, first one is the post's gallery image.
    #[serde(default)]
    pub attachments: Vec<AttachmentId>,
    /// Term slugs per taxonomy.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub terms: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let catalog: Catalog =
            serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(
            "loaded catalog {}: {} posts, {} attachments, {} taxonomies",
            path.display(),
            catalog.posts.len(),
            catalog.attachments.len(),
            catalog.taxonomies.len()
        );
        Ok(catalog)
    }

    fn find_attachment(&self, id: AttachmentId) -> Option<&CatalogAttachment> {
        self.attachments.iter().find(|a| a.attachment.id == id)
    }

    fn taxonomy(&self, taxonomy: &str) -> Result<&[Term], StoreError> {
        self.taxonomies
            .get(taxonomy)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::new("catalog", format!("unknown taxonomy '{taxonomy}'")))
    }
}

impl ContentStore for Catalog {
    fn query_posts(&self, query: &PostQuery<'_>) -> Result<Vec<Post>, StoreError> {
        let mut posts: Vec<&Post> = self
            .posts
            .iter()
            .filter(|p| p.post.post_type == query.post_type)
            .filter(|p| !query.exclude.contains(&p.post.id))
            .filter(|p| match query.taxonomy {
                Some(filter) => p
                    .terms
                    .get(&filter.taxonomy)
                    .is_some_and(|slugs| slugs.iter().any(|s| *s == filter.term)),
                None => true,
            })
            .map(|p| &p.post)
            .collect();
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        Ok(posts.into_iter().take(query.limit).cloned().collect())
    }

    fn first_attachment(&self, post: &Post) -> Result<Option<Attachment>, StoreError> {
        let Some(entry) = self.posts.iter().find(|p| p.post.id == post.id) else {
            return Ok(None);
        };
        Ok(entry
            .attachments
            .iter()
            .find_map(|id| self.find_attachment(*id))
            .map(|a| a.attachment.clone()))
    }

    fn attachment(&self, id: AttachmentId) -> Result<Option<Attachment>, StoreError> {
        Ok(self.find_attachment(id).map(|a| a.attachment.clone()))
    }
}

impl TaxonomyStore for Catalog {
    fn has_taxonomy(&self, taxonomy: &str) -> bool {
        self.taxonomies.contains_key(taxonomy)
    }

    fn terms_for_item(&self, item: AttachmentId, taxonomy: &str) -> Result<Vec<Term>, StoreError> {
        let terms = self.taxonomy(taxonomy)?;
        let Some(ids) = self.find_attachment(item).and_then(|a| a.terms.get(taxonomy)) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| terms.iter().find(|t| t.id == *id))
            .cloned()
            .collect())
    }

    fn items_for_terms(
        &self,
        taxonomy: &str,
        terms: &[TermId],
        mode: CombineMode,
    ) -> Result<Vec<AttachmentId>, StoreError> {
        self.taxonomy(taxonomy)?;
        let matches = |assigned: &[TermId]| match mode {
            CombineMode::Union => terms.iter().any(|t| assigned.contains(t)),
            CombineMode::Intersect => terms.iter().all(|t| assigned.contains(t)),
        };
        Ok(self
            .attachments
            .iter()
            .filter(|a| a.terms.get(taxonomy).is_some_and(|ids| matches(ids)))
            .map(|a| a.attachment.id)
            .collect())
    }

    fn descendants(&self, taxonomy: &str, term: TermId) -> Result<Vec<TermId>, StoreError> {
        let terms = self.taxonomy(taxonomy)?;
        let mut found = Vec::new();
        let mut seen = BTreeSet::from([term]);
        let mut frontier = vec![term];
        while let Some(parent) = frontier.pop() {
            for child in terms.iter().filter(|t| t.parent == Some(parent)) {
                if seen.insert(child.id) {
                    found.push(child.id);
                    frontier.push(child.id);
                }
            }
        }
        Ok(found)
    }
}
