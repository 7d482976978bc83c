//! Shared test utilities for the gallery-source test suite.
//!
//! Provides fixture builders (a small CMS catalog, folders of images) and
//! lookup helpers that panic with the available names on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let catalog = sample_catalog();
//! let tmp = setup_folder(&["b.jpg", "a.jpg"]);
//!
//! let item = find_item(&gallery.items, "a.jpg");
//! assert_eq!(item_keys(&gallery.items), vec!["a.jpg", "b.jpg"]);
//! ```
//!
//! # Sample catalog
//!
//! ```text
//! media_tag:       1 sea, 2 sky, 3 forest
//! media_category:  20 travel ─ 21 europe ─ 22 france;  23 work
//! category:        30 news
//!
//! attachment  tags     category   file
//! 10          sea      travel     harbour.jpg
//! 11          sea sky  france     beach.jpg
//! 12          sky fst  work       ridge.jpg
//! 13          forest   europe     pines.jpg
//!
//! post  type  date        news  attachments
//! 101   post  2024-01-01  yes   [99 (missing), 11]
//! 102   post  2024-02-01  no    []
//! 103   post  2024-03-01  yes   [12]
//! 201   page  2024-04-01  no    [10]
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

use crate::catalog::{Catalog, CatalogAttachment, CatalogPost};
use crate::store::{Attachment, Post, Term, TermId};
use crate::types::MediaItem;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write a small solid-colour image. The format follows the extension.
pub fn write_image(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([120, 90, 60]))
        .save(path)
        .unwrap();
}

/// A temp folder holding one placeholder file per name. Contents are not
/// valid images, so items resolve without dimensions.
pub fn setup_folder(names: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for name in names {
        let path = tmp.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "placeholder").unwrap();
    }
    tmp
}

fn term(id: TermId, slug: &str, parent: Option<TermId>) -> Term {
    let mut name = slug.to_string();
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    Term {
        id,
        slug: slug.to_string(),
        name,
        parent,
    }
}

fn attachment(
    id: u64,
    filename: &str,
    tags: &[TermId],
    categories: &[TermId],
) -> CatalogAttachment {
    let mut terms = BTreeMap::new();
    terms.insert("media_tag".to_string(), tags.to_vec());
    terms.insert("media_category".to_string(), categories.to_vec());
    CatalogAttachment {
        attachment: Attachment {
            id,
            url: format!("https://cdn.example.com/{filename}"),
            filename: filename.to_string(),
            title: Some(filename.trim_end_matches(".jpg").to_string()),
            width: Some(1200),
            height: Some(800),
            ..Default::default()
        },
        terms,
    }
}

fn post(
    id: u64,
    post_type: &str,
    title: &str,
    date: &str,
    news: bool,
    attachments: &[u64],
) -> CatalogPost {
    let mut terms = BTreeMap::new();
    if news {
        terms.insert("category".to_string(), vec!["news".to_string()]);
    }
    CatalogPost {
        post: Post {
            id,
            post_type: post_type.to_string(),
            title: title.to_string(),
            date: date.to_string(),
            permalink: format!("https://example.com/{id}"),
            ..Default::default()
        },
        attachments: attachments.to_vec(),
        terms,
    }
}

/// The catalog drawn in the module docs.
pub fn sample_catalog() -> Catalog {
    let mut taxonomies = BTreeMap::new();
    taxonomies.insert(
        "media_tag".to_string(),
        vec![term(1, "sea", None), term(2, "sky", None), term(3, "forest", None)],
    );
    taxonomies.insert(
        "media_category".to_string(),
        vec![
            term(20, "travel", None),
            term(21, "europe", Some(20)),
            term(22, "france", Some(21)),
            term(23, "work", None),
        ],
    );
    taxonomies.insert("category".to_string(), vec![term(30, "news", None)]);

    let mut third = post(103, "post", "Third", "2024-03-01", true, &[12]);
    third.post.meta.insert("css".to_string(), "featured".to_string());

    Catalog {
        taxonomies,
        attachments: vec![
            attachment(10, "harbour.jpg", &[1], &[20]),
            attachment(11, "beach.jpg", &[1, 2], &[22]),
            attachment(12, "ridge.jpg", &[2, 3], &[23]),
            attachment(13, "pines.jpg", &[3], &[21]),
        ],
        posts: vec![
            post(101, "post", "First", "2024-01-01", true, &[99, 11]),
            post(102, "post", "Second", "2024-02-01", false, &[]),
            third,
            post(201, "page", "About", "2024-04-01", false, &[10]),
        ],
    }
}

// =========================================================================
// Item lookups: panics with a clear message on miss
// =========================================================================

/// Find an item by key. Panics if not found.
pub fn find_item<'a>(items: &'a [MediaItem], key: &str) -> &'a MediaItem {
    items.iter().find(|i| i.key == key).unwrap_or_else(|| {
        let keys = item_keys(items);
        panic!("item '{key}' not found. Available: {keys:?}")
    })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// All item keys in order.
pub fn item_keys(items: &[MediaItem]) -> Vec<&str> {
    items.iter().map(|i| i.key.as_str()).collect()
}

/// All item captions in order.
pub fn item_captions(items: &[MediaItem]) -> Vec<Option<&str>> {
    items.iter().map(|i| i.caption.as_deref()).collect()
}
