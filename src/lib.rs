//! # Gallery Source
//!
//! Resolves image galleries from pluggable sources, persists editor metadata
//! per item, and computes the facet filters offered next to a gallery.
//!
//! # Architecture: Stateless Resolution
//!
//! A gallery is a [`config::GalleryConfig`]. Resolving it is one pure pass
//! over the backing stores; nothing is cached between resolutions:
//!
//! ```text
//! config.toml ─▶ GalleryConfig ─▶ SourceConfig::resolve ─▶ tag ─▶ caption ─▶ sort ─▶ Gallery
//!                                       │                                              │
//!                   folder / tag_set / category_set / query                        facets
//! ```
//!
//! The stores are traits ([`store::ContentStore`], [`store::TaxonomyStore`],
//! [`store::ImageLister`], [`metadata::MetadataStore`]) so the same resolvers
//! run against the bundled JSON [`catalog`], the filesystem, or test doubles.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`source`] | Source configs and the four resolvers that turn them into items |
//! | [`gallery`] | Orchestration: resolve, tag, caption, sort, facets, paging |
//! | [`metadata`] | Per-item metadata in `metadata.json` documents or SQLite |
//! | [`facets`] | Facet tallies, min/limit policy, size and opacity weights |
//! | [`filter`] | Filtering settings, client options, selection state transitions |
//! | [`caption`] | Custom caption templates |
//! | [`thumbnails`] | Thumbnail cropping settings and resize arguments |
//! | [`config`] | Layered `config.toml` loading, `--set` overrides, validation |
//! | [`store`] | Store traits and the filesystem image lister |
//! | [`catalog`] | JSON-backed content and taxonomy store |
//! | [`types`] | The normalized [`types::MediaItem`] every resolver produces |
//! | [`naming`] | Image extensions, display titles, filename ordering |
//! | [`output`] | CLI output formatting |
//!
//! # Failure Model
//!
//! A resolver either fails as a whole ([`source::ResolveError`]) or succeeds
//! with every item it could build. A single bad item (unreadable image,
//! vanished attachment) never fails the gallery: it is logged and listed in
//! [`gallery::Gallery::skipped`].

pub mod caption;
pub mod catalog;
pub mod config;
pub mod facets;
pub mod filter;
pub mod gallery;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod source;
pub mod store;
pub mod thumbnails;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
