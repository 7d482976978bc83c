//! CLI output formatting for resolved galleries, filters and metadata.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not source-centric**. The primary display
//! for every item is its identity (position and title), with keys, captions
//! and tags shown as indented context lines. This makes the output readable
//! as a gallery inventory while still letting users trace items back to the
//! file or attachment they came from.
//!
//! # Output Format
//!
//! ## Resolve
//!
//! ```text
//! Gallery: tag_set (3 items)
//! 001 harbour
//!     Key: 10
//!     Caption: Morning light
//!     Tags: Sea
//! 002 (ridge.jpg)
//!     Key: 12
//!
//! Facets
//!     Sea (2) size=16.0
//!     Sky (1) size=12.0
//!
//! Skipped
//!     99: attachment no longer exists
//! ```
//!
//! ## Filter
//!
//! ```text
//! Filter: union [sea, sky] → push
//! 001 harbour
//! 002 beach
//! Showing 2 of 3 items
//! ```
//!
//! ## Metadata
//!
//! ```text
//! a.jpg
//!     Caption: Dawn
//!     Link: https://example.com (_blank)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::facets::FacetDefinition;
use crate::filter::{FilterMode, FilterTransition};
use crate::gallery::Gallery;
use crate::metadata::{MetadataRecord, RecordMap};
use crate::types::MediaItem;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an item line: titled items show title, untitled show filename in parens.
///
/// ```text
/// 001 The Sunset        // titled
/// 001 (010.jpg)         // untitled, filename IS the identity
/// ```
fn item_line(index: usize, item: &MediaItem) -> String {
    match item.title.as_deref() {
        Some(t) if !t.is_empty() => format!("{} {}", format_index(index), t),
        _ => format!("{} ({})", format_index(index), item.filename),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn item_details(item: &MediaItem, taxonomy: &str) -> Vec<String> {
    let pad = indent(1);
    let mut lines = vec![format!("{pad}Key: {}", item.key)];
    if let Some(caption) = item.caption.as_deref().filter(|c| !c.is_empty()) {
        lines.push(format!("{pad}Caption: {}", truncate(caption, 60)));
    }
    if let Some(url) = item.custom_url.as_deref() {
        match item.custom_target.as_deref() {
            Some(target) => lines.push(format!("{pad}Link: {url} ({target})")),
            None => lines.push(format!("{pad}Link: {url}")),
        }
    }
    let tags = item.tag_labels(taxonomy);
    if !tags.is_empty() {
        lines.push(format!("{pad}Tags: {}", tags.join(", ")));
    }
    lines
}

fn facet_line(facet: &FacetDefinition) -> String {
    let mut line = format!("{}{} ({})", indent(1), facet.label, facet.count);
    if let Some(size) = facet.size {
        line.push_str(&format!(" size={size:.1}"));
    }
    if let Some(opacity) = facet.opacity {
        line.push_str(&format!(" opacity={opacity:.2}"));
    }
    line
}

fn mode_name(mode: FilterMode) -> &'static str {
    match mode {
        FilterMode::Single => "single",
        FilterMode::Union => "union",
        FilterMode::Intersect => "intersect",
    }
}

// ============================================================================
// Resolve
// ============================================================================

/// Format a resolved gallery. `items` is the page to list and `offset` its
/// position in the full item list.
pub fn format_gallery_output(
    gallery: &Gallery,
    items: &[MediaItem],
    offset: usize,
    taxonomy: &str,
) -> Vec<String> {
    let mut lines = Vec::new();
    let shown = if items.len() == gallery.items.len() {
        format!("{} items", gallery.items.len())
    } else if items.is_empty() {
        format!("no items on this page, {} in total", gallery.items.len())
    } else {
        format!(
            "items {}-{} of {}",
            offset + 1,
            offset + items.len(),
            gallery.items.len()
        )
    };
    lines.push(format!("Gallery: {} ({shown})", gallery.source.as_str()));

    for (i, item) in items.iter().enumerate() {
        lines.push(item_line(offset + i + 1, item));
        lines.extend(item_details(item, taxonomy));
    }

    if !gallery.facets.is_empty() {
        lines.push(String::new());
        lines.push("Facets".to_string());
        lines.extend(gallery.facets.iter().map(facet_line));
    }

    if !gallery.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skipped in &gallery.skipped {
            lines.push(format!("{}{}: {}", indent(1), skipped.reference, skipped.reason));
        }
    }
    lines
}

pub fn print_gallery_output(gallery: &Gallery, items: &[MediaItem], offset: usize, taxonomy: &str) {
    for line in format_gallery_output(gallery, items, offset, taxonomy) {
        println!("{}", line);
    }
}

// ============================================================================
// Filter
// ============================================================================

pub fn format_filter_output(
    transition: &FilterTransition,
    visible: &[&MediaItem],
    total: usize,
) -> Vec<String> {
    let state = &transition.state;
    let history = match transition.navigation {
        crate::filter::HistoryMode::Push => "push",
        crate::filter::HistoryMode::Replace => "replace",
    };
    let mut lines = vec![format!(
        "Filter: {} [{}] → {history}",
        mode_name(state.mode),
        state.active.join(", ")
    )];
    for (i, item) in visible.iter().enumerate() {
        lines.push(item_line(i + 1, item));
    }
    lines.push(format!("Showing {} of {} items", visible.len(), total));
    lines
}

pub fn print_filter_output(transition: &FilterTransition, visible: &[&MediaItem], total: usize) {
    for line in format_filter_output(transition, visible, total) {
        println!("{}", line);
    }
}

// ============================================================================
// Metadata
// ============================================================================

fn record_lines(record: &MetadataRecord) -> Vec<String> {
    let pad = indent(1);
    let mut lines = Vec::new();
    let fields = [
        ("Caption", &record.caption),
        ("Description", &record.description),
        ("Alt", &record.alt),
    ];
    for (label, value) in fields {
        if let Some(v) = value {
            lines.push(format!("{pad}{label}: {}", truncate(v, 60)));
        }
    }
    match (&record.custom_url, &record.custom_target) {
        (Some(url), Some(target)) => lines.push(format!("{pad}Link: {url} ({target})")),
        (Some(url), None) => lines.push(format!("{pad}Link: {url}")),
        (None, Some(target)) => lines.push(format!("{pad}Target: {target}")),
        (None, None) => {}
    }
    if lines.is_empty() {
        lines.push(format!("{pad}(empty)"));
    }
    lines
}

pub fn format_metadata_output(records: &RecordMap) -> Vec<String> {
    if records.is_empty() {
        return vec!["No metadata".to_string()];
    }
    let mut lines = Vec::new();
    for (key, record) in records {
        lines.push(key.clone());
        lines.extend(record_lines(record));
    }
    lines
}

pub fn print_metadata_output(records: &RecordMap) {
    for line in format_metadata_output(records) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
