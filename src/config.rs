//! Gallery settings.
//!
//! A gallery is described by one TOML document: where its images come from,
//! how they are ordered, and how the filter bar, captions and thumbnails
//! behave. Settings are layered, each layer overriding the previous one:
//!
//! ```text
//! stock defaults  ──▶  gallery.toml  ──▶  --set key=value ...
//! ```
//!
//! The argument layer replaces the "current gallery arguments" a shortcode
//! would carry: one call can override any setting without touching the file.
//!
//! ## Configuration Options
//!
//! ```toml
//! sort = "source"            # source | filename | filename_desc | caption | sort_field
//!
//! [source]
//! kind = "folder"            # folder | tag_set | category_set | query
//! path = "."
//! recursive = false
//! metadata = "database"      # database | file
//!
//! [filtering]
//! type = "none"              # none | default | tags
//! taxonomy = "media_tag"
//! position = "top"           # none | top | bottom | both
//! mode = "single"            # single | union | intersect
//! history = "push"           # push | replace
//! min = 0
//! limit = 0
//! show_count = false
//! adjust_size = false
//! smallest = 12
//! largest = 16
//! adjust_opacity = false
//! lightest = 0.5
//! darkest = 1.0
//!
//! [captions]
//! type = "default"           # default | custom
//! template = ""
//!
//! [thumbnails]
//! cropping = "default"       # default | background_fill
//! background_fill = "rgb(0,0,0)"
//! ```
//!
//! Unknown keys are rejected to catch typos early, except inside `[source]`
//! where each kind reads only its own keys.

use crate::caption::CaptionConfig;
use crate::filter::FilteringConfig;
use crate::gallery::SortOption;
use crate::source::SourceConfig;
use crate::thumbnails::ThumbnailConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid override '{0}': expected KEY=VALUE")]
    Override(String),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings of one gallery.
///
/// All fields have defaults; a settings file need only name what it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    pub sort: SortOption,
    pub source: SourceConfig,
    pub filtering: FilteringConfig,
    pub captions: CaptionConfig,
    pub thumbnails: ThumbnailConfig,
}

impl GalleryConfig {
    /// Validate values are within acceptable ranges.
    ///
    /// Source parameters are checked by the resolver, which reports them as
    /// `ResolveError::InvalidConfig`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.filtering;
        if f.enabled() && f.taxonomy.trim().is_empty() {
            return Err(ConfigError::Validation(
                "filtering.taxonomy must not be empty".into(),
            ));
        }
        if f.smallest == 0 || f.smallest > f.largest {
            return Err(ConfigError::Validation(
                "filtering.smallest must be at least 1 and no larger than filtering.largest".into(),
            ));
        }
        let unit = 0.0..=1.0;
        if !unit.contains(&f.lightest) || !unit.contains(&f.darkest) || f.lightest > f.darkest {
            return Err(ConfigError::Validation(
                "filtering.lightest and filtering.darkest must satisfy 0 <= lightest <= darkest <= 1"
                    .into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - A table whose `kind` differs between the two is replaced entirely, so
///   parameters of the old source kind do not leak into the new one.
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table))
            if kind_changes(&base_table, &overlay_table) =>
        {
            toml::Value::Table(overlay_table)
        }
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

fn kind_changes(base: &toml::Table, overlay: &toml::Table) -> bool {
    match (base.get("kind"), overlay.get("kind")) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    }
}

/// Load a settings file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Turn `key.path=value` arguments into one overlay table.
///
/// Values are read as TOML (`limit=3`, `terms=[1, 2]`, `recursive=true`);
/// anything that does not parse is taken as a bare string (`mode=union`).
pub fn parse_overrides(args: &[String]) -> Result<toml::Value, ConfigError> {
    let mut overlay = toml::Value::Table(toml::Table::new());
    for arg in args {
        let (path, raw) = arg
            .split_once('=')
            .ok_or_else(|| ConfigError::Override(arg.clone()))?;
        let keys: Vec<&str> = path.trim().split('.').map(str::trim).collect();
        if keys.iter().any(|k| k.is_empty()) {
            return Err(ConfigError::Override(arg.clone()));
        }
        let mut value = parse_value(raw.trim());
        for key in keys.iter().rev() {
            let mut table = toml::Table::new();
            table.insert(key.to_string(), value);
            value = toml::Value::Table(table);
        }
        overlay = merge_toml(overlay, value);
    }
    Ok(overlay)
}

fn parse_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

/// Merge the optional layers onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    layers: impl IntoIterator<Item = Option<toml::Value>>,
) -> Result<GalleryConfig, ConfigError> {
    let merged = layers
        .into_iter()
        .flatten()
        .fold(base, merge_toml);
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load gallery settings: stock defaults, then the file (if any), then the
/// `--set` overrides in order.
pub fn load_config(
    path: Option<&Path>,
    overrides: &[String],
) -> Result<GalleryConfig, ConfigError> {
    let file = match path {
        Some(p) => Some(
            load_raw_config(p)?.ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("settings file not found: {}", p.display()),
                )
            })?,
        ),
        None => None,
    };
    let args = if overrides.is_empty() {
        None
    } else {
        Some(parse_overrides(overrides)?)
    };
    resolve_config(stock_defaults_value(), [file, args])
}

/// Returns a fully-commented stock settings file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Settings
# ================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Any key can also be overridden per call:
#   gallery-source resolve --config gallery.toml --set filtering.mode=union
#
# Unknown keys will cause an error.

# Item order after resolution. Every sort is stable.
#   source        - keep the order the source returns
#   filename      - by filename, case-insensitive
#   filename_desc - reverse of filename
#   caption       - by caption, items without one last
#   sort_field    - by the value picked with [source.overrides] sort
sort = "source"

# ---------------------------------------------------------------------------
# Source
# ---------------------------------------------------------------------------
# Exactly one source per gallery. Changing `kind` discards the keys of the
# previous kind.
[source]
kind = "folder"
# Folder to read images from. Also the container metadata is stored under.
path = "."
# Descend into subfolders.
recursive = false
# Where captions and links are stored: "database" or "file" (metadata.json).
metadata = "database"

# Tag set:
#   kind = "tag_set"
#   taxonomy = "media_tag"
#   terms = [3, 7]
#   mode = "union"             # union | intersect
#
# Category set:
#   kind = "category_set"
#   taxonomy = "media_category"
#   terms = [12]
#   mode = "union"
#   include_descendants = true
#
# Post query:
#   kind = "query"
#   post_type = "post"
#   limit = 10
#   exclude = [7]
#   taxonomy = "category:news"
#   [source.overrides]
#   link = "permalink"         # any post property or meta key
#   title = "post_title"
#   description = "post_excerpt"
#   class = "css_class"
#   sort = "menu_order"

# ---------------------------------------------------------------------------
# Filtering
# ---------------------------------------------------------------------------
[filtering]
# "none" disables the filter bar; "default" or "tags" pick its style.
type = "none"
# Taxonomy whose terms become filter facets.
taxonomy = "media_tag"
# Where the filter bar goes: none | top | bottom | both
position = "top"
# single: one facet at a time. union: any selected. intersect: all selected.
mode = "single"
# Record filter changes as new history entries ("push") or not ("replace").
history = "push"
# Hide facets with fewer items than this (0 = show all).
min = 0
# Show at most this many facets, most used first (0 = no limit).
limit = 0
# Show item counts next to facet labels.
show_count = false
# Scale facet font size by count between smallest and largest (px).
adjust_size = false
smallest = 12
largest = 16
# Scale facet opacity by count between lightest and darkest.
adjust_opacity = false
lightest = 0.5
darkest = 1.0

# ---------------------------------------------------------------------------
# Captions
# ---------------------------------------------------------------------------
[captions]
# "custom" rebuilds every caption from the template below.
type = "default"
# Placeholders: {{id}} {{title}} {{caption}} {{description}} {{alt}} {{url}}
# {{custom_url}} {{custom_target}} {{width}} {{height}} {{postmeta.KEY}}
template = ""

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# "background_fill" keeps the whole image and pads it with the colour below
# instead of cropping.
cropping = "default"
background_fill = "rgb(0,0,0)"
"##
}
