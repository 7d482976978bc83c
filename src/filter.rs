//! Filter settings, filter state and the visible subset it selects.
//!
//! The client holds a [`FilterState`] and asks this module two things: which
//! items a state shows ([`apply_filter`]), and what a click does to the state
//! ([`FilterState::toggle`], [`FilterState::clear`]). Each transition is
//! tagged push or replace so the client knows how to record it in its
//! navigation history; performing the history change is up to the client.
//!
//! | Mode | Active keys | Item visible when it carries |
//! |------|-------------|------------------------------|
//! | `single` | at most one | that key |
//! | `union` | any number | any active key |
//! | `intersect` | any number | every active key |
//!
//! With no active key every item is visible. Unknown keys match nothing;
//! a malformed state never errors.

use crate::facets::{FacetPolicy, WeightRange};
use crate::source::TAG_TAXONOMY;
use crate::types::MediaItem;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    Single,
    #[serde(alias = "Union")]
    Union,
    #[serde(alias = "Intersect")]
    Intersect,
}

/// How a filter change is recorded in navigation history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    #[default]
    Push,
    Replace,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    #[default]
    #[serde(alias = "")]
    None,
    Default,
    Tags,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPosition {
    None,
    #[default]
    Top,
    Bottom,
    Both,
}

/// The `[filtering]` settings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilteringConfig {
    #[serde(rename = "type")]
    pub kind: FilterType,
    pub taxonomy: String,
    pub position: FilterPosition,
    pub mode: FilterMode,
    pub history: HistoryMode,
    /// Hide facets with fewer items. 0 disables.
    pub min: usize,
    /// Show at most this many facets. 0 disables.
    pub limit: usize,
    pub show_count: bool,
    pub adjust_size: bool,
    pub smallest: u32,
    pub largest: u32,
    pub adjust_opacity: bool,
    pub lightest: f64,
    pub darkest: f64,
}

impl Default for FilteringConfig {
    fn default() -> Self {
        Self {
            kind: FilterType::None,
            taxonomy: TAG_TAXONOMY.to_string(),
            position: FilterPosition::Top,
            mode: FilterMode::Single,
            history: HistoryMode::Push,
            min: 0,
            limit: 0,
            show_count: false,
            adjust_size: false,
            smallest: 12,
            largest: 16,
            adjust_opacity: false,
            lightest: 0.5,
            darkest: 1.0,
        }
    }
}

impl FilteringConfig {
    pub fn enabled(&self) -> bool {
        self.kind != FilterType::None
    }

    pub fn facet_policy(&self) -> FacetPolicy {
        FacetPolicy {
            min: self.min,
            limit: self.limit,
            size: self.adjust_size.then_some(WeightRange {
                floor: f64::from(self.smallest),
                ceiling: f64::from(self.largest),
            }),
            opacity: self.adjust_opacity.then_some(WeightRange {
                floor: self.lightest,
                ceiling: self.darkest,
            }),
        }
    }

    /// Client options, or `None` when filtering is off.
    pub fn options(&self) -> Option<FilteringOptions> {
        if !self.enabled() {
            return None;
        }
        Some(FilteringOptions {
            kind: self.kind,
            position: self.position,
            push_or_replace: self.history,
            mode: self.mode,
            min: self.min,
            limit: self.limit,
            show_count: self.show_count,
            adjust_size: self.adjust_size,
            adjust_opacity: self.adjust_opacity,
            smallest: self.adjust_size.then_some(self.smallest),
            largest: self.adjust_size.then_some(self.largest),
            lightest: self.adjust_opacity.then_some(self.lightest),
            darkest: self.adjust_opacity.then_some(self.darkest),
        })
    }
}

/// Filtering options in the shape the client widget reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteringOptions {
    #[serde(rename = "type")]
    pub kind: FilterType,
    pub position: FilterPosition,
    pub push_or_replace: HistoryMode,
    pub mode: FilterMode,
    pub min: usize,
    pub limit: usize,
    pub show_count: bool,
    pub adjust_size: bool,
    pub adjust_opacity: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smallest: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largest: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lightest: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub darkest: Option<f64>,
}

/// Active facet keys under a mode. Keys are kept in selection order without
/// duplicates; `single` keeps only the most recent one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub mode: FilterMode,
    pub active: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterTransition {
    pub state: FilterState,
    pub navigation: HistoryMode,
}

impl FilterState {
    pub fn new(mode: FilterMode) -> Self {
        Self {
            mode,
            active: Vec::new(),
        }
    }

    pub fn with_active<I, S>(mode: FilterMode, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = Self::new(mode);
        for key in keys {
            let key = key.into();
            if !state.active.contains(&key) {
                state.active.push(key);
            }
        }
        if mode == FilterMode::Single && state.active.len() > 1 {
            state.active.drain(..state.active.len() - 1);
        }
        state
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Click on a facet: select it, or deselect it when already active.
    /// In `single` mode selecting replaces the previous key.
    pub fn toggle(&self, key: &str, history: HistoryMode) -> FilterTransition {
        let mut next = self.clone();
        if let Some(pos) = next.active.iter().position(|k| k == key) {
            next.active.remove(pos);
        } else if self.mode == FilterMode::Single {
            next.active = vec![key.to_string()];
        } else {
            next.active.push(key.to_string());
        }
        self.transition(next, history)
    }

    pub fn clear(&self, history: HistoryMode) -> FilterTransition {
        self.transition(Self::new(self.mode), history)
    }

    /// A change that leaves the state as it was replaces the current history
    /// entry instead of adding a duplicate one.
    fn transition(&self, next: FilterState, history: HistoryMode) -> FilterTransition {
        let navigation = if next == *self {
            HistoryMode::Replace
        } else {
            history
        };
        FilterTransition {
            state: next,
            navigation,
        }
    }

    pub fn matches(&self, item: &MediaItem) -> bool {
        if self.active.is_empty() {
            return true;
        }
        match self.mode {
            FilterMode::Single | FilterMode::Union => self.active.iter().any(|k| item.has_tag(k)),
            FilterMode::Intersect => self.active.iter().all(|k| item.has_tag(k)),
        }
    }
}

/// The visible subset of `items`, in their original order.
pub fn apply_filter<'a>(items: &'a [MediaItem], state: &FilterState) -> Vec<&'a MediaItem> {
    items.iter().filter(|i| state.matches(i)).collect()
}
