//! Facet tallies and the policy deciding which facets are shown.
//!
//! ## Counting
//!
//! [`compute_facets`] tallies, for one taxonomy, how many items of the
//! current unfiltered set carry each tag key. It is recomputed from the items
//! on every call; nothing is cached between resolutions.
//!
//! ## Surfacing
//!
//! [`FacetPolicy::surface`] turns the full tally into the displayed list:
//!
//! ```text
//! all facets ──▶ drop count < min ──▶ order by count desc, label asc ──▶ keep first `limit`
//!                                                                          │
//!                                       size / opacity weights  ◀──────────┘
//! ```
//!
//! Weights interpolate linearly across the count range of the *displayed*
//! facets: `floor + (count - lo) / (hi - lo) * (ceiling - floor)`. When every
//! displayed facet has the same count they all get the midpoint.

use crate::types::MediaItem;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetDefinition {
    pub key: String,
    pub label: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

/// Output bounds of one visual weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightRange {
    pub floor: f64,
    pub ceiling: f64,
}

impl WeightRange {
    pub fn weight(&self, count: usize, lo: usize, hi: usize) -> f64 {
        if hi <= lo {
            return (self.floor + self.ceiling) / 2.0;
        }
        let t = (count.saturating_sub(lo)) as f64 / (hi - lo) as f64;
        self.floor + t * (self.ceiling - self.floor)
    }
}

/// Display policy for facets. `min` and `limit` of 0 disable the check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetPolicy {
    pub min: usize,
    pub limit: usize,
    pub size: Option<WeightRange>,
    pub opacity: Option<WeightRange>,
}

/// Count desc, then label asc ignoring case, then key.
fn display_order(a: &FacetDefinition, b: &FacetDefinition) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| a.label.to_lowercase().cmp(&b.label.to_lowercase()))
        .then_with(|| a.key.cmp(&b.key))
}

/// Tally the tags of `taxonomy` across `items`, in display order.
pub fn compute_facets(items: &[MediaItem], taxonomy: &str) -> Vec<FacetDefinition> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut facets: Vec<FacetDefinition> = Vec::new();
    for tag in items.iter().flat_map(|i| &i.tags).filter(|t| t.taxonomy == taxonomy) {
        match index.get(tag.key.as_str()) {
            Some(&i) => facets[i].count += 1,
            None => {
                index.insert(&tag.key, facets.len());
                facets.push(FacetDefinition {
                    key: tag.key.clone(),
                    label: tag.label.clone(),
                    count: 1,
                    size: None,
                    opacity: None,
                });
            }
        }
    }
    facets.sort_by(display_order);
    facets
}

impl FacetPolicy {
    pub fn surface(&self, mut facets: Vec<FacetDefinition>) -> Vec<FacetDefinition> {
        if self.min > 0 {
            facets.retain(|f| f.count >= self.min);
        }
        facets.sort_by(display_order);
        if self.limit > 0 {
            facets.truncate(self.limit);
        }

        let lo = facets.iter().map(|f| f.count).min().unwrap_or(0);
        let hi = facets.iter().map(|f| f.count).max().unwrap_or(0);
        for facet in &mut facets {
            facet.size = self.size.map(|r| r.weight(facet.count, lo, hi));
            facet.opacity = self.opacity.map(|r| r.weight(facet.count, lo, hi));
        }
        facets
    }
}
