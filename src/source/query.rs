//! Post query resolver: the first image of each matching post.
//!
//! Posts come back in store order. A post without an eligible image is left
//! out quietly; one whose attachment lookup fails is recorded as skipped.
//! When two posts share an image it appears once, under the first post.
//!
//! [`PropertyOverrides`] then copy named post properties onto every item,
//! e.g. `link = "permalink"` makes each image link to its post.

use super::{PropertyOverrides, QuerySource, ResolveError, Resolved, Stores, attachment_item};
use crate::store::{Post, PostQuery, TaxonomyFilter};
use crate::types::{MediaItem, SourceKind};
use std::collections::HashSet;

pub(crate) fn resolve(source: &QuerySource, stores: &Stores<'_>) -> Result<Resolved, ResolveError> {
    let filter = source
        .taxonomy
        .as_deref()
        .map(|raw| {
            TaxonomyFilter::parse(raw).ok_or_else(|| {
                ResolveError::InvalidConfig(format!("malformed taxonomy filter '{raw}'"))
            })
        })
        .transpose()?;
    if let Some(f) = &filter
        && !stores.taxonomy.has_taxonomy(&f.taxonomy)
    {
        return Err(ResolveError::InvalidConfig(format!(
            "unknown taxonomy '{}'",
            f.taxonomy
        )));
    }

    let posts = stores.content.query_posts(&PostQuery {
        post_type: &source.post_type,
        limit: source.limit,
        exclude: &source.exclude,
        taxonomy: filter.as_ref(),
    })?;

    let mut resolved = Resolved::default();
    let mut seen = HashSet::new();
    let eligible = posts
        .iter()
        .filter(|p| !source.exclude.contains(&p.id))
        .take(source.limit);
    for post in eligible {
        match stores.content.first_attachment(post) {
            Ok(Some(attachment)) => {
                if !seen.insert(attachment.id) {
                    continue;
                }
                let mut item = attachment_item(attachment, SourceKind::Query);
                item.origin_post = Some(post.id);
                source.overrides.apply(post, &mut item);
                resolved.items.push(item);
            }
            Ok(None) => tracing::debug!("post {} has no image, leaving it out", post.id),
            Err(e) => resolved.skip(format!("post {}", post.id), e),
        }
    }
    Ok(resolved)
}

impl PropertyOverrides {
    /// Copy the configured post properties onto `item`. A property the post
    /// does not have clears the field.
    pub fn apply(&self, post: &Post, item: &mut MediaItem) {
        let read = |name: &Option<String>| name.as_deref().map(|n| post.property(n));
        if let Some(v) = read(&self.link) {
            item.custom_url = v;
        }
        if let Some(v) = read(&self.title) {
            item.title = v;
        }
        if let Some(v) = read(&self.description) {
            item.description = v;
        }
        if let Some(v) = read(&self.class) {
            item.css_class = v;
        }
        if let Some(v) = read(&self.sort) {
            item.sort_value = v;
        }
    }
}
