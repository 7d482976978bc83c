//! Tag and category set resolver.
//!
//! Each selected term is matched on its own (together with its descendants
//! for categories that ask for them). The per-term groups are then combined:
//! `union` keeps first-seen order across groups, `intersect` keeps the first
//! group's order and drops anything missing from another group. Either way
//! an attachment appears at most once.

use super::{ResolveError, Resolved, Stores, attachment_item};
use crate::store::{AttachmentId, CombineMode, TermId};
use crate::types::SourceKind;
use std::collections::HashSet;

pub(crate) struct TermQuery<'a> {
    pub kind: SourceKind,
    pub taxonomy: &'a str,
    pub terms: &'a [TermId],
    pub mode: CombineMode,
    pub include_descendants: bool,
}

pub(crate) fn resolve(
    query: &TermQuery<'_>,
    stores: &Stores<'_>,
) -> Result<Resolved, ResolveError> {
    if !stores.taxonomy.has_taxonomy(query.taxonomy) {
        return Err(ResolveError::InvalidConfig(format!(
            "unknown taxonomy '{}'",
            query.taxonomy
        )));
    }

    let mut groups = Vec::with_capacity(query.terms.len());
    for &term in query.terms {
        let mut matched = vec![term];
        if query.include_descendants {
            matched.extend(stores.taxonomy.descendants(query.taxonomy, term)?);
        }
        groups.push(
            stores
                .taxonomy
                .items_for_terms(query.taxonomy, &matched, CombineMode::Union)?,
        );
    }

    let mut resolved = Resolved::default();
    for id in combine(&groups, query.mode) {
        match stores.content.attachment(id) {
            Ok(Some(attachment)) => resolved.items.push(attachment_item(attachment, query.kind)),
            Ok(None) => resolved.skip(id.to_string(), "attachment no longer exists"),
            Err(e) => resolved.skip(id.to_string(), e),
        }
    }
    Ok(resolved)
}

fn combine(groups: &[Vec<AttachmentId>], mode: CombineMode) -> Vec<AttachmentId> {
    let mut seen = HashSet::new();
    match mode {
        CombineMode::Union => groups
            .iter()
            .flatten()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect(),
        CombineMode::Intersect => {
            let Some((first, rest)) = groups.split_first() else {
                return Vec::new();
            };
            let rest: Vec<HashSet<AttachmentId>> =
                rest.iter().map(|g| g.iter().copied().collect()).collect();
            first
                .iter()
                .copied()
                .filter(|id| rest.iter().all(|g| g.contains(id)))
                .filter(|id| seen.insert(*id))
                .collect()
        }
    }
}
