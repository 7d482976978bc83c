//! Custom caption templates.
//!
//! With `[captions] type = "custom"` every item's caption is rebuilt from a
//! template such as `{{title}} by {{postmeta.photographer}}`. Placeholders
//! name an item field or, with the `postmeta.` prefix, an entry of the item's
//! meta. A placeholder with no value renders as an empty string; text outside
//! `{{ }}` is copied unchanged.

use crate::types::MediaItem;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionType {
    /// Keep the captions the source provides.
    #[default]
    Default,
    Custom,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    #[serde(rename = "type")]
    pub kind: CaptionType,
    pub template: String,
}

impl CaptionConfig {
    /// Rewrite captions in place when a custom template is configured.
    pub fn apply(&self, items: &mut [MediaItem]) {
        if self.kind != CaptionType::Custom {
            return;
        }
        for item in items {
            item.caption = Some(render(&self.template, item));
        }
    }
}

pub fn render(template: &str, item: &MediaItem) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            // Unterminated: copy the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };
        out.push_str(&placeholder(after[..end].trim(), item));
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

fn placeholder(name: &str, item: &MediaItem) -> String {
    if let Some(key) = name.strip_prefix("postmeta.") {
        return item.meta.get(key).cloned().unwrap_or_default();
    }
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    match name {
        "id" | "ID" => item.id.clone(),
        "title" => text(&item.title),
        "caption" => text(&item.caption),
        "description" => text(&item.description),
        "alt" => text(&item.alt),
        "url" => item.url.clone(),
        "custom_url" => text(&item.custom_url),
        "custom_target" => text(&item.custom_target),
        "width" => item.dimensions.map(|d| d.width.to_string()).unwrap_or_default(),
        "height" => item.dimensions.map(|d| d.height.to_string()).unwrap_or_default(),
        _ => String::new(),
    }
}
