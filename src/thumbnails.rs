//! Thumbnail resize arguments handed to the external image resizer.
//!
//! The resizer crops to the thumbnail box by default. With
//! `cropping = "background_fill"` the whole image is kept and letterboxed on
//! a solid colour instead, passed as `RRRGGGBBB000` (zero-padded decimal
//! channels followed by a fully opaque alpha).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cropping {
    #[default]
    Default,
    BackgroundFill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    pub cropping: Cropping,
    /// CSS-style `rgb(r,g,b)` or `rgba(r,g,b,a)`; alpha is ignored.
    pub background_fill: String,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            cropping: Cropping::Default,
            background_fill: "rgb(0,0,0)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizeArgs {
    pub crop: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_fill: Option<String>,
}

impl Default for ResizeArgs {
    fn default() -> Self {
        Self {
            crop: true,
            background_fill: None,
        }
    }
}

/// Resize arguments for the configured cropping behaviour.
pub fn resize_args(config: &ThumbnailConfig) -> ResizeArgs {
    match config.cropping {
        Cropping::Default => ResizeArgs::default(),
        Cropping::BackgroundFill => {
            let [r, g, b] = parse_rgb(&config.background_fill).unwrap_or_else(|| {
                tracing::warn!(
                    "unparseable background fill '{}', using black",
                    config.background_fill
                );
                [0, 0, 0]
            });
            ResizeArgs {
                crop: false,
                background_fill: Some(format!("{r:03}{g:03}{b:03}000")),
            }
        }
    }
}

/// Parse the leading `rgb(r,g,b` of a CSS colour. Channels above 255 clamp.
pub fn parse_rgb(raw: &str) -> Option<[u8; 3]> {
    let lower = raw.trim().to_ascii_lowercase();
    let rest = lower
        .strip_prefix("rgba")
        .or_else(|| lower.strip_prefix("rgb"))?
        .trim_start()
        .strip_prefix('(')?;
    let mut channels = rest.split(',').map(|part| {
        let digits = part.trim().trim_end_matches(')').trim();
        digits.parse::<u32>().ok().map(|v| v.min(255) as u8)
    });
    Some([channels.next()??, channels.next()??, channels.next()??])
}
