//! Filename helpers shared by the folder resolver and the sort stage.
//!
//! ## Display Titles
//!
//! Folder images carry no title of their own, so one is derived from the
//! filename: extension dropped, an optional `NNN-` ordering prefix dropped,
//! and dashes/underscores turned into spaces.
//!
//! - `001-My-Museum.jpg` → "My Museum"
//! - `sunset_over_bay.png` → "sunset over bay"
//! - `042.jpg` → None (number only)

use std::cmp::Ordering;
use std::path::Path;

/// Extensions the folder resolver treats as images (compared lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif"];

/// Whether a path names an image by extension. Hidden files never match.
pub fn is_image_path(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Derive a display title from a filename.
pub fn display_title(filename: &str) -> Option<String> {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let name = match stem.split_once('-') {
        Some((prefix, rest))
            if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) =>
        {
            rest.to_string()
        }
        _ if !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()) => String::new(),
        _ => stem,
    };

    let title = name.replace(['-', '_'], " ").trim().to_string();
    if title.is_empty() { None } else { Some(title) }
}

/// Filename ordering: case-insensitive first, exact bytes as the tiebreak,
/// so the result is total and deterministic.
pub fn compare_filenames(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_with_multi_word_name() {
        assert_eq!(display_title("020-My-Best-Photos.jpg").as_deref(), Some("My Best Photos"));
    }

    #[test]
    fn underscores_become_spaces() {
        assert_eq!(display_title("sunset_over_bay.png").as_deref(), Some("sunset over bay"));
    }

    #[test]
    fn number_only_has_no_title() {
        assert_eq!(display_title("042.jpg"), None);
        assert_eq!(display_title("001-.jpg"), None);
    }

    #[test]
    fn unnumbered_dashes_kept_as_words() {
        assert_eq!(display_title("wip-drafts.jpg").as_deref(), Some("wip drafts"));
    }

    #[test]
    fn image_extensions_case_insensitive() {
        assert!(is_image_path(Path::new("a/b/photo.JPG")));
        assert!(is_image_path(Path::new("photo.webp")));
        assert!(!is_image_path(Path::new("notes.txt")));
        assert!(!is_image_path(Path::new("metadata.json")));
        assert!(!is_image_path(Path::new("noext")));
    }

    #[test]
    fn hidden_files_are_not_images() {
        assert!(!is_image_path(Path::new(".thumb.jpg")));
    }

    #[test]
    fn filename_compare_is_case_insensitive_then_exact() {
        assert_eq!(compare_filenames("a.jpg", "B.jpg"), Ordering::Less);
        assert_eq!(compare_filenames("B.jpg", "a.jpg"), Ordering::Greater);
        assert_eq!(compare_filenames("A.jpg", "a.jpg"), Ordering::Less);
        assert_eq!(compare_filenames("a.jpg", "a.jpg"), Ordering::Equal);
    }
}
