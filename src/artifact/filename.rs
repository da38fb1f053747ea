//! Filename sanitization and output path resolution.

use std::path::{Path, PathBuf};

/// Name used when sanitizing leaves nothing behind.
pub const FALLBACK_NAME: &str = "video";

/// Turns an arbitrary display string into a filesystem-safe base name.
///
/// Keeps ASCII letters, digits, underscore, space and hyphen; drops every
/// other character; trims surrounding whitespace. An empty result becomes
/// [`FALLBACK_NAME`]. The output is never empty and sanitizing it again
/// returns it unchanged.
///
/// ```
/// use clipfetch_core::artifact::sanitize;
///
/// assert_eq!(sanitize("My Video!! #1 <2024>"), "My Video 1 2024");
/// assert_eq!(sanitize("???"), "video");
/// ```
#[must_use]
pub fn sanitize(proposed: &str) -> String {
    let kept: String = proposed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '-'))
        .collect();
    let trimmed = kept.trim();
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Maps a MIME type to a file extension (with the leading dot).
///
/// Parameters such as `; codecs=...` are ignored. Unknown types get `.bin`.
pub(crate) fn extension_for_mime(mime_type: &str) -> &'static str {
    let mime = mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "video/mp4" => ".mp4",
        "video/webm" => ".webm",
        "video/x-matroska" => ".mkv",
        "video/quicktime" => ".mov",
        "video/mp2t" => ".ts",
        "audio/mp4" => ".m4a",
        "audio/mpeg" => ".mp3",
        "audio/webm" => ".weba",
        "audio/ogg" => ".ogg",
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/webp" => ".webp",
        "application/json" => ".json",
        "text/plain" => ".txt",
        _ => ".bin",
    }
}

/// Returns the `attempt`-th candidate path for `filename` in `dir`.
///
/// Attempt 1 is `name.ext` itself, attempt `n` is `name_n.ext`.
pub(crate) fn candidate_path(dir: &Path, filename: &str, attempt: u32) -> PathBuf {
    if attempt <= 1 {
        return dir.join(filename);
    }
    let (stem, extension) = split_extension(filename);
    dir.join(format!("{stem}_{attempt}{extension}"))
}

/// Splits `name.ext` into `("name", ".ext")`; names without a dot keep an
/// empty extension. A leading dot is part of the stem.
fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => filename.split_at(idx),
        _ => (filename, ""),
    }
}
