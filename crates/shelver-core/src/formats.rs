//! File classification by extension.
//!
//! Everything the sorter decides about a file before opening it comes from
//! its extension: whether it is a media file that gets tagged and filed,
//! a cover image that is consumed by the batch, or a lyrics sidecar.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Media extensions that are tracked and filed
pub const MEDIA_EXTENSIONS: &[&str] = &[".mp3", ".flac", ".ogg", ".m4a"];

/// Image extensions considered as folder cover art
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

/// Extension of lyrics sidecar files (`<stem>.lrc` next to the track)
pub const LYRICS_EXTENSION: &str = "lrc";

/// Media container formats the sorter knows how to tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaFormat {
    Mp3,
    Flac,
    Ogg,
    M4a,
}

impl MediaFormat {
    /// Detect the format from a path's extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = lowercase_extension(path)?;
        match ext.as_str() {
            "mp3" => Some(MediaFormat::Mp3),
            "flac" => Some(MediaFormat::Flac),
            "ogg" => Some(MediaFormat::Ogg),
            "m4a" => Some(MediaFormat::M4a),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaFormat::Mp3 => "mp3",
            MediaFormat::Flac => "flac",
            MediaFormat::Ogg => "ogg",
            MediaFormat::M4a => "m4a",
        }
    }

    /// Whether only a picture explicitly typed as front cover counts as
    /// existing cover art. ID3v2 and MP4 files count any attached picture.
    pub fn requires_front_cover_type(&self) -> bool {
        matches!(self, MediaFormat::Flac | MediaFormat::Ogg)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

fn has_extension_in(path: &Path, extensions: &[&str]) -> bool {
    lowercase_extension(path)
        .map(|ext| {
            let dotted = format!(".{}", ext);
            extensions.contains(&dotted.as_str())
        })
        .unwrap_or(false)
}

/// Check if a path has a supported media extension
pub fn is_media_file(path: &Path) -> bool {
    has_extension_in(path, MEDIA_EXTENSIONS)
}

/// Check if a path has a cover image extension
pub fn is_image_file(path: &Path) -> bool {
    has_extension_in(path, IMAGE_EXTENSIONS)
}

/// Path of the lyrics sidecar that belongs to a media file
pub fn lyrics_sidecar(media_path: &Path) -> std::path::PathBuf {
    media_path.with_extension(LYRICS_EXTENSION)
}
