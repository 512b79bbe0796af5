//! Tag access for media files.
//!
//! The pipeline only needs a handful of operations on a file's tags, so they
//! sit behind [`MediaTagger`]. [`LoftyTagger`] is the real backend; tests
//! substitute their own.

mod lofty_tags;

pub use lofty_tags::LoftyTagger;

use crate::error::SortResult;
use shelver_core::RawTags;
use std::fmt;
use std::path::Path;

/// Image formats accepted as embedded cover art
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverMime {
    Jpeg,
    Png,
}

impl CoverMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverMime::Jpeg => "image/jpeg",
            CoverMime::Png => "image/png",
        }
    }
}

impl fmt::Display for CoverMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cover image found in a batch directory
#[derive(Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub mime: CoverMime,
}

impl fmt::Debug for CoverArt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoverArt")
            .field("mime", &self.mime)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Read and write the tag fields the sorter cares about
pub trait MediaTagger: Send + Sync {
    /// First value of each required field
    fn read_fields(&self, path: &Path) -> SortResult<RawTags>;

    /// Whether the file already carries an embedded cover
    fn has_cover_art(&self, path: &Path) -> SortResult<bool>;

    /// Embed `cover` as the front cover and save the file
    fn attach_cover_art(&self, path: &Path, cover: &CoverArt) -> SortResult<()>;

    /// Store `text` in the format's lyrics field and save the file
    fn write_lyrics(&self, path: &Path, text: &str) -> SortResult<()>;
}
