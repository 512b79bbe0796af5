//! Library layout: where a file goes once its fate is decided.
//!
//! ```text
//! sorted/<artist>/<album> (<year>)/<NN> - <title>.<ext>
//! unknown/<directory relative to watch root>/<original file name>
//! ```
//!
//! Paths are compared component-wise, so callers should hand in
//! canonicalized roots and event paths under the canonical watch root.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::metadata::{TagField, TrackMetadata};
use crate::sanitize::{is_usable_segment, sanitize};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{field} value {value:?} does not produce a usable path segment")]
    UnsafeSegment { field: TagField, value: String },

    #[error("{} is not inside the watch root {}", path.display(), root.display())]
    OutsideWatchRoot { path: PathBuf, root: PathBuf },

    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),

    #[error("{kind} root {} must not be inside the watch root", path.display())]
    NestedRoot { kind: &'static str, path: PathBuf },
}

/// The three roots of the sorter and the rules for mapping files into them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryLayout {
    watch_root: PathBuf,
    sorted_root: PathBuf,
    unknown_root: PathBuf,
}

impl LibraryLayout {
    /// Build a layout. Output roots nested inside the watch root are
    /// rejected, since every file filed there would be picked up again.
    pub fn new(
        watch_root: impl Into<PathBuf>,
        sorted_root: impl Into<PathBuf>,
        unknown_root: impl Into<PathBuf>,
    ) -> Result<Self, LayoutError> {
        let watch_root = watch_root.into();
        let sorted_root = sorted_root.into();
        let unknown_root = unknown_root.into();

        for (kind, root) in [("sorted", &sorted_root), ("unknown", &unknown_root)] {
            if root.starts_with(&watch_root) {
                return Err(LayoutError::NestedRoot {
                    kind,
                    path: root.clone(),
                });
            }
        }

        Ok(Self {
            watch_root,
            sorted_root,
            unknown_root,
        })
    }

    pub fn watch_root(&self) -> &Path {
        &self.watch_root
    }

    pub fn sorted_root(&self) -> &Path {
        &self.sorted_root
    }

    pub fn unknown_root(&self) -> &Path {
        &self.unknown_root
    }

    /// Canonical destination of a fully tagged track
    pub fn sorted_path(
        &self,
        track: &TrackMetadata,
        extension: &str,
    ) -> Result<PathBuf, LayoutError> {
        let artist = segment(TagField::Artist, &track.artist)?;
        let album = segment(TagField::Album, &track.album)?;
        let title = segment(TagField::Title, &track.title)?;
        let year = sanitize(&track.year);
        if year.is_empty() {
            return Err(LayoutError::UnsafeSegment {
                field: TagField::Year,
                value: track.year.clone(),
            });
        }

        let album_folder = format!("{} ({})", album, year);
        let file_name = format!("{} - {}.{}", track.track_label(), title, extension);

        Ok(self
            .sorted_root
            .join(artist)
            .join(album_folder)
            .join(file_name))
    }

    /// Position of a directory relative to the watch root
    pub fn relative_dir<'a>(&self, dir: &'a Path) -> Result<&'a Path, LayoutError> {
        dir.strip_prefix(&self.watch_root)
            .map_err(|_| LayoutError::OutsideWatchRoot {
                path: dir.to_path_buf(),
                root: self.watch_root.clone(),
            })
    }

    /// Directory under the unknown root that mirrors `dir` under the watch root
    pub fn mirrored_dir(&self, dir: &Path) -> Result<PathBuf, LayoutError> {
        Ok(self.unknown_root.join(self.relative_dir(dir)?))
    }

    /// Fallback destination for a file: same relative directory, same name
    pub fn unknown_path(&self, source: &Path) -> Result<PathBuf, LayoutError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| LayoutError::NoFileName(source.to_path_buf()))?;
        let parent = source
            .parent()
            .ok_or_else(|| LayoutError::NoFileName(source.to_path_buf()))?;

        Ok(self.mirrored_dir(parent)?.join(file_name))
    }
}

fn segment(field: TagField, value: &str) -> Result<String, LayoutError> {
    let cleaned = sanitize(value);
    if is_usable_segment(&cleaned) {
        Ok(cleaned)
    } else {
        Err(LayoutError::UnsafeSegment {
            field,
            value: value.to_string(),
        })
    }
}
