//! Moving files into the sorted or unknown tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use shelver_core::{LibraryLayout, TrackMetadata};

/// Where a file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relocation {
    Sorted(PathBuf),
    Unknown(PathBuf),
    /// Every move failed; the file is still at its source path
    Stranded,
}

impl Relocation {
    pub fn is_sorted(&self) -> bool {
        matches!(self, Relocation::Sorted(_))
    }
}

/// Rename, falling back to copy + delete when source and destination are on
/// different filesystems
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            if let Err(copy_err) = fs::copy(src, dst) {
                let _ = fs::remove_file(dst);
                return Err(copy_err);
            }
            fs::remove_file(src)
        }
        Err(e) => Err(e),
    }
}

/// First free path of the form `name.ext`, `name (1).ext`, `name (2).ext`...
pub fn free_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().to_string());

    (1u32..)
        .map(|n| {
            let name = match &ext {
                Some(ext) => format!("{} ({}).{}", stem, n, ext),
                None => format!("{} ({})", stem, n),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

fn move_into(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    move_file(src, dst)
}

#[derive(Debug, Clone)]
pub struct Relocator {
    layout: LibraryLayout,
}

impl Relocator {
    pub fn new(layout: LibraryLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &LibraryLayout {
        &self.layout
    }

    /// File `path` into the sorted tree when `track` is given and the move
    /// works out, otherwise into the unknown tree
    pub fn relocate(&self, path: &Path, track: Option<&TrackMetadata>) -> Relocation {
        match track.and_then(|track| self.sorted_destination(path, track)) {
            Some(dest) => self.to_sorted(path, &dest),
            None => self.to_unknown(path),
        }
    }

    /// Library path for `track`, or `None` when the tags do not make a
    /// usable path or the library already holds a file there
    pub fn sorted_destination(&self, path: &Path, track: &TrackMetadata) -> Option<PathBuf> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

        match self.layout.sorted_path(track, ext) {
            Ok(dest) if dest.exists() => {
                info!(path = %path.display(), dest = %dest.display(), "library already has this track");
                None
            }
            Ok(dest) => Some(dest),
            Err(e) => {
                info!(path = %path.display(), error = %e, "cannot build library path");
                None
            }
        }
    }

    /// Move `path` to a destination from [`Self::sorted_destination`],
    /// falling back to the unknown tree if the move fails or the slot was
    /// taken in the meantime
    pub fn to_sorted(&self, path: &Path, dest: &Path) -> Relocation {
        if dest.exists() {
            info!(path = %path.display(), dest = %dest.display(), "library slot taken");
            return self.to_unknown(path);
        }

        match move_into(path, dest) {
            Ok(()) => {
                info!(from = %path.display(), to = %dest.display(), "sorted");
                Relocation::Sorted(dest.to_path_buf())
            }
            Err(e) => {
                warn!(path = %path.display(), dest = %dest.display(), error = %e, "move to library failed");
                self.to_unknown(path)
            }
        }
    }

    /// Move `path` to its mirrored spot under the unknown root, never
    /// overwriting an existing file
    pub fn to_unknown(&self, path: &Path) -> Relocation {
        let dest = match self.layout.unknown_path(path) {
            Ok(dest) => free_path(&dest),
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot place file in unknown tree");
                return Relocation::Stranded;
            }
        };

        match move_into(path, &dest) {
            Ok(()) => {
                info!(from = %path.display(), to = %dest.display(), "moved to unknown");
                Relocation::Unknown(dest)
            }
            Err(e) => {
                error!(path = %path.display(), dest = %dest.display(), error = %e, "file left in place");
                Relocation::Stranded
            }
        }
    }
}
