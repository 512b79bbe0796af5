//! Cleanup after a directory's media files have been filed.
//!
//! Leftover images were consumed as cover art and are deleted. Everything
//! else that is not media moves to the unknown tree. Then empty directories
//! are pruned from the bottom up, never touching the watch root itself.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::relocate::{Relocation, Relocator};
use shelver_core::{is_image_file, is_media_file};

/// What a reconcile pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub deleted_images: Vec<PathBuf>,
    pub moved_residuals: Vec<PathBuf>,
    pub removed_dirs: Vec<PathBuf>,
    pub errors: usize,
}

pub struct Reconciler {
    relocator: Relocator,
    /// Canonical watch root; pruning stops here
    boundary: PathBuf,
}

impl Reconciler {
    pub fn new(relocator: Relocator) -> Self {
        let root = relocator.layout().watch_root();
        let boundary = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        Self {
            relocator,
            boundary,
        }
    }

    /// Clean up `dir` once its pending set is empty. Subdirectories for
    /// which `is_tracked` holds are left alone; they have their own batch.
    pub fn reconcile(&self, dir: &Path, is_tracked: impl Fn(&Path) -> bool) -> Reconciliation {
        let mut report = Reconciliation::default();

        self.sweep_residuals(dir, &is_tracked, &mut report);
        self.prune_subtree(dir, &is_tracked, &mut report);
        self.prune_upwards(dir, &mut report);

        info!(
            dir = %dir.display(),
            deleted_images = report.deleted_images.len(),
            moved = report.moved_residuals.len(),
            removed_dirs = report.removed_dirs.len(),
            errors = report.errors,
            "reconciled"
        );
        report
    }

    fn walk<'a>(
        &self,
        dir: &'a Path,
        is_tracked: &'a impl Fn(&Path) -> bool,
        contents_first: bool,
    ) -> impl Iterator<Item = walkdir::DirEntry> + 'a {
        WalkDir::new(dir)
            .follow_links(false)
            .contents_first(contents_first)
            .into_iter()
            .filter_entry(move |e| e.depth() == 0 || !(e.file_type().is_dir() && is_tracked(e.path())))
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    None
                }
            })
    }

    fn sweep_residuals(
        &self,
        dir: &Path,
        is_tracked: &impl Fn(&Path) -> bool,
        report: &mut Reconciliation,
    ) {
        let files: Vec<PathBuf> = self
            .walk(dir, is_tracked, false)
            .filter(|e| !e.file_type().is_dir())
            .map(|e| e.into_path())
            .collect();

        for path in files {
            if is_media_file(&path) {
                continue;
            }

            if is_image_file(&path) {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        debug!(path = %path.display(), "deleted leftover image");
                        report.deleted_images.push(path);
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "cannot delete leftover image");
                        report.errors += 1;
                    }
                }
                continue;
            }

            match self.relocator.to_unknown(&path) {
                Relocation::Stranded => report.errors += 1,
                _ => report.moved_residuals.push(path),
            }
        }
    }

    fn prune_subtree(
        &self,
        dir: &Path,
        is_tracked: &impl Fn(&Path) -> bool,
        report: &mut Reconciliation,
    ) {
        let dirs: Vec<PathBuf> = self
            .walk(dir, is_tracked, true)
            .filter(|e| e.depth() > 0 && e.file_type().is_dir())
            .map(|e| e.into_path())
            .collect();

        for sub in dirs {
            self.remove_if_empty(&sub, report);
        }
    }

    fn prune_upwards(&self, dir: &Path, report: &mut Reconciliation) {
        let mut current = match fs::canonicalize(dir) {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot resolve directory for pruning");
                report.errors += 1;
                return;
            }
        };

        while current != self.boundary && current.starts_with(&self.boundary) {
            if !self.remove_if_empty(&current, report) {
                break;
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }
    }

    /// Remove `dir` if it has no entries; `true` when it was removed
    fn remove_if_empty(&self, dir: &Path, report: &mut Reconciliation) -> bool {
        match is_empty_dir(dir) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot list directory");
                report.errors += 1;
                return false;
            }
        }

        match fs::remove_dir(dir) {
            Ok(()) => {
                debug!(dir = %dir.display(), "removed empty directory");
                report.removed_dirs.push(dir.to_path_buf());
                true
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot remove empty directory");
                report.errors += 1;
                false
            }
        }
    }
}

fn is_empty_dir(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}
