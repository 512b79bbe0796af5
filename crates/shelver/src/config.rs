//! Command line and runtime settings.

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SortResult;
use crate::probe::LockPolicy;
use shelver_core::LibraryLayout;

/// Sort music dropped into a watch folder into an artist/album library
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "shelver")]
#[command(version)]
pub struct Cli {
    /// Folder to watch for new files
    #[arg(long, default_value = "watch", env = "SHELVER_WATCH")]
    pub watch: PathBuf,

    /// Library root for fully tagged tracks
    #[arg(long, default_value = "sorted", env = "SHELVER_SORTED")]
    pub sorted: PathBuf,

    /// Root for files that could not be sorted
    #[arg(long, default_value = "unknown", env = "SHELVER_UNKNOWN")]
    pub unknown: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub watch_root: PathBuf,
    pub sorted_root: PathBuf,
    pub unknown_root: PathBuf,
    /// Quiet period after the last arrival before a directory is processed
    pub debounce: Duration,
    /// Interval of the periodic readiness sweep
    pub tick: Duration,
    pub lock: LockPolicy,
    /// Coalescing window of the filesystem watcher
    pub watcher_debounce: Duration,
}

impl Settings {
    pub fn new(
        watch_root: impl Into<PathBuf>,
        sorted_root: impl Into<PathBuf>,
        unknown_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            watch_root: watch_root.into(),
            sorted_root: sorted_root.into(),
            unknown_root: unknown_root.into(),
            debounce: Duration::from_secs(2),
            tick: Duration::from_secs(1),
            lock: LockPolicy::default(),
            watcher_debounce: Duration::from_millis(500),
        }
    }

    /// Create the three roots if needed and build the layout from their
    /// canonical paths
    pub fn prepare(&self) -> SortResult<LibraryLayout> {
        let watch = ensure_dir(&self.watch_root)?;
        let sorted = ensure_dir(&self.sorted_root)?;
        let unknown = ensure_dir(&self.unknown_root)?;
        Ok(LibraryLayout::new(watch, sorted, unknown)?)
    }
}

impl From<Cli> for Settings {
    fn from(cli: Cli) -> Self {
        Settings::new(cli.watch, cli.sorted, cli.unknown)
    }
}

fn ensure_dir(path: &Path) -> SortResult<PathBuf> {
    fs::create_dir_all(path)?;
    Ok(fs::canonicalize(path)?)
}
