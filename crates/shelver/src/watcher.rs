//! Filesystem watching.
//!
//! Adapts notify's debounced event stream into [`CreationEvent`]s on a tokio
//! channel. Only arrivals matter: files created in the tree and files
//! renamed into it.

use notify_debouncer_full::notify::event::{CreateKind, ModifyKind, RenameMode};
use notify_debouncer_full::notify::{self, Event, EventKind, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, Debouncer, RecommendedCache, new_debouncer};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::SortResult;
use crate::tracker::CreationEvent;

/// Live watch on the watch root. Dropping it stops the watch.
pub struct FolderWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher, RecommendedCache>,
}

impl FolderWatcher {
    /// Watch `root` recursively and forward arrivals to `tx`
    pub fn start(
        root: &Path,
        debounce: Duration,
        tx: UnboundedSender<CreationEvent>,
    ) -> SortResult<Self> {
        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events.iter() {
                        for arrival in creation_events(event) {
                            debug!(path = %arrival.path.display(), is_dir = arrival.is_dir, "fs arrival");
                            if tx.send(arrival).is_err() {
                                // Receiver gone: the service is shutting down
                                return;
                            }
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        warn!(error = ?error, "watcher error");
                    }
                }
            }
        })?;

        debouncer.watch(root, RecursiveMode::Recursive)?;
        info!(root = %root.display(), "watching");

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

/// Arrivals described by one notify event
pub fn creation_events(event: &Event) -> Vec<CreationEvent> {
    match &event.kind {
        EventKind::Create(kind) => event
            .paths
            .iter()
            .flat_map(|path| {
                let is_dir = match kind {
                    CreateKind::Folder => true,
                    CreateKind::File => false,
                    _ => path.is_dir(),
                };
                arrivals_at(path, is_dir)
            })
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event
            .paths
            .iter()
            .flat_map(|path| arrivals_at(path, path.is_dir()))
            .collect(),
        // Paths are [from, to]
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event
            .paths
            .last()
            .map(|to| arrivals_at(to, to.is_dir()))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// A directory that shows up whole (moved in from outside the tree) brings
/// its files with it, and notify reports only the directory
fn arrivals_at(path: &Path, is_dir: bool) -> Vec<CreationEvent> {
    if !is_dir {
        return vec![CreationEvent::file(path)];
    }

    let mut arrivals = vec![CreationEvent::dir(path)];
    arrivals.extend(
        WalkDir::new(path)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| CreationEvent::file(entry.into_path())),
    );
    arrivals
}
