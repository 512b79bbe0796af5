//! Directory readiness tracking.
//!
//! Each directory that receives media files gets a [`DirectoryState`]. A
//! directory is processed once no new file has arrived for the debounce
//! window and none of its pending files is still held by a writer. The
//! batch then tags, enriches and files every pending file, and when the
//! directory has drained, reconciles whatever is left.
//!
//! Checks are split in two: [`Tracker::claim`] is the cheap, non-blocking
//! gate (tracked? already running? still settling?) and
//! [`Tracker::process_claimed`] does the blocking probe and batch work. At
//! most one claim per directory is outstanding at a time.

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::artwork::locate_cover;
use crate::enrich::Enricher;
use crate::probe::LockProbe;
use crate::reconcile::{Reconciler, Reconciliation};
use crate::relocate::{Relocation, Relocator};
use crate::tags::MediaTagger;
use shelver_core::{Extraction, LibraryLayout, extract, is_media_file};

/// A file or directory appeared under the watch root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationEvent {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl CreationEvent {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }
}

/// Bookkeeping for one directory with files in flight
#[derive(Debug, Clone)]
pub struct DirectoryState {
    pending: BTreeSet<PathBuf>,
    processed: BTreeSet<PathBuf>,
    failed: BTreeSet<PathBuf>,
    last_arrival: Instant,
    /// Bumped on every arrival; lets a check notice arrivals during probing
    arrivals: u64,
    in_flight: bool,
}

impl DirectoryState {
    fn new(now: Instant) -> Self {
        Self {
            pending: BTreeSet::new(),
            processed: BTreeSet::new(),
            failed: BTreeSet::new(),
            last_arrival: now,
            arrivals: 0,
            in_flight: false,
        }
    }

    fn arrive(&mut self, path: PathBuf, now: Instant) {
        self.processed.remove(&path);
        self.failed.remove(&path);
        self.pending.insert(path);
        self.last_arrival = now;
        self.arrivals += 1;
    }

    fn dispose(&mut self, path: &Path, relocation: &Relocation) {
        self.pending.remove(path);
        if relocation.is_sorted() {
            self.processed.insert(path.to_path_buf());
        } else {
            self.failed.insert(path.to_path_buf());
        }
    }

    pub fn pending(&self) -> &BTreeSet<PathBuf> {
        &self.pending
    }

    pub fn processed(&self) -> &BTreeSet<PathBuf> {
        &self.processed
    }

    pub fn failed(&self) -> &BTreeSet<PathBuf> {
        &self.failed
    }

    pub fn last_arrival(&self) -> Instant {
        self.last_arrival
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}

/// Counts for one processing pass over a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub sorted: usize,
    pub unknown: usize,
    /// Files every move attempt failed for; counted as failed
    pub stranded: usize,
    /// Pending files that had disappeared before they were processed
    pub vanished: usize,
    /// Set when the directory drained and was reconciled
    pub reconciliation: Option<Reconciliation>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.unknown + self.stranded
    }

    pub fn drained(&self) -> bool {
        self.reconciliation.is_some()
    }
}

/// Result of one readiness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No state for this directory
    Untracked,
    /// Another check for this directory is running
    Busy,
    /// Inside the debounce window, or files arrived while probing
    Settling,
    /// These pending files are still being written
    Locked { locked: Vec<PathBuf> },
    Processed(BatchSummary),
}

/// Permission to run one check on a directory. Must be handed back to
/// [`Tracker::process_claimed`], which releases it.
#[must_use]
#[derive(Debug)]
pub struct Claim {
    dir: PathBuf,
    arrivals: u64,
}

impl Claim {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Clears the in-flight flag however the check ends
struct InFlight<'a> {
    registry: &'a Mutex<HashMap<PathBuf, DirectoryState>>,
    dir: &'a Path,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.registry.lock().get_mut(self.dir) {
            state.in_flight = false;
        }
    }
}

pub struct Tracker {
    registry: Mutex<HashMap<PathBuf, DirectoryState>>,
    debounce: Duration,
    probe: Arc<dyn LockProbe>,
    tagger: Arc<dyn MediaTagger>,
    enricher: Enricher,
    relocator: Relocator,
    reconciler: Reconciler,
}

impl Tracker {
    pub fn new(
        layout: LibraryLayout,
        tagger: Arc<dyn MediaTagger>,
        probe: Arc<dyn LockProbe>,
        debounce: Duration,
    ) -> Self {
        let relocator = Relocator::new(layout);
        Self {
            registry: Mutex::new(HashMap::new()),
            debounce,
            probe,
            enricher: Enricher::new(Arc::clone(&tagger)),
            tagger,
            reconciler: Reconciler::new(relocator.clone()),
            relocator,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Register an arrival. Returns the directory to check when the event
    /// is a media file.
    pub fn record(&self, event: &CreationEvent, now: Instant) -> Option<PathBuf> {
        if event.is_dir || !is_media_file(&event.path) {
            return None;
        }
        let dir = event.path.parent()?.to_path_buf();

        let mut registry = self.registry.lock();
        let state = registry
            .entry(dir.clone())
            .or_insert_with(|| DirectoryState::new(now));
        state.arrive(event.path.clone(), now);
        debug!(path = %event.path.display(), pending = state.pending.len(), "arrival");

        Some(dir)
    }

    /// Directories currently tracked
    pub fn tracked_dirs(&self) -> Vec<PathBuf> {
        self.registry.lock().keys().cloned().collect()
    }

    pub fn is_tracked(&self, dir: &Path) -> bool {
        self.registry.lock().contains_key(dir)
    }

    /// Copy of a directory's state
    pub fn state(&self, dir: &Path) -> Option<DirectoryState> {
        self.registry.lock().get(dir).cloned()
    }

    /// Cheap readiness gate. On success the directory is marked in flight
    /// until the returned claim is processed.
    pub fn claim(&self, dir: &Path, now: Instant) -> Result<Claim, CheckOutcome> {
        let mut registry = self.registry.lock();
        let Some(state) = registry.get_mut(dir) else {
            return Err(CheckOutcome::Untracked);
        };

        if state.in_flight {
            return Err(CheckOutcome::Busy);
        }
        if now.saturating_duration_since(state.last_arrival) < self.debounce {
            return Err(CheckOutcome::Settling);
        }

        state.in_flight = true;
        Ok(Claim {
            dir: dir.to_path_buf(),
            arrivals: state.arrivals,
        })
    }

    /// Probe the claimed directory and, if nothing is locked, run its
    /// batch. Blocks; run it off the event loop.
    pub fn process_claimed(&self, claim: Claim) -> CheckOutcome {
        let dir = claim.dir.as_path();
        let _in_flight = InFlight {
            registry: &self.registry,
            dir,
        };

        let Some(snapshot) = self.pending_snapshot(dir) else {
            return CheckOutcome::Untracked;
        };

        let locked: Vec<PathBuf> = snapshot
            .iter()
            .filter(|path| path.exists() && self.probe.is_locked(path))
            .cloned()
            .collect();
        if !locked.is_empty() {
            info!(dir = %dir.display(), locked = locked.len(), "files still being written, deferring");
            return CheckOutcome::Locked { locked };
        }

        let arrived_meanwhile = self
            .registry
            .lock()
            .get(dir)
            .map(|state| state.arrivals != claim.arrivals)
            .unwrap_or(false);
        if arrived_meanwhile {
            debug!(dir = %dir.display(), "new arrivals while probing, deferring");
            return CheckOutcome::Settling;
        }

        CheckOutcome::Processed(self.run_batch(dir, &snapshot))
    }

    /// Claim and process in one call
    pub fn check_directory(&self, dir: &Path, now: Instant) -> CheckOutcome {
        match self.claim(dir, now) {
            Ok(claim) => self.process_claimed(claim),
            Err(outcome) => outcome,
        }
    }

    fn pending_snapshot(&self, dir: &Path) -> Option<Vec<PathBuf>> {
        self.registry
            .lock()
            .get(dir)
            .map(|state| state.pending.iter().cloned().collect())
    }

    fn read_tags(&self, path: &Path) -> Extraction {
        let extraction = match self.tagger.read_fields(path) {
            Ok(raw) => extract(&raw),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read tags");
                Extraction::unreadable()
            }
        };
        for problem in &extraction.problems {
            info!(path = %path.display(), "{}", problem);
        }
        extraction
    }

    fn run_batch(&self, dir: &Path, snapshot: &[PathBuf]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let cover = locate_cover(dir);

        for path in snapshot {
            if !path.exists() {
                debug!(path = %path.display(), "pending file vanished");
                if let Some(state) = self.registry.lock().get_mut(dir) {
                    state.pending.remove(path);
                }
                summary.vanished += 1;
                continue;
            }

            // Only files bound for the library are enriched
            let destination = self
                .read_tags(path)
                .track()
                .and_then(|track| self.relocator.sorted_destination(path, &track));
            let relocation = match destination {
                Some(dest) => {
                    self.enricher.enrich(path, cover.as_ref());
                    self.relocator.to_sorted(path, &dest)
                }
                None => self.relocator.to_unknown(path),
            };

            match relocation {
                Relocation::Sorted(_) => summary.sorted += 1,
                Relocation::Unknown(_) => summary.unknown += 1,
                Relocation::Stranded => summary.stranded += 1,
            }
            if let Some(state) = self.registry.lock().get_mut(dir) {
                state.dispose(path, &relocation);
            }
        }

        let drained = self
            .registry
            .lock()
            .get(dir)
            .map(|state| state.pending.is_empty())
            .unwrap_or(true);

        if drained {
            let report = self.reconciler.reconcile(dir, |p| self.is_tracked(p));

            let mut registry = self.registry.lock();
            let still_empty = registry
                .get(dir)
                .map(|state| state.pending.is_empty())
                .unwrap_or(true);
            if still_empty {
                registry.remove(dir);
            }
            summary.reconciliation = Some(report);
        }

        info!(
            dir = %dir.display(),
            sorted = summary.sorted,
            failed = summary.failed(),
            vanished = summary.vanished,
            drained = summary.drained(),
            "batch complete"
        );
        summary
    }
}
