//! The event loop.
//!
//! Watcher arrivals and a periodic tick both lead to readiness checks. The
//! gate ([`Tracker::claim`]) runs inline; claimed checks go to the blocking
//! pool so a directory waiting on a lock never holds up the others.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::error::SortResult;
use crate::probe::AppendProbe;
use crate::tags::LoftyTagger;
use crate::tracker::{CheckOutcome, CreationEvent, Tracker};
use crate::watcher::FolderWatcher;

pub struct Service {
    tracker: Arc<Tracker>,
    tick: Duration,
    tasks: JoinSet<()>,
}

impl Service {
    pub fn new(tracker: Arc<Tracker>, tick: Duration) -> Self {
        Self {
            tracker,
            tick,
            tasks: JoinSet::new(),
        }
    }

    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }

    /// Start a check for `dir` unless the gate turns it away
    fn schedule(&mut self, dir: &Path) {
        match self.tracker.claim(dir, Instant::now()) {
            Ok(claim) => {
                let tracker = Arc::clone(&self.tracker);
                self.tasks.spawn_blocking(move || {
                    let dir = claim.dir().to_path_buf();
                    match tracker.process_claimed(claim) {
                        CheckOutcome::Processed(summary) => {
                            debug!(dir = %dir.display(), sorted = summary.sorted, failed = summary.failed(), "check done");
                        }
                        other => debug!(dir = %dir.display(), outcome = ?other, "check deferred"),
                    }
                });
            }
            Err(CheckOutcome::Untracked) => {}
            Err(outcome) => {
                debug!(dir = %dir.display(), outcome = ?outcome, "not ready");
            }
        }
    }

    fn on_task_finished(result: Result<(), tokio::task::JoinError>) {
        if let Err(e) = result {
            error!(error = %e, "readiness check panicked");
        }
    }

    /// Process events and ticks until `shutdown` resolves or the event
    /// channel closes. In-flight checks keep running; see [`Service::drain`].
    pub async fn serve(
        mut self,
        mut events: UnboundedReceiver<CreationEvent>,
        shutdown: impl Future<Output = ()>,
    ) -> Self {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        if let Some(dir) = self.tracker.record(&event, Instant::now()) {
                            self.schedule(&dir);
                        }
                    }
                    None => {
                        info!("event stream closed");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    for dir in self.tracker.tracked_dirs() {
                        self.schedule(&dir);
                    }
                }
                Some(result) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    Self::on_task_finished(result);
                }
            }
        }

        self
    }

    /// Wait for every in-flight check to finish
    pub async fn drain(mut self) {
        if !self.tasks.is_empty() {
            info!(in_flight = self.tasks.len(), "waiting for running batches");
        }
        while let Some(result) = self.tasks.join_next().await {
            Self::on_task_finished(result);
        }
    }
}

/// Prepare the roots, start watching and run until `shutdown`
pub async fn run(settings: Settings, shutdown: impl Future<Output = ()>) -> SortResult<()> {
    let layout = settings.prepare()?;
    info!(
        watch = %layout.watch_root().display(),
        sorted = %layout.sorted_root().display(),
        unknown = %layout.unknown_root().display(),
        "roots ready"
    );

    let tracker = Arc::new(Tracker::new(
        layout.clone(),
        Arc::new(LoftyTagger::new()),
        Arc::new(AppendProbe::new(settings.lock)),
        settings.debounce,
    ));

    let (tx, rx) = mpsc::unbounded_channel();
    let watcher = FolderWatcher::start(layout.watch_root(), settings.watcher_debounce, tx)?;

    let service = Service::new(tracker, settings.tick).serve(rx, shutdown).await;
    drop(watcher);
    service.drain().await;

    info!("stopped");
    Ok(())
}
