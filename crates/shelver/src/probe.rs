//! Write-lock probing.
//!
//! A file still being copied into the watch folder may refuse an exclusive
//! open. The probe retries an append-mode open until it succeeds or the
//! policy's timeout runs out.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Bounded retry window for a lock probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            interval: Duration::from_secs(1),
        }
    }
}

/// Decides whether a file is still held by a writer
pub trait LockProbe: Send + Sync {
    /// `true` while the file is still locked. Blocks for up to the probe's
    /// timeout.
    fn is_locked(&self, path: &Path) -> bool;
}

/// Probes by opening the file for append
#[derive(Debug, Clone, Default)]
pub struct AppendProbe {
    policy: LockPolicy,
}

impl AppendProbe {
    pub fn new(policy: LockPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> LockPolicy {
        self.policy
    }
}

impl LockProbe for AppendProbe {
    fn is_locked(&self, path: &Path) -> bool {
        let deadline = Instant::now() + self.policy.timeout;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match OpenOptions::new().append(true).open(path) {
                Ok(_) => return false,
                // Gone files are dropped by the batch, not waited on
                Err(e) if e.kind() == ErrorKind::NotFound => return false,
                Err(e) => {
                    debug!(path = %path.display(), attempts, error = %e, "file not writable yet");
                }
            }

            if Instant::now() + self.policy.interval > deadline {
                warn!(
                    path = %path.display(),
                    attempts,
                    timeout_ms = self.policy.timeout.as_millis() as u64,
                    "timed out waiting for write lock"
                );
                return true;
            }
            thread::sleep(self.policy.interval);
        }
    }
}
