//! Shelver: a watch-folder music sorter.
//!
//! Files dropped into the watch root are grouped by directory. Once a
//! directory has been quiet for the debounce window and none of its files is
//! still being written, each media file is tagged, enriched with folder cover
//! art and sidecar lyrics, and moved into
//! `sorted/<artist>/<album> (<year>)/<NN> - <title>.<ext>`. Files with
//! incomplete tags go to a mirror of their original location under the
//! unknown root.

pub mod artwork;
pub mod config;
pub mod enrich;
pub mod error;
pub mod probe;
pub mod reconcile;
pub mod relocate;
pub mod service;
pub mod tags;
pub mod tracker;
pub mod watcher;

pub use config::{Cli, Settings};
pub use error::{SortError, SortResult};
pub use probe::{AppendProbe, LockPolicy, LockProbe};
pub use tags::{CoverArt, CoverMime, LoftyTagger, MediaTagger};
pub use tracker::{BatchSummary, CheckOutcome, CreationEvent, Tracker};
