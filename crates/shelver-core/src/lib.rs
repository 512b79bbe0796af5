//! Shelver core: the pure decisions of the music sorter.
//!
//! Nothing in this crate touches the filesystem. It classifies paths,
//! validates tag text and computes destinations; the `shelver` crate does
//! the I/O around it.

pub mod destination;
pub mod formats;
pub mod metadata;
pub mod sanitize;

pub use destination::{LayoutError, LibraryLayout};
pub use formats::{MediaFormat, is_image_file, is_media_file, lyrics_sidecar};
pub use metadata::{
    ExtractedMetadata, Extraction, FieldProblem, RawTags, TagField, TrackMetadata, extract,
};
pub use sanitize::{is_usable_segment, sanitize};
