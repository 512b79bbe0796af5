//! Fixtures shared by the integration tests.
//!
//! Media files here are JSON documents: the tagger keeps the tags, embedded
//! cover MIME types and lyrics in the file body, so they travel with the
//! file when it is moved.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

use shelver::error::{SortError, SortResult};
use shelver::{CoverArt, LockProbe, MediaTagger, Tracker};
use shelver_core::{LibraryLayout, RawTags};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeMedia {
    pub tags: RawTags,
    pub covers: Vec<String>,
    pub lyrics: Option<String>,
}

pub fn read_media(path: &Path) -> FakeMedia {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

pub struct JsonTagger;

impl JsonTagger {
    fn load(path: &Path) -> SortResult<FakeMedia> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| SortError::Tag(e.to_string()))
    }

    fn store(path: &Path, media: &FakeMedia) -> SortResult<()> {
        let bytes = serde_json::to_vec(media).map_err(|e| SortError::Tag(e.to_string()))?;
        fs::write(path, bytes)?;
        Ok(())
    }
}

impl MediaTagger for JsonTagger {
    fn read_fields(&self, path: &Path) -> SortResult<RawTags> {
        Ok(Self::load(path)?.tags)
    }

    fn has_cover_art(&self, path: &Path) -> SortResult<bool> {
        Ok(!Self::load(path)?.covers.is_empty())
    }

    fn attach_cover_art(&self, path: &Path, cover: &CoverArt) -> SortResult<()> {
        let mut media = Self::load(path)?;
        media.covers.push(cover.mime.to_string());
        Self::store(path, &media)
    }

    fn write_lyrics(&self, path: &Path, text: &str) -> SortResult<()> {
        let mut media = Self::load(path)?;
        media.lyrics = Some(text.to_string());
        Self::store(path, &media)
    }
}

/// Reports locked for the first `locked_calls` probes, then unlocked
pub struct ScriptedProbe {
    locked_calls: usize,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn locked_for(locked_calls: usize) -> Self {
        Self {
            locked_calls,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LockProbe for ScriptedProbe {
    fn is_locked(&self, _path: &Path) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst) < self.locked_calls
    }
}

pub const DEBOUNCE: Duration = Duration::from_secs(2);

pub struct Harness {
    _tmp: TempDir,
    pub watch: PathBuf,
    pub sorted: PathBuf,
    pub unknown: PathBuf,
    pub probe: Arc<ScriptedProbe>,
    pub tracker: Tracker,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_probe(ScriptedProbe::locked_for(0))
    }

    pub fn with_probe(probe: ScriptedProbe) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().canonicalize().unwrap();
        let watch = base.join("watch");
        let sorted = base.join("sorted");
        let unknown = base.join("unknown");
        for root in [&watch, &sorted, &unknown] {
            fs::create_dir_all(root).unwrap();
        }

        let layout = LibraryLayout::new(&watch, &sorted, &unknown).unwrap();
        let probe = Arc::new(probe);
        let tracker = Tracker::new(layout, Arc::new(JsonTagger), probe.clone(), DEBOUNCE);

        Self {
            _tmp: tmp,
            watch,
            sorted,
            unknown,
            probe,
            tracker,
        }
    }

    /// Write a media file under the watch root
    pub fn media(&self, rel: &str, tags: RawTags) -> PathBuf {
        let media = FakeMedia {
            tags,
            ..Default::default()
        };
        let path = self.watch.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, serde_json::to_vec(&media).unwrap()).unwrap();
        path
    }

    /// Write an arbitrary file under the watch root
    pub fn file(&self, rel: &str, body: &[u8]) -> PathBuf {
        let path = self.watch.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }
}

pub fn tags(artist: &str, album: &str, title: &str, track: &str, date: &str) -> RawTags {
    let field = |s: &str| (!s.is_empty()).then(|| s.to_string());
    RawTags {
        artist: field(artist),
        album: field(album),
        title: field(title),
        track_number: field(track),
        date: field(date),
    }
}

pub fn image_bytes(format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([10, 120, 200])));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    buffer
}
