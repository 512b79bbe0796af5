//! Cover and lyrics embedding ahead of the move into the library.
//!
//! Both steps are best effort: a failure is logged and reported, and the
//! file is filed regardless.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::tags::{CoverArt, MediaTagger};
use shelver_core::lyrics_sidecar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverStep {
    Attached,
    AlreadyPresent,
    /// No cover found for the batch
    NoneAvailable,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsStep {
    Embedded,
    NoSidecar,
    Failed,
}

/// What enrichment did to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enrichment {
    pub cover: CoverStep,
    pub lyrics: LyricsStep,
}

pub struct Enricher {
    tagger: Arc<dyn MediaTagger>,
}

impl Enricher {
    pub fn new(tagger: Arc<dyn MediaTagger>) -> Self {
        Self { tagger }
    }

    /// Embed the batch cover (unless one is present) and any sidecar lyrics
    pub fn enrich(&self, path: &Path, cover: Option<&CoverArt>) -> Enrichment {
        Enrichment {
            cover: self.embed_cover(path, cover),
            lyrics: self.embed_lyrics(path),
        }
    }

    fn embed_cover(&self, path: &Path, cover: Option<&CoverArt>) -> CoverStep {
        let Some(cover) = cover else {
            return CoverStep::NoneAvailable;
        };

        match self.tagger.has_cover_art(path) {
            Ok(true) => {
                debug!(path = %path.display(), "cover already embedded");
                return CoverStep::AlreadyPresent;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot inspect embedded cover");
                return CoverStep::Failed;
            }
        }

        match self.tagger.attach_cover_art(path, cover) {
            Ok(()) => {
                info!(path = %path.display(), mime = %cover.mime, "embedded cover art");
                CoverStep::Attached
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to embed cover art");
                CoverStep::Failed
            }
        }
    }

    fn embed_lyrics(&self, path: &Path) -> LyricsStep {
        let sidecar = lyrics_sidecar(path);
        if !sidecar.is_file() {
            return LyricsStep::NoSidecar;
        }

        let text = match fs::read_to_string(&sidecar) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %sidecar.display(), error = %e, "cannot read lyrics sidecar");
                return LyricsStep::Failed;
            }
        };

        if let Err(e) = self.tagger.write_lyrics(path, &text) {
            warn!(path = %path.display(), error = %e, "failed to embed lyrics");
            return LyricsStep::Failed;
        }

        // Sidecar goes only once the lyrics are safely in the file
        if let Err(e) = fs::remove_file(&sidecar) {
            warn!(path = %sidecar.display(), error = %e, "lyrics embedded but sidecar not removed");
        }
        info!(path = %path.display(), "embedded lyrics");
        LyricsStep::Embedded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SortError, SortResult};
    use crate::tags::CoverMime;
    use parking_lot::Mutex;
    use shelver_core::RawTags;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::tempdir;

    /// In-memory tagger keyed by path
    #[derive(Default)]
    struct MemoryTagger {
        covers: Mutex<HashMap<PathBuf, usize>>,
        lyrics: Mutex<HashMap<PathBuf, String>>,
        fail_writes: bool,
    }

    impl MediaTagger for MemoryTagger {
        fn read_fields(&self, _path: &Path) -> SortResult<RawTags> {
            Ok(RawTags::default())
        }

        fn has_cover_art(&self, path: &Path) -> SortResult<bool> {
            Ok(self.covers.lock().get(path).copied().unwrap_or(0) > 0)
        }

        fn attach_cover_art(&self, path: &Path, _cover: &CoverArt) -> SortResult<()> {
            if self.fail_writes {
                return Err(SortError::Tag("read-only".to_string()));
            }
            *self.covers.lock().entry(path.to_path_buf()).or_default() += 1;
            Ok(())
        }

        fn write_lyrics(&self, path: &Path, text: &str) -> SortResult<()> {
            if self.fail_writes {
                return Err(SortError::Tag("read-only".to_string()));
            }
            self.lyrics
                .lock()
                .insert(path.to_path_buf(), text.to_string());
            Ok(())
        }
    }

    fn cover() -> CoverArt {
        CoverArt {
            data: vec![0xFF, 0xD8, 0xFF],
            mime: CoverMime::Jpeg,
        }
    }

    #[test]
    fn test_cover_attached_once() {
        let dir = tempdir().unwrap();
        let track = dir.path().join("01.mp3");
        fs::write(&track, b"audio").unwrap();

        let tagger = Arc::new(MemoryTagger::default());
        let enricher = Enricher::new(tagger.clone());

        let first = enricher.enrich(&track, Some(&cover()));
        assert_eq!(first.cover, CoverStep::Attached);

        let second = enricher.enrich(&track, Some(&cover()));
        assert_eq!(second.cover, CoverStep::AlreadyPresent);
        assert_eq!(tagger.covers.lock().get(&track), Some(&1));
    }

    #[test]
    fn test_no_cover_available() {
        let dir = tempdir().unwrap();
        let track = dir.path().join("01.mp3");
        fs::write(&track, b"audio").unwrap();

        let enricher = Enricher::new(Arc::new(MemoryTagger::default()));
        let report = enricher.enrich(&track, None);
        assert_eq!(
            report,
            Enrichment {
                cover: CoverStep::NoneAvailable,
                lyrics: LyricsStep::NoSidecar,
            }
        );
    }

    #[test]
    fn test_lyrics_embedded_and_sidecar_removed() {
        let dir = tempdir().unwrap();
        let track = dir.path().join("01 Song.flac");
        let sidecar = dir.path().join("01 Song.lrc");
        fs::write(&track, b"audio").unwrap();
        fs::write(&sidecar, "[00:01.00]hello").unwrap();

        let tagger = Arc::new(MemoryTagger::default());
        let enricher = Enricher::new(tagger.clone());
        let report = enricher.enrich(&track, None);

        assert_eq!(report.lyrics, LyricsStep::Embedded);
        assert!(!sidecar.exists());
        assert_eq!(
            tagger.lyrics.lock().get(&track).map(String::as_str),
            Some("[00:01.00]hello")
        );
    }

    #[test]
    fn test_failed_save_keeps_sidecar() {
        let dir = tempdir().unwrap();
        let track = dir.path().join("01.ogg");
        let sidecar = dir.path().join("01.lrc");
        fs::write(&track, b"audio").unwrap();
        fs::write(&sidecar, "words").unwrap();

        let tagger = Arc::new(MemoryTagger {
            fail_writes: true,
            ..Default::default()
        });
        let enricher = Enricher::new(tagger);
        let report = enricher.enrich(&track, Some(&cover()));

        assert_eq!(report.cover, CoverStep::Failed);
        assert_eq!(report.lyrics, LyricsStep::Failed);
        assert!(sidecar.exists());
    }

    #[test]
    fn test_non_utf8_sidecar_fails_softly() {
        let dir = tempdir().unwrap();
        let track = dir.path().join("01.mp3");
        let sidecar = dir.path().join("01.lrc");
        fs::write(&track, b"audio").unwrap();
        fs::write(&sidecar, [0xC3u8, 0x28]).unwrap();

        let enricher = Enricher::new(Arc::new(MemoryTagger::default()));
        assert_eq!(enricher.enrich(&track, None).lyrics, LyricsStep::Failed);
        assert!(sidecar.exists());
    }
}
