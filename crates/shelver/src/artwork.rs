//! Folder cover art discovery.
//!
//! A batch looks for one usable image among the direct entries of its
//! directory. Candidates are tried in file-name order and the first one whose
//! bytes decode as JPEG or PNG wins.

use image::{ImageFormat, ImageReader};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::tags::{CoverArt, CoverMime};
use shelver_core::is_image_file;

/// Identify image bytes as JPEG or PNG. The header must match and the
/// dimensions must be readable; anything else is `None`.
pub fn decode_format(bytes: &[u8]) -> Option<CoverMime> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;

    let mime = match reader.format()? {
        ImageFormat::Jpeg => CoverMime::Jpeg,
        ImageFormat::Png => CoverMime::Png,
        _ => return None,
    };

    reader.into_dimensions().ok().map(|_| mime)
}

fn image_candidates(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| is_image_file(p))
        .collect();
    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(candidates)
}

/// Find the first decodable cover image directly inside `dir`
pub fn locate_cover(dir: &Path) -> Option<CoverArt> {
    let candidates = match image_candidates(dir) {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot list directory for cover art");
            return None;
        }
    };

    for path in candidates {
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read cover candidate");
                continue;
            }
        };

        match decode_format(&data) {
            Some(mime) => {
                debug!(path = %path.display(), %mime, "using folder cover");
                return Some(CoverArt { data, mime });
            }
            None => {
                warn!(path = %path.display(), "cover candidate is not a valid JPEG or PNG");
            }
        }
    }

    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use tempfile::tempdir;

    pub(crate) fn encoded(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([200, 30, 30])));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }

    #[test]
    fn test_decode_format() {
        assert_eq!(decode_format(&encoded(ImageFormat::Png)), Some(CoverMime::Png));
        assert_eq!(decode_format(&encoded(ImageFormat::Jpeg)), Some(CoverMime::Jpeg));
        assert_eq!(decode_format(b"not an image"), None);
        assert_eq!(decode_format(&[]), None);
    }

    #[test]
    fn test_decode_rejects_other_formats() {
        assert_eq!(decode_format(&encoded(ImageFormat::Bmp)), None);
    }

    #[test]
    fn test_decode_rejects_truncated_header() {
        let png = encoded(ImageFormat::Png);
        assert_eq!(decode_format(&png[..10]), None);
    }

    #[test]
    fn test_locate_cover_first_valid_in_name_order() {
        let dir = tempdir().unwrap();
        // Sorts first but is not an image
        fs::write(dir.path().join("a_broken.jpg"), b"garbage").unwrap();
        fs::write(dir.path().join("b_cover.png"), encoded(ImageFormat::Png)).unwrap();
        fs::write(dir.path().join("c_folder.jpg"), encoded(ImageFormat::Jpeg)).unwrap();

        let cover = locate_cover(dir.path()).unwrap();
        assert_eq!(cover.mime, CoverMime::Png);
        assert_eq!(cover.data, encoded(ImageFormat::Png));
    }

    #[test]
    fn test_locate_cover_case_insensitive_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("COVER.JPG"), encoded(ImageFormat::Jpeg)).unwrap();

        let cover = locate_cover(dir.path()).unwrap();
        assert_eq!(cover.mime, CoverMime::Jpeg);
    }

    #[test]
    fn test_locate_cover_is_not_recursive() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("scans");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("cover.png"), encoded(ImageFormat::Png)).unwrap();
        fs::write(dir.path().join("track.mp3"), b"audio").unwrap();

        assert!(locate_cover(dir.path()).is_none());
    }

    #[test]
    fn test_locate_cover_missing_directory() {
        assert!(locate_cover(Path::new("/nonexistent/shelver/dir")).is_none());
    }
}
