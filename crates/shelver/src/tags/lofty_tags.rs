//! [`MediaTagger`] backed by lofty.

use lofty::config::WriteOptions;
use lofty::file::TaggedFile;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag, TagType};
use std::path::Path;

use super::{CoverArt, CoverMime, MediaTagger};
use crate::error::{SortError, SortResult};
use shelver_core::{MediaFormat, RawTags};

/// Reads and writes tags with lofty, choosing the tag type from the
/// file extension
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagger;

impl LoftyTagger {
    pub fn new() -> Self {
        Self
    }
}

fn format_of(path: &Path) -> SortResult<MediaFormat> {
    MediaFormat::from_path(path).ok_or_else(|| SortError::Unsupported(path.to_path_buf()))
}

fn tag_type_for(format: MediaFormat) -> TagType {
    match format {
        MediaFormat::Mp3 => TagType::Id3v2,
        MediaFormat::Flac | MediaFormat::Ogg => TagType::VorbisComments,
        MediaFormat::M4a => TagType::Mp4Ilst,
    }
}

fn read_file(path: &Path) -> SortResult<TaggedFile> {
    if !path.exists() {
        return Err(SortError::NotFound(path.to_path_buf()));
    }
    Ok(Probe::open(path)?.read()?)
}

/// The tag lofty would write for this format, falling back to whatever the
/// file carries
fn readable_tag(file: &TaggedFile, tag_type: TagType) -> Option<&Tag> {
    file.tag(tag_type)
        .or_else(|| file.primary_tag())
        .or_else(|| file.first_tag())
}

/// Open the format's tag for writing, inserting an empty one if absent
fn writable_tag(file: &mut TaggedFile, tag_type: TagType) -> SortResult<&mut Tag> {
    if file.tag(tag_type).is_none() {
        file.insert_tag(Tag::new(tag_type));
    }
    file.tag_mut(tag_type)
        .ok_or_else(|| SortError::Tag(format!("cannot create {:?} tag", tag_type)))
}

fn text(tag: &Tag, key: &ItemKey) -> Option<String> {
    tag.get_string(key).map(|s| s.to_string())
}

impl MediaTagger for LoftyTagger {
    fn read_fields(&self, path: &Path) -> SortResult<RawTags> {
        let format = format_of(path)?;
        let file = read_file(path)?;

        let Some(tag) = readable_tag(&file, tag_type_for(format)) else {
            return Ok(RawTags::default());
        };

        Ok(RawTags {
            artist: text(tag, &ItemKey::TrackArtist),
            album: text(tag, &ItemKey::AlbumTitle),
            title: text(tag, &ItemKey::TrackTitle),
            track_number: text(tag, &ItemKey::TrackNumber),
            date: text(tag, &ItemKey::RecordingDate).or_else(|| text(tag, &ItemKey::Year)),
        })
    }

    fn has_cover_art(&self, path: &Path) -> SortResult<bool> {
        let format = format_of(path)?;
        let file = read_file(path)?;

        let Some(tag) = readable_tag(&file, tag_type_for(format)) else {
            return Ok(false);
        };

        let pictures = tag.pictures();
        if format.requires_front_cover_type() {
            Ok(pictures
                .iter()
                .any(|p| p.pic_type() == PictureType::CoverFront))
        } else {
            Ok(!pictures.is_empty())
        }
    }

    fn attach_cover_art(&self, path: &Path, cover: &CoverArt) -> SortResult<()> {
        let format = format_of(path)?;
        let mut file = read_file(path)?;
        let tag = writable_tag(&mut file, tag_type_for(format))?;

        let mime = match cover.mime {
            CoverMime::Jpeg => MimeType::Jpeg,
            CoverMime::Png => MimeType::Png,
        };
        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(mime),
            None,
            cover.data.clone(),
        ));

        tag.save_to_path(path, WriteOptions::default())?;
        Ok(())
    }

    fn write_lyrics(&self, path: &Path, text: &str) -> SortResult<()> {
        let format = format_of(path)?;
        let mut file = read_file(path)?;
        let tag = writable_tag(&mut file, tag_type_for(format))?;

        if !tag.insert_text(ItemKey::Lyrics, text.to_string()) {
            return Err(SortError::Tag(format!(
                "{} tags cannot hold lyrics",
                format
            )));
        }

        tag.save_to_path(path, WriteOptions::default())?;
        Ok(())
    }
}
