//! Tag validation.
//!
//! The application reads the raw text of five fields from a media file
//! ([`RawTags`]); this module turns that into an [`Extraction`]: the parsed
//! values plus a list of everything that was missing or malformed. Only a
//! fully populated record becomes a [`TrackMetadata`], which is the sole input
//! the library layout accepts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// First value of each required field, as read from the file's tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTags {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    /// Track number, possibly with a total suffix ("3/10")
    pub track_number: Option<String>,
    /// Release date, any precision ("1999", "1999-05-01")
    pub date: Option<String>,
}

/// The fields a file must carry to be filed into the sorted library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagField {
    Artist,
    Album,
    Title,
    TrackNumber,
    Year,
}

impl TagField {
    pub const ALL: [TagField; 5] = [
        TagField::Artist,
        TagField::Album,
        TagField::Title,
        TagField::TrackNumber,
        TagField::Year,
    ];

    /// Tag name as it appears in log output
    pub fn name(&self) -> &'static str {
        match self {
            TagField::Artist => "artist",
            TagField::Album => "album",
            TagField::Title => "title",
            TagField::TrackNumber => "tracknumber",
            TagField::Year => "date",
        }
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a required field could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    /// Absent or blank
    Missing(TagField),
    /// Present but unparseable
    Invalid { field: TagField, value: String },
}

impl FieldProblem {
    pub fn field(&self) -> TagField {
        match self {
            FieldProblem::Missing(field) => *field,
            FieldProblem::Invalid { field, .. } => *field,
        }
    }
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProblem::Missing(field) => write!(f, "missing {} tag", field),
            FieldProblem::Invalid { field, value } => {
                write!(f, "invalid {} tag: {:?}", field, value)
            }
        }
    }
}

/// Parsed values of the required fields; each is independently optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub track_number: Option<u32>,
    /// First four characters of the date field
    pub year: Option<String>,
}

impl ExtractedMetadata {
    /// Fields that are not populated, in [`TagField::ALL`] order
    pub fn missing_fields(&self) -> Vec<TagField> {
        TagField::ALL
            .into_iter()
            .filter(|field| match field {
                TagField::Artist => self.artist.is_none(),
                TagField::Album => self.album.is_none(),
                TagField::Title => self.title.is_none(),
                TagField::TrackNumber => self.track_number.is_none(),
                TagField::Year => self.year.is_none(),
            })
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.to_track().is_some()
    }

    /// The complete record, if every field is present
    pub fn to_track(&self) -> Option<TrackMetadata> {
        Some(TrackMetadata {
            artist: self.artist.clone()?,
            album: self.album.clone()?,
            title: self.title.clone()?,
            track_number: self.track_number?,
            year: self.year.clone()?,
        })
    }
}

/// A record with every required field present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub track_number: u32,
    pub year: String,
}

impl TrackMetadata {
    /// Track number zero-padded to two digits ("03", "12", "104")
    pub fn track_label(&self) -> String {
        format!("{:02}", self.track_number)
    }
}

/// Outcome of validating one file's tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub metadata: ExtractedMetadata,
    pub problems: Vec<FieldProblem>,
}

impl Extraction {
    /// Extraction for a file whose tags could not be read at all
    pub fn unreadable() -> Self {
        Self {
            metadata: ExtractedMetadata::default(),
            problems: TagField::ALL.into_iter().map(FieldProblem::Missing).collect(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.metadata.is_valid()
    }

    pub fn track(&self) -> Option<TrackMetadata> {
        self.metadata.to_track()
    }
}

/// Validate raw tag text into an [`Extraction`].
///
/// Blank values count as missing. The track number may carry a `/total`
/// suffix; anything else that does not parse to a positive integer is
/// reported as invalid and treated as missing. The year is the first four
/// characters of the date.
pub fn extract(raw: &RawTags) -> Extraction {
    let mut problems = Vec::new();

    let mut text = |field: TagField, value: &Option<String>| -> Option<String> {
        match value.as_deref() {
            Some(v) if !v.trim().is_empty() => Some(v.to_string()),
            _ => {
                problems.push(FieldProblem::Missing(field));
                None
            }
        }
    };

    let artist = text(TagField::Artist, &raw.artist);
    let album = text(TagField::Album, &raw.album);
    let title = text(TagField::Title, &raw.title);
    let track_text = text(TagField::TrackNumber, &raw.track_number);
    let date = text(TagField::Year, &raw.date);

    let track_number = track_text.and_then(|value| match parse_track_number(&value) {
        Some(n) => Some(n),
        None => {
            problems.push(FieldProblem::Invalid {
                field: TagField::TrackNumber,
                value,
            });
            None
        }
    });

    Extraction {
        metadata: ExtractedMetadata {
            artist,
            album,
            title,
            track_number,
            year: date.map(|d| year_from_date(&d)),
        },
        problems,
    }
}

/// Parse a track number, ignoring a trailing "/total" suffix.
///
/// Returns `None` for non-numeric values and for zero.
pub fn parse_track_number(value: &str) -> Option<u32> {
    let number = value.split('/').next().unwrap_or(value).trim();
    match number.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

/// Truncate a date to its first four characters
pub fn year_from_date(date: &str) -> String {
    date.trim().chars().take(4).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_tags() -> RawTags {
        RawTags {
            artist: Some("Foo/Bar!".to_string()),
            album: Some("Best".to_string()),
            title: Some("Song".to_string()),
            track_number: Some("3/10".to_string()),
            date: Some("1999-05-01".to_string()),
        }
    }

    #[test]
    fn test_extract_complete_record() {
        let extraction = extract(&full_tags());

        assert!(extraction.problems.is_empty());
        assert!(extraction.is_valid());

        let track = extraction.track().unwrap();
        assert_eq!(track.artist, "Foo/Bar!");
        assert_eq!(track.album, "Best");
        assert_eq!(track.title, "Song");
        assert_eq!(track.track_number, 3);
        assert_eq!(track.year, "1999");
        assert_eq!(track.track_label(), "03");
    }

    #[test]
    fn test_extract_missing_album() {
        let raw = RawTags {
            album: None,
            ..full_tags()
        };
        let extraction = extract(&raw);

        assert!(!extraction.is_valid());
        assert_eq!(
            extraction.problems,
            vec![FieldProblem::Missing(TagField::Album)]
        );
        assert_eq!(extraction.metadata.missing_fields(), vec![TagField::Album]);
        // Other fields are still parsed
        assert_eq!(extraction.metadata.track_number, Some(3));
    }

    #[test]
    fn test_extract_blank_counts_as_missing() {
        let raw = RawTags {
            artist: Some("   ".to_string()),
            title: Some(String::new()),
            ..full_tags()
        };
        let extraction = extract(&raw);

        assert_eq!(
            extraction.metadata.missing_fields(),
            vec![TagField::Artist, TagField::Title]
        );
    }

    #[test]
    fn test_extract_invalid_track_number() {
        let raw = RawTags {
            track_number: Some("A1".to_string()),
            ..full_tags()
        };
        let extraction = extract(&raw);

        assert!(!extraction.is_valid());
        assert_eq!(
            extraction.problems,
            vec![FieldProblem::Invalid {
                field: TagField::TrackNumber,
                value: "A1".to_string(),
            }]
        );
        assert_eq!(
            extraction.problems[0].to_string(),
            "invalid tracknumber tag: \"A1\""
        );
    }

    #[test]
    fn test_extract_unreadable() {
        let extraction = Extraction::unreadable();
        assert!(!extraction.is_valid());
        assert_eq!(extraction.problems.len(), 5);
        assert_eq!(extraction.metadata.missing_fields().len(), 5);
    }

    #[test]
    fn test_parse_track_number() {
        assert_eq!(parse_track_number("3"), Some(3));
        assert_eq!(parse_track_number("3/10"), Some(3));
        assert_eq!(parse_track_number(" 07 / 12"), Some(7));
        assert_eq!(parse_track_number("12/"), Some(12));
        assert_eq!(parse_track_number("0"), None);
        assert_eq!(parse_track_number("0/10"), None);
        assert_eq!(parse_track_number("/10"), None);
        assert_eq!(parse_track_number("three"), None);
        assert_eq!(parse_track_number("-1"), None);
    }

    #[test]
    fn test_year_from_date() {
        assert_eq!(year_from_date("1999-05-01"), "1999");
        assert_eq!(year_from_date("2023"), "2023");
        assert_eq!(year_from_date("2023-01-01T10:00:00"), "2023");
        assert_eq!(year_from_date("99"), "99");
    }

    #[test]
    fn test_track_label_padding() {
        let mut track = extract(&full_tags()).track().unwrap();
        track.track_number = 12;
        assert_eq!(track.track_label(), "12");
        track.track_number = 104;
        assert_eq!(track.track_label(), "104");
    }

    #[test]
    fn test_raw_tags_serialization() {
        let json = serde_json::to_string(&full_tags()).unwrap();
        assert!(json.contains("\"track_number\":\"3/10\""));

        let back: RawTags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, full_tags());
    }
}
