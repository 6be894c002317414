use std::path::Path;

use lofty::error::LoftyError;
use lofty::picture::{Picture, PictureType};
use lofty::prelude::{ItemKey, TaggedFileExt};
use lofty::tag::Tag;

#[derive(Debug, Default, Clone)]
pub struct TagInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub track_no: u32,
    pub cover: Option<CoverArt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub mime: Option<String>,
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

/// Reads title, artist, album, track number and the embedded cover of an
/// audio file. Text fields come back trimmed; missing ones are empty.
pub fn read_tags(path: &Path) -> Result<TagInfo, MetadataError> {
    let tagged_file = lofty::read_from_path(path)?;

    let tag = match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        Some(tag) => tag,
        None => return Ok(TagInfo::default()),
    };

    Ok(tag_info(tag))
}

fn tag_info(tag: &Tag) -> TagInfo {
    let text = |key: &ItemKey| {
        tag.get_string(key)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    };

    let track_artist = text(&ItemKey::TrackArtist);
    let artist = if track_artist.is_empty() {
        text(&ItemKey::AlbumArtist)
    } else {
        track_artist
    };

    TagInfo {
        title: text(&ItemKey::TrackTitle),
        artist,
        album: text(&ItemKey::AlbumTitle),
        track_no: tag
            .get_string(&ItemKey::TrackNumber)
            .and_then(parse_track_number)
            .unwrap_or(0),
        cover: pick_picture(tag.pictures()).map(|picture| {
            let data = picture.data().to_vec();
            let mime = guess_mime(&data).map(str::to_string);
            CoverArt { data, mime }
        }),
    }
}

/// Accepts "7" as well as the "7/12" form used by ID3.
pub fn parse_track_number(text: &str) -> Option<u32> {
    let head = text.split('/').next().unwrap_or(text).trim();
    head.parse().ok()
}

fn pick_picture(pictures: &[Picture]) -> Option<&Picture> {
    pictures
        .iter()
        .find(|picture| picture.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())
}

/// Sniffs the image type from its leading bytes.
pub fn guess_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("image/png")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
