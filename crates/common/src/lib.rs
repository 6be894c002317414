use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Width of an identity digest in bytes (rendered as twice as many hex chars).
pub const IDENTITY_BYTES: usize = 16;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde(rename = "track", default)]
    pub track_no: u32,
    pub id: String,
    pub path: PathBuf,
    #[serde(default)]
    pub favourite: bool,
    pub album_id: String,
    #[serde(rename = "size", default)]
    pub file_size: u64,
}

/// An album as served to clients; the wire API calls these playlists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Identity of the track whose artwork represents the album.
    pub art: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub start: String,
    pub end: String,
    pub seconds: f64,
    pub tracks: usize,
    pub playlists: usize,
    pub mount: PathBuf,
    pub size: u64,
}

/// Identity of a track: hash of trimmed title, album and artist, concatenated
/// without separator.
pub fn track_identity(title: &str, album: &str, artist: &str) -> String {
    let mut input = String::with_capacity(title.len() + album.len() + artist.len());
    input.push_str(title.trim());
    input.push_str(album.trim());
    input.push_str(artist.trim());
    digest_hex(&input)
}

/// Identity of an album: hash of trimmed album and artist.
pub fn album_identity(album: &str, artist: &str) -> String {
    let mut input = String::with_capacity(album.len() + artist.len());
    input.push_str(album.trim());
    input.push_str(artist.trim());
    digest_hex(&input)
}

/// True if `value` has the shape of an identity produced by this crate.
pub fn is_identity(value: &str) -> bool {
    value.len() == IDENTITY_BYTES * 2
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn digest_hex(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex()[..IDENTITY_BYTES * 2].to_string()
}
