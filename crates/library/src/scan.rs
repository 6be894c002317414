use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::{album_identity, track_identity, Album, Summary, Track};
use metadata::{read_tags, MetadataError, TagInfo};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::artwork::ArtworkStore;
use crate::store::{Collection, CollectionStore, StoreError};

pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["mp3", "flac"];

/// Where the scanner gets tags from.
pub trait TagSource: Send + Sync {
    fn extract(&self, path: &Path) -> Result<TagInfo, MetadataError>;
}

/// Embedded tags read with lofty.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoftyTags;

impl TagSource for LoftyTags {
    fn extract(&self, path: &Path) -> Result<TagInfo, MetadataError> {
        read_tags(path)
    }
}

/// How files that fail extraction are reported. They are skipped and
/// counted either way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SkipPolicy {
    #[default]
    Log,
    Silent,
}

/// Result of one full scan, before it is persisted.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub tracks: Vec<Track>,
    pub albums: Vec<Album>,
    pub summary: Summary,
    pub skipped: usize,
    pub artwork_failures: usize,
}

pub fn build(
    root: &Path,
    tags: &dyn TagSource,
    artwork: &ArtworkStore,
    policy: SkipPolicy,
) -> Catalog {
    let started_at = now_rfc3339();
    let clock = Instant::now();
    info!("Scanning library at {:?}", root);

    let mut tracks = Vec::new();
    let mut skipped = 0usize;
    let mut artwork_failures = 0usize;

    for path in audio_files(root) {
        let tag = match tags.extract(&path) {
            Ok(tag) => tag,
            Err(err) => {
                skipped += 1;
                report_skip(policy, &path, &err);
                continue;
            }
        };

        let file_size = match std::fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(err) => {
                skipped += 1;
                report_skip(policy, &path, &err);
                continue;
            }
        };

        let track = track_from_tags(tag_strings(&tag), tag.track_no, path, file_size);

        if let Some(cover) = &tag.cover {
            if let Err(err) = artwork.save(&track.id, &cover.data) {
                artwork_failures += 1;
                warn!("Failed to save artwork for {:?}: {}", track.path, err);
            }
        }

        tracks.push(track);
    }

    let albums = group_albums(&tracks);
    let summary = Summary {
        start: started_at,
        end: now_rfc3339(),
        seconds: clock.elapsed().as_secs_f64(),
        tracks: tracks.len(),
        playlists: albums.len(),
        mount: root.to_path_buf(),
        size: tracks.iter().map(|track| track.file_size).sum(),
    };

    info!(
        "Scan finished: {} tracks, {} albums, {} skipped in {:.2}s",
        summary.tracks, summary.playlists, skipped, summary.seconds
    );

    Catalog {
        tracks,
        albums,
        summary,
        skipped,
        artwork_failures,
    }
}

/// Writes the three documents of a catalog, tracks first. Each write is
/// independent; a failure leaves the earlier ones in place.
pub fn persist(store: &CollectionStore, catalog: &Catalog) -> Result<(), StoreError> {
    store.write(Collection::Tracks, &catalog.tracks)?;
    store.write(Collection::Playlists, &catalog.albums)?;
    store.write(Collection::Metadata, &catalog.summary)?;
    Ok(())
}

/// Groups tracks by album identity in scan order. The first track of an
/// album decides its title, artist and artwork.
pub fn group_albums(tracks: &[Track]) -> Vec<Album> {
    let mut albums: Vec<Album> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for track in tracks {
        match index.get(track.album_id.as_str()) {
            Some(&pos) => albums[pos].tracks.push(track.clone()),
            None => {
                index.insert(track.album_id.as_str(), albums.len());
                albums.push(Album {
                    id: track.album_id.clone(),
                    title: track.album.clone(),
                    artist: track.artist.clone(),
                    art: track.id.clone(),
                    tracks: vec![track.clone()],
                });
            }
        }
    }

    albums
}

pub fn is_supported_audio(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => SUPPORTED_EXTENSIONS
            .iter()
            .any(|supported| ext.eq_ignore_ascii_case(supported)),
        None => false,
    }
}

fn report_skip(policy: SkipPolicy, path: &Path, err: &dyn std::fmt::Display) {
    match policy {
        SkipPolicy::Log => warn!("Skipping {:?}: {}", path, err),
        SkipPolicy::Silent => debug!("Skipping {:?}: {}", path, err),
    }
}

fn audio_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_supported_audio(path))
        .collect()
}

struct TagStrings<'a> {
    title: &'a str,
    artist: &'a str,
    album: &'a str,
}

fn tag_strings(tag: &TagInfo) -> TagStrings<'_> {
    TagStrings {
        title: tag.title.trim(),
        artist: tag.artist.trim(),
        album: tag.album.trim(),
    }
}

fn track_from_tags(tags: TagStrings<'_>, track_no: u32, path: PathBuf, file_size: u64) -> Track {
    Track {
        id: track_identity(tags.title, tags.album, tags.artist),
        album_id: album_identity(tags.album, tags.artist),
        title: tags.title.to_string(),
        artist: tags.artist.to_string(),
        album: tags.album.to_string(),
        track_no,
        path,
        favourite: false,
        file_size,
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
