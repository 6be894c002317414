use common::Track;

pub const DEFAULT_SKIP: usize = 0;
pub const DEFAULT_LIMIT: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageParams {
    pub skip: usize,
    pub limit: usize,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            skip: DEFAULT_SKIP,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageParams {
    /// Builds a page from raw query values; anything missing or not a
    /// non-negative integer falls back to its default independently.
    pub fn from_raw(skip: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            skip: parse_count(skip).unwrap_or(DEFAULT_SKIP),
            limit: parse_count(limit).unwrap_or(DEFAULT_LIMIT),
        }
    }
}

fn parse_count(value: Option<&str>) -> Option<usize> {
    value?.trim().parse().ok()
}

/// The window `[skip, skip + limit)` of `items`, clamped to its length.
pub fn paginate<T>(items: &[T], page: PageParams) -> &[T] {
    let start = page.skip.min(items.len());
    let end = start.saturating_add(page.limit).min(items.len());
    &items[start..end]
}

/// Case-insensitive substring search over title, album and artist. A track
/// is returned once for every field that matches.
pub fn search_tracks(tracks: &[Track], term: Option<&str>) -> Vec<Track> {
    let term = match term.map(str::to_lowercase) {
        Some(term) if !term.is_empty() => term,
        _ => return tracks.to_vec(),
    };

    let mut results = Vec::new();
    for track in tracks {
        for field in [&track.title, &track.album, &track.artist] {
            if field.to_lowercase().contains(&term) {
                results.push(track.clone());
            }
        }
    }
    results
}

/// Flips the favourite flag of the first track with `id`. Returns the new
/// state, or `None` when no track has that identity.
pub fn toggle_favorite(tracks: &mut [Track], id: &str) -> Option<bool> {
    let track = tracks.iter_mut().find(|track| track.id == id)?;
    track.favourite = !track.favourite;
    Some(track.favourite)
}

pub fn favorites(tracks: &[Track]) -> Vec<Track> {
    tracks
        .iter()
        .filter(|track| track.favourite)
        .cloned()
        .collect()
}

pub fn find_track<'a>(tracks: &'a [Track], id: &str) -> Option<&'a Track> {
    tracks.iter().find(|track| track.id == id)
}
