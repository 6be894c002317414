use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{Album, Summary, Track};
use parking_lot::Mutex;
use tracing::{info, warn};

pub mod artwork;
pub mod query;
pub mod scan;
pub mod store;

pub use artwork::ArtworkStore;
pub use query::PageParams;
pub use scan::{LoftyTags, SkipPolicy, TagSource};
pub use store::{Collection, CollectionStore, StoreError};

#[derive(Clone, Debug)]
pub struct LibraryConfig {
    pub storage_path: PathBuf,
    pub artwork_path: PathBuf,
    pub placeholder_path: PathBuf,
    pub skip_policy: SkipPolicy,
}

/// Indexed music library backed by flat JSON collections.
#[derive(Clone)]
pub struct Library {
    store: Arc<CollectionStore>,
    artwork: ArtworkStore,
    placeholder: PathBuf,
    skip_policy: SkipPolicy,
    tags: Arc<dyn TagSource>,
    writer: Arc<Mutex<()>>,
}

impl Library {
    pub fn open(config: LibraryConfig) -> Result<Self, LibraryError> {
        let store = CollectionStore::open(&config.storage_path)?;
        info!("Opened collection store at {:?}", store.root());
        Ok(Self {
            store: Arc::new(store),
            artwork: ArtworkStore::new(config.artwork_path),
            placeholder: config.placeholder_path,
            skip_policy: config.skip_policy,
            tags: Arc::new(LoftyTags),
            writer: Arc::new(Mutex::new(())),
        })
    }

    pub fn with_tag_source(mut self, tags: Arc<dyn TagSource>) -> Self {
        self.tags = tags;
        self
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    /// Rebuilds every collection from the files under `root`. Favourite
    /// flags do not survive a sync.
    pub fn sync(&self, root: &Path) -> Result<SyncReport, LibraryError> {
        if !root.is_dir() {
            return Err(LibraryError::MissingRoot(root.to_path_buf()));
        }
        let _writer = self.writer.lock();
        let catalog = scan::build(root, self.tags.as_ref(), &self.artwork, self.skip_policy);
        scan::persist(&self.store, &catalog)?;
        Ok(SyncReport {
            tracks: catalog.tracks.len(),
            skipped: catalog.skipped,
            artwork_failures: catalog.artwork_failures,
            summary: catalog.summary,
            albums: catalog.albums,
        })
    }

    pub fn list_tracks(&self, search: Option<&str>) -> Vec<Track> {
        match self.store.read::<Vec<Track>>(Collection::Tracks) {
            Ok(tracks) => query::search_tracks(&tracks, search),
            Err(err) => {
                warn!("Track listing unavailable: {}", err);
                Vec::new()
            }
        }
    }

    pub fn list_albums(&self, page: PageParams) -> Vec<Album> {
        match self.store.read::<Vec<Album>>(Collection::Playlists) {
            Ok(albums) => query::paginate(&albums, page).to_vec(),
            Err(err) => {
                warn!("Album listing unavailable: {}", err);
                Vec::new()
            }
        }
    }

    pub fn summary(&self) -> Result<Summary, LibraryError> {
        Ok(self.store.read(Collection::Metadata)?)
    }

    /// Flips the favourite flag of `id` and persists the track list.
    /// `Ok(None)` means no track has that identity.
    pub fn toggle_favorite(&self, id: &str) -> Result<Option<bool>, LibraryError> {
        let _writer = self.writer.lock();
        let toggled = self
            .store
            .update(Collection::Tracks, |tracks: &mut Vec<Track>| {
                query::toggle_favorite(tracks, id)
            })?;
        Ok(toggled)
    }

    pub fn favorites(&self) -> Result<Vec<Track>, LibraryError> {
        let tracks: Vec<Track> = self.store.read(Collection::Tracks)?;
        Ok(query::favorites(&tracks))
    }

    pub fn track_file(&self, id: &str) -> Result<Option<PathBuf>, LibraryError> {
        let tracks: Vec<Track> = self.store.read(Collection::Tracks)?;
        Ok(query::find_track(&tracks, id).map(|track| track.path.clone()))
    }

    /// Artwork for a track identity, or the placeholder image.
    pub fn artwork(&self, id: &str) -> PathBuf {
        self.artwork
            .path_for(id)
            .unwrap_or_else(|| self.placeholder.clone())
    }
}

#[derive(Clone, Debug)]
pub struct SyncReport {
    pub albums: Vec<Album>,
    pub tracks: usize,
    pub skipped: usize,
    pub artwork_failures: usize,
    pub summary: Summary,
}

#[derive(Debug)]
pub enum LibraryError {
    Store(StoreError),
    MissingRoot(PathBuf),
}

impl LibraryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LibraryError::Store(err) if err.is_not_found())
    }
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Store(err) => write!(f, "store error: {}", err),
            LibraryError::MissingRoot(path) => {
                write!(f, "library root is not a directory: {}", path.display())
            }
        }
    }
}

impl std::error::Error for LibraryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LibraryError::Store(err) => Some(err),
            LibraryError::MissingRoot(_) => None,
        }
    }
}

impl From<StoreError> for LibraryError {
    fn from(err: StoreError) -> Self {
        LibraryError::Store(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::tests::{touch, FakeTags};
    use common::{album_identity, track_identity};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        library: Library,
    }

    impl Fixture {
        fn music(&self) -> PathBuf {
            self.dir.path().join("music")
        }
    }

    fn fixture(tags: FakeTags) -> Fixture {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("music")).unwrap();
        let library = Library::open(LibraryConfig {
            storage_path: dir.path().join(".cache"),
            artwork_path: dir.path().join(".art"),
            placeholder_path: dir.path().join("placeholder.png"),
            skip_policy: SkipPolicy::Silent,
        })
        .unwrap()
        .with_tag_source(Arc::new(tags));
        Fixture { dir, library }
    }

    fn synced() -> Fixture {
        let fx = fixture(
            FakeTags::default()
                .with("01.mp3", "Intro", "Debut", "Band")
                .with("02.mp3", "Hit", "Debut", "Band")
                .with("03.flac", "Ballad", "Later", "Band")
                .with_cover("02.mp3", b"cover"),
        );
        touch(&fx.music(), "debut/01.mp3", 100);
        touch(&fx.music(), "debut/02.mp3", 200);
        touch(&fx.music(), "later/03.flac", 300);
        touch(&fx.music(), "later/broken.mp3", 1);
        fx.library.sync(&fx.music()).unwrap();
        fx
    }

    #[test]
    fn sync_reports_and_persists() {
        let fx = fixture(FakeTags::default().with("a.mp3", "t", "al", "ar"));
        touch(&fx.music(), "a.mp3", 7);
        touch(&fx.music(), "b.mp3", 7);

        let report = fx.library.sync(&fx.music()).unwrap();

        assert_eq!(report.tracks, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.albums.len(), 1);
        assert_eq!(report.albums[0].id, album_identity("al", "ar"));
        let summary = fx.library.summary().unwrap();
        assert_eq!(summary.tracks, 1);
        assert_eq!(summary.playlists, 1);
        assert_eq!(summary.size, 7);
        assert_eq!(summary.mount, fx.music());
    }

    #[test]
    fn sync_of_missing_root_fails_and_keeps_collections() {
        let fx = synced();
        let err = fx.library.sync(&fx.dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, LibraryError::MissingRoot(_)));
        assert_eq!(fx.library.list_tracks(None).len(), 3);
    }

    #[test]
    fn empty_library_sync() {
        let fx = fixture(FakeTags::default());
        let report = fx.library.sync(&fx.music()).unwrap();
        assert!(report.albums.is_empty());
        assert!(fx.library.list_tracks(None).is_empty());
        assert!(fx.library.list_albums(PageParams::default()).is_empty());
        let summary = fx.library.summary().unwrap();
        assert_eq!((summary.tracks, summary.playlists, summary.size), (0, 0, 0));
    }

    #[test]
    fn reads_before_first_sync() {
        let fx = fixture(FakeTags::default());
        assert!(fx.library.list_tracks(Some("x")).is_empty());
        assert!(fx.library.list_albums(PageParams::default()).is_empty());
        assert!(fx.library.summary().unwrap_err().is_not_found());
        assert!(fx.library.favorites().is_err());
        assert!(fx.library.toggle_favorite("abc").is_err());
        assert!(fx.library.track_file("abc").is_err());
    }

    #[test]
    fn corrupt_tracks_degrade_listing_only() {
        let fx = synced();
        fs::write(fx.library.store().path_of("tracks"), b"not json").unwrap();
        assert!(fx.library.list_tracks(None).is_empty());
        assert!(fx.library.favorites().is_err());
        assert_eq!(fx.library.list_albums(PageParams::default()).len(), 2);
    }

    #[test]
    fn search_and_pagination() {
        let fx = synced();
        assert_eq!(fx.library.list_tracks(None).len(), 3);
        let found = fx.library.list_tracks(Some("BALLAD"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].album, "Later");
        // "Band" is the artist of every track.
        assert_eq!(fx.library.list_tracks(Some("band")).len(), 3);

        let first = fx.library.list_albums(PageParams { skip: 0, limit: 1 });
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title, "Debut");
        assert_eq!(first[0].tracks.len(), 2);
        let rest = fx.library.list_albums(PageParams { skip: 1, limit: 20 });
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].title, "Later");
        assert!(fx.library.list_albums(PageParams { skip: 5, limit: 20 }).is_empty());
    }

    #[test]
    fn toggle_favorite_persists() {
        let fx = synced();
        let id = track_identity("Hit", "Debut", "Band");

        assert_eq!(fx.library.toggle_favorite(&id).unwrap(), Some(true));
        let favs = fx.library.favorites().unwrap();
        assert_eq!(favs.len(), 1);
        assert_eq!(favs[0].id, id);

        let on_disk: Vec<Track> = fx.library.store().read(Collection::Tracks).unwrap();
        assert!(on_disk.iter().any(|t| t.id == id && t.favourite));

        assert_eq!(fx.library.toggle_favorite(&id).unwrap(), Some(false));
        assert!(fx.library.favorites().unwrap().is_empty());
    }

    #[test]
    fn toggle_unknown_id_changes_nothing() {
        let fx = synced();
        let before = fs::read(fx.library.store().path_of("tracks")).unwrap();
        assert_eq!(fx.library.toggle_favorite("unknown").unwrap(), None);
        let after = fs::read(fx.library.store().path_of("tracks")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn sync_resets_favourites() {
        let fx = synced();
        let id = track_identity("Intro", "Debut", "Band");
        fx.library.toggle_favorite(&id).unwrap();
        fx.library.sync(&fx.music()).unwrap();
        assert!(fx.library.favorites().unwrap().is_empty());
    }

    #[test]
    fn track_file_resolves_path() {
        let fx = synced();
        let id = track_identity("Ballad", "Later", "Band");
        assert_eq!(
            fx.library.track_file(&id).unwrap(),
            Some(fx.music().join("later/03.flac"))
        );
        assert_eq!(fx.library.track_file("missing").unwrap(), None);
    }

    #[test]
    fn artwork_falls_back_to_placeholder() {
        let fx = synced();
        let placeholder = fx.dir.path().join("placeholder.png");
        let with_art = track_identity("Hit", "Debut", "Band");
        let without_art = track_identity("Intro", "Debut", "Band");

        assert_eq!(fx.library.artwork(&with_art), fx.dir.path().join(".art").join(&with_art));
        assert_eq!(fx.library.artwork(&without_art), placeholder);
        assert_eq!(fx.library.artwork("unknown-id"), placeholder);
        assert_eq!(fx.library.artwork("../.cache/tracks.json"), placeholder);
    }
}
