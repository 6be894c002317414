use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use common::is_identity;

/// Embedded cover images extracted during a sync, one file per track
/// identity.
#[derive(Clone, Debug)]
pub struct ArtworkStore {
    dir: PathBuf,
}

impl ArtworkStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `data` as the artwork of `track_id`, replacing any previous
    /// image for that identity.
    pub fn save(&self, track_id: &str, data: &[u8]) -> io::Result<PathBuf> {
        if !is_identity(track_id) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a track identity: {:?}", track_id),
            ));
        }
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(track_id);
        fs::write(&path, data)?;
        Ok(path)
    }

    /// Stored artwork for `track_id`, if any. Ids that are not identities
    /// never resolve.
    pub fn path_for(&self, track_id: &str) -> Option<PathBuf> {
        if !is_identity(track_id) {
            return None;
        }
        let path = self.dir.join(track_id);
        path.is_file().then_some(path)
    }
}
