use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

const EXTENSION: &str = "json";
const TMP_SUFFIX: &str = ".tmp";

/// The documents written by a sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Tracks,
    Playlists,
    Metadata,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Tracks => "tracks",
            Collection::Playlists => "playlists",
            Collection::Metadata => "metadata",
        }
    }
}

impl AsRef<str> for Collection {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

#[derive(Debug)]
pub enum StoreError {
    NotFound(String),
    Io(std::io::Error),
    Decode(serde_json::Error),
    Encode(serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(name) => write!(f, "collection not found: {}", name),
            StoreError::Io(err) => write!(f, "io error: {}", err),
            StoreError::Decode(err) => write!(f, "decode error: {}", err),
            StoreError::Encode(err) => write!(f, "encode error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::NotFound(_) => None,
            StoreError::Io(err) => Some(err),
            StoreError::Decode(err) | StoreError::Encode(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

/// Named JSON documents under one directory. Every write replaces the whole
/// document.
pub struct CollectionStore {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CollectionStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, EXTENSION))
    }

    pub fn read<T: DeserializeOwned>(&self, name: impl AsRef<str>) -> Result<T, StoreError> {
        read_document(&self.path_of(name.as_ref()), name.as_ref())
    }

    pub fn write<T: Serialize>(&self, name: impl AsRef<str>, doc: &T) -> Result<(), StoreError> {
        let name = name.as_ref();
        let lock = self.lock_for(name);
        let _guard = lock.lock();
        write_document(&self.path_of(name), doc)
    }

    /// Read-modify-write of one document while holding its lock.
    pub fn update<T, R, F>(&self, name: impl AsRef<str>, f: F) -> Result<R, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> R,
    {
        let name = name.as_ref();
        let lock = self.lock_for(name);
        let _guard = lock.lock();
        let path = self.path_of(name);
        let mut doc: T = read_document(&path, name)?;
        let out = f(&mut doc);
        write_document(&path, &doc)?;
        Ok(out)
    }

    /// Names of the documents currently present, sorted.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(name.to_string()).or_default())
    }
}

fn read_document<T: DeserializeOwned>(path: &Path, name: &str) -> Result<T, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(StoreError::NotFound(name.to_string()))
        }
        Err(err) => return Err(err.into()),
    };
    serde_json::from_slice(&bytes).map_err(StoreError::Decode)
}

fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(doc).map_err(StoreError::Encode)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(TMP_SUFFIX);
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, &bytes)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    debug!("Wrote {} bytes to {:?}", bytes.len(), path);
    Ok(())
}
