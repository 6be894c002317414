use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub version: u32,
    pub music_root: String,
    pub port: u16,
    pub storage_path: String,
    pub artwork_path: String,
    pub placeholder_path: String,
    pub sync_on_start: bool,
    pub log_skipped_files: bool,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            music_root: "".to_string(),
            port: DEFAULT_PORT,
            storage_path: ".cache".to_string(),
            artwork_path: ".art".to_string(),
            placeholder_path: "resources/placeholder.png".to_string(),
            sync_on_start: false,
            log_skipped_files: true,
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("MUSICBOX_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

/// Loads the config at `path`, writing the defaults there first when the
/// file does not exist. The flag is true when the file was created.
pub fn load_or_create_config(path: &Path) -> Result<(ServerConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: ServerConfig = serde_yaml::from_str(&contents)?;
        if config.version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
        }
        if config.port == 0 {
            config.port = DEFAULT_PORT;
        }
        if config.storage_path.trim().is_empty() {
            config.storage_path = ServerConfig::default().storage_path;
        }
        if config.artwork_path.trim().is_empty() {
            config.artwork_path = ServerConfig::default().artwork_path;
        }
        return Ok((config, false));
    }

    let config = ServerConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

/// Bundled files such as the placeholder image: next to the config file
/// when present there, otherwise under the working directory.
pub fn resolve_asset_path(config_path: &Path, value: &str) -> PathBuf {
    match env::current_dir() {
        Ok(cwd) => resolve_asset_path_from(config_path, value, &cwd),
        Err(_) => resolve_path(config_path, value),
    }
}

fn resolve_asset_path_from(config_path: &Path, value: &str, cwd: &Path) -> PathBuf {
    let primary = resolve_path(config_path, value);
    if primary.exists() {
        return primary;
    }
    let candidate = cwd.join(value);
    if candidate.exists() {
        return candidate;
    }
    primary
}

pub fn resolve_music_root(config_path: &Path, value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(resolve_path(config_path, trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf/config.yaml");

        let (config, created) = load_or_create_config(&path).unwrap();

        assert!(created);
        assert_eq!(config, ServerConfig::default());
        assert!(path.exists());
        let (again, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(again, config);
    }

    #[test]
    fn yaml_round_trip_keeps_auth() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let config = ServerConfig {
            music_root: "/srv/music".to_string(),
            port: 8080,
            sync_on_start: true,
            auth: AuthConfig {
                enabled: true,
                username: "admin".to_string(),
                password: "secret".to_string(),
            },
            ..ServerConfig::default()
        };

        save_config(&path, &config).unwrap();
        let (loaded, created) = load_or_create_config(&path).unwrap();

        assert!(!created);
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "music_root: music\nport: 0\nstorage_path: \"\"\n").unwrap();

        let (config, _) = load_or_create_config(&path).unwrap();

        assert_eq!(config.music_root, "music");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.storage_path, ".cache");
        assert_eq!(config.artwork_path, ".art");
        assert!(config.log_skipped_files);
        assert!(!config.auth.enabled);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "port: [not a number").unwrap();
        assert!(matches!(
            load_or_create_config(&path),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn assets_fall_back_to_working_directory() {
        let config_dir = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        let config_path = config_dir.path().join("config.yaml");
        let value = "resources/placeholder.png";

        assert_eq!(
            resolve_asset_path_from(&config_path, value, cwd.path()),
            config_dir.path().join(value)
        );

        fs::create_dir_all(cwd.path().join("resources")).unwrap();
        fs::write(cwd.path().join(value), b"png").unwrap();
        assert_eq!(
            resolve_asset_path_from(&config_path, value, cwd.path()),
            cwd.path().join(value)
        );

        fs::create_dir_all(config_dir.path().join("resources")).unwrap();
        fs::write(config_dir.path().join(value), b"png").unwrap();
        assert_eq!(
            resolve_asset_path_from(&config_path, value, cwd.path()),
            config_dir.path().join(value)
        );
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let config_path = Path::new("/etc/musicbox/config.yaml");
        assert_eq!(
            resolve_path(config_path, ".cache"),
            PathBuf::from("/etc/musicbox/.cache")
        );
        assert_eq!(resolve_path(config_path, "/data/art"), PathBuf::from("/data/art"));
        assert_eq!(
            resolve_path(Path::new("config.yaml"), "music"),
            PathBuf::from("./music")
        );
        assert_eq!(resolve_music_root(config_path, "  "), None);
        assert_eq!(
            resolve_music_root(config_path, "songs"),
            Some(PathBuf::from("/etc/musicbox/songs"))
        );
    }
}
