use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Bytes on disk under `media_root`, metadata in redb.
    Filesystem,
    /// Everything held in process memory; uploads vanish on restart.
    Memory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub version: u32,
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub media_root: String,
    pub index_path: String,
    pub public_base: String,
    pub analysis_delay_ms: u64,
    pub similar_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            port: 3000,
            storage_backend: StorageBackend::Filesystem,
            media_root: "media".to_string(),
            index_path: "songs.redb".to_string(),
            public_base: "/media".to_string(),
            analysis_delay_ms: 1500,
            similar_delay_ms: 800,
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
    match env::var("TUNETAG_CONFIG") {
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

pub fn load_or_create_config(path: &Path) -> Result<(ServerConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: ServerConfig = serde_yaml::from_str(&contents)?;
        if config.version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
        }
        if config.port == 0 {
            config.port = 3000;
        }
        if config.media_root.trim().is_empty() {
            config.media_root = "media".to_string();
        }
        if config.index_path.trim().is_empty() {
            config.index_path = "songs.redb".to_string();
        }
        if config.public_base.trim().is_empty() {
            config.public_base = "/media".to_string();
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

#[cfg(test)]
mod tests {
    use super::{load_or_create_config, resolve_path, ServerConfig, StorageBackend};
    use std::path::Path;

    #[test]
    fn creates_default_config_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(created);
        assert!(path.exists());
        assert_eq!(config.port, 3000);
        assert_eq!(config.storage_backend, StorageBackend::Filesystem);
    }

    #[test]
    fn backfills_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "version: 1\nport: 0\nstorage_backend: memory\nmedia_root: \"\"\n",
        )
        .unwrap();
        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(config.port, 3000);
        assert_eq!(config.media_root, "media");
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        // untouched fields pick up struct defaults
        assert_eq!(config.analysis_delay_ms, 1500);
    }

    #[test]
    fn resolve_relative_to_config_file() {
        let resolved = resolve_path(Path::new("/etc/tunetag/config.yaml"), "media");
        assert_eq!(resolved, Path::new("/etc/tunetag/media"));
        let absolute = resolve_path(Path::new("/etc/tunetag/config.yaml"), "/srv/media");
        assert_eq!(absolute, Path::new("/srv/media"));
    }

    #[test]
    fn roundtrips_through_yaml() {
        let config = ServerConfig::default();
        let text = serde_yaml::to_string(&config).unwrap();
        let back: ServerConfig = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back.public_base, config.public_base);
        assert_eq!(back.storage_backend, config.storage_backend);
    }
}
