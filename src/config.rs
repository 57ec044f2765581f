use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CATALOG_URL;
use crate::domain::TransferBackend;
use crate::error::MirrorError;
use crate::layout;
use crate::mirror::DEFAULT_THROTTLE;

/// Optional `recmirror.json` in the working directory. Every field has a
/// default, so an absent file resolves to a fully usable configuration;
/// CLI flags override whatever the file provides.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub catalog_url: Option<String>,
    #[serde(default)]
    pub cache_file: Option<String>,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub backend: Option<TransferBackend>,
    #[serde(default)]
    pub test_mode: Option<bool>,
    #[serde(default)]
    pub match_group_only: Option<bool>,
    #[serde(default)]
    pub throttle_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub catalog_url: String,
    pub cache_file: Utf8PathBuf,
    pub root: Utf8PathBuf,
    pub backend: TransferBackend,
    pub test_mode: bool,
    pub match_group_only: bool,
    pub throttle: Option<Duration>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ConfigFile, MirrorError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("recmirror.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ConfigFile::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| MirrorError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| MirrorError::ConfigParse(err.to_string()))
    }
}

impl MirrorConfig {
    pub fn from_file(file: ConfigFile) -> Result<Self, MirrorError> {
        let root = match file.root {
            Some(root) => Utf8PathBuf::from(root),
            None => {
                let cwd = std::env::current_dir()
                    .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
                Utf8PathBuf::from_path_buf(cwd.join("recitations")).map_err(|_| {
                    MirrorError::Filesystem("invalid destination path".to_string())
                })?
            }
        };
        let cache_file = match file.cache_file {
            Some(path) => Utf8PathBuf::from(path),
            None => layout::default_cache_file()?,
        };
        let throttle = match file.throttle_ms {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => Some(DEFAULT_THROTTLE),
        };

        Ok(Self {
            catalog_url: file
                .catalog_url
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
            cache_file,
            root,
            backend: file.backend.unwrap_or(TransferBackend::Streaming),
            test_mode: file.test_mode.unwrap_or(false),
            match_group_only: file.match_group_only.unwrap_or(false),
            throttle,
        })
    }
}
