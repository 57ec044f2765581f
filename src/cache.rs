use std::fs;
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, info};

use crate::catalog;
use crate::domain::RecordingSet;
use crate::error::MirrorError;

pub const DEFAULT_CATALOG_URL: &str = "https://www.mp3quran.net/api/v3/reciters?language=eng";

pub trait CatalogFetcher: Send + Sync {
    fn fetch(&self) -> Result<serde_json::Value, MirrorError>;
}

#[derive(Clone)]
pub struct HttpCatalogFetcher {
    client: Client,
    url: String,
}

impl HttpCatalogFetcher {
    pub fn new(url: impl Into<String>) -> Result<Self, MirrorError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("recitation-mirror/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| MirrorError::CatalogHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| MirrorError::CatalogHttp(err.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn send_with_retries(&self) -> Result<reqwest::blocking::Response, MirrorError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = self.client.get(&self.url).send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(MirrorError::CatalogHttp(err.to_string()));
                }
            }
        }
    }
}

impl CatalogFetcher for HttpCatalogFetcher {
    fn fetch(&self) -> Result<serde_json::Value, MirrorError> {
        let response = self.send_with_retries()?;
        if !response.status().is_success() {
            return Err(MirrorError::CatalogHttp(format!(
                "{} returned status {}",
                self.url,
                response.status().as_u16()
            )));
        }
        response
            .json()
            .map_err(|err| MirrorError::CatalogHttp(err.to_string()))
    }
}

/// Local snapshot of the normalized catalog. Created on the first
/// successful remote fetch, read thereafter until the operator deletes
/// the file; there is no TTL.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    path: Utf8PathBuf,
}

impl CatalogCache {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the canonical catalog, reading the snapshot file when
    /// present and fetching (then persisting) otherwise. Performs at most
    /// one remote fetch.
    pub fn load(&self, fetcher: &dyn CatalogFetcher) -> Result<Vec<RecordingSet>, MirrorError> {
        if self.path.as_std_path().exists() {
            debug!(path = %self.path, "using cached catalog snapshot");
            let content = fs::read_to_string(self.path.as_std_path())
                .map_err(|err| MirrorError::CatalogUnavailable(err.to_string()))?;
            return catalog::normalize_str(&content);
        }

        info!("fetching remote catalog");
        let raw = fetcher
            .fetch()
            .map_err(|err| MirrorError::CatalogUnavailable(err.to_string()))?;
        let sets = catalog::normalize(&raw)?;

        let snapshot = serde_json::to_vec_pretty(&sets)
            .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
        write_bytes_atomic(&self.path, &snapshot)?;
        info!(path = %self.path, sets = sets.len(), "catalog snapshot written");
        Ok(sets)
    }
}

fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), MirrorError> {
    let parent = path
        .parent()
        .ok_or_else(|| MirrorError::Filesystem("invalid cache path".to_string()))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("recmirror-catalog")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
    std::io::Write::write_all(&mut temp, content)
        .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
    Ok(())
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
