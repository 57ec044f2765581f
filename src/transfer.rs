use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use camino::Utf8Path;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::MirrorError;

/// One byte transfer from a remote URL to a local destination.
///
/// Implementations always (over)write the destination when invoked; the
/// existence check that makes runs idempotent belongs to the executor.
pub trait Transfer: Send + Sync {
    fn transfer(&self, url: &str, destination: &Utf8Path) -> Result<(), MirrorError>;
}

#[derive(Clone)]
pub struct StreamingTransfer {
    client: Client,
}

impl StreamingTransfer {
    pub fn new() -> Result<Self, MirrorError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("recitation-mirror/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| MirrorError::Http(err.to_string()))?,
        );
        // No overall request timeout: media files can be large and slow.
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .timeout(None)
            .build()
            .map_err(|err| MirrorError::Http(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Transfer for StreamingTransfer {
    fn transfer(&self, url: &str, destination: &Utf8Path) -> Result<(), MirrorError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| MirrorError::Http(err.to_string()))?;
        if !response.status().is_success() {
            return Err(MirrorError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let parent = destination
            .parent()
            .ok_or_else(|| MirrorError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| MirrorError::Filesystem(err.to_string()))?;

        // Stream into a sibling temp file, then move into place, so a
        // failed transfer never leaves a truncated destination behind.
        let mut temp = tempfile::Builder::new()
            .prefix("recmirror-unit")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut temp)
            .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
        if destination.as_std_path().exists() {
            fs::remove_file(destination.as_std_path())
                .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
        }
        temp.persist(destination.as_std_path())
            .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Aria2cTransfer {
    program: Option<PathBuf>,
}

impl Aria2cTransfer {
    pub fn new() -> Self {
        Self {
            program: find_in_path("aria2c"),
        }
    }

    /// Cheap version probe, checked once before the run starts. A missing
    /// tool is a configuration precondition failure, not a per-unit error.
    pub fn probe(&self) -> Result<(), MirrorError> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| MirrorError::MissingTool("aria2c".to_string()))?;
        let output = Command::new(program)
            .arg("--version")
            .output()
            .map_err(|err| MirrorError::MissingTool(format!("aria2c ({err})")))?;
        if !output.status.success() {
            return Err(MirrorError::MissingTool("aria2c".to_string()));
        }
        Ok(())
    }
}

impl Transfer for Aria2cTransfer {
    fn transfer(&self, url: &str, destination: &Utf8Path) -> Result<(), MirrorError> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| MirrorError::MissingTool("aria2c".to_string()))?;
        let parent = destination
            .parent()
            .ok_or_else(|| MirrorError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
        let file_name = destination
            .file_name()
            .ok_or_else(|| MirrorError::Filesystem("invalid destination path".to_string()))?;

        let args = aria2c_args(url, parent.as_str(), file_name);
        let output = Command::new(program)
            .args(&args)
            .output()
            .map_err(|err| MirrorError::ExternalTool(err.to_string()))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("aria2c exited with {}", output.status)
        } else {
            stderr
        };
        Err(MirrorError::ExternalTool(message))
    }
}

/// aria2c absorbs transient network failures via its own retry loop;
/// from the executor's perspective the call either succeeds or fails once.
fn aria2c_args(url: &str, dir: &str, file_name: &str) -> Vec<String> {
    vec![
        url.to_string(),
        "-d".to_string(),
        dir.to_string(),
        "-o".to_string(),
        file_name.to_string(),
        "--allow-overwrite=true".to_string(),
        "--connect-timeout=30".to_string(),
        "--retry-wait=2".to_string(),
        "--max-tries=5".to_string(),
        "--quiet".to_string(),
    ]
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.exists() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.exists() {
            return Some(plain);
        }
    }
    None
}
