use std::fmt;

use camino::Utf8PathBuf;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::MirrorError;

/// One collection of related audio units sharing a base URL template,
/// e.g. a single narrator's full recording of the work.
///
/// The serialized form matches the pre-normalized flat catalog shape, so a
/// flat catalog deserializes straight into this model and the cached
/// snapshot round-trips through serde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingSet {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<u32>,
    #[serde(rename = "server")]
    pub base_url: String,
    #[serde(rename = "available_chapters")]
    pub available_units: Vec<u32>,
}

impl RecordingSet {
    /// Remote URL for one unit: `<base_url><padded unit>.mp3`.
    pub fn unit_url(&self, unit: u32) -> String {
        format!("{}{}.mp3", self.base_url, padded_unit(unit))
    }
}

/// One (recording set, unit) pair resolved to its remote URL and local
/// destination. Derived per run, never persisted.
#[derive(Debug, Clone)]
pub struct MirrorTarget {
    pub set_id: u32,
    pub group_key: Option<u32>,
    pub unit: u32,
    pub url: String,
    pub path: Utf8PathBuf,
}

/// Zero-pads a unit id to width 3. Ids above 999 widen the field instead
/// of truncating, so `1000` stays `1000`.
pub fn padded_unit(unit: u32) -> String {
    format!("{unit:03}")
}

/// Parses a single unit token from a comma-separated catalog list.
pub fn parse_unit(token: &str) -> Result<u32, MirrorError> {
    token
        .trim()
        .parse::<u32>()
        .map_err(|_| MirrorError::InvalidIdentifier(token.trim().to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransferBackend {
    /// In-process HTTP GET streamed to the destination file.
    Streaming,
    /// Delegate each transfer to an external retrying `aria2c` process.
    Aria2c,
}

impl fmt::Display for TransferBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferBackend::Streaming => write!(f, "streaming"),
            TransferBackend::Aria2c => write!(f, "aria2c"),
        }
    }
}
