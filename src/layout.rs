use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::domain::{MirrorTarget, RecordingSet, padded_unit};
use crate::error::MirrorError;

/// Deterministic destination layout:
/// `<root>/<set_id>/[<group_key>/]waveforms/<padded unit>.mp3`.
///
/// Path derivation is pure; re-running against the same catalog always
/// computes identical paths, which is what makes the executor's
/// existence-check idempotency correct.
#[derive(Debug, Clone)]
pub struct Layout {
    root: Utf8PathBuf,
}

impl Layout {
    pub fn new() -> Result<Self, MirrorError> {
        let cwd = std::env::current_dir().map_err(|err| MirrorError::Filesystem(err.to_string()))?;
        let root = Utf8PathBuf::from_path_buf(cwd.join("recitations"))
            .map_err(|_| MirrorError::Filesystem("invalid destination path".to_string()))?;
        Ok(Self { root })
    }

    pub fn new_with_root(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn set_dir(&self, set_id: u32, group_key: Option<u32>) -> Utf8PathBuf {
        let mut dir = self.root.join(set_id.to_string());
        if let Some(group) = group_key {
            dir = dir.join(group.to_string());
        }
        dir.join("waveforms")
    }

    pub fn unit_path(&self, set_id: u32, group_key: Option<u32>, unit: u32) -> Utf8PathBuf {
        self.set_dir(set_id, group_key)
            .join(format!("{}.mp3", padded_unit(unit)))
    }

    pub fn target(&self, set: &RecordingSet, unit: u32) -> MirrorTarget {
        MirrorTarget {
            set_id: set.id,
            group_key: set.group_key,
            unit,
            url: set.unit_url(unit),
            path: self.unit_path(set.id, set.group_key, unit),
        }
    }

    /// Idempotent; succeeds when the directory already exists.
    pub fn ensure_dir(&self, dir: &Utf8Path) -> Result<(), MirrorError> {
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| MirrorError::Filesystem(err.to_string()))
    }
}

/// Default catalog snapshot location under the user cache directory.
pub fn default_cache_file() -> Result<Utf8PathBuf, MirrorError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(
                dirs.home_dir()
                    .join(".cache")
                    .join("recitation-mirror")
                    .join("catalog.json"),
            )
            .ok()
        })
        .ok_or_else(|| MirrorError::Filesystem("unable to resolve cache directory".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_paths() {
        let layout = Layout::new_with_root(Utf8PathBuf::from("/tmp/recitations"));

        let plain = layout.unit_path(54, None, 7);
        assert_eq!(plain, "/tmp/recitations/54/waveforms/007.mp3");

        let grouped = layout.unit_path(54, Some(200), 114);
        assert_eq!(grouped, "/tmp/recitations/54/200/waveforms/114.mp3");
    }

    #[test]
    fn unit_path_is_deterministic() {
        let layout = Layout::new_with_root(Utf8PathBuf::from("/data"));
        assert_eq!(
            layout.unit_path(9, Some(9), 42),
            layout.unit_path(9, Some(9), 42)
        );
    }

    #[test]
    fn wide_unit_ids_are_never_truncated() {
        let layout = Layout::new_with_root(Utf8PathBuf::from("/data"));
        let path = layout.unit_path(1, None, 1000);
        assert_eq!(path, "/data/1/waveforms/1000.mp3");
    }
}
