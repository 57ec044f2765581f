use serde::Deserialize;
use tracing::warn;

use crate::domain::{RecordingSet, parse_unit};
use crate::error::MirrorError;

/// The two upstream catalog shapes. The nested shape is the raw provider
/// API response; the flat shape is the already-normalized form (which is
/// also what the cache snapshot holds).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCatalog {
    Nested { reciters: Vec<RawProvider> },
    Flat(Vec<RecordingSet>),
}

#[derive(Debug, Deserialize)]
struct RawProvider {
    id: u32,
    moshaf: Vec<RawVariant>,
}

#[derive(Debug, Deserialize)]
struct RawVariant {
    id: u32,
    server: String,
    surah_list: String,
}

/// Flattens either upstream shape into the canonical ordered model.
///
/// Individual unit-list tokens that fail to parse are skipped with a
/// warning; only a top-level shape violation is fatal.
pub fn normalize(raw: &serde_json::Value) -> Result<Vec<RecordingSet>, MirrorError> {
    let catalog: RawCatalog = serde_json::from_value(raw.clone())
        .map_err(|err| MirrorError::InvalidCatalogFormat(err.to_string()))?;

    let sets = match catalog {
        RawCatalog::Flat(sets) => sets
            .into_iter()
            .map(|mut set| {
                set.available_units = dedup_ordered(set.available_units);
                set
            })
            .collect(),
        RawCatalog::Nested { reciters } => {
            let mut sets = Vec::new();
            for provider in reciters {
                for variant in provider.moshaf {
                    sets.push(RecordingSet {
                        id: provider.id,
                        group_key: Some(variant.id),
                        base_url: variant.server,
                        available_units: parse_unit_list(provider.id, &variant.surah_list),
                    });
                }
            }
            sets
        }
    };

    Ok(sets)
}

pub fn normalize_str(raw: &str) -> Result<Vec<RecordingSet>, MirrorError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|err| MirrorError::InvalidCatalogFormat(err.to_string()))?;
    normalize(&value)
}

fn parse_unit_list(set_id: u32, list: &str) -> Vec<u32> {
    let mut units = Vec::new();
    for token in list.split(',') {
        if token.trim().is_empty() {
            continue;
        }
        match parse_unit(token) {
            Ok(unit) => units.push(unit),
            Err(err) => {
                warn!(set_id, token = token.trim(), "skipping unit entry: {err}");
            }
        }
    }
    dedup_ordered(units)
}

fn dedup_ordered(units: Vec<u32>) -> Vec<u32> {
    let mut seen = std::collections::HashSet::new();
    units.into_iter().filter(|unit| seen.insert(*unit)).collect()
}
