use std::sync::Mutex;

use camino::Utf8PathBuf;

use recitation_mirror::cache::{CatalogCache, CatalogFetcher};
use recitation_mirror::error::MirrorError;

struct CountingFetcher {
    calls: Mutex<usize>,
}

impl CatalogFetcher for CountingFetcher {
    fn fetch(&self) -> Result<serde_json::Value, MirrorError> {
        *self.calls.lock().unwrap() += 1;
        Ok(serde_json::json!([
            { "id": 12, "server": "https://server.example/", "available_chapters": [1, 2, 3] }
        ]))
    }
}

struct PanickingFetcher;

impl CatalogFetcher for PanickingFetcher {
    fn fetch(&self) -> Result<serde_json::Value, MirrorError> {
        panic!("remote fetch must not happen when the snapshot exists");
    }
}

fn cache_in(temp: &tempfile::TempDir) -> CatalogCache {
    let path = Utf8PathBuf::from_path_buf(temp.path().join("cache").join("catalog.json")).unwrap();
    CatalogCache::new(path)
}

#[test]
fn miss_fetches_and_persists_snapshot() {
    let temp = tempfile::tempdir().unwrap();
    let cache = cache_in(&temp);
    let fetcher = CountingFetcher {
        calls: Mutex::new(0),
    };

    let sets = cache.load(&fetcher).unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].id, 12);
    assert!(cache.path().as_std_path().exists());
    assert_eq!(*fetcher.calls.lock().unwrap(), 1);
}

#[test]
fn existing_snapshot_avoids_the_network() {
    let temp = tempfile::tempdir().unwrap();
    let cache = cache_in(&temp);

    // Seed the snapshot first.
    let fetcher = CountingFetcher {
        calls: Mutex::new(0),
    };
    cache.load(&fetcher).unwrap();

    // Second load reads the file; any remote call would panic.
    let sets = cache.load(&PanickingFetcher).unwrap();
    assert_eq!(sets[0].available_units, vec![1, 2, 3]);
}

#[test]
fn nested_snapshot_seeded_by_operator_is_accepted() {
    let temp = tempfile::tempdir().unwrap();
    let cache = cache_in(&temp);
    std::fs::create_dir_all(cache.path().parent().unwrap().as_std_path()).unwrap();
    std::fs::write(
        cache.path().as_std_path(),
        r#"{ "reciters": [ { "id": 2, "moshaf": [ { "id": 2, "server": "https://s/", "surah_list": "1" } ] } ] }"#,
    )
    .unwrap();

    let sets = cache.load(&PanickingFetcher).unwrap();
    assert_eq!(sets[0].id, 2);
    assert_eq!(sets[0].group_key, Some(2));
}
