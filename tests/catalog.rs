use assert_matches::assert_matches;

use recitation_mirror::catalog::{normalize, normalize_str};
use recitation_mirror::error::MirrorError;

#[test]
fn nested_catalog_flattens_per_variant() {
    let raw = r#"{
        "reciters": [
            {
                "id": 54,
                "name": "Example Narrator",
                "letter": "E",
                "moshaf": [
                    { "id": 54, "server": "https://server.example/a/", "surah_list": "1,2,114", "moshaf_type": 11 },
                    { "id": 128, "server": "https://server.example/b/", "surah_list": "1", "moshaf_type": 21 }
                ]
            },
            {
                "id": 60,
                "name": "Second Narrator",
                "moshaf": [
                    { "id": 60, "server": "https://server.example/c/", "surah_list": "99,114", "moshaf_type": 11 }
                ]
            }
        ]
    }"#;

    let sets = normalize_str(raw).unwrap();
    assert_eq!(sets.len(), 3);
    assert_eq!(sets[0].id, 54);
    assert_eq!(sets[0].group_key, Some(54));
    assert_eq!(sets[0].unit_url(2), "https://server.example/a/002.mp3");
    assert_eq!(sets[2].id, 60);
    assert_eq!(sets[2].available_units, vec![99, 114]);
}

#[test]
fn flat_catalog_bypasses_shape_mapping() {
    let raw = r#"[
        { "id": 5, "server": "https://server.example/", "available_chapters": [1, 99, 114] }
    ]"#;

    let sets = normalize_str(raw).unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].group_key, None);
    assert_eq!(sets[0].available_units, vec![1, 99, 114]);
}

#[test]
fn non_numeric_token_skips_only_that_token() {
    let raw = serde_json::json!({
        "reciters": [
            {
                "id": 1,
                "moshaf": [
                    { "id": 1, "server": "https://server.example/", "surah_list": "1,two,3" }
                ]
            }
        ]
    });

    let sets = normalize(&raw).unwrap();
    assert_eq!(sets[0].available_units, vec![1, 3]);
}

#[test]
fn missing_top_level_array_is_invalid() {
    let err = normalize_str(r#"{ "something": 1 }"#).unwrap_err();
    assert_matches!(err, MirrorError::InvalidCatalogFormat(_));

    let err = normalize_str("not json at all").unwrap_err();
    assert_matches!(err, MirrorError::InvalidCatalogFormat(_));
}

#[test]
fn canonical_model_round_trips_as_flat_shape() {
    let raw = r#"[
        { "id": 5, "server": "https://server.example/", "available_chapters": [1, 2] }
    ]"#;
    let sets = normalize_str(raw).unwrap();
    let dumped = serde_json::to_string(&sets).unwrap();
    let again = normalize_str(&dumped).unwrap();
    assert_eq!(sets, again);
}
