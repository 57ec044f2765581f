use camino::Utf8PathBuf;

use recitation_mirror::domain::RecordingSet;
use recitation_mirror::layout::Layout;

#[test]
fn layout_paths() {
    let layout = Layout::new_with_root(Utf8PathBuf::from("/srv/recitations"));

    assert_eq!(
        layout.unit_path(54, None, 7),
        "/srv/recitations/54/waveforms/007.mp3"
    );
    assert_eq!(
        layout.unit_path(54, Some(128), 114),
        "/srv/recitations/54/128/waveforms/114.mp3"
    );
    // Ids past three digits widen rather than truncate.
    assert_eq!(
        layout.unit_path(54, None, 1000),
        "/srv/recitations/54/waveforms/1000.mp3"
    );
}

#[test]
fn target_combines_url_and_path() {
    let layout = Layout::new_with_root(Utf8PathBuf::from("/srv/recitations"));
    let set = RecordingSet {
        id: 9,
        group_key: None,
        base_url: "https://server.example/x/".to_string(),
        available_units: vec![1],
    };

    let target = layout.target(&set, 1);
    assert_eq!(target.url, "https://server.example/x/001.mp3");
    assert_eq!(target.path, "/srv/recitations/9/waveforms/001.mp3");
    assert_eq!(target.set_id, 9);
}

#[test]
fn ensure_dir_is_idempotent() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("recitations")).unwrap();
    let layout = Layout::new_with_root(root);

    let dir = layout.set_dir(3, Some(3));
    layout.ensure_dir(&dir).unwrap();
    layout.ensure_dir(&dir).unwrap();
    assert!(dir.as_std_path().is_dir());
}
