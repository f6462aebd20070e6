use lab_pi::engine::RetentionSweeper;
use lab_pi::persistence::FrameStore;
use std::fs::{self, File};
use std::time::{Duration, SystemTime};

const HOUR: Duration = Duration::from_secs(3600);

fn touch(path: &std::path::Path, age: Duration) {
    File::create(path)
        .unwrap()
        .set_modified(SystemTime::now() - age)
        .unwrap();
}

#[test]
fn test_window_keeps_only_recent_frames() {
    let dir = tempfile::tempdir().unwrap();
    let camera = dir.path().join("camera");
    fs::create_dir_all(&camera).unwrap();

    // * Names claim the opposite ages; only mtime counts
    touch(&camera.join("29991231_235959.jpg"), 30 * HOUR);
    touch(&camera.join("20000101_000000.jpg"), HOUR);
    touch(&camera.join("20000101_000001.jpg"), 23 * HOUR);
    touch(&camera.join("notes.txt"), 100 * HOUR);

    let report = RetentionSweeper::new(&camera, 24 * HOUR).sweep().unwrap();
    assert_eq!(report.removed.len(), 1);
    assert_eq!(report.kept, 2);

    let store = FrameStore::new(&camera);
    let names: Vec<String> = store
        .list()
        .unwrap()
        .iter()
        .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
        .collect();
    assert_eq!(names, vec!["20000101_000000.jpg", "20000101_000001.jpg"]);
    assert!(camera.join("notes.txt").exists());
}

#[test]
fn test_sweep_twice_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("20250314_080000.jpg"), 48 * HOUR);

    let sweeper = RetentionSweeper::new(dir.path(), 24 * HOUR);
    assert_eq!(sweeper.sweep().unwrap().removed.len(), 1);
    assert_eq!(sweeper.sweep().unwrap(), Default::default());
}
