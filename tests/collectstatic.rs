use airport_service::staticfiles::{bundled_files, collect_static, Manifest, MANIFEST_NAME};
use sha2::{Digest, Sha256};
use std::fs;
use tempfile::TempDir;

#[test]
fn copies_assets_and_writes_manifest() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("static");

    let collected = collect_static(&root, false).unwrap();
    assert_eq!(collected, bundled_files());

    let manifest: Manifest =
        serde_json::from_slice(&fs::read(root.join(MANIFEST_NAME)).unwrap()).unwrap();
    assert_eq!(manifest.paths.len(), collected.len());

    let robots = fs::read(root.join("robots.txt")).unwrap();
    assert_eq!(
        manifest.paths["robots.txt"],
        hex::encode(Sha256::digest(&robots))
    );
    assert!(root.join("css/site.css").is_file());
}

#[test]
fn keeps_unrelated_files_unless_cleared() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("old")).unwrap();
    fs::write(root.join("old/stale.js"), "stale").unwrap();

    collect_static(root, false).unwrap();
    assert!(root.join("old/stale.js").exists());

    collect_static(root, true).unwrap();
    assert!(!root.join("old").exists());
    assert!(root.join("index.html").is_file());
}

#[test]
fn running_twice_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let first = collect_static(dir.path(), false).unwrap();
    let manifest = fs::read(dir.path().join(MANIFEST_NAME)).unwrap();

    let second = collect_static(dir.path(), false).unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(dir.path().join(MANIFEST_NAME)).unwrap(), manifest);
}
