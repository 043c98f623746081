use std::path::PathBuf;

use reelforge_project_model::{Clip, MediaKind, ProjectError, ProjectStore};

fn fresh_root(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("reelforge_store_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_create_then_load_preserves_document() {
    let root = fresh_root("create");
    let store = ProjectStore::new(&root);

    let mut project = store.create("Promo", 720, 1280, 24, 8.0).unwrap();
    assert!(store.project_dir(&project.id).join("project.json").exists());
    assert!(store.assets_dir(&project.id).is_dir());
    assert!(store.renders_dir(&project.id).is_dir());

    project
        .track_mut(MediaKind::Text)
        .unwrap()
        .clips
        .push(Clip::new("c1", MediaKind::Text, 0.5, 2.0).with_text("Hello"));
    store.save(&mut project).unwrap();

    let loaded = store.load(&project.id).unwrap();
    assert_eq!(loaded.name, "Promo");
    assert_eq!((loaded.width, loaded.height, loaded.fps), (720, 1280, 24));
    assert_eq!(loaded.tracks.len(), 3);
    assert_eq!(loaded.tracks[1].clips[0].text.as_deref(), Some("Hello"));

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn test_load_missing_is_not_found() {
    let root = fresh_root("missing");
    let store = ProjectStore::new(&root);
    assert!(matches!(
        store.load("doesnotexist"),
        Err(ProjectError::NotFound { .. })
    ));
}

#[test]
fn test_list_sorted_by_update_desc() {
    let root = fresh_root("list");
    let store = ProjectStore::new(&root);
    assert!(store.list().unwrap().is_empty());

    let mut first = store.create("first", 1080, 1920, 30, 10.0).unwrap();
    let _second = store.create("second", 1080, 1920, 30, 10.0).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    store.save(&mut first).unwrap();

    let listing = store.list().unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].name, "first");
    assert_eq!(listing[1].name, "second");

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn test_import_asset_copies_and_registers() {
    let root = fresh_root("import");
    let store = ProjectStore::new(&root);
    let mut project = store.create("assets", 1080, 1920, 30, 10.0).unwrap();

    let src = root.join("input.png");
    std::fs::write(&src, b"not really a png").unwrap();

    let asset_id = store.import_asset(&mut project, &src).unwrap();
    let stored = project.assets.get(&asset_id).unwrap();
    assert!(stored.starts_with(store.assets_dir(&project.id)));
    assert_eq!(std::fs::read(stored).unwrap(), b"not really a png");
    assert!(project.missing_sources().is_empty());

    let reloaded = store.load(&project.id).unwrap();
    assert!(reloaded.assets.contains_key(&asset_id));

    std::fs::remove_dir_all(&root).ok();
}
