//! Import a media file into a project.

use std::path::PathBuf;

use reelforge_project_model::ProjectStore;

use super::load_project;

pub fn run(store: &ProjectStore, id: &str, file: PathBuf) -> anyhow::Result<()> {
    let mut project = load_project(store, id)?;
    let asset_id = store
        .import_asset(&mut project, &file)
        .map_err(|e| anyhow::anyhow!("Failed to import {}: {e}", file.display()))?;

    println!("Imported {} as asset {asset_id}", file.display());
    if let Some(path) = project.assets.get(&asset_id) {
        println!("  Stored at: {}", path.display());
    }
    Ok(())
}
