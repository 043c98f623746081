//! List stored projects.

use reelforge_project_model::ProjectStore;

pub fn run(store: &ProjectStore) -> anyhow::Result<()> {
    let projects = store
        .list()
        .map_err(|e| anyhow::anyhow!("Failed to list projects: {e}"))?;

    if projects.is_empty() {
        println!("No projects in {}", store.root().display());
        return Ok(());
    }
    for p in &projects {
        println!("{}  {:<32}  {}", p.id, p.name, p.updated_at);
    }
    Ok(())
}
