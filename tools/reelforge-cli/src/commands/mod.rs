pub mod captions;
pub mod check;
pub mod extract;
pub mod import;
pub mod info;
pub mod init;
pub mod list;
pub mod overlay;
pub mod render;
pub mod slideshow;
pub mod validate;

use reelforge_project_model::{Project, ProjectStore};

pub(crate) fn load_project(store: &ProjectStore, id: &str) -> anyhow::Result<Project> {
    store
        .load(id)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))
}
