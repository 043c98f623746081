//! Export evenly timed captions from a project's script.

use std::path::PathBuf;

use reelforge_project_model::ProjectStore;
use reelforge_script::{caption_segments, save_captions};

use super::load_project;

pub fn run(store: &ProjectStore, id: &str, output: PathBuf) -> anyhow::Result<()> {
    let project = load_project(store, id)?;

    let mut lines: Vec<String> = project
        .script
        .features
        .iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    if lines.is_empty() && !project.script.title.trim().is_empty() {
        lines.push(project.script.title.trim().to_string());
    }
    if lines.is_empty() {
        anyhow::bail!("Project script has no title or features to caption");
    }

    let segments = caption_segments(&lines, project.duration);
    save_captions(&segments, &output)
        .map_err(|e| anyhow::anyhow!("Failed to write captions: {e}"))?;

    println!("[OK] {} caption(s) written to {}", segments.len(), output.display());
    Ok(())
}
