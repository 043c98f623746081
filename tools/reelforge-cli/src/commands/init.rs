//! Initialize a new ReelForge project.

use reelforge_common::config::AppConfig;
use reelforge_project_model::ProjectStore;

pub fn run(
    store: &ProjectStore,
    config: &AppConfig,
    name: String,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
    duration: Option<f64>,
) -> anyhow::Result<()> {
    let defaults = &config.render;
    let width = width.unwrap_or(defaults.width);
    let height = height.unwrap_or(defaults.height);
    let fps = fps.unwrap_or(defaults.fps);
    let duration = duration.unwrap_or(defaults.duration_secs);

    let project = store
        .create(&name, width, height, fps, duration)
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    println!("Project created successfully:");
    println!("  ID: {}", project.id);
    println!("  Directory: {}", store.project_dir(&project.id).display());
    println!("  Canvas: {width}x{height} @ {fps}fps, {duration:.1}s");
    println!();
    println!("Directory structure:");
    println!("  {}/", project.id);
    println!("  ├── project.json  (tracks, template, script)");
    println!("  ├── assets/       (imported media)");
    println!("  └── renders/      (rendered output)");

    Ok(())
}
