//! Preview a project's template overlay as a still image.

use std::path::PathBuf;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use reelforge_common::config::AppConfig;
use reelforge_project_model::ProjectStore;
use reelforge_render_engine::geometry::{cover_fit, Size};
use reelforge_render_engine::{paint, render_overlay, FontBook};

use super::load_project;

pub fn run(
    store: &ProjectStore,
    config: &AppConfig,
    id: &str,
    output: PathBuf,
    background: Option<PathBuf>,
) -> anyhow::Result<()> {
    let project = load_project(store, id)?;
    let fonts = FontBook::resolve(&config.fonts)
        .map_err(|e| anyhow::anyhow!("Failed to load fonts: {e}"))?;

    let Some(overlay) = render_overlay(
        &project.template,
        &project.script,
        project.width,
        project.height,
        &fonts,
    ) else {
        anyhow::bail!("Template '{}' is blank; nothing to draw", project.template.name);
    };

    let mut frame = RgbaImage::from_pixel(project.width, project.height, Rgba([0, 0, 0, 255]));
    if let Some(bg) = &background {
        let src = image::open(bg)
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", bg.display()))?
            .to_rgba8();
        let canvas = Size::new(project.width, project.height);
        let place = cover_fit(Size::new(src.width(), src.height()), canvas);
        let scaled = imageops::resize(&src, place.size.width, place.size.height, FilterType::Triangle);
        paint::blend_at(&mut frame, &scaled, place.x, place.y, 1.0);
    }
    paint::blend_layer(&mut frame, &overlay, 1.0);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    frame
        .save(&output)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", output.display()))?;

    println!("[OK] Overlay written to {}", output.display());
    if let Some(src) = fonts.source() {
        println!("  Font: {}", src.display());
    }
    Ok(())
}
