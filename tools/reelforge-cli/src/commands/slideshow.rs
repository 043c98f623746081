//! Lay out images and script lines as a captioned slideshow.

use std::path::{Path, PathBuf};

use reelforge_project_model::{build_slideshow, is_image_path, Project, ProjectStore};
use reelforge_script::script_text;

use super::load_project;

pub fn run(
    store: &ProjectStore,
    id: &str,
    images: Vec<PathBuf>,
    min_slide: f64,
    max_slide: f64,
) -> anyhow::Result<()> {
    let mut project = load_project(store, id)?;

    let images = if images.is_empty() {
        asset_images(&project)
    } else {
        images
    };
    if images.is_empty() {
        anyhow::bail!("No images: pass --image or import image assets first");
    }
    if let Some(missing) = images.iter().find(|p| !p.exists()) {
        anyhow::bail!("Image not found: {}", missing.display());
    }

    let images: Vec<String> = images
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect();
    let captions: Vec<String> = script_text(&project.script)
        .lines()
        .map(str::to_string)
        .collect();

    let slides = build_slideshow(&mut project, &images, &captions, min_slide, max_slide)
        .map_err(|e| anyhow::anyhow!("Failed to build slideshow: {e}"))?;
    store
        .save(&mut project)
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;

    println!(
        "[OK] {slides} slide(s) of {:.2}s from {} image(s) and {} caption line(s)",
        project.duration / slides as f64,
        images.len(),
        captions.len()
    );
    Ok(())
}

/// Imported image assets, ordered by their original file names.
fn asset_images(project: &Project) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = project
        .assets
        .values()
        .filter(|p| is_image_path(p))
        .cloned()
        .collect();
    images.sort_by_key(|p| original_name(p));
    images
}

/// Asset file name without the `<asset id>_` prefix the store adds.
fn original_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.split_once('_') {
        Some((_, rest)) => rest.to_string(),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_images_sorted_by_original_name() {
        let mut project = Project::new("demo", 1080, 1920, 30, 10.0);
        project
            .assets
            .insert("aa".to_string(), PathBuf::from("/p/assets/aa_2_side.jpg"));
        project
            .assets
            .insert("bb".to_string(), PathBuf::from("/p/assets/bb_1_front.png"));
        project
            .assets
            .insert("cc".to_string(), PathBuf::from("/p/assets/cc_music.mp3"));

        let images = asset_images(&project);
        assert_eq!(
            images,
            vec![
                PathBuf::from("/p/assets/bb_1_front.png"),
                PathBuf::from("/p/assets/aa_2_side.jpg"),
            ]
        );
    }

    #[test]
    fn test_original_name_without_prefix() {
        assert_eq!(original_name(Path::new("/x/abc123_photo.png")), "photo.png");
        assert_eq!(original_name(Path::new("/x/plain.png")), "plain.png");
    }
}
