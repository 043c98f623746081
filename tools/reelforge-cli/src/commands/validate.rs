//! Validate a ReelForge project.

use reelforge_project_model::{MediaKind, ProjectStore};

use super::load_project;

pub fn run(store: &ProjectStore, id: &str) -> anyhow::Result<()> {
    let project = load_project(store, id)?;
    println!("Validating project: {} ({})", project.name, project.id);
    println!("  Version: {}", project.version);
    println!(
        "  Canvas: {}x{} @ {}fps, {:.2}s",
        project.width, project.height, project.fps, project.duration
    );

    let mut errors = vec![];
    if let Err(e) = project.validate() {
        errors.push(e.to_string());
    }
    errors.extend(project.missing_sources());

    for track in &project.tracks {
        for clip in &track.clips {
            if let Err(e) = clip.keyframe_track() {
                errors.push(format!("Track {} clip {}: {e}", track.id, clip.id));
            }
            if clip.duration <= 0.0 {
                errors.push(format!(
                    "Track {} clip {}: non-positive duration {}",
                    track.id, clip.id, clip.duration
                ));
            }
            if clip.start >= project.duration {
                errors.push(format!(
                    "Track {} clip {}: starts after the project ends",
                    track.id, clip.id
                ));
            }
            let needs_src = matches!(track.kind, MediaKind::Image | MediaKind::Video | MediaKind::Audio);
            if needs_src && clip.src.as_deref().map_or(true, |s| s.trim().is_empty()) {
                errors.push(format!("Track {} clip {}: no source", track.id, clip.id));
            }
        }
    }

    let visual = project
        .tracks
        .iter()
        .filter(|t| t.kind != MediaKind::Audio)
        .map(|t| t.clips.len())
        .sum::<usize>();
    if visual == 0 && project.template.is_blank() {
        errors.push("Nothing to render: no visual clips and a blank template".to_string());
    }

    if errors.is_empty() {
        println!("  Clips: {}", project.clip_count());
        println!("\nProject is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        println!(
            "\n{} issue(s) found. Affected clips will be skipped when rendering.",
            errors.len()
        );
    }

    Ok(())
}
