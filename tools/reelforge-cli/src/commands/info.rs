//! Show project information.

use reelforge_project_model::ProjectStore;

use super::load_project;

pub fn run(store: &ProjectStore, id: &str) -> anyhow::Result<()> {
    let p = load_project(store, id)?;

    println!("Project: {}", p.name);
    println!("  ID: {}", p.id);
    println!("  Created: {}", p.created_at);
    println!("  Modified: {}", p.updated_at);
    println!(
        "  Canvas: {}x{} @ {}fps, {:.2}s ({} frames)",
        p.width,
        p.height,
        p.fps,
        p.duration,
        p.frame_count()
    );
    println!();

    println!("Tracks:");
    for track in &p.tracks {
        println!("  {} ({:?}): {} clip(s)", track.id, track.kind, track.clips.len());
        for clip in &track.clips {
            let what = clip
                .src
                .as_deref()
                .or(clip.text.as_deref())
                .unwrap_or("-");
            println!(
                "    {} [{:.2}s → {:.2}s] {}",
                clip.id,
                clip.start,
                clip.end(),
                what.lines().next().unwrap_or_default()
            );
        }
    }
    println!();

    println!("Template: {}", p.template.name);
    if p.template.is_blank() {
        println!("  (blank, no overlay)");
    } else {
        println!("  Header: {}", p.template.header);
        println!("  Footer: {}", p.template.footer);
        println!("  CTA: {}", p.template.cta_label);
    }
    println!();

    println!("Script:");
    println!("  Title: {}", p.script.title);
    println!("  Price: {}", p.script.price.as_deref().unwrap_or("-"));
    println!("  Features: {}", p.script.features.len());
    println!("  Assets: {}", p.assets.len());

    Ok(())
}
