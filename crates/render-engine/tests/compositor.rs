//! End-to-end compositor runs against an in-memory frame sink.

use std::path::PathBuf;

use image::{Rgba, RgbaImage};

use reelforge_common::error::ReelError;
use reelforge_project_model::{Clip, MediaKind, Project, Template};
use reelforge_render_engine::{
    render_with, AudioCue, EncodeSettings, ExportJob, MemorySink, RenderOptions,
};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("reelforge_it_{name}_{}", std::process::id()))
}

fn solid_png(name: &str, color: Rgba<u8>) -> String {
    let path = temp_path(name).with_extension("png");
    RgbaImage::from_pixel(32, 32, color).save(&path).unwrap();
    path.to_string_lossy().to_string()
}

fn keep_frames(_: &EncodeSettings, _: &[AudioCue]) -> reelforge_common::ReelResult<MemorySink> {
    Ok(MemorySink::keeping())
}

fn shop_template() -> Template {
    Template {
        header: "DEAL".to_string(),
        footer: "@shop".to_string(),
        bottom_gradient: false,
        ..Template::default()
    }
}

#[test]
fn test_frame_count_matches_duration() {
    let mut project = Project::new("count", 36, 64, 12, 1.25);
    project.template = shop_template();
    let job = ExportJob::new(project, temp_path("count.mp4"));
    let (report, sink) = render_with(&job, None, keep_frames, None).unwrap();
    assert_eq!(report.frames, 15);
    assert_eq!(sink.frames.len(), 15);
    assert!(sink.frames.iter().all(|f| f.dimensions() == (36, 64)));
}

#[test]
fn test_overlay_only_render_draws_template() {
    let mut project = Project::new("overlay", 108, 192, 5, 0.4);
    project.template = shop_template();
    let job = ExportJob::new(project, temp_path("overlay.mp4"));
    let (report, sink) = render_with(&job, None, keep_frames, None).unwrap();
    assert!(report.skipped.is_empty());
    // The header bar is drawn in the theme colour over the black base.
    let top = sink.frames[0].get_pixel(2, 2);
    assert_ne!(*top, Rgba([0, 0, 0, 255]));
    assert_eq!(top[3], 255);
}

#[test]
fn test_blank_project_is_an_error() {
    let project = Project::new("blank", 36, 64, 10, 1.0);
    let job = ExportJob::new(project, temp_path("blank.mp4"));
    let result = render_with(&job, None, keep_frames, None);
    assert!(matches!(result, Err(ReelError::Render { .. })));
}

#[test]
fn test_only_broken_clips_is_an_error() {
    let mut project = Project::new("broken", 36, 64, 10, 1.0);
    project.tracks[0]
        .clips
        .push(Clip::new("a", MediaKind::Image, 0.0, 1.0).with_src("/nonexistent/a.png"));
    let job = ExportJob::new(project, temp_path("broken.mp4"));
    assert!(render_with(&job, None, keep_frames, None).is_err());
}

#[test]
fn test_image_clip_with_opacity_and_skipped_sibling() {
    let mut project = Project::new("image", 36, 64, 10, 1.0);
    let mut clip =
        Clip::new("white", MediaKind::Image, 0.0, 1.0).with_src(solid_png("white", Rgba([255, 255, 255, 255])));
    clip.transform.opacity = 0.5;
    project.tracks[0].clips.push(clip);
    project.tracks[0]
        .clips
        .push(Clip::new("gone", MediaKind::Image, 0.0, 1.0).with_src("/nonexistent/gone.png"));

    let job = ExportJob::new(project, temp_path("image.mp4"))
        .with_options(RenderOptions {
            drift_slope: 0.0,
            ..Default::default()
        });
    let (report, sink) = render_with(&job, None, keep_frames, None).unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].clip_id, "gone");
    assert_eq!(report.skipped[0].track_id, "v1");
    let px = sink.frames[3].get_pixel(18, 32);
    assert!((125..=130).contains(&px[0]));
    assert_eq!(px[3], 255);
}

#[test]
fn test_text_clip_appears_only_while_active() {
    let mut project = Project::new("text", 200, 100, 10, 1.0);
    let mut clip = Clip::new("t", MediaKind::Text, 0.5, 0.5).with_text("HELLO");
    clip.transform.x = 0.5;
    clip.transform.y = 0.5;
    clip.text_size = 32;
    project.tracks[1].clips.push(clip);

    let job = ExportJob::new(project, temp_path("text.mp4"));
    let (_, sink) = render_with(&job, None, keep_frames, None).unwrap();

    let lit = |frame: &RgbaImage| frame.pixels().filter(|p| p[0] > 128).count();
    assert_eq!(lit(&sink.frames[0]), 0);
    assert!(lit(&sink.frames[5]) > 0);
    assert!(lit(&sink.frames[9]) > 0);
}
