//! Full exports through a real ffmpeg process. Skipped when ffmpeg is not installed.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use image::{Rgba, RgbaImage};

use reelforge_project_model::{Clip, MediaKind, Project, Template};
use reelforge_render_engine::video::command_exists;
use reelforge_render_engine::{export_project, ExportJob, RenderOptions};

/// `key=value` pairs ffprobe reports for the first video stream and the container.
fn probe(path: &Path) -> HashMap<String, String> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate:format=duration",
            "-of",
            "default=noprint_wrappers=1",
        ])
        .arg(path)
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn fast_options() -> RenderOptions {
    RenderOptions {
        preset: "ultrafast".to_string(),
        ..RenderOptions::default()
    }
}

#[tokio::test]
async fn test_single_image_project_exports_full_length_video() {
    if !command_exists("ffmpeg") {
        eprintln!("ffmpeg not found, skipping");
        return;
    }
    let dir = std::env::temp_dir().join(format!("reelforge_export_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let src = dir.join("still.png");
    RgbaImage::from_pixel(400, 300, Rgba([40, 120, 200, 255]))
        .save(&src)
        .unwrap();

    let mut project = Project::new("scenario", 1080, 1920, 30, 10.0);
    project
        .track_mut(MediaKind::Image)
        .unwrap()
        .clips
        .push(Clip::new("c1", MediaKind::Image, 0.0, 10.0).with_src(src.to_string_lossy()));

    let output = dir.join("out.mp4");
    let job = ExportJob::new(project, &output).with_options(fast_options());
    let report = export_project(job, None).await.unwrap();

    assert_eq!(report.frames, 300);
    assert!(report.skipped.is_empty());
    let size = std::fs::metadata(&output).unwrap().len();
    assert!(size > 0);

    if command_exists("ffprobe") {
        let info = probe(&output);
        assert_eq!(info["width"], "1080");
        assert_eq!(info["height"], "1920");
        assert_eq!(info["r_frame_rate"], "30/1");
        let duration: f64 = info["duration"].parse().unwrap();
        assert!((duration - 10.0).abs() < 0.05, "duration was {duration}");
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_overlay_only_project_still_exports() {
    if !command_exists("ffmpeg") {
        return;
    }
    let dir = std::env::temp_dir().join(format!("reelforge_overlay_{}", std::process::id()));
    let mut project = Project::new("overlay", 270, 480, 10, 1.0);
    project.template = Template {
        header: "TODAY ONLY".to_string(),
        cta_label: "Buy".to_string(),
        ..Template::default()
    };

    let output = dir.join("nested").join("overlay.mp4");
    let job = ExportJob::new(project, &output).with_options(fast_options());
    let report = export_project(job, None).await.unwrap();

    assert_eq!(report.frames, 10);
    assert!(output.exists());

    std::fs::remove_dir_all(&dir).ok();
}
