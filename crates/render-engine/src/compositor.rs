//! Timeline compositor: turns a project into a sequence of RGBA frames.
//!
//! Preparation walks tracks and clips once, building a layer per visual
//! clip and an audio cue per audio clip. A clip that fails to prepare is
//! skipped and recorded; the rest of the timeline still renders. The frame
//! loop then samples every active layer at `t = i / fps`.

use image::{Rgba, RgbaImage};
use serde::Serialize;

use reelforge_common::error::{ReelError, ReelResult};
use reelforge_project_model::{Clip, MediaKind, Project};

use crate::encode::FrameSink;
use crate::geometry::Size;
use crate::layers::{
    prepare_audio, prepare_still, prepare_text, prepare_video, AudioCue, StillLayer, TextLayer,
    VideoLayer,
};
use crate::overlay::render_overlay;
use crate::paint::blend_layer;
use crate::text::FontBook;

/// A clip left out of the render, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedClip {
    pub track_id: String,
    pub clip_id: String,
    pub reason: String,
}

enum LayerKind {
    Still(StillLayer),
    Video(VideoLayer),
    Text(TextLayer),
}

struct ClipLayer {
    track_id: String,
    clip: Clip,
    kind: LayerKind,
    failed: bool,
}

/// Everything needed to produce frames for one project.
pub struct PreparedTimeline {
    canvas: Size,
    fps: u32,
    duration: f64,
    layers: Vec<ClipLayer>,
    audio: Vec<AudioCue>,
    overlay: Option<RgbaImage>,
    skipped: Vec<SkippedClip>,
}

impl PreparedTimeline {
    /// Prepare every clip in track order.
    ///
    /// `on_clip(done, total)` is called after each clip, prepared or skipped.
    /// Fails only when nothing visual would be drawn at all.
    pub fn prepare(
        project: &Project,
        fonts: &FontBook,
        drift_slope: f64,
        mut on_clip: impl FnMut(usize, usize),
    ) -> ReelResult<Self> {
        project
            .validate()
            .map_err(|e| ReelError::project(e.to_string()))?;

        let canvas = Size::new(project.width, project.height);
        let total = project.clip_count();
        let mut done = 0;
        let mut timeline = Self {
            canvas,
            fps: project.fps,
            duration: project.duration,
            layers: vec![],
            audio: vec![],
            overlay: None,
            skipped: vec![],
        };

        for track in &project.tracks {
            for clip in &track.clips {
                let prepared = match track.kind {
                    MediaKind::Image if clip.has_video_source() => {
                        prepare_video(clip, canvas, project.fps).map(|l| Some(LayerKind::Video(l)))
                    }
                    MediaKind::Image => prepare_still(clip, canvas, drift_slope)
                        .map(|l| Some(LayerKind::Still(l))),
                    MediaKind::Video => {
                        prepare_video(clip, canvas, project.fps).map(|l| Some(LayerKind::Video(l)))
                    }
                    MediaKind::Text => {
                        prepare_text(clip, canvas, fonts).map(|l| l.map(LayerKind::Text))
                    }
                    MediaKind::Audio => prepare_audio(clip).map(|cue| {
                        timeline.audio.push(cue);
                        None
                    }),
                };

                match prepared {
                    Ok(Some(kind)) => timeline.layers.push(ClipLayer {
                        track_id: track.id.clone(),
                        clip: clip.clone(),
                        kind,
                        failed: false,
                    }),
                    Ok(None) => {}
                    Err(e) => timeline.skip(&track.id, &clip.id, e.to_string()),
                }

                done += 1;
                on_clip(done, total);
            }
        }

        timeline.overlay = render_overlay(
            &project.template,
            &project.script,
            project.width,
            project.height,
            fonts,
        );

        if timeline.layers.is_empty() && timeline.overlay.is_none() {
            return Err(ReelError::render(format!(
                "Nothing to render: no visual clip could be prepared ({} skipped) and the template is blank",
                timeline.skipped.len()
            )));
        }

        tracing::info!(
            layers = timeline.layers.len(),
            audio = timeline.audio.len(),
            skipped = timeline.skipped.len(),
            overlay = timeline.overlay.is_some(),
            "Timeline prepared"
        );
        Ok(timeline)
    }

    fn skip(&mut self, track_id: &str, clip_id: &str, reason: String) {
        tracing::warn!(track = %track_id, clip = %clip_id, reason = %reason, "Skipping clip");
        self.skipped.push(SkippedClip {
            track_id: track_id.to_string(),
            clip_id: clip_id.to_string(),
            reason,
        });
    }

    /// Number of output frames; the composite is cut at the project duration.
    pub fn frame_count(&self) -> u64 {
        ((self.duration * self.fps as f64).round() as u64).max(1)
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn audio(&self) -> &[AudioCue] {
        &self.audio
    }

    /// Add an extra audio cue, e.g. narration. It mixes with existing audio.
    pub fn push_audio(&mut self, cue: AudioCue) {
        self.audio.push(cue);
    }

    pub fn skipped(&self) -> &[SkippedClip] {
        &self.skipped
    }

    pub fn overlay(&self) -> Option<&RgbaImage> {
        self.overlay.as_ref()
    }

    /// Composite the frame at project time `t`.
    ///
    /// A layer that fails mid-render (e.g. its decoder dies) is skipped
    /// from then on and recorded.
    pub fn render_frame(&mut self, t: f64) -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(
            self.canvas.width,
            self.canvas.height,
            Rgba([0, 0, 0, 255]),
        );
        let mut failures = vec![];

        for layer in self.layers.iter_mut().filter(|l| !l.failed) {
            let clip = &layer.clip;
            if !clip.is_active_at(t) {
                continue;
            }
            let local_t = clip.local_time(t);
            let opacity = clip.transform.opacity * clip.fade_factor(local_t);
            if opacity <= 0.0 {
                continue;
            }

            match &mut layer.kind {
                LayerKind::Still(still) => {
                    if let Some(img) = still.frame(local_t, clip.duration) {
                        blend_layer(&mut frame, &img, opacity);
                    }
                }
                LayerKind::Text(text) => blend_layer(&mut frame, &text.image, opacity),
                LayerKind::Video(video) => {
                    if let Err(e) = video.draw(&mut frame, local_t, opacity) {
                        layer.failed = true;
                        failures.push((layer.track_id.clone(), clip.id.clone(), e.to_string()));
                    }
                }
            }
        }

        for (track_id, clip_id, reason) in failures {
            self.skip(&track_id, &clip_id, reason);
        }

        if let Some(overlay) = &self.overlay {
            blend_layer(&mut frame, overlay, 1.0);
        }
        frame
    }

    /// Render every frame into `sink` and close it.
    ///
    /// `on_frame(rendered, total)` is called after each frame.
    pub fn run(&mut self, sink: &mut dyn FrameSink, mut on_frame: impl FnMut(u64, u64)) -> ReelResult<u64> {
        let total = self.frame_count();
        for i in 0..total {
            let t = i as f64 / self.fps as f64;
            let frame = self.render_frame(t);
            sink.write_frame(&frame)?;
            on_frame(i + 1, total);
        }
        sink.finish()?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::MemorySink;
    use crate::video::{command_exists, write_silent_wav};
    use reelforge_project_model::Template;

    fn fonts() -> FontBook {
        FontBook::builtin().unwrap()
    }

    fn small_project(duration: f64) -> Project {
        Project::new("t", 36, 64, 10, duration)
    }

    fn png(name: &str, color: Rgba<u8>) -> String {
        let path = std::env::temp_dir().join(format!(
            "reelforge_compositor_{name}_{}.png",
            std::process::id()
        ));
        RgbaImage::from_pixel(20, 20, color).save(&path).unwrap();
        path.to_string_lossy().to_string()
    }

    fn with_footer(mut project: Project) -> Project {
        project.template = Template {
            footer: "@shop".to_string(),
            bottom_gradient: false,
            ..Template::default()
        };
        project
    }

    #[test]
    fn test_empty_project_with_blank_template_fails() {
        let project = small_project(1.0);
        let err = PreparedTimeline::prepare(&project, &fonts(), 0.02, |_, _| {})
            .err()
            .unwrap();
        assert!(matches!(err, ReelError::Render { .. }));
    }

    #[test]
    fn test_missing_source_is_skipped_not_fatal() {
        let mut project = with_footer(small_project(1.0));
        project.tracks[0].clips.push(
            Clip::new("gone", MediaKind::Image, 0.0, 1.0).with_src("/nonexistent/gone.png"),
        );
        let timeline = PreparedTimeline::prepare(&project, &fonts(), 0.02, |_, _| {}).unwrap();
        assert_eq!(timeline.skipped().len(), 1);
        assert_eq!(timeline.skipped()[0].clip_id, "gone");
    }

    #[test]
    fn test_clip_visible_only_inside_window() {
        let mut project = small_project(2.0);
        let red = png("window", Rgba([255, 0, 0, 255]));
        project.tracks[0]
            .clips
            .push(Clip::new("c", MediaKind::Image, 0.5, 1.0).with_src(red));
        let mut timeline = PreparedTimeline::prepare(&project, &fonts(), 0.0, |_, _| {}).unwrap();

        assert_eq!(*timeline.render_frame(0.0).get_pixel(18, 32), Rgba([0, 0, 0, 255]));
        assert_eq!(*timeline.render_frame(0.5).get_pixel(18, 32), Rgba([255, 0, 0, 255]));
        assert_eq!(*timeline.render_frame(1.5).get_pixel(18, 32), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_later_tracks_draw_on_top() {
        let mut project = small_project(1.0);
        let red = png("bottom", Rgba([255, 0, 0, 255]));
        let blue = png("top", Rgba([0, 0, 255, 255]));
        project.tracks[0]
            .clips
            .push(Clip::new("red", MediaKind::Image, 0.0, 1.0).with_src(red));
        project.tracks.push(reelforge_project_model::Track {
            id: "v2".to_string(),
            kind: MediaKind::Image,
            clips: vec![Clip::new("blue", MediaKind::Image, 0.0, 1.0).with_src(blue)],
        });
        let mut timeline = PreparedTimeline::prepare(&project, &fonts(), 0.0, |_, _| {}).unwrap();
        assert_eq!(*timeline.render_frame(0.0).get_pixel(18, 32), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_fade_in_blends_towards_black() {
        let mut project = small_project(2.0);
        let white = png("fade", Rgba([255, 255, 255, 255]));
        let mut clip = Clip::new("c", MediaKind::Image, 0.0, 2.0).with_src(white);
        clip.fade_in = 1.0;
        project.tracks[0].clips.push(clip);
        let mut timeline = PreparedTimeline::prepare(&project, &fonts(), 0.0, |_, _| {}).unwrap();
        let mid = timeline.render_frame(0.5).get_pixel(18, 32)[0];
        assert!((120..=135).contains(&mid));
        assert_eq!(timeline.render_frame(1.5).get_pixel(18, 32)[0], 255);
    }

    #[test]
    fn test_run_writes_exact_frame_count() {
        let mut project = with_footer(small_project(1.5));
        project.tracks[0].clips.push(
            Clip::new("late", MediaKind::Image, 1.0, 10.0)
                .with_src(png("late", Rgba([0, 255, 0, 255]))),
        );
        let mut timeline = PreparedTimeline::prepare(&project, &fonts(), 0.02, |_, _| {}).unwrap();
        let mut sink = MemorySink::counting();
        let mut last = (0, 0);
        let frames = timeline.run(&mut sink, |i, n| last = (i, n)).unwrap();
        assert_eq!(frames, 15);
        assert_eq!(sink.frames_written, 15);
        assert_eq!(last, (15, 15));
        assert!(sink.finished);
    }

    #[test]
    fn test_audio_clips_become_cues() {
        let mut project = with_footer(small_project(1.0));
        let audio = std::env::temp_dir().join(format!("reelforge_compositor_music_{}.wav", std::process::id()));
        write_silent_wav(&audio);
        project.tracks[2]
            .clips
            .push(Clip::new("music", MediaKind::Audio, 0.25, 5.0).with_src(audio.to_string_lossy()));
        let mut calls = vec![];
        let timeline =
            PreparedTimeline::prepare(&project, &fonts(), 0.02, |d, t| calls.push((d, t))).unwrap();
        assert_eq!(timeline.audio().len(), 1);
        assert_eq!(timeline.audio()[0].start, 0.25);
        assert_eq!(calls, vec![(1, 1)]);
    }

    #[test]
    fn test_undecodable_audio_clip_is_skipped() {
        if !command_exists("ffprobe") {
            return;
        }
        let mut project = with_footer(small_project(1.0));
        let junk = std::env::temp_dir().join(format!("reelforge_compositor_junk_{}.mp3", std::process::id()));
        std::fs::write(&junk, b"ID3 not really audio").unwrap();
        project.tracks[2]
            .clips
            .push(Clip::new("bad", MediaKind::Audio, 0.0, 1.0).with_src(junk.to_string_lossy()));

        let timeline = PreparedTimeline::prepare(&project, &fonts(), 0.02, |_, _| {}).unwrap();
        assert!(timeline.audio().is_empty());
        assert_eq!(timeline.skipped().len(), 1);
        assert_eq!(timeline.skipped()[0].clip_id, "bad");
        std::fs::remove_file(junk).ok();
    }
}
