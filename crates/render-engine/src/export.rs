//! Export configuration and the render entry points.

use std::path::{Path, PathBuf};

use serde::Serialize;

use reelforge_common::config::{AppConfig, FontConfig, TtsConfig};
use reelforge_common::error::{ReelError, ReelResult};
use reelforge_project_model::Project;

use crate::compositor::{PreparedTimeline, SkippedClip};
use crate::encode::{EncodeSettings, FfmpegSink, FrameSink};
use crate::layers::AudioCue;
use crate::narration::{CommandSynthesizer, NarrationSynthesizer};
use crate::text::FontBook;
use crate::video::{command_exists, probe_audio_stream};

/// Renderer knobs that do not live in the project document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Zoom added over a still clip's lifetime when it has no keyframes.
    pub drift_slope: f64,

    /// x264 preset.
    pub preset: String,

    pub audio_bitrate_kbps: u32,

    pub fonts: FontConfig,

    pub tts: TtsConfig,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl RenderOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            drift_slope: config.render.drift_slope,
            preset: config.render.preset.clone(),
            audio_bitrate_kbps: config.render.audio_bitrate_kbps,
            fonts: config.fonts.clone(),
            tts: config.tts.clone(),
        }
    }
}

/// An export job ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub project: Project,

    /// Output file path.
    pub output_path: PathBuf,

    /// Synthesize the script as narration and mix it in.
    pub with_narration: bool,

    pub options: RenderOptions,
}

impl ExportJob {
    pub fn new(project: Project, output_path: impl Into<PathBuf>) -> Self {
        Self {
            project,
            output_path: output_path.into(),
            with_narration: false,
            options: RenderOptions::default(),
        }
    }

    pub fn with_narration(mut self, enabled: bool) -> Self {
        self.with_narration = enabled;
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    pub clips_processed: usize,

    pub total_clips: usize,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Narrating,
    Encoding,
    Complete,
}

/// Outcome of a finished render.
#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub output: PathBuf,
    pub frames: u64,
    /// Clips left out of the output, with the reason.
    pub skipped: Vec<SkippedClip>,
}

/// Trait for render backends.
pub trait RenderBackend: Send {
    /// Execute the export job.
    fn render(
        &mut self,
        job: &ExportJob,
        progress: Option<ProgressCallback>,
    ) -> ReelResult<RenderReport>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Composites frames in-process and pipes them to an ffmpeg encoder.
#[derive(Debug, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &mut self,
        job: &ExportJob,
        progress: Option<ProgressCallback>,
    ) -> ReelResult<RenderReport> {
        let narrator = if job.with_narration {
            Some(CommandSynthesizer::from_config(&job.options.tts)?)
        } else {
            None
        };
        let output = job.output_path.clone();
        let (report, _sink) = render_with(
            job,
            narrator.as_ref().map(|n| n as &dyn NarrationSynthesizer),
            |settings, audio| FfmpegSink::spawn(&output, settings, audio),
            progress.as_ref(),
        )?;
        Ok(report)
    }

    fn is_available(&self) -> bool {
        command_exists("ffmpeg")
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Where narration audio for `output` is written, minus the extension.
pub fn narration_base(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "render".to_string());
    output.with_file_name(format!("{stem}_narration"))
}

/// Run the whole pipeline into a sink built by `make_sink`.
///
/// The sink is created after preparation so it can see the final audio
/// cues. It is returned for inspection once closed.
pub fn render_with<S, F>(
    job: &ExportJob,
    narrator: Option<&dyn NarrationSynthesizer>,
    make_sink: F,
    progress: Option<&ProgressCallback>,
) -> ReelResult<(RenderReport, S)>
where
    S: FrameSink,
    F: FnOnce(&EncodeSettings, &[AudioCue]) -> ReelResult<S>,
{
    let started = std::time::Instant::now();
    let project = &job.project;
    let total_clips = project.clip_count();
    let total_frames = project.frame_count();
    let report = |progress_value: f64, clips: usize, frames: u64, stage: ExportStage| {
        if let Some(cb) = progress {
            cb(ExportProgress {
                progress: progress_value,
                clips_processed: clips,
                total_clips,
                frames_rendered: frames,
                total_frames,
                stage,
            });
        }
    };

    tracing::info!(
        project = %project.id,
        output = %job.output_path.display(),
        clips = total_clips,
        frames = total_frames,
        narration = job.with_narration,
        "Starting render"
    );
    report(0.0, 0, 0, ExportStage::Preparing);

    let fonts = FontBook::resolve(&job.options.fonts)?;
    let mut timeline =
        PreparedTimeline::prepare(project, &fonts, job.options.drift_slope, |done, total| {
            let fraction = if total == 0 {
                0.0
            } else {
                done as f64 / total as f64
            };
            report(fraction.min(0.9), done, 0, ExportStage::Preparing);
        })?;

    if job.with_narration {
        report(0.9, total_clips, 0, ExportStage::Narrating);
        if let Some(cue) = synthesize_narration(job, narrator) {
            timeline.push_audio(cue);
        }
    }

    if let Some(parent) = job.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let settings = EncodeSettings {
        width: project.width,
        height: project.height,
        fps: project.fps,
        duration: project.duration,
        preset: job.options.preset.clone(),
        audio_bitrate_kbps: job.options.audio_bitrate_kbps,
    };
    let mut sink = make_sink(&settings, timeline.audio())?;

    report(0.95, total_clips, 0, ExportStage::Encoding);
    let report_every = u64::from(project.fps.max(1));
    let frames = timeline.run(&mut sink, |rendered, total| {
        if rendered % report_every == 0 || rendered == total {
            report(0.95, total_clips, rendered, ExportStage::Encoding);
        }
    })?;

    report(1.0, total_clips, frames, ExportStage::Complete);
    tracing::info!(
        frames,
        skipped = timeline.skipped().len(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Render finished"
    );

    Ok((
        RenderReport {
            output: job.output_path.clone(),
            frames,
            skipped: timeline.skipped().to_vec(),
        },
        sink,
    ))
}

fn synthesize_narration(
    job: &ExportJob,
    narrator: Option<&dyn NarrationSynthesizer>,
) -> Option<AudioCue> {
    let Some(text) = job.project.script.narration_text() else {
        tracing::warn!("Narration requested but the script is empty");
        return None;
    };
    let Some(narrator) = narrator else {
        tracing::warn!("Narration requested but no synthesizer is configured");
        return None;
    };
    match narrator.synthesize(&text, &narration_base(&job.output_path)) {
        Some(src) => match probe_audio_stream(&src) {
            Ok(()) => Some(AudioCue {
                src,
                start: 0.0,
                duration: job.project.duration,
            }),
            Err(e) => {
                tracing::warn!(backend = narrator.name(), error = %e, "Narration audio unusable, continuing without it");
                None
            }
        },
        None => {
            tracing::warn!(backend = narrator.name(), "Narration could not be synthesized, continuing without it");
            None
        }
    }
}

/// Export the project to a video file.
///
/// This is the main entry point for rendering. The synchronous renderer
/// runs on the blocking pool.
pub async fn export_project(
    job: ExportJob,
    progress: Option<ProgressCallback>,
) -> ReelResult<RenderReport> {
    let mut backend = FfmpegBackend::new();
    if !backend.is_available() {
        return Err(ReelError::unsupported(
            "No supported render backend found (expected ffmpeg in PATH)",
        ));
    }
    tracing::info!(backend = backend.name(), "Using render backend");

    tokio::task::spawn_blocking(move || backend.render(&job, progress))
        .await
        .map_err(|e| ReelError::render(format!("Render task failed: {e}")))?
}
