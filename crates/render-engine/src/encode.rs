//! Frame sinks: the ffmpeg H.264/AAC encoder and an in-memory collector.

use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbaImage;

use reelforge_common::error::{ReelError, ReelResult};

use crate::layers::AudioCue;

/// Output stream parameters shared by every sink.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration: f64,
    /// x264 preset.
    pub preset: String,
    pub audio_bitrate_kbps: u32,
}

/// Destination for composited frames.
pub trait FrameSink {
    /// Accept the next frame in presentation order.
    fn write_frame(&mut self, frame: &RgbaImage) -> ReelResult<()>;

    /// Flush and close. No frames may be written afterwards.
    fn finish(&mut self) -> ReelResult<()>;
}

/// Pipes raw RGBA frames into an ffmpeg child that muxes video and mixed audio.
pub struct FfmpegSink {
    output: PathBuf,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_task: Option<JoinHandle<String>>,
}

impl FfmpegSink {
    /// Start the encoder. Frames are expected at `settings` size and rate.
    pub fn spawn(output: &Path, settings: &EncodeSettings, audio: &[AudioCue]) -> ReelResult<Self> {
        let args = encoder_args(output, settings, audio);
        tracing::debug!(?args, "Starting ffmpeg encoder");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReelError::encode(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            output = %output.display(),
            audio_inputs = audio.len(),
            "ffmpeg encoder started"
        );

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::encode("Failed to capture ffmpeg stdin"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encode("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once its stderr pipe fills, so drain it on the side.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        Ok(Self {
            output: output.to_path_buf(),
            child: Some(child),
            stdin: Some(stdin),
            stderr_task: Some(stderr_task),
        })
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr_task
            .take()
            .map(|task| {
                task.join()
                    .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
            })
            .unwrap_or_default()
    }

    /// Wait for the child after stdin is closed and turn a failure into an error.
    fn reap(&mut self) -> ReelResult<()> {
        self.stdin = None;
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| ReelError::encode(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr = self.collect_stderr();
        if !status.success() {
            return Err(ReelError::encode(format!(
                "ffmpeg failed (status {status}): {}",
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &RgbaImage) -> ReelResult<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::encode("Encoder already finished"));
        };
        if let Err(e) = stdin.write_all(frame.as_raw()) {
            // A closed pipe means ffmpeg exited; its stderr says why.
            let reaped = self.reap();
            return Err(match reaped {
                Err(err) => err,
                Ok(()) => ReelError::encode(format!("Failed writing frame to ffmpeg: {e}")),
            });
        }
        Ok(())
    }

    fn finish(&mut self) -> ReelResult<()> {
        if let Some(stdin) = self.stdin.as_mut() {
            stdin
                .flush()
                .map_err(|e| ReelError::encode(format!("Failed flushing ffmpeg stdin: {e}")))?;
        }
        self.reap()?;
        tracing::info!(output = %self.output.display(), "Encoding finished");
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Collects frames in memory. Used by previews and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    keep_frames: bool,
    pub frames_written: u64,
    pub frames: Vec<RgbaImage>,
    pub finished: bool,
}

impl MemorySink {
    /// Count frames without storing them.
    pub fn counting() -> Self {
        Self::default()
    }

    /// Store every frame.
    pub fn keeping() -> Self {
        Self {
            keep_frames: true,
            ..Self::default()
        }
    }
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &RgbaImage) -> ReelResult<()> {
        if self.finished {
            return Err(ReelError::encode("Sink already finished"));
        }
        self.frames_written += 1;
        if self.keep_frames {
            self.frames.push(frame.clone());
        }
        Ok(())
    }

    fn finish(&mut self) -> ReelResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Full ffmpeg argument list for encoding raw RGBA from stdin.
pub fn encoder_args(output: &Path, settings: &EncodeSettings, audio: &[AudioCue]) -> Vec<String> {
    let mut args: Vec<String> = [
        "-y",
        "-v",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(format!("{}x{}", settings.width, settings.height));
    args.extend(["-r".to_string(), settings.fps.to_string()]);
    args.extend(["-i".to_string(), "-".to_string()]);

    for cue in audio {
        args.extend(["-i".to_string(), cue.src.display().to_string()]);
    }

    match audio_filter_graph(audio, 1) {
        Some(graph) => {
            args.extend([
                "-filter_complex".to_string(),
                graph,
                "-map".to_string(),
                "0:v".to_string(),
                "-map".to_string(),
                "[aout]".to_string(),
            ]);
        }
        None => args.push("-an".to_string()),
    }

    args.extend(codec_args(settings, !audio.is_empty()));
    args.extend(["-t".to_string(), format!("{:.3}", settings.duration)]);
    args.push(output.display().to_string());
    args
}

/// Trim, delay, and sum audio inputs into `[aout]`.
///
/// Inputs are numbered from `first_input`. Mixing is a plain sum with no
/// loudness normalisation.
pub fn audio_filter_graph(audio: &[AudioCue], first_input: usize) -> Option<String> {
    if audio.is_empty() {
        return None;
    }
    let mut chains: Vec<String> = audio
        .iter()
        .enumerate()
        .map(|(i, cue)| {
            let delay_ms = (cue.start.max(0.0) * 1000.0).round() as u64;
            format!(
                "[{input}:a]atrim=0:{dur:.3},asetpts=PTS-STARTPTS,adelay=delays={delay_ms}:all=1[a{i}]",
                input = first_input + i,
                dur = cue.duration.max(0.0),
            )
        })
        .collect();
    let labels: String = (0..audio.len()).map(|i| format!("[a{i}]")).collect();
    chains.push(format!(
        "{labels}amix=inputs={}:normalize=0[aout]",
        audio.len()
    ));
    Some(chains.join(";"))
}

fn codec_args(settings: &EncodeSettings, with_audio: bool) -> Vec<String> {
    let mut args = vec![
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        settings.preset.clone(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
    ];
    if with_audio {
        args.extend([
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            format!("{}k", settings.audio_bitrate_kbps.max(64)),
        ]);
    }
    args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    args
}
