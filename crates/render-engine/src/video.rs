//! ffmpeg/ffprobe process helpers and the video clip frame decoder.

use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use image::RgbaImage;

use reelforge_common::error::{ReelError, ReelResult};

use crate::geometry::Size;

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Width and height of the first video stream, via ffprobe.
pub fn probe_video_dimensions(path: &Path) -> Option<Size> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=p=0:s=x",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let raw = String::from_utf8(output.stdout).ok()?;
    parse_dimensions(raw.lines().next()?)
}

/// Check that `path` carries a decodable audio stream, via ffprobe.
///
/// When ffprobe itself cannot be started the source is accepted unverified.
pub fn probe_audio_stream(path: &Path) -> ReelResult<()> {
    let output = match Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "a:0",
            "-show_entries",
            "stream=codec_type",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(src = %path.display(), error = %e, "ffprobe unavailable, audio not verified");
            return Ok(());
        }
    };

    let has_audio = output.status.success()
        && String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|line| line.trim().starts_with("audio"));
    if has_audio {
        Ok(())
    } else {
        Err(ReelError::asset(format!(
            "no decodable audio stream in {}",
            path.display()
        )))
    }
}

/// Write a short silent 8 kHz mono PCM WAV file.
#[cfg(test)]
pub(crate) fn write_silent_wav(path: &Path) {
    let data_len: u32 = 1600;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&8000u32.to_le_bytes());
    bytes.extend_from_slice(&16000u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);
    std::fs::write(path, bytes).unwrap();
}

fn parse_dimensions(line: &str) -> Option<Size> {
    let (w, h) = line.trim().split_once('x')?;
    let width = w.parse::<u32>().ok()?;
    let height = h.parse::<u32>().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(Size::new(width, height))
}

/// Sequential RGBA frame reader over an ffmpeg decoder child.
///
/// The decoder resamples to the project frame rate and scales to `size`,
/// emitting at most `duration` seconds. Frames are requested by clip-local
/// index in increasing order; once the source runs out the last decoded
/// frame is returned for every later index.
pub struct VideoFrameReader {
    src: PathBuf,
    size: Size,
    fps: u32,
    duration: f64,
    child: Option<Child>,
    stdout: Option<BufReader<ChildStdout>>,
    next_index: u64,
    current: Option<RgbaImage>,
    exhausted: bool,
}

impl VideoFrameReader {
    pub fn new(src: impl Into<PathBuf>, size: Size, fps: u32, duration: f64) -> Self {
        Self {
            src: src.into(),
            size,
            fps,
            duration,
            child: None,
            stdout: None,
            next_index: 0,
            current: None,
            exhausted: false,
        }
    }

    fn decoder_args(&self) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            self.src.display().to_string(),
            "-t".to_string(),
            format!("{:.3}", self.duration),
            "-an".to_string(),
            "-vf".to_string(),
            format!(
                "fps={},scale={}:{},format=rgba",
                self.fps, self.size.width, self.size.height
            ),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgba".to_string(),
            "-".to_string(),
        ]
    }

    fn spawn(&mut self) -> ReelResult<()> {
        let args = self.decoder_args();
        tracing::debug!(src = %self.src.display(), ?args, "Starting video decoder");
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ReelError::asset(format!("Failed to start ffmpeg decoder: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::asset("Failed to capture decoder stdout"))?;
        self.stdout = Some(BufReader::new(stdout));
        self.child = Some(child);
        Ok(())
    }

    fn read_next(&mut self) -> ReelResult<Option<RgbaImage>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        let len = self.size.width as usize * self.size.height as usize * 4;
        let mut buf = vec![0u8; len];
        match stdout.read_exact(&mut buf) {
            Ok(()) => Ok(RgbaImage::from_raw(self.size.width, self.size.height, buf)),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(ReelError::asset(format!(
                "Failed reading frames from {}: {e}",
                self.src.display()
            ))),
        }
    }

    /// Frame at clip-local `index`.
    ///
    /// Returns `Ok(None)` only when the source produced no frames at all.
    pub fn frame_at(&mut self, index: u64) -> ReelResult<Option<&RgbaImage>> {
        if self.child.is_none() && !self.exhausted {
            self.spawn()?;
        }
        while !self.exhausted && (self.current.is_none() || self.next_index <= index) {
            match self.read_next()? {
                Some(frame) => {
                    self.current = Some(frame);
                    self.next_index += 1;
                }
                None => {
                    tracing::debug!(
                        src = %self.src.display(),
                        frames = self.next_index,
                        "Video source exhausted, holding last frame"
                    );
                    self.exhausted = true;
                    self.shutdown();
                }
            }
        }
        Ok(self.current.as_ref())
    }

    fn shutdown(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for VideoFrameReader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for VideoFrameReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrameReader")
            .field("src", &self.src)
            .field("size", &self.size)
            .field("next_index", &self.next_index)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
