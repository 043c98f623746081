//! Project, track, and clip documents.
//!
//! A project is the top-level container that ties together the canvas,
//! the track/clip timeline, the overlay template, the narration script,
//! and the asset table. It is persisted as a single `project.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::keyframe::{KeyframeError, KeyframeTrack, ScaleKeyframe};
use crate::script::Script;
use crate::template::Template;

/// Current schema version written into new projects.
pub const SCHEMA_VERSION: &str = "1.0";

/// File extensions treated as video when they appear on an image track.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm"];

/// Top-level project file (`project.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Opaque project identifier.
    pub id: String,

    /// Human-readable project name.
    pub name: String,

    /// Canvas width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Canvas height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Output frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Total duration in seconds. The composite is truncated to this.
    #[serde(default = "default_duration")]
    pub duration: f64,

    /// Static overlay configuration.
    #[serde(default)]
    pub template: Template,

    /// Independent tracks, drawn in order (later tracks on top).
    #[serde(default)]
    pub tracks: Vec<Track>,

    /// Caption and narration source content.
    #[serde(default)]
    pub script: Script,

    /// Asset id to local path.
    #[serde(default)]
    pub assets: BTreeMap<String, PathBuf>,

    /// Creation timestamp (RFC 3339).
    #[serde(default)]
    pub created_at: String,

    /// Last save timestamp (RFC 3339).
    #[serde(default)]
    pub updated_at: String,
}

/// Kind of media a track or clip carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Text,
}

/// An ordered lane of same-kind clips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,

    /// Fixed at creation. Clips are assumed, not checked, to match.
    pub kind: MediaKind,

    #[serde(default)]
    pub clips: Vec<Clip>,
}

/// Position/scale/opacity/rotation applied to a clip.
///
/// Values are passed through unvalidated; out-of-range opacity or
/// negative scale is the caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Horizontal anchor, relative to canvas width.
    pub x: f64,
    /// Vertical anchor, relative to canvas height.
    pub y: f64,
    pub scale: f64,
    pub opacity: f64,
    /// Rotation in degrees, clockwise.
    pub rotation: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            opacity: 1.0,
            rotation: 0.0,
        }
    }
}

/// Horizontal text anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// One timed, positioned piece of media or text within a track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: MediaKind,

    /// Local path of the source media.
    #[serde(default)]
    pub src: Option<String>,

    /// Start on the project timeline (seconds).
    #[serde(default)]
    pub start: f64,

    /// Length on the project timeline (seconds).
    #[serde(default = "default_clip_duration")]
    pub duration: f64,

    #[serde(default)]
    pub transform: Transform,

    /// Linear opacity ramp at clip start (seconds, 0 = none).
    #[serde(default)]
    pub fade_in: f64,

    /// Linear opacity ramp at clip end (seconds, 0 = none).
    #[serde(default)]
    pub fade_out: f64,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default = "default_text_size")]
    pub text_size: u32,

    #[serde(default = "default_text_color")]
    pub text_color: String,

    #[serde(default)]
    pub text_align: TextAlign,

    /// Stroke width around glyphs in pixels (0 = no outline).
    #[serde(default)]
    pub outline_width: u32,

    #[serde(default = "default_outline_color")]
    pub outline_color: String,

    /// Background box colour behind the text, if any.
    #[serde(default)]
    pub bg_color: Option<String>,

    /// Padding between text and background box edge.
    #[serde(default = "default_bg_pad")]
    pub bg_pad: u32,

    /// Crop box `[x0, y0, x1, y1]`, relative to the source image.
    #[serde(default)]
    pub crop: Option<[f64; 4]>,

    /// Scale samples over clip-local time.
    #[serde(default)]
    pub keyframes: Vec<ScaleKeyframe>,

    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl Clip {
    /// Create a clip with default styling.
    pub fn new(id: impl Into<String>, kind: MediaKind, start: f64, duration: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            src: None,
            start,
            duration,
            transform: Transform::default(),
            fade_in: 0.0,
            fade_out: 0.0,
            text: None,
            text_size: default_text_size(),
            text_color: default_text_color(),
            text_align: TextAlign::default(),
            outline_width: 0,
            outline_color: default_outline_color(),
            bg_color: None,
            bg_pad: default_bg_pad(),
            crop: None,
            keyframes: vec![],
            meta: serde_json::Map::new(),
        }
    }

    /// Builder-style source assignment.
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    /// Builder-style text assignment.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// End time on the project timeline.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether the clip is visible/audible at project time `t`.
    pub fn is_active_at(&self, t: f64) -> bool {
        t >= self.start && t < self.end()
    }

    /// Time since clip start.
    pub fn local_time(&self, t: f64) -> f64 {
        t - self.start
    }

    /// Opacity multiplier from fade-in / fade-out ramps at clip-local time.
    pub fn fade_factor(&self, local_t: f64) -> f64 {
        let ramp_in = if self.fade_in > 0.0 {
            (local_t / self.fade_in).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let ramp_out = if self.fade_out > 0.0 {
            ((self.duration - local_t) / self.fade_out).clamp(0.0, 1.0)
        } else {
            1.0
        };
        ramp_in.min(ramp_out)
    }

    /// Sorted keyframe track, or `None` when no keyframes were supplied.
    pub fn keyframe_track(&self) -> Result<Option<KeyframeTrack>, KeyframeError> {
        if self.keyframes.is_empty() {
            return Ok(None);
        }
        KeyframeTrack::new(self.keyframes.clone()).map(Some)
    }

    /// Whether the source path has a video file extension.
    pub fn has_video_source(&self) -> bool {
        self.src
            .as_deref()
            .and_then(|src| Path::new(src).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                VIDEO_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }
}

impl Track {
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            kind,
            clips: vec![],
        }
    }
}

impl Project {
    /// Create a new project with the three default tracks (image, text, audio).
    pub fn new(name: impl Into<String>, width: u32, height: u32, fps: u32, duration: f64) -> Self {
        let now = timestamp_now();
        Self {
            version: SCHEMA_VERSION.to_string(),
            id: new_id(),
            name: name.into(),
            width,
            height,
            fps,
            duration,
            template: Template::default(),
            tracks: vec![
                Track::new("v1", MediaKind::Image),
                Track::new("t1", MediaKind::Text),
                Track::new("a1", MediaKind::Audio),
            ],
            script: Script::default(),
            assets: BTreeMap::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Total number of clips across all tracks.
    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }

    /// First track of the given kind.
    pub fn track_mut(&mut self, kind: MediaKind) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.kind == kind)
    }

    /// Number of frames in the rendered output.
    pub fn frame_count(&self) -> u64 {
        ((self.duration.max(0.0) * self.fps as f64).round() as u64).max(1)
    }

    /// Check the canvas and timing fields are usable for rendering.
    pub fn validate(&self) -> Result<(), ProjectError> {
        if self.width == 0 || self.height == 0 {
            return Err(ProjectError::ValidationError {
                message: format!("canvas must be non-empty, got {}x{}", self.width, self.height),
            });
        }
        if self.fps == 0 {
            return Err(ProjectError::ValidationError {
                message: "fps must be positive".to_string(),
            });
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ProjectError::ValidationError {
                message: format!("duration must be positive, got {}", self.duration),
            });
        }
        Ok(())
    }

    /// List referenced clip sources and assets that are missing on disk.
    pub fn missing_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        for track in &self.tracks {
            for clip in &track.clips {
                if let Some(src) = &clip.src {
                    if !Path::new(src).exists() {
                        errors.push(format!(
                            "Track {} clip {} source missing: {src}",
                            track.id, clip.id
                        ));
                    }
                }
            }
        }

        for (asset_id, path) in &self.assets {
            if !path.exists() {
                errors.push(format!("Asset {asset_id} missing: {}", path.display()));
            }
        }

        errors
    }
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Project not found: {id}")]
    NotFound { id: String },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}

/// Short opaque id (12 hex characters of a v4 UUID).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Current UTC time as a fixed-width RFC 3339 string.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_width() -> u32 {
    1080
}

fn default_height() -> u32 {
    1920
}

fn default_fps() -> u32 {
    30
}

fn default_duration() -> f64 {
    10.0
}

fn default_clip_duration() -> f64 {
    1.0
}

fn default_text_size() -> u32 {
    48
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}

fn default_outline_color() -> String {
    "#000000".to_string()
}

fn default_bg_pad() -> u32 {
    12
}
