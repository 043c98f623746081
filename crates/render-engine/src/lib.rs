//! ReelForge Render Engine
//!
//! Offline timeline compositor that turns a project document into a
//! finished vertical video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! image clips ──┐
//!               ├── cover-fit + per-frame zoom/rotate
//! video clips ──┤     (ffmpeg decoder per clip)
//!               │
//! text clips ───┤── rasterised once
//!               ▼
//!        composite per frame (track order, fades)
//!               │
//! template + ───┤── static overlay, blended last
//! script        │
//!               ▼
//!        raw RGBA ──► ffmpeg (H.264 + mixed AAC) ──► output.mp4
//!                        ▲
//! audio clips ───────────┤
//! narration (TTS) ───────┘
//! ```

pub mod compositor;
pub mod encode;
pub mod export;
pub mod geometry;
pub mod jobs;
pub mod layers;
pub mod narration;
pub mod overlay;
pub mod paint;
pub mod text;
pub mod video;

pub use compositor::{PreparedTimeline, SkippedClip};
pub use encode::{EncodeSettings, FfmpegSink, FrameSink, MemorySink};
pub use export::*;
pub use layers::AudioCue;
pub use jobs::{render_task, InMemoryJobStore, JobContext, JobId, JobState, JobStatus, JobStore};
pub use narration::{CommandSynthesizer, NarrationSynthesizer, TtsBackend};
pub use overlay::render_overlay;
pub use text::FontBook;
