//! ReelForge Project Model
//!
//! Defines the core data contracts for ReelForge projects:
//! - **Project:** Canvas, frame rate, duration, tracks, assets
//! - **Clips:** Timed media/text with transform, fades, crop, keyframes
//! - **Template / Script:** Static overlay configuration and narration content
//! - **Store:** One JSON document per project id on disk
//! - **Slideshow:** Images and caption lines laid out to fill the timeline
//!
//! Positions inside a clip transform are normalized to `[0.0, 1.0]`
//! relative to the canvas; template geometry is in output pixels.

pub mod keyframe;
pub mod project;
pub mod script;
pub mod slideshow;
pub mod store;
pub mod template;

pub use keyframe::*;
pub use project::*;
pub use script::*;
pub use slideshow::*;
pub use store::*;
pub use template::*;
