//! ReelForge Script Tools
//!
//! Text-side helpers around a product [`Script`](reelforge_project_model::Script):
//! - **Script text:** narration copy from title/price/features/CTA, plus placeholder templates
//! - **Features:** cleanup of scraped feature strings
//! - **Price:** foreign price strings to an approximate KRW figure
//! - **Captions:** SRT output/parsing and evenly timed caption segments

pub mod captions;
pub mod price;
pub mod text;

pub use captions::*;
pub use price::*;
pub use text::*;
