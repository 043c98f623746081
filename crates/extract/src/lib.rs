//! ReelForge Product Extraction
//!
//! Turns a product page's HTML into a [`ProductInfo`] (title, price,
//! features, images) and from there into a narration
//! [`Script`](reelforge_project_model::Script).
//!
//! Each field is filled by an ordered list of independent strategies; the
//! first one that yields something non-empty wins. Fetching pages is the
//! caller's job.

pub mod extractor;
pub mod page;
pub mod product;
pub mod site;

pub use extractor::*;
pub use product::*;
pub use site::*;
