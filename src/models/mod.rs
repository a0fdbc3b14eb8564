//! Core data models for the ladder tracker.

mod color;
mod history;
mod ids;
mod metrics;
mod record;

pub use color::*;
pub use history::*;
pub use ids::*;
pub use metrics::*;
pub use record::*;
