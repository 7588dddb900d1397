//! Domain models for lab ingestion and clinical insights.

mod import;
mod insight;
mod lab;
mod measurement;
mod thresholds;

pub use import::*;
pub use insight::*;
pub use lab::*;
pub use measurement::*;
pub use thresholds::*;
