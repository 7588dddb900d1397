//! Export formats for the host's reporting layer.

mod summary;

pub use summary::*;
