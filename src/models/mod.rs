//! Core data models for the analytics engine.

mod combat;
mod hero;
mod ids;
mod snapshot;
mod stat;
mod stats;

pub use combat::*;
pub use hero::*;
pub use ids::*;
pub use snapshot::*;
pub use stat::*;
pub use stats::*;
