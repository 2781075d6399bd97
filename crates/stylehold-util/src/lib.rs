//! Shared utilities for stylehold
//!
//! This crate provides:
//! - ID types (HoldId, StylistId, ClientId)
//! - Time utilities (millisecond timestamps, injectable clocks, wall-clock parsing)
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
