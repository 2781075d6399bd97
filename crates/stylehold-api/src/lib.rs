//! Shared types for stylehold
//!
//! This crate defines the stable shapes exchanged between the hold manager,
//! the store and the CLI:
//! - Hold records and statuses
//! - Hold requests as submitted by clients
//! - Events (hold lifecycle transitions)
//! - Versioning

mod events;
mod types;

pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
