//! Hold expiry calculation and booking-hold lifecycle for stylehold
//!
//! This crate is the heart of stylehold, containing:
//! - Booking slot parsing (`YYYY-MM-DD` + `HH:mm` to an appointment instant)
//! - The expiry calculator: a hold lapses at the earlier of
//!   "appointment minus buffer" and "now plus window"
//! - The hold manager (Pending -> Confirmed | Released | Expired)

mod expiry;
mod manager;
mod slot;

pub use expiry::*;
pub use manager::*;
pub use slot::*;
