//! Utility modules
//!
//! This module contains error handling, logging, time, and interval utilities

pub mod clock;
pub mod errors;
pub mod intervals;
pub mod logging;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{CadenzaError, Result};
pub use intervals::Interval;
