//! Shared utilities for the Cairn yield engine.

pub mod logging;
pub mod math;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use math::{apply_bps, linear_ramp, mul_div, MathOverflow};
pub use time::format_duration;
