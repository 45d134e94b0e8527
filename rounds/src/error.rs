use cairn_types::{Elevation, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// Before unlock, or before the current round has ended.
    #[error("{elevation} is locked until {until}")]
    ElevationLocked {
        elevation: Elevation,
        until: Timestamp,
    },

    #[error("round duration multiplier must be non-zero")]
    RoundDurationNonZero,
}
