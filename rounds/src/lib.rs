//! Round scheduling for every elevation.
//!
//! Each elevation moves through `Locked → RoundEnded → Active → RoundEnded → ...`:
//! it is locked until its unlock timestamp, the first rollover at or after
//! unlock starts round 1, and every later rollover closes the ended round
//! (recording its winning totem and seed) and starts the next one.

pub mod error;
pub mod round;
pub mod scheduler;

pub use error::ScheduleError;
pub use round::{ElevationStatus, Round};
pub use scheduler::{ElevationSchedule, RoundScheduler, RoundView};
