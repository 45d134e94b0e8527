//! Rounds and elevation status.

use cairn_types::{Elevation, Hash32, Timestamp, Totem};
use serde::{Deserialize, Serialize};

/// Where an elevation is in its round cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElevationStatus {
    /// Before the unlock timestamp; no rounds yet.
    Locked,
    /// A round is running.
    Active,
    /// Past the current round's end (or unlocked but never started), awaiting rollover.
    RoundEnded,
}

/// One round of one elevation.
///
/// Created by a rollover, closed by the next one. Once `winning_totem` is set
/// the round never changes again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub elevation: Elevation,
    pub number: u64,
    pub start: Timestamp,
    pub end: Timestamp,
    pub winning_totem: Option<Totem>,
    pub seed: Option<Hash32>,
    pub closed: bool,
}

impl Round {
    /// Placeholder before the first rollover. It "ends" at unlock.
    pub fn genesis(elevation: Elevation, unlock_at: Timestamp) -> Self {
        Self {
            elevation,
            number: 0,
            start: unlock_at,
            end: unlock_at,
            winning_totem: None,
            seed: None,
            closed: false,
        }
    }

    pub fn has_ended(&self, now: Timestamp) -> bool {
        now >= self.end
    }

    pub fn duration(&self) -> u64 {
        self.end.as_secs().saturating_sub(self.start.as_secs())
    }
}
