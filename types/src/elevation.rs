//! Elevation tiers and totems.

use crate::error::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A staking tier with its own round cadence and (for lottery tiers) its own draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Elevation {
    Oasis,
    Plains,
    Mesa,
    Summit,
}

/// How an elevation finishes a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElevationKind {
    /// Every staker earns the full emission; no totems, no draw.
    Fixed,
    /// Stakers pick one of two totems and the round ends in a weighted draw.
    Lottery,
}

impl Elevation {
    pub const COUNT: usize = 4;

    pub const ALL: [Elevation; Self::COUNT] = [
        Elevation::Oasis,
        Elevation::Plains,
        Elevation::Mesa,
        Elevation::Summit,
    ];

    /// Arena index used by every per-elevation table.
    pub fn index(self) -> usize {
        match self {
            Self::Oasis => 0,
            Self::Plains => 1,
            Self::Mesa => 2,
            Self::Summit => 3,
        }
    }

    pub fn from_index(index: u8) -> Result<Self, TypeError> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or(TypeError::InvalidElevation(index))
    }

    pub fn kind(self) -> ElevationKind {
        match self {
            Self::Oasis => ElevationKind::Fixed,
            Self::Plains | Self::Mesa | Self::Summit => ElevationKind::Lottery,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oasis => "oasis",
            Self::Plains => "plains",
            Self::Mesa => "mesa",
            Self::Summit => "summit",
        }
    }
}

impl fmt::Display for Elevation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two lottery sides within a lottery elevation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Totem(u8);

impl Totem {
    /// Number of totems in a lottery elevation.
    pub const COUNT: usize = 2;

    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);

    pub fn new(raw: u8) -> Result<Self, TypeError> {
        if (raw as usize) < Self::COUNT {
            Ok(Self(raw))
        } else {
            Err(TypeError::InvalidTotem(raw))
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn as_u8(self) -> u8 {
        self.0
    }

    /// The opposing totem.
    pub fn other(self) -> Self {
        Self(1 - self.0)
    }
}

impl fmt::Display for Totem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "totem{}", self.0)
    }
}
