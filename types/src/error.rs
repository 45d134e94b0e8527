//! Errors raised when constructing shared types from raw input.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid elevation index {0}")]
    InvalidElevation(u8),

    #[error("invalid totem {0}")]
    InvalidTotem(u8),
}
