//! Custom error types for the front-end crate.
//!
//! This module defines the primary error type, `FrontEndError`, for the whole
//! crate. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different failure classes the monitor and
//! control surface can produce.
//!
//! ## Error Hierarchy
//!
//! - **`InvalidFeedId` / `InvalidPolarization` / `InvalidFeedTarget`**:
//!   validation errors on malformed caller input. These are raised
//!   immediately and never retried; they indicate caller misuse, not a
//!   transient failure.
//! - **`UnrecognizedOption`**: an integer option code outside the legacy
//!   menu table. Surfaced to the caller as a structured error, never just a
//!   log line.
//! - **`HardwareUnavailable`**: an operation that requires a real device was
//!   invoked on a receiver constructed in simulation mode. The backing mode
//!   is fixed at construction and is never changed implicitly mid-session.
//! - **`CalibrationInput`**: malformed argument to the attenuator or
//!   control-voltage routines (non-finite values, targets outside the fitted
//!   range, empty coefficient tables).
//! - **`Adapter`**: a connected hardware adapter reported a fault.
//! - **`Config`**: wraps errors from the `config` crate when loading a
//!   calibration file.
//!
//! No error is swallowed into a default numeric value inside the core logic.

use thiserror::Error;

/// Convenience alias for results using the front-end error type.
pub type FeResult<T> = std::result::Result<T, FrontEndError>;

/// Primary error type for the front-end monitor and control surface.
#[derive(Error, Debug)]
pub enum FrontEndError {
    #[error("invalid feed id {0}: this receiver has feeds 1 and 2")]
    InvalidFeedId(i64),

    #[error("invalid polarization {0:?}: expected \"E\" or \"H\"")]
    InvalidPolarization(String),

    #[error("invalid feed target {0:?}: expected \"sky\" or \"load\"")]
    InvalidFeedTarget(String),

    #[error("option {0} not recognized")]
    UnrecognizedOption(i64),

    #[error("hardware adapter not connected")]
    HardwareUnavailable,

    #[error("calibration input error: {0}")]
    CalibrationInput(String),

    #[error("hardware adapter error: {0}")]
    Adapter(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_option_names_the_code() {
        let err = FrontEndError::UnrecognizedOption(999);
        assert_eq!(err.to_string(), "option 999 not recognized");
    }

    #[test]
    fn invalid_feed_id_names_the_valid_range() {
        let err = FrontEndError::InvalidFeedId(3);
        assert!(err.to_string().contains("feeds 1 and 2"));
    }
}
