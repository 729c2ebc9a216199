//! Hardware adapter seam.
//!
//! The front end runs against either a real device adapter or, when none is
//! connected, the radiometric simulation built into the channel model. This
//! module defines the capability trait an adapter must implement and a mock
//! adapter used by the tests.

pub mod adapter;
pub mod mock;

pub use adapter::{AnalogInput, DigitalLine, DiscreteInput, HardwareAdapter};
pub use mock::MockAdapter;
