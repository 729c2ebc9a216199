//! Hardware adapter capability trait.
//!
//! The receiver's switchable states (waveguide loads, amplifier bias, noise
//! diode) are driven by pulsed digital lines, and its health monitors are
//! analog and discrete sense inputs. An adapter exposes exactly those three
//! capabilities; everything above this seam is device-agnostic.
//!
//! The choice between a real adapter and pure simulation is made once, when
//! the [`crate::frontend::FrontEnd`] is constructed.
//!
//! # Contract
//!
//! - All methods are async and take `&self`; adapters use interior
//!   mutability for any connection state.
//! - `pulse_digital_line` toggles the addressed relay (high-low-high); the
//!   caller is responsible for only pulsing on an actual state transition.
//! - Reads are expected to be fast; any device timeout surfaces as
//!   [`crate::error::FrontEndError::Adapter`].

use async_trait::async_trait;

use crate::error::FeResult;
use crate::frontend::FeedId;

/// Pulsed digital control lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalLine {
    /// Toggle the waveguide load behind one feed.
    FeedLoad(FeedId),
    /// Toggle the cryogenic amplifier bias for one feed pair.
    AmpBias(FeedId),
    /// Toggle the noise-diode drive.
    NoiseDiode,
}

/// Analog sense inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalogInput {
    /// −12 V rail.
    SupplyMinus12V,
    /// +12 V rail.
    SupplyPlus12V,
    /// +5 V rail.
    SupplyPlus5V,
    /// +8 V rail.
    SupplyPlus8V,
    /// Lambda bias supply.
    LambdaSupply,
}

/// Discrete sense inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscreteInput {
    /// Amplifier bias readback for one feed.
    AmpBiasOn(FeedId),
    /// Limit switch: the feed's load is fully inserted.
    FeedInLoad(FeedId),
    /// Limit switch: the feed is open to the sky.
    FeedOnSky(FeedId),
}

/// Capability trait for real front-end hardware.
#[async_trait]
pub trait HardwareAdapter: Send + Sync {
    /// Pulse a digital control line high-low-high.
    async fn pulse_digital_line(&self, line: DigitalLine) -> FeResult<()>;

    /// Read an analog sense input, in volts.
    async fn read_analog_input(&self, input: AnalogInput) -> FeResult<f64>;

    /// Read a discrete sense input.
    async fn read_discrete_input(&self, input: DiscreteInput) -> FeResult<bool>;
}
