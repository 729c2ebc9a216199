//! Legacy numeric option-code protocol.
//!
//! The historical control program drove the receiver through a flat menu of
//! integer option codes. That protocol survives here as a boundary adapter:
//! each code is mapped to a typed [`Command`] and executed against the
//! [`FrontEnd`]'s named operations, so the numeric codes never leak into the
//! entity model. Response shapes vary by code (multi-line text, a boolean,
//! an ordered reading list, a temperature map) and are part of the legacy
//! contract.
//!
//! The mapping is pure request/response with no state machine. Unknown
//! codes fail with a structured error before anything mutates.
//!
//! # Option codes
//!
//! | Code    | Operation                                   |
//! |---------|---------------------------------------------|
//! | 12      | report both feeds' load/sky state           |
//! | 13–16   | feed 1/2 to sky/load                        |
//! | 17      | read all four power meters                  |
//! | 22      | get noise-diode state                       |
//! | 23/24   | noise diode on/off                          |
//! | 25–28   | preamp 1/2 bias on/off                      |
//! | 31      | read front-end physical temperatures        |
//! | 390–393 | power meter to watts, channel in low digit  |
//! | 400–403 | power meter to dBm, channel in low digit    |

use std::fmt::Write as _;

use tracing::debug;

use crate::error::{FeResult, FrontEndError};
use crate::frontend::{
    FeedId, FrontEnd, LoadState, MeterReading, Polarization, PowerMeterMode, Temperatures,
};

/// A structured operation decoded from one legacy option code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Report both feeds' positions as the legacy two-line text.
    ReportFeeds,
    /// Point one feed at the sky or its load.
    SetFeed {
        /// Target feed.
        feed: FeedId,
        /// Requested position.
        target: LoadState,
    },
    /// Query the noise-diode state.
    GetNoiseDiode,
    /// Switch the noise diode.
    SetNoiseDiode(bool),
    /// Switch one feed's amplifier bias.
    SetPreampBias {
        /// Target feed.
        feed: FeedId,
        /// Bias on or off.
        on: bool,
    },
    /// Read all four power meters.
    ReadPowerMeters,
    /// Read the four physical temperatures.
    ReadTemperatures,
    /// Set one channel's power-meter display mode.
    SetMeterMode {
        /// Target feed.
        feed: FeedId,
        /// Target polarization.
        pol: Polarization,
        /// Requested display mode.
        mode: PowerMeterMode,
    },
}

impl Command {
    /// Decode a legacy option code. Anything outside the table is an
    /// [`FrontEndError::UnrecognizedOption`].
    pub fn from_code(code: i64) -> FeResult<Self> {
        let command = match code {
            12 => Command::ReportFeeds,
            13 => Command::SetFeed {
                feed: FeedId::One,
                target: LoadState::Sky,
            },
            14 => Command::SetFeed {
                feed: FeedId::One,
                target: LoadState::Load,
            },
            15 => Command::SetFeed {
                feed: FeedId::Two,
                target: LoadState::Sky,
            },
            16 => Command::SetFeed {
                feed: FeedId::Two,
                target: LoadState::Load,
            },
            17 => Command::ReadPowerMeters,
            22 => Command::GetNoiseDiode,
            23 => Command::SetNoiseDiode(true),
            24 => Command::SetNoiseDiode(false),
            25..=28 => Command::SetPreampBias {
                feed: if code < 27 { FeedId::One } else { FeedId::Two },
                on: code % 2 == 1,
            },
            31 => Command::ReadTemperatures,
            390..=393 => {
                let (feed, pol) = channel_of(code - 390);
                Command::SetMeterMode {
                    feed,
                    pol,
                    mode: PowerMeterMode::Watts,
                }
            }
            400..=403 => {
                let (feed, pol) = channel_of(code - 400);
                Command::SetMeterMode {
                    feed,
                    pol,
                    mode: PowerMeterMode::Dbm,
                }
            }
            other => return Err(FrontEndError::UnrecognizedOption(other)),
        };
        Ok(command)
    }
}

/// Channel encoding in the low digit of the meter-mode codes:
/// 0 → (feed 1, E), 1 → (feed 1, H), 2 → (feed 2, E), 3 → (feed 2, H).
fn channel_of(offset: i64) -> (FeedId, Polarization) {
    let feed = if offset < 2 { FeedId::One } else { FeedId::Two };
    let pol = if offset % 2 == 0 {
        Polarization::E
    } else {
        Polarization::H
    };
    (feed, pol)
}

/// Response to one option code. The shape varies by code; that variability
/// is part of the legacy contract.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Commands that acknowledge without data.
    None,
    /// Pre-formatted legacy text, byte-exact.
    Text(String),
    /// A legacy boolean (reported as 1/0).
    Flag(bool),
    /// The four meter readings in fixed channel order.
    Readings(Vec<MeterReading>),
    /// The four named physical temperatures.
    Temperatures(Temperatures),
}

/// Maps option codes onto the front end's named operations.
#[derive(Debug)]
pub struct Dispatcher {
    frontend: FrontEnd,
}

impl Dispatcher {
    /// Wrap a front end for option-code access.
    pub fn new(frontend: FrontEnd) -> Self {
        Self { frontend }
    }

    /// The wrapped front end, for direct named-operation access.
    pub fn frontend(&self) -> &FrontEnd {
        &self.frontend
    }

    /// Execute one option code.
    pub async fn dispatch(&self, code: i64) -> FeResult<Response> {
        let command = Command::from_code(code)?;
        debug!(code, ?command, "dispatching option");
        match command {
            Command::ReportFeeds => {
                let mut text = String::new();
                for id in FeedId::ALL {
                    let state = self.frontend.feed(id).load_state().await;
                    // writing to a String cannot fail
                    let _ = writeln!(text, "feed {} is on the {}", id, state);
                }
                Ok(Response::Text(text))
            }
            Command::SetFeed { feed, target } => {
                self.frontend.set_feed_load(feed, target).await?;
                Ok(Response::None)
            }
            Command::GetNoiseDiode => {
                Ok(Response::Flag(self.frontend.get_noise_diode_state().await))
            }
            Command::SetNoiseDiode(on) => {
                self.frontend.set_noise_diode_state(on).await?;
                Ok(Response::None)
            }
            Command::SetPreampBias { feed, on } => {
                self.frontend.set_preamp(feed, on).await?;
                Ok(Response::None)
            }
            Command::ReadPowerMeters => {
                Ok(Response::Readings(self.frontend.read_all_power_meters().await))
            }
            Command::ReadTemperatures => {
                Ok(Response::Temperatures(self.frontend.read_temperatures().await))
            }
            Command::SetMeterMode { feed, pol, mode } => {
                self.frontend.set_channel_meter_mode(feed, pol, mode).await;
                Ok(Response::None)
            }
        }
    }
}
