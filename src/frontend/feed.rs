//! Feeds, ambient loads and polarization channels.
//!
//! A feed is one of the two horn/waveguide assemblies. Each carries a
//! digitally switched ambient calibration load, a bias flag for its pair of
//! cryogenic amplifiers, and an orthomode splitting the beam into E and H
//! polarization channels, each with its own power meter.
//!
//! Channels never reach back through parent pointers: the shared noise
//! diode, the feed's load and the preamp flag are handed to each channel as
//! read-only handles at construction.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::{ChannelCal, SkyModel};
use crate::error::FrontEndError;
use crate::frontend::noise::NoiseDiode;
use crate::frontend::physics;
use crate::sim::SimRng;

/// One of the receiver's two beam positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeedId {
    /// Feed 1, offset toward negative focus-ring positions.
    One,
    /// Feed 2, offset toward positive focus-ring positions.
    Two,
}

impl FeedId {
    /// Both feeds in ascending numeric order.
    pub const ALL: [FeedId; 2] = [FeedId::One, FeedId::Two];

    /// The legacy numeric id, 1 or 2.
    pub fn number(self) -> u8 {
        match self {
            FeedId::One => 1,
            FeedId::Two => 2,
        }
    }

    /// Display name from the feed's focus-ring side.
    pub fn name(self) -> &'static str {
        match self {
            FeedId::One => "minus",
            FeedId::Two => "plus",
        }
    }

    /// Offset along the focus ring from the nominal position, inches.
    pub fn position_offset_inch(self) -> f64 {
        match self {
            FeedId::One => -0.012,
            FeedId::Two => 0.012,
        }
    }
}

impl TryFrom<i64> for FeedId {
    type Error = FrontEndError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FeedId::One),
            2 => Ok(FeedId::Two),
            other => Err(FrontEndError::InvalidFeedId(other)),
        }
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Linear polarization planes separated by the orthomode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Polarization {
    /// E-plane.
    E,
    /// H-plane.
    H,
}

impl Polarization {
    /// Both polarizations, E before H. This order is load-bearing:
    /// downstream calibration correlates meter index to channel by position.
    pub const ALL: [Polarization; 2] = [Polarization::E, Polarization::H];
}

impl FromStr for Polarization {
    type Err = FrontEndError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "E" | "e" => Ok(Polarization::E),
            "H" | "h" => Ok(Polarization::H),
            other => Err(FrontEndError::InvalidPolarization(other.to_string())),
        }
    }
}

impl fmt::Display for Polarization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarization::E => write!(f, "E"),
            Polarization::H => write!(f, "H"),
        }
    }
}

/// Where a feed is looking: open sky, or its ambient calibration load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadState {
    /// Load retracted, feed open to the sky.
    Sky,
    /// Load inserted into the signal path.
    Load,
}

impl LoadState {
    /// Legacy protocol spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            LoadState::Sky => "sky",
            LoadState::Load => "load",
        }
    }
}

impl FromStr for LoadState {
    type Err = FrontEndError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sky" => Ok(LoadState::Sky),
            "load" => Ok(LoadState::Load),
            _ => Err(FrontEndError::InvalidFeedTarget(s.to_string())),
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Power-meter display units.
///
/// The mode affects only how a reading is reported, never the underlying
/// physical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerMeterMode {
    /// Linear watts.
    Watts,
    /// Power relative to 1 mW, logarithmic.
    Dbm,
}

/// Reported value for non-positive power in dBm mode.
const DBM_FLOOR: f64 = -120.0;

impl PowerMeterMode {
    /// Convert a stored watts reading into this mode's display units.
    pub fn display(self, watts: f64) -> f64 {
        match self {
            PowerMeterMode::Watts => watts,
            PowerMeterMode::Dbm => {
                if watts <= 0.0 {
                    DBM_FLOOR
                } else {
                    10.0 * (watts / 1e-3).log10()
                }
            }
        }
    }
}

/// Waveguide load attached behind a feed.
#[derive(Debug)]
pub struct AmbientLoad {
    state: LoadState,
    physical_temp_k: f64,
}

impl AmbientLoad {
    /// New load, retracted, at the configured physical temperature.
    pub fn new(physical_temp_k: f64) -> Self {
        Self {
            state: LoadState::Sky,
            physical_temp_k,
        }
    }

    /// Insert or retract the load.
    pub fn set_state(&mut self, state: LoadState) {
        self.state = state;
    }

    /// Current position.
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Physical temperature, K. Fixed at construction.
    pub fn physical_temp_k(&self) -> f64 {
        self.physical_temp_k
    }
}

/// Output for one polarization from a feed's orthomode.
pub struct Channel {
    feed: FeedId,
    pol: Polarization,
    mode: RwLock<PowerMeterMode>,
    cal: ChannelCal,
    sky: SkyModel,
    load: Arc<RwLock<AmbientLoad>>,
    preamp_on: Arc<RwLock<bool>>,
    diode: Arc<RwLock<NoiseDiode>>,
    rng: Arc<SimRng>,
}

impl Channel {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        feed: FeedId,
        pol: Polarization,
        cal: ChannelCal,
        sky: SkyModel,
        load: Arc<RwLock<AmbientLoad>>,
        preamp_on: Arc<RwLock<bool>>,
        diode: Arc<RwLock<NoiseDiode>>,
        rng: Arc<SimRng>,
    ) -> Self {
        Self {
            feed,
            pol,
            mode: RwLock::new(PowerMeterMode::Watts),
            cal,
            sky,
            load,
            preamp_on,
            diode,
            rng,
        }
    }

    /// This channel's polarization.
    pub fn polarization(&self) -> Polarization {
        self.pol
    }

    /// Current display mode of the attached power meter.
    pub async fn meter_mode(&self) -> PowerMeterMode {
        *self.mode.read().await
    }

    /// Set the display mode. Does not touch the physical reading.
    pub async fn set_meter_mode(&self, mode: PowerMeterMode) {
        debug!(feed = %self.feed, pol = %self.pol, ?mode, "set power meter mode");
        *self.mode.write().await = mode;
    }

    /// Read the power meter attached to this channel.
    ///
    /// With the preamp bias off the reading collapses to a fixed floor.
    /// Otherwise the operating temperature follows the load position, plus
    /// the noise diode's injected power when it is on, divided by the
    /// channel's system-gain factor.
    pub async fn read_power_meter(&self) -> f64 {
        if !*self.preamp_on.read().await {
            return physics::PREAMP_OFF_FLOOR_W;
        }
        let mut t_op = match self.load.read().await.state() {
            LoadState::Load => {
                physics::t_load(&self.sky, self.cal.t_receiver_k)
                    + self.rng.jitter(physics::LOAD_JITTER_K)
            }
            LoadState::Sky => {
                physics::t_sky(&self.sky, self.cal.t_receiver_k)
                    + self.rng.jitter(physics::SKY_JITTER_K)
            }
        };
        {
            let diode = self.diode.read().await;
            if diode.is_on() {
                t_op += diode.temperature_k();
            }
        }
        debug!(feed = %self.feed, pol = %self.pol, "read power meter: T_op = {t_op:.1} K");
        t_op / self.cal.tsys_factor
    }

    /// Read the meter and convert into the channel's display mode. The
    /// stored physical reading is never affected by the mode.
    pub async fn read_power_meter_display(&self) -> f64 {
        let watts = self.read_power_meter().await;
        self.meter_mode().await.display(watts)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("feed", &self.feed)
            .field("pol", &self.pol)
            .finish_non_exhaustive()
    }
}

/// Feed horn and associated waveguide components.
#[derive(Debug)]
pub struct Feed {
    id: FeedId,
    load: Arc<RwLock<AmbientLoad>>,
    preamp_on: Arc<RwLock<bool>>,
    channels: [Channel; 2],
}

impl Feed {
    pub(crate) fn new(
        id: FeedId,
        load_temp_k: f64,
        sky: SkyModel,
        cal_of: impl Fn(Polarization) -> ChannelCal,
        diode: Arc<RwLock<NoiseDiode>>,
        rng: Arc<SimRng>,
    ) -> Self {
        let load = Arc::new(RwLock::new(AmbientLoad::new(load_temp_k)));
        // bias on at power-up
        let preamp_on = Arc::new(RwLock::new(true));
        let channels = Polarization::ALL.map(|pol| {
            Channel::new(
                id,
                pol,
                cal_of(pol),
                sky,
                Arc::clone(&load),
                Arc::clone(&preamp_on),
                Arc::clone(&diode),
                Arc::clone(&rng),
            )
        });
        Self {
            id,
            load,
            preamp_on,
            channels,
        }
    }

    /// This feed's id.
    pub fn id(&self) -> FeedId {
        self.id
    }

    /// Current position of the ambient load.
    pub async fn load_state(&self) -> LoadState {
        self.load.read().await.state()
    }

    /// Insert or retract the ambient load. Idempotent.
    pub async fn set_load_state(&self, state: LoadState) {
        self.load.write().await.set_state(state);
    }

    /// Physical temperature of the ambient load, K.
    pub async fn load_temp_k(&self) -> f64 {
        self.load.read().await.physical_temp_k()
    }

    /// Whether the amplifier bias is on.
    pub async fn preamp_enabled(&self) -> bool {
        *self.preamp_on.read().await
    }

    /// Switch the amplifier bias for both of this feed's channels.
    pub async fn set_preamp_bias(&self, on: bool) {
        debug!(feed = %self.id, on, "set preamp bias");
        *self.preamp_on.write().await = on;
    }

    /// One polarization channel.
    pub fn channel(&self, pol: Polarization) -> &Channel {
        match pol {
            Polarization::E => &self.channels[0],
            Polarization::H => &self.channels[1],
        }
    }

    /// Both channels, E before H.
    pub fn channels(&self) -> &[Channel; 2] {
        &self.channels
    }
}
