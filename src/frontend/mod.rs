//! Front-end device model.
//!
//! [`FrontEnd`] aggregates the two feeds and the shared noise diode and
//! exposes the full monitor and control surface: feed load state, noise
//! diode state and attenuation, preamp bias, power-meter reads, temperature
//! reads, and the calibration acquisition sequences (minical, Y-factor).
//!
//! All entities are constructed once, at [`FrontEnd`] construction, with
//! fixed defaults: loads retracted, noise diode off, preamps biased on,
//! power meters in watts. They mutate only through the operations here.
//! Whether the receiver is simulated or backed by a hardware adapter is
//! fixed at construction and never changes mid-session.
//!
//! Raw feed ids and state strings are validated at this boundary; the
//! entities below only ever see typed values.

pub mod feed;
pub mod noise;
pub mod physics;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::CalibrationConfig;
use crate::error::{FeResult, FrontEndError};
use crate::hardware::{AnalogInput, DigitalLine, DiscreteInput, HardwareAdapter};
use crate::sim::SimRng;

pub use feed::{AmbientLoad, Channel, Feed, FeedId, LoadState, Polarization, PowerMeterMode};
pub use noise::{Attenuator, NoiseDiode};

/// One power-meter sample, tagged with its legacy channel index (1..4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeterReading {
    /// Channel index in the fixed order feed1-E, feed1-H, feed2-E, feed2-H.
    pub index: u8,
    /// The meter's power proxy, W-equivalent.
    pub value: f64,
}

/// The four front-end physical temperatures, keyed as the legacy protocol
/// reports them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Temperatures {
    /// Feed 1 ambient load, K.
    pub load1: f64,
    /// Cold cryostat stage, K.
    #[serde(rename = "12K")]
    pub stage_12k: f64,
    /// Feed 2 ambient load, K.
    pub load2: f64,
    /// Warm cryostat stage, K.
    #[serde(rename = "70K")]
    pub stage_70k: f64,
}

/// The four readings one channel contributes to a minical solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinicalReadings {
    /// Legacy channel index, 1..4.
    pub index: u8,
    /// Load retracted, diode off.
    pub sky: f64,
    /// Load retracted, diode on.
    pub sky_nd: f64,
    /// Load inserted, diode off.
    pub load: f64,
    /// Load inserted, diode on.
    pub load_nd: f64,
    /// Physical temperature of this channel's ambient load, K.
    pub t_load_k: f64,
}

/// One complete minical acquisition across all four channels.
#[derive(Debug, Clone, Serialize)]
pub struct MinicalSet {
    /// Acquisition time.
    pub taken_at: DateTime<Utc>,
    /// Per-channel readings in the fixed channel order.
    pub channels: Vec<MinicalReadings>,
}

/// Y-factor for one channel: load over sky power, dB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YFactor {
    /// Legacy channel index, 1..4.
    pub index: u8,
    /// `10 log10(P_load / P_sky)`.
    pub y_db: f64,
}

/// Bias-supply rail voltages, hardware mode only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SupplyVoltages {
    /// −12 V rail, volts.
    pub minus_12v: f64,
    /// +12 V rail, volts.
    pub plus_12v: f64,
    /// +5 V rail, volts.
    pub plus_5v: f64,
    /// +8 V rail, volts.
    pub plus_8v: f64,
    /// Lambda bias supply, volts.
    pub lambda: f64,
}

/// The K-band front end: two feeds, one noise diode, and the monitor and
/// control surface over them.
pub struct FrontEnd {
    config: CalibrationConfig,
    feeds: [Feed; 2],
    diode: Arc<RwLock<NoiseDiode>>,
    rng: Arc<SimRng>,
    adapter: Option<Arc<dyn HardwareAdapter>>,
}

impl FrontEnd {
    /// Simulated receiver with OS-seeded jitter.
    pub fn new(config: CalibrationConfig) -> Self {
        Self::build(config, None, None)
    }

    /// Simulated receiver with a pinned jitter stream, for tests.
    pub fn with_seed(config: CalibrationConfig, seed: u64) -> Self {
        Self::build(config, None, Some(seed))
    }

    /// Receiver backed by real hardware. State changes write through to the
    /// adapter's digital lines; the hardware-only monitors become available.
    pub fn with_adapter(config: CalibrationConfig, adapter: Arc<dyn HardwareAdapter>) -> Self {
        Self::build(config, Some(adapter), None)
    }

    fn build(
        config: CalibrationConfig,
        adapter: Option<Arc<dyn HardwareAdapter>>,
        seed: Option<u64>,
    ) -> Self {
        let rng = Arc::new(SimRng::new(seed));
        let diode = Arc::new(RwLock::new(NoiseDiode::new(config.noise_diode.clone())));
        let feeds = FeedId::ALL.map(|id| {
            Feed::new(
                id,
                config.ambient_load_temp_k,
                config.sky,
                |pol| config.channel(id, pol),
                Arc::clone(&diode),
                Arc::clone(&rng),
            )
        });
        info!(
            simulated = adapter.is_none(),
            frequency_ghz = config.center_frequency_ghz,
            bandwidth_ghz = config.bandwidth_ghz,
            "front end initialized"
        );
        Self {
            config,
            feeds,
            diode,
            rng,
            adapter,
        }
    }

    /// Passband center, GHz.
    pub fn center_frequency_ghz(&self) -> f64 {
        self.config.center_frequency_ghz
    }

    /// Passband width, GHz.
    pub fn bandwidth_ghz(&self) -> f64 {
        self.config.bandwidth_ghz
    }

    /// True when no hardware adapter is connected.
    pub fn is_simulated(&self) -> bool {
        self.adapter.is_none()
    }

    /// Access one feed by typed id.
    pub fn feed(&self, id: FeedId) -> &Feed {
        &self.feeds[(id.number() - 1) as usize]
    }

    fn adapter(&self) -> FeResult<&Arc<dyn HardwareAdapter>> {
        self.adapter.as_ref().ok_or(FrontEndError::HardwareUnavailable)
    }

    // ------------------------------------------------------------------
    // Feed loads
    // ------------------------------------------------------------------

    /// Whether the named feed is looking at the sky or its load.
    pub async fn get_feed_state(&self, feed: i64) -> FeResult<LoadState> {
        let id = FeedId::try_from(feed)?;
        Ok(self.feed(id).load_state().await)
    }

    /// Point the named feed at `"sky"` or `"load"` (any case, surrounding
    /// whitespace ignored). Idempotent.
    pub async fn set_feed_state(&self, feed: i64, target: &str) -> FeResult<()> {
        let id = FeedId::try_from(feed)?;
        let state: LoadState = target.parse()?;
        self.set_feed_load(id, state).await
    }

    /// Typed form of [`Self::set_feed_state`]. With hardware attached, a
    /// real transition pulses the feed's load control line before the model
    /// state commits, so an adapter fault leaves the model untouched.
    pub async fn set_feed_load(&self, id: FeedId, target: LoadState) -> FeResult<()> {
        let feed = self.feed(id);
        if feed.load_state().await == target {
            debug!(feed = %id, state = %target, "feed already in position");
            return Ok(());
        }
        if let Some(adapter) = &self.adapter {
            adapter.pulse_digital_line(DigitalLine::FeedLoad(id)).await?;
        }
        feed.set_load_state(target).await;
        info!(feed = %id, state = %target, "feed moved");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Noise diode
    // ------------------------------------------------------------------

    /// Whether the noise diode is firing.
    pub async fn get_noise_diode_state(&self) -> bool {
        self.diode.read().await.is_on()
    }

    /// Turn the noise diode on or off. Attenuation is untouched.
    pub async fn set_noise_diode_state(&self, on: bool) -> FeResult<()> {
        if self.diode.read().await.is_on() == on {
            return Ok(());
        }
        if let Some(adapter) = &self.adapter {
            adapter.pulse_digital_line(DigitalLine::NoiseDiode).await?;
        }
        self.diode.write().await.set_on(on);
        Ok(())
    }

    /// Injected noise temperature at the current attenuation, K.
    pub async fn noise_diode_temperature_k(&self) -> f64 {
        self.diode.read().await.temperature_k()
    }

    /// Current noise-diode attenuation, dB.
    pub async fn noise_diode_attenuation_db(&self) -> f64 {
        self.diode.read().await.attenuation_db()
    }

    /// Set the noise-diode attenuation and recompute the injected power.
    pub async fn set_noise_diode_attenuation(&self, db: f64) -> FeResult<()> {
        self.diode.write().await.set_attenuation_db(db)
    }

    /// Control voltage for a target injected temperature, volts.
    pub async fn noise_diode_ctrl_voltage(&self, target_k: f64) -> FeResult<f64> {
        self.diode.read().await.ctrl_voltage(target_k)
    }

    // ------------------------------------------------------------------
    // Preamps
    // ------------------------------------------------------------------

    /// Switch the amplifier bias for the named feed.
    pub async fn set_preamp_bias(&self, feed: i64, on: bool) -> FeResult<()> {
        let id = FeedId::try_from(feed)?;
        self.set_preamp(id, on).await
    }

    /// Typed form of [`Self::set_preamp_bias`].
    pub async fn set_preamp(&self, id: FeedId, on: bool) -> FeResult<()> {
        let feed = self.feed(id);
        if feed.preamp_enabled().await == on {
            return Ok(());
        }
        if let Some(adapter) = &self.adapter {
            adapter.pulse_digital_line(DigitalLine::AmpBias(id)).await?;
        }
        feed.set_preamp_bias(on).await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Power meters
    // ------------------------------------------------------------------

    /// Set one channel's power-meter display mode.
    pub async fn set_meter_mode(&self, feed: i64, pol: &str, mode: PowerMeterMode) -> FeResult<()> {
        let id = FeedId::try_from(feed)?;
        let pol: Polarization = pol.parse()?;
        self.set_channel_meter_mode(id, pol, mode).await;
        Ok(())
    }

    /// Typed form of [`Self::set_meter_mode`].
    pub async fn set_channel_meter_mode(&self, id: FeedId, pol: Polarization, mode: PowerMeterMode) {
        self.feed(id).channel(pol).set_meter_mode(mode).await;
    }

    /// Read one channel's power meter.
    pub async fn read_power_meter(&self, feed: i64, pol: &str) -> FeResult<f64> {
        let id = FeedId::try_from(feed)?;
        let pol: Polarization = pol.parse()?;
        Ok(self.feed(id).channel(pol).read_power_meter().await)
    }

    /// Read all four power meters in the fixed order feed1-E, feed1-H,
    /// feed2-E, feed2-H, indexed 1..4.
    pub async fn read_all_power_meters(&self) -> Vec<MeterReading> {
        let mut readings = Vec::with_capacity(4);
        let mut index = 0u8;
        for feed in &self.feeds {
            for channel in feed.channels() {
                index += 1;
                readings.push(MeterReading {
                    index,
                    value: channel.read_power_meter().await,
                });
            }
        }
        debug!(?readings, "read power meters");
        readings
    }

    // ------------------------------------------------------------------
    // Temperatures
    // ------------------------------------------------------------------

    /// Read the four front-end physical temperatures.
    pub async fn read_temperatures(&self) -> Temperatures {
        let cryo = &self.config.cryostat;
        Temperatures {
            load1: self.feed(FeedId::One).load_temp_k().await,
            stage_12k: cryo.stage_12k_base_k + self.rng.jitter(cryo.stage_12k_jitter_k),
            load2: self.feed(FeedId::Two).load_temp_k().await,
            stage_70k: cryo.stage_70k_base_k + self.rng.jitter(cryo.stage_70k_jitter_k),
        }
    }

    // ------------------------------------------------------------------
    // Calibration acquisition
    // ------------------------------------------------------------------

    /// Acquire the four-phase minical data set: sky, sky+ND, load, load+ND,
    /// reading all four meters at each phase. Feed and diode state are
    /// restored afterwards; the curve fitting itself is the calibration
    /// pipeline's job, not this crate's.
    pub async fn collect_minical(&self) -> FeResult<MinicalSet> {
        let saved_loads = [
            self.feed(FeedId::One).load_state().await,
            self.feed(FeedId::Two).load_state().await,
        ];
        let saved_diode = self.get_noise_diode_state().await;
        info!("minical acquisition started");

        self.set_all_loads(LoadState::Sky).await?;
        self.set_noise_diode_state(false).await?;
        let sky = self.read_all_power_meters().await;
        self.set_noise_diode_state(true).await?;
        let sky_nd = self.read_all_power_meters().await;

        self.set_all_loads(LoadState::Load).await?;
        self.set_noise_diode_state(false).await?;
        let load = self.read_all_power_meters().await;
        self.set_noise_diode_state(true).await?;
        let load_nd = self.read_all_power_meters().await;

        for (id, state) in FeedId::ALL.into_iter().zip(saved_loads) {
            self.set_feed_load(id, state).await?;
        }
        self.set_noise_diode_state(saved_diode).await?;

        let mut channels = Vec::with_capacity(4);
        for i in 0..4 {
            let feed = if i < 2 { FeedId::One } else { FeedId::Two };
            channels.push(MinicalReadings {
                index: (i + 1) as u8,
                sky: sky[i].value,
                sky_nd: sky_nd[i].value,
                load: load[i].value,
                load_nd: load_nd[i].value,
                t_load_k: self.feed(feed).load_temp_k().await,
            });
        }
        info!("minical acquisition complete");
        Ok(MinicalSet {
            taken_at: Utc::now(),
            channels,
        })
    }

    /// Measure the Y-factor of every channel: loads in, loads out, ratio in
    /// dB. The noise diode is left as found and prior feed state restored.
    pub async fn measure_y_factors(&self) -> FeResult<Vec<YFactor>> {
        let saved_loads = [
            self.feed(FeedId::One).load_state().await,
            self.feed(FeedId::Two).load_state().await,
        ];

        self.set_all_loads(LoadState::Load).await?;
        let hot = self.read_all_power_meters().await;
        self.set_all_loads(LoadState::Sky).await?;
        let cold = self.read_all_power_meters().await;

        for (id, state) in FeedId::ALL.into_iter().zip(saved_loads) {
            self.set_feed_load(id, state).await?;
        }

        Ok(hot
            .iter()
            .zip(&cold)
            .map(|(h, c)| YFactor {
                index: h.index,
                y_db: 10.0 * (h.value / c.value).log10(),
            })
            .collect())
    }

    /// Estimated vacuum system temperature at an elevation, K.
    pub fn tsys_vacuum(&self, elevation_deg: f64) -> FeResult<f64> {
        if !elevation_deg.is_finite() || elevation_deg <= 0.0 || elevation_deg > 90.0 {
            return Err(FrontEndError::CalibrationInput(format!(
                "elevation {elevation_deg} deg outside (0, 90]"
            )));
        }
        Ok(self.config.sky.zenith_tsys_k / elevation_deg.to_radians().sin())
    }

    // ------------------------------------------------------------------
    // Hardware-only monitors
    // ------------------------------------------------------------------

    /// Read the bias-supply rails. Requires a connected adapter; the
    /// simulator never fakes supply health.
    pub async fn read_supply_voltages(&self) -> FeResult<SupplyVoltages> {
        let adapter = self.adapter()?;
        Ok(SupplyVoltages {
            minus_12v: adapter.read_analog_input(AnalogInput::SupplyMinus12V).await?,
            plus_12v: adapter.read_analog_input(AnalogInput::SupplyPlus12V).await?,
            plus_5v: adapter.read_analog_input(AnalogInput::SupplyPlus5V).await?,
            plus_8v: adapter.read_analog_input(AnalogInput::SupplyPlus8V).await?,
            lambda: adapter.read_analog_input(AnalogInput::LambdaSupply).await?,
        })
    }

    /// Check the named feed's position sense switch against the commanded
    /// state. Requires a connected adapter.
    pub async fn feed_position_confirmed(&self, feed: i64) -> FeResult<bool> {
        let id = FeedId::try_from(feed)?;
        let adapter = self.adapter()?;
        let input = match self.feed(id).load_state().await {
            LoadState::Load => DiscreteInput::FeedInLoad(id),
            LoadState::Sky => DiscreteInput::FeedOnSky(id),
        };
        adapter.read_discrete_input(input).await
    }

    /// Read back the amplifier bias sense line for the named feed.
    /// Requires a connected adapter.
    pub async fn preamp_bias_confirmed(&self, feed: i64) -> FeResult<bool> {
        let id = FeedId::try_from(feed)?;
        let adapter = self.adapter()?;
        adapter.read_discrete_input(DiscreteInput::AmpBiasOn(id)).await
    }

    async fn set_all_loads(&self, state: LoadState) -> FeResult<()> {
        for id in FeedId::ALL {
            self.set_feed_load(id, state).await?;
        }
        Ok(())
    }
}

impl fmt::Debug for FrontEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontEnd")
            .field("simulated", &self.is_simulated())
            .field("center_frequency_ghz", &self.config.center_frequency_ghz)
            .field("bandwidth_ghz", &self.config.bandwidth_ghz)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontend() -> FrontEnd {
        FrontEnd::with_seed(CalibrationConfig::default(), 1)
    }

    #[tokio::test]
    async fn fresh_receiver_has_the_documented_defaults() {
        let fe = frontend();
        assert!(fe.is_simulated());
        assert_eq!(fe.center_frequency_ghz(), 22.0);
        assert_eq!(fe.bandwidth_ghz(), 10.0);
        for id in FeedId::ALL {
            assert_eq!(fe.feed(id).load_state().await, LoadState::Sky);
            assert!(fe.feed(id).preamp_enabled().await);
            for chan in fe.feed(id).channels() {
                assert_eq!(chan.meter_mode().await, PowerMeterMode::Watts);
            }
        }
        assert!(!fe.get_noise_diode_state().await);
    }

    #[tokio::test]
    async fn feed_state_round_trips_case_insensitively() {
        let fe = frontend();
        for variant in ["load", "LOAD", " Load ", "\tloAd"] {
            fe.set_feed_state(1, variant).await.unwrap();
            assert_eq!(fe.get_feed_state(1).await.unwrap(), LoadState::Load);
        }
        fe.set_feed_state(1, "sky").await.unwrap();
        assert_eq!(fe.get_feed_state(1).await.unwrap(), LoadState::Sky);
        // idempotent
        fe.set_feed_state(1, "sky").await.unwrap();
        assert_eq!(fe.get_feed_state(1).await.unwrap(), LoadState::Sky);
    }

    #[tokio::test]
    async fn bad_feed_ids_are_rejected_everywhere() {
        let fe = frontend();
        for bad in [0i64, 3, -1] {
            assert!(matches!(
                fe.get_feed_state(bad).await,
                Err(FrontEndError::InvalidFeedId(_))
            ));
            assert!(matches!(
                fe.set_feed_state(bad, "sky").await,
                Err(FrontEndError::InvalidFeedId(_))
            ));
            assert!(matches!(
                fe.set_preamp_bias(bad, true).await,
                Err(FrontEndError::InvalidFeedId(_))
            ));
            assert!(matches!(
                fe.read_power_meter(bad, "E").await,
                Err(FrontEndError::InvalidFeedId(_))
            ));
        }
    }

    #[tokio::test]
    async fn bad_polarization_is_rejected() {
        let fe = frontend();
        assert!(matches!(
            fe.read_power_meter(1, "X").await,
            Err(FrontEndError::InvalidPolarization(_))
        ));
    }

    #[tokio::test]
    async fn meter_ordering_is_fixed() {
        let fe = frontend();
        let readings = fe.read_all_power_meters().await;
        assert_eq!(readings.len(), 4);
        for (i, r) in readings.iter().enumerate() {
            assert_eq!(r.index, (i + 1) as u8);
        }
    }

    #[tokio::test]
    async fn temperatures_sit_in_their_bands() {
        let fe = frontend();
        let temps = fe.read_temperatures().await;
        assert_eq!(temps.load1, 320.0);
        assert_eq!(temps.load2, 320.0);
        assert!((15.0..15.01).contains(&temps.stage_12k));
        assert!((80.0..80.5).contains(&temps.stage_70k));
    }

    #[tokio::test]
    async fn tsys_vacuum_follows_the_cosecant_law() {
        let fe = frontend();
        assert!((fe.tsys_vacuum(90.0).unwrap() - 36.0).abs() < 1e-9);
        assert!((fe.tsys_vacuum(30.0).unwrap() - 72.0).abs() < 1e-9);
        for bad in [0.0, -5.0, 91.0, f64::NAN] {
            assert!(matches!(
                fe.tsys_vacuum(bad),
                Err(FrontEndError::CalibrationInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn hardware_monitors_need_an_adapter() {
        let fe = frontend();
        assert!(matches!(
            fe.read_supply_voltages().await,
            Err(FrontEndError::HardwareUnavailable)
        ));
        assert!(matches!(
            fe.feed_position_confirmed(1).await,
            Err(FrontEndError::HardwareUnavailable)
        ));
        assert!(matches!(
            fe.preamp_bias_confirmed(2).await,
            Err(FrontEndError::HardwareUnavailable)
        ));
    }

    #[tokio::test]
    async fn diode_attenuation_updates_injected_power() {
        let fe = frontend();
        fe.set_noise_diode_attenuation(0.0).await.unwrap();
        assert_eq!(fe.noise_diode_temperature_k().await, 384.6);
        fe.set_noise_diode_attenuation(-9.86).await.unwrap();
        assert!((fe.noise_diode_temperature_k().await - 39.7).abs() < 0.1);
    }
}
