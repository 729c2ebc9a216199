//! Calibration configuration.
//!
//! Every empirical constant in the receiver model lives here as data: the
//! per-channel receiver temperatures and system-gain factors, the sky
//! brightness model, the noise-diode attenuator calibration and the cryostat
//! sensor bands. The defaults reproduce the published K2 unit; a different
//! receiver supplies a TOML file overriding any subset. Nothing in the model
//! re-derives a fit, and none of these tables are process-wide state: the
//! configuration is passed into [`crate::frontend::FrontEnd`] at
//! construction so test fixtures and multiple receiver instances can carry
//! independent calibration sets.

use std::path::Path;

use config::Config;
use serde::{Deserialize, Serialize};

use crate::error::FeResult;
use crate::frontend::{FeedId, Polarization};

/// Complete calibration set for one receiver unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Passband center, GHz.
    pub center_frequency_ghz: f64,
    /// Passband width, GHz.
    pub bandwidth_ghz: f64,
    /// Physical temperature of the waveguide ambient loads, K.
    pub ambient_load_temp_k: f64,
    /// Sky brightness contributions.
    pub sky: SkyModel,
    /// Receiver noise temperature per channel, K.
    pub t_receiver_k: ChannelTable,
    /// Divisor turning an operating temperature into a power-meter reading.
    pub tsys_factor: ChannelTable,
    /// Noise-diode and attenuator calibration.
    pub noise_diode: NoiseDiodeCal,
    /// Synthesized cryostat stage sensors.
    pub cryostat: CryostatCal,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            center_frequency_ghz: 22.0,
            bandwidth_ghz: 10.0,
            ambient_load_temp_k: 320.0,
            sky: SkyModel::default(),
            t_receiver_k: ChannelTable {
                feed1_e: 19.65,
                feed1_h: 19.75,
                feed2_e: 22.27,
                feed2_h: 20.55,
            },
            tsys_factor: ChannelTable {
                feed1_e: 999_883_083.0,
                feed1_h: 840_000_000.0,
                feed2_e: 690_000_000.0,
                feed2_h: 705_797_017.0,
            },
            noise_diode: NoiseDiodeCal::default(),
            cryostat: CryostatCal::default(),
        }
    }
}

impl CalibrationConfig {
    /// Load a calibration file, filling anything it omits from the defaults.
    pub fn load(path: impl AsRef<Path>) -> FeResult<Self> {
        let cfg = Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    /// The calibration pair for one channel.
    pub fn channel(&self, feed: FeedId, pol: Polarization) -> ChannelCal {
        ChannelCal {
            t_receiver_k: self.t_receiver_k.get(feed, pol),
            tsys_factor: self.tsys_factor.get(feed, pol),
        }
    }
}

/// Sky brightness contributions, K, from the receiver paper.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyModel {
    /// Cosmic background.
    pub t_cosmic_k: f64,
    /// Blockage, spillover and ohmic losses.
    pub t_spillover_k: f64,
    /// Median atmospheric brightness.
    pub t_atmosphere_k: f64,
    /// Temperature inside the feed cone, seen when a load is inserted.
    pub t_ambient_k: f64,
    /// Zenith system temperature used for the vacuum Tsys estimate.
    pub zenith_tsys_k: f64,
}

impl Default for SkyModel {
    fn default() -> Self {
        Self {
            t_cosmic_k: 2.73,
            t_spillover_k: 2.0,
            t_atmosphere_k: 9.0,
            t_ambient_k: 273.15 + 20.0,
            zenith_tsys_k: 36.0,
        }
    }
}

/// One value per (feed, polarization) pair.
///
/// Overrides must be complete: a partial table would silently zero the
/// missing channels, so the file either carries all four values or omits the
/// table entirely.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChannelTable {
    pub feed1_e: f64,
    pub feed1_h: f64,
    pub feed2_e: f64,
    pub feed2_h: f64,
}

impl ChannelTable {
    /// Look up the value for one channel.
    pub fn get(&self, feed: FeedId, pol: Polarization) -> f64 {
        match (feed, pol) {
            (FeedId::One, Polarization::E) => self.feed1_e,
            (FeedId::One, Polarization::H) => self.feed1_h,
            (FeedId::Two, Polarization::E) => self.feed2_e,
            (FeedId::Two, Polarization::H) => self.feed2_h,
        }
    }
}

/// The calibration pair one channel needs to synthesize readings.
#[derive(Debug, Clone, Copy)]
pub struct ChannelCal {
    /// Receiver noise temperature, K.
    pub t_receiver_k: f64,
    /// System-gain divisor turning kelvins into the meter's power proxy.
    pub tsys_factor: f64,
}

/// Noise-diode and PIN-attenuator calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseDiodeCal {
    /// Unattenuated diode power, K (from the attenuator fit).
    pub max_temp_k: f64,
    /// Attenuator setting at power-up, dB. With the default setting the
    /// injected power comes out near the documented 39 K zero-volt point.
    pub default_atten_db: f64,
    /// Divisor in the `10^(dB/d)` power-gain law.
    pub gain_db_per_decade: f64,
    /// Control-voltage polynomial over target kelvins, highest power first.
    pub ctrl_voltage_coefs: Vec<f64>,
}

impl Default for NoiseDiodeCal {
    fn default() -> Self {
        Self {
            max_temp_k: 384.6,
            default_atten_db: -9.86,
            gain_db_per_decade: 10.0,
            ctrl_voltage_coefs: vec![
                3.850_139_93e-18,
                -6.616_161_52e-15,
                4.622_286_06e-12,
                -1.687_335_55e-09,
                3.431_380_77e-07,
                -3.828_758_99e-05,
                2.208_220_16e-03,
                -8.384_730_34e-02,
                1.526_785_86e+00,
            ],
        }
    }
}

/// Bands for the synthesized cryostat stage sensors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CryostatCal {
    /// Nominal 12 K stage reading, K.
    pub stage_12k_base_k: f64,
    /// Jitter bound on the 12 K stage, K.
    pub stage_12k_jitter_k: f64,
    /// Nominal 70 K stage reading, K.
    pub stage_70k_base_k: f64,
    /// Jitter bound on the 70 K stage, K.
    pub stage_70k_jitter_k: f64,
}

impl Default for CryostatCal {
    fn default() -> Self {
        Self {
            stage_12k_base_k: 15.0,
            stage_12k_jitter_k: 0.01,
            stage_70k_base_k: 80.0,
            stage_70k_jitter_k: 0.5,
        }
    }
}
