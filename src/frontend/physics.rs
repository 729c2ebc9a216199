//! Closed-form brightness-temperature model.
//!
//! When no hardware adapter is attached, power-meter readings are
//! synthesized from the operating temperature a channel would see:
//!
//! - on the sky, the cosmic background plus receiver noise, spillover and
//!   the median atmosphere;
//! - on the ambient load, receiver noise plus the temperature inside the
//!   feed cone.
//!
//! A small uniform jitter on top models thermal and instrumental noise, so
//! repeated reads differ slightly while staying centered on the physical
//! value. That is enough for Y-factor and minical processing to be
//! exercised meaningfully against the simulator.

use crate::config::SkyModel;

/// Reading reported when the preamp bias is off, W-equivalent.
pub const PREAMP_OFF_FLOOR_W: f64 = 1e-10;

/// Jitter bound on a load-in reading, K.
pub const LOAD_JITTER_K: f64 = 0.1;

/// Jitter bound on a sky reading, K.
pub const SKY_JITTER_K: f64 = 0.5;

/// Brightness temperature seen on the sky, K.
pub fn t_sky(sky: &SkyModel, t_receiver_k: f64) -> f64 {
    sky.t_cosmic_k + t_receiver_k + sky.t_spillover_k + sky.t_atmosphere_k
}

/// Brightness temperature seen with the ambient load inserted, K.
pub fn t_load(sky: &SkyModel, t_receiver_k: f64) -> f64 {
    t_receiver_k + sky.t_ambient_k
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sky_sums_the_paper_contributions() {
        let sky = SkyModel::default();
        // 2.73 + 19.65 + 2 + 9
        assert!((t_sky(&sky, 19.65) - 33.38).abs() < 1e-9);
    }

    #[test]
    fn load_is_receiver_plus_feed_cone() {
        let sky = SkyModel::default();
        assert!((t_load(&sky, 19.65) - 312.8).abs() < 1e-9);
    }

    #[test]
    fn load_is_hotter_than_sky_by_a_fixed_margin() {
        let sky = SkyModel::default();
        // the margin is independent of the receiver temperature
        for t_rx in [19.65, 19.75, 22.27, 20.55] {
            let diff = t_load(&sky, t_rx) - t_sky(&sky, t_rx);
            assert!((diff - 279.42).abs() < 1e-9);
        }
    }
}
