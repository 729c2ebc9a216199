//! Noise diode and its PIN attenuator.
//!
//! One diode injects broadband noise into all four channels via a splitter
//! behind the ambient loads. Its output power is set by a PIN attenuator;
//! the injected temperature follows the standard dB power-gain law scaled by
//! the unattenuated diode power from the calibration fit. The control
//! voltage for a target temperature comes from a fixed-degree polynomial
//! over measured data. Both are calibration data rather than logic, so the
//! gain law's divisor and the polynomial coefficients arrive in
//! [`crate::config::NoiseDiodeCal`].

use tracing::{debug, warn};

use crate::config::NoiseDiodeCal;
use crate::error::{FeResult, FrontEndError};

/// PIN diode attenuator for the noise-diode signal.
#[derive(Debug, Clone)]
pub struct Attenuator {
    atten_db: f64,
    cal: NoiseDiodeCal,
}

impl Attenuator {
    pub(crate) fn new(cal: NoiseDiodeCal) -> Self {
        Self {
            atten_db: cal.default_atten_db,
            cal,
        }
    }

    /// Current attenuation, dB.
    pub fn attenuation_db(&self) -> f64 {
        self.atten_db
    }

    pub(crate) fn set_attenuation_db(&mut self, db: f64) -> FeResult<()> {
        if !db.is_finite() {
            return Err(FrontEndError::CalibrationInput(format!(
                "attenuation must be finite, got {db}"
            )));
        }
        if db > 0.0 {
            // the attenuator cannot amplify
            warn!(db, "positive attenuation setting");
        }
        self.atten_db = db;
        Ok(())
    }

    /// Power gain at the current setting, in (0, 1] for settings ≤ 0 dB.
    pub fn gain(&self) -> f64 {
        self.gain_at(self.atten_db)
    }

    /// Power gain at an arbitrary setting.
    pub fn gain_at(&self, db: f64) -> f64 {
        10f64.powf(db / self.cal.gain_db_per_decade)
    }

    /// Control voltage producing a target injected temperature, from the
    /// measured-data polynomial fit.
    pub fn ctrl_voltage(&self, target_k: f64) -> FeResult<f64> {
        if self.cal.ctrl_voltage_coefs.is_empty() {
            return Err(FrontEndError::CalibrationInput(
                "control-voltage polynomial has no coefficients".into(),
            ));
        }
        if !target_k.is_finite() || target_k < 0.0 || target_k > self.cal.max_temp_k {
            return Err(FrontEndError::CalibrationInput(format!(
                "target {target_k} K outside the fitted range 0..={} K",
                self.cal.max_temp_k
            )));
        }
        Ok(polyval(&self.cal.ctrl_voltage_coefs, target_k))
    }

    /// Unattenuated diode power, K.
    pub fn max_temp_k(&self) -> f64 {
        self.cal.max_temp_k
    }
}

/// Evaluate a polynomial with coefficients ordered highest power first.
fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().fold(0.0, |acc, c| acc * x + c)
}

/// Noise diode injecting power into all channels.
#[derive(Debug)]
pub struct NoiseDiode {
    on: bool,
    temperature_k: f64,
    attenuator: Attenuator,
}

impl NoiseDiode {
    pub(crate) fn new(cal: NoiseDiodeCal) -> Self {
        let attenuator = Attenuator::new(cal);
        let temperature_k = attenuator.max_temp_k() * attenuator.gain();
        Self {
            on: false,
            temperature_k,
            attenuator,
        }
    }

    /// Whether the diode is firing into the channels.
    pub fn is_on(&self) -> bool {
        self.on
    }

    pub(crate) fn set_on(&mut self, on: bool) {
        debug!(on, "set noise diode state");
        self.on = on;
    }

    /// Injected noise temperature at the current attenuation, K.
    ///
    /// Valid whether or not the diode is on; toggling the diode never
    /// changes the attenuation.
    pub fn temperature_k(&self) -> f64 {
        self.temperature_k
    }

    /// Current attenuator setting, dB.
    pub fn attenuation_db(&self) -> f64 {
        self.attenuator.attenuation_db()
    }

    /// Change the attenuator setting and recompute the injected temperature.
    pub fn set_attenuation_db(&mut self, db: f64) -> FeResult<()> {
        self.attenuator.set_attenuation_db(db)?;
        self.temperature_k = self.attenuator.max_temp_k() * self.attenuator.gain();
        debug!(db, "set noise diode attenuation: {:.2} K injected", self.temperature_k);
        Ok(())
    }

    /// Control voltage for a target injected temperature, volts.
    pub fn ctrl_voltage(&self, target_k: f64) -> FeResult<f64> {
        self.attenuator.ctrl_voltage(target_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diode() -> NoiseDiode {
        NoiseDiode::new(NoiseDiodeCal::default())
    }

    #[test]
    fn default_attenuation_sits_near_the_zero_volt_point() {
        // 384.6 K * 10^(-0.986) is the documented ~39 K at 0 V
        let nd = diode();
        assert_eq!(nd.attenuation_db(), -9.86);
        assert!((nd.temperature_k() - 39.7).abs() < 0.1);
    }

    #[test]
    fn gain_is_monotonic_toward_zero_db() {
        let nd = diode();
        let mut last = 0.0;
        for db in [-40.0, -20.0, -10.0, -3.0, -1.0, 0.0] {
            let g = nd.attenuator.gain_at(db);
            assert!(g > last, "gain must grow as attenuation approaches 0 dB");
            last = g;
        }
        assert_eq!(nd.attenuator.gain_at(0.0), 1.0);
    }

    #[test]
    fn attenuation_change_recomputes_temperature() {
        let mut nd = diode();
        nd.set_attenuation_db(0.0).unwrap();
        assert_eq!(nd.temperature_k(), 384.6);
        nd.set_attenuation_db(-10.0).unwrap();
        assert!((nd.temperature_k() - 38.46).abs() < 1e-9);
    }

    #[test]
    fn toggling_state_keeps_attenuation() {
        let mut nd = diode();
        let before = nd.attenuation_db();
        nd.set_on(true);
        nd.set_on(false);
        assert_eq!(nd.attenuation_db(), before);
    }

    #[test]
    fn non_finite_attenuation_is_rejected() {
        let mut nd = diode();
        assert!(matches!(
            nd.set_attenuation_db(f64::NAN),
            Err(FrontEndError::CalibrationInput(_))
        ));
    }

    #[test]
    fn ctrl_voltage_matches_the_fit_at_the_constant_term() {
        // polyval(coefs, 0) is the constant term of the fit
        let nd = diode();
        let v = nd.ctrl_voltage(0.0).unwrap();
        assert!((v - 1.526_785_86).abs() < 1e-9);
    }

    #[test]
    fn zero_volts_lands_near_the_documented_39_k_point() {
        let nd = diode();
        let v = nd.ctrl_voltage(39.0).unwrap();
        assert!(v.abs() < 0.05, "fit should cross 0 V near 39 K, got {v}");
    }

    #[test]
    fn ctrl_voltage_rejects_out_of_range_targets() {
        let nd = diode();
        for bad in [-1.0, 385.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                nd.ctrl_voltage(bad),
                Err(FrontEndError::CalibrationInput(_))
            ));
        }
    }

    #[test]
    fn ctrl_voltage_requires_coefficients() {
        let mut cal = NoiseDiodeCal::default();
        cal.ctrl_voltage_coefs.clear();
        let nd = NoiseDiode::new(cal);
        assert!(matches!(
            nd.ctrl_voltage(39.0),
            Err(FrontEndError::CalibrationInput(_))
        ));
    }

    #[test]
    fn polyval_is_horner() {
        // 2x^2 + 3x + 4 at x = 5
        assert_eq!(polyval(&[2.0, 3.0, 4.0], 5.0), 69.0);
    }
}
