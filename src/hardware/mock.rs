//! Mock hardware adapter.
//!
//! Records every pulsed line and serves scripted analog/discrete values so
//! tests can assert the write-through behavior of the model without a
//! device attached. Optionally fails every call to exercise error paths.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{FeResult, FrontEndError};
use crate::hardware::adapter::{AnalogInput, DigitalLine, DiscreteInput, HardwareAdapter};

/// In-memory adapter for tests.
#[derive(Debug, Default)]
pub struct MockAdapter {
    pulses: RwLock<Vec<DigitalLine>>,
    analog: RwLock<HashMap<AnalogInput, f64>>,
    discrete: RwLock<HashMap<DiscreteInput, bool>>,
    failing: RwLock<bool>,
}

impl MockAdapter {
    /// New adapter with no scripted inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line pulsed so far, in order.
    pub async fn pulses(&self) -> Vec<DigitalLine> {
        self.pulses.read().await.clone()
    }

    /// Script the value of an analog input.
    pub async fn set_analog(&self, input: AnalogInput, volts: f64) {
        self.analog.write().await.insert(input, volts);
    }

    /// Script the value of a discrete input.
    pub async fn set_discrete(&self, input: DiscreteInput, value: bool) {
        self.discrete.write().await.insert(input, value);
    }

    /// Make every subsequent call fail, or restore normal operation.
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    async fn check(&self) -> FeResult<()> {
        if *self.failing.read().await {
            Err(FrontEndError::Adapter("injected fault".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HardwareAdapter for MockAdapter {
    async fn pulse_digital_line(&self, line: DigitalLine) -> FeResult<()> {
        self.check().await?;
        self.pulses.write().await.push(line);
        Ok(())
    }

    async fn read_analog_input(&self, input: AnalogInput) -> FeResult<f64> {
        self.check().await?;
        self.analog
            .read()
            .await
            .get(&input)
            .copied()
            .ok_or_else(|| FrontEndError::Adapter(format!("no scripted value for {input:?}")))
    }

    async fn read_discrete_input(&self, input: DiscreteInput) -> FeResult<bool> {
        self.check().await?;
        self.discrete
            .read()
            .await
            .get(&input)
            .copied()
            .ok_or_else(|| FrontEndError::Adapter(format!("no scripted value for {input:?}")))
    }
}
