use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synapse {
    pub weight: f64,
    /// Carried for the hardware backends; spikes arrive one step later regardless.
    pub delay: usize,
    pub change_per_t: f64,
}

impl Synapse {
    pub fn new(weight: f64, delay: i64, change_per_t: f64) -> SimResult<Self> {
        if delay < 0 {
            return Err(SimError::InvalidArgument(format!(
                "delay {} must be 0 or larger",
                delay
            )));
        }

        Ok(Self {
            weight,
            delay: delay as usize,
            change_per_t,
        })
    }

    /// Returns the current delivered by one spike and applies the per-fire weight change.
    pub fn transmit(&mut self) -> f64 {
        let current = self.weight;
        self.weight += self.change_per_t;
        current
    }

    pub fn is_well_typed(&self) -> bool {
        self.weight.is_finite() && self.change_per_t.is_finite()
    }
}
