use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use simple_error::SimpleError;

pub const MDSA: &str = "MDSA";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Algorithm name to its parameters. Only `MDSA` has a termination policy.
    pub algorithm: BTreeMap<String, serde_json::Value>,
    /// Upper bound on the number of simulated timesteps.
    pub sim_duration: usize,
    pub termination_probe: TerminationProbe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationProbe {
    /// Scans the monitored neurons by name at every step.
    NameProbe,
    /// Caches the raster columns of the probed neurons once.
    IndexProbe,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            algorithm: BTreeMap::from([(MDSA.to_string(), serde_json::json!({ "m_val": 0 }))]),
            sim_duration: 100,
            termination_probe: TerminationProbe::default(),
        }
    }
}

impl Default for TerminationProbe {
    fn default() -> Self {
        TerminationProbe::NameProbe
    }
}

impl RunConfig {
    pub fn mdsa(sim_duration: usize) -> Self {
        Self {
            sim_duration,
            ..Self::default()
        }
    }

    pub fn algorithm_names(&self) -> Vec<String> {
        self.algorithm.keys().cloned().collect()
    }
}

pub fn validate_run_config(run_config: &RunConfig) -> Result<(), SimpleError> {
    if run_config.sim_duration == 0 {
        return Err(SimpleError::new("sim_duration must be strictly positive"));
    }

    if run_config.algorithm.is_empty() {
        return Err(SimpleError::new("algorithm must name at least one algorithm"));
    }

    Ok(())
}
