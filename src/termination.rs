//! Decides when the MDSA network has converged.
//!
//! The network is done as soon as a terminator neuron spikes, or, after the
//! first step, once none of the selector and next round neurons spike any more.
use crate::error::{SimError, SimResult};
use crate::monitor::Raster;
use crate::network::Network;
use crate::params::{RunConfig, TerminationProbe, MDSA};

const TERMINATOR: &str = "terminator";
const STILL_RUNNING: [&str; 2] = ["selector", "next_round"];

pub trait TerminationPolicy {
    /// `t` is the step that has just been simulated; its state is the latest
    /// snapshot of every node and the latest row of `raster`.
    fn is_done(&mut self, network: &Network, raster: &Raster, t: usize) -> SimResult<bool>;

    fn name(&self) -> &'static str;
}

pub fn policy_for(run_config: &RunConfig) -> SimResult<Box<dyn TerminationPolicy>> {
    let names = run_config.algorithm_names();
    if names != [MDSA] {
        return Err(SimError::UnsupportedAlgorithm(names));
    }

    Ok(match run_config.termination_probe {
        TerminationProbe::NameProbe => Box::new(NameProbe),
        TerminationProbe::IndexProbe => Box::new(IndexProbe::default()),
    })
}

fn is_terminator(name: &str) -> bool {
    name.contains(TERMINATOR)
}

fn is_still_running(name: &str) -> bool {
    STILL_RUNNING.iter().any(|identifier| name.contains(identifier))
}

fn require_monitored(raster: &Raster) -> SimResult<()> {
    if raster.targets().is_empty() {
        return Err(SimError::ConfigurationError(
            "no monitored neurons".to_string(),
        ));
    }
    Ok(())
}

/// Scans the monitored neurons by name on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameProbe;

impl TerminationPolicy for NameProbe {
    fn is_done(&mut self, network: &Network, raster: &Raster, t: usize) -> SimResult<bool> {
        require_monitored(raster)?;

        let spiking_names = move || {
            raster
                .targets()
                .iter()
                .filter_map(|node_id| network.node(*node_id))
                .filter(|node| node.latest().map_or(false, |neuron| neuron.spikes()))
                .map(|node| node.name.as_str())
        };

        if spiking_names().any(is_terminator) {
            return Ok(true);
        }

        Ok(t > 0 && !spiking_names().any(is_still_running))
    }

    fn name(&self) -> &'static str {
        "name probe"
    }
}

#[derive(Debug, Clone)]
struct ProbeColumns {
    terminators: Vec<usize>,
    still_running: Vec<usize>,
}

impl ProbeColumns {
    fn from_raster(raster: &Raster) -> Self {
        let columns_where = |predicate: fn(&str) -> bool| -> Vec<usize> {
            raster
                .target_names()
                .iter()
                .enumerate()
                .filter(|(_, name)| predicate(name))
                .map(|(column, _)| column)
                .collect()
        };

        Self {
            terminators: columns_where(is_terminator),
            still_running: columns_where(is_still_running),
        }
    }
}

/// Resolves the raster columns of the probed neurons on first use and only
/// reads the latest raster row afterwards.
#[derive(Debug, Clone, Default)]
pub struct IndexProbe {
    columns: Option<ProbeColumns>,
}

impl TerminationPolicy for IndexProbe {
    fn is_done(&mut self, _network: &Network, raster: &Raster, t: usize) -> SimResult<bool> {
        require_monitored(raster)?;

        let row = raster.latest_row().ok_or_else(|| {
            SimError::ConfigurationError("raster has no recorded rows".to_string())
        })?;

        let columns = self
            .columns
            .get_or_insert_with(|| ProbeColumns::from_raster(raster));

        let fired = |column: &usize| row.get(*column).copied().unwrap_or(false);

        if columns.terminators.iter().any(fired) {
            return Ok(true);
        }

        Ok(t > 0 && !columns.still_running.iter().any(fired))
    }

    fn name(&self) -> &'static str {
        "index probe"
    }
}
