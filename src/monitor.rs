//! Per-step recordings of a run, and reconstruction of a network history from them.
//!
//! Row `t` of a recording holds the state the network reached in step `t`,
//! i.e. history index `t + 1`.
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::network::Network;
use crate::types::NodeId;
use crate::verify::verify_graph_dimensions;

/// Spike raster over a fixed, ordered set of monitored nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Raster {
    targets: Vec<NodeId>,
    target_names: Vec<String>,
    spikes: Vec<Vec<bool>>,
}

impl Raster {
    /// Monitors every node of `network`, in node order.
    pub fn all(network: &Network) -> Self {
        Self {
            targets: (0..network.num_nodes()).collect(),
            target_names: network.nodes().iter().map(|node| node.name.clone()).collect(),
            spikes: Vec::new(),
        }
    }

    pub fn with_targets(network: &Network, names: &[&str]) -> SimResult<Self> {
        let mut targets = Vec::with_capacity(names.len());
        for name in names {
            let node_id = network
                .node_id(name)
                .ok_or_else(|| SimError::NodeNotFound(name.to_string()))?;
            targets.push(node_id);
        }

        Ok(Self {
            targets,
            target_names: names.iter().map(|name| name.to_string()).collect(),
            spikes: Vec::new(),
        })
    }

    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.spikes
    }

    pub fn latest_row(&self) -> Option<&[bool]> {
        self.spikes.last().map(|row| row.as_slice())
    }

    pub fn len(&self) -> usize {
        self.spikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spikes.is_empty()
    }

    /// Appends the spikes of the latest snapshot of every target.
    pub fn record(&mut self, network: &Network) {
        let row = self
            .targets
            .iter()
            .map(|node_id| {
                network
                    .node(*node_id)
                    .and_then(|node| node.latest())
                    .map_or(false, |neuron| neuron.spikes())
            })
            .collect();
        self.spikes.push(row);
    }
}

/// Voltage and current rows over all nodes, in node order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Multimeter {
    pub voltages: Vec<Vec<f64>>,
    pub currents: Vec<Vec<f64>>,
}

impl Multimeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.voltages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voltages.is_empty()
    }

    pub fn record(&mut self, network: &Network) {
        let latest = move || network.nodes().iter().filter_map(|node| node.latest());
        self.voltages.push(latest().map(|neuron| neuron.v()).collect());
        self.currents.push(latest().map(|neuron| neuron.u()).collect());
    }
}

/// Rebuilds the per-timestep history of a network that holds only its initial
/// snapshots from a recorded raster and multimeter covering every node.
pub fn rebuild_history(
    template: &Network,
    raster: &Raster,
    multimeter: &Multimeter,
) -> SimResult<Network> {
    let num_nodes = template.num_nodes();

    if raster.targets().len() != num_nodes {
        return Err(SimError::ConfigurationError(format!(
            "raster monitors {} neurons, the network has {}",
            raster.targets().len(),
            num_nodes
        )));
    }

    let sim_duration = raster.len();
    if multimeter.voltages.len() != sim_duration || multimeter.currents.len() != sim_duration {
        return Err(SimError::InvalidArgument(format!(
            "multimeter has {} voltage and {} current rows, raster has {}",
            multimeter.voltages.len(),
            multimeter.currents.len(),
            sim_duration
        )));
    }

    let mut network = template.clone();
    verify_graph_dimensions(&network, 0)?;

    for t in 0..sim_duration {
        let spike_row = &raster.rows()[t];
        let voltage_row = &multimeter.voltages[t];
        let current_row = &multimeter.currents[t];

        for (column, node_id) in raster.targets().iter().enumerate() {
            let node = &mut network.nodes_mut()[*node_id];
            let (spikes, v, u) = match (
                spike_row.get(column),
                voltage_row.get(column),
                current_row.get(column),
            ) {
                (Some(spikes), Some(v), Some(u)) => (*spikes, *v, *u),
                _ => {
                    return Err(SimError::LengthMismatch {
                        node: node.name.clone(),
                        expected: num_nodes,
                        actual: spike_row.len().min(voltage_row.len()).min(current_row.len()),
                    })
                }
            };

            let mut neuron = node.history[t].clone();
            neuron.set_recorded_state(spikes, v, u);
            node.history.push(neuron);
        }

        verify_graph_dimensions(&network, t + 1)?;
    }

    let metadata = network.metadata_mut();
    metadata.sim_duration = Some(sim_duration);
    metadata.actual_duration = Some(sim_duration);

    Ok(network)
}
