use log::{debug, info, trace, warn};

use crate::error::{SimError, SimResult};
use crate::monitor::{Multimeter, Raster};
use crate::network::Network;
use crate::params::{self, RunConfig};
use crate::termination::{self, TerminationPolicy};
use crate::types::NodeId;
use crate::verify;

/// The run must last at least this many steps to produce any signal.
pub const MIN_ACTUAL_DURATION: usize = 2;

pub fn create_simulator(network: Network, run_config: RunConfig) -> SimResult<Simulator> {
    let policy = termination::policy_for(&run_config)?;
    Simulator::with_policy(network, run_config, policy)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Idle,
    Running,
    Converged,
    MaxStepsReached,
    Failed,
}

#[derive(Debug, Clone)]
struct TickResult {
    t: usize,
    spiking_nids: Vec<NodeId>,
    synaptic_transmission_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub state: SimState,
    pub actual_duration: usize,
    pub spike_count: usize,
    pub synaptic_transmission_count: usize,
}

pub struct Simulator {
    network: Network,
    run_config: RunConfig,
    policy: Box<dyn TerminationPolicy>,
    raster: Raster,
    multimeter: Multimeter,
    state: SimState,
    tick_period: usize,
}

impl Simulator {
    pub fn with_policy(
        network: Network,
        run_config: RunConfig,
        policy: Box<dyn TerminationPolicy>,
    ) -> SimResult<Self> {
        params::validate_run_config(&run_config)
            .map_err(|e| SimError::InvalidArgument(format!("invalid run config: {}", e)))?;

        Ok(Self {
            raster: Raster::all(&network),
            multimeter: Multimeter::new(),
            network,
            run_config,
            policy,
            state: SimState::Idle,
            tick_period: 0,
        })
    }

    /// Restricts the termination probes to the named neurons.
    pub fn with_monitored(mut self, names: &[&str]) -> SimResult<Self> {
        self.raster = Raster::with_targets(&self.network, names)?;
        Ok(self)
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn multimeter(&self) -> &Multimeter {
        &self.multimeter
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    pub fn get_tick_period(&self) -> usize {
        self.tick_period
    }

    /// Hands the network over to exporters. Only complete after a terminal state.
    pub fn into_network(self) -> Network {
        self.network
    }

    /// Runs until the termination policy fires or `sim_duration` steps have been simulated.
    pub fn run(&mut self) -> SimResult<RunResult> {
        if self.state != SimState::Idle {
            return Err(SimError::ConfigurationError(format!(
                "simulator is in state {:?}, expected Idle",
                self.state
            )));
        }

        self.state = SimState::Running;
        let result = self.run_steps();

        match &result {
            Ok(run_result) => self.state = run_result.state,
            Err(e) => {
                warn!("simulation failed at t={}: {}", self.tick_period, e);
                self.state = SimState::Failed;
            }
        }

        result
    }

    fn run_steps(&mut self) -> SimResult<RunResult> {
        let sim_duration = self.run_config.sim_duration;

        info!(
            "simulating {} neurons and {} synapses for at most {} steps using the {}",
            self.network.num_nodes(),
            self.network.num_edges(),
            sim_duration,
            self.policy.name()
        );
        debug!(
            "initial neuron properties:\n{}",
            self.network.neuron_properties_table(0, true)
        );

        verify::verify_graph_dimensions(&self.network, self.tick_period)?;

        let mut converged_at = None;
        let mut spike_count = 0;
        let mut synaptic_transmission_count = 0;

        for _ in 0..sim_duration {
            let tick_result = self.tick()?;
            spike_count += tick_result.spiking_nids.len();
            synaptic_transmission_count += tick_result.synaptic_transmission_count;

            if self.policy.is_done(&self.network, &self.raster, tick_result.t)? {
                converged_at = Some(tick_result.t + 1);
                break;
            }
        }

        let (state, actual_duration) = match converged_at {
            Some(actual_duration) => {
                info!("converged after {} steps", actual_duration);
                (SimState::Converged, actual_duration)
            }
            None => {
                warn!(
                    "termination policy did not fire within {} steps",
                    sim_duration
                );
                (SimState::MaxStepsReached, sim_duration)
            }
        };

        let metadata = self.network.metadata_mut();
        metadata.sim_duration = Some(actual_duration);
        metadata.actual_duration = Some(actual_duration);

        verify::verify_graph_dimensions(&self.network, actual_duration)?;

        if actual_duration < MIN_ACTUAL_DURATION {
            return Err(SimError::ConvergenceFailure {
                sim_duration,
                actual_duration,
            });
        }

        Ok(RunResult {
            state,
            actual_duration,
            spike_count,
            synaptic_transmission_count,
        })
    }

    /// Simulates one step: verify `t`, copy to `t + 1`, verify `t + 1`, update `t + 1`.
    fn tick(&mut self) -> SimResult<TickResult> {
        if self.state != SimState::Running {
            return Err(SimError::ConfigurationError(format!(
                "cannot tick in state {:?}, expected Running",
                self.state
            )));
        }

        let t = self.tick_period;

        verify::verify_snn_spec(&self.network, t)?;
        create_neuron_for_next_timestep(&mut self.network, t)?;
        verify::verify_snn_spec(&self.network, t + 1)?;

        let tick_result = run_network_for_1_timestep(&mut self.network, t + 1);

        debug!(
            "t={}: {} neurons spiked, {} synaptic transmissions",
            t,
            tick_result.spiking_nids.len(),
            tick_result.synaptic_transmission_count
        );
        for nid in &tick_result.spiking_nids {
            if let Some(node) = self.network.node(*nid) {
                trace!("t={}: {} spiked", t, node.name);
            }
        }

        self.raster.record(&self.network);
        self.multimeter.record(&self.network);
        self.tick_period += 1;

        Ok(TickResult {
            t,
            ..tick_result
        })
    }
}

fn create_neuron_for_next_timestep(network: &mut Network, t: usize) -> SimResult<()> {
    for node in network.nodes_mut() {
        let next = node.history[t].clone();
        node.history.push(next);
    }

    verify::verify_graph_dimensions(network, t + 1)
}

/// Updates every neuron at history index `t` and routes the resulting spikes
/// into the `a_in_next` of their targets.
fn run_network_for_1_timestep(network: &mut Network, t: usize) -> TickResult {
    let (nodes, edges, out_edges) = network.split_for_step();

    let mut spiking_nids = Vec::new();
    for (nid, node) in nodes.iter_mut().enumerate() {
        let neuron = &mut node.history[t];
        neuron.clear_input_next();
        let a_in = neuron.a_in();
        if neuron.advance(a_in) {
            spiking_nids.push(nid);
        }
    }

    let mut synaptic_transmission_count = 0;
    for nid in &spiking_nids {
        for edge_id in &out_edges[*nid] {
            let edge = &mut edges[*edge_id];
            let current = edge.synapse.transmit();
            nodes[edge.target].history[t].add_input_next(current);
            synaptic_transmission_count += 1;
        }
    }

    for node in nodes.iter_mut() {
        node.history[t].swap_input();
    }

    TickResult {
        t,
        spiking_nids,
        synaptic_transmission_count,
    }
}
