use lifsim::{network::Network, neuron::LifNeuron, params::RunConfig, synapse::Synapse};
use rand::{distributions::Uniform, prelude::Distribution, rngs::StdRng, Rng, SeedableRng};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioParams {
    pub run_config: RunConfig,
    pub num_nodes: usize,
    pub connect_density: f64,
    pub seed: u64,
}

pub fn get_scenario_params() -> ScenarioParams {
    let params_yaml_str = r#"
run_config:
  algorithm:
    MDSA:
      m_val: 0
  sim_duration: 50
  termination_probe: IndexProbe
num_nodes: 400
connect_density: 0.05
seed: 0
"#;

    serde_yaml::from_str(params_yaml_str).unwrap()
}

/// Builds a degree-counting network over a random graph: every node spikes
/// once, its neighbours' receivers count the spike, and each receiver that
/// fires silences its selector. The terminator fires once all receivers did.
pub fn build_network(params: &ScenarioParams, seed_offset: u64) -> Network {
    let mut rng = StdRng::seed_from_u64(params.seed + seed_offset);
    let weight_dist = Uniform::new(0.1, 1.0);
    let vth_dist = Uniform::new(0.0, 0.9);
    let n = params.num_nodes;

    let mut network = Network::new();

    for i in 0..n {
        network
            .add_node(LifNeuron::new(format!("spike_once_{}", i), 2.0, 0.0, 0.0, 1.0).unwrap())
            .unwrap();
        network
            .add_node(
                LifNeuron::new(
                    format!("degree_receiver_{}", i),
                    0.0,
                    1.0,
                    1.0,
                    vth_dist.sample(&mut rng),
                )
                .unwrap(),
            )
            .unwrap();
        network
            .add_node(LifNeuron::new(format!("selector_{}", i), 5.0, 0.0, 1.0, 4.0).unwrap())
            .unwrap();
    }

    network
        .add_node(LifNeuron::new("terminator_node", 0.0, 1.0, 1.0, n as f64 - 0.5).unwrap())
        .unwrap();

    for i in 0..n {
        let spike_once = format!("spike_once_{}", i);
        let receiver = format!("degree_receiver_{}", i);

        network
            .add_edge(&spike_once, &spike_once, Synapse::new(-2.0, 0, 0.0).unwrap())
            .unwrap();
        network
            .add_edge(&spike_once, &receiver, Synapse::new(1.0, 0, 0.0).unwrap())
            .unwrap();
        network
            .add_edge(&receiver, &format!("selector_{}", i), Synapse::new(-10.0, 0, 0.0).unwrap())
            .unwrap();
        network
            .add_edge(&receiver, "terminator_node", Synapse::new(1.0, 0, 0.0).unwrap())
            .unwrap();

        for j in 0..n {
            if j != i && rng.gen_bool(params.connect_density) {
                network
                    .add_edge(
                        &spike_once,
                        &format!("degree_receiver_{}", j),
                        Synapse::new(weight_dist.sample(&mut rng), 0, 0.0).unwrap(),
                    )
                    .unwrap();
            }
        }
    }

    network
}
