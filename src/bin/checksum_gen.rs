use lifsim::simulator;

#[path = "../scenario_params.rs"]
mod scenario_params;

fn main() {
    let params = scenario_params::get_scenario_params();
    let network = scenario_params::build_network(&params, 0);
    let mut simulator = simulator::create_simulator(network, params.run_config.clone()).unwrap();

    let run_result = simulator.run().unwrap();

    let mut neuron_checksum = 0;
    for (t, row) in simulator.raster().rows().iter().enumerate() {
        for (column, spikes) in row.iter().enumerate() {
            if *spikes {
                neuron_checksum += t * column;
            }
        }
    }

    println!("run result:");
    println!("...state: {:?}", run_result.state);
    println!("...actual duration: {}", run_result.actual_duration);
    println!("...neuron checksum: {}", neuron_checksum);
    println!(
        "...synaptic transmission count: {}",
        run_result.synaptic_transmission_count
    );

    let state_snapshot = simulator
        .network()
        .state_snapshot(run_result.actual_duration)
        .unwrap();

    let voltage_checksum: f64 = state_snapshot
        .neuron_states
        .iter()
        .map(|neuron_state| neuron_state.voltage)
        .sum();

    let syn_state_checksum: f64 = state_snapshot
        .synapse_states
        .iter()
        .map(|syn_state| syn_state.weight)
        .sum();

    println!("final snapshot:");
    println!("...voltages checksum: {}", voltage_checksum);
    println!("...synapse states checksum: {}", syn_state_checksum);
    println!(
        "...graph metadata: {}",
        serde_json::to_string(simulator.network().metadata()).unwrap()
    );

    let json = serde_json::to_string_pretty(&state_snapshot.neuron_states).unwrap();
    println!("final neuron states:\n{}", json);
}
