use std::time::{Duration, Instant};

use lifsim::simulator;

#[path = "../scenario_params.rs"]
mod scenario_params;

fn main() {
    let params = scenario_params::get_scenario_params();
    let num_runs = 20;

    let mut step_count = 0usize;
    let mut spike_count = 0usize;
    let mut synaptic_transmission_count = 0usize;
    let mut checksum = 0;
    let mut wall_time = Duration::ZERO;

    for run in 0..num_runs {
        let network = scenario_params::build_network(&params, run);
        let mut simulator =
            simulator::create_simulator(network, params.run_config.clone()).unwrap();

        let wall_start = Instant::now();
        let run_result = simulator.run().unwrap();
        wall_time += wall_start.elapsed();

        step_count += run_result.actual_duration;
        spike_count += run_result.spike_count;
        synaptic_transmission_count += run_result.synaptic_transmission_count;

        for row in simulator.raster().rows() {
            checksum += row.iter().filter(|spikes| **spikes).count();
        }
    }

    let synaptic_transm_proc_throughput =
        synaptic_transmission_count as f64 / wall_time.as_secs_f64();

    eprintln!("Steps per run: {}", step_count as f64 / num_runs as f64);
    eprintln!("Spikes per step: {}", spike_count as f64 / step_count as f64);
    eprintln!(
        "Synaptic transmission processing throughput: {:.3e} ({:.3} ns per transmission)",
        synaptic_transm_proc_throughput,
        1e9 / synaptic_transm_proc_throughput
    );
    eprintln!("Checksum: {}", checksum);
}
