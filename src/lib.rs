pub mod error;
pub mod monitor;
pub mod network;
pub mod neuron;
pub mod params;
pub mod simulator;
pub mod state_snapshot;
pub mod synapse;
pub mod termination;
pub mod types;
pub mod verify;
