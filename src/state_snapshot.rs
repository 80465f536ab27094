use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub t: usize,
    pub neuron_states: Vec<NeuronState>,
    pub synapse_states: Vec<SynapseState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuronState {
    pub name: String,
    pub current: f64,
    pub voltage: f64,
    pub spikes: bool,
    pub a_in: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynapseState {
    pub pre_syn_name: String,
    pub post_syn_name: String,
    pub weight: f64,
}
