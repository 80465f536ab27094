use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::neuron::LifNeuron;
use crate::state_snapshot::{NeuronState, StateSnapshot, SynapseState};
use crate::synapse::Synapse;
use crate::types::{EdgeId, HashMap, NodeId};

/// A neuron over time: `history[t]` is its snapshot at timestep `t`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub history: Vec<LifNeuron>,
}

impl Node {
    pub fn latest(&self) -> Option<&LifNeuron> {
        self.history.last()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub synapse: Synapse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_redundant: Option<bool>,
    /// Attributes other than the synapse, as found in an imported graph. Must stay empty.
    #[serde(flatten)]
    pub extra_attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub completed_stages: Vec<u32>,
    pub sim_duration: Option<usize>,
    pub actual_duration: Option<usize>,
}

#[derive(Deserialize)]
struct NetworkRecord {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(default)]
    graph: GraphMetadata,
}

/// Directed graph of LIF neurons. Nodes and edges live in arenas and refer to
/// each other by index only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "NetworkRecord")]
pub struct Network {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    graph: GraphMetadata,
    #[serde(skip)]
    node_ids: HashMap<String, NodeId>,
    #[serde(skip)]
    edge_ids: HashMap<(NodeId, NodeId), EdgeId>,
    #[serde(skip)]
    out_edges: Vec<Vec<EdgeId>>,
    #[serde(skip)]
    in_edges: Vec<Vec<EdgeId>>,
}

impl From<NetworkRecord> for Network {
    fn from(record: NetworkRecord) -> Self {
        let mut network = Network {
            out_edges: vec![Vec::new(); record.nodes.len()],
            in_edges: vec![Vec::new(); record.nodes.len()],
            nodes: record.nodes,
            edges: record.edges,
            graph: record.graph,
            node_ids: HashMap::default(),
            edge_ids: HashMap::default(),
        };

        // duplicates are kept as found so the verifier can report them
        for (node_id, node) in network.nodes.iter().enumerate() {
            network.node_ids.entry(node.name.clone()).or_insert(node_id);
        }

        for (edge_id, edge) in network.edges.iter().enumerate() {
            network
                .edge_ids
                .entry((edge.source, edge.target))
                .or_insert(edge_id);
            if let Some(out_edges) = network.out_edges.get_mut(edge.source) {
                out_edges.push(edge_id);
            }
            if let Some(in_edges) = network.in_edges.get_mut(edge.target) {
                in_edges.push(edge_id);
            }
        }

        network
    }
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node holding `neuron` as its `t = 0` snapshot, keyed by the neuron's full name.
    pub fn add_node(&mut self, neuron: LifNeuron) -> SimResult<NodeId> {
        neuron.validate()?;

        let name = neuron.full_name().to_string();
        if self.node_ids.contains_key(&name) {
            return Err(SimError::InvalidGraph(format!(
                "node {} already exists",
                name
            )));
        }

        let node_id = self.nodes.len();
        self.node_ids.insert(name.clone(), node_id);
        self.nodes.push(Node {
            name,
            history: vec![neuron],
        });
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());

        Ok(node_id)
    }

    pub fn add_edge(&mut self, source: &str, target: &str, synapse: Synapse) -> SimResult<EdgeId> {
        let source_id = self.require_node_id(source)?;
        let target_id = self.require_node_id(target)?;

        if self.edge_ids.contains_key(&(source_id, target_id)) {
            return Err(SimError::InvalidGraph(format!(
                "edge ({}, {}) is a duplicate edge",
                source, target
            )));
        }

        let edge_id = self.edges.len();
        self.edges.push(Edge {
            source: source_id,
            target: target_id,
            synapse,
            is_redundant: None,
            extra_attributes: BTreeMap::new(),
        });
        self.edge_ids.insert((source_id, target_id), edge_id);
        self.out_edges[source_id].push(edge_id);
        self.in_edges[target_id].push(edge_id);

        Ok(edge_id)
    }

    pub fn set_redundant(&mut self, source: &str, target: &str, is_redundant: bool) -> SimResult<()> {
        let source_id = self.require_node_id(source)?;
        let target_id = self.require_node_id(target)?;

        let edge_id = self
            .edge_ids
            .get(&(source_id, target_id))
            .copied()
            .ok_or_else(|| {
                SimError::InvalidGraph(format!("edge ({}, {}) does not exist", source, target))
            })?;

        self.edges[edge_id].is_redundant = Some(is_redundant);
        Ok(())
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.node_ids.get(name).copied()
    }

    fn require_node_id(&self, name: &str) -> SimResult<NodeId> {
        self.node_id(name)
            .ok_or_else(|| SimError::NodeNotFound(name.to_string()))
    }

    pub fn history(&self, name: &str) -> SimResult<&[LifNeuron]> {
        let node_id = self.require_node_id(name)?;
        Ok(self.nodes[node_id].history.as_slice())
    }

    pub fn neuron(&self, name: &str, t: usize) -> SimResult<&LifNeuron> {
        let history = self.history(name)?;
        history.get(t).ok_or_else(|| SimError::LengthMismatch {
            node: name.to_string(),
            expected: t + 1,
            actual: history.len(),
        })
    }

    /// Overwrites the threshold of `name` at timestep `t`, e.g. to inject a fault.
    pub fn set_vth(&mut self, name: &str, t: usize, vth: f64) -> SimResult<()> {
        let node_id = self.require_node_id(name)?;
        let node = &mut self.nodes[node_id];
        let actual = node.history.len();

        match node.history.get_mut(t) {
            Some(neuron) => neuron.set_vth(vth),
            None => Err(SimError::LengthMismatch {
                node: name.to_string(),
                expected: t + 1,
                actual,
            }),
        }
    }

    pub fn edge(&self, source: NodeId, target: NodeId) -> Option<&Edge> {
        self.edge_ids
            .get(&(source, target))
            .map(|edge_id| &self.edges[*edge_id])
    }

    pub fn has_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.edge_ids.contains_key(&(source, target))
    }

    /// Whether the pair is connected in both directions.
    pub fn is_bidirectional(&self, a: NodeId, b: NodeId) -> bool {
        self.has_edge(a, b) && self.has_edge(b, a)
    }

    pub fn successors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out_edges
            .get(node_id)
            .into_iter()
            .flatten()
            .map(|edge_id| self.edges[*edge_id].target)
    }

    pub fn predecessors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.in_edges
            .get(node_id)
            .into_iter()
            .flatten()
            .map(|edge_id| self.edges[*edge_id].source)
    }

    /// Successors followed by predecessors. A neighbour connected both ways appears twice.
    pub fn all_neighbors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.successors(node_id).chain(self.predecessors(node_id))
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.graph
    }

    pub fn metadata_mut(&mut self) -> &mut GraphMetadata {
        &mut self.graph
    }

    /// Gives the simulator disjoint access to the node and edge arenas.
    pub(crate) fn split_for_step(&mut self) -> (&mut [Node], &mut [Edge], &[Vec<EdgeId>]) {
        (
            self.nodes.as_mut_slice(),
            self.edges.as_mut_slice(),
            self.out_edges.as_slice(),
        )
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        self.nodes.as_mut_slice()
    }

    pub fn state_snapshot(&self, t: usize) -> SimResult<StateSnapshot> {
        let mut neuron_states = Vec::with_capacity(self.nodes.len());

        for node in &self.nodes {
            let neuron = node.history.get(t).ok_or_else(|| SimError::LengthMismatch {
                node: node.name.clone(),
                expected: t + 1,
                actual: node.history.len(),
            })?;

            neuron_states.push(NeuronState {
                name: node.name.clone(),
                current: neuron.u(),
                voltage: neuron.v(),
                spikes: neuron.spikes(),
                a_in: neuron.a_in(),
            });
        }

        let node_name = |node_id: NodeId| {
            self.nodes
                .get(node_id)
                .map_or_else(|| format!("#{}", node_id), |node| node.name.clone())
        };

        let synapse_states = self
            .edges
            .iter()
            .map(|edge| SynapseState {
                pre_syn_name: node_name(edge.source),
                post_syn_name: node_name(edge.target),
                weight: edge.synapse.weight,
            })
            .collect();

        Ok(StateSnapshot {
            t,
            neuron_states,
            synapse_states,
        })
    }

    /// Human readable table of the neuron properties at `t`: parameters if
    /// `static_props`, current and voltage otherwise.
    pub fn neuron_properties_table(&self, t: usize, static_props: bool) -> String {
        let properties: &[Property] = if static_props {
            &[Property::Du, Property::Dv, Property::Bias, Property::Vth]
        } else {
            &[Property::U, Property::V]
        };

        let header = self
            .nodes
            .iter()
            .map(|node| format!("{:<12}", node.name))
            .join(" ");

        let rows = properties.iter().map(|property| {
            self.nodes
                .iter()
                .map(|node| {
                    let cell = match node.history.get(t) {
                        Some(neuron) => format!("{}={:.2}", property.label(), property.of(neuron)),
                        None => format!("{}=-", property.label()),
                    };
                    format!("{:<12}", cell)
                })
                .join(" ")
        });

        let mut table = std::iter::once(header).chain(rows).join("\n");
        table.push('\n');
        table
    }
}

#[derive(Debug, Clone, Copy)]
enum Property {
    Du,
    Dv,
    Bias,
    Vth,
    U,
    V,
}

impl Property {
    fn label(self) -> &'static str {
        match self {
            Property::Du => "du",
            Property::Dv => "dv",
            Property::Bias => "bias",
            Property::Vth => "vth",
            Property::U => "u",
            Property::V => "v",
        }
    }

    fn of(self, neuron: &LifNeuron) -> f64 {
        match self {
            Property::Du => neuron.du(),
            Property::Dv => neuron.dv(),
            Property::Bias => neuron.bias(),
            Property::Vth => neuron.vth(),
            Property::U => neuron.u(),
            Property::V => neuron.v(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::assert_equal;

    fn neuron(name: &str) -> LifNeuron {
        LifNeuron::new(name, 0.0, 0.0, 0.0, 1.0).unwrap()
    }

    fn triangle() -> Network {
        let mut network = Network::new();
        for name in ["a", "b", "c"] {
            network.add_node(neuron(name)).unwrap();
        }
        network
            .add_edge("a", "b", Synapse::new(1.0, 0, 0.0).unwrap())
            .unwrap();
        network
            .add_edge("b", "a", Synapse::new(1.0, 0, 0.0).unwrap())
            .unwrap();
        network
            .add_edge("b", "c", Synapse::new(-1.0, 0, 0.0).unwrap())
            .unwrap();
        network
    }

    #[test]
    fn topology_queries() {
        let network = triangle();
        let a = network.node_id("a").unwrap();
        let b = network.node_id("b").unwrap();
        let c = network.node_id("c").unwrap();

        assert_eq!(network.num_nodes(), 3);
        assert_eq!(network.num_edges(), 3);
        assert_equal(network.successors(b), [a, c]);
        assert_equal(network.predecessors(b), [a]);
        assert_equal(network.all_neighbors(a), [b, b]);
        assert!(network.has_edge(b, c));
        assert!(!network.has_edge(c, b));
        assert!(network.is_bidirectional(a, b));
        assert!(!network.is_bidirectional(b, c));
        assert_eq!(network.edge(b, c).unwrap().synapse.weight, -1.0);
        assert!(network.edge(c, a).is_none());
    }

    #[test]
    fn duplicate_edge_rejected() {
        let mut network = triangle();
        let result = network.add_edge("a", "b", Synapse::new(2.0, 0, 0.0).unwrap());
        assert_eq!(
            result.unwrap_err(),
            SimError::InvalidGraph("edge (a, b) is a duplicate edge".to_string())
        );
        assert_eq!(network.num_edges(), 3);
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut network = triangle();
        assert!(matches!(
            network.add_node(neuron("c")),
            Err(SimError::InvalidGraph(_))
        ));
    }

    #[test]
    fn edge_to_unknown_node() {
        let mut network = triangle();
        let result = network.add_edge("a", "z", Synapse::new(1.0, 0, 0.0).unwrap());
        assert_eq!(result.unwrap_err(), SimError::NodeNotFound("z".to_string()));
    }

    #[test]
    fn set_redundant() {
        let mut network = triangle();
        network.set_redundant("b", "c", true).unwrap();
        let b = network.node_id("b").unwrap();
        let c = network.node_id("c").unwrap();
        assert_eq!(network.edge(b, c).unwrap().is_redundant, Some(true));
        assert!(network.set_redundant("c", "b", true).is_err());
    }

    #[test]
    fn set_vth_out_of_range() {
        let mut network = triangle();
        network.set_vth("a", 0, 2.5).unwrap();
        assert_eq!(network.neuron("a", 0).unwrap().vth(), 2.5);
        assert!(matches!(
            network.set_vth("a", 1, 2.5),
            Err(SimError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn json_round_trip_rebuilds_indices() {
        let mut network = triangle();
        network.metadata_mut().completed_stages = vec![1, 2];

        let json = serde_json::to_string(&network).unwrap();
        let restored: Network = serde_json::from_str(&json).unwrap();

        let a = restored.node_id("a").unwrap();
        let b = restored.node_id("b").unwrap();
        assert!(restored.is_bidirectional(a, b));
        assert_eq!(restored.metadata().completed_stages, vec![1, 2]);
        assert!(restored
            .edges()
            .iter()
            .all(|edge| edge.extra_attributes.is_empty()));
    }

    #[test]
    fn unknown_edge_attributes_are_captured() {
        let json = r#"{
            "nodes": [
                {"name": "a", "history": []},
                {"name": "b", "history": []}
            ],
            "edges": [
                {"source": 0, "target": 1,
                 "synapse": {"weight": 1.0, "delay": 0, "change_per_t": 0.0},
                 "weight": 3}
            ]
        }"#;

        let network: Network = serde_json::from_str(json).unwrap();
        assert_eq!(
            network.edges()[0].extra_attributes.keys().collect::<Vec<_>>(),
            vec!["weight"]
        );
        assert_eq!(network.metadata(), &GraphMetadata::default());
    }

    #[test]
    fn properties_table() {
        let network = triangle();
        let table = network.neuron_properties_table(0, true);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("a "));
        assert!(lines[4].starts_with("vth=1.00"));

        let table = network.neuron_properties_table(3, false);
        assert!(table.lines().nth(1).unwrap().starts_with("u=-"));
    }

    #[test]
    fn properties_table_dynamic_state() {
        let network = triangle();
        let table = network.neuron_properties_table(0, false);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].split_whitespace().collect::<Vec<_>>(), ["u=0.00"; 3]);
        assert_eq!(lines[2].split_whitespace().collect::<Vec<_>>(), ["v=0.00"; 3]);
        assert!(table.ends_with('\n'));
    }

    #[test]
    fn snapshot_of_initial_state() {
        let network = triangle();
        let snapshot = network.state_snapshot(0).unwrap();
        assert_eq!(snapshot.neuron_states.len(), 3);
        assert_eq!(snapshot.synapse_states[2].pre_syn_name, "b");
        assert_eq!(snapshot.synapse_states[2].post_syn_name, "c");
        assert!(network.state_snapshot(1).is_err());
    }
}
