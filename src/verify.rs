//! Structural checks on a network. None of them mutate it.
use itertools::Itertools;

use crate::error::{SimError, SimResult};
use crate::network::{Edge, Network};
use crate::types::HashSet;

/// Checks the snapshots at `t` and every edge.
pub fn verify_snn_spec(network: &Network, t: usize) -> SimResult<()> {
    verify_neurons_at(network, t)?;
    assert_no_duplicate_nodes(network)?;

    for edge in network.edges() {
        verify_edge(network, edge)?;
    }

    assert_no_duplicate_edges(network)
}

pub fn verify_neurons_at(network: &Network, t: usize) -> SimResult<()> {
    for node in network.nodes() {
        match node.history.get(t) {
            Some(neuron) => {
                neuron.validate()?;
                if neuron.full_name() != node.name {
                    return Err(SimError::InvalidGraph(format!(
                        "node {} holds neuron {} at t={}",
                        node.name,
                        neuron.full_name(),
                        t
                    )));
                }
            }
            None => {
                return Err(SimError::TypeMismatch {
                    subject: format!("neuron {} at t={}", node.name, t),
                    expected: "LifNeuron".to_string(),
                    actual: format!("no snapshot, history has length {}", node.history.len()),
                })
            }
        }
    }

    Ok(())
}

pub fn verify_edge(network: &Network, edge: &Edge) -> SimResult<()> {
    let edge_name = edge_name(network, edge);

    if network.node(edge.source).is_none() || network.node(edge.target).is_none() {
        return Err(SimError::InvalidGraph(format!(
            "edge {} refers to a node that does not exist, the network has {} nodes",
            edge_name,
            network.num_nodes()
        )));
    }

    if !edge.extra_attributes.is_empty() {
        let mut keys = vec!["synapse"];
        if edge.is_redundant.is_some() {
            keys.push("is_redundant");
        }
        keys.extend(edge.extra_attributes.keys().map(String::as_str));

        return Err(SimError::InvalidGraph(format!(
            "edge {} has attributes [{}], expected [synapse] or [synapse, is_redundant]",
            edge_name,
            keys.iter().join(", ")
        )));
    }

    if !edge.synapse.is_well_typed() {
        return Err(SimError::InvalidGraph(format!(
            "synapse of edge {} is not well typed: {:?}",
            edge_name, edge.synapse
        )));
    }

    Ok(())
}

pub fn assert_no_duplicate_edges(network: &Network) -> SimResult<()> {
    let mut visited = HashSet::default();

    for edge in network.edges() {
        if !visited.insert((edge.source, edge.target)) {
            return Err(SimError::InvalidGraph(format!(
                "edge {} is a duplicate edge",
                edge_name(network, edge)
            )));
        }
    }

    Ok(())
}

pub fn assert_no_duplicate_nodes(network: &Network) -> SimResult<()> {
    let mut visited = HashSet::default();

    for node in network.nodes() {
        if !visited.insert(node.name.as_str()) {
            return Err(SimError::InvalidGraph(format!(
                "node {} is a duplicate node",
                node.name
            )));
        }
    }

    Ok(())
}

/// Every node must hold one snapshot per simulated step plus the initial one.
pub fn verify_graph_dimensions(network: &Network, duration: usize) -> SimResult<()> {
    for node in network.nodes() {
        if node.history.len() != duration + 1 {
            return Err(SimError::LengthMismatch {
                node: node.name.clone(),
                expected: duration + 1,
                actual: node.history.len(),
            });
        }
    }

    Ok(())
}

fn edge_name(network: &Network, edge: &Edge) -> String {
    let name = |node_id| {
        network
            .node(node_id)
            .map_or_else(|| format!("#{}", node_id), |node| node.name.clone())
    };
    format!("({}, {})", name(edge.source), name(edge.target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neuron::LifNeuron;
    use crate::synapse::Synapse;

    fn network() -> Network {
        let mut network = Network::new();
        network
            .add_node(LifNeuron::new("a", 0.0, 0.0, 0.0, 1.0).unwrap())
            .unwrap();
        network
            .add_node(LifNeuron::new("b", 0.0, 0.0, 0.0, 1.0).unwrap())
            .unwrap();
        network
            .add_edge("a", "b", Synapse::new(1.0, 0, 0.0).unwrap())
            .unwrap();
        network.set_redundant("a", "b", false).unwrap();
        network
    }

    fn from_json(json: &str) -> Network {
        serde_json::from_str(json).unwrap()
    }

    const NEURON: &str = r#"{"name": "a", "identifiers": null, "full_name": "a", "pos": null,
        "bias": 0.0, "du": 0.0, "dv": 0.0, "vth": 1.0, "u": 0.0, "v": 0.0,
        "spikes": false, "a_in": 0.0, "a_in_next": 0.0}"#;

    #[test]
    fn valid_network() {
        let network = network();
        assert!(verify_snn_spec(&network, 0).is_ok());
        assert!(verify_graph_dimensions(&network, 0).is_ok());
    }

    #[test]
    fn missing_snapshot() {
        let network = network();
        let result = verify_snn_spec(&network, 1);
        assert!(matches!(result, Err(SimError::TypeMismatch { .. })));
        assert!(result.unwrap_err().to_string().contains("neuron a at t=1"));
    }

    #[test]
    fn wrong_dimensions() {
        let network = network();
        assert_eq!(
            verify_graph_dimensions(&network, 2).unwrap_err(),
            SimError::LengthMismatch {
                node: "a".to_string(),
                expected: 3,
                actual: 1,
            }
        );
    }

    #[test]
    fn duplicate_edges_in_imported_graph() {
        let json = format!(
            r#"{{"nodes": [{{"name": "a", "history": [{neuron}]}}],
                "edges": [
                  {{"source": 0, "target": 0, "synapse": {{"weight": 1.0, "delay": 0, "change_per_t": 0.0}}}},
                  {{"source": 0, "target": 0, "synapse": {{"weight": 2.0, "delay": 0, "change_per_t": 0.0}}}}
                ]}}"#,
            neuron = NEURON
        );

        let network = from_json(&json);
        assert_eq!(
            assert_no_duplicate_edges(&network).unwrap_err(),
            SimError::InvalidGraph("edge (a, a) is a duplicate edge".to_string())
        );
        assert!(verify_snn_spec(&network, 0).is_err());
    }

    #[test]
    fn extra_edge_attribute() {
        let json = format!(
            r#"{{"nodes": [{{"name": "a", "history": [{neuron}]}}],
                "edges": [
                  {{"source": 0, "target": 0, "is_redundant": true, "weight": 1,
                    "synapse": {{"weight": 1.0, "delay": 0, "change_per_t": 0.0}}}}
                ]}}"#,
            neuron = NEURON
        );

        let network = from_json(&json);
        assert_eq!(
            verify_snn_spec(&network, 0).unwrap_err(),
            SimError::InvalidGraph(
                "edge (a, a) has attributes [synapse, is_redundant, weight], expected [synapse] or [synapse, is_redundant]"
                    .to_string()
            )
        );
    }

    #[test]
    fn dangling_edge() {
        let json = format!(
            r#"{{"nodes": [{{"name": "a", "history": [{neuron}]}}],
                "edges": [
                  {{"source": 0, "target": 3,
                    "synapse": {{"weight": 1.0, "delay": 0, "change_per_t": 0.0}}}}
                ]}}"#,
            neuron = NEURON
        );

        let network = from_json(&json);
        let result = verify_snn_spec(&network, 0);
        assert!(result.unwrap_err().to_string().contains("(a, #3)"));
    }

    #[test]
    fn ill_typed_synapse() {
        let mut network = network();
        network
            .add_edge("b", "a", Synapse::new(0.0, 0, f64::INFINITY).unwrap())
            .unwrap();
        assert!(matches!(
            verify_snn_spec(&network, 0),
            Err(SimError::InvalidGraph(_))
        ));
    }

    #[test]
    fn duplicate_node_in_imported_graph() {
        let json = format!(
            r#"{{"nodes": [{{"name": "a", "history": [{neuron}]}}, {{"name": "a", "history": [{neuron}]}}],
                "edges": []}}"#,
            neuron = NEURON
        );

        let network = from_json(&json);
        assert_eq!(
            verify_snn_spec(&network, 0).unwrap_err(),
            SimError::InvalidGraph("node a is a duplicate node".to_string())
        );
    }

    #[test]
    fn node_name_differs_from_neuron() {
        let json = format!(
            r#"{{"nodes": [{{"name": "selector_0", "history": [{neuron}]}}],
                "edges": []}}"#,
            neuron = NEURON
        );

        let network = from_json(&json);
        assert_eq!(
            verify_snn_spec(&network, 0).unwrap_err(),
            SimError::InvalidGraph("node selector_0 holds neuron a at t=0".to_string())
        );
    }

    #[test]
    fn ill_typed_neuron_in_imported_graph() {
        let yaml = serde_yaml::to_string(&network())
            .unwrap()
            .replacen("vth: 1.0", "vth: .nan", 1);
        let network: Network = serde_yaml::from_str(&yaml).unwrap();

        let result = verify_snn_spec(&network, 0);
        assert!(matches!(result, Err(SimError::TypeMismatch { .. })));
        assert!(result.unwrap_err().to_string().contains("vth of neuron a"));
    }
}
