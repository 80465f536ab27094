//! Error types of the simulation engine.
use thiserror::Error;

/// Every error aborts the current run; none of them is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A value does not have its required numeric or record shape.
    #[error("Type mismatch for {subject}: expected {expected}, got {actual}")]
    TypeMismatch {
        subject: String,
        expected: String,
        actual: String,
    },
    /// A constructor invariant is violated, e.g. a negative delay.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Identifier positions are not a permutation of `0..n`.
    #[error("Invalid identifiers for {name}: positions {positions:?} are not consecutive from 0")]
    InvalidIdentifiers { name: String, positions: Vec<usize> },
    /// Duplicate edge, malformed edge attributes, dangling endpoint.
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),
    /// A node history does not have the expected number of snapshots.
    #[error("Neuron {node} has a history of length {actual}, expected {expected}")]
    LengthMismatch {
        node: String,
        expected: usize,
        actual: usize,
    },
    /// The run is set up in a way the termination policy cannot work with.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    /// The termination policy was requested for an unknown algorithm.
    #[error("Unsupported algorithm: {0:?}, only MDSA is supported")]
    UnsupportedAlgorithm(Vec<String>),
    /// The run halted before the algorithm could produce any signal.
    #[error("Unable to determine why the algorithm did not complete: sim_duration={sim_duration}, actual_duration={actual_duration}")]
    ConvergenceFailure {
        sim_duration: usize,
        actual_duration: usize,
    },
    /// A node name was not found in the network.
    #[error("Neuron {0} not found in the network")]
    NodeNotFound(String),
}

pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_subject() {
        let err = SimError::LengthMismatch {
            node: "selector_0".to_string(),
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Neuron selector_0 has a history of length 3, expected 4"
        );

        let err = SimError::TypeMismatch {
            subject: "bias of spike_once".to_string(),
            expected: "finite f64".to_string(),
            actual: "NaN".to_string(),
        };
        assert!(err.to_string().contains("spike_once"));
        assert!(err.to_string().contains("NaN"));
    }

    #[test]
    fn messages_of_tuple_variants() {
        assert_eq!(
            SimError::UnsupportedAlgorithm(vec!["LIC".to_string()]).to_string(),
            "Unsupported algorithm: [\"LIC\"], only MDSA is supported"
        );
        assert_eq!(
            SimError::InvalidIdentifiers {
                name: "degree_receiver".to_string(),
                positions: vec![0, 2],
            }
            .to_string(),
            "Invalid identifiers for degree_receiver: positions [0, 2] are not consecutive from 0"
        );
        assert_eq!(
            SimError::ConvergenceFailure {
                sim_duration: 1,
                actual_duration: 1,
            }
            .to_string(),
            "Unable to determine why the algorithm did not complete: sim_duration=1, actual_duration=1"
        );

        let err: Box<dyn std::error::Error> = Box::new(SimError::NodeNotFound("a".to_string()));
        assert_eq!(err.to_string(), "Neuron a not found in the network");
    }
}
