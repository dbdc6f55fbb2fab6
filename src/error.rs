//! Error types.

use std::path::PathBuf;

/// Boxed error returned by external collaborators (renderer, classifier,
/// storage). Propagated to the caller without modification.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reasons a structural mutation is refused.
///
/// Rejection is an expected outcome: callers pick new endpoints and retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    #[error("node {0} does not exist in this genome")]
    UnknownNode(u64),
    #[error("node {0} cannot connect to itself")]
    SelfLoop(u64),
    #[error("node {0} is an input and cannot be a connection target")]
    TargetIsInput(u64),
    #[error("node {0} is an output and cannot be a connection source")]
    SourceIsOutput(u64),
    #[error("connecting {from} -> {to} would close a cycle")]
    WouldCreateCycle { from: u64, to: u64 },
    #[error("no valid endpoint pair found after {attempts} attempts")]
    RetryBudgetExhausted { attempts: usize },
}

/// Fatal errors decoding the genome text encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("genome is missing the '|' between node and connection sections")]
    MissingSection,
    #[error("unknown activation function '{0}'")]
    UnknownActivation(String),
    #[error("{kind} record '{record}' has {found} fields, expected {expected}")]
    FieldCount {
        kind: &'static str,
        record: String,
        found: usize,
        expected: usize,
    },
    #[error("invalid {field} '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("invalid enabled flag '{0}', expected 0 or 1")]
    InvalidFlag(String),
    #[error("node id {0} appears more than once")]
    DuplicateNode(u64),
    #[error("connection innovation {0} appears more than once")]
    DuplicateConnection(u64),
    #[error("connection {innovation} references undeclared node {node}")]
    DanglingReference { innovation: u64, node: u64 },
    #[error("connection {innovation} from node {from} to node {to} violates node roles")]
    InvalidEndpoint { innovation: u64, from: u64, to: u64 },
    #[error("layout node {0} is missing from the encoding")]
    MissingLayoutNode(u64),
    #[error("connection {0} closes a cycle")]
    Cycle(u64),
}

/// Invalid evolution configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("population size must be an even number of at least 2, got {0}")]
    PopulationSize(usize),
    #[error("{name} must lie in [0, 1], got {value}")]
    Probability { name: &'static str, value: f32 },
    #[error("target fitness must lie in (0, 1], got {0}")]
    TargetFitness(f32),
    #[error("weight mutation power must be finite and non-negative, got {0}")]
    MutationPower(f32),
    #[error("image dimensions must be non-zero")]
    ImageSize,
    #[error("at least one output is required")]
    NoOutputs,
    #[error("structural mutation needs at least one attempt")]
    NoAttempts,
    #[error("goal class must not be empty")]
    EmptyGoal,
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Run-level failures of the population loop.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("rendering '{label}' failed")]
    Render {
        label: String,
        #[source]
        source: BoxError,
    },
    #[error("classifying '{}' failed", path.display())]
    Classify {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("classifier returned no score for goal class '{goal}' on '{label}'")]
    MissingGoal { goal: String, label: String },
    #[error("artifact storage failed")]
    Storage(#[source] BoxError),
    #[error("offspring genome could not be decoded")]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("'{0}' has not been rendered")]
    NotRendered(String),
    #[error("'{0}' has not been evaluated")]
    NotEvaluated(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_error_display() {
        let err = MutationError::WouldCreateCycle { from: 7, to: 8 };
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::FieldCount {
            kind: "node",
            record: "1;sigmoid".to_string(),
            found: 2,
            expected: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("1;sigmoid"), "{msg}");
        assert!(msg.contains("expected 3"), "{msg}");
    }
}
