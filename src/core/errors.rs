//! Error types for the export pipeline.
//!
//! Configuration-shape problems (unsupported metric, unrecognized
//! architecture) and structural graph problems (empty target set, unknown
//! target variable) are fatal and abort the whole export. A feed variable
//! that disappears during pruning is not an error at all; the pruner logs it
//! and moves on, because such variables are expected pass-through inputs.

use thiserror::Error;

/// Convenient result alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Enum representing the errors that can occur during an export run.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The configured metric kind is outside the supported set.
    #[error("metric only supports COCO, VOC, WIDERFACE, but received {metric}")]
    UnsupportedMetric {
        /// The metric string found in the configuration.
        metric: String,
    },

    /// No entry of the min-subgraph-size table matches the architecture name.
    #[error("no min_subgraph_size entry matches architecture '{architecture}'")]
    UnrecognizedArchitecture {
        /// The full architecture name from the configuration.
        architecture: String,
    },

    /// The graph pruner was invoked with no target variables.
    #[error("cannot prune graph: the target variable set is empty")]
    EmptyTargetSet,

    /// A requested target variable does not exist in the graph.
    #[error("target variable '{name}' does not exist in the graph")]
    MissingTargetVariable {
        /// Name of the missing target variable.
        name: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// YAML (de)serialization error.
    #[error("yaml")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization error.
    #[error("json")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Creates an ExportError for a configuration problem.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates an ExportError for invalid input data.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
