//! # detexport
//!
//! Exports a trained object-detection model into a deployable inference
//! bundle: a pruned computation graph, its parameter blob, and a declarative
//! preprocessing/metadata descriptor (`infer_cfg.yml`) consumed by a separate
//! inference engine.
//!
//! The export pipeline has two halves:
//!
//! - translating the training-time data-reading configuration into an ordered
//!   inference-time preprocessing pipeline, and
//! - pruning the training computation graph down to the minimal subgraph that
//!   produces the requested outputs, while dropping feed variables that only
//!   matter to post-processing outside the graph.
//!
//! Model architecture definition, training, and graph execution are external
//! collaborators; this crate only transforms configuration and graph
//! structure into a self-describing bundle.
//!
//! ## Modules
//!
//! * [`core`] - Error handling and shared plumbing
//! * [`config`] - Typed view of the training configuration document
//! * [`categories`] - Metric-specific label-id resolution
//! * [`preprocess`] - Training-transform to inference-step translation
//! * [`graph`] - Computation-graph snapshots and pruning
//! * [`infer_cfg`] - Inference descriptor assembly
//! * [`export`] - Export orchestration and artifact serialization
//! * [`utils`] - Logging setup and small helpers

pub mod categories;
pub mod config;
pub mod core;
pub mod export;
pub mod graph;
pub mod infer_cfg;
pub mod preprocess;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error handling
    pub use crate::core::{ExportError, ExportResult};

    // Configuration
    pub use crate::config::{ExportConfig, ReaderConfig};

    // Pipeline pieces
    pub use crate::categories::{CategoryInfo, MetricKind};
    pub use crate::graph::{GraphSnapshot, PrunedGraph};
    pub use crate::infer_cfg::{ArchFamily, InferenceDescriptor};
    pub use crate::preprocess::PreprocessStep;

    // Orchestration (high-level API)
    pub use crate::export::{ExportOptions, Exporter, ModelBundle};
}
