//! Export orchestration and artifact serialization.
//!
//! Sequences graph pruning, graph/parameter serialization, and descriptor
//! assembly for one export run. The graph, feed/fetch names, and parameter
//! blob come from external collaborators (model construction and checkpoint
//! loading); this module only transforms and persists them. Every artifact
//! is written to a temporary file in the destination directory and renamed
//! into place, so a failed run never leaves an artifact that looks complete.

use crate::config::ExportConfig;
use crate::core::{ExportError, ExportResult};
use crate::graph::GraphSnapshot;
use crate::infer_cfg::InferenceDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Filename of the serialized pruned graph.
pub const MODEL_FILENAME: &str = "__model__";
/// Fixed filename of the parameter blob, shared with the inference engine.
pub const PARAMS_FILENAME: &str = "__params__";
/// Filename of the inference descriptor document.
pub const INFER_CONFIG_FILENAME: &str = "infer_cfg.yml";

/// The externally produced model: built graph, named feeds and fetches, and
/// the loaded parameter blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelBundle {
    /// Full training-time computation graph.
    pub graph: GraphSnapshot,
    /// Candidate feed variable names, in declaration order.
    pub feed_vars: Vec<String>,
    /// Fetch key to output variable name.
    pub fetches: BTreeMap<String, String>,
    /// Fetch keys that belong to post-processing (e.g. NMS) and are dropped
    /// when the export excludes post-processing.
    #[serde(default)]
    pub postprocess_fetches: BTreeSet<String>,
    /// Opaque trained-parameter blob; carried, never interpreted.
    #[serde(skip)]
    pub params: Vec<u8>,
}

impl ModelBundle {
    /// Loads a bundle from a checkpoint directory containing `model.json`
    /// and a `params` blob.
    pub fn load(weights_dir: &Path) -> ExportResult<Self> {
        let model_path = weights_dir.join("model.json");
        let content = fs::read_to_string(&model_path).map_err(|e| {
            ExportError::invalid_input(format!(
                "failed to read model description '{}': {}",
                model_path.display(),
                e
            ))
        })?;
        let mut bundle: ModelBundle = serde_json::from_str(&content)?;

        let params_path = weights_dir.join("params");
        bundle.params = fs::read(&params_path).map_err(|e| {
            ExportError::invalid_input(format!(
                "failed to read parameter blob '{}': {}",
                params_path.display(),
                e
            ))
        })?;
        Ok(bundle)
    }

    /// Fetch target variable names in ascending fetch-key order.
    pub fn target_vars(&self, exclude_postprocess: bool) -> Vec<String> {
        self.fetches
            .iter()
            .filter(|(key, _)| !(exclude_postprocess && self.postprocess_fetches.contains(*key)))
            .map(|(_, var)| var.clone())
            .collect()
    }
}

/// Options controlling one export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Directory the artifacts are written under.
    pub output_dir: PathBuf,
    /// Whether post-processing fetches are pruned from the exported graph.
    pub exclude_postprocess: bool,
}

/// Paths and names produced by a completed export run.
#[derive(Debug, Clone)]
pub struct ExportArtifacts {
    /// Path of the serialized pruned graph.
    pub model_path: PathBuf,
    /// Path of the parameter blob.
    pub params_path: PathBuf,
    /// Path of the inference descriptor.
    pub infer_cfg_path: PathBuf,
    /// Feed names that survived pruning.
    pub feed_names: Vec<String>,
    /// Target variable names preserved through pruning.
    pub target_names: Vec<String>,
}

/// Orchestrates one export run over an externally built model bundle.
#[derive(Debug)]
pub struct Exporter {
    config: ExportConfig,
    options: ExportOptions,
}

impl Exporter {
    /// Creates an exporter owning the configuration for one run.
    pub fn new(config: ExportConfig, options: ExportOptions) -> Self {
        Self { config, options }
    }

    /// Runs the export: prune, serialize the graph artifact, assemble and
    /// serialize the descriptor. Both halves must succeed.
    pub fn run(&self, bundle: &ModelBundle) -> ExportResult<ExportArtifacts> {
        // Configuration-shape failures (unsupported metric, unrecognized
        // architecture) abort before any graph work or file output.
        let descriptor = InferenceDescriptor::from_config(&self.config)?;

        let targets = bundle.target_vars(self.options.exclude_postprocess);
        let pruned = bundle.graph.prune(&bundle.feed_vars, &targets)?;

        let dir = &self.options.output_dir;
        fs::create_dir_all(dir)?;
        info!(
            "export inference model to {}, input: {:?}, output: {:?}",
            dir.display(),
            pruned.feed_names,
            targets
        );

        let model_path = dir.join(MODEL_FILENAME);
        write_atomic(&model_path, &serde_json::to_vec_pretty(&pruned.graph)?)?;
        let params_path = dir.join(PARAMS_FILENAME);
        write_atomic(&params_path, &bundle.params)?;

        let infer_cfg_path = dir.join(INFER_CONFIG_FILENAME);
        write_atomic(&infer_cfg_path, descriptor.to_yaml()?.as_bytes())?;
        info!(
            "export inference config file to {}",
            infer_cfg_path.display()
        );

        Ok(ExportArtifacts {
            model_path,
            params_path,
            infer_cfg_path,
            feed_names: pruned.feed_names,
            target_names: targets,
        })
    }
}

/// Writes `bytes` to `path` through a temporary file in the same directory,
/// renaming into place so readers never observe a partial artifact.
fn write_atomic(path: &Path, bytes: &[u8]) -> ExportResult<()> {
    let dir = path.parent().ok_or_else(|| {
        ExportError::invalid_input(format!(
            "output path '{}' has no parent directory",
            path.display()
        ))
    })?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ExportError::Io(e.error))?;
    Ok(())
}
