//! Computation-graph snapshots and pruning.
//!
//! The graph is an immutable snapshot of named variables and the operators
//! connecting them. Pruning never mutates a snapshot; it computes the
//! backward closure from the target variables and returns a fresh snapshot
//! containing only that closure, together with the subset of candidate feed
//! names that still resolve against it. Feed variables that disappear are
//! expected: inputs like an image id or the original image shape exist only
//! for post-processing outside the graph.

use crate::core::{ExportError, ExportResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::{debug, info};

/// Metadata for a named graph variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VarSpec {
    /// Declared shape; -1 marks a dynamic dimension.
    #[serde(default)]
    pub shape: Vec<i64>,
    /// Whether the variable holds trained parameters.
    #[serde(default)]
    pub persistable: bool,
}

/// An operator node connecting named input and output variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpNode {
    /// Operator kind, e.g. `conv2d`.
    pub kind: String,
    /// Names of consumed variables.
    pub inputs: Vec<String>,
    /// Names of produced variables.
    pub outputs: Vec<String>,
}

/// An immutable snapshot of a computation graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Top-level variable scope, keyed by name.
    pub vars: BTreeMap<String, VarSpec>,
    /// Operators in program order.
    pub ops: Vec<OpNode>,
}

/// The result of pruning: the minimal subgraph plus the surviving feeds.
#[derive(Debug, Clone, PartialEq)]
pub struct PrunedGraph {
    /// The subgraph reachable backward from the target variables.
    pub graph: GraphSnapshot,
    /// Candidate feed names that still resolve in the pruned scope, in the
    /// order they were supplied.
    pub feed_names: Vec<String>,
}

impl GraphSnapshot {
    /// Looks up a variable in the top-level scope.
    pub fn var(&self, name: &str) -> Option<&VarSpec> {
        self.vars.get(name)
    }

    /// Adds a variable to the snapshot.
    pub fn insert_var(&mut self, name: impl Into<String>, spec: VarSpec) {
        self.vars.insert(name.into(), spec);
    }

    /// Appends an operator to the snapshot.
    pub fn push_op(
        &mut self,
        kind: impl Into<String>,
        inputs: &[&str],
        outputs: &[&str],
    ) {
        self.ops.push(OpNode {
            kind: kind.into(),
            inputs: inputs.iter().map(|s| (*s).to_string()).collect(),
            outputs: outputs.iter().map(|s| (*s).to_string()).collect(),
        });
    }

    /// Prunes the graph to the minimal closure producing `targets` and
    /// reports which of `feed_names` survive.
    ///
    /// # Errors
    ///
    /// Returns `EmptyTargetSet` when `targets` is empty and
    /// `MissingTargetVariable` when a target does not exist in the graph.
    /// A feed name missing from the pruned scope is never an error; it is
    /// logged and dropped.
    pub fn prune(&self, feed_names: &[String], targets: &[String]) -> ExportResult<PrunedGraph> {
        if targets.is_empty() {
            return Err(ExportError::EmptyTargetSet);
        }
        for target in targets {
            if !self.vars.contains_key(target) {
                return Err(ExportError::MissingTargetVariable {
                    name: target.clone(),
                });
            }
        }

        // Each variable has at most one producing operator.
        let mut producer: HashMap<&str, usize> = HashMap::new();
        for (idx, op) in self.ops.iter().enumerate() {
            for output in &op.outputs {
                producer.insert(output.as_str(), idx);
            }
        }

        let mut needed: BTreeSet<&str> = targets.iter().map(String::as_str).collect();
        let mut kept = vec![false; self.ops.len()];
        let mut queue: VecDeque<&str> = targets.iter().map(String::as_str).collect();
        while let Some(name) = queue.pop_front() {
            let Some(&idx) = producer.get(name) else {
                continue;
            };
            if kept[idx] {
                continue;
            }
            kept[idx] = true;
            for input in &self.ops[idx].inputs {
                if needed.insert(input.as_str()) {
                    queue.push_back(input.as_str());
                }
            }
        }

        let ops: Vec<OpNode> = self
            .ops
            .iter()
            .zip(&kept)
            .filter(|(_, keep)| **keep)
            .map(|(op, _)| op.clone())
            .collect();
        let vars: BTreeMap<String, VarSpec> = self
            .vars
            .iter()
            .filter(|(name, _)| needed.contains(name.as_str()))
            .map(|(name, spec)| (name.clone(), spec.clone()))
            .collect();
        let graph = GraphSnapshot { vars, ops };
        debug!(
            "pruned graph to {} ops and {} vars for {} targets",
            graph.ops.len(),
            graph.vars.len(),
            targets.len()
        );

        let mut surviving = Vec::new();
        for name in feed_names {
            if graph.vars.contains_key(name) {
                surviving.push(name.clone());
            } else {
                // Pass-through input used only by post-processing.
                info!("pruned unused feed variable {}", name);
            }
        }

        Ok(PrunedGraph {
            graph,
            feed_names: surviving,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// image -> conv -> feat -> head -> bbox_output, with im_id and im_shape
    /// declared as feeds but never consumed by any operator.
    fn detection_graph() -> GraphSnapshot {
        let mut graph = GraphSnapshot::default();
        graph.insert_var("image", VarSpec::default());
        graph.insert_var("im_id", VarSpec::default());
        graph.insert_var("im_shape", VarSpec::default());
        graph.insert_var(
            "conv_w",
            VarSpec {
                shape: vec![64, 3, 3, 3],
                persistable: true,
            },
        );
        graph.insert_var("feat", VarSpec::default());
        graph.insert_var("bbox_output", VarSpec::default());
        graph.push_op("conv2d", &["image", "conv_w"], &["feat"]);
        graph.push_op("detection_head", &["feat"], &["bbox_output"]);
        graph
    }

    fn feeds() -> Vec<String> {
        vec![
            "image".to_string(),
            "im_id".to_string(),
            "im_shape".to_string(),
        ]
    }

    #[test]
    fn test_pass_through_feeds_are_dropped() {
        let graph = detection_graph();
        let pruned = graph
            .prune(&feeds(), &["bbox_output".to_string()])
            .unwrap();
        assert_eq!(pruned.feed_names, vec!["image"]);
    }

    #[test]
    fn test_closure_keeps_parameters() {
        let graph = detection_graph();
        let pruned = graph
            .prune(&feeds(), &["bbox_output".to_string()])
            .unwrap();
        assert!(pruned.graph.var("conv_w").is_some());
        assert!(pruned.graph.var("im_id").is_none());
        assert_eq!(pruned.graph.ops.len(), 2);
    }

    #[test]
    fn test_unrelated_ops_are_discarded() {
        let mut graph = detection_graph();
        graph.insert_var("aux", VarSpec::default());
        graph.push_op("aux_loss", &["feat"], &["aux"]);

        let pruned = graph
            .prune(&feeds(), &["bbox_output".to_string()])
            .unwrap();
        assert_eq!(pruned.graph.ops.len(), 2);
        assert!(pruned.graph.var("aux").is_none());
    }

    #[test]
    fn test_intermediate_target_prunes_downstream() {
        let graph = detection_graph();
        let pruned = graph.prune(&feeds(), &["feat".to_string()]).unwrap();
        assert_eq!(pruned.graph.ops.len(), 1);
        assert!(pruned.graph.var("bbox_output").is_none());
        assert_eq!(pruned.feed_names, vec!["image"]);
    }

    #[test]
    fn test_empty_target_set_is_fatal() {
        let graph = detection_graph();
        let result = graph.prune(&feeds(), &[]);
        assert!(matches!(result, Err(ExportError::EmptyTargetSet)));
    }

    #[test]
    fn test_missing_target_is_fatal() {
        let graph = detection_graph();
        let result = graph.prune(&feeds(), &["mask_output".to_string()]);
        assert!(matches!(
            result,
            Err(ExportError::MissingTargetVariable { name }) if name == "mask_output"
        ));
    }

    #[test]
    fn test_original_graph_is_untouched() {
        let graph = detection_graph();
        let before = graph.clone();
        let _ = graph.prune(&feeds(), &["feat".to_string()]).unwrap();
        assert_eq!(graph, before);
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let graph = detection_graph();
        let json = serde_json::to_string(&graph).unwrap();
        let parsed: GraphSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, graph);
    }
}
