// src/proclist/graph.rs

use std::collections::HashMap;

use crate::proclist::loader::ProcessList;

/// Internal node structure: stores immediate predecessors and dependents.
#[derive(Debug, Clone)]
struct DepNode {
    /// Processes that must complete successfully before this one can run.
    predecessors: Vec<String>,
    /// Processes that list this one as a predecessor.
    dependents: Vec<String>,
}

/// In-memory predecessor graph keyed by process name.
///
/// Intentionally lightweight: acyclicity is established up front by
/// [`super::validate`], so this only keeps adjacency information for
/// scheduling and diagnostics.
#[derive(Debug, Clone)]
pub struct DepGraph {
    nodes: HashMap<String, DepNode>,
}

impl DepGraph {
    /// Build the graph from a parsed, validated [`ProcessList`].
    pub fn from_list(list: &ProcessList) -> Self {
        let mut nodes: HashMap<String, DepNode> = HashMap::new();

        for entry in &list.entries {
            nodes.insert(
                entry.name.clone(),
                DepNode {
                    predecessors: entry.predecessors.clone(),
                    dependents: Vec::new(),
                },
            );
        }

        let names: Vec<String> = nodes.keys().cloned().collect();
        for name in names {
            let preds = nodes
                .get(&name)
                .map(|n| n.predecessors.clone())
                .unwrap_or_default();

            for pred in preds {
                if let Some(pred_node) = nodes.get_mut(&pred) {
                    pred_node.dependents.push(name.clone());
                }
            }
        }

        Self { nodes }
    }

    /// Immediate predecessors of a process.
    pub fn predecessors_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.predecessors.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a process.
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
