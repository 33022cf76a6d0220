// src/proclist/validate.rs

//! Pre-launch validation of the process list.
//!
//! Duplicate names are rejected by the loader; this module checks that every
//! predecessor names an active process, and that the predecessor graph is
//! free of cycles ("deadly embraces"). A cycle is reported with its full
//! chain, by name, e.g. `X -> Y -> X`.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{BatchError, Result};
use crate::proclist::loader::ProcessList;

/// Validate predecessor references and acyclicity. Fatal before any launch.
pub fn validate_process_list(list: &ProcessList) -> Result<()> {
    let active: HashSet<&str> = list.entries.iter().map(|e| e.name.as_str()).collect();

    for entry in &list.entries {
        for pred in &entry.predecessors {
            if !active.contains(pred.as_str()) {
                return Err(BatchError::ProcessList(format!(
                    "process '{}' names undefined predecessor '{}'",
                    entry.name, pred
                )));
            }
        }
    }

    // Edge direction: predecessor -> process. A topological sort fails iff
    // the graph has a cycle; the chain itself is then recovered by DFS so
    // the operator sees the whole embrace.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for entry in &list.entries {
        graph.add_node(entry.name.as_str());
    }
    for entry in &list.entries {
        for pred in &entry.predecessors {
            graph.add_edge(pred.as_str(), entry.name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let start = cycle.node_id();
            let chain = find_cycle_chain(list, start)
                .unwrap_or_else(|| format!("{start} -> {start}"));
            Err(BatchError::Cycle(chain))
        }
    }
}

/// Depth-first walk along predecessor edges from `start`, keeping the
/// current path; revisiting a node on the path closes the cycle.
fn find_cycle_chain(list: &ProcessList, start: &str) -> Option<String> {
    let preds: HashMap<&str, &[String]> = list
        .entries
        .iter()
        .map(|e| (e.name.as_str(), e.predecessors.as_slice()))
        .collect();

    let mut path: Vec<&str> = Vec::new();
    let mut on_path: HashSet<&str> = HashSet::new();

    fn dfs<'a>(
        node: &'a str,
        preds: &HashMap<&'a str, &'a [String]>,
        path: &mut Vec<&'a str>,
        on_path: &mut HashSet<&'a str>,
    ) -> Option<Vec<&'a str>> {
        if on_path.contains(node) {
            // Close the chain at the first occurrence of `node`.
            let pos = path.iter().position(|n| *n == node)?;
            let mut chain: Vec<&str> = path[pos..].to_vec();
            chain.push(node);
            return Some(chain);
        }

        path.push(node);
        on_path.insert(node);

        if let Some(node_preds) = preds.get(node) {
            for pred in node_preds.iter() {
                if let Some(chain) = dfs(pred.as_str(), preds, path, on_path) {
                    return Some(chain);
                }
            }
        }

        path.pop();
        on_path.remove(node);
        None
    }

    let chain = dfs(start, &preds, &mut path, &mut on_path)?;
    Some(chain.join(" -> "))
}
