//! Execution order and cycle detection.
//!
//! Depth-first over dependencies: before a node is emitted, every node with
//! an edge into it is emitted. Nodes are visited in input order and their
//! dependencies in edge order, so the result only depends on the order of
//! the inputs.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    FlowmapError, Result,
    workflow::{GraphEdge, GraphNode, NodeId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Linearizes the graph so that for every edge `u -> v`, `u` precedes `v`.
///
/// Fails with [`FlowmapError::Cycle`] naming the first node found to be on a
/// dependency loop. Edges with an unknown endpoint are ignored and a
/// repeated node id is only emitted once.
pub fn execution_order<N: GraphNode, E: GraphEdge>(
    nodes: &[N],
    edges: &[E],
) -> Result<Vec<NodeId>> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        index.entry(node.node_id()).or_insert(i);
    }

    let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for edge in edges {
        if let (Some(&source), Some(&target)) = (index.get(edge.source_id()), index.get(edge.target_id())) {
            dependencies[target].push(source);
        }
    }

    let mut marks = vec![Mark::Unvisited; nodes.len()];
    let mut order = Vec::with_capacity(index.len());

    for start in 0..nodes.len() {
        if marks[start] != Mark::Unvisited || index[nodes[start].node_id()] != start {
            continue;
        }

        // (node, position of the next dependency to visit)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::InProgress;

        while let Some(top) = stack.last_mut() {
            let (node, cursor) = *top;
            match dependencies[node].get(cursor) {
                Some(&dependency) => {
                    top.1 += 1;
                    match marks[dependency] {
                        Mark::Unvisited => {
                            marks[dependency] = Mark::InProgress;
                            stack.push((dependency, 0));
                        }
                        Mark::InProgress => return Err(cycle_error(nodes, &stack, dependency)),
                        Mark::Done => {}
                    }
                }
                None => {
                    marks[node] = Mark::Done;
                    order.push(nodes[node].node_id().to_string());
                    stack.pop();
                }
            }
        }
    }

    Ok(order)
}

/// Builds the error for a loop closing at `node`.
///
/// The stack holds dependents above their dependencies, so the loop in edge
/// direction is `node` followed by the stack above it, reversed.
fn cycle_error<N: GraphNode>(
    nodes: &[N],
    stack: &[(usize, usize)],
    node: usize,
) -> FlowmapError {
    let position = stack.iter().position(|(n, _)| *n == node).unwrap_or(0);
    let mut path = vec![nodes[node].node_id().to_string()];
    path.extend(stack[position + 1..].iter().rev().map(|(n, _)| nodes[*n].node_id().to_string()));

    debug!(node = nodes[node].node_id(), path = ?path, "cycle detected");
    FlowmapError::Cycle {
        node: nodes[node].node_id().to_string(),
        path,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn position(
        order: &[NodeId],
        id: &str,
    ) -> usize {
        order.iter().position(|n| n == id).unwrap()
    }

    #[test]
    fn test_chain() {
        let order = execution_order(&["C", "B", "A"], &[("A", "B"), ("B", "C")]).unwrap();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_independent_nodes_keep_input_order() {
        let order = execution_order(&["z", "a", "m"], &[] as &[(&str, &str)]).unwrap();
        assert_eq!(order, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_dependencies_visited_in_edge_order() {
        let order = execution_order(&["out", "q", "p"], &[("q", "out"), ("p", "out")]).unwrap();
        assert_eq!(order, vec!["q", "p", "out"]);

        let order = execution_order(&["out", "q", "p"], &[("p", "out"), ("q", "out")]).unwrap();
        assert_eq!(order, vec!["p", "q", "out"]);
    }

    #[test]
    fn test_every_edge_respected() {
        let nodes = ["f", "e", "d", "c", "b", "a"];
        let edges = [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d"), ("d", "e"), ("a", "f"), ("e", "f")];
        let order = execution_order(&nodes, &edges).unwrap();

        assert_eq!(order.len(), nodes.len());
        for (u, v) in edges {
            assert!(position(&order, u) < position(&order, v), "{} before {}", u, v);
        }
    }

    #[test]
    fn test_three_node_cycle() {
        let err = execution_order(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")]).unwrap_err();
        match err {
            FlowmapError::Cycle {
                node,
                path,
            } => {
                assert_eq!(node, "A");
                assert_eq!(path, vec!["A", "B", "C"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_cycle_behind_acyclic_prefix() {
        let nodes = ["x", "b", "c", "entry"];
        let edges = [("entry", "b"), ("b", "c"), ("c", "b"), ("c", "x")];
        let err = execution_order(&nodes, &edges).unwrap_err();
        let FlowmapError::Cycle {
            node,
            path,
        } = err
        else {
            panic!("expected cycle");
        };
        assert!(node == "b" || node == "c");
        assert!(path.iter().all(|n| n == "b" || n == "c"));
    }

    #[test]
    fn test_self_loop() {
        let err = execution_order(&["solo"], &[("solo", "solo")]).unwrap_err();
        assert_eq!(err.ids(), vec!["solo"]);
    }

    #[test]
    fn test_dangling_edges_and_duplicate_ids_ignored() {
        let order = execution_order(&["a", "b", "a"], &[("ghost", "a"), ("a", "b")]).unwrap();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let ids: Vec<String> = (0..20_000).map(|i| format!("n{}", i)).collect();
        let nodes: Vec<&str> = ids.iter().rev().map(|s| s.as_str()).collect();
        let edges: Vec<(&str, &str)> = ids.windows(2).map(|w| (w[0].as_str(), w[1].as_str())).collect();

        let order = execution_order(&nodes, &edges).unwrap();
        assert_eq!(order.first().map(String::as_str), Some("n0"));
        assert_eq!(order.last().map(String::as_str), Some("n19999"));
    }
}
