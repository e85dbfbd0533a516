//! Upstream and downstream walks over a [`Graph`].
//!
//! Both walks are pure functions of `(graph, node)` and carry an explicit
//! visited set, so they terminate on feeder cycles.

use std::collections::HashSet;

use super::graph::{EdgeId, Graph, NodeId};

/// Chain of feeding edges from a root down to the start node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpstreamPath {
	/// Root first, ending at the start node.
	pub nodes: Vec<NodeId>,
	/// `edges[i]` connects `nodes[i]` to `nodes[i + 1]`.
	pub edges: Vec<EdgeId>,
}

/// Everything reachable forward from a node, excluding the node itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subtree {
	/// Nodes reached, excluding the start.
	pub nodes: HashSet<NodeId>,
	/// Edges traversed.
	pub edges: HashSet<EdgeId>,
}

/// Walk incoming edges from `start` back to a root.
///
/// When a node has several feeders the first edge in discovery order wins
/// (see [`build`](super::builder::build) for that order). The walk stops at
/// a node with no incoming edges, or before revisiting a node already on the
/// path. An id not in the graph yields an empty path.
pub fn upstream_path(graph: &Graph, start: &NodeId) -> UpstreamPath {
	if !graph.contains_node(start) {
		return UpstreamPath::default();
	}

	let mut visited = HashSet::from([start.clone()]);
	let mut nodes = vec![start.clone()];
	let mut edges = Vec::new();
	let mut current = start;

	while let Some(edge) = graph.incoming(current).next() {
		if !visited.insert(edge.from.clone()) {
			break;
		}
		nodes.push(edge.from.clone());
		edges.push(edge.id.clone());
		current = &edge.from;
	}

	nodes.reverse();
	edges.reverse();
	UpstreamPath { nodes, edges }
}

/// Depth-first walk over outgoing edges from `start`.
///
/// Each node is expanded at most once; every edge leaving an expanded node is
/// collected, including edges that close a cycle. Runs in O(V + E).
pub fn downstream_subtree(graph: &Graph, start: &NodeId) -> Subtree {
	let mut subtree = Subtree::default();
	if !graph.contains_node(start) {
		return subtree;
	}

	let mut visited = HashSet::from([start.clone()]);
	let mut stack = vec![start];

	while let Some(current) = stack.pop() {
		for edge in graph.outgoing(current) {
			subtree.edges.insert(edge.id.clone());
			if &edge.to != start {
				subtree.nodes.insert(edge.to.clone());
			}
			if visited.insert(edge.to.clone()) {
				stack.push(&edge.to);
			}
		}
	}

	subtree
}
