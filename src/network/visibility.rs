//! Expansion state, type filters, and the derived visible subgraph.

use std::collections::{BTreeSet, HashSet};

use log::debug;

use super::graph::{Edge, EdgeId, Graph, NodeId, NodeKind, Relation};

/// Per-session view state. Reset only when the graph is rebuilt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibilityState {
	/// Kinds currently shown.
	pub type_filters: BTreeSet<NodeKind>,
	/// Panels whose breakers are shown.
	pub expanded: HashSet<NodeId>,
}

impl Default for VisibilityState {
	/// Every kind enabled, every panel collapsed.
	fn default() -> Self {
		Self {
			type_filters: NodeKind::ALL.into_iter().collect(),
			expanded: HashSet::new(),
		}
	}
}

/// A synthesized edge standing in for hidden intermediate nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VirtualEdge {
	/// The synthesized edge.
	pub edge: Edge,
	/// Label of the node the edge ends at.
	pub label: String,
}

/// Output of [`VisibilityController::compute_visibility`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Visibility {
	/// Visible node ids.
	pub visible_nodes: HashSet<NodeId>,
	/// Real edges whose endpoints are both visible, in graph order.
	pub visible_edges: Vec<Edge>,
	/// `panel -> load` edges across collapsed or filtered breakers.
	pub virtual_edges: Vec<VirtualEdge>,
	/// Nearest visible ancestor to a visible node whose structural parent
	/// chain runs through filtered-out panels.
	pub ancestor_edges: Vec<VirtualEdge>,
}

impl Visibility {
	/// Whether `id` is visible.
	pub fn is_node_visible(&self, id: &NodeId) -> bool {
		self.visible_nodes.contains(id)
	}
}

/// Owns the [`VisibilityState`] of a session.
#[derive(Clone, Debug, Default)]
pub struct VisibilityController {
	state: VisibilityState,
}

impl VisibilityController {
	/// Controller starting from `state`.
	pub fn new(state: VisibilityState) -> Self {
		Self { state }
	}

	/// Current state.
	pub fn state(&self) -> &VisibilityState {
		&self.state
	}

	/// Flip a panel between expanded and collapsed.
	///
	/// Returns the new expansion flag, or `None` when `id` is not a panel in
	/// `graph` (stale ids are ignored).
	pub fn toggle_expanded(&mut self, graph: &Graph, id: &NodeId) -> Option<bool> {
		if graph.kind_of(id) != Some(NodeKind::Panel) {
			debug!("Ignoring expansion toggle for {id}: not a panel in the current graph");
			return None;
		}
		let expanded = if self.state.expanded.remove(id) {
			false
		} else {
			self.state.expanded.insert(id.clone());
			true
		};
		debug!("Panel {id} {}", if expanded { "expanded" } else { "collapsed" });
		Some(expanded)
	}

	/// Whether panel `id` is expanded.
	pub fn is_expanded(&self, id: &NodeId) -> bool {
		self.state.expanded.contains(id)
	}

	/// Show or hide a node kind.
	pub fn set_type_filter(&mut self, kind: NodeKind, enabled: bool) {
		if enabled {
			self.state.type_filters.insert(kind);
		} else {
			self.state.type_filters.remove(&kind);
		}
		debug!("Type filter {kind} set to {enabled}");
	}

	/// Whether `kind` is shown.
	pub fn is_kind_enabled(&self, kind: NodeKind) -> bool {
		self.state.type_filters.contains(&kind)
	}

	/// Derive the visible subgraph from scratch.
	///
	/// Breakers show only when breakers are enabled and their feeding panel is
	/// expanded; other kinds follow their filter alone. A real edge shows when
	/// both ends show. For every visible panel, each run of hidden breakers
	/// that ends in a visible load yields one virtual `panel -> load` edge.
	pub fn compute_visibility(&self, graph: &Graph) -> Visibility {
		let visible_nodes: HashSet<NodeId> = graph
			.nodes()
			.filter(|node| self.node_visible(graph, &node.id, node.kind))
			.map(|node| node.id.clone())
			.collect();

		let visible_edges = graph
			.edges()
			.filter(|e| visible_nodes.contains(&e.from) && visible_nodes.contains(&e.to))
			.cloned()
			.collect();

		let virtual_edges = graph
			.nodes()
			.filter(|n| n.kind == NodeKind::Panel && visible_nodes.contains(&n.id))
			.flat_map(|panel| bypass_edges(graph, &visible_nodes, &panel.id))
			.collect();
		let ancestor_edges = ancestor_edges(graph, &visible_nodes);

		Visibility {
			visible_nodes,
			visible_edges,
			virtual_edges,
			ancestor_edges,
		}
	}

	fn node_visible(&self, graph: &Graph, id: &NodeId, kind: NodeKind) -> bool {
		if !self.is_kind_enabled(kind) {
			return false;
		}
		match kind {
			NodeKind::Breaker => graph
				.feeding_panel(id)
				.is_some_and(|panel| self.state.expanded.contains(panel)),
			NodeKind::PowerSource | NodeKind::Panel | NodeKind::Load => true,
		}
	}
}

/// Virtual edges from `panel` to every visible load reachable through hidden
/// breakers only.
fn bypass_edges(graph: &Graph, visible: &HashSet<NodeId>, panel: &NodeId) -> Vec<VirtualEdge> {
	let mut seen = HashSet::new();
	let mut stack: Vec<&NodeId> = graph
		.outgoing(panel)
		.filter(|e| graph.kind_of(&e.to) == Some(NodeKind::Breaker) && !visible.contains(&e.to))
		.map(|e| &e.to)
		.collect();
	stack.reverse();
	let mut edges = Vec::new();
	let mut loads = HashSet::new();

	while let Some(breaker) = stack.pop() {
		if !seen.insert(breaker) {
			continue;
		}
		let mut next = Vec::new();
		for edge in graph.outgoing(breaker) {
			let Some(node) = graph.node(&edge.to) else {
				continue;
			};
			match node.kind {
				NodeKind::Breaker if !visible.contains(&node.id) => next.push(&node.id),
				NodeKind::Load if visible.contains(&node.id) && loads.insert(&node.id) => {
					edges.push(VirtualEdge {
						edge: Edge {
							id: EdgeId::bypass(panel, &node.id),
							from: panel.clone(),
							to: node.id.clone(),
							relation: Relation::Feeds,
							real: false,
						},
						label: node.label.clone(),
					});
				}
				_ => {}
			}
		}
		stack.extend(next.into_iter().rev());
	}

	edges
}

/// Walk `parent_hint` links up from every visible node. When the walk has to
/// pass a hidden panel before reaching a visible node, link the two directly.
/// Runs of hidden breakers alone are left to [`bypass_edges`].
fn ancestor_edges(graph: &Graph, visible: &HashSet<NodeId>) -> Vec<VirtualEdge> {
	let mut edges = Vec::new();
	for node in graph.nodes().filter(|n| visible.contains(&n.id)) {
		let mut seen = HashSet::from([&node.id]);
		let mut crossed_panel = false;
		let mut current = node.parent_hint.as_ref();
		let ancestor = loop {
			let Some(id) = current else {
				break None;
			};
			if !seen.insert(id) {
				break None;
			}
			if visible.contains(id) {
				break Some(id);
			}
			let Some(parent) = graph.node(id) else {
				break None;
			};
			crossed_panel |= parent.kind == NodeKind::Panel;
			current = parent.parent_hint.as_ref();
		};
		if let Some(ancestor) = ancestor.filter(|_| crossed_panel) {
			edges.push(VirtualEdge {
				edge: Edge {
					id: EdgeId::bypass(ancestor, &node.id),
					from: ancestor.clone(),
					to: node.id.clone(),
					relation: Relation::Feeds,
					real: false,
				},
				label: node.label.clone(),
			});
		}
	}
	edges
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::network::builder::build;
	use crate::network::records::{
		BreakerRecord, LoadRecord, NetworkRecords, PanelRecord, PowerSourceRecord,
	};

	fn id(s: &str) -> NodeId {
		NodeId::from(s)
	}

	fn network() -> Graph {
		build(&NetworkRecords {
			power_sources: vec![PowerSourceRecord::new(1, "ps1")],
			panels: vec![PanelRecord::main(1, "main1", 1), PanelRecord::sub(2, "sub1", 1)],
			breakers: vec![BreakerRecord::new(1, Some(1)), BreakerRecord::new(2, Some(2)).fed_by([1])],
			loads: vec![LoadRecord::new(1, "l1", Some(2))],
		})
	}

	fn virtual_pairs(vis: &Visibility) -> Vec<(String, String)> {
		vis.virtual_edges
			.iter()
			.map(|v| (v.edge.from.to_string(), v.edge.to.to_string()))
			.collect()
	}

	fn assert_edge_law(graph: &Graph, vis: &Visibility) {
		for edge in graph.edges() {
			let expected = vis.is_node_visible(&edge.from) && vis.is_node_visible(&edge.to);
			assert_eq!(vis.visible_edges.contains(edge), expected, "edge {}", edge.id);
		}
	}

	#[test]
	fn test_default_hides_breakers() {
		let graph = network();
		let vis = VisibilityController::default().compute_visibility(&graph);

		let expected: HashSet<NodeId> = ["power_source:1", "panel:1", "panel:2", "load:1"]
			.into_iter()
			.map(id)
			.collect();
		assert_eq!(vis.visible_nodes, expected);
		assert_edge_law(&graph, &vis);
	}

	#[test]
	fn test_collapsed_breakers_bypassed() {
		let graph = network();
		let vis = VisibilityController::default().compute_visibility(&graph);

		let pairs = virtual_pairs(&vis);
		assert!(pairs.contains(&("panel:2".into(), "load:1".into())));
		// main1 -> b1 -> b2 -> l1 runs through hidden breakers only.
		assert!(pairs.contains(&("panel:1".into(), "load:1".into())));
		assert_eq!(pairs.len(), 2);

		let bypass = &vis.virtual_edges[0];
		assert!(!bypass.edge.real);
		assert_eq!(bypass.label, "l1");
	}

	#[test]
	fn test_expanding_panel_replaces_bypass_with_real_edges() {
		let graph = network();
		let mut controller = VisibilityController::default();
		assert_eq!(controller.toggle_expanded(&graph, &id("panel:2")), Some(true));
		let vis = controller.compute_visibility(&graph);

		assert!(vis.is_node_visible(&id("breaker:2")));
		assert!(!vis.is_node_visible(&id("breaker:1")));

		// main1 -> b1 -> b2 -> l1 now passes a visible breaker, so no bypass.
		assert!(vis.virtual_edges.is_empty());

		let real: Vec<&str> = vis.visible_edges.iter().map(|e| e.id.as_str()).collect();
		assert!(real.contains(&"panel:2->breaker:2"));
		assert!(real.contains(&"breaker:2->load:1"));
		assert_edge_law(&graph, &vis);
	}

	#[test]
	fn test_toggle_twice_collapses() {
		let graph = network();
		let mut controller = VisibilityController::default();
		controller.toggle_expanded(&graph, &id("panel:1"));
		assert!(controller.is_expanded(&id("panel:1")));
		assert_eq!(controller.toggle_expanded(&graph, &id("panel:1")), Some(false));
		assert!(!controller.is_expanded(&id("panel:1")));
	}

	#[test]
	fn test_toggle_ignores_non_panels_and_stale_ids() {
		let graph = network();
		let mut controller = VisibilityController::default();
		assert_eq!(controller.toggle_expanded(&graph, &id("breaker:1")), None);
		assert_eq!(controller.toggle_expanded(&graph, &id("panel:42")), None);
		assert!(controller.state().expanded.is_empty());
	}

	#[test]
	fn test_breaker_filter_overrides_expansion() {
		let graph = network();
		let mut controller = VisibilityController::default();
		controller.toggle_expanded(&graph, &id("panel:2"));
		controller.set_type_filter(NodeKind::Breaker, false);
		let vis = controller.compute_visibility(&graph);

		assert!(!vis.is_node_visible(&id("breaker:2")));
		assert!(virtual_pairs(&vis).contains(&("panel:2".into(), "load:1".into())));
	}

	#[test]
	fn test_hidden_load_gets_no_bypass() {
		let graph = network();
		let mut controller = VisibilityController::default();
		controller.set_type_filter(NodeKind::Load, false);
		let vis = controller.compute_visibility(&graph);
		assert!(vis.virtual_edges.is_empty());
		assert_edge_law(&graph, &vis);
	}

	#[test]
	fn test_hidden_panel_gets_no_bypass() {
		let graph = network();
		let mut controller = VisibilityController::default();
		controller.set_type_filter(NodeKind::Panel, false);
		let vis = controller.compute_visibility(&graph);
		assert!(vis.virtual_edges.is_empty());
		assert!(vis.is_node_visible(&id("load:1")));
	}

	#[test]
	fn test_filtered_panels_link_to_nearest_visible_ancestor() {
		let graph = network();
		let mut controller = VisibilityController::default();
		controller.set_type_filter(NodeKind::Panel, false);
		let vis = controller.compute_visibility(&graph);

		let pairs: Vec<_> = vis
			.ancestor_edges
			.iter()
			.map(|v| (v.edge.from.to_string(), v.edge.to.to_string()))
			.collect();
		assert_eq!(pairs, vec![("power_source:1".to_string(), "load:1".to_string())]);
		assert_eq!(vis.ancestor_edges[0].label, "l1");
		assert!(!vis.ancestor_edges[0].edge.real);
	}

	#[test]
	fn test_ancestor_link_stops_at_visible_breaker() {
		let graph = network();
		let mut controller = VisibilityController::default();
		controller.toggle_expanded(&graph, &id("panel:1"));
		controller.toggle_expanded(&graph, &id("panel:2"));
		controller.set_type_filter(NodeKind::Panel, false);
		let vis = controller.compute_visibility(&graph);

		let mut pairs: Vec<_> = vis
			.ancestor_edges
			.iter()
			.map(|v| (v.edge.from.to_string(), v.edge.to.to_string()))
			.collect();
		pairs.sort();
		assert_eq!(
			pairs,
			vec![
				("power_source:1".to_string(), "breaker:1".to_string()),
				("power_source:1".to_string(), "breaker:2".to_string()),
			]
		);
	}

	#[test]
	fn test_hidden_breakers_alone_add_no_ancestor_links() {
		let graph = network();
		let mut controller = VisibilityController::default();
		controller.set_type_filter(NodeKind::Breaker, false);
		let vis = controller.compute_visibility(&graph);
		assert!(vis.ancestor_edges.is_empty());
		assert_eq!(virtual_pairs(&vis).len(), 2);
	}

	#[test]
	fn test_orphan_breaker_never_visible() {
		let graph = build(&NetworkRecords {
			panels: vec![PanelRecord::main(1, "main1", 1)],
			breakers: vec![BreakerRecord::new(1, Some(1)), BreakerRecord::new(2, None).fed_by([1])],
			loads: vec![LoadRecord::new(1, "l1", Some(2))],
			..NetworkRecords::default()
		});
		let mut controller = VisibilityController::default();
		controller.toggle_expanded(&graph, &id("panel:1"));
		let vis = controller.compute_visibility(&graph);

		assert!(vis.is_node_visible(&id("breaker:1")));
		assert!(!vis.is_node_visible(&id("breaker:2")));
		// b1 is visible, so the hidden b2 is not bypassed from panel 1.
		assert!(vis.virtual_edges.is_empty());
	}

	#[test]
	fn test_bypass_survives_feeder_cycle() {
		let graph = build(&NetworkRecords {
			panels: vec![PanelRecord::main(1, "main1", 1)],
			breakers: vec![
				BreakerRecord::new(1, Some(1)).fed_by([2]),
				BreakerRecord::new(2, None).fed_by([1]),
			],
			loads: vec![LoadRecord::new(1, "l1", Some(2)), LoadRecord::new(2, "l2", Some(1))],
			..NetworkRecords::default()
		});
		let vis = VisibilityController::default().compute_visibility(&graph);

		let mut pairs = virtual_pairs(&vis);
		pairs.sort();
		assert_eq!(
			pairs,
			vec![
				("panel:1".to_string(), "load:1".to_string()),
				("panel:1".to_string(), "load:2".to_string()),
			]
		);
	}
}
