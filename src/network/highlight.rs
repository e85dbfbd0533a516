//! Upstream/downstream path highlighting for the selected node.

use std::collections::HashSet;

use log::debug;

use super::graph::{Edge, EdgeId, Graph, NodeId, NodeKind};
use super::traversal::{downstream_subtree, upstream_path};

/// Which path a highlighted element belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HighlightClass {
	/// On the path toward the power source.
	Upstream,
	/// Fed, directly or not, by the selected node.
	Downstream,
}

impl HighlightClass {
	/// CSS class used by the renderer.
	pub fn css_class(self) -> &'static str {
		match self {
			HighlightClass::Upstream => "upstream",
			HighlightClass::Downstream => "downstream",
		}
	}
}

/// A highlightable diagram element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Element {
	/// A node.
	Node(NodeId),
	/// An edge.
	Edge(EdgeId),
}

/// Upstream and downstream elements of one selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightSet {
	/// The selected node. It is in neither set.
	pub selected: NodeId,
	/// Path toward the power source.
	pub upstream: HashSet<Element>,
	/// Everything fed by the selection.
	pub downstream: HashSet<Element>,
}

/// Nodes touched by a highlight, grouped by kind, in graph order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathSummary {
	/// Power sources touched.
	pub power_sources: Vec<NodeId>,
	/// Panels touched.
	pub panels: Vec<NodeId>,
	/// Breakers touched.
	pub breakers: Vec<NodeId>,
	/// Loads touched.
	pub loads: Vec<NodeId>,
}

impl PathSummary {
	/// Ids of one kind.
	pub fn of_kind(&self, kind: NodeKind) -> &[NodeId] {
		match kind {
			NodeKind::PowerSource => &self.power_sources,
			NodeKind::Panel => &self.panels,
			NodeKind::Breaker => &self.breakers,
			NodeKind::Load => &self.loads,
		}
	}
}

impl HighlightSet {
	fn compute(graph: &Graph, selected: &NodeId) -> Self {
		let path = upstream_path(graph, selected);
		// The selected node is marked by `selected`, never by a class.
		let upstream = path
			.nodes
			.into_iter()
			.filter(|n| n != selected)
			.map(Element::Node)
			.chain(path.edges.into_iter().map(Element::Edge))
			.collect();

		let subtree = downstream_subtree(graph, selected);
		let downstream = subtree
			.nodes
			.into_iter()
			.map(Element::Node)
			.chain(subtree.edges.into_iter().map(Element::Edge))
			.collect();

		Self {
			selected: selected.clone(),
			upstream,
			downstream,
		}
	}

	/// Class of a node; upstream wins when a cycle puts it in both sets.
	pub fn node_class(&self, id: &NodeId) -> Option<HighlightClass> {
		self.class_of(&Element::Node(id.clone()))
	}

	/// Class of a real edge.
	pub fn edge_class(&self, id: &EdgeId) -> Option<HighlightClass> {
		self.class_of(&Element::Edge(id.clone()))
	}

	/// Class of a bypass edge: the class both of its endpoints share, counting
	/// the selected node as part of either path.
	pub fn virtual_edge_class(&self, edge: &Edge) -> Option<HighlightClass> {
		[HighlightClass::Upstream, HighlightClass::Downstream]
			.into_iter()
			.find(|&class| self.on_path(&edge.from, class) && self.on_path(&edge.to, class))
	}

	fn on_path(&self, id: &NodeId, class: HighlightClass) -> bool {
		*id == self.selected || self.set(class).contains(&Element::Node(id.clone()))
	}

	fn set(&self, class: HighlightClass) -> &HashSet<Element> {
		match class {
			HighlightClass::Upstream => &self.upstream,
			HighlightClass::Downstream => &self.downstream,
		}
	}

	fn class_of(&self, element: &Element) -> Option<HighlightClass> {
		if self.upstream.contains(element) {
			Some(HighlightClass::Upstream)
		} else if self.downstream.contains(element) {
			Some(HighlightClass::Downstream)
		} else {
			None
		}
	}

	/// The selected node plus every highlighted node, grouped by kind.
	pub fn summary(&self, graph: &Graph) -> PathSummary {
		let mut summary = PathSummary::default();
		for node in graph.nodes() {
			let touched = node.id == self.selected
				|| self.upstream.contains(&Element::Node(node.id.clone()))
				|| self.downstream.contains(&Element::Node(node.id.clone()));
			if !touched {
				continue;
			}
			let bucket = match node.kind {
				NodeKind::PowerSource => &mut summary.power_sources,
				NodeKind::Panel => &mut summary.panels,
				NodeKind::Breaker => &mut summary.breakers,
				NodeKind::Load => &mut summary.loads,
			};
			bucket.push(node.id.clone());
		}
		summary
	}
}

/// Holds the highlight for the current selection, if any.
#[derive(Clone, Debug, Default)]
pub struct SelectionHighlighter {
	current: Option<HighlightSet>,
}

impl SelectionHighlighter {
	/// Replace any previous highlight with the paths through `id`.
	///
	/// Selecting an id not in `graph` leaves the current highlight untouched
	/// and returns `None`.
	pub fn select(&mut self, graph: &Graph, id: &NodeId) -> Option<&HighlightSet> {
		if !graph.contains_node(id) {
			debug!("Ignoring selection of {id}: not in the current graph");
			return None;
		}
		self.reset_highlight();
		let set = HighlightSet::compute(graph, id);
		debug!(
			"Selected {id}: {} upstream, {} downstream elements",
			set.upstream.len(),
			set.downstream.len()
		);
		Some(&*self.current.insert(set))
	}

	/// Drop the current highlight.
	pub fn deselect(&mut self) {
		self.reset_highlight();
	}

	/// Clear state before a new selection.
	pub fn reset_highlight(&mut self) {
		self.current = None;
	}

	/// Highlight of the current selection, if any.
	pub fn current_highlight(&self) -> Option<&HighlightSet> {
		self.current.as_ref()
	}
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

	fn edge(from: &str, to: &str) -> Element {
		Element::Edge(EdgeId::real(&id(from), &id(to)))
	}

	fn network() -> Graph {
		build(&NetworkRecords {
			power_sources: vec![PowerSourceRecord::new(1, "ps1")],
			panels: vec![PanelRecord::main(1, "main1", 1), PanelRecord::sub(2, "sub1", 1)],
			breakers: vec![BreakerRecord::new(1, Some(1)), BreakerRecord::new(2, Some(2)).fed_by([1])],
			loads: vec![LoadRecord::new(1, "l1", Some(2))],
		})
	}

	#[test]
	fn test_select_load_highlights_path_to_source() {
		let graph = network();
		let mut highlighter = SelectionHighlighter::default();
		let set = highlighter.select(&graph, &id("load:1")).unwrap();

		for e in [
			edge("breaker:2", "load:1"),
			edge("panel:2", "breaker:2"),
			edge("panel:1", "panel:2"),
			edge("power_source:1", "panel:1"),
		] {
			assert!(set.upstream.contains(&e), "missing {e:?}");
		}
		assert!(set.upstream.contains(&Element::Node(id("power_source:1"))));
		assert!(!set.upstream.contains(&Element::Node(id("load:1"))));
		assert_eq!(set.node_class(&id("load:1")), None);
		assert!(set.downstream.is_empty());
	}

	#[test]
	fn test_select_panel_highlights_descendants() {
		let graph = network();
		let mut highlighter = SelectionHighlighter::default();
		let set = highlighter.select(&graph, &id("panel:2")).unwrap();

		assert_eq!(set.node_class(&id("breaker:2")), Some(HighlightClass::Downstream));
		assert_eq!(set.node_class(&id("load:1")), Some(HighlightClass::Downstream));
		assert_eq!(set.node_class(&id("panel:1")), Some(HighlightClass::Upstream));
		assert_eq!(set.node_class(&id("breaker:1")), None);
		assert_eq!(
			set.edge_class(&EdgeId::real(&id("panel:1"), &id("panel:2"))),
			Some(HighlightClass::Upstream)
		);
	}

	#[test]
	fn test_select_is_idempotent() {
		let graph = network();
		let mut highlighter = SelectionHighlighter::default();
		let first = highlighter.select(&graph, &id("panel:1")).cloned();
		let second = highlighter.select(&graph, &id("panel:1")).cloned();
		assert_eq!(first, second);
	}

	#[test]
	fn test_reselect_replaces_previous_highlight() {
		let graph = network();
		let mut highlighter = SelectionHighlighter::default();
		highlighter.select(&graph, &id("panel:1"));
		let set = highlighter.select(&graph, &id("load:1")).unwrap();
		assert!(set.downstream.is_empty());
		assert_eq!(set.selected, id("load:1"));
	}

	#[test]
	fn test_stale_selection_is_noop() {
		let graph = network();
		let mut highlighter = SelectionHighlighter::default();
		highlighter.select(&graph, &id("load:1"));
		assert!(highlighter.select(&graph, &id("load:77")).is_none());
		assert_eq!(highlighter.current_highlight().unwrap().selected, id("load:1"));
	}

	#[test]
	fn test_deselect_clears() {
		let graph = network();
		let mut highlighter = SelectionHighlighter::default();
		highlighter.select(&graph, &id("breaker:1"));
		highlighter.deselect();
		assert!(highlighter.current_highlight().is_none());
	}

	#[test]
	fn test_virtual_edge_class() {
		let graph = network();
		let mut highlighter = SelectionHighlighter::default();
		let bypass = Edge {
			id: EdgeId::bypass(&id("panel:2"), &id("load:1")),
			from: id("panel:2"),
			to: id("load:1"),
			relation: crate::network::graph::Relation::Feeds,
			real: false,
		};

		let set = highlighter.select(&graph, &id("load:1")).unwrap();
		assert_eq!(set.virtual_edge_class(&bypass), Some(HighlightClass::Upstream));
		let set = highlighter.select(&graph, &id("power_source:1")).unwrap();
		assert_eq!(set.virtual_edge_class(&bypass), Some(HighlightClass::Downstream));
		let set = highlighter.select(&graph, &id("breaker:1")).unwrap();
		assert_eq!(set.virtual_edge_class(&bypass), None);
	}

	#[test]
	fn test_summary_groups_by_kind() {
		let graph = network();
		let mut highlighter = SelectionHighlighter::default();
		let set = highlighter.select(&graph, &id("breaker:2")).unwrap();
		let summary = set.summary(&graph);

		assert_eq!(summary.power_sources, vec![id("power_source:1")]);
		assert_eq!(summary.panels, vec![id("panel:1"), id("panel:2")]);
		assert_eq!(summary.of_kind(NodeKind::Breaker), &[id("breaker:2")]);
		assert_eq!(summary.loads, vec![id("load:1")]);
	}
}
