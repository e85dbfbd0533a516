//! One diagram session: the graph plus the view state derived from it.

use log::{debug, info};

use super::builder::build;
use super::error::NetworkError;
use super::graph::{EdgeId, Graph, NodeId, NodeKind};
use super::highlight::{HighlightClass, HighlightSet, SelectionHighlighter};
use super::records::NetworkRecords;
use super::tree::{PanelForest, assemble};
use super::visibility::{Visibility, VisibilityController};
use crate::config::DiagramConfig;

/// A node as the renderer sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewNode {
	/// `kind:recordId`.
	pub id: NodeId,
	/// Entity kind.
	pub kind: NodeKind,
	/// Printed label.
	pub label: String,
	/// Passes filters and expansion.
	pub visible: bool,
	/// Is the current selection.
	pub selected: bool,
	/// Path class, if highlighted.
	pub highlight: Option<HighlightClass>,
}

/// An edge as the renderer sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewEdge {
	/// Edge id.
	pub id: EdgeId,
	/// Upstream endpoint.
	pub from: NodeId,
	/// Downstream endpoint.
	pub to: NodeId,
	/// Both ends are visible.
	pub visible: bool,
	/// Stored in the graph, as opposed to synthesized.
	pub real: bool,
	/// Target label for synthesized edges.
	pub label: Option<String>,
	/// Path class, if highlighted.
	pub highlight: Option<HighlightClass>,
}

/// Everything the rendering layer needs, in graph order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagramView {
	/// Bumped on every rebuild; a view from an older generation is stale.
	pub generation: u64,
	/// Nodes in graph order.
	pub nodes: Vec<ViewNode>,
	/// Real edges first, then bypass edges.
	pub edges: Vec<ViewEdge>,
}

impl DiagramView {
	/// Nodes to draw.
	pub fn visible_nodes(&self) -> impl Iterator<Item = &ViewNode> {
		self.nodes.iter().filter(|n| n.visible)
	}

	/// Edges to draw.
	pub fn visible_edges(&self) -> impl Iterator<Item = &ViewEdge> {
		self.edges.iter().filter(|e| e.visible)
	}
}

/// Graph, view state and selection for one open diagram.
#[derive(Clone, Debug)]
pub struct DiagramSession {
	config: DiagramConfig,
	records: NetworkRecords,
	graph: Graph,
	visibility: VisibilityController,
	highlighter: SelectionHighlighter,
	generation: u64,
}

impl DiagramSession {
	/// Build a session over `records`.
	pub fn new(records: NetworkRecords, config: DiagramConfig) -> Self {
		let mut session = Self {
			config,
			records: NetworkRecords::default(),
			graph: Graph::new(),
			visibility: VisibilityController::default(),
			highlighter: SelectionHighlighter::default(),
			generation: 0,
		};
		session.rebuild(records);
		session
	}

	/// Replace the graph wholesale. Expansion, filters and the current
	/// selection all reset.
	pub fn rebuild(&mut self, records: NetworkRecords) {
		self.graph = build(&records);
		self.records = records;
		self.visibility = VisibilityController::new(self.config.initial_visibility());
		if !self.config.collapse_breakers {
			let panels: Vec<NodeId> = self
				.graph
				.nodes()
				.filter(|n| n.kind == NodeKind::Panel)
				.map(|n| n.id.clone())
				.collect();
			for panel in &panels {
				self.visibility.toggle_expanded(&self.graph, panel);
			}
		}
		self.highlighter.reset_highlight();
		self.generation += 1;
		info!("Diagram session rebuilt (generation {})", self.generation);
	}

	/// Parse and rebuild. On a parse error the previous graph stays in place.
	pub fn refresh_from_json(&mut self, json: &str) -> Result<(), NetworkError> {
		let records = NetworkRecords::from_json(json)?;
		self.rebuild(records);
		Ok(())
	}

	/// The current graph.
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	/// Records the graph was built from.
	pub fn records(&self) -> &NetworkRecords {
		&self.records
	}

	/// Configuration in use.
	pub fn config(&self) -> &DiagramConfig {
		&self.config
	}

	/// Rebuild counter.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Select a node. Clicking a panel also toggles its expansion; other
	/// kinds only highlight. Unknown ids change nothing.
	pub fn select(&mut self, id: &NodeId) -> Option<&HighlightSet> {
		let kind = match self.graph.kind_of(id) {
			Some(kind) => kind,
			None => {
				debug!("Ignoring click on {id}: not in generation {}", self.generation);
				return None;
			}
		};
		if kind == NodeKind::Panel {
			self.visibility.toggle_expanded(&self.graph, id);
		}
		self.highlighter.select(&self.graph, id)
	}

	/// Clear the selection.
	pub fn deselect(&mut self) {
		self.highlighter.deselect();
	}

	/// Expand or collapse a panel.
	pub fn toggle_expanded(&mut self, id: &NodeId) -> Option<bool> {
		self.visibility.toggle_expanded(&self.graph, id)
	}

	/// Show or hide a node kind.
	pub fn set_type_filter(&mut self, kind: NodeKind, enabled: bool) {
		self.visibility.set_type_filter(kind, enabled);
	}

	/// Whether `kind` is shown.
	pub fn is_kind_enabled(&self, kind: NodeKind) -> bool {
		self.visibility.is_kind_enabled(kind)
	}

	/// Whether panel `id` is expanded.
	pub fn is_expanded(&self, id: &NodeId) -> bool {
		self.visibility.is_expanded(id)
	}

	/// Highlight of the current selection.
	pub fn current_highlight(&self) -> Option<&HighlightSet> {
		self.highlighter.current_highlight()
	}

	/// Visible subgraph for the current state.
	pub fn visibility(&self) -> Visibility {
		self.visibility.compute_visibility(&self.graph)
	}

	/// Nav tree over the current records.
	pub fn panel_tree(&self) -> PanelForest {
		assemble(&self.records.power_sources, &self.records.panels)
	}

	/// Snapshot for the renderer.
	pub fn view(&self) -> DiagramView {
		let visibility = self.visibility();
		let highlight = self.highlighter.current_highlight();

		let nodes = self
			.graph
			.nodes()
			.map(|node| ViewNode {
				id: node.id.clone(),
				kind: node.kind,
				label: node.label.clone(),
				visible: visibility.is_node_visible(&node.id),
				selected: highlight.is_some_and(|h| h.selected == node.id),
				highlight: highlight.and_then(|h| h.node_class(&node.id)),
			})
			.collect();

		let real = self.graph.edges().map(|edge| ViewEdge {
			id: edge.id.clone(),
			from: edge.from.clone(),
			to: edge.to.clone(),
			visible: visibility.is_node_visible(&edge.from) && visibility.is_node_visible(&edge.to),
			real: true,
			label: None,
			highlight: highlight.and_then(|h| h.edge_class(&edge.id)),
		});
		let bypass = visibility.virtual_edges.iter().chain(&visibility.ancestor_edges).map(|v| ViewEdge {
			id: v.edge.id.clone(),
			from: v.edge.from.clone(),
			to: v.edge.to.clone(),
			visible: true,
			real: false,
			label: Some(v.label.clone()),
			highlight: highlight.and_then(|h| h.virtual_edge_class(&v.edge)),
		});

		DiagramView {
			generation: self.generation,
			nodes,
			edges: real.chain(bypass).collect(),
		}
	}
}
