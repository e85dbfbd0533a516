//! Typed node/edge graph over the distribution network.
//!
//! Nodes and edges live in insertion-ordered arenas and are addressed by
//! stable string ids, never by pointer. Adjacency lists keep arena indices in
//! the order edges were discovered, which is what the upstream tie-break
//! relies on.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use super::records::Attributes;

/// Closed set of entity kinds in the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
	/// A grid connection or generator.
	PowerSource,
	/// A distribution panel.
	Panel,
	/// A circuit breaker inside a panel.
	Breaker,
	/// A terminal consumer.
	Load,
}

impl NodeKind {
	/// Every kind, in diagram order.
	pub const ALL: [NodeKind; 4] = [
		NodeKind::PowerSource,
		NodeKind::Panel,
		NodeKind::Breaker,
		NodeKind::Load,
	];

	/// Prefix used in node ids, e.g. `panel` in `panel:7`.
	pub fn prefix(self) -> &'static str {
		match self {
			NodeKind::PowerSource => "power_source",
			NodeKind::Panel => "panel",
			NodeKind::Breaker => "breaker",
			NodeKind::Load => "load",
		}
	}

	/// Human-readable name for filters and headings.
	pub fn display_name(self) -> &'static str {
		match self {
			NodeKind::PowerSource => "Power source",
			NodeKind::Panel => "Panel",
			NodeKind::Breaker => "Breaker",
			NodeKind::Load => "Load",
		}
	}

	/// Attribute keys shown in the details panel for this kind.
	pub fn detail_keys(self) -> &'static [&'static str] {
		match self {
			NodeKind::PowerSource => &["source_type", "voltage", "capacity"],
			NodeKind::Panel => &["panel_type", "voltage", "current_rating"],
			NodeKind::Breaker => &["breaker_type", "rated_current", "number_of_poles"],
			NodeKind::Load => &["voltage", "power", "current"],
		}
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.prefix())
	}
}

/// Globally unique node id of the form `kind:recordId`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
	/// Id of the record `record_id` of kind `kind`.
	pub fn new(kind: NodeKind, record_id: u64) -> Self {
		Self(format!("{}:{}", kind.prefix(), record_id))
	}

	/// The raw `kind:id` string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for NodeId {
	fn from(s: &str) -> Self {
		Self(s.to_owned())
	}
}

impl From<String> for NodeId {
	fn from(s: String) -> Self {
		Self(s)
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Edge id of the form `from->to`, or `virtual:from->to` for bypass edges.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(String);

impl EdgeId {
	/// Id of the stored edge `from -> to`.
	pub fn real(from: &NodeId, to: &NodeId) -> Self {
		Self(format!("{from}->{to}"))
	}

	/// Id of a synthesized edge, kept apart from real edge ids.
	pub fn bypass(from: &NodeId, to: &NodeId) -> Self {
		Self(format!("virtual:{from}->{to}"))
	}

	/// The raw edge id string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for EdgeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// One network entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// `kind:recordId`.
	pub id: NodeId,
	/// Entity kind.
	pub kind: NodeKind,
	/// Display label.
	pub label: String,
	/// Record fields beyond the foreign keys.
	pub attributes: Attributes,
	/// Structural parent used by the nav tree (not necessarily an edge).
	pub parent_hint: Option<NodeId>,
}

impl Node {
	/// `(key, value)` rows for the details panel, skipping absent attributes.
	pub fn detail_rows(&self) -> Vec<(&'static str, String)> {
		self.kind
			.detail_keys()
			.iter()
			.filter_map(|&key| {
				let value = self.attributes.get(key)?;
				let text = match value {
					Value::Null => return None,
					Value::String(s) => s.clone(),
					other => other.to_string(),
				};
				Some((key, text))
			})
			.collect()
	}
}

/// How the `from` endpoint relates to the `to` endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
	/// Power flows from `from` into `to`.
	Feeds,
	/// `to` is a sub panel nested under panel `from`.
	Parents,
}

/// A directed edge in power-flow direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
	/// Unique edge id.
	pub id: EdgeId,
	/// Upstream endpoint.
	pub from: NodeId,
	/// Downstream endpoint.
	pub to: NodeId,
	/// What the edge means.
	pub relation: Relation,
	/// `false` for bypass edges synthesized by the visibility pass.
	pub real: bool,
}

/// A foreign key that pointed at a record not present in the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DanglingRef {
	/// Node holding the foreign key target, which is missing.
	pub from: NodeId,
	/// Node that carries the foreign key.
	pub to: NodeId,
	/// Relation the edge would have had.
	pub relation: Relation,
}

/// Non-fatal problems found while building a graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildDiagnostics {
	/// Foreign keys to absent records.
	pub dangling: Vec<DanglingRef>,
	/// Records whose id was already taken.
	pub duplicate_nodes: Vec<NodeId>,
	/// Edges added twice.
	pub duplicate_edges: Vec<EdgeId>,
}

impl BuildDiagnostics {
	/// No diagnostics were recorded.
	pub fn is_clean(&self) -> bool {
		self.dangling.is_empty() && self.duplicate_nodes.is_empty() && self.duplicate_edges.is_empty()
	}
}

/// Directed, possibly cyclic graph of the network.
///
/// Every stored edge refers to two stored nodes.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<Node>,
	node_index: HashMap<NodeId, usize>,
	edges: Vec<Edge>,
	edge_index: HashMap<EdgeId, usize>,
	outgoing: HashMap<NodeId, Vec<usize>>,
	incoming: HashMap<NodeId, Vec<usize>>,
	diagnostics: BuildDiagnostics,
}

impl Graph {
	/// An empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a node. Returns `false` if the id is already taken.
	pub(crate) fn add_node(&mut self, node: Node) -> bool {
		if self.node_index.contains_key(&node.id) {
			return false;
		}
		self.node_index.insert(node.id.clone(), self.nodes.len());
		self.nodes.push(node);
		true
	}

	/// Insert a real edge between two existing nodes.
	///
	/// Returns `None` if either endpoint is missing or the edge already exists.
	pub(crate) fn add_edge(&mut self, from: &NodeId, to: &NodeId, relation: Relation) -> Option<EdgeId> {
		if !self.contains_node(from) || !self.contains_node(to) {
			return None;
		}
		let id = EdgeId::real(from, to);
		if self.edge_index.contains_key(&id) {
			return None;
		}
		let idx = self.edges.len();
		self.edges.push(Edge {
			id: id.clone(),
			from: from.clone(),
			to: to.clone(),
			relation,
			real: true,
		});
		self.edge_index.insert(id.clone(), idx);
		self.outgoing.entry(from.clone()).or_default().push(idx);
		self.incoming.entry(to.clone()).or_default().push(idx);
		Some(id)
	}

	pub(crate) fn diagnostics_mut(&mut self) -> &mut BuildDiagnostics {
		&mut self.diagnostics
	}

	/// Problems found while building.
	pub fn diagnostics(&self) -> &BuildDiagnostics {
		&self.diagnostics
	}

	/// Whether `id` is a node of this graph.
	pub fn contains_node(&self, id: &NodeId) -> bool {
		self.node_index.contains_key(id)
	}

	/// Look up a node.
	pub fn node(&self, id: &NodeId) -> Option<&Node> {
		self.node_index.get(id).map(|&idx| &self.nodes[idx])
	}

	/// Look up an edge.
	pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
		self.edge_index.get(id).map(|&idx| &self.edges[idx])
	}

	/// Kind of `id`, if it is a node.
	pub fn kind_of(&self, id: &NodeId) -> Option<NodeKind> {
		self.node(id).map(|n| n.kind)
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.nodes.iter()
	}

	/// Edges in insertion order.
	pub fn edges(&self) -> impl Iterator<Item = &Edge> {
		self.edges.iter()
	}

	/// Outgoing edges of `id` in discovery order.
	pub fn outgoing(&self, id: &NodeId) -> impl Iterator<Item = &Edge> + '_ {
		self.outgoing
			.get(id)
			.into_iter()
			.flatten()
			.map(move |&idx| &self.edges[idx])
	}

	/// Incoming edges of `id` in discovery order.
	pub fn incoming(&self, id: &NodeId) -> impl Iterator<Item = &Edge> + '_ {
		self.incoming
			.get(id)
			.into_iter()
			.flatten()
			.map(move |&idx| &self.edges[idx])
	}

	/// The panel feeding a breaker, i.e. the `from` end of its first incoming
	/// panel edge.
	pub fn feeding_panel(&self, breaker: &NodeId) -> Option<&NodeId> {
		self.incoming(breaker)
			.find(|e| self.kind_of(&e.from) == Some(NodeKind::Panel))
			.map(|e| &e.from)
	}

	/// Number of nodes.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of edges.
	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}
}
