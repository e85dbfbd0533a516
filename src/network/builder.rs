//! Turns the four flat record collections into a [`Graph`].

use log::{info, warn};
use serde_json::Value;

use super::graph::{DanglingRef, EdgeId, Graph, Node, NodeId, NodeKind, Relation};
use super::records::{Attributes, NetworkRecords};

/// Build a fresh graph from `records`.
///
/// Every record becomes a node before any edge is added, so forward
/// references resolve regardless of input order. Foreign keys pointing at
/// missing records are skipped and recorded in the graph's diagnostics.
///
/// Edges are discovered in a fixed order: per panel its power source then its
/// parent panel, per breaker its panel then each listed feeder, per load its
/// breaker. Identical input therefore always yields identical id sets and
/// adjacency order.
pub fn build(records: &NetworkRecords) -> Graph {
	let mut builder = GraphBuilder::default();

	for ps in &records.power_sources {
		builder.node(NodeKind::PowerSource, ps.id, ps.name.clone(), ps.extra.clone(), None);
	}
	let panels: Vec<bool> = records
		.panels
		.iter()
		.map(|panel| {
			let mut attributes = panel.extra.clone();
			attributes.insert("panel_type".into(), Value::from(panel.panel_type.as_str()));
			if let Some(feeder) = panel.feeder_breaker {
				attributes.insert("feeder_breaker".into(), Value::from(feeder));
			}
			let parent_hint = panel
				.parent_panel
				.map(|p| NodeId::new(NodeKind::Panel, p))
				.or_else(|| panel.power_source.map(|ps| NodeId::new(NodeKind::PowerSource, ps)));
			builder.node(NodeKind::Panel, panel.id, panel.name.clone(), attributes, parent_hint)
		})
		.collect();
	let breakers: Vec<bool> = records
		.breakers
		.iter()
		.map(|breaker| {
			let mut attributes = breaker.extra.clone();
			if let Some(label) = &breaker.label {
				attributes.insert("label".into(), Value::from(label.as_str()));
			}
			let parent_hint = breaker.panel.map(|p| NodeId::new(NodeKind::Panel, p));
			builder.node(NodeKind::Breaker, breaker.id, breaker.display_label(), attributes, parent_hint)
		})
		.collect();
	let loads: Vec<bool> = records
		.loads
		.iter()
		.map(|load| {
			let parent_hint = load
				.breaker
				.map(|b| NodeId::new(NodeKind::Breaker, b))
				.or_else(|| load.panel.map(|p| NodeId::new(NodeKind::Panel, p)));
			builder.node(NodeKind::Load, load.id, load.name.clone(), load.extra.clone(), parent_hint)
		})
		.collect();

	// Duplicate records contribute no edges.
	for (panel, _) in records.panels.iter().zip(&panels).filter(|(_, ok)| **ok) {
		let to = NodeId::new(NodeKind::Panel, panel.id);
		if let Some(ps) = panel.power_source {
			builder.edge(NodeId::new(NodeKind::PowerSource, ps), &to, Relation::Feeds);
		}
		if let Some(parent) = panel.parent_panel {
			builder.edge(NodeId::new(NodeKind::Panel, parent), &to, Relation::Parents);
		}
	}
	for (breaker, _) in records.breakers.iter().zip(&breakers).filter(|(_, ok)| **ok) {
		let to = NodeId::new(NodeKind::Breaker, breaker.id);
		if let Some(panel) = breaker.panel {
			builder.edge(NodeId::new(NodeKind::Panel, panel), &to, Relation::Feeds);
		}
		for &feeder in &breaker.feeding_breakers {
			builder.edge(NodeId::new(NodeKind::Breaker, feeder), &to, Relation::Feeds);
		}
	}
	for (load, _) in records.loads.iter().zip(&loads).filter(|(_, ok)| **ok) {
		if let Some(breaker) = load.breaker {
			let to = NodeId::new(NodeKind::Load, load.id);
			builder.edge(NodeId::new(NodeKind::Breaker, breaker), &to, Relation::Feeds);
		}
	}

	let graph = builder.graph;
	info!(
		"Built network graph: {} nodes, {} edges, {} dangling references",
		graph.node_count(),
		graph.edge_count(),
		graph.diagnostics().dangling.len()
	);
	graph
}

#[derive(Default)]
struct GraphBuilder {
	graph: Graph,
}

impl GraphBuilder {
	fn node(
		&mut self,
		kind: NodeKind,
		record_id: u64,
		label: String,
		attributes: Attributes,
		parent_hint: Option<NodeId>,
	) -> bool {
		let id = NodeId::new(kind, record_id);
		let inserted = self.graph.add_node(Node {
			id: id.clone(),
			kind,
			label,
			attributes,
			parent_hint,
		});
		if !inserted {
			warn!("Duplicate record {id}; keeping the first occurrence");
			self.graph.diagnostics_mut().duplicate_nodes.push(id);
		}
		inserted
	}

	fn edge(&mut self, from: NodeId, to: &NodeId, relation: Relation) {
		if !self.graph.contains_node(&from) {
			warn!("{to} references missing {from}; edge skipped");
			self.graph.diagnostics_mut().dangling.push(DanglingRef {
				from,
				to: to.clone(),
				relation,
			});
			return;
		}
		if self.graph.add_edge(&from, to, relation).is_none() {
			self.graph
				.diagnostics_mut()
				.duplicate_edges
				.push(EdgeId::real(&from, to));
		}
	}
}
