use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData};

use super::types::{DiagramData, DiagramLink};
use crate::config::DiagramConfig;
use crate::network::{HighlightClass, NodeKind};

pub const HIT_RADIUS: f64 = 14.0;
/// Pointer travel (screen px) below which a press counts as a click.
pub const CLICK_SLOP: f64 = 4.0;

#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub id: String,
	pub label: String,
	pub kind: NodeKind,
	pub color: String,
	pub selected: bool,
	pub highlight: Option<HighlightClass>,
}

impl NodeInfo {
	pub fn radius(&self) -> f64 {
		node_radius(self.kind)
	}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LinkStyle {
	pub bypass: bool,
	pub highlight: Option<HighlightClass>,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

pub struct DiagramState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hovered: Option<DefaultNodeIdx>,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	/// Eases toward 1 while something is selected, toward 0 otherwise.
	pub highlight_t: f64,
	pub has_highlight: bool,
	pub upstream_color: String,
	pub downstream_color: String,
	generation: u64,
	links: HashMap<(DefaultNodeIdx, DefaultNodeIdx), LinkStyle>,
}

impl DiagramState {
	pub fn new(data: &DiagramData, config: &DiagramConfig, width: f64, height: f64) -> Self {
		let mut state = Self {
			graph: ForceGraph::new(config.simulation.to_parameters()),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hovered: None,
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
			highlight_t: 0.0,
			has_highlight: false,
			upstream_color: config.upstream_color.clone(),
			downstream_color: config.downstream_color.clone(),
			generation: data.generation,
			links: HashMap::new(),
		};
		state.populate(data, &HashMap::new(), config);
		state
	}

	/// Swap in a new view, keeping the layout of nodes that stay visible.
	///
	/// A view from a newer generation discards pinned positions too.
	pub fn apply(&mut self, data: &DiagramData, config: &DiagramConfig) {
		let mut previous = HashMap::new();
		if data.generation == self.generation {
			self.graph.visit_nodes(|node| {
				let info = &node.data.user_data;
				previous.insert(info.id.clone(), (node.x(), node.y(), node.data.is_anchor));
			});
		}
		self.graph = ForceGraph::new(config.simulation.to_parameters());
		self.links.clear();
		self.drag = DragState::default();
		self.hovered = None;
		self.generation = data.generation;
		self.populate(data, &previous, config);
	}

	fn populate(
		&mut self,
		data: &DiagramData,
		previous: &HashMap<String, (f32, f32, bool)>,
		config: &DiagramConfig,
	) {
		let mut id_to_idx = HashMap::new();
		let count = data.nodes.len().max(1) as f64;

		for (i, node) in data.nodes.iter().enumerate() {
			let (x, y, is_anchor) = previous.get(&node.id).copied().unwrap_or_else(|| {
				let angle = (i as f64) * 2.0 * PI / count;
				(
					(100.0 * angle.cos()) as f32,
					(100.0 * angle.sin()) as f32,
					false,
				)
			});
			let idx = self.graph.add_node(NodeData {
				x,
				y,
				mass: node_mass(node.kind),
				is_anchor,
				user_data: NodeInfo {
					id: node.id.clone(),
					label: node.label.clone(),
					kind: node.kind,
					color: node.color.clone(),
					selected: node.selected,
					highlight: node.highlight,
				},
			});
			id_to_idx.insert(node.id.clone(), idx);
		}

		for link in &data.links {
			if let (Some(&src), Some(&tgt)) =
				(id_to_idx.get(&link.source), id_to_idx.get(&link.target))
			{
				self.graph.add_edge(src, tgt, EdgeData::default());
				self.links.insert((src, tgt), link_style(link));
			}
		}

		self.has_highlight = data.has_highlight();
		self.upstream_color = config.upstream_color.clone();
		self.downstream_color = config.downstream_color.clone();
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			// HIT_RADIUS is in world-space, scales with zoom like nodes
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn node_id(&self, idx: DefaultNodeIdx) -> Option<String> {
		let mut id = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				id = Some(node.data.user_data.id.clone());
			}
		});
		id
	}

	pub fn link_style(&self, src: DefaultNodeIdx, tgt: DefaultNodeIdx) -> LinkStyle {
		self.links.get(&(src, tgt)).copied().unwrap_or_default()
	}

	pub fn highlight_color(&self, class: HighlightClass) -> &str {
		match class {
			HighlightClass::Upstream => &self.upstream_color,
			HighlightClass::Downstream => &self.downstream_color,
		}
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;

		let (target, speed) = if self.has_highlight { (1.0, 1.8) } else { (0.0, 1.26) };
		self.highlight_t += (target - self.highlight_t) * speed * dt as f64;
		if !self.has_highlight && self.highlight_t < 0.01 {
			self.highlight_t = 0.0;
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

/// Drawn radius in world units; sources and panels read as hubs.
pub fn node_radius(kind: NodeKind) -> f64 {
	match kind {
		NodeKind::PowerSource => 10.0,
		NodeKind::Panel => 8.5,
		NodeKind::Breaker => 5.5,
		NodeKind::Load => 7.0,
	}
}

fn node_mass(kind: NodeKind) -> f32 {
	match kind {
		NodeKind::PowerSource => 20.0,
		NodeKind::Panel => 15.0,
		NodeKind::Breaker | NodeKind::Load => 10.0,
	}
}

fn link_style(link: &DiagramLink) -> LinkStyle {
	LinkStyle {
		bypass: link.bypass,
		highlight: link.highlight,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::network::HighlightClass;
	use crate::components::network_diagram::types::DiagramNode;

	fn node(id: &str, kind: NodeKind) -> DiagramNode {
		DiagramNode {
			id: id.to_owned(),
			label: id.to_owned(),
			kind,
			color: "#ffffff".to_owned(),
			selected: false,
			highlight: None,
		}
	}

	fn diagram(generation: u64) -> DiagramData {
		DiagramData {
			generation,
			nodes: vec![node("power_source:1", NodeKind::PowerSource), node("load:1", NodeKind::Load)],
			links: vec![DiagramLink {
				source: "power_source:1".into(),
				target: "load:1".into(),
				bypass: true,
				highlight: Some(HighlightClass::Upstream),
			}],
		}
	}

	#[test]
	fn test_radius_follows_kind() {
		let state = DiagramState::new(&diagram(1), &DiagramConfig::default(), 800.0, 600.0);
		let mut radii = Vec::new();
		state.graph.visit_nodes(|n| radii.push((n.data.user_data.id.clone(), n.data.user_data.radius())));
		assert_eq!(radii, vec![("power_source:1".to_owned(), 10.0), ("load:1".to_owned(), 7.0)]);
		assert!(node_radius(NodeKind::Breaker) < node_radius(NodeKind::Panel));
	}

	#[test]
	fn test_link_style_and_node_ids() {
		let state = DiagramState::new(&diagram(1), &DiagramConfig::default(), 800.0, 600.0);
		let mut idx = Vec::new();
		state.graph.visit_nodes(|n| idx.push(n.index()));
		let style = state.link_style(idx[0], idx[1]);
		assert!(style.bypass);
		assert_eq!(style.highlight, Some(HighlightClass::Upstream));
		assert!(!state.link_style(idx[1], idx[0]).bypass);
		assert_eq!(state.node_id(idx[1]).as_deref(), Some("load:1"));
		assert_eq!(state.highlight_color(HighlightClass::Upstream), "#ff6600");
	}
}
