use crate::config::KindColors;
use crate::network::{DiagramView, HighlightClass, NodeKind};

#[derive(Clone, Debug, PartialEq)]
pub struct DiagramNode {
	pub id: String,
	pub label: String,
	pub kind: NodeKind,
	pub color: String,
	pub selected: bool,
	pub highlight: Option<HighlightClass>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiagramLink {
	pub source: String,
	pub target: String,
	/// Bypass edge standing in for collapsed breakers.
	pub bypass: bool,
	pub highlight: Option<HighlightClass>,
}

/// The visible part of a [`DiagramView`], ready to lay out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiagramData {
	pub generation: u64,
	pub nodes: Vec<DiagramNode>,
	pub links: Vec<DiagramLink>,
}

impl DiagramData {
	pub fn from_view(view: &DiagramView, colors: &KindColors) -> Self {
		let nodes = view
			.visible_nodes()
			.map(|n| DiagramNode {
				id: n.id.to_string(),
				label: n.label.clone(),
				kind: n.kind,
				color: colors.for_kind(n.kind).to_owned(),
				selected: n.selected,
				highlight: n.highlight,
			})
			.collect();
		let links = view
			.visible_edges()
			.map(|e| DiagramLink {
				source: e.from.to_string(),
				target: e.to.to_string(),
				bypass: !e.real,
				highlight: e.highlight,
			})
			.collect();
		Self {
			generation: view.generation,
			nodes,
			links,
		}
	}

	pub fn has_highlight(&self) -> bool {
		self.nodes.iter().any(|n| n.selected)
	}
}
