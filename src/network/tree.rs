//! Nested power source → panel → sub panel view for the navigation tree.
//!
//! Built straight from the records, independent of visibility state.

use std::collections::{HashMap, HashSet};

use log::warn;

use super::graph::{NodeId, NodeKind};
use super::records::{PanelRecord, PanelType, PowerSourceRecord};

/// A power source or panel with its nested panels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
	/// `kind:recordId`.
	pub id: NodeId,
	/// Entity kind.
	pub kind: NodeKind,
	/// Printed label.
	pub label: String,
	/// `None` for power sources.
	pub panel_type: Option<PanelType>,
	/// Nested panels in input order.
	pub children: Vec<TreeNode>,
}

impl TreeNode {
	/// Number of nodes in this subtree, including `self`.
	pub fn size(&self) -> usize {
		1 + self.children.iter().map(TreeNode::size).sum::<usize>()
	}
}

/// Why a panel was left out of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrphanReason {
	/// Main (or parentless) panel whose power source is absent.
	MissingPowerSource,
	/// `parent_panel` names a panel not in the input.
	MissingParent,
	/// Parent exists but never got placed: a parent cycle, or a chain that
	/// ends in another orphan.
	UnresolvedParent,
	/// Another panel with the same id was already taken.
	DuplicateId,
}

/// A panel left out of the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrphanPanel {
	/// `kind:recordId`.
	pub id: NodeId,
	/// Record name.
	pub name: String,
	/// Why it was left out.
	pub reason: OrphanReason,
}

/// Counts shown above the tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
	/// Power source records.
	pub power_sources: usize,
	/// Main panels.
	pub main_panels: usize,
	/// Panels that are not main panels.
	pub sub_panels: usize,
}

/// Result of [`assemble`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PanelForest {
	/// One root per power source, in input order.
	pub roots: Vec<TreeNode>,
	/// Panels that could not be attached anywhere.
	pub orphans: Vec<OrphanPanel>,
	/// Counts over the input.
	pub stats: TreeStats,
}

/// Nest panels under their power source or parent panel.
///
/// Main panels (and panels with no parent) go straight under their power
/// source. The remaining panels are drained in passes, each attaching every
/// panel whose parent is already placed, until nothing is pending or a pass
/// makes no progress. What is left becomes the orphan list.
pub fn assemble(power_sources: &[PowerSourceRecord], panels: &[PanelRecord]) -> PanelForest {
	let stats = TreeStats {
		power_sources: power_sources.len(),
		main_panels: panels.iter().filter(|p| p.panel_type == PanelType::Main).count(),
		sub_panels: panels.iter().filter(|p| p.panel_type != PanelType::Main).count(),
	};

	let mut roots: Vec<&PowerSourceRecord> = Vec::new();
	let mut source_ids = HashSet::new();
	for ps in power_sources {
		if source_ids.insert(ps.id) {
			roots.push(ps);
		}
	}
	let panel_ids: HashSet<u64> = panels.iter().map(|p| p.id).collect();

	let mut children: HashMap<NodeId, Vec<&PanelRecord>> = HashMap::new();
	let mut placed: HashSet<u64> = HashSet::new();
	let mut seen: HashSet<u64> = HashSet::new();
	let mut orphans = Vec::new();
	let mut pending: Vec<&PanelRecord> = Vec::new();

	for panel in panels {
		if !seen.insert(panel.id) {
			orphans.push(orphan(panel, OrphanReason::DuplicateId));
			continue;
		}
		let source = panel.power_source.filter(|ps| source_ids.contains(ps));
		let direct = panel.panel_type == PanelType::Main || panel.parent_panel.is_none();
		match source {
			Some(ps) if direct => {
				children
					.entry(NodeId::new(NodeKind::PowerSource, ps))
					.or_default()
					.push(panel);
				placed.insert(panel.id);
			}
			// A main panel without a usable source still nests under its parent.
			_ if panel.parent_panel.is_some() => pending.push(panel),
			_ => orphans.push(orphan(panel, OrphanReason::MissingPowerSource)),
		}
	}

	let mut progress = true;
	while !pending.is_empty() && progress {
		progress = false;
		let mut still_pending = Vec::with_capacity(pending.len());
		for panel in pending {
			match panel.parent_panel {
				Some(parent) if placed.contains(&parent) => {
					children
						.entry(NodeId::new(NodeKind::Panel, parent))
						.or_default()
						.push(panel);
					placed.insert(panel.id);
					progress = true;
				}
				_ => still_pending.push(panel),
			}
		}
		pending = still_pending;
	}

	for panel in pending {
		let reason = match panel.parent_panel {
			Some(parent) if panel_ids.contains(&parent) => OrphanReason::UnresolvedParent,
			_ => OrphanReason::MissingParent,
		};
		orphans.push(orphan(panel, reason));
	}

	let roots = roots
		.into_iter()
		.map(|ps| {
			let id = NodeId::new(NodeKind::PowerSource, ps.id);
			TreeNode {
				children: materialize(&children, &id),
				id,
				kind: NodeKind::PowerSource,
				label: ps.name.clone(),
				panel_type: None,
			}
		})
		.collect();

	PanelForest {
		roots,
		orphans,
		stats,
	}
}

/// Children of `parent`; `children` only ever links placed panels to already
/// placed parents, so it is a forest and the recursion is bounded.
fn materialize(children: &HashMap<NodeId, Vec<&PanelRecord>>, parent: &NodeId) -> Vec<TreeNode> {
	children
		.get(parent)
		.into_iter()
		.flatten()
		.map(|panel| {
			let id = NodeId::new(NodeKind::Panel, panel.id);
			TreeNode {
				children: materialize(children, &id),
				id,
				kind: NodeKind::Panel,
				label: panel.name.clone(),
				panel_type: Some(panel.panel_type),
			}
		})
		.collect()
}

fn orphan(panel: &PanelRecord, reason: OrphanReason) -> OrphanPanel {
	warn!("Panel {} ({}) left out of the tree: {reason:?}", panel.id, panel.name);
	OrphanPanel {
		id: NodeId::new(NodeKind::Panel, panel.id),
		name: panel.name.clone(),
		reason,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn labels(nodes: &[TreeNode]) -> Vec<&str> {
		nodes.iter().map(|n| n.label.as_str()).collect()
	}

	#[test]
	fn test_nests_out_of_order_input() {
		let sources = [PowerSourceRecord::new(1, "Grid"), PowerSourceRecord::new(2, "Generator")];
		// Deepest panel first: needs several passes.
		let panels = [
			PanelRecord::sub(4, "SDB-1A", 3),
			PanelRecord::sub(3, "SDB-1", 1),
			PanelRecord::main(1, "MDB", 1),
			PanelRecord::main(2, "Standby", 2),
		];
		let forest = assemble(&sources, &panels);

		assert!(forest.orphans.is_empty());
		assert_eq!(labels(&forest.roots), vec!["Grid", "Generator"]);
		let mdb = &forest.roots[0].children[0];
		assert_eq!(mdb.label, "MDB");
		assert_eq!(labels(&mdb.children), vec!["SDB-1"]);
		assert_eq!(labels(&mdb.children[0].children), vec!["SDB-1A"]);
		assert_eq!(labels(&forest.roots[1].children), vec!["Standby"]);
		assert_eq!(forest.roots.iter().map(TreeNode::size).sum::<usize>(), 6);
	}

	#[test]
	fn test_missing_parent_is_orphaned() {
		let sources = [PowerSourceRecord::new(1, "Grid")];
		let panels = [PanelRecord::main(1, "MDB", 1), PanelRecord::sub(2, "Lost", 99)];
		let forest = assemble(&sources, &panels);

		assert_eq!(forest.roots[0].size(), 2);
		assert_eq!(forest.orphans.len(), 1);
		assert_eq!(forest.orphans[0].id, NodeId::from("panel:2"));
		assert_eq!(forest.orphans[0].reason, OrphanReason::MissingParent);
	}

	#[test]
	fn test_parent_cycle_is_orphaned_not_looping() {
		let sources = [PowerSourceRecord::new(1, "Grid")];
		let panels = [
			PanelRecord::main(1, "MDB", 1),
			PanelRecord::sub(2, "A", 3),
			PanelRecord::sub(3, "B", 2),
			PanelRecord::sub(4, "Self", 4),
		];
		let forest = assemble(&sources, &panels);

		assert_eq!(forest.roots[0].size(), 2);
		let mut orphaned: Vec<_> = forest.orphans.iter().map(|o| o.id.to_string()).collect();
		orphaned.sort();
		assert_eq!(orphaned, vec!["panel:2", "panel:3", "panel:4"]);
		assert!(forest.orphans.iter().all(|o| o.reason == OrphanReason::UnresolvedParent));
	}

	#[test]
	fn test_chain_below_orphan_is_unresolved() {
		let panels = [PanelRecord::main(1, "MDB", 7), PanelRecord::sub(2, "SDB", 1)];
		let forest = assemble(&[], &panels);

		assert!(forest.roots.is_empty());
		assert_eq!(forest.orphans[0].reason, OrphanReason::MissingPowerSource);
		assert_eq!(forest.orphans[1].reason, OrphanReason::UnresolvedParent);
	}

	#[test]
	fn test_parentless_sub_panel_falls_back_to_power_source() {
		let sources = [PowerSourceRecord::new(1, "Grid")];
		let mut panel = PanelRecord::main(5, "Kiosk", 1);
		panel.panel_type = PanelType::SubMain;
		let forest = assemble(&sources, &[panel]);
		assert_eq!(labels(&forest.roots[0].children), vec!["Kiosk"]);
		assert_eq!(forest.roots[0].children[0].panel_type, Some(PanelType::SubMain));
	}

	#[test]
	fn test_main_panel_without_source_nests_under_parent() {
		let sources = [PowerSourceRecord::new(1, "Grid")];
		let mut odd = PanelRecord::main(2, "Odd", 1);
		odd.power_source = None;
		odd.parent_panel = Some(1);
		let mut stray = PanelRecord::main(3, "Stray", 99);
		stray.parent_panel = Some(1);
		let forest = assemble(&sources, &[odd, stray, PanelRecord::main(1, "MDB", 1)]);

		assert!(forest.orphans.is_empty());
		assert_eq!(labels(&forest.roots[0].children), vec!["MDB"]);
		assert_eq!(labels(&forest.roots[0].children[0].children), vec!["Odd", "Stray"]);
	}

	#[test]
	fn test_conflicting_panel_fields() {
		let sources = [PowerSourceRecord::new(1, "Grid")];
		// Main with a parent still hangs off its source.
		let mut main = PanelRecord::main(2, "Main-2", 1);
		main.parent_panel = Some(1);
		// Sub with a source and a parent follows the parent.
		let mut nested = PanelRecord::sub(3, "Nested", 1);
		nested.power_source = Some(1);
		// Sub with a source and no parent sits under the source.
		let mut loose = PanelRecord::main(4, "Loose", 1);
		loose.panel_type = PanelType::Sub;
		let panels = [PanelRecord::main(1, "MDB", 1), main, nested, loose];
		let forest = assemble(&sources, &panels);

		assert!(forest.orphans.is_empty());
		assert_eq!(labels(&forest.roots[0].children), vec!["MDB", "Main-2", "Loose"]);
		assert_eq!(labels(&forest.roots[0].children[0].children), vec!["Nested"]);
	}

	#[test]
	fn test_main_panel_without_source_or_parent_is_orphaned() {
		let mut panel = PanelRecord::main(1, "Floating", 1);
		panel.power_source = None;
		let forest = assemble(&[PowerSourceRecord::new(1, "Grid")], &[panel]);
		assert_eq!(forest.orphans[0].reason, OrphanReason::MissingPowerSource);
	}

	#[test]
	fn test_every_panel_placed_or_orphaned_once() {
		let sources = [PowerSourceRecord::new(1, "Grid")];
		let panels = [
			PanelRecord::main(1, "MDB", 1),
			PanelRecord::main(1, "MDB copy", 1),
			PanelRecord::sub(2, "SDB", 1),
			PanelRecord::sub(3, "Lost", 42),
		];
		let forest = assemble(&sources, &panels);

		let placed = forest.roots[0].size() - 1;
		assert_eq!(placed + forest.orphans.len(), panels.len());
		assert_eq!(forest.orphans[0].reason, OrphanReason::DuplicateId);
	}

	#[test]
	fn test_stats() {
		let sources = [PowerSourceRecord::new(1, "Grid")];
		let panels = [
			PanelRecord::main(1, "MDB", 1),
			PanelRecord::sub(2, "SDB", 1),
			PanelRecord::sub(3, "SDB-2", 1),
		];
		let stats = assemble(&sources, &panels).stats;
		assert_eq!(
			stats,
			TreeStats {
				power_sources: 1,
				main_panels: 1,
				sub_panels: 2,
			}
		);
	}

	#[test]
	fn test_unknown_panel_type_nests_like_sub_panel() {
		let sources = [PowerSourceRecord::new(1, "Grid")];
		let mut odd = PanelRecord::sub(2, "DB-X", 1);
		odd.panel_type = PanelType::Other;
		let forest = assemble(&sources, &[PanelRecord::main(1, "MDB", 1), odd]);

		assert!(forest.orphans.is_empty());
		assert_eq!(labels(&forest.roots[0].children[0].children), ["DB-X"]);
		assert_eq!(forest.stats.sub_panels, 1);
	}
}
