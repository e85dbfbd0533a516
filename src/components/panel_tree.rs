//! Navigation tree of power sources and the panels they feed.

use leptos::prelude::*;

use crate::network::tree::{OrphanPanel, OrphanReason};
use crate::network::{PanelForest, TreeNode};

fn reason_text(reason: OrphanReason) -> &'static str {
	match reason {
		OrphanReason::MissingPowerSource => "power source missing",
		OrphanReason::MissingParent => "parent panel missing",
		OrphanReason::UnresolvedParent => "parent never placed",
		OrphanReason::DuplicateId => "duplicate id",
	}
}

fn tree_item(node: TreeNode, on_select: Callback<String>) -> AnyView {
	let id = node.id.to_string();
	let badge = node.panel_type.map(|t| t.as_str());
	let children = node
		.children
		.into_iter()
		.map(|child| tree_item(child, on_select))
		.collect_view();

	view! {
		<li class="panel-tree-item">
			<button class="panel-tree-label" on:click=move |_| on_select.run(id.clone())>
				{node.label}
				{badge.map(|b| view! { <span class="panel-tree-badge">{b}</span> })}
			</button>
			<ul>{children}</ul>
		</li>
	}
	.into_any()
}

fn orphan_item(orphan: OrphanPanel) -> impl IntoView {
	view! {
		<li class="panel-tree-orphan">
			{orphan.name}
			" ("
			{reason_text(orphan.reason)}
			")"
		</li>
	}
}

/// Power source → panel → sub panel tree with orphan listing.
#[component]
pub fn PanelTree(
	#[prop(into)] forest: Signal<PanelForest>,
	#[prop(into)] on_select: Callback<String>,
) -> impl IntoView {
	view! {
		<nav class="panel-tree">
			{move || {
				let PanelForest { roots, orphans, stats } = forest.get();
				let has_orphans = !orphans.is_empty();
				view! {
					<p class="panel-tree-stats">
						{format!(
							"{} sources, {} main panels, {} sub panels",
							stats.power_sources,
							stats.main_panels,
							stats.sub_panels,
						)}
					</p>
					<ul>
						{roots.into_iter().map(|root| tree_item(root, on_select)).collect_view()}
					</ul>
					<Show when=move || has_orphans>
						<h4>"Unattached panels"</h4>
					</Show>
					<ul>{orphans.into_iter().map(orphan_item).collect_view()}</ul>
				}
			}}
		</nav>
	}
}
