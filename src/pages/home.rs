use leptos::prelude::*;
use log::{debug, error};

use crate::components::network_diagram::{DiagramData, NetworkDiagramCanvas};
use crate::components::panel_tree::PanelTree;
use crate::config::DiagramConfig;
use crate::network::{DiagramSession, NetworkRecords, NodeId, NodeKind};

const SAMPLE_NETWORK: &str = include_str!("../../assets/sample_network.json");

fn load_sample() -> NetworkRecords {
	NetworkRecords::from_json(SAMPLE_NETWORK).unwrap_or_else(|err| {
		error!("Bundled network failed to load: {err}");
		NetworkRecords::default()
	})
}

/// Owned snapshot of the selected node for the details panel.
#[derive(Clone, Debug, PartialEq)]
struct SelectionDetails {
	label: String,
	kind: NodeKind,
	rows: Vec<(&'static str, String)>,
	path: Vec<(NodeKind, Vec<String>)>,
}

fn selection_details(session: &DiagramSession) -> Option<SelectionDetails> {
	let highlight = session.current_highlight()?;
	let graph = session.graph();
	let node = graph.node(&highlight.selected)?;
	let summary = highlight.summary(graph);
	let path = NodeKind::ALL
		.into_iter()
		.map(|kind| {
			let labels = summary
				.of_kind(kind)
				.iter()
				.filter_map(|id| graph.node(id))
				.map(|n| n.label.clone())
				.collect::<Vec<_>>();
			(kind, labels)
		})
		.filter(|(_, labels)| !labels.is_empty())
		.collect();
	Some(SelectionDetails {
		label: node.label.clone(),
		kind: node.kind,
		rows: node.detail_rows(),
		path,
	})
}

#[component]
fn DetailsPanel(#[prop(into)] details: Signal<Option<SelectionDetails>>) -> impl IntoView {
	move || match details.get() {
		None => view! { <p class="details-empty">"Click a node to trace its supply."</p> }.into_any(),
		Some(SelectionDetails { label, kind, rows, path }) => view! {
			<h3>{label}</h3>
			<p class="details-kind">{kind.display_name()}</p>
			<table class="details-attributes">
				{rows
					.into_iter()
					.map(|(key, value)| view! {
						<tr>
							<th>{key}</th>
							<td>{value}</td>
						</tr>
					})
					.collect_view()}
			</table>
			<h4>"On this path"</h4>
			<ul class="details-path">
				{path
					.into_iter()
					.map(|(kind, labels)| view! {
						<li>
							<strong>{kind.display_name()}": "</strong>
							{labels.join(", ")}
						</li>
					})
					.collect_view()}
			</ul>
		}
		.into_any(),
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = DiagramConfig::default();
	let colors = config.colors.clone();
	let session = RwSignal::new(DiagramSession::new(load_sample(), config.clone()));

	let diagram = Signal::derive(move || session.with(|s| DiagramData::from_view(&s.view(), &colors)));
	let forest = Signal::derive(move || session.with(DiagramSession::panel_tree));
	let details = Signal::derive(move || session.with(selection_details));
	let issues = Signal::derive(move || {
		session.with(|s| {
			let diagnostics = s.graph().diagnostics();
			diagnostics.dangling.len() + diagnostics.duplicate_nodes.len()
		})
	});

	let on_select = Callback::new(move |id: String| {
		debug!("Selected {id}");
		session.update(|s| {
			s.select(&NodeId::from(id));
		});
	});
	let on_deselect = Callback::new(move |_: ()| session.update(DiagramSession::deselect));
	let on_reload = move |_| {
		session.update(|s| {
			if let Err(err) = s.refresh_from_json(SAMPLE_NETWORK) {
				error!("Reload failed, keeping current network: {err}");
			}
		});
	};

	let filters = NodeKind::ALL
		.into_iter()
		.map(|kind| {
			view! {
				<label class="type-filter">
					<input
						type="checkbox"
						prop:checked=move || session.with(|s| s.is_kind_enabled(kind))
						on:change=move |ev| {
							let enabled = event_target_checked(&ev);
							session.update(|s| s.set_type_filter(kind, enabled));
						}
					/>
					{kind.display_name()}
				</label>
			}
		})
		.collect_view();

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<NetworkDiagramCanvas
					data=diagram
					config=config
					on_select=on_select
					on_deselect=on_deselect
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Power Network"</h1>
					<p class="subtitle">
						"Click a panel to show its breakers. Click any node to trace its supply."
					</p>
					<div class="type-filters">{filters}</div>
					<button on:click=on_reload>"Reload network"</button>
					<Show when=move || { issues.get() > 0 }>
						<p class="build-issues">
							{move || format!("{} problems found in the network data", issues.get())}
						</p>
					</Show>
				</div>
				<aside class="side-panel">
					<DetailsPanel details=details />
					<PanelTree forest=forest on_select=on_select />
				</aside>
			</div>
		</ErrorBoundary>
	}
}
