//! Diagram configuration: layout physics, colors and initial view state.

use force_graph::SimulationParameters;
use serde::Deserialize;

use crate::network::error::NetworkError;
use crate::network::graph::NodeKind;
use crate::network::visibility::VisibilityState;

/// Force layout parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
	/// Repulsion between nodes.
	pub force_charge: f32,
	/// Edge spring stiffness.
	pub force_spring: f32,
	/// Cap on the force applied per step.
	pub force_max: f32,
	/// Maximum node speed.
	pub node_speed: f32,
	/// Velocity kept per step.
	pub damping_factor: f32,
}

impl Default for SimulationSettings {
	fn default() -> Self {
		Self {
			force_charge: 300.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		}
	}
}

impl SimulationSettings {
	/// Parameters for `force_graph`.
	pub fn to_parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		}
	}
}

/// Node fill color per kind.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KindColors {
	/// Color of power sources.
	pub power_source: String,
	/// Color of panels.
	pub panel: String,
	/// Color of breakers.
	pub breaker: String,
	/// Color of loads.
	pub load: String,
}

impl Default for KindColors {
	fn default() -> Self {
		Self {
			power_source: "#dc3545".into(),
			panel: "#198754".into(),
			breaker: "#ffc107".into(),
			load: "#0d6efd".into(),
		}
	}
}

impl KindColors {
	/// Color for `kind`.
	pub fn for_kind(&self, kind: NodeKind) -> &str {
		match kind {
			NodeKind::PowerSource => &self.power_source,
			NodeKind::Panel => &self.panel,
			NodeKind::Breaker => &self.breaker,
			NodeKind::Load => &self.load,
		}
	}
}

/// Settings for one diagram.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
	/// Layout physics.
	pub simulation: SimulationSettings,
	/// Per-kind colors.
	pub colors: KindColors,
	/// Highlight color of upstream paths.
	pub upstream_color: String,
	/// Highlight color of downstream paths.
	pub downstream_color: String,
	/// Kinds switched off when a session starts.
	pub hidden_kinds: Vec<NodeKind>,
	/// Start with every panel collapsed (breakers hidden).
	pub collapse_breakers: bool,
}

impl Default for DiagramConfig {
	fn default() -> Self {
		Self {
			simulation: SimulationSettings::default(),
			colors: KindColors::default(),
			upstream_color: "#ff6600".into(),
			downstream_color: "#00aaff".into(),
			hidden_kinds: Vec::new(),
			collapse_breakers: true,
		}
	}
}

impl DiagramConfig {
	/// Parse overrides; absent fields keep their defaults.
	pub fn from_json(json: &str) -> Result<Self, NetworkError> {
		serde_json::from_str(json).map_err(NetworkError::Config)
	}

	/// Type filters for a fresh session. Expansion is filled in per graph.
	pub fn initial_visibility(&self) -> VisibilityState {
		let mut state = VisibilityState::default();
		for kind in &self.hidden_kinds {
			state.type_filters.remove(kind);
		}
		state
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_partial_override_keeps_defaults() {
		let config = DiagramConfig::from_json(
			r##"{ "colors": { "load": "#000000" }, "hidden_kinds": ["power_source"] }"##,
		)
		.unwrap();

		assert_eq!(config.colors.for_kind(NodeKind::Load), "#000000");
		assert_eq!(config.colors.for_kind(NodeKind::Panel), "#198754");
		assert!(config.collapse_breakers);
		assert_eq!(config.simulation, SimulationSettings::default());

		let state = config.initial_visibility();
		assert!(!state.type_filters.contains(&NodeKind::PowerSource));
		assert!(state.type_filters.contains(&NodeKind::Breaker));
	}

	#[test]
	fn test_bad_config_is_reported() {
		let err = DiagramConfig::from_json(r#"{ "collapse_breakers": "yes" }"#).unwrap_err();
		assert!(matches!(err, NetworkError::Config(_)));
	}
}
