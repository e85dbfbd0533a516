//! Flat entity records as delivered by the REST layer.
//!
//! Every record carries an integer `id` and the foreign keys that link it to
//! the rest of the network. Fields the graph core does not interpret are kept
//! in `extra` and surface as node attributes.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::error::NetworkError;

/// Extra record fields, keyed by field name.
pub type Attributes = BTreeMap<String, Value>;

/// A grid feed or generator.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PowerSourceRecord {
	/// Record id.
	pub id: u64,
	/// Record name.
	pub name: String,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Attributes,
}

/// Position of a panel in the distribution hierarchy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelType {
	/// Fed directly by a power source.
	#[default]
	Main,
	/// Intermediate distribution panel.
	SubMain,
	/// Final distribution panel.
	Sub,
	/// A type this crate does not know. Treated like a sub panel.
	#[serde(other)]
	Other,
}

impl PanelType {
	/// Wire name of the panel type.
	pub fn as_str(self) -> &'static str {
		match self {
			PanelType::Main => "main",
			PanelType::SubMain => "sub_main",
			PanelType::Sub => "sub",
			PanelType::Other => "other",
		}
	}
}

/// A distribution panel.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PanelRecord {
	/// Record id.
	pub id: u64,
	/// Record name.
	pub name: String,
	/// Position in the hierarchy.
	#[serde(default)]
	pub panel_type: PanelType,
	/// Feeding power source.
	#[serde(default)]
	pub power_source: Option<u64>,
	/// Panel this one is nested under.
	#[serde(default)]
	pub parent_panel: Option<u64>,
	/// Breaker in the parent panel that feeds this one. Informational only.
	#[serde(default)]
	pub feeder_breaker: Option<u64>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Attributes,
}

/// A circuit breaker.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct BreakerRecord {
	/// Record id.
	pub id: u64,
	/// Record name.
	#[serde(default)]
	pub name: Option<String>,
	/// Printed label.
	#[serde(default)]
	pub label: Option<String>,
	/// Panel the breaker sits in.
	#[serde(default)]
	pub panel: Option<u64>,
	/// Upstream breakers feeding this one.
	#[serde(default)]
	pub feeding_breakers: Vec<u64>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Attributes,
}

/// A terminal load.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LoadRecord {
	/// Record id.
	pub id: u64,
	/// Record name.
	pub name: String,
	/// Breaker feeding the load.
	#[serde(default)]
	pub breaker: Option<u64>,
	/// Panel the load is wired from. Informational only.
	#[serde(default)]
	pub panel: Option<u64>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Attributes,
}

/// The four collections a diagram is built from.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NetworkRecords {
	/// Power source records.
	#[serde(default)]
	pub power_sources: Vec<PowerSourceRecord>,
	/// Panel records.
	#[serde(default)]
	pub panels: Vec<PanelRecord>,
	/// Breaker records.
	#[serde(default)]
	pub breakers: Vec<BreakerRecord>,
	/// Load records.
	#[serde(default)]
	pub loads: Vec<LoadRecord>,
}

impl NetworkRecords {
	/// Parse a `{ power_sources, panels, breakers, loads }` payload.
	pub fn from_json(json: &str) -> Result<Self, NetworkError> {
		Ok(serde_json::from_str(json)?)
	}
}

impl PowerSourceRecord {
	/// Record with the given id and name.
	pub fn new(id: u64, name: impl Into<String>) -> Self {
		Self {
			id,
			name: name.into(),
			extra: Attributes::new(),
		}
	}
}

impl PanelRecord {
	/// A main panel fed straight from a power source.
	pub fn main(id: u64, name: impl Into<String>, power_source: u64) -> Self {
		Self {
			id,
			name: name.into(),
			panel_type: PanelType::Main,
			power_source: Some(power_source),
			..Self::default()
		}
	}

	/// A sub panel nested under `parent_panel`.
	pub fn sub(id: u64, name: impl Into<String>, parent_panel: u64) -> Self {
		Self {
			id,
			name: name.into(),
			panel_type: PanelType::Sub,
			parent_panel: Some(parent_panel),
			..Self::default()
		}
	}
}

impl BreakerRecord {
	/// A breaker in `panel` with no feeders.
	pub fn new(id: u64, panel: Option<u64>) -> Self {
		Self {
			id,
			panel,
			..Self::default()
		}
	}

	/// Add feeding breakers.
	pub fn fed_by(mut self, feeders: impl IntoIterator<Item = u64>) -> Self {
		self.feeding_breakers.extend(feeders);
		self
	}

	/// Set the breaker name.
	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Display label: name, then the short panel label, then a generated one.
	pub fn display_label(&self) -> String {
		self.name
			.as_deref()
			.or(self.label.as_deref())
			.filter(|s| !s.is_empty())
			.map(str::to_owned)
			.unwrap_or_else(|| format!("Breaker {}", self.id))
	}
}

impl LoadRecord {
	/// Record with the given id and name.
	pub fn new(id: u64, name: impl Into<String>, breaker: Option<u64>) -> Self {
		Self {
			id,
			name: name.into(),
			breaker,
			..Self::default()
		}
	}
}
