//! Error type for record and configuration ingestion.

use thiserror::Error;

/// Errors raised while ingesting records or configuration.
///
/// The graph model itself never fails: dangling references, cycles and stale
/// ids are diagnostics or no-ops.
#[derive(Debug, Error)]
pub enum NetworkError {
	/// The record payload is not valid JSON for the expected shape.
	#[error("malformed network payload: {0}")]
	Json(#[from] serde_json::Error),

	/// The configuration payload could not be parsed.
	#[error("malformed diagram config: {0}")]
	Config(#[source] serde_json::Error),
}
