use thiserror::Error;

use super::pipeline::ChartKind;
use super::shape::Shape;

/// Failures at the edges of the data core. Conversions themselves degrade
/// instead of failing; these cover input text, dispatch and option checks.
#[derive(Debug, Error)]
pub enum DataError {
	/// The input text is not JSON.
	#[error("invalid JSON: {0}")]
	Json(#[from] serde_json::Error),
	/// The dataset's shape cannot feed the requested chart.
	#[error("{shape} data cannot be shown as a {chart} chart")]
	Unsupported {
		/// Classified shape of the input.
		shape: Shape,
		/// Requested chart.
		chart: ChartKind,
	},
	/// No converter exists for this pair of shapes.
	#[error("no conversion from {from} to {to}")]
	UnsupportedConversion {
		/// Source shape.
		from: Shape,
		/// Target shape.
		to: Shape,
	},
	/// Layout options out of range.
	#[error("invalid layout options: {0}")]
	InvalidOptions(String),
}
