//! From raw JSON to chart-ready data: classify, convert to the shape the chart
//! needs, and tag the result by chart.

use std::fmt;

use serde_json::Value;

use super::config::FieldConfig;
use super::convert::{Converted, convert, looks_nested};
use super::error::DataError;
use super::fields::{category_field, numeric_fields, pie_fields};
use super::shape::{Shape, classify};
use super::types::{Grid, NetworkData, Record, SeriesData, TreeNode};

/// The chart types the dashboard can draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChartKind {
	/// Columns per category and value field.
	Bar,
	/// Points placed by up to three numeric fields.
	Scatter,
	/// Force-directed node/link graph.
	Network,
	/// Height field over a grid.
	Surface,
	/// Polylines over time points.
	Line,
	/// Filled polylines over time points.
	Area,
	/// Slices sized by share.
	Pie,
	/// Flat colored grid.
	HeatMap,
	/// Layered hierarchy.
	Tree,
}

impl ChartKind {
	/// Every chart, in picker order.
	pub const ALL: [ChartKind; 9] = [
		ChartKind::Bar,
		ChartKind::Scatter,
		ChartKind::Network,
		ChartKind::Surface,
		ChartKind::Line,
		ChartKind::Area,
		ChartKind::Pie,
		ChartKind::HeatMap,
		ChartKind::Tree,
	];

	/// Shape a dataset must be converted to before this chart can use it.
	pub fn required_shape(self) -> Shape {
		match self {
			ChartKind::Bar | ChartKind::Scatter | ChartKind::Pie => Shape::Tabular,
			ChartKind::Network => Shape::Network,
			ChartKind::Surface | ChartKind::HeatMap => Shape::Grid,
			ChartKind::Line | ChartKind::Area => Shape::Series,
			ChartKind::Tree => Shape::Tree,
		}
	}

	/// Stable identifier, used in `<select>` values.
	pub fn slug(self) -> &'static str {
		match self {
			ChartKind::Bar => "bar",
			ChartKind::Scatter => "scatter",
			ChartKind::Network => "network",
			ChartKind::Surface => "surface",
			ChartKind::Line => "line",
			ChartKind::Area => "area",
			ChartKind::Pie => "pie",
			ChartKind::HeatMap => "heat-map",
			ChartKind::Tree => "tree",
		}
	}

	/// Human-readable name.
	pub fn label(self) -> &'static str {
		match self {
			ChartKind::Bar => "Bar",
			ChartKind::Scatter => "Scatter",
			ChartKind::Network => "Network",
			ChartKind::Surface => "Surface",
			ChartKind::Line => "Line",
			ChartKind::Area => "Area",
			ChartKind::Pie => "Pie",
			ChartKind::HeatMap => "Heat map",
			ChartKind::Tree => "Tree",
		}
	}

	/// Inverse of [`ChartKind::slug`].
	pub fn from_slug(slug: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.slug() == slug)
	}
}

impl fmt::Display for ChartKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.slug())
	}
}

/// A dataset converted for one chart.
#[derive(Clone, Debug, PartialEq)]
pub enum ChartData {
	/// Bar records with the category field and the value fields to draw.
	Bars {
		/// Rows.
		records: Vec<Record>,
		/// Field labelling each row.
		category: Option<String>,
		/// Numeric fields, one column each.
		values: Vec<String>,
	},
	/// Scatter records and the numeric fields used as x, y and z.
	Scatter {
		/// Rows.
		records: Vec<Record>,
		/// Up to three numeric fields.
		axes: Vec<String>,
	},
	/// Pie records with their category and value fields.
	Pie {
		/// Rows.
		records: Vec<Record>,
		/// Slice label field.
		category: String,
		/// Slice size field.
		value: String,
	},
	/// A graph for the force layout.
	Network(NetworkData),
	/// A hierarchy for the tree layout.
	Tree(TreeNode),
	/// A grid drawn as a height field.
	Surface(Grid),
	/// A grid drawn as colored cells.
	HeatMap(Grid),
	/// Series drawn as lines.
	Line(SeriesData),
	/// Series drawn as filled areas.
	Area(SeriesData),
}

impl ChartData {
	/// True when there is nothing to draw.
	pub fn is_empty(&self) -> bool {
		match self {
			ChartData::Bars { records, .. }
			| ChartData::Scatter { records, .. }
			| ChartData::Pie { records, .. } => records.is_empty(),
			ChartData::Network(network) => network.nodes.is_empty(),
			ChartData::Tree(_) => false,
			ChartData::Surface(grid) | ChartData::HeatMap(grid) => grid.is_empty(),
			ChartData::Line(series) | ChartData::Area(series) => series.series.is_empty(),
		}
	}
}

/// Parses dataset text.
pub fn parse_dataset(text: &str) -> Result<Value, DataError> {
	Ok(serde_json::from_str(text)?)
}

/// Parses a field configuration; blank text means the defaults.
pub fn parse_field_config(text: &str) -> Result<FieldConfig, DataError> {
	if text.trim().is_empty() {
		return Ok(FieldConfig::default());
	}
	Ok(serde_json::from_str(text)?)
}

/// Classifies `data` and converts it into what `chart` draws.
pub fn prepare(data: &Value, chart: ChartKind, fields: &FieldConfig) -> Result<ChartData, DataError> {
	let shape = match classify(data) {
		Shape::Unsupported if chart == ChartKind::Tree && looks_nested(data, fields) => Shape::Tree,
		shape => shape,
	};
	if shape == Shape::Unsupported {
		return Err(DataError::Unsupported { shape, chart });
	}
	let converted = convert(data, shape, chart.required_shape(), fields)
		.map_err(|_| DataError::Unsupported { shape, chart })?;
	Ok(match converted {
		Converted::Tabular(records) => tabular(chart, records, fields, shape)?,
		Converted::Network(network) => ChartData::Network(network),
		Converted::Tree(tree) => ChartData::Tree(tree),
		Converted::Grid(grid) if chart == ChartKind::HeatMap => ChartData::HeatMap(grid),
		Converted::Grid(grid) => ChartData::Surface(grid),
		Converted::Series(series) if chart == ChartKind::Area => ChartData::Area(series),
		Converted::Series(series) => ChartData::Line(series),
	})
}

fn tabular(
	chart: ChartKind,
	records: Vec<Record>,
	fields: &FieldConfig,
	shape: Shape,
) -> Result<ChartData, DataError> {
	match chart {
		ChartKind::Pie => {
			let (category, value) = match (&fields.category, pie_fields(&records)) {
				(Some(category), Some((_, value))) => (category.clone(), value),
				(None, Some(pair)) => pair,
				(_, None) if records.is_empty() => (String::new(), String::new()),
				(_, None) => return Err(DataError::Unsupported { shape, chart }),
			};
			Ok(ChartData::Pie {
				records,
				category,
				value,
			})
		}
		ChartKind::Scatter => {
			let axes = numeric_fields(&records).into_iter().take(3).collect();
			Ok(ChartData::Scatter { records, axes })
		}
		_ => {
			let values = fields
				.value_fields
				.clone()
				.unwrap_or_else(|| numeric_fields(&records));
			let category = fields.category.clone().or_else(|| category_field(&records));
			Ok(ChartData::Bars {
				records,
				category,
				values,
			})
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::NodeId;
	use serde_json::json;

	#[test]
	fn slugs_round_trip() {
		for kind in ChartKind::ALL {
			assert_eq!(ChartKind::from_slug(kind.slug()), Some(kind));
		}
		assert_eq!(ChartKind::from_slug("radar"), None);
	}

	#[test]
	fn bad_json_is_reported() {
		assert!(matches!(parse_dataset("{ nodes: "), Err(DataError::Json(_))));
		assert_eq!(parse_field_config("  ").unwrap(), FieldConfig::default());
		let fields = parse_field_config(r#"{ "x": "month" }"#).unwrap();
		assert_eq!(fields.x.as_deref(), Some("month"));
	}

	#[test]
	fn bars_keep_category_and_numeric_fields() {
		let data = json!([
			{ "country": "A", "gdp": 1.5, "area": 10 },
			{ "country": "B", "gdp": 2.5, "area": 20 }
		]);
		let prepared = prepare(&data, ChartKind::Bar, &FieldConfig::default()).unwrap();
		let ChartData::Bars { records, category, values } = prepared else {
			panic!("expected bars, got {prepared:?}");
		};
		assert_eq!(records.len(), 2);
		assert_eq!(category.as_deref(), Some("country"));
		assert_eq!(values, vec!["gdp".to_string(), "area".to_string()]);
	}

	#[test]
	fn pie_picks_category_and_value() {
		let data = json!([{ "share": 40, "browser": "x" }, { "share": 60, "browser": "y" }]);
		let prepared = prepare(&data, ChartKind::Pie, &FieldConfig::default()).unwrap();
		assert!(matches!(
			prepared,
			ChartData::Pie { ref category, ref value, .. } if category == "browser" && value == "share"
		));
	}

	#[test]
	fn network_becomes_tree_for_tree_chart() {
		let data = json!({
			"nodes": [{ "id": 1, "name": "a" }, { "id": 2, "name": "b" }],
			"links": [{ "source": 1, "target": 2 }]
		});
		let ChartData::Tree(root) = prepare(&data, ChartKind::Tree, &FieldConfig::default()).unwrap()
		else {
			panic!("expected a tree");
		};
		assert_eq!(root.id, NodeId::Int(1));
		assert_eq!(root.count(), 2);
	}

	#[test]
	fn renamed_tree_fields_still_reach_the_tree_chart() {
		let fields = parse_field_config(r#"{ "id": "key", "children": "reports" }"#).unwrap();
		let data = json!({ "key": "boss", "reports": [{ "key": "a" }, { "key": "b" }] });
		let ChartData::Tree(root) = prepare(&data, ChartKind::Tree, &fields).unwrap() else {
			panic!("expected a tree");
		};
		assert_eq!(root.count(), 3);
		assert_eq!(root.value, Some(1.0));
	}

	#[test]
	fn grids_feed_heat_maps_and_surfaces() {
		let data = json!([[1, 2], [3, 4]]);
		let fields = FieldConfig::default();
		assert!(matches!(
			prepare(&data, ChartKind::HeatMap, &fields).unwrap(),
			ChartData::HeatMap(ref g) if g.rows() == 2 && g.cols() == 2
		));
		assert!(matches!(prepare(&data, ChartKind::Surface, &fields).unwrap(), ChartData::Surface(_)));
	}

	#[test]
	fn series_feed_line_and_area() {
		let data = json!({ "timePoints": ["q1", "q2"], "series": [{ "name": "s", "values": [1, 2] }] });
		let fields = FieldConfig::default();
		assert!(matches!(prepare(&data, ChartKind::Area, &fields).unwrap(), ChartData::Area(_)));
		assert!(matches!(prepare(&data, ChartKind::Line, &fields).unwrap(), ChartData::Line(_)));
	}

	#[test]
	fn incompatible_pairs_are_unsupported() {
		let records = json!([{ "a": 1 }]);
		let err = prepare(&records, ChartKind::Line, &FieldConfig::default()).unwrap_err();
		assert!(matches!(
			err,
			DataError::Unsupported { shape: Shape::Tabular, chart: ChartKind::Line }
		));
		assert_eq!(err.to_string(), "tabular data cannot be shown as a line chart");

		let scalar = json!(42);
		assert!(matches!(
			prepare(&scalar, ChartKind::Bar, &FieldConfig::default()),
			Err(DataError::Unsupported { shape: Shape::Unsupported, .. })
		));
	}
}
