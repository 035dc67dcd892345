//! Shape classification: decide which conversion/layout path a parsed dataset
//! takes.

use std::fmt;

use serde_json::Value;

/// Structural category of a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
	/// Object with `nodes` and `links`.
	Network,
	/// Array of arrays, or an object with a 2D `values` array.
	Grid,
	/// Object with `series` and `timePoints`.
	Series,
	/// Object with `children`, or a root carrying both `id` and `name`.
	Tree,
	/// Array of flat records.
	Tabular,
	/// None of the above.
	Unsupported,
}

impl fmt::Display for Shape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Shape::Network => "network",
			Shape::Grid => "grid",
			Shape::Series => "series",
			Shape::Tree => "tree",
			Shape::Tabular => "tabular",
			Shape::Unsupported => "unsupported",
		})
	}
}

fn is_grid(value: &Value) -> bool {
	value
		.as_array()
		.is_some_and(|rows| !rows.is_empty() && rows.iter().all(Value::is_array))
}

fn is_flat_record(value: &Value) -> bool {
	value
		.as_object()
		.is_some_and(|record| record.values().all(|v| !v.is_object() && !v.is_array()))
}

fn present(value: &Value, key: &str) -> bool {
	value.get(key).is_some_and(|v| !v.is_null())
}

/// Classifies a dataset. The first matching rule wins:
/// network, array-of-arrays grid, `values` grid, series, tree, tabular.
pub fn classify(data: &Value) -> Shape {
	if present(data, "nodes") && present(data, "links") {
		return Shape::Network;
	}
	if is_grid(data) {
		return Shape::Grid;
	}
	if data.get("values").is_some_and(is_grid) {
		return Shape::Grid;
	}
	if data.get("series").is_some_and(Value::is_array)
		&& data.get("timePoints").is_some_and(Value::is_array)
	{
		return Shape::Series;
	}
	if data.is_object()
		&& (data.get("children").is_some_and(Value::is_array)
			|| (present(data, "id") && present(data, "name")))
	{
		return Shape::Tree;
	}
	if data
		.as_array()
		.is_some_and(|items| items.iter().all(is_flat_record))
	{
		return Shape::Tabular;
	}
	Shape::Unsupported
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn network_beats_tree() {
		let data = json!({ "nodes": [], "links": [], "children": [], "id": 1, "name": "r" });
		assert_eq!(classify(&data), Shape::Network);
	}

	#[test]
	fn single_column_grid_is_not_tabular() {
		assert_eq!(classify(&json!([[1], [2]])), Shape::Grid);
		assert_eq!(classify(&json!({ "values": [[1, 2], [3, 4]] })), Shape::Grid);
	}

	#[test]
	fn empty_values_is_not_a_grid() {
		assert_eq!(classify(&json!({ "values": [] })), Shape::Unsupported);
	}

	#[test]
	fn series_requires_time_points() {
		let series = json!({ "series": [{ "name": "a", "values": [1] }], "timePoints": ["t"] });
		assert_eq!(classify(&series), Shape::Series);
		assert_eq!(classify(&json!({ "series": [] })), Shape::Unsupported);
	}

	#[test]
	fn tree_roots() {
		assert_eq!(classify(&json!({ "children": [] })), Shape::Tree);
		assert_eq!(classify(&json!({ "id": "CEO", "name": "Chief" })), Shape::Tree);
		assert_eq!(classify(&json!({ "id": "CEO" })), Shape::Unsupported);
	}

	#[test]
	fn tabular_rows_must_be_flat() {
		assert_eq!(classify(&json!([{ "a": 1, "b": "x" }, { "a": null }])), Shape::Tabular);
		assert_eq!(classify(&json!([])), Shape::Tabular);
		assert_eq!(classify(&json!([{ "a": { "nested": 1 } }])), Shape::Unsupported);
		assert_eq!(classify(&json!([1, 2, 3])), Shape::Unsupported);
	}

	#[test]
	fn classification_is_stable() {
		let data = json!([{ "source": 1, "target": 2 }]);
		let first = classify(&data);
		for _ in 0..10 {
			assert_eq!(classify(&data), first);
		}
	}
}
