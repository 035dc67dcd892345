//! Field inference over tabular records, and range normalization for charts
//! whose fields span very different magnitudes.

use serde_json::Value;

use super::types::Record;

const EPSILON: f64 = 1e-12;

/// How a field's values should be treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
	/// JSON numbers.
	Numeric,
	/// Strings, booleans, nulls.
	Categorical,
	/// Nested objects or arrays.
	Hierarchical,
}

/// A field name together with its inferred kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldProfile {
	/// Field name.
	pub name: String,
	/// Inferred kind.
	pub kind: FieldKind,
}

/// Kind of a single value.
pub fn kind_of(value: &Value) -> FieldKind {
	match value {
		Value::Number(_) => FieldKind::Numeric,
		Value::Object(_) | Value::Array(_) => FieldKind::Hierarchical,
		_ => FieldKind::Categorical,
	}
}

/// Profiles fields in source order, judged by the first record.
pub fn profile(records: &[Record]) -> Vec<FieldProfile> {
	records
		.first()
		.map(|first| {
			first
				.iter()
				.map(|(name, value)| FieldProfile {
					name: name.clone(),
					kind: kind_of(value),
				})
				.collect()
		})
		.unwrap_or_default()
}

/// Names of numeric fields, in source order.
pub fn numeric_fields(records: &[Record]) -> Vec<String> {
	profile(records)
		.into_iter()
		.filter(|f| f.kind == FieldKind::Numeric)
		.map(|f| f.name)
		.collect()
}

/// First non-numeric field, used to label categories.
pub fn category_field(records: &[Record]) -> Option<String> {
	profile(records)
		.into_iter()
		.find(|f| f.kind != FieldKind::Numeric)
		.map(|f| f.name)
}

/// Category and value fields for a pie chart: the first categorical and the
/// first numeric field.
pub fn pie_fields(records: &[Record]) -> Option<(String, String)> {
	let fields = profile(records);
	let category = fields.iter().find(|f| f.kind != FieldKind::Numeric)?;
	let value = fields.iter().find(|f| f.kind == FieldKind::Numeric)?;
	Some((category.name.clone(), value.name.clone()))
}

/// Observed bounds of one numeric field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldRange {
	/// Smallest value.
	pub min: f64,
	/// Largest value.
	pub max: f64,
}

impl FieldRange {
	/// Bounds of `field` across all records, ignoring non-numeric cells.
	pub fn of(records: &[Record], field: &str) -> Option<Self> {
		records
			.iter()
			.filter_map(|r| r.get(field).and_then(Value::as_f64))
			.fold(None, |acc, v| match acc {
				None => Some(Self { min: v, max: v }),
				Some(r) => Some(Self {
					min: r.min.min(v),
					max: r.max.max(v),
				}),
			})
	}

	/// Maps `value` into `[0, 1]`; a zero-width range maps everything to 0.5.
	pub fn normalize(&self, value: f64) -> f64 {
		let span = self.max - self.min;
		if span.abs() < EPSILON {
			0.5
		} else {
			((value - self.min) / span).clamp(0.0, 1.0)
		}
	}

	/// `value / max`, as bar heights are scaled; 0 when `max` is zero.
	pub fn scale_to_max(&self, value: f64) -> f64 {
		if self.max.abs() < EPSILON {
			0.0
		} else {
			value / self.max
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn records(value: Value) -> Vec<Record> {
		value
			.as_array()
			.unwrap()
			.iter()
			.map(|v| v.as_object().unwrap().clone())
			.collect()
	}

	#[test]
	fn profile_follows_field_order() {
		let data = records(json!([{ "category": "a", "gdp": 3.8, "meta": { "x": 1 }, "ok": true }]));
		let kinds: Vec<_> = profile(&data).into_iter().map(|f| (f.name, f.kind)).collect();
		assert_eq!(
			kinds,
			vec![
				("category".to_string(), FieldKind::Categorical),
				("gdp".to_string(), FieldKind::Numeric),
				("meta".to_string(), FieldKind::Hierarchical),
				("ok".to_string(), FieldKind::Categorical),
			]
		);
	}

	#[test]
	fn pie_fields_pick_first_of_each_kind() {
		let data = records(json!([{ "v": 1, "label": "x", "w": 2, "other": "y" }]));
		assert_eq!(pie_fields(&data), Some(("label".into(), "v".into())));
		assert_eq!(numeric_fields(&data), vec!["v".to_string(), "w".to_string()]);
		assert_eq!(category_field(&data).as_deref(), Some("label"));
	}

	#[test]
	fn ranges_normalize_heterogeneous_fields() {
		let data = records(json!([{ "area": 1997, "gdp": 2.0 }, { "area": 82400, "gdp": 4.0 }]));
		let area = FieldRange::of(&data, "area").unwrap();
		let gdp = FieldRange::of(&data, "gdp").unwrap();
		assert_eq!(area.normalize(82400.0), 1.0);
		assert_eq!(gdp.normalize(3.0), 0.5);
		assert_eq!(gdp.scale_to_max(2.0), 0.5);
	}

	#[test]
	fn degenerate_ranges_do_not_divide_by_zero() {
		let flat = FieldRange { min: 3.0, max: 3.0 };
		assert_eq!(flat.normalize(3.0), 0.5);
		let zero = FieldRange { min: 0.0, max: 0.0 };
		assert_eq!(zero.scale_to_max(5.0), 0.0);
	}
}
