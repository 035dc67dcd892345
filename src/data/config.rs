use serde::{Deserialize, Serialize};

/// Field names used when converting between shapes. Every key is optional in
/// JSON; omitted keys take the conventional names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldConfig {
	/// Node id field (tree and network conversion).
	pub id: String,
	/// Display name field.
	pub name: String,
	/// Parent id field for flat parent-pointer arrays.
	pub parent: String,
	/// Node value or edge weight field.
	pub value: String,
	/// Nested children field.
	pub children: String,
	/// Edge source field.
	pub source: String,
	/// Edge target field.
	pub target: String,
	/// Node group field.
	pub group: String,
	/// Column axis field for grid conversion.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub x: Option<String>,
	/// Row axis field for grid conversion.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub y: Option<String>,
	/// Cell value field for grid conversion; `value` is used when absent.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub grid_value: Option<String>,
	/// Explicit category field for bar and pie charts.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	/// Explicit value fields for bar charts.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value_fields: Option<Vec<String>>,
}

impl Default for FieldConfig {
	fn default() -> Self {
		Self {
			id: "id".into(),
			name: "name".into(),
			parent: "parent".into(),
			value: "value".into(),
			children: "children".into(),
			source: "source".into(),
			target: "target".into(),
			group: "group".into(),
			x: None,
			y: None,
			grid_value: None,
			category: None,
			value_fields: None,
		}
	}
}

impl FieldConfig {
	/// Configures the three fields grid conversion requires.
	pub fn grid(x: &str, y: &str, value: &str) -> Self {
		Self {
			x: Some(x.into()),
			y: Some(y.into()),
			grid_value: Some(value.into()),
			..Self::default()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config: FieldConfig =
			serde_json::from_str(r#"{ "parent": "manager", "gridValue": "v" }"#).unwrap();
		assert_eq!(config.parent, "manager");
		assert_eq!(config.id, "id");
		assert_eq!(config.grid_value.as_deref(), Some("v"));
		assert_eq!(config.x, None);
	}
}
