use std::fmt;

use log::warn;
use serde_json::{Map, Value};

use super::config::FieldConfig;

/// One flat row of tabular input, in source field order.
pub type Record = Map<String, Value>;

/// Identity of a graph or tree node. Numbers and strings are distinct ids,
/// so `1` and `"1"` never collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
	/// Integer id.
	Int(i64),
	/// String id (also used for non-integer numbers).
	Text(String),
}

impl NodeId {
	/// Reads an id out of a JSON value. Null, empty strings and non-scalars are
	/// not ids.
	pub fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Number(n) => Some(
				n.as_i64()
					.map(NodeId::Int)
					.unwrap_or_else(|| NodeId::Text(n.to_string())),
			),
			Value::String(s) if !s.is_empty() => Some(NodeId::Text(s.clone())),
			_ => None,
		}
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NodeId::Int(i) => write!(f, "{i}"),
			NodeId::Text(s) => f.write_str(s),
		}
	}
}

impl From<i64> for NodeId {
	fn from(value: i64) -> Self {
		NodeId::Int(value)
	}
}

impl From<i32> for NodeId {
	fn from(value: i32) -> Self {
		NodeId::Int(value.into())
	}
}

impl From<&str> for NodeId {
	fn from(value: &str) -> Self {
		NodeId::Text(value.to_owned())
	}
}

/// Display form of a scalar, matching how labels are shown on axes.
pub fn label_of(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

fn number_at(record: &Map<String, Value>, field: &str) -> Option<f64> {
	record.get(field).and_then(Value::as_f64)
}

fn text_at(record: &Map<String, Value>, field: &str) -> Option<String> {
	match record.get(field)? {
		Value::Null => None,
		Value::String(s) if s.is_empty() => None,
		v => Some(label_of(v)),
	}
}

/// A network vertex as it arrives in the dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Unique id within the dataset.
	pub id: NodeId,
	/// Display name; falls back to the id.
	pub name: String,
	/// Color group.
	pub group: Option<i64>,
	/// Optional magnitude.
	pub value: Option<f64>,
	/// Pre-supplied coordinates, per axis.
	pub initial: [Option<f64>; 3],
}

impl GraphNode {
	/// A node with no display attributes beyond its id.
	pub fn new(id: impl Into<NodeId>) -> Self {
		let id = id.into();
		Self {
			name: id.to_string(),
			id,
			group: None,
			value: None,
			initial: [None; 3],
		}
	}

	/// Sets all three initial coordinates.
	pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
		self.initial = [Some(x), Some(y), Some(z)];
		self
	}

	fn from_record(record: &Map<String, Value>, fields: &FieldConfig) -> Option<Self> {
		let id = record.get(&fields.id).and_then(NodeId::from_value)?;
		Some(Self {
			name: text_at(record, &fields.name).unwrap_or_else(|| id.to_string()),
			group: record.get(&fields.group).and_then(Value::as_i64),
			value: number_at(record, &fields.value),
			initial: [
				number_at(record, "x"),
				number_at(record, "y"),
				number_at(record, "z"),
			],
			id,
		})
	}
}

/// A directed, optionally weighted relation between two node ids.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	/// Source node id.
	pub source: NodeId,
	/// Target node id.
	pub target: NodeId,
	/// Edge weight.
	pub value: Option<f64>,
}

impl GraphLink {
	/// An unweighted link.
	pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			value: None,
		}
	}

	/// Sets the weight.
	pub fn weighted(mut self, value: f64) -> Self {
		self.value = Some(value);
		self
	}

	/// Weight, defaulting to 1.
	pub fn weight(&self) -> f64 {
		self.value.unwrap_or(1.0)
	}
}

/// Nodes plus links.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkData {
	/// Vertices in dataset order.
	pub nodes: Vec<GraphNode>,
	/// Edges in dataset order.
	pub links: Vec<GraphLink>,
}

impl NetworkData {
	/// Parses an object carrying `nodes` and `links` arrays. Nodes without an id
	/// and links without both endpoints are dropped.
	pub fn from_value(value: &Value, fields: &FieldConfig) -> Self {
		let empty = Vec::new();
		let nodes = value
			.get("nodes")
			.and_then(Value::as_array)
			.unwrap_or(&empty)
			.iter()
			.filter_map(|item| {
				let node = item
					.as_object()
					.and_then(|record| GraphNode::from_record(record, fields));
				if node.is_none() {
					warn!("dropping network node without an id: {item}");
				}
				node
			})
			.collect();
		let links = value
			.get("links")
			.and_then(Value::as_array)
			.unwrap_or(&empty)
			.iter()
			.filter_map(|item| {
				let record = item.as_object()?;
				let source = record.get(&fields.source).and_then(NodeId::from_value);
				let target = record.get(&fields.target).and_then(NodeId::from_value);
				match (source, target) {
					(Some(source), Some(target)) => Some(GraphLink {
						source,
						target,
						value: number_at(record, &fields.value),
					}),
					_ => {
						warn!("dropping link without both endpoints: {item}");
						None
					}
				}
			})
			.collect();
		Self { nodes, links }
	}
}

/// A rooted, parent-owned hierarchy node.
///
/// Trees built from long parent chains can be many thousands of levels deep,
/// so every walk over a tree (count, depth, clone, comparison and drop) uses
/// an explicit stack instead of recursion.
#[derive(Debug)]
pub struct TreeNode {
	/// Unique id within the tree.
	pub id: NodeId,
	/// Display name.
	pub name: String,
	/// Optional magnitude.
	pub value: Option<f64>,
	/// Ordered children, owned exclusively by this node.
	pub children: Vec<TreeNode>,
}

impl TreeNode {
	/// A childless node named after its id.
	pub fn leaf(id: impl Into<NodeId>) -> Self {
		let id = id.into();
		Self {
			name: id.to_string(),
			id,
			value: None,
			children: Vec::new(),
		}
	}

	/// A childless node with a display name and value.
	pub fn named(id: impl Into<NodeId>, name: impl Into<String>, value: f64) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			value: Some(value),
			children: Vec::new(),
		}
	}

	/// Appends a child and returns self.
	pub fn with_child(mut self, child: TreeNode) -> Self {
		self.children.push(child);
		self
	}

	/// Total node count, root included.
	pub fn count(&self) -> usize {
		let mut count = 0;
		let mut stack = vec![self];
		while let Some(node) = stack.pop() {
			count += 1;
			stack.extend(&node.children);
		}
		count
	}

	/// Length of the longest root-to-leaf path; a lone root has depth 0.
	pub fn depth(&self) -> usize {
		let mut max = 0;
		let mut stack = vec![(self, 0usize)];
		while let Some((node, depth)) = stack.pop() {
			max = max.max(depth);
			stack.extend(node.children.iter().map(|c| (c, depth + 1)));
		}
		max
	}

	fn detached(&self) -> Self {
		Self {
			id: self.id.clone(),
			name: self.name.clone(),
			value: self.value,
			children: Vec::with_capacity(self.children.len()),
		}
	}
}

impl Clone for TreeNode {
	fn clone(&self) -> Self {
		// (source, copy under construction, next child to copy)
		let mut frames = vec![(self, self.detached(), 0usize)];
		while let Some(frame) = frames.last_mut() {
			let source: &TreeNode = frame.0;
			if let Some(child) = source.children.get(frame.2) {
				frame.2 += 1;
				frames.push((child, child.detached(), 0));
				continue;
			}
			let Some((_, done, _)) = frames.pop() else {
				break;
			};
			match frames.last_mut() {
				Some((_, parent, _)) => parent.children.push(done),
				None => return done,
			}
		}
		self.detached()
	}
}

impl PartialEq for TreeNode {
	fn eq(&self, other: &Self) -> bool {
		let mut stack = vec![(self, other)];
		while let Some((a, b)) = stack.pop() {
			if a.id != b.id || a.name != b.name || a.value != b.value || a.children.len() != b.children.len() {
				return false;
			}
			stack.extend(a.children.iter().zip(&b.children));
		}
		true
	}
}

impl Drop for TreeNode {
	fn drop(&mut self) {
		let mut stack = std::mem::take(&mut self.children);
		while let Some(mut node) = stack.pop() {
			stack.append(&mut node.children);
		}
	}
}

/// Rectangular 2D numeric grid, `values[row][col]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
	/// Row-major cells.
	pub values: Vec<Vec<f64>>,
	/// One label per column.
	pub x_labels: Option<Vec<String>>,
	/// One label per row.
	pub y_labels: Option<Vec<String>>,
}

impl Grid {
	/// Builds a grid, padding short rows with zeros so every row has the same
	/// length.
	pub fn new(mut values: Vec<Vec<f64>>) -> Self {
		let cols = values.iter().map(Vec::len).max().unwrap_or(0);
		if values.iter().any(|row| row.len() != cols) {
			warn!("ragged grid rows padded to {cols} columns");
			for row in &mut values {
				row.resize(cols, 0.0);
			}
		}
		Self {
			values,
			x_labels: None,
			y_labels: None,
		}
	}

	/// The degenerate 1x0 grid returned when conversion cannot proceed.
	pub fn placeholder() -> Self {
		Self::new(vec![Vec::new()])
	}

	/// Attaches axis labels; labels whose length does not match are discarded.
	pub fn with_labels(mut self, x_labels: Option<Vec<String>>, y_labels: Option<Vec<String>>) -> Self {
		let (rows, cols) = (self.rows(), self.cols());
		self.x_labels = x_labels.filter(|l| {
			let ok = l.len() == cols;
			if !ok {
				warn!("x labels ({}) do not match column count ({cols})", l.len());
			}
			ok
		});
		self.y_labels = y_labels.filter(|l| {
			let ok = l.len() == rows;
			if !ok {
				warn!("y labels ({}) do not match row count ({rows})", l.len());
			}
			ok
		});
		self
	}

	/// Row count.
	pub fn rows(&self) -> usize {
		self.values.len()
	}

	/// Column count.
	pub fn cols(&self) -> usize {
		self.values.first().map_or(0, Vec::len)
	}

	/// True when there is nothing to render.
	pub fn is_empty(&self) -> bool {
		self.rows() == 0 || self.cols() == 0
	}

	/// Smallest and largest cell, or `None` for an empty grid.
	pub fn value_range(&self) -> Option<(f64, f64)> {
		self.values.iter().flatten().fold(None, |acc, &v| match acc {
			None => Some((v, v)),
			Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
		})
	}

	pub(crate) fn rows_from_value(value: &Value) -> Option<Vec<Vec<f64>>> {
		let rows = value.as_array()?;
		if rows.is_empty() || !rows.iter().all(Value::is_array) {
			return None;
		}
		Some(
			rows.iter()
				.map(|row| {
					row.as_array()
						.map(|cells| cells.iter().map(|c| c.as_f64().unwrap_or(0.0)).collect())
						.unwrap_or_default()
				})
				.collect(),
		)
	}
}

/// One named value sequence of a line/area chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
	/// Legend name.
	pub name: String,
	/// One value per time point.
	pub values: Vec<f64>,
	/// Optional `0xRRGGBB` color.
	pub color: Option<u32>,
}

/// Named series over shared time-point labels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesData {
	/// X-axis labels.
	pub time_points: Vec<String>,
	/// The series.
	pub series: Vec<Series>,
}

impl SeriesData {
	/// Parses `{ timePoints: [...], series: [{ name, values, color? }] }`.
	pub fn from_value(value: &Value) -> Self {
		let time_points = value
			.get("timePoints")
			.and_then(Value::as_array)
			.map(|points| points.iter().map(label_of).collect())
			.unwrap_or_default();
		let series = value
			.get("series")
			.and_then(Value::as_array)
			.map(|all| {
				all.iter()
					.enumerate()
					.map(|(i, s)| Series {
						name: s
							.get("name")
							.map(label_of)
							.unwrap_or_else(|| format!("Series {}", i + 1)),
						values: s
							.get("values")
							.and_then(Value::as_array)
							.map(|vs| vs.iter().map(|v| v.as_f64().unwrap_or(0.0)).collect())
							.unwrap_or_default(),
						color: s
							.get("color")
							.and_then(Value::as_u64)
							.and_then(|c| u32::try_from(c).ok()),
					})
					.collect()
			})
			.unwrap_or_default();
		Self { time_points, series }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn numeric_and_text_ids_stay_distinct() {
		assert_eq!(NodeId::from_value(&json!(1)), Some(NodeId::Int(1)));
		assert_eq!(NodeId::from_value(&json!("1")), Some(NodeId::from("1")));
		assert_ne!(NodeId::from(1), NodeId::from("1"));
		assert_eq!(NodeId::from_value(&json!(null)), None);
		assert_eq!(NodeId::from_value(&json!("")), None);
	}

	#[test]
	fn network_parse_drops_incomplete_links() {
		let data = json!({
			"nodes": [{ "id": 1, "name": "a", "group": 2 }, { "id": 2 }, { "name": "no id" }],
			"links": [{ "source": 1, "target": 2, "value": 3 }, { "source": 1 }]
		});
		let net = NetworkData::from_value(&data, &FieldConfig::default());
		assert_eq!(net.nodes.len(), 2);
		assert_eq!(net.nodes[0].group, Some(2));
		assert_eq!(net.nodes[1].name, "2");
		assert_eq!(net.links.len(), 1);
		assert_eq!(net.links[0].weight(), 3.0);
	}

	fn chain(len: usize) -> TreeNode {
		(0..len as i64).rev().fold(None, |child: Option<TreeNode>, i| {
			let node = TreeNode::leaf(i);
			Some(match child {
				Some(child) => node.with_child(child),
				None => node,
			})
		})
		.unwrap_or_else(|| TreeNode::leaf(0))
	}

	#[test]
	fn very_deep_trees_walk_clone_compare_and_drop() {
		let tree = chain(200_000);
		assert_eq!(tree.count(), 200_000);
		assert_eq!(tree.depth(), 199_999);
		let copy = tree.clone();
		assert_eq!(copy, tree);
		assert_eq!(copy.children[0].children[0].id, NodeId::Int(2));
		drop(copy);
		drop(tree);
	}

	#[test]
	fn trees_differing_deep_down_are_unequal() {
		let a = TreeNode::leaf("r").with_child(TreeNode::leaf("a").with_child(TreeNode::leaf("x")));
		let b = TreeNode::leaf("r").with_child(TreeNode::leaf("a").with_child(TreeNode::leaf("y")));
		assert_ne!(a, b);
		assert_eq!(a.clone(), a);
		assert_eq!(TreeNode::named("n", "Name", 2.0).value, Some(2.0));
	}

	#[test]
	fn ragged_grid_rows_are_padded() {
		let grid = Grid::new(vec![vec![1.0, 2.0, 3.0], vec![4.0]]);
		assert_eq!(grid.cols(), 3);
		assert_eq!(grid.values[1], vec![4.0, 0.0, 0.0]);
		assert_eq!(grid.value_range(), Some((0.0, 4.0)));
	}

	#[test]
	fn mismatched_labels_are_discarded() {
		let grid = Grid::new(vec![vec![1.0, 2.0]])
			.with_labels(Some(vec!["a".into()]), Some(vec!["r".into()]));
		assert_eq!(grid.x_labels, None);
		assert_eq!(grid.y_labels, Some(vec!["r".to_string()]));
	}

	#[test]
	fn placeholder_grid_is_degenerate() {
		let grid = Grid::placeholder();
		assert_eq!(grid.rows(), 1);
		assert_eq!(grid.cols(), 0);
		assert!(grid.is_empty());
	}

	#[test]
	fn tree_depth_and_count() {
		let tree = TreeNode::leaf("r")
			.with_child(TreeNode::leaf("a").with_child(TreeNode::leaf("a1")))
			.with_child(TreeNode::leaf("b"));
		assert_eq!(tree.count(), 4);
		assert_eq!(tree.depth(), 2);
		assert_eq!(TreeNode::leaf("solo").depth(), 0);
	}
}
