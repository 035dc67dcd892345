//! Conversions between dataset shapes. None of these fail hard: unusable input
//! produces an empty or placeholder structure and a logged diagnostic.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use log::{error, warn};
use serde_json::{Map, Value};

use super::config::FieldConfig;
use super::error::DataError;
use super::fields::numeric_fields;
use super::shape::{Shape, classify};
use super::types::{
	GraphLink, GraphNode, Grid, NetworkData, NodeId, Record, SeriesData, TreeNode, label_of,
};

/// Output of [`convert`], tagged by target shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Converted {
	/// Flat records.
	Tabular(Vec<Record>),
	/// Nodes and links.
	Network(NetworkData),
	/// Numeric grid.
	Grid(Grid),
	/// Line/area series.
	Series(SeriesData),
	/// Rooted tree.
	Tree(TreeNode),
}

/// Converts `data`, already classified as `from`, into shape `to`.
pub fn convert(
	data: &Value,
	from: Shape,
	to: Shape,
	fields: &FieldConfig,
) -> Result<Converted, DataError> {
	let converted = match (from, to) {
		(_, Shape::Tabular) => Converted::Tabular(to_tabular(data, fields)),
		(Shape::Network, Shape::Network) => {
			Converted::Network(NetworkData::from_value(data, fields))
		}
		(Shape::Tabular, Shape::Network) => {
			Converted::Network(edges_to_network(items(data), fields))
		}
		(Shape::Grid | Shape::Tabular, Shape::Grid) => Converted::Grid(to_grid(data, fields)),
		(Shape::Series, Shape::Series) => Converted::Series(SeriesData::from_value(data)),
		(Shape::Tree, Shape::Tree) => Converted::Tree(nested_tree(data, fields)),
		(Shape::Network, Shape::Tree) => {
			Converted::Tree(network_to_tree(&NetworkData::from_value(data, fields)))
		}
		(Shape::Tabular, Shape::Tree) => Converted::Tree(flat_to_tree(items(data), fields)),
		(from, to) => return Err(DataError::UnsupportedConversion { from, to }),
	};
	Ok(converted)
}

fn items(data: &Value) -> &[Value] {
	data.as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn text(record: &Map<String, Value>, field: &str) -> Option<String> {
	match record.get(field)? {
		Value::Null => None,
		Value::String(s) if s.is_empty() => None,
		v => Some(label_of(v)),
	}
}

/// Builds a network from any dataset: networks pass through, tabular rows are
/// read as edges, anything else yields an empty network.
pub fn to_network(data: &Value, fields: &FieldConfig) -> NetworkData {
	match classify(data) {
		Shape::Network => NetworkData::from_value(data, fields),
		Shape::Tabular => edges_to_network(items(data), fields),
		shape => {
			warn!("cannot build a network from {shape} data");
			NetworkData::default()
		}
	}
}

/// Treats each record as one edge. Nodes are deduplicated by id in order of
/// first appearance; records missing an endpoint are skipped.
pub fn edges_to_network(rows: &[Value], fields: &FieldConfig) -> NetworkData {
	let target_name = format!("target_{}", fields.name);
	let target_group = format!("target_{}", fields.group);
	let mut seen = HashSet::new();
	let mut network = NetworkData::default();

	for row in rows.iter().filter_map(Value::as_object) {
		let source = row.get(&fields.source).and_then(NodeId::from_value);
		let target = row.get(&fields.target).and_then(NodeId::from_value);
		let (Some(source), Some(target)) = (source, target) else {
			continue;
		};

		for (id, name_field, group_field) in [
			(&source, &fields.name, &fields.group),
			(&target, &target_name, &target_group),
		] {
			if seen.insert(id.clone()) {
				network.nodes.push(GraphNode {
					name: text(row, name_field).unwrap_or_else(|| id.to_string()),
					group: Some(row.get(group_field).and_then(Value::as_i64).unwrap_or(0)),
					..GraphNode::new(id.clone())
				});
			}
		}

		network.links.push(GraphLink {
			value: Some(row.get(&fields.value).and_then(Value::as_f64).unwrap_or(1.0)),
			..GraphLink::new(source, target)
		});
	}
	network
}

/// Bar-chart records. Arrays with a numeric field pass through; an object's
/// keys become categories. Returns empty when no numeric field exists.
pub fn to_tabular(data: &Value, fields: &FieldConfig) -> Vec<Record> {
	match data {
		Value::Array(rows) => {
			let records: Vec<Record> = rows.iter().filter_map(|r| r.as_object().cloned()).collect();
			let numeric = match &fields.value_fields {
				Some(wanted) => records
					.first()
					.is_some_and(|r| wanted.iter().any(|f| r.get(f).is_some_and(Value::is_number))),
				None => !numeric_fields(&records).is_empty(),
			};
			if numeric {
				return records;
			}
		}
		Value::Object(map) => {
			let category = fields.category.as_deref().unwrap_or("category");
			let records: Vec<Record> = map
				.iter()
				.filter_map(|(key, value)| {
					let mut record = Map::new();
					record.insert(category.into(), Value::String(key.clone()));
					match value {
						Value::Number(_) => {
							record.insert("value".into(), value.clone());
						}
						Value::Object(nested) => {
							record.extend(
								nested
									.iter()
									.filter(|(_, v)| v.is_number())
									.map(|(k, v)| (k.clone(), v.clone())),
							);
						}
						_ => {}
					}
					(record.len() > 1).then_some(record)
				})
				.collect();
			if !records.is_empty() {
				return records;
			}
		}
		_ => {}
	}
	error!("no numeric field found; cannot build bar chart data");
	Vec::new()
}

fn natural_cmp(a: &Value, b: &Value) -> Ordering {
	match (a.as_f64(), b.as_f64()) {
		(Some(x), Some(y)) => x.total_cmp(&y),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => label_of(a).cmp(&label_of(b)),
	}
}

fn distinct_sorted<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<&'a Value> {
	let mut out: Vec<&Value> = values.collect();
	out.sort_by(|a, b| natural_cmp(a, b));
	out.dedup_by(|a, b| natural_cmp(*a, *b) == Ordering::Equal);
	out
}

/// Grid for surface and heat-map charts. A `values` grid or an array of
/// arrays passes through; records are pivoted on the configured x and y
/// fields, with cells read from `gridValue` or else the `value` field.
pub fn to_grid(data: &Value, fields: &FieldConfig) -> Grid {
	if let Some(rows) = data.get("values").and_then(Grid::rows_from_value) {
		let labels = |key: &str| {
			data.get(key)
				.and_then(Value::as_array)
				.map(|l| l.iter().map(label_of).collect::<Vec<String>>())
		};
		return Grid::new(rows).with_labels(labels("xLabels"), labels("yLabels"));
	}
	if let Some(rows) = Grid::rows_from_value(data) {
		return Grid::new(rows);
	}

	let records: Vec<&Map<String, Value>> = items(data).iter().filter_map(Value::as_object).collect();
	if records.is_empty() {
		error!("cannot convert data to a grid");
		return Grid::placeholder();
	}
	let (Some(x), Some(y)) = (&fields.x, &fields.y) else {
		error!("grid conversion needs the x and y fields configured");
		return Grid::placeholder();
	};
	let v = fields.grid_value.as_ref().unwrap_or(&fields.value);

	let axis = |field: &str| {
		distinct_sorted(
			records
				.iter()
				.filter_map(|r| r.get(field))
				.filter(|v| !v.is_null()),
		)
	};
	let (xs, ys) = (axis(x.as_str()), axis(y.as_str()));
	let mut values = vec![vec![0.0; xs.len()]; ys.len()];

	for record in &records {
		let (Some(xv), Some(yv)) = (record.get(x), record.get(y)) else {
			continue;
		};
		let xi = xs.binary_search_by(|p| natural_cmp(p, xv));
		let yi = ys.binary_search_by(|p| natural_cmp(p, yv));
		if let (Ok(xi), Ok(yi)) = (xi, yi) {
			values[yi][xi] = record.get(v).and_then(Value::as_f64).unwrap_or(0.0);
		}
	}

	let x_labels = xs.iter().map(|v| label_of(v)).collect();
	let y_labels = ys.iter().map(|v| label_of(v)).collect();
	Grid::new(values).with_labels(Some(x_labels), Some(y_labels))
}

fn empty_root() -> TreeNode {
	TreeNode::named("empty_root", "Empty root", 0.0)
}

/// True for an object carrying the configured children or id field, which
/// classification cannot see when those fields are renamed.
pub(crate) fn looks_nested(data: &Value, fields: &FieldConfig) -> bool {
	data.get(&fields.children).is_some_and(Value::is_array)
		|| data.get(&fields.id).is_some_and(|v| !v.is_null())
}

/// Builds a tree from any dataset shape that can carry one.
pub fn to_tree(data: &Value, fields: &FieldConfig) -> TreeNode {
	match classify(data) {
		Shape::Tree => nested_tree(data, fields),
		Shape::Network => network_to_tree(&NetworkData::from_value(data, fields)),
		Shape::Tabular => flat_to_tree(items(data), fields),
		_ if looks_nested(data, fields) => nested_tree(data, fields),
		shape => {
			error!("cannot convert {shape} data to a tree");
			TreeNode::named("root", "Root", 1.0)
		}
	}
}

struct NestedIds {
	next: usize,
	seen: HashSet<NodeId>,
}

impl NestedIds {
	fn claim(&mut self, id: Option<NodeId>) -> NodeId {
		let id = id.unwrap_or_else(|| {
			self.next += 1;
			NodeId::Text(format!("node_{}", self.next - 1))
		});
		if self.seen.insert(id.clone()) {
			return id;
		}
		let mut n = 1;
		loop {
			let renamed = NodeId::Text(format!("{id}~{n}"));
			if self.seen.insert(renamed.clone()) {
				warn!("duplicate tree id {id} renamed to {renamed}");
				return renamed;
			}
			n += 1;
		}
	}
}

fn nested_node(value: &Value, fields: &FieldConfig, ids: &mut NestedIds) -> TreeNode {
	let record = value.as_object();
	let field = |key: &str| record.and_then(|r| r.get(key));
	let id = ids.claim(field(fields.id.as_str()).and_then(NodeId::from_value));
	TreeNode {
		name: record
			.and_then(|r| text(r, &fields.name))
			.unwrap_or_else(|| id.to_string()),
		value: Some(field(fields.value.as_str()).and_then(Value::as_f64).unwrap_or(1.0)),
		children: Vec::new(),
		id,
	}
}

fn nested_children<'a>(value: &'a Value, fields: &FieldConfig) -> impl Iterator<Item = &'a Value> {
	value
		.get(&fields.children)
		.and_then(Value::as_array)
		.into_iter()
		.flatten()
		.filter(|c| c.is_object())
}

/// Parses an already-hierarchical object. Missing ids become `node_<n>` and
/// duplicate ids are suffixed so every id in the result is unique.
pub fn nested_tree(data: &Value, fields: &FieldConfig) -> TreeNode {
	let mut ids = NestedIds {
		next: 0,
		seen: HashSet::new(),
	};
	// ids are claimed in pre-order; a node is attached once its children are done
	let root = nested_node(data, fields, &mut ids);
	let mut frames = vec![(root, nested_children(data, fields))];
	while let Some((_, pending)) = frames.last_mut() {
		if let Some(child) = pending.next() {
			let node = nested_node(child, fields, &mut ids);
			frames.push((node, nested_children(child, fields)));
			continue;
		}
		let Some((done, _)) = frames.pop() else {
			break;
		};
		match frames.last_mut() {
			Some((parent, _)) => parent.children.push(done),
			None => return done,
		}
	}
	empty_root()
}

/// Arena of candidate tree nodes plus parent->child indices, assembled into
/// an owned tree from a chosen root.
struct Hierarchy {
	ids: Vec<NodeId>,
	names: Vec<String>,
	values: Vec<f64>,
	children: Vec<Vec<usize>>,
}

impl Hierarchy {
	fn with_capacity(n: usize) -> Self {
		Self {
			ids: Vec::with_capacity(n),
			names: Vec::with_capacity(n),
			values: Vec::with_capacity(n),
			children: Vec::with_capacity(n),
		}
	}

	fn push(&mut self, id: NodeId, name: String, value: f64) {
		self.ids.push(id);
		self.names.push(name);
		self.values.push(value);
		self.children.push(Vec::new());
	}

	fn build(&self, root: usize) -> TreeNode {
		let mut visited = vec![false; self.ids.len()];
		let tree = self.build_from(root, &mut visited);
		let dropped = visited.iter().filter(|v| !**v).count();
		if dropped > 0 {
			warn!("{dropped} node(s) unreachable from root {} left out of the tree", self.ids[root]);
		}
		tree
	}

	fn node(&self, i: usize) -> TreeNode {
		TreeNode {
			id: self.ids[i].clone(),
			name: self.names[i].clone(),
			value: Some(self.values[i]),
			children: Vec::with_capacity(self.children[i].len()),
		}
	}

	/// Depth-first assembly with an explicit stack; a child already visited
	/// would close a cycle and is dropped.
	fn build_from(&self, root: usize, visited: &mut [bool]) -> TreeNode {
		visited[root] = true;
		// (arena index, tree under construction, next child to visit)
		let mut frames = vec![(root, self.node(root), 0usize)];
		while let Some(frame) = frames.last_mut() {
			let i = frame.0;
			if let Some(&c) = self.children[i].get(frame.2) {
				frame.2 += 1;
				if visited[c] {
					warn!("edge {} -> {} would close a cycle; dropped", self.ids[i], self.ids[c]);
				} else {
					visited[c] = true;
					frames.push((c, self.node(c), 0));
				}
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
		self.node(root)
	}
}

/// Network to tree. Each link attaches its target under its source; the first
/// parent wins and later parents of the same node are dropped. A node that is
/// never a link target is a root; several roots get a virtual parent.
pub fn network_to_tree(network: &NetworkData) -> TreeNode {
	if network.nodes.is_empty() {
		warn!("network has no nodes; using an empty tree");
		return empty_root();
	}

	let mut index = HashMap::with_capacity(network.nodes.len());
	let mut tree = Hierarchy::with_capacity(network.nodes.len());
	for node in &network.nodes {
		if index.contains_key(&node.id) {
			warn!("duplicate network node {} ignored", node.id);
			continue;
		}
		index.insert(&node.id, tree.ids.len());
		tree.push(node.id.clone(), node.name.clone(), node.value.unwrap_or(1.0));
	}

	let mut has_parent = vec![false; tree.ids.len()];
	for link in &network.links {
		let (Some(&s), Some(&t)) = (index.get(&link.source), index.get(&link.target)) else {
			warn!("link {} -> {} references a missing node; dropped", link.source, link.target);
			continue;
		};
		if has_parent[t] {
			warn!("node {} already has a parent; edge from {} dropped", link.target, link.source);
			continue;
		}
		has_parent[t] = true;
		tree.children[s].push(t);
	}

	let roots: Vec<usize> = (0..tree.ids.len()).filter(|&i| !has_parent[i]).collect();
	match roots.as_slice() {
		[] => {
			warn!("no root found; using the first node {} as root", tree.ids[0]);
			tree.build(0)
		}
		[root] => tree.build(*root),
		_ => {
			let mut visited = vec![false; tree.ids.len()];
			let children: Vec<TreeNode> = roots
				.iter()
				.map(|&r| tree.build_from(r, &mut visited))
				.collect();
			let dropped = visited.iter().filter(|v| !**v).count();
			if dropped > 0 {
				warn!("{dropped} node(s) unreachable from any root left out of the tree");
			}
			TreeNode {
				id: NodeId::from("virtual_root"),
				name: "Root".into(),
				value: Some(roots.iter().map(|&r| tree.values[r]).sum()),
				children,
			}
		}
	}
}

/// Flat parent-pointer records to tree. The first record without a resolvable
/// parent is the root; if none exists the first record is forced to be root.
pub fn flat_to_tree(rows: &[Value], fields: &FieldConfig) -> TreeNode {
	let mut index: HashMap<NodeId, usize> = HashMap::with_capacity(rows.len());
	let mut tree = Hierarchy::with_capacity(rows.len());
	let mut records = Vec::with_capacity(rows.len());

	for row in rows.iter().filter_map(Value::as_object) {
		let Some(id) = row.get(&fields.id).and_then(NodeId::from_value) else {
			warn!("record without an id skipped: {}", Value::Object(row.clone()));
			continue;
		};
		if index.contains_key(&id) {
			warn!("duplicate record id {id} skipped");
			continue;
		}
		index.insert(id.clone(), tree.ids.len());
		let name = text(row, &fields.name).unwrap_or_else(|| id.to_string());
		tree.push(id, name, row.get(&fields.value).and_then(Value::as_f64).unwrap_or(1.0));
		records.push(row);
	}

	if records.is_empty() {
		return empty_root();
	}

	let mut root = None;
	for (i, row) in records.iter().enumerate() {
		let parent = row
			.get(&fields.parent)
			.and_then(NodeId::from_value)
			.and_then(|p| index.get(&p).copied());
		match parent {
			Some(p) => tree.children[p].push(i),
			None if root.is_none() => root = Some(i),
			None => warn!("record {} has no resolvable parent and is not the root", tree.ids[i]),
		}
	}

	let root = root.unwrap_or_else(|| {
		warn!("no root record found; using the first record {} as root", tree.ids[0]);
		0
	});
	tree.build(root)
}
