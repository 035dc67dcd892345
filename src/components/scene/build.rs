//! Turns prepared chart data into points and segments in scene space. Scene
//! space is centered on the origin with y up; charts fit roughly in a 16-unit
//! cube.

use std::f64::consts::TAU;

use rand::Rng;

use super::types::{AXIS, Color, Scene, ScenePoint};
use crate::data::{
	ChartData, DataError, FieldRange, Grid, NetworkData, Record, SeriesData, TreeNode, category_field,
	label_of,
};
use crate::layout::{ForceLayout, ForceLayoutOptions, TreeLayoutOptions, Vec3, compute_tree_layout};

const FLOOR: f64 = -4.0;
const COLUMN_HEIGHT: f64 = 8.0;
const SPREAD: f64 = 16.0;
const MAX_STEP: f64 = 2.0;
const PIE_RADIUS: f64 = 6.0;
const SURFACE_HEIGHT: f64 = 6.0;
const EDGE: Color = Color(0x64b4ff);

/// A built scene, plus the force engine that moves its first points when the
/// chart is a network.
#[derive(Default)]
pub struct SceneModel {
	pub scene: Scene,
	pub engine: Option<ForceLayout>,
}

impl From<Scene> for SceneModel {
	fn from(scene: Scene) -> Self {
		Self { scene, engine: None }
	}
}

pub fn build<R: Rng + ?Sized>(
	chart: &ChartData,
	force: &ForceLayoutOptions,
	tree: &TreeLayoutOptions,
	rng: &mut R,
) -> Result<SceneModel, DataError> {
	Ok(match chart {
		ChartData::Bars {
			records,
			category,
			values,
		} => bars(records, category.as_deref(), values).into(),
		ChartData::Scatter { records, axes } => scatter(records, axes).into(),
		ChartData::Pie {
			records,
			category,
			value,
		} => pie(records, category, value).into(),
		ChartData::Network(network) => return network_model(network, force, rng),
		ChartData::Tree(root) => tree_scene(root, tree)?.into(),
		ChartData::Surface(grid) => lattice(grid, false).into(),
		ChartData::HeatMap(grid) => lattice(grid, true).into(),
		ChartData::Line(series) => lines(series, false).into(),
		ChartData::Area(series) => lines(series, true).into(),
	})
}

fn number(record: &Record, field: &str) -> f64 {
	record.get(field).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

/// Offset of slot `i` of `n`, centered on 0.
fn centered(i: usize, n: usize, step: f64) -> f64 {
	(i as f64 - n.saturating_sub(1) as f64 / 2.0) * step
}

fn step_for(n: usize) -> f64 {
	(SPREAD / n.max(1) as f64).min(MAX_STEP)
}

fn format_value(v: f64) -> String {
	if v.fract() == 0.0 && v.abs() < 1e15 {
		format!("{v:.0}")
	} else {
		format!("{v:.2}")
	}
}

fn group_color(group: Option<i64>) -> Color {
	Color::palette(group.unwrap_or(0).rem_euclid(1 << 16) as usize)
}

fn bars(records: &[Record], category: Option<&str>, values: &[String]) -> Scene {
	let mut scene = Scene::default();
	let ranges: Vec<Option<FieldRange>> = values.iter().map(|f| FieldRange::of(records, f)).collect();
	let (row_step, col_step) = (step_for(records.len()), step_for(values.len()));

	for (row, record) in records.iter().enumerate() {
		let name = category
			.and_then(|c| record.get(c))
			.map(label_of)
			.unwrap_or_else(|| format!("#{}", row + 1));
		let x = centered(row, records.len(), row_step);
		for (col, (field, range)) in values.iter().zip(&ranges).enumerate() {
			let Some(range) = range else {
				continue;
			};
			let v = number(record, field);
			let z = centered(col, values.len(), col_step);
			let top_y = FLOOR + range.scale_to_max(v) * COLUMN_HEIGHT;
			let color = Color::palette(col);
			let base = scene.push(ScenePoint::anchor(Vec3::new(x, FLOOR, z)));
			let top = scene.push(
				ScenePoint::new(Vec3::new(x, top_y, z), 4.0, color)
					.labelled(name.clone())
					.detailed(format!("{field}: {}", format_value(v))),
			);
			scene.connect(base, top, color, 9.0, 0.85);
		}
	}
	scene
}

fn scatter(records: &[Record], axes: &[String]) -> Scene {
	let mut scene = Scene::default();
	let ranges: Vec<Option<FieldRange>> = axes.iter().map(|f| FieldRange::of(records, f)).collect();
	let half = SPREAD / 2.0;

	let corner = scene.push(ScenePoint::anchor(Vec3::new(-half, -half, -half)));
	let directions = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)];
	for (axis, direction) in axes.iter().zip(directions) {
		let end = scene.push(
			ScenePoint::new(Vec3::new(-half, -half, -half) + direction * SPREAD, 3.0, AXIS).labelled(axis.as_str()),
		);
		scene.connect(corner, end, AXIS, 1.0, 0.6);
	}

	let name_field = category_field(records);
	for (row, record) in records.iter().enumerate() {
		let coord = |i: usize| match (axes.get(i), ranges.get(i).copied().flatten()) {
			(Some(field), Some(range)) => (range.normalize(number(record, field)) - 0.5) * SPREAD,
			_ => 0.0,
		};
		let name = name_field
			.as_deref()
			.and_then(|f| record.get(f))
			.map(label_of)
			.unwrap_or_else(|| format!("#{}", row + 1));
		let detail = axes
			.iter()
			.map(|f| format!("{f}: {}", format_value(number(record, f))))
			.collect::<Vec<_>>()
			.join(", ");
		let shade = ranges
			.first()
			.copied()
			.flatten()
			.zip(axes.first())
			.map_or(0.5, |(range, f)| range.normalize(number(record, f)));
		scene.push(
			ScenePoint::new(Vec3::new(coord(0), coord(1), coord(2)), 5.0, Color::ramp(shade))
				.labelled(name)
				.detailed(detail),
		);
	}
	scene
}

fn pie(records: &[Record], category: &str, value: &str) -> Scene {
	let mut scene = Scene {
		show_labels: true,
		..Scene::default()
	};
	let values: Vec<f64> = records.iter().map(|r| number(r, value).max(0.0)).collect();
	let total: f64 = values.iter().sum();
	let center = scene.push(ScenePoint::anchor(Vec3::ZERO));

	let mut start = 0.0;
	let mut slices = Vec::with_capacity(records.len());
	for (i, (record, v)) in records.iter().zip(&values).enumerate() {
		let share = if total > 0.0 { v / total } else { 1.0 / records.len() as f64 };
		let angle = (start + share / 2.0) * TAU;
		start += share;
		let color = Color::palette(i);
		let slice = scene.push(
			ScenePoint::new(
				Vec3::new(PIE_RADIUS * angle.cos(), 0.0, PIE_RADIUS * angle.sin()),
				4.0 + 30.0 * share,
				color,
			)
			.labelled(record.get(category).map(label_of).unwrap_or_default())
			.detailed(format!("{value}: {} ({:.1}%)", format_value(*v), share * 100.0)),
		);
		scene.connect(center, slice, color, 2.0, 0.6);
		slices.push(slice);
	}
	for pair in slices.windows(2) {
		scene.connect(pair[0], pair[1], AXIS, 1.0, 0.4);
	}
	if let (Some(&first), Some(&last)) = (slices.first(), slices.last()) {
		if slices.len() > 2 {
			scene.connect(last, first, AXIS, 1.0, 0.4);
		}
	}
	scene
}

fn network_model<R: Rng + ?Sized>(
	network: &NetworkData,
	options: &ForceLayoutOptions,
	rng: &mut R,
) -> Result<SceneModel, DataError> {
	let engine = ForceLayout::new(network.clone(), options.clone(), rng)?;
	let mut scene = Scene {
		show_labels: true,
		..Scene::default()
	};
	for node in engine.nodes() {
		let data = &node.data;
		let mut detail = format!("id {}", data.id);
		if let Some(group) = data.group {
			detail.push_str(&format!(", group {group}"));
		}
		if let Some(value) = data.value {
			detail.push_str(&format!(", value {}", format_value(value)));
		}
		scene.push(
			ScenePoint::new(node.position, 6.0, group_color(data.group))
				.labelled(data.name.clone())
				.detailed(detail),
		);
	}
	for (source, target, weight) in engine.edges() {
		scene.connect(source, target, EDGE, 1.0 + weight.clamp(0.0, 5.0) * 0.4, 0.6);
	}
	Ok(SceneModel {
		scene,
		engine: Some(engine),
	})
}

fn tree_scene(root: &TreeNode, options: &TreeLayoutOptions) -> Result<Scene, DataError> {
	options.validate()?;
	let positions = compute_tree_layout(root, options);
	let mut scene = Scene {
		show_labels: true,
		..Scene::default()
	};

	let mut stack: Vec<(&TreeNode, Option<usize>)> = vec![(root, None)];
	while let Some((node, parent)) = stack.pop() {
		let Some(position) = positions.get(&node.id) else {
			continue;
		};
		let mut point = ScenePoint::new(
			position.point(),
			7.0 - position.level.min(4) as f64,
			Color::palette(position.level),
		)
		.labelled(node.name.clone());
		if let Some(value) = node.value {
			point = point.detailed(format!("value {}", format_value(value)));
		}
		let idx = scene.push(point);
		if let Some(parent) = parent {
			scene.connect(parent, idx, AXIS, 1.5, 0.7);
		}
		stack.extend(node.children.iter().rev().map(|c| (c, Some(idx))));
	}
	Ok(scene)
}

fn lattice(grid: &Grid, flat: bool) -> Scene {
	let mut scene = Scene::default();
	if grid.is_empty() {
		return scene;
	}
	let (min, max) = grid.value_range().unwrap_or((0.0, 0.0));
	let range = FieldRange { min, max };
	let (rows, cols) = (grid.rows(), grid.cols());
	let step = (SPREAD * 0.75) / rows.max(cols) as f64;
	let label = |labels: &Option<Vec<String>>, i: usize| {
		labels.as_ref().and_then(|l| l.get(i).cloned()).unwrap_or_else(|| i.to_string())
	};

	let base = scene.points.len();
	for (r, row) in grid.values.iter().enumerate() {
		for (c, &v) in row.iter().enumerate() {
			let t = range.normalize(v);
			let y = if flat { 0.0 } else { (t - 0.5) * SURFACE_HEIGHT };
			scene.push(
				ScenePoint::new(
					Vec3::new(centered(c, cols, step), y, centered(r, rows, step)),
					if flat { 7.0 } else { 3.0 },
					Color::ramp(t),
				)
				.labelled(format!("{} / {}", label(&grid.x_labels, c), label(&grid.y_labels, r)))
				.detailed(format_value(v)),
			);
		}
	}

	let alpha = if flat { 0.2 } else { 0.8 };
	for r in 0..rows {
		for c in 0..cols {
			let idx = base + r * cols + c;
			let color = scene.points[idx].color;
			if c + 1 < cols {
				scene.connect(idx, idx + 1, color, 1.5, alpha);
			}
			if r + 1 < rows {
				scene.connect(idx, idx + cols, color, 1.5, alpha);
			}
		}
	}
	scene
}

fn lines(data: &SeriesData, filled: bool) -> Scene {
	let mut scene = Scene::default();
	let range = data
		.series
		.iter()
		.flat_map(|s| s.values.iter().copied())
		.fold(None, |acc: Option<FieldRange>, v| match acc {
			None => Some(FieldRange { min: v, max: v }),
			Some(r) => Some(FieldRange {
				min: r.min.min(v),
				max: r.max.max(v),
			}),
		});
	let Some(range) = range else {
		return scene;
	};
	let points = data
		.series
		.iter()
		.map(|s| s.values.len())
		.max()
		.unwrap_or(0)
		.max(data.time_points.len());
	let step = step_for(points);

	for (s, series) in data.series.iter().enumerate() {
		let color = series.color.map(Color).unwrap_or_else(|| Color::palette(s));
		let z = centered(s, data.series.len(), 2.5);
		let mut previous = None;
		for (t, &v) in series.values.iter().enumerate() {
			let x = centered(t, points, step);
			let time = data.time_points.get(t).cloned().unwrap_or_else(|| t.to_string());
			let idx = scene.push(
				ScenePoint::new(Vec3::new(x, FLOOR + range.normalize(v) * COLUMN_HEIGHT, z), 3.5, color)
					.labelled(series.name.clone())
					.detailed(format!("{time}: {}", format_value(v))),
			);
			if let Some(prev) = previous {
				scene.connect(prev, idx, color, 2.5, 0.9);
			}
			if filled {
				let floor = scene.push(ScenePoint::anchor(Vec3::new(x, FLOOR, z)));
				scene.connect(floor, idx, color, 6.0, 0.25);
			}
			previous = Some(idx);
		}
	}
	scene
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::{FieldConfig, SampleRegistry, prepare};
	use rand::SeedableRng;
	use rand::rngs::SmallRng;
	use serde_json::json;

	fn model(data: serde_json::Value, chart: crate::data::ChartKind) -> SceneModel {
		let prepared = prepare(&data, chart, &FieldConfig::default()).unwrap();
		let mut rng = SmallRng::seed_from_u64(7);
		build(
			&prepared,
			&ForceLayoutOptions::default(),
			&TreeLayoutOptions::default(),
			&mut rng,
		)
		.unwrap()
	}

	#[test]
	fn network_points_follow_engine_nodes() {
		let registry = SampleRegistry::builtin();
		let sample = registry.get("Transport links").unwrap();
		let built = model(sample.data.clone(), sample.chart);
		let engine = built.engine.as_ref().unwrap();
		assert_eq!(built.scene.points.len(), engine.nodes().len());
		assert_eq!(built.scene.segments.len(), 16);
		assert_eq!(built.scene.points[0].position, engine.nodes()[0].position);
	}

	#[test]
	fn tree_scene_has_one_point_per_node() {
		let data = json!({ "id": "R", "children": [{ "id": "A" }, { "id": "B", "children": [{ "id": "C" }] }] });
		let built = model(data, crate::data::ChartKind::Tree);
		assert_eq!(built.scene.points.len(), 4);
		assert_eq!(built.scene.segments.len(), 3);
		assert!(built.engine.is_none());
	}

	#[test]
	fn tallest_column_reaches_full_height() {
		let data = json!([{ "c": "a", "v": 2, "w": 1 }, { "c": "b", "v": 4, "w": 3 }]);
		let scene = model(data, crate::data::ChartKind::Bar).scene;
		assert_eq!(scene.points.len(), 8);
		assert_eq!(scene.segments.len(), 4);
		let top = scene.points.iter().map(|p| p.position.y).fold(f64::MIN, f64::max);
		assert_eq!(top, FLOOR + COLUMN_HEIGHT);
	}

	#[test]
	fn lattice_links_grid_neighbors() {
		let scene = lattice(&Grid::new(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]), false);
		assert_eq!(scene.points.len(), 6);
		assert_eq!(scene.segments.len(), 7);
		assert!(lattice(&Grid::placeholder(), true).points.is_empty());
	}

	#[test]
	fn pie_slices_grow_with_share() {
		let data = json!([{ "k": "small", "v": 1 }, { "k": "big", "v": 3 }]);
		let scene = model(data, crate::data::ChartKind::Pie).scene;
		let radius = |name: &str| {
			scene
				.points
				.iter()
				.find(|p| p.label.as_deref() == Some(name))
				.map(|p| p.radius)
				.unwrap()
		};
		assert!(radius("big") > radius("small"));
	}

	#[test]
	fn area_adds_fill_to_each_point() {
		let data = json!({ "timePoints": ["a", "b", "c"], "series": [{ "name": "s", "values": [1, 2, 3] }] });
		let line = model(data.clone(), crate::data::ChartKind::Line).scene;
		let area = model(data, crate::data::ChartKind::Area).scene;
		assert_eq!(line.segments.len(), 2);
		assert_eq!(area.segments.len(), 5);
	}
}
