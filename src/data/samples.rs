//! Built-in datasets, one per chart type.

use serde_json::{Value, json};

use super::config::FieldConfig;
use super::pipeline::ChartKind;

/// A named dataset with the chart it is meant for.
#[derive(Clone, Debug)]
pub struct Sample {
	/// Display and lookup name.
	pub name: &'static str,
	/// Chart to open it with.
	pub chart: ChartKind,
	/// Raw JSON.
	pub data: Value,
	/// Field names the dataset needs beyond the defaults.
	pub fields: FieldConfig,
}

/// Sample datasets, built once at startup and handed to the UI.
#[derive(Clone, Debug)]
pub struct SampleRegistry {
	samples: Vec<Sample>,
}

impl SampleRegistry {
	/// The bundled samples.
	pub fn builtin() -> Self {
		let sample = |name, chart, data| Sample {
			name,
			chart,
			data,
			fields: FieldConfig::default(),
		};
		Self {
			samples: vec![
				sample("Cities (bar)", ChartKind::Bar, cities()),
				sample("Cities (scatter)", ChartKind::Scatter, city_metrics()),
				sample("Population share", ChartKind::Pie, population_share()),
				sample("Transport links", ChartKind::Network, transport_links()),
				sample("Org chart", ChartKind::Tree, org_chart()),
				sample("Org chart (flat)", ChartKind::Tree, flat_org_chart()),
				sample("Temperatures", ChartKind::Line, temperatures()),
				sample("Regional sales", ChartKind::Area, regional_sales()),
				sample("Ripple", ChartKind::Surface, ripple(16)),
				Sample {
					name: "Weekly activity",
					chart: ChartKind::HeatMap,
					data: weekly_activity(),
					fields: FieldConfig::grid("hour", "day", "events"),
				},
			],
		}
	}

	/// Looks a sample up by name.
	pub fn get(&self, name: &str) -> Option<&Sample> {
		self.samples.iter().find(|s| s.name == name)
	}

	/// Sample names in display order.
	pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.samples.iter().map(|s| s.name)
	}

	/// All samples.
	pub fn iter(&self) -> impl Iterator<Item = &Sample> {
		self.samples.iter()
	}
}

fn cities() -> Value {
	json!([
		{ "category": "Beijing", "population": 21.54, "gdp": 3.86, "area": 16410 },
		{ "category": "Shanghai", "population": 24.87, "gdp": 4.32, "area": 6340 },
		{ "category": "Guangzhou", "population": 18.67, "gdp": 2.82, "area": 7434 },
		{ "category": "Shenzhen", "population": 17.56, "gdp": 3.24, "area": 1997 },
		{ "category": "Chengdu", "population": 16.33, "gdp": 2.02, "area": 14335 },
		{ "category": "Chongqing", "population": 32.05, "gdp": 2.78, "area": 82400 },
		{ "category": "Hangzhou", "population": 12.47, "gdp": 2.02, "area": 16853 },
		{ "category": "Wuhan", "population": 13.59, "gdp": 1.89, "area": 8494 }
	])
}

fn city_metrics() -> Value {
	json!([
		{ "name": "Beijing", "gdp": 3.86, "population": 21.54, "income": 67.8 },
		{ "name": "Shanghai", "gdp": 4.32, "population": 24.87, "income": 76.1 },
		{ "name": "Guangzhou", "gdp": 2.82, "population": 18.67, "income": 63.4 },
		{ "name": "Shenzhen", "gdp": 3.24, "population": 17.56, "income": 72.5 },
		{ "name": "Chengdu", "gdp": 2.02, "population": 16.33, "income": 58.2 },
		{ "name": "Chongqing", "gdp": 2.78, "population": 32.05, "income": 52.7 },
		{ "name": "Hangzhou", "gdp": 2.02, "population": 12.47, "income": 68.3 },
		{ "name": "Wuhan", "gdp": 1.89, "population": 13.59, "income": 54.9 },
		{ "name": "Xi'an", "gdp": 1.38, "population": 12.95, "income": 51.2 },
		{ "name": "Nanjing", "gdp": 1.82, "population": 9.31, "income": 64.5 },
		{ "name": "Tianjin", "gdp": 1.57, "population": 13.86, "income": 59.3 },
		{ "name": "Suzhou", "gdp": 2.27, "population": 10.75, "income": 71.2 },
		{ "name": "Zhengzhou", "gdp": 1.35, "population": 12.60, "income": 53.8 },
		{ "name": "Changsha", "gdp": 1.42, "population": 8.39, "income": 56.7 },
		{ "name": "Qingdao", "gdp": 1.48, "population": 9.39, "income": 60.4 }
	])
}

fn population_share() -> Value {
	json!([
		{ "category": "Beijing", "value": 21.54 },
		{ "category": "Shanghai", "value": 24.87 },
		{ "category": "Guangzhou", "value": 18.67 },
		{ "category": "Shenzhen", "value": 17.56 },
		{ "category": "Chengdu", "value": 16.33 },
		{ "category": "Chongqing", "value": 32.05 },
		{ "category": "Hangzhou", "value": 12.47 },
		{ "category": "Wuhan", "value": 13.59 }
	])
}

fn transport_links() -> Value {
	json!({
		"nodes": [
			{ "id": 1, "name": "Beijing", "group": 0 },
			{ "id": 2, "name": "Shanghai", "group": 0 },
			{ "id": 3, "name": "Guangzhou", "group": 0 },
			{ "id": 4, "name": "Shenzhen", "group": 0 },
			{ "id": 5, "name": "Chengdu", "group": 1 },
			{ "id": 6, "name": "Chongqing", "group": 1 },
			{ "id": 7, "name": "Hangzhou", "group": 2 },
			{ "id": 8, "name": "Wuhan", "group": 2 },
			{ "id": 9, "name": "Xi'an", "group": 3 },
			{ "id": 10, "name": "Nanjing", "group": 2 }
		],
		"links": [
			{ "source": 1, "target": 2, "value": 5 },
			{ "source": 1, "target": 3, "value": 3 },
			{ "source": 1, "target": 4, "value": 4 },
			{ "source": 1, "target": 5, "value": 2 },
			{ "source": 2, "target": 7, "value": 4 },
			{ "source": 2, "target": 8, "value": 2 },
			{ "source": 2, "target": 10, "value": 3 },
			{ "source": 3, "target": 4, "value": 5 },
			{ "source": 3, "target": 6, "value": 2 },
			{ "source": 4, "target": 5, "value": 3 },
			{ "source": 5, "target": 6, "value": 4 },
			{ "source": 5, "target": 9, "value": 2 },
			{ "source": 6, "target": 8, "value": 3 },
			{ "source": 7, "target": 10, "value": 4 },
			{ "source": 8, "target": 9, "value": 3 },
			{ "source": 9, "target": 10, "value": 2 }
		]
	})
}

fn org_chart() -> Value {
	json!({
		"id": "CEO", "name": "Chief Executive", "value": 100,
		"children": [
			{
				"id": "CTO", "name": "Chief Technology", "value": 85,
				"children": [
					{
						"id": "DEV", "name": "Development", "value": 75,
						"children": [
							{ "id": "FRONTEND", "name": "Frontend", "value": 65 },
							{ "id": "BACKEND", "name": "Backend", "value": 70 },
							{ "id": "DBA", "name": "Databases", "value": 65 }
						]
					},
					{
						"id": "QA", "name": "Quality", "value": 70,
						"children": [
							{ "id": "QA1", "name": "Test engineer", "value": 55 },
							{ "id": "AUTOMATION", "name": "Automation", "value": 60 }
						]
					}
				]
			},
			{
				"id": "CFO", "name": "Chief Financial", "value": 80,
				"children": [
					{ "id": "ACCOUNTING", "name": "Accounting", "value": 65 },
					{ "id": "FINANCE", "name": "Finance", "value": 70 }
				]
			},
			{
				"id": "CMO", "name": "Chief Marketing", "value": 78,
				"children": [
					{ "id": "MARKETING", "name": "Marketing", "value": 68 },
					{ "id": "SALES", "name": "Sales", "value": 72 }
				]
			}
		]
	})
}

fn flat_org_chart() -> Value {
	json!([
		{ "id": "ceo", "name": "Chief Executive", "value": 10 },
		{ "id": "cto", "name": "Chief Technology", "parent": "ceo", "value": 8 },
		{ "id": "cfo", "name": "Chief Financial", "parent": "ceo", "value": 7 },
		{ "id": "dev", "name": "Development", "parent": "cto", "value": 5 },
		{ "id": "ops", "name": "Operations", "parent": "cto", "value": 4 },
		{ "id": "acct", "name": "Accounting", "parent": "cfo", "value": 3 },
		{ "id": "web", "name": "Web team", "parent": "dev", "value": 2 },
		{ "id": "app", "name": "App team", "parent": "dev", "value": 2 }
	])
}

fn months() -> Value {
	json!(["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"])
}

fn temperatures() -> Value {
	json!({
		"timePoints": months(),
		"series": [
			{ "name": "Beijing", "values": [5, 7, 12, 18, 23, 28, 30, 29, 24, 18, 12, 6], "color": 0x3498db },
			{ "name": "Shanghai", "values": [8, 9, 13, 19, 24, 28, 31, 31, 27, 21, 15, 9], "color": 0x2ecc71 },
			{ "name": "Guangzhou", "values": [14, 15, 18, 22, 26, 29, 31, 31, 29, 25, 20, 16], "color": 0xe74c3c },
			{ "name": "Harbin", "values": [-18, -12, -2, 8, 16, 22, 25, 22, 15, 6, -5, -14], "color": 0xf39c12 },
			{ "name": "Lhasa", "values": [0, 3, 7, 11, 15, 19, 18, 17, 16, 11, 5, 1], "color": 0x9b59b6 }
		]
	})
}

fn regional_sales() -> Value {
	json!({
		"timePoints": months(),
		"series": [
			{ "name": "North", "values": [120, 132, 101, 134, 90, 230, 210, 182, 191, 234, 290, 330], "color": 0x3498db },
			{ "name": "South", "values": [220, 182, 191, 234, 290, 330, 310, 123, 442, 321, 90, 149], "color": 0x2ecc71 },
			{ "name": "East", "values": [150, 232, 201, 154, 190, 330, 410, 182, 191, 234, 290, 330], "color": 0xe74c3c },
			{ "name": "West", "values": [98, 77, 101, 99, 40, 150, 160, 92, 71, 120, 190, 210], "color": 0xf39c12 }
		]
	})
}

/// `sin(r) / r` sampled on an `n × n` lattice.
fn ripple(n: usize) -> Value {
	let half = n as f64 / 2.0;
	let values: Vec<Vec<f64>> = (0..n)
		.map(|row| {
			(0..n)
				.map(|col| {
					let (x, y) = ((col as f64 - half) * 0.8, (row as f64 - half) * 0.8);
					let r = (x * x + y * y).sqrt();
					let v = if r < 1e-9 { 1.0 } else { r.sin() / r };
					(v * 1000.0).round() / 1000.0
				})
				.collect()
		})
		.collect();
	json!({ "values": values })
}

fn weekly_activity() -> Value {
	let days = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
	let rows: Vec<Value> = days
		.iter()
		.enumerate()
		.flat_map(|(d, day)| {
			(0..24).step_by(3).map(move |hour| {
				let base = if d < 5 { 40 } else { 15 };
				let peak = 30 - (hour as i64 - 12).abs() * 2;
				json!({ "day": day, "hour": hour, "events": base + peak + (d as i64 * 7) % 11 })
			})
		})
		.collect();
	Value::Array(rows)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::{ChartData, prepare};

	#[test]
	fn every_sample_prepares_for_its_chart() {
		let registry = SampleRegistry::builtin();
		for sample in registry.iter() {
			let prepared = prepare(&sample.data, sample.chart, &sample.fields)
				.unwrap_or_else(|e| panic!("{}: {e}", sample.name));
			assert!(!prepared.is_empty(), "{} prepared to nothing", sample.name);
		}
	}

	#[test]
	fn lookup_by_name() {
		let registry = SampleRegistry::builtin();
		assert_eq!(registry.names().count(), 10);
		assert_eq!(registry.get("Transport links").map(|s| s.chart), Some(ChartKind::Network));
		assert!(registry.get("missing").is_none());
	}

	#[test]
	fn heat_map_sample_pivots_to_days_by_hours() {
		let registry = SampleRegistry::builtin();
		let sample = registry.get("Weekly activity").unwrap();
		let Ok(ChartData::HeatMap(grid)) = prepare(&sample.data, sample.chart, &sample.fields) else {
			panic!("expected a heat map");
		};
		assert_eq!((grid.rows(), grid.cols()), (7, 8));
	}
}
