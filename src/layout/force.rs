//! Step-bounded 3D force-directed layout for node/link graphs.
//!
//! Each step applies pairwise repulsion, weighted springs along links and a
//! weak pull towards the origin, then damps velocities, integrates, and clamps
//! positions into a cube of side `bound_size`. The engine performs at most
//! `step_budget` steps; callers typically run one step per animation frame and
//! render the intermediate positions.
//!
//! Repulsion uses `max(d, 1)` as the separation, so any pair closer than one
//! unit feels the same capped push as a pair exactly one unit apart. This
//! keeps near-coincident nodes from being flung out by a huge impulse, not
//! only exactly coincident ones.

use std::collections::HashMap;

use log::{debug, info, warn};
use rand::Rng;
use serde::Deserialize;

use super::vector::Vec3;
use crate::data::{DataError, GraphNode, NetworkData, NodeId};

/// Repulsion never sees a separation below this; it caps the close-range force.
const MIN_DISTANCE: f64 = 1.0;
/// Separations below this have no usable direction.
const COINCIDENT: f64 = 1e-9;
/// Floor for the ideal-distance denominator.
const MIN_STIFFNESS: f64 = 1e-3;

/// Simulation constants.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceLayoutOptions {
	/// Numerator of the inverse-square repulsion.
	pub repulsion_force: f64,
	/// Spring stiffness along links.
	pub attraction_force: f64,
	/// Pull towards the origin, proportional to distance from it.
	pub center_force: f64,
	/// Velocity multiplier applied every step, in `(0, 1]`.
	pub damping_factor: f64,
	/// Side length of the bounding cube.
	pub bound_size: f64,
	/// Number of steps to run.
	pub step_budget: usize,
	/// Numerator of the ideal link length.
	pub edge_length_factor: f64,
	/// Ideal length denominator at zero weight.
	pub base_constant: f64,
	/// How strongly weight shortens a link.
	pub weight_factor: f64,
	/// Stop early once total speed after a step drops below this.
	pub settle_threshold: Option<f64>,
}

impl Default for ForceLayoutOptions {
	fn default() -> Self {
		Self {
			repulsion_force: 5.0,
			attraction_force: 0.01,
			center_force: 0.01,
			damping_factor: 0.9,
			bound_size: 15.0,
			step_budget: 100,
			edge_length_factor: 6.0,
			base_constant: 1.0,
			weight_factor: 0.5,
			settle_threshold: None,
		}
	}
}

impl ForceLayoutOptions {
	/// Rejects constants that would make the simulation meaningless.
	pub fn validate(&self) -> Result<(), DataError> {
		let finite = [
			self.repulsion_force,
			self.attraction_force,
			self.center_force,
			self.damping_factor,
			self.bound_size,
			self.edge_length_factor,
			self.base_constant,
			self.weight_factor,
		]
		.iter()
		.all(|v| v.is_finite());
		if !finite {
			return Err(DataError::InvalidOptions("constants must be finite".into()));
		}
		if !(self.damping_factor > 0.0 && self.damping_factor <= 1.0) {
			return Err(DataError::InvalidOptions(format!(
				"dampingFactor {} is outside (0, 1]",
				self.damping_factor
			)));
		}
		if self.bound_size <= 0.0 {
			return Err(DataError::InvalidOptions(format!(
				"boundSize {} must be positive",
				self.bound_size
			)));
		}
		Ok(())
	}

	/// Target separation for a link of the given weight; heavier links sit
	/// closer together.
	pub fn ideal_distance(&self, weight: f64) -> f64 {
		self.edge_length_factor / (self.base_constant + weight * self.weight_factor).max(MIN_STIFFNESS)
	}
}

/// A graph node together with its simulation state.
#[derive(Clone, Debug)]
pub struct LayoutNode {
	/// The dataset node.
	pub data: GraphNode,
	/// Current position.
	pub position: Vec3,
	/// Current velocity.
	pub velocity: Vec3,
}

#[derive(Clone, Copy, Debug)]
struct Spring {
	source: usize,
	target: usize,
	weight: f64,
	ideal: f64,
}

/// Unit vector from `a` to `b` and the distance between them. Coincident
/// points separate along +x.
fn separation(a: Vec3, b: Vec3) -> (Vec3, f64) {
	let delta = b - a;
	let distance = delta.length();
	if distance < COINCIDENT {
		(Vec3::X, 0.0)
	} else {
		(delta / distance, distance)
	}
}

/// The force-directed layout engine. Owns node positions and velocities for
/// the lifetime of one visualization.
pub struct ForceLayout {
	nodes: Vec<LayoutNode>,
	springs: Vec<Spring>,
	options: ForceLayoutOptions,
	steps: usize,
	settled: bool,
}

impl ForceLayout {
	/// Places nodes (honoring pre-supplied coordinates, otherwise at random
	/// inside the bounds) and resolves links to node indices. Links naming an
	/// unknown node are dropped.
	pub fn new<R: Rng + ?Sized>(
		network: NetworkData,
		options: ForceLayoutOptions,
		rng: &mut R,
	) -> Result<Self, DataError> {
		options.validate()?;
		let limit = options.bound_size / 2.0;

		let mut index: HashMap<NodeId, usize> = HashMap::with_capacity(network.nodes.len());
		let mut nodes = Vec::with_capacity(network.nodes.len());
		for node in network.nodes {
			if index.contains_key(&node.id) {
				warn!("duplicate graph node {} ignored", node.id);
				continue;
			}
			let mut axis = |hint: Option<f64>| {
				hint.map(|v| v.clamp(-limit, limit))
					.unwrap_or_else(|| rng.gen_range(-limit..=limit))
			};
			let position = Vec3::new(axis(node.initial[0]), axis(node.initial[1]), axis(node.initial[2]));
			index.insert(node.id.clone(), nodes.len());
			nodes.push(LayoutNode {
				data: node,
				position,
				velocity: Vec3::ZERO,
			});
		}

		let springs = network
			.links
			.iter()
			.filter_map(|link| match (index.get(&link.source), index.get(&link.target)) {
				(Some(&source), Some(&target)) => Some(Spring {
					source,
					target,
					weight: link.weight(),
					ideal: options.ideal_distance(link.weight()),
				}),
				_ => {
					warn!("link {} -> {} references a missing node; skipped", link.source, link.target);
					None
				}
			})
			.collect::<Vec<_>>();

		debug!(
			"force layout: {} nodes, {} links, {} step budget",
			nodes.len(),
			springs.len(),
			options.step_budget
		);
		Ok(Self {
			nodes,
			springs,
			options,
			steps: 0,
			settled: false,
		})
	}

	/// Advances one step. Returns `false`, leaving positions untouched, once
	/// the layout is done.
	pub fn step(&mut self) -> bool {
		if self.is_done() {
			return false;
		}
		let o = &self.options;

		for i in 0..self.nodes.len() {
			for j in (i + 1)..self.nodes.len() {
				let (direction, distance) = separation(self.nodes[i].position, self.nodes[j].position);
				let distance = distance.max(MIN_DISTANCE);
				let force = direction * (o.repulsion_force / (distance * distance));
				self.nodes[i].velocity -= force;
				self.nodes[j].velocity += force;
			}
		}

		for spring in &self.springs {
			let (direction, distance) = separation(
				self.nodes[spring.source].position,
				self.nodes[spring.target].position,
			);
			let force = direction * (o.attraction_force * (distance - spring.ideal));
			self.nodes[spring.source].velocity += force;
			self.nodes[spring.target].velocity -= force;
		}

		let limit = o.bound_size / 2.0;
		for node in &mut self.nodes {
			node.velocity -= node.position * o.center_force;
			node.velocity *= o.damping_factor;
			node.position = (node.position + node.velocity).clamp_each(limit);
		}

		self.steps += 1;
		if let Some(threshold) = o.settle_threshold {
			if self.total_speed() < threshold {
				self.settled = true;
				info!("force layout settled after {} steps", self.steps);
			}
		}
		if self.steps == o.step_budget {
			debug!("force layout used its full budget of {} steps", o.step_budget);
		}
		true
	}

	/// Runs all remaining steps.
	pub fn run(&mut self) {
		while self.step() {}
	}

	/// True once the step budget is spent or the layout has settled.
	pub fn is_done(&self) -> bool {
		self.settled || self.steps >= self.options.step_budget
	}

	/// Steps performed so far.
	pub fn steps(&self) -> usize {
		self.steps
	}

	/// Sum of node speeds.
	pub fn total_speed(&self) -> f64 {
		self.nodes.iter().map(|n| n.velocity.length()).sum()
	}

	/// Half the bounding size; every coordinate stays within `±limit`.
	pub fn limit(&self) -> f64 {
		self.options.bound_size / 2.0
	}

	/// Nodes in dataset order.
	pub fn nodes(&self) -> &[LayoutNode] {
		&self.nodes
	}

	/// Resolved links as `(source index, target index, weight)`.
	pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
		self.springs.iter().map(|s| (s.source, s.target, s.weight))
	}

	/// Current position of a node by id.
	pub fn position_of(&self, id: &NodeId) -> Option<Vec3> {
		self.nodes.iter().find(|n| &n.data.id == id).map(|n| n.position)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::GraphLink;
	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	fn ring(n: i64) -> NetworkData {
		NetworkData {
			nodes: (0..n).map(GraphNode::new).collect(),
			links: (0..n).map(|i| GraphLink::new(i, (i + 1) % n)).collect(),
		}
	}

	#[test]
	fn positions_stay_inside_the_bounds() {
		let mut rng = SmallRng::seed_from_u64(11);
		let mut layout = ForceLayout::new(ring(24), ForceLayoutOptions::default(), &mut rng).unwrap();
		let limit = layout.limit();
		loop {
			for node in layout.nodes() {
				let p = node.position;
				assert!(
					p.x.abs() <= limit && p.y.abs() <= limit && p.z.abs() <= limit,
					"{:?} escaped ±{limit}",
					p
				);
			}
			if !layout.step() {
				break;
			}
		}
		assert_eq!(layout.steps(), 100);
	}

	#[test]
	fn presupplied_positions_are_clamped() {
		let mut rng = SmallRng::seed_from_u64(1);
		let network = NetworkData {
			nodes: vec![GraphNode::new("far").at(100.0, -100.0, 0.0)],
			links: Vec::new(),
		};
		let layout = ForceLayout::new(network, ForceLayoutOptions::default(), &mut rng).unwrap();
		assert_eq!(layout.nodes()[0].position, Vec3::new(7.5, -7.5, 0.0));
	}

	#[test]
	fn two_linked_nodes_end_equidistant_from_origin() {
		let mut rng = SmallRng::seed_from_u64(42);
		let network = NetworkData {
			nodes: vec![GraphNode::new(1), GraphNode::new(2)],
			links: vec![GraphLink::new(1, 2).weighted(1.0)],
		};
		let options = ForceLayoutOptions {
			step_budget: 400,
			..ForceLayoutOptions::default()
		};
		let mut layout = ForceLayout::new(network, options, &mut rng).unwrap();
		layout.run();
		let (a, b) = (layout.nodes()[0].position, layout.nodes()[1].position);
		assert!(
			(a.length() - b.length()).abs() < 1e-4,
			"{} vs {}",
			a.length(),
			b.length()
		);
	}

	#[test]
	fn symmetric_start_stays_symmetric_without_centering() {
		let mut rng = SmallRng::seed_from_u64(0);
		let network = NetworkData {
			nodes: vec![GraphNode::new("a").at(-1.0, 0.5, 0.0), GraphNode::new("b").at(1.0, -0.5, 0.0)],
			links: vec![GraphLink::new("a", "b")],
		};
		let options = ForceLayoutOptions {
			center_force: 0.0,
			..ForceLayoutOptions::default()
		};
		let mut layout = ForceLayout::new(network, options, &mut rng).unwrap();
		layout.run();
		let (a, b) = (layout.nodes()[0].position, layout.nodes()[1].position);
		assert!((a + b).length() < 1e-9);
	}

	#[test]
	fn coincident_nodes_are_pushed_apart() {
		let mut rng = SmallRng::seed_from_u64(3);
		let network = NetworkData {
			nodes: vec![GraphNode::new(1).at(0.0, 0.0, 0.0), GraphNode::new(2).at(0.0, 0.0, 0.0)],
			links: Vec::new(),
		};
		let mut layout = ForceLayout::new(network, ForceLayoutOptions::default(), &mut rng).unwrap();
		layout.step();
		let (a, b) = (layout.nodes()[0].position, layout.nodes()[1].position);
		assert!(a.x < 0.0 && b.x > 0.0);
		assert!(a.x.is_finite() && b.x.is_finite());
	}

	#[test]
	fn close_range_repulsion_is_capped_at_unit_distance() {
		let kick = |half_gap: f64| {
			let network = NetworkData {
				nodes: vec![
					GraphNode::new(1).at(-half_gap, 0.0, 0.0),
					GraphNode::new(2).at(half_gap, 0.0, 0.0),
				],
				links: Vec::new(),
			};
			let options = ForceLayoutOptions {
				center_force: 0.0,
				damping_factor: 1.0,
				..ForceLayoutOptions::default()
			};
			let mut layout = ForceLayout::new(network, options, &mut SmallRng::seed_from_u64(0)).unwrap();
			layout.step();
			layout.nodes()[0].velocity.x
		};
		let (near, unit, far) = (kick(0.05), kick(0.5), kick(2.0));
		assert!(near < 0.0);
		assert!((near - unit).abs() < 1e-12);
		assert!((unit + 5.0).abs() < 1e-12);
		assert!((far + 5.0 / 16.0).abs() < 1e-12);
	}

	#[test]
	fn dangling_links_contribute_nothing() {
		let mut rng = SmallRng::seed_from_u64(5);
		let network = NetworkData {
			nodes: vec![GraphNode::new(1), GraphNode::new(2)],
			links: vec![GraphLink::new(1, 2), GraphLink::new(2, 99)],
		};
		let layout = ForceLayout::new(network, ForceLayoutOptions::default(), &mut rng).unwrap();
		assert_eq!(layout.edges().collect::<Vec<_>>(), vec![(0, 1, 1.0)]);
	}

	#[test]
	fn exhausted_budget_freezes_positions() {
		let mut rng = SmallRng::seed_from_u64(8);
		let options = ForceLayoutOptions {
			step_budget: 3,
			..ForceLayoutOptions::default()
		};
		let mut layout = ForceLayout::new(ring(5), options, &mut rng).unwrap();
		layout.run();
		assert!(layout.is_done());
		let before: Vec<Vec3> = layout.nodes().iter().map(|n| n.position).collect();
		assert!(!layout.step());
		let after: Vec<Vec3> = layout.nodes().iter().map(|n| n.position).collect();
		assert_eq!(before, after);
		assert_eq!(layout.steps(), 3);
	}

	#[test]
	fn settle_threshold_ends_early() {
		let mut rng = SmallRng::seed_from_u64(9);
		let options = ForceLayoutOptions {
			settle_threshold: Some(f64::MAX),
			..ForceLayoutOptions::default()
		};
		let mut layout = ForceLayout::new(ring(4), options, &mut rng).unwrap();
		assert!(layout.step());
		assert!(layout.is_done());
		assert_eq!(layout.steps(), 1);
	}

	#[test]
	fn heavier_links_want_to_be_shorter() {
		let options = ForceLayoutOptions::default();
		assert!(options.ideal_distance(5.0) < options.ideal_distance(1.0));
		assert!(options.ideal_distance(-1e9).is_finite());
	}

	#[test]
	fn bad_damping_is_rejected() {
		let mut rng = SmallRng::seed_from_u64(2);
		let options = ForceLayoutOptions {
			damping_factor: 1.5,
			..ForceLayoutOptions::default()
		};
		assert!(matches!(
			ForceLayout::new(ring(2), options, &mut rng),
			Err(DataError::InvalidOptions(_))
		));
	}
}
