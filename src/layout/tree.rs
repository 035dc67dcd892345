//! Layered tree layout. Depth runs down the y axis from `maxDepth * levelHeight / 2`,
//! siblings spread along x around their parent, and each subtree receives an
//! equal share of its parent's horizontal budget.

use std::collections::HashMap;

use log::{debug, warn};
use serde::Deserialize;

use super::vector::Vec3;
use crate::data::{DataError, NodeId, TreeNode};

/// Spacing constants for [`compute_tree_layout`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeLayoutOptions {
	/// Vertical distance between levels.
	pub level_height: f64,
	/// Nominal horizontal distance between siblings.
	pub node_spacing: f64,
	/// Horizontal budget of the root's children.
	pub max_width: f64,
}

impl Default for TreeLayoutOptions {
	fn default() -> Self {
		Self {
			level_height: 4.0,
			node_spacing: 3.0,
			max_width: 20.0,
		}
	}
}

impl TreeLayoutOptions {
	/// Rejects negative or non-finite spacing.
	pub fn validate(&self) -> Result<(), DataError> {
		for (name, v) in [
			("levelHeight", self.level_height),
			("nodeSpacing", self.node_spacing),
			("maxWidth", self.max_width),
		] {
			if !v.is_finite() || v < 0.0 {
				return Err(DataError::InvalidOptions(format!("{name} {v} must be a non-negative number")));
			}
		}
		Ok(())
	}
}

/// Where a tree node sits, and at which depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreePosition {
	/// Horizontal.
	pub x: f64,
	/// Vertical; decreases with depth.
	pub y: f64,
	/// Always 0; trees are laid out in a plane.
	pub z: f64,
	/// Depth, root = 0.
	pub level: usize,
}

impl TreePosition {
	/// The position as a vector.
	pub fn point(&self) -> Vec3 {
		Vec3::new(self.x, self.y, self.z)
	}
}

/// Places every node of `root`. Pure and deterministic: the same tree and
/// options always give the same map, with one entry per node.
pub fn compute_tree_layout(root: &TreeNode, options: &TreeLayoutOptions) -> HashMap<NodeId, TreePosition> {
	let top = root.depth() as f64 * options.level_height / 2.0;
	let mut positions = HashMap::with_capacity(root.count());
	positions.insert(
		root.id.clone(),
		TreePosition {
			x: 0.0,
			y: top,
			z: 0.0,
			level: 0,
		},
	);

	// (node, level, center x, available width)
	let mut stack = vec![(root, 0usize, 0.0f64, options.max_width)];
	while let Some((node, level, center, available)) = stack.pop() {
		let count = node.children.len();
		if count == 0 {
			continue;
		}
		let level = level + 1;
		let y = top - level as f64 * options.level_height;
		let (start, spacing) = if count == 1 {
			(center, 0.0)
		} else {
			let total = available.min((count - 1) as f64 * options.node_spacing);
			(center - total / 2.0, total / (count - 1) as f64)
		};
		let share = available / count.max(1) as f64;

		for (i, child) in node.children.iter().enumerate() {
			let x = start + i as f64 * spacing;
			let previous = positions.insert(child.id.clone(), TreePosition { x, y, z: 0.0, level });
			if previous.is_some() {
				warn!("tree id {} appears twice; later position kept", child.id);
			}
			stack.push((child, level, x, share));
		}
	}

	debug!("tree layout placed {} nodes", positions.len());
	positions
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fan(n: usize) -> TreeNode {
		(0..n).fold(TreeNode::leaf("R"), |root, i| {
			root.with_child(TreeNode::leaf(format!("c{i}").as_str()))
		})
	}

	#[test]
	fn three_children_spread_around_parent() {
		let root = TreeNode::leaf("R")
			.with_child(TreeNode::leaf("A"))
			.with_child(TreeNode::leaf("B"))
			.with_child(TreeNode::leaf("C"));
		let layout = compute_tree_layout(&root, &TreeLayoutOptions::default());
		let at = |id: &str| layout[&NodeId::from(id)];

		assert_eq!(at("A").x, -3.0);
		assert_eq!(at("B").x, 0.0);
		assert_eq!(at("C").x, 3.0);
		assert_eq!(at("A").y, at("B").y);
		assert_eq!(at("B").y, at("C").y);
		assert_eq!(at("R").y, 2.0);
		assert_eq!(at("A").y, -2.0);
		assert_eq!(at("C").level, 1);
	}

	#[test]
	fn one_entry_per_node_and_repeatable() {
		let root = TreeNode::leaf(1)
			.with_child(TreeNode::leaf(2).with_child(TreeNode::leaf(4)).with_child(TreeNode::leaf(5)))
			.with_child(TreeNode::leaf(3).with_child(TreeNode::leaf(6).with_child(TreeNode::leaf(7))));
		let options = TreeLayoutOptions::default();
		let first = compute_tree_layout(&root, &options);
		let second = compute_tree_layout(&root, &options);
		assert_eq!(first.len(), root.count());
		assert_eq!(first, second);
		assert_eq!(first[&NodeId::from(7)].level, 3);
	}

	#[test]
	fn lone_root_sits_at_origin() {
		let layout = compute_tree_layout(&TreeNode::leaf("only"), &TreeLayoutOptions::default());
		assert_eq!(layout.len(), 1);
		assert_eq!(layout[&NodeId::from("only")].point(), Vec3::ZERO);
	}

	#[test]
	fn single_child_inherits_parent_x() {
		let root = TreeNode::leaf("R")
			.with_child(TreeNode::leaf("A").with_child(TreeNode::leaf("A1")))
			.with_child(TreeNode::leaf("B"));
		let layout = compute_tree_layout(&root, &TreeLayoutOptions::default());
		assert_eq!(layout[&NodeId::from("A1")].x, layout[&NodeId::from("A")].x);
	}

	#[test]
	fn width_pressure_compresses_spacing() {
		let root = fan(11);
		let layout = compute_tree_layout(&root, &TreeLayoutOptions::default());
		let first = layout[&NodeId::from("c0")].x;
		let last = layout[&NodeId::from("c10")].x;
		assert!((first + 10.0).abs() < 1e-12);
		assert!((last - 10.0).abs() < 1e-12);
	}

	#[test]
	fn negative_spacing_is_rejected() {
		let options = TreeLayoutOptions {
			node_spacing: -1.0,
			..TreeLayoutOptions::default()
		};
		assert!(options.validate().is_err());
		assert!(TreeLayoutOptions::default().validate().is_ok());
	}

	#[test]
	fn deep_chains_lay_out_every_level() {
		let mut root = TreeNode::leaf(99_999i64);
		for i in (0..99_999i64).rev() {
			root = TreeNode::leaf(i).with_child(root);
		}
		let options = TreeLayoutOptions::default();
		let layout = compute_tree_layout(&root, &options);
		assert_eq!(layout.len(), 100_000);
		let last = layout[&NodeId::Int(99_999)];
		assert_eq!(last.level, 99_999);
		assert_eq!(last.x, 0.0);
		assert_eq!(layout[&NodeId::Int(0)].y - last.y, 99_999.0 * options.level_height);
	}
}
