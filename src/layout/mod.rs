//! The layout half of the core: positions for graph and tree nodes.

mod force;
mod tree;
mod vector;

pub use force::{ForceLayout, ForceLayoutOptions, LayoutNode};
pub use tree::{TreeLayoutOptions, TreePosition, compute_tree_layout};
pub use vector::Vec3;
