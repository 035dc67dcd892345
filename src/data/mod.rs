//! The data half of the core: dataset types, shape classification, shape
//! conversion and chart preparation.

mod config;
mod convert;
mod error;
mod fields;
mod pipeline;
mod samples;
mod shape;
mod types;

pub use config::FieldConfig;
pub use convert::{
	Converted, convert, edges_to_network, flat_to_tree, nested_tree, network_to_tree, to_grid,
	to_network, to_tabular, to_tree,
};
pub use error::DataError;
pub use fields::{FieldKind, FieldProfile, FieldRange, category_field, numeric_fields, pie_fields, profile};
pub use pipeline::{ChartData, ChartKind, parse_dataset, parse_field_config, prepare};
pub use samples::{Sample, SampleRegistry};
pub use shape::{Shape, classify};
pub use types::{
	GraphLink, GraphNode, Grid, NetworkData, NodeId, Record, Series, SeriesData, TreeNode, label_of,
};
