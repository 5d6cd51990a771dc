#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial aggregation over normalized incidents.
//!
//! Two pure operations: bucketing incidents into a uniform lat/lng grid
//! for density display, and filtering incidents down to those within a
//! distance threshold of a route. Both rebuild their output from scratch
//! per input set; incident volumes are small enough that incremental
//! updates would only buy stale-cell bugs.

pub mod cluster;
pub mod corridor;

pub use cluster::{DEFAULT_CELL_SIZE_DEGREES, GridCell, cluster_incidents, density_color};
pub use corridor::{DEFAULT_CORRIDOR_METERS, filter_by_corridor};
