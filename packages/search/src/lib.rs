#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route search orchestration.
//!
//! The search pipeline (debounced autocomplete, place resolution, the
//! parallel directions + incidents fan-out, and corridor filtering) is
//! split in two: [`state::SearchState`] is a pure transition machine that
//! returns effect lists and enforces staleness, and
//! [`driver::SearchOrchestrator`] is the single-threaded actor that
//! executes those effects against injected providers.

pub mod driver;
pub mod state;

use std::time::Duration;

use safest_directions::RouteStep;
use safest_geo::Coordinate;
use safest_source_models::SafetyIncident;
use safest_spatial::GridCell;
use serde::{Deserialize, Serialize};

pub use driver::{SearchOrchestrator, SearchProviders, SearchUpdate};
pub use state::{Effect, RequestToken, SearchState};

/// Debounce interval between the last keystroke and the autocomplete
/// request.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Tuning knobs for the search pipeline. Defaults match production
/// behavior; tests shrink the timings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Autocomplete debounce interval.
    pub debounce: Duration,
    /// Corridor half-width for incident filtering, in meters.
    pub corridor_meters: f64,
    /// Grid cell size for density clustering, in degrees.
    pub cell_size_degrees: f64,
    /// Radius of the incident fetch circle around the destination.
    pub incident_radius_meters: f64,
    /// Radius of the autocomplete bias circle around the origin.
    pub autocomplete_bias_meters: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: DEBOUNCE,
            corridor_meters: safest_spatial::DEFAULT_CORRIDOR_METERS,
            cell_size_degrees: safest_spatial::DEFAULT_CELL_SIZE_DEGREES,
            incident_radius_meters: 2_000.0,
            autocomplete_bias_meters: 20_000.0,
        }
    }
}

/// Everything the presentation layer needs after a successful search:
/// the route, its steps, the corridor-filtered incidents, and their
/// density cells, all derived from one directions response and the
/// incident fetch that ran alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteBundle {
    /// Decoded route geometry.
    pub route: Vec<Coordinate>,
    /// Ordered maneuver steps from the same response as `route`.
    pub steps: Vec<RouteStep>,
    /// Incidents within the corridor, in feed order.
    pub incidents: Vec<SafetyIncident>,
    /// Density grid over the corridor incidents.
    pub cells: Vec<GridCell>,
}
