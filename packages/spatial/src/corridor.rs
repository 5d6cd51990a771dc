//! Route-corridor filtering.

use safest_geo::{Coordinate, haversine_distance};
use safest_source_models::SafetyIncident;

/// Default corridor half-width in meters.
pub const DEFAULT_CORRIDOR_METERS: f64 = 500.0;

/// Keeps the incidents within `threshold_meters` of any route vertex,
/// preserving input order.
///
/// Distance is measured to the decoded polyline's vertices, not to the
/// segments between them, so an incident near the midpoint of a long
/// straight segment can fall outside the corridor. Output is monotonic in
/// the threshold: widening it never removes an incident.
///
/// O(incidents x route points); fine at feed scale (<= 5k per feed,
/// routes of low hundreds of points).
#[must_use]
pub fn filter_by_corridor(
    incidents: Vec<SafetyIncident>,
    route: &[Coordinate],
    threshold_meters: f64,
) -> Vec<SafetyIncident> {
    let total = incidents.len();
    let kept: Vec<SafetyIncident> = incidents
        .into_iter()
        .filter(|incident| {
            route
                .iter()
                .any(|point| haversine_distance(incident.location, *point) < threshold_meters)
        })
        .collect();

    log::debug!(
        "Corridor filter kept {} of {total} incidents within {threshold_meters}m",
        kept.len()
    );
    kept
}
