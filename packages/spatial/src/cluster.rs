//! Uniform-grid density clustering.

use std::collections::BTreeMap;

use safest_geo::Coordinate;
use safest_source_models::SafetyIncident;
use serde::{Deserialize, Serialize};

/// Default grid cell size in degrees (~1.1 km east-west at NYC latitudes).
pub const DEFAULT_CELL_SIZE_DEGREES: f64 = 0.01;

/// One occupied grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    /// Stable string key derived from the snapped cell coordinates.
    pub key: String,
    /// Arithmetic mean of member coordinates. Markers placed here sit
    /// where the incidents actually are instead of snapping to the
    /// lattice corner.
    pub centroid: Coordinate,
    /// Number of member incidents; always >= 1.
    pub count: usize,
    /// The member incidents themselves.
    pub members: Vec<SafetyIncident>,
}

/// Buckets incidents into a uniform lat/lng grid.
///
/// Every incident lands in exactly one cell and the cell counts sum to
/// the input length. Cells come back in key order, so identical inputs
/// produce identical output.
#[must_use]
pub fn cluster_incidents(incidents: &[SafetyIncident], cell_size_degrees: f64) -> Vec<GridCell> {
    let mut buckets: BTreeMap<String, Vec<SafetyIncident>> = BTreeMap::new();

    for incident in incidents {
        let key = cell_key(incident.location, cell_size_degrees);
        buckets.entry(key).or_default().push(incident.clone());
    }

    let cells: Vec<GridCell> = buckets
        .into_iter()
        .map(|(key, members)| {
            let count = members.len();
            #[allow(clippy::cast_precision_loss)]
            let scale = count as f64;
            let centroid = Coordinate::new(
                members.iter().map(|i| i.location.latitude).sum::<f64>() / scale,
                members.iter().map(|i| i.location.longitude).sum::<f64>() / scale,
            );
            GridCell {
                key,
                centroid,
                count,
                members,
            }
        })
        .collect();

    log::debug!(
        "Clustered {} incidents into {} cells",
        incidents.len(),
        cells.len()
    );
    cells
}

/// Density-to-color hint for a cell: fixed red channel, green and blue
/// fading out linearly as the cell approaches the densest in the set.
///
/// Pure function of `(count, max_count)` so renderers stay swappable; the
/// cells themselves carry no color.
#[must_use]
pub fn density_color(count: usize, max_count: usize) -> (u8, u8, u8) {
    #[allow(clippy::cast_precision_loss)]
    let ratio = (count as f64 / max_count.max(1) as f64).clamp(0.0, 1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let fade = ((1.0 - ratio) * 255.0).round() as u8;
    (255, fade, fade)
}

/// Snaps a coordinate to its cell and formats the stable key.
///
/// Five fixed decimal places: enough to distinguish every distinct cell
/// at any practical cell size without floating-point formatting drift.
fn cell_key(location: Coordinate, cell_size_degrees: f64) -> String {
    let lat = (location.latitude / cell_size_degrees).round() * cell_size_degrees;
    let lng = (location.longitude / cell_size_degrees).round() * cell_size_degrees;
    format!("{lat:.5},{lng:.5}")
}
