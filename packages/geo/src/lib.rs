#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate value type and great-circle distance math.
//!
//! Everything in this workspace that touches a position goes through
//! [`Coordinate`]. Distances use the haversine formula on a spherical
//! Earth model; at pedestrian scales the ellipsoidal error is far below
//! the thresholds anything here compares against.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (spherical model).
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 position. Latitude in [-90, 90], longitude in [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Degrees north of the equator.
    pub latitude: f64,
    /// Degrees east of the prime meridian.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude/longitude degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A circular query area: center point plus radius in meters.
///
/// Used to scope incident-feed fetches and to bias autocomplete results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchArea {
    /// Center of the circle.
    pub center: Coordinate,
    /// Radius in meters.
    pub radius_meters: f64,
}

impl SearchArea {
    /// Creates a search area around a center point.
    #[must_use]
    pub const fn new(center: Coordinate, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
        }
    }
}

/// Great-circle distance between two coordinates in meters.
#[must_use]
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}
