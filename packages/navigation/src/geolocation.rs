//! Device position source abstraction.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use safest_geo::{Coordinate, haversine_distance};
use strum_macros::{AsRefStr, Display, EnumString};

/// Default minimum movement between reported positions.
pub const MIN_MOVEMENT_METERS: f64 = 2.0;

/// Requested positioning accuracy tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Accuracy {
    /// Cell/wifi level accuracy.
    Coarse,
    /// Balanced power and accuracy.
    Balanced,
    /// Best available fix (GPS).
    High,
}

/// Options for a continuous position subscription.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    /// Requested accuracy tier.
    pub accuracy: Accuracy,
    /// Positions closer than this to the previous report are suppressed.
    pub min_movement_meters: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::High,
            min_movement_meters: MIN_MOVEMENT_METERS,
        }
    }
}

/// Errors from the geolocation source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    /// The user refused location permission. Features that need location
    /// stay blocked until permission is granted on a later ask.
    #[error("location permission denied")]
    PermissionDenied,

    /// No position fix is available.
    #[error("position unavailable: {message}")]
    Unavailable {
        /// Platform-specific detail.
        message: String,
    },
}

/// An asynchronous source of device positions.
#[async_trait]
pub trait GeolocationSource: Send + Sync {
    /// Returns the device's current position once.
    ///
    /// # Errors
    ///
    /// Returns [`GeolocationError::PermissionDenied`] if the user refused
    /// permission, or [`GeolocationError::Unavailable`] without a fix.
    async fn current_position(&self) -> Result<Coordinate, GeolocationError>;

    /// Subscribes to a continuous position stream. The subscription ends
    /// when the returned stream is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`GeolocationError`] if the subscription cannot start.
    async fn watch(
        &self,
        options: &WatchOptions,
    ) -> Result<BoxStream<'static, Coordinate>, GeolocationError>;
}

/// A geolocation source that replays a fixed position sequence.
///
/// Drives the CLI walkthrough and tests; applies the same minimum
/// movement threshold a real platform source would.
pub struct SimulatedGeolocation {
    positions: Vec<Coordinate>,
}

impl SimulatedGeolocation {
    /// Creates a source replaying `positions` in order.
    #[must_use]
    pub const fn new(positions: Vec<Coordinate>) -> Self {
        Self { positions }
    }
}

#[async_trait]
impl GeolocationSource for SimulatedGeolocation {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        self.positions
            .first()
            .copied()
            .ok_or_else(|| GeolocationError::Unavailable {
                message: "no simulated positions".to_string(),
            })
    }

    async fn watch(
        &self,
        options: &WatchOptions,
    ) -> Result<BoxStream<'static, Coordinate>, GeolocationError> {
        let mut reported: Vec<Coordinate> = Vec::with_capacity(self.positions.len());
        for position in &self.positions {
            match reported.last() {
                Some(last) if haversine_distance(*last, *position) < options.min_movement_meters => {
                }
                _ => reported.push(*position),
            }
        }
        Ok(stream::iter(reported).boxed())
    }
}
