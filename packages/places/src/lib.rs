#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Place autocomplete and resolution provider client.
//!
//! Free-text queries resolve to ranked [`PlaceSuggestion`]s; a selected
//! suggestion's `place_id` resolves to a destination coordinate.

pub mod google;

use async_trait::async_trait;
use safest_geo::{Coordinate, SearchArea};
use serde::{Deserialize, Serialize};

pub use google::GooglePlaces;

/// Errors that can occur while querying the places provider.
#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("places provider returned status {status}")]
    Status {
        /// Raw HTTP status code.
        status: u16,
    },

    /// Response body was not the expected JSON shape.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The place resolved without a usable location.
    #[error("place {place_id} has no location")]
    MissingLocation {
        /// The place that failed to resolve.
        place_id: String,
    },
}

/// One ranked autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSuggestion {
    /// Opaque provider id, exchangeable for a coordinate.
    pub place_id: String,
    /// Human-readable place description.
    pub description: String,
}

/// A place id resolved into a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlace {
    /// Destination coordinate.
    pub location: Coordinate,
    /// Canonical description of the place.
    pub description: String,
}

/// A place search provider: autocomplete plus place resolution.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// Returns ranked suggestions for a partial text query, biased toward
    /// `bias`.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the request or decoding fails.
    async fn autocomplete(
        &self,
        query: &str,
        bias: &SearchArea,
    ) -> Result<Vec<PlaceSuggestion>, PlacesError>;

    /// Resolves a suggestion's place id into a destination coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the request fails or the place carries
    /// no location.
    async fn resolve(&self, place_id: &str) -> Result<ResolvedPlace, PlacesError>;
}
