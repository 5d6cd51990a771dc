#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Walking directions provider client and route models.
//!
//! A [`WalkingRoute`] bundles the decoded route geometry with its
//! turn-by-turn steps. The two always come from the same provider
//! response; callers never mix a route from one fetch with steps from
//! another.

pub mod google;

use async_trait::async_trait;
use regex::Regex;
use safest_geo::Coordinate;
use serde::{Deserialize, Serialize};

pub use google::GoogleDirections;

/// Errors that can occur while fetching directions.
#[derive(Debug, thiserror::Error)]
pub enum DirectionsError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("directions provider returned status {status}")]
    Status {
        /// Raw HTTP status code.
        status: u16,
    },

    /// Response body was not the expected JSON shape.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider succeeded but returned zero routes.
    #[error("no walking route found")]
    NoRoute,

    /// The route geometry could not be decoded.
    #[error("route geometry decode failed: {0}")]
    Geometry(#[from] safest_polyline::PolylineError),
}

/// One turn-by-turn maneuver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    /// Plain-text instruction with provider HTML markup stripped.
    pub instruction: String,
    /// Where this maneuver ends.
    pub endpoint: Coordinate,
    /// Length of this step in meters.
    pub distance_meters: f64,
    /// Provider-formatted duration (e.g. "4 mins").
    pub duration_text: String,
}

/// A walking route: decoded geometry plus its step sequence, both from
/// one directions response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkingRoute {
    /// Decoded route polyline.
    pub points: Vec<Coordinate>,
    /// Ordered maneuver steps.
    pub steps: Vec<RouteStep>,
}

/// A provider of walking directions between two coordinates.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Fetches a walking route from `origin` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectionsError::NoRoute`] when the provider has no
    /// route between the points, and other variants for transport or
    /// decoding failures.
    async fn walking_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<WalkingRoute, DirectionsError>;
}

/// Clean HTML tags and entities from an instruction string.
#[must_use]
pub fn strip_html(s: &str) -> String {
    let re = Regex::new(r"<[^>]+>").unwrap_or_else(|_| unreachable!());
    let cleaned = re.replace_all(s, "");
    cleaned
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_entities() {
        let raw = "Turn <b>left</b> onto <wbr/>Broadway&nbsp;&amp; continue";
        assert_eq!(strip_html(raw), "Turn left onto Broadway & continue");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(strip_html("Head north"), "Head north");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(strip_html("  <div>Arrive</div>  "), "Arrive");
    }
}
