//! Google Directions API client (walking mode).
//!
//! Endpoint: <https://maps.googleapis.com/maps/api/directions/json>

use safest_geo::Coordinate;
use serde::Deserialize;

use crate::{DirectionsError, DirectionsProvider, RouteStep, WalkingRoute, strip_html};

const API_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

/// Directions provider backed by the Google Directions API.
pub struct GoogleDirections {
    client: reqwest::Client,
    api_key: String,
}

impl GoogleDirections {
    /// Creates a client with the given API key.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    overview_polyline: RawPolyline,
    #[serde(default)]
    legs: Vec<RawLeg>,
}

#[derive(Debug, Deserialize)]
struct RawPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct RawLeg {
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(default)]
    html_instructions: String,
    distance: RawValueText,
    duration: RawValueText,
    end_location: RawLatLng,
}

#[derive(Debug, Deserialize)]
struct RawValueText {
    #[serde(default)]
    value: f64,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawLatLng {
    lat: f64,
    lng: f64,
}

/// Maps the first returned route into a [`WalkingRoute`], decoding its
/// overview geometry and stripping instruction markup.
fn parse_route(response: DirectionsResponse) -> Result<WalkingRoute, DirectionsError> {
    let Some(route) = response.routes.into_iter().next() else {
        return Err(DirectionsError::NoRoute);
    };

    let points = safest_polyline::decode(&route.overview_polyline.points)?;

    let steps: Vec<RouteStep> = route
        .legs
        .into_iter()
        .flat_map(|leg| leg.steps)
        .map(|step| RouteStep {
            instruction: strip_html(&step.html_instructions),
            endpoint: Coordinate::new(step.end_location.lat, step.end_location.lng),
            distance_meters: step.distance.value,
            duration_text: step.duration.text,
        })
        .collect();

    log::info!(
        "Directions response: {} route points, {} steps",
        points.len(),
        steps.len()
    );
    Ok(WalkingRoute { points, steps })
}

#[async_trait::async_trait]
impl DirectionsProvider for GoogleDirections {
    async fn walking_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<WalkingRoute, DirectionsError> {
        let url = format!(
            "{API_URL}?origin={},{}&destination={},{}&mode=walking&key={}",
            origin.latitude,
            origin.longitude,
            destination.latitude,
            destination.longitude,
            self.api_key
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DirectionsError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: DirectionsResponse = serde_json::from_str(&body)?;
        parse_route(parsed)
    }
}
