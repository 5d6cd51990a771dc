//! Google Places API client (autocomplete + details).

use safest_geo::{Coordinate, SearchArea};
use serde::Deserialize;

use crate::{PlaceSuggestion, PlacesError, PlacesProvider, ResolvedPlace};

const AUTOCOMPLETE_URL: &str = "https://maps.googleapis.com/maps/api/place/autocomplete/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

/// Country restriction applied to every autocomplete query.
const COUNTRY: &str = "us";

/// Places provider backed by the Google Places API.
pub struct GooglePlaces {
    client: reqwest::Client,
    api_key: String,
}

impl GooglePlaces {
    /// Creates a client with the given API key.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, PlacesError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PlacesError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    predictions: Vec<RawPrediction>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    place_id: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    result: Option<RawPlaceDetails>,
}

#[derive(Debug, Deserialize)]
struct RawPlaceDetails {
    #[serde(default)]
    formatted_address: String,
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    location: RawLatLng,
}

#[derive(Debug, Deserialize)]
struct RawLatLng {
    lat: f64,
    lng: f64,
}

#[async_trait::async_trait]
impl PlacesProvider for GooglePlaces {
    async fn autocomplete(
        &self,
        query: &str,
        bias: &SearchArea,
    ) -> Result<Vec<PlaceSuggestion>, PlacesError> {
        let url = format!(
            "{AUTOCOMPLETE_URL}?input={}&location={},{}&radius={}&components=country:{COUNTRY}&key={}",
            urlencode(query),
            bias.center.latitude,
            bias.center.longitude,
            bias.radius_meters,
            self.api_key
        );

        let response: AutocompleteResponse = self.get_json(&url).await?;
        log::info!(
            "Autocomplete returned {} suggestions for {query:?}",
            response.predictions.len()
        );

        Ok(response
            .predictions
            .into_iter()
            .map(|p| PlaceSuggestion {
                place_id: p.place_id,
                description: p.description,
            })
            .collect())
    }

    async fn resolve(&self, place_id: &str) -> Result<ResolvedPlace, PlacesError> {
        let url = format!(
            "{DETAILS_URL}?place_id={}&fields=geometry,formatted_address&key={}",
            urlencode(place_id),
            self.api_key
        );

        let response: DetailsResponse = self.get_json(&url).await?;
        let Some(details) = response.result else {
            return Err(PlacesError::MissingLocation {
                place_id: place_id.to_string(),
            });
        };
        let Some(geometry) = details.geometry else {
            return Err(PlacesError::MissingLocation {
                place_id: place_id.to_string(),
            });
        };

        Ok(ResolvedPlace {
            location: Coordinate::new(geometry.location.lat, geometry.location.lng),
            description: details.formatted_address,
        })
    }
}

/// Percent-encodes the characters that break a query-string value.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            b' ' => out.push_str("%20"),
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}
