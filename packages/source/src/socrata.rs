//! Socrata SODA API fetcher for the NYC incident feeds.
//!
//! Builds `$where`/`$limit` queries against the calls and complaints
//! datasets. Each request is capped at a fixed page size; the feeds are a
//! sample of the area, not an exhaustive dump, and nothing downstream may
//! assume completeness.

use chrono::{Duration, Utc};
use safest_geo::SearchArea;
use serde::de::DeserializeOwned;

use crate::feeds::{CallRecord, ComplaintRecord};
use crate::{FeedError, IncidentFeed};

/// 911 calls-for-service dataset endpoint.
const CALLS_API_URL: &str = "https://data.cityofnewyork.us/resource/d6zx-ckhd.json";

/// NYPD complaints (current year-to-date) dataset endpoint.
const COMPLAINTS_API_URL: &str = "https://data.cityofnewyork.us/resource/5uac-w243.json";

/// Hard per-request record ceiling imposed on both feeds.
pub const PAGE_SIZE: u64 = 5_000;

/// Lookback window applied to the complaints feed.
const COMPLAINT_LOOKBACK_DAYS: i64 = 365;

/// Incident feed backed by the NYC Socrata open-data API.
pub struct SocrataIncidentFeed {
    client: reqwest::Client,
    app_token: Option<String>,
}

impl SocrataIncidentFeed {
    /// Creates a feed client. `app_token` raises Socrata's rate limits
    /// when present but is not required.
    #[must_use]
    pub fn new(app_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            app_token,
        }
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        api_url: &str,
        where_clause: &str,
        label: &str,
    ) -> Result<Vec<T>, FeedError> {
        let url = format!("{api_url}?$where={where_clause}&$limit={PAGE_SIZE}");

        log::info!("Fetching {label} data: limit={PAGE_SIZE}");
        let mut request = self.client.get(&url);
        if let Some(token) = &self.app_token {
            request = request.header("X-App-Token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let records: Vec<T> = serde_json::from_str(&body)?;
        log::info!("Downloaded {} {label} records", records.len());
        Ok(records)
    }
}

#[async_trait::async_trait]
impl IncidentFeed for SocrataIncidentFeed {
    async fn fetch_calls(&self, area: &SearchArea) -> Result<Vec<CallRecord>, FeedError> {
        let where_clause = format!(
            "{} AND latitude IS NOT NULL",
            within_circle("location", area)
        );
        self.fetch_rows(CALLS_API_URL, &where_clause, "911 calls")
            .await
    }

    async fn fetch_complaints(&self, area: &SearchArea) -> Result<Vec<ComplaintRecord>, FeedError> {
        let since = (Utc::now() - Duration::days(COMPLAINT_LOOKBACK_DAYS))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();
        let where_clause = format!(
            "{} AND cmplnt_fr_dt > '{since}' AND latitude IS NOT NULL",
            within_circle("lat_lon", area)
        );
        self.fetch_rows(COMPLAINTS_API_URL, &where_clause, "complaint")
            .await
    }
}

/// Builds a Socrata `within_circle` predicate for a search area.
fn within_circle(location_column: &str, area: &SearchArea) -> String {
    format!(
        "within_circle({location_column}, {}, {}, {})",
        area.center.latitude, area.center.longitude, area.radius_meters
    )
}
