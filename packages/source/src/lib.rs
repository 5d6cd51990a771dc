#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Public-safety incident feeds and normalization.
//!
//! Two NYC open-data feeds supply raw records (911 calls for service and
//! filed NYPD complaints), each with its own field names. [`IncidentFeed`]
//! abstracts the fetch so the orchestrator takes the feed as an injected
//! collaborator, and [`normalize`](normalize::normalize) maps both raw
//! shapes into the canonical [`safest_source_models::SafetyIncident`].

pub mod feeds;
pub mod normalize;
pub mod parsing;
pub mod socrata;

use async_trait::async_trait;
use safest_geo::SearchArea;

use crate::feeds::{CallRecord, ComplaintRecord};

/// Errors that can occur while fetching incident data.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed answered with a non-success status.
    #[error("incident feed returned status {status}")]
    Status {
        /// Raw HTTP status code.
        status: u16,
    },

    /// Response body was not the expected JSON shape.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An incident data provider queryable by geographic area.
///
/// Implementations are constructed explicitly and passed into whatever
/// coordinates fetches; there is no process-wide shared instance.
#[async_trait]
pub trait IncidentFeed: Send + Sync {
    /// Fetches raw 911 call-for-service records within `area`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the request or decoding fails.
    async fn fetch_calls(&self, area: &SearchArea) -> Result<Vec<CallRecord>, FeedError>;

    /// Fetches raw complaint records within `area`, limited to the
    /// trailing twelve months.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the request or decoding fails.
    async fn fetch_complaints(&self, area: &SearchArea) -> Result<Vec<ComplaintRecord>, FeedError>;
}

pub use socrata::SocrataIncidentFeed;
