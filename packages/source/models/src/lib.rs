#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The canonical safety incident entity.
//!
//! Both public-safety feeds (911 calls for service and filed complaints)
//! normalize into [`SafetyIncident`]. Downstream consumers (the corridor
//! filter, the grid clusterer, presentation layers) only ever see this
//! shape.

use safest_geo::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which upstream feed an incident came from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentKind {
    /// 911 dispatch / call-for-service record.
    Call,
    /// Filed police complaint record.
    Complaint,
}

/// A public-safety incident normalized from a raw feed record.
///
/// `id` is unique within a single fetch only: one feed path generates
/// fallback ids for records that arrive without one, so identity must not
/// be assumed stable across fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyIncident {
    /// Source record id, or a generated fallback when the source omits one.
    pub id: String,
    /// Where the incident occurred. Records without a parseable location
    /// are dropped during normalization, never emitted at (0, 0).
    pub location: Coordinate,
    /// Offense / call-type category from the source.
    pub category: String,
    /// Secondary description from the source; may be empty.
    pub description: String,
    /// The source's timestamp string, passed through untouched.
    pub observed_at: String,
    /// Which feed produced this record.
    pub kind: IncidentKind,
}
