//! Raw record shapes for the two NYC Socrata feeds.
//!
//! Field names match the upstream datasets exactly; every field is
//! optional because the feeds routinely omit columns per record.

use serde::Deserialize;

/// Raw record from the 911 calls-for-service feed.
///
/// Dataset: <https://data.cityofnewyork.us/resource/d6zx-ckhd>
#[derive(Debug, Clone, Deserialize)]
pub struct CallRecord {
    /// CAD event id; missing ids get a generated fallback.
    #[serde(default)]
    pub cad_evnt_id: Option<String>,
    /// Final call type description.
    #[serde(default)]
    pub typ_desc: Option<String>,
    /// Radio code for the call.
    #[serde(default)]
    pub radio_code: Option<String>,
    /// When the incident happened, as reported by dispatch.
    #[serde(default)]
    pub incident_date: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
}

/// Raw record from the NYPD complaints feed.
///
/// Dataset: <https://data.cityofnewyork.us/resource/5uac-w243>
#[derive(Debug, Clone, Deserialize)]
pub struct ComplaintRecord {
    /// Complaint number.
    #[serde(default)]
    pub cmplnt_num: Option<String>,
    /// Offense description.
    #[serde(default)]
    pub ofns_desc: Option<String>,
    /// Internal police description of the offense.
    #[serde(default)]
    pub pd_desc: Option<String>,
    /// Date the complaint period started.
    #[serde(default)]
    pub cmplnt_fr_dt: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
}
