//! Maps raw feed records into canonical [`SafetyIncident`]s.
//!
//! Records without a usable location are dropped, not errored: the feeds
//! are known to carry ungeocoded rows and a partial result is still
//! useful. The drop count is reported so data-quality regressions stay
//! visible.

use safest_geo::Coordinate;
use safest_source_models::{IncidentKind, SafetyIncident};
use uuid::Uuid;

use crate::feeds::{CallRecord, ComplaintRecord};
use crate::parsing::parse_lat_lng_str;

/// Result of a normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    /// Canonical incidents: calls first, then complaints, each in source
    /// order. The ordering is part of the contract so downstream indices
    /// stay deterministic across identical inputs.
    pub incidents: Vec<SafetyIncident>,
    /// Raw records dropped for missing or unusable coordinates.
    pub dropped: usize,
}

/// Normalizes both raw feeds into one incident list.
#[must_use]
pub fn normalize(calls: Vec<CallRecord>, complaints: Vec<ComplaintRecord>) -> NormalizedBatch {
    let raw_count = calls.len() + complaints.len();
    let mut incidents = Vec::with_capacity(raw_count);
    let mut dropped = 0;

    for record in calls {
        let Some((latitude, longitude)) =
            parse_lat_lng_str(record.latitude.as_ref(), record.longitude.as_ref())
        else {
            dropped += 1;
            continue;
        };

        let category = record
            .typ_desc
            .filter(|s| !s.is_empty())
            .or_else(|| record.radio_code.clone())
            .unwrap_or_default();

        incidents.push(SafetyIncident {
            id: fallback_id(record.cad_evnt_id),
            location: Coordinate::new(latitude, longitude),
            category,
            description: record.radio_code.unwrap_or_default(),
            observed_at: record.incident_date.unwrap_or_default(),
            kind: IncidentKind::Call,
        });
    }

    for record in complaints {
        let Some((latitude, longitude)) =
            parse_lat_lng_str(record.latitude.as_ref(), record.longitude.as_ref())
        else {
            dropped += 1;
            continue;
        };

        incidents.push(SafetyIncident {
            id: fallback_id(record.cmplnt_num),
            location: Coordinate::new(latitude, longitude),
            category: record.ofns_desc.unwrap_or_default(),
            description: record.pd_desc.unwrap_or_default(),
            observed_at: record.cmplnt_fr_dt.unwrap_or_default(),
            kind: IncidentKind::Complaint,
        });
    }

    if dropped > 0 {
        log::debug!("Dropped {dropped} records without usable coordinates");
    }
    log::info!(
        "Normalized {} incidents from {raw_count} raw records",
        incidents.len()
    );

    NormalizedBatch { incidents, dropped }
}

/// Uses the source id when present, otherwise generates one. Generated ids
/// are unique within this fetch only.
fn fallback_id(source_id: Option<String>) -> String {
    match source_id {
        Some(id) if !id.is_empty() => id,
        _ => Uuid::new_v4().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str, lat: &str, lng: &str) -> CallRecord {
        CallRecord {
            cad_evnt_id: Some(id.to_string()),
            typ_desc: Some("ASSAULT (IN PROGRESS)".to_string()),
            radio_code: Some("34Q1".to_string()),
            incident_date: Some("2026-07-01T22:14:00.000".to_string()),
            latitude: Some(lat.to_string()),
            longitude: Some(lng.to_string()),
        }
    }

    fn complaint(num: &str, lat: &str, lng: &str) -> ComplaintRecord {
        ComplaintRecord {
            cmplnt_num: Some(num.to_string()),
            ofns_desc: Some("HARRASSMENT 2".to_string()),
            pd_desc: Some("HARASSMENT,SUBD 3,4,5".to_string()),
            cmplnt_fr_dt: Some("2026-06-12T00:00:00.000".to_string()),
            latitude: Some(lat.to_string()),
            longitude: Some(lng.to_string()),
        }
    }

    #[test]
    fn calls_come_before_complaints_in_source_order() {
        let batch = normalize(
            vec![
                call("C1", "40.71", "-74.00"),
                call("C2", "40.72", "-74.01"),
            ],
            vec![complaint("K1", "40.73", "-74.02")],
        );
        let ids: Vec<&str> = batch.incidents.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["C1", "C2", "K1"]);
        assert_eq!(batch.dropped, 0);
    }

    #[test]
    fn maps_call_fields() {
        let batch = normalize(vec![call("C1", "40.71", "-74.00")], Vec::new());
        let incident = &batch.incidents[0];
        assert_eq!(incident.kind, IncidentKind::Call);
        assert_eq!(incident.category, "ASSAULT (IN PROGRESS)");
        assert_eq!(incident.description, "34Q1");
        assert_eq!(incident.observed_at, "2026-07-01T22:14:00.000");
    }

    #[test]
    fn call_category_falls_back_to_radio_code() {
        let mut record = call("C1", "40.71", "-74.00");
        record.typ_desc = None;
        let batch = normalize(vec![record], Vec::new());
        assert_eq!(batch.incidents[0].category, "34Q1");
    }

    #[test]
    fn call_description_empty_without_radio_code() {
        let mut record = call("C1", "40.71", "-74.00");
        record.radio_code = None;
        let batch = normalize(vec![record], Vec::new());
        assert_eq!(batch.incidents[0].description, "");
    }

    #[test]
    fn maps_complaint_fields() {
        let batch = normalize(Vec::new(), vec![complaint("K1", "40.73", "-74.02")]);
        let incident = &batch.incidents[0];
        assert_eq!(incident.kind, IncidentKind::Complaint);
        assert_eq!(incident.category, "HARRASSMENT 2");
        assert_eq!(incident.description, "HARASSMENT,SUBD 3,4,5");
    }

    #[test]
    fn drops_records_without_coordinates() {
        let mut bad_call = call("C1", "40.71", "-74.00");
        bad_call.latitude = None;
        let mut zero_complaint = complaint("K1", "0.0", "0.0");
        zero_complaint.cmplnt_num = Some("K1".to_string());

        let batch = normalize(
            vec![bad_call, call("C2", "40.72", "-74.01")],
            vec![zero_complaint],
        );
        assert_eq!(batch.incidents.len(), 1);
        assert_eq!(batch.incidents[0].id, "C2");
        assert_eq!(batch.dropped, 2);
    }

    #[test]
    fn missing_ids_get_generated_fallbacks() {
        let mut record = call("", "40.71", "-74.00");
        record.cad_evnt_id = None;
        let mut other = call("", "40.72", "-74.01");
        other.cad_evnt_id = Some(String::new());

        let batch = normalize(vec![record, other], Vec::new());
        assert_eq!(batch.incidents.len(), 2);
        assert!(!batch.incidents[0].id.is_empty());
        assert!(!batch.incidents[1].id.is_empty());
        assert_ne!(batch.incidents[0].id, batch.incidents[1].id);
    }

    #[test]
    fn identical_input_yields_identical_order() {
        let input_calls = vec![
            call("C1", "40.71", "-74.00"),
            call("C2", "40.72", "-74.01"),
        ];
        let input_complaints = vec![
            complaint("K1", "40.73", "-74.02"),
            complaint("K2", "40.74", "-74.03"),
        ];
        let first = normalize(input_calls.clone(), input_complaints.clone());
        let second = normalize(input_calls, input_complaints);
        assert_eq!(first, second);
    }
}
