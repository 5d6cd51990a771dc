//! Shared parsing utilities for raw feed records.

/// Parses lat/lng from optional string fields. Returns `None` if missing,
/// unparseable, non-finite, or zero.
///
/// The zero check matters: both feeds use `0` as a null-island sentinel
/// for ungeocoded records, and letting those through would pile phantom
/// incidents onto a single grid cell at (0, 0).
#[must_use]
pub fn parse_lat_lng_str(lat: Option<&String>, lng: Option<&String>) -> Option<(f64, f64)> {
    let lat_str = lat?.as_str();
    let lng_str = lng?.as_str();
    let latitude = lat_str.parse::<f64>().ok()?;
    let longitude = lng_str.parse::<f64>().ok()?;
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }
    Some((latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lng_strings() {
        let lat = "40.7128".to_string();
        let lng = "-74.0060".to_string();
        let (la, lo) = parse_lat_lng_str(Some(&lat), Some(&lng)).unwrap();
        assert!((la - 40.7128).abs() < f64::EPSILON);
        assert!((lo - -74.0060).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_zero_lat_lng() {
        let lat = "0.0".to_string();
        let lng = "-74.0060".to_string();
        assert!(parse_lat_lng_str(Some(&lat), Some(&lng)).is_none());
    }

    #[test]
    fn rejects_missing_lat_lng() {
        let lng = "-74.0060".to_string();
        assert!(parse_lat_lng_str(None, Some(&lng)).is_none());
    }

    #[test]
    fn rejects_unparseable_lat_lng() {
        let lat = "forty".to_string();
        let lng = "-74.0060".to_string();
        assert!(parse_lat_lng_str(Some(&lat), Some(&lng)).is_none());
    }

    #[test]
    fn rejects_non_finite_lat_lng() {
        let lat = "NaN".to_string();
        let lng = "-74.0060".to_string();
        assert!(parse_lat_lng_str(Some(&lat), Some(&lng)).is_none());
        let lat = "inf".to_string();
        assert!(parse_lat_lng_str(Some(&lat), Some(&lng)).is_none());
    }
}
