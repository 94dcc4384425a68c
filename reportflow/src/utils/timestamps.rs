//! Timestamp helpers.

use chrono::{DateTime, Utc};

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Format of the timestamp suffix in manifest file names.
pub const SORTABLE_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Returns the current UTC time as an ISO 8601 formatted string.
///
/// # Examples
///
/// ```
/// use reportflow::utils::iso_timestamp;
///
/// let ts = iso_timestamp();
/// assert!(ts.contains('T'));
/// assert!(ts.ends_with("+00:00"));
/// ```
#[must_use]
pub fn iso_timestamp() -> String {
    format_iso8601(&Utc::now())
}

/// Formats a timestamp as ISO 8601 string.
#[must_use]
pub fn format_iso8601(dt: &Timestamp) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Formats a timestamp as `yyyyMMdd_HHmmss`, which sorts lexically in time
/// order.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use reportflow::utils::sortable_timestamp;
///
/// let dt = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
/// assert_eq!(sortable_timestamp(&dt), "20240307_090501");
/// ```
#[must_use]
pub fn sortable_timestamp(dt: &Timestamp) -> String {
    dt.format(SORTABLE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sortable_timestamp_orders_lexically() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 9, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert!(sortable_timestamp(&earlier) < sortable_timestamp(&later));
    }

    #[test]
    fn test_iso_timestamp_format() {
        let ts = iso_timestamp();
        assert!(ts.contains('T'));
        assert!(ts.ends_with("+00:00"));
    }
}
