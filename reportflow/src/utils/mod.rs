//! Utility functions for identifier generation and timestamp handling.

pub mod timestamps;

pub use timestamps::{format_iso8601, iso_timestamp, now_utc, sortable_timestamp, Timestamp};

use uuid::Uuid;

/// Generates a new random execution identifier.
#[must_use]
pub fn generate_execution_id() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_execution_id_is_v4() {
        let id = generate_execution_id();
        assert_eq!(id.get_version_num(), 4);
        assert_ne!(id, generate_execution_id());
    }
}
