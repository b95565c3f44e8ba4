use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use cardwise_core::errors::ApplicationError;

pub mod campaign;
pub mod memory;
pub mod ownership;
pub mod recommendation_log;

pub use campaign::SqlCampaignRepository;
pub use memory::{InMemoryCatalog, InMemoryCardOwnership, InMemoryRecommendationLog};
pub use ownership::SqlCardOwnershipRepository;
pub use recommendation_log::SqlRecommendationLog;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{entity} {id} was not found")]
    NotFound { entity: &'static str, id: i64 },
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::Persistence(error.to_string())
    }
}

/// Timestamps are stored as fixed-width RFC 3339 (millisecond precision, `Z`)
/// so SQL string comparison orders them chronologically.
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("{column}: `{raw}` ({error})")))
}

pub(crate) fn parse_decimal(column: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw.trim())
        .map_err(|error| RepositoryError::Decode(format!("{column}: `{raw}` ({error})")))
}

pub(crate) fn decode_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{format_timestamp, parse_decimal, parse_timestamp, RepositoryError};
    use cardwise_core::errors::ApplicationError;

    #[test]
    fn timestamps_are_fixed_width_and_round_trip() {
        let value = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).single().expect("valid date");

        let stored = format_timestamp(value);

        assert_eq!(stored, "2026-06-01T12:00:00.000Z");
        assert_eq!(parse_timestamp("valid_from", &stored).expect("parse"), value);
    }

    #[test]
    fn malformed_columns_become_decode_errors() {
        assert!(matches!(parse_decimal("min_amount", "ten"), Err(RepositoryError::Decode(_))));
        assert!(matches!(
            parse_timestamp("created_at", "yesterday"),
            Err(RepositoryError::Decode(_))
        ));
    }

    #[test]
    fn repository_errors_map_to_persistence_failures() {
        let error = ApplicationError::from(RepositoryError::NotFound { entity: "campaign", id: 4 });

        assert_eq!(error, ApplicationError::Persistence("campaign 4 was not found".to_string()));
    }
}
