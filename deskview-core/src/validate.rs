//! Target event id validation for report export.

use thiserror::Error;

use crate::domain::EventId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("target event id must be a whole number, got '{0}'")]
    NotANumber(String),

    #[error("target event id must be greater than 0, got {0}")]
    NotPositive(i64),

    #[error("target event id {candidate} is after the latest event {latest}")]
    AboveLatest { candidate: i64, latest: EventId },

    #[error("latest event id is not known yet; wait for the next refresh")]
    LatestUnknown,
}

/// The checks that need no backend: a whole number greater than zero.
pub fn parse_target(candidate: &str) -> Result<i64, ValidationError> {
    let trimmed = candidate.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::NotANumber(trimmed.to_string()))?;
    if value <= 0 {
        return Err(ValidationError::NotPositive(value));
    }
    Ok(value)
}

/// Parse and bound a user-entered target event id.
///
/// Accepts `1..=latest_known`. Both export actions go through this once per
/// submission.
pub fn validate_target_id(
    candidate: &str,
    latest_known: Option<EventId>,
) -> Result<EventId, ValidationError> {
    let value = parse_target(candidate)?;

    let latest = latest_known.ok_or(ValidationError::LatestUnknown)?;
    if value as u64 > latest.value() {
        return Err(ValidationError::AboveLatest {
            candidate: value,
            latest,
        });
    }

    Ok(EventId(value as u64))
}
