use thiserror::Error;

/// Outcome of a single-record lookup that found nothing.
///
/// Kept separate from load and config failures so callers can map it to a
/// not-found response instead of a generic error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("organization '{0}' not found")]
    OrganizationNotFound(String),

    #[error("infrastructure entry '{0}' not found")]
    InfraNotFound(String),
}
