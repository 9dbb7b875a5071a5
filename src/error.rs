//! Application-level error taxonomy.
//!
//! Four categories with distinct propagation rules:
//! - NotFound / Validation: surfaced to the caller with a fixed message
//! - Upstream: absorbed into placeholders at best-effort call sites,
//!   surfaced only for the direct chat call
//! - Persistence: always surfaced (the store never swallows a failed write)

use thiserror::Error;

use crate::llm::LlmError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("DEM not found.")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Upstream call failed: {0}")]
    Upstream(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound,
            StoreError::Validation(msg) => AppError::Validation(msg),
            StoreError::Io(e) => AppError::Persistence(e.to_string()),
            StoreError::Parse(e) => AppError::Persistence(e.to_string()),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let err: AppError = StoreError::NotFound.into();
        assert!(matches!(err, AppError::NotFound));
        assert_eq!(err.to_string(), "DEM not found.");
    }

    #[test]
    fn test_validation_keeps_message() {
        let err: AppError = StoreError::Validation("Note text is required.".into()).into();
        assert_eq!(err.to_string(), "Note text is required.");
    }
}
