//! Error taxonomy for the reconciliation engine.
//!
//! Recoverable, per-unit conditions (`NotFound`, `SourceUnavailable`,
//! `DecodeError`, `StationDataMissing`) are caught at the smallest scope and
//! turn into "no contribution" for that window or station. Configuration
//! errors (`InvalidInput`, `InvalidMode`, `UnsupportedProduct`) propagate to
//! the caller immediately.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unrecognized resolve mode '{0}', expected 'nearest', 'first', or 'next'")]
    InvalidMode(String),

    #[error("unsupported MRMS product: {0}")]
    UnsupportedProduct(String),

    #[error("no archive entry satisfies mode '{mode}' for target {target}")]
    NotFound { mode: String, target: String },

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("decode failed: {0}")]
    DecodeError(String),

    #[error("no series data for station {0}")]
    StationDataMissing(i64),
}

impl EngineError {
    /// True for conditions that skip one window or station rather than
    /// aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::NotFound { .. }
                | EngineError::SourceUnavailable(_)
                | EngineError::DecodeError(_)
                | EngineError::StationDataMissing(_)
        )
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::DecodeError(err.to_string())
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_classify_recoverable_errors() {
        assert!(EngineError::SourceUnavailable("listing failed".into()).is_recoverable());
        assert!(EngineError::StationDataMissing(4724).is_recoverable());
        assert!(!EngineError::InvalidInput("start >= end".into()).is_recoverable());
        assert!(!EngineError::UnsupportedProduct("RadarOnly_QPE_15M".into()).is_recoverable());
    }
}
