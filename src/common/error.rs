//! Common Error Types for the Staking Core
//!
//! Provides unified error handling across all modules.

use thiserror::Error;

/// Root error type for the staking core
#[derive(Debug, Error)]
pub enum StakeError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    #[error("catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),

    /// Stake record store failures
    #[error("storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    /// Redemption script construction failures
    #[error("redemption error: {0}")]
    Redemption(#[from] crate::redemption::RedemptionError),
}

impl StakeError {
    /// Whether block connection must halt instead of skipping the input
    pub fn is_consensus_fatal(&self) -> bool {
        match self {
            StakeError::Storage(e) => e.is_fatal(),
            _ => false,
        }
    }

    /// Get error code for diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            StakeError::Config(_) => "CONFIG_ERROR",
            StakeError::Logging(_) => "LOGGING_ERROR",
            StakeError::Catalog(_) => "CATALOG_ERROR",
            StakeError::Storage(_) => "STORAGE_ERROR",
            StakeError::Redemption(_) => "REDEMPTION_ERROR",
        }
    }
}

/// Result type alias using StakeError
pub type Result<T> = std::result::Result<T, StakeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redemption::RedemptionError;
    use crate::storage::StorageError;

    #[test]
    fn test_error_creation() {
        let err: StakeError = RedemptionError::InvalidTimeLock(0).into();
        assert!(err.to_string().contains("time lock"));
        assert_eq!(err.error_code(), "REDEMPTION_ERROR");
    }

    #[test]
    fn test_consensus_fatal_errors() {
        let storage: StakeError = StorageError::Database("disk I/O error".to_string()).into();
        assert!(storage.is_consensus_fatal());
        assert_eq!(storage.error_code(), "STORAGE_ERROR");

        let misuse: StakeError = StorageError::InvalidArgument("height 0".to_string()).into();
        assert!(!misuse.is_consensus_fatal());

        let rejected: StakeError = RedemptionError::InvalidTimeLock(0).into();
        assert!(!rejected.is_consensus_fatal());
    }
}
