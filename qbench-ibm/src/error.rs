//! Error types for the IBM Quantum backend family
//!
//! Network and API failures stay in [`IBMError`] inside this crate and are
//! folded into [`QBenchError`] at the `Backend`/`Job` trait boundary.

use qbench_core::QBenchError;
use thiserror::Error;

/// Result type alias for IBM operations
pub type Result<T> = std::result::Result<T, IBMError>;

/// Error type for IBM Quantum operations
#[derive(Error, Debug)]
pub enum IBMError {
    // ==========================================================================
    // Credential Errors
    // ==========================================================================
    /// API token not found
    #[error("IBM Quantum API token not found. Set IBM_QUANTUM_TOKEN environment variable or provide token directly.")]
    TokenNotFound,

    /// Invalid API token
    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    // ==========================================================================
    // Network Errors
    // ==========================================================================
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded, retry after the given number of seconds
    #[error("Rate limit exceeded. Retry after {0} seconds")]
    RateLimitExceeded(u64),

    // ==========================================================================
    // API Errors
    // ==========================================================================
    /// API returned an error status
    #[error("API error ({code}): {message}")]
    ApiErrorStructured { code: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Backend not found
    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    // ==========================================================================
    // Job Errors
    // ==========================================================================
    /// Job submission failed
    #[error("Job submission failed: {0}")]
    JobSubmissionFailed(String),

    /// Job not found
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// A single circuit of a job produced no result
    #[error("Job {job_id} has no result for circuit {index}: {reason}")]
    CircuitFailed {
        job_id: String,
        index: usize,
        reason: String,
    },

    // ==========================================================================
    // Other Errors
    // ==========================================================================
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<IBMError> for QBenchError {
    fn from(err: IBMError) -> Self {
        match err {
            IBMError::CircuitFailed {
                job_id,
                index,
                reason,
            } => QBenchError::ExecutionFailed {
                job_id,
                index,
                reason,
            },
            IBMError::JobNotFound(id) => QBenchError::JobNotFound(id),
            IBMError::BackendNotFound(name) => QBenchError::UnknownBackend(name),
            IBMError::JsonError(e) => QBenchError::JsonError(e),
            IBMError::IoError(e) => QBenchError::IoError(e),
            other => QBenchError::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_failure_is_item_failure() {
        let err: QBenchError = IBMError::CircuitFailed {
            job_id: "job-7".into(),
            index: 2,
            reason: "ERROR".into(),
        }
        .into();

        assert!(err.is_item_failure());
        assert!(matches!(err, QBenchError::ExecutionFailed { index: 2, .. }));
    }

    #[test]
    fn test_conversion_keeps_lookup_failures_distinct() {
        let missing: QBenchError = IBMError::JobNotFound("job-1".into()).into();
        assert!(matches!(missing, QBenchError::JobNotFound(ref id) if id == "job-1"));

        let unknown: QBenchError = IBMError::BackendNotFound("ibm_nowhere".into()).into();
        assert!(matches!(unknown, QBenchError::UnknownBackend(_)));

        let unavailable: QBenchError = IBMError::ApiErrorStructured {
            code: 503,
            message: "maintenance".into(),
        }
        .into();
        assert!(matches!(unavailable, QBenchError::Backend(_)));
        assert!(!unavailable.is_item_failure());
    }
}
