//! Error types for qbench
//!
//! Covers:
//! - Fatal capacity lookups (backend limits that cannot be determined)
//! - Per-item execution failures (swallowed and counted by the resolver)
//! - Caller mistakes (mode mismatch, malformed experiments, length mismatch)
//! - Serialization and IO failures

use thiserror::Error;

/// Result type alias for qbench operations
pub type Result<T> = std::result::Result<T, QBenchError>;

/// Execution mode of a set of experiments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Results were resolved while running
    Synchronous,
    /// Only job ids were recorded while running
    Asynchronous,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Synchronous => write!(f, "synchronous"),
            Self::Asynchronous => write!(f, "asynchronous"),
        }
    }
}

/// Error type for qbench operations
#[derive(Error, Debug)]
pub enum QBenchError {
    // ==========================================================================
    // Backend Errors
    // ==========================================================================
    /// No limits rule can bound submissions to this backend
    #[error("Don't know how to obtain limits for device '{backend}'")]
    CapacityUnknown { backend: String },

    /// No backend with this name is available from the provider
    #[error("Backend '{0}' not found")]
    UnknownBackend(String),

    /// Backend adapter failure (network, API, lock poisoning)
    #[error("Backend error: {0}")]
    Backend(String),

    // ==========================================================================
    // Job Errors
    // ==========================================================================
    /// Result of a single submitted circuit cannot be obtained
    #[error("Job '{job_id}' failed for circuit {index}: {reason}")]
    ExecutionFailed {
        job_id: String,
        index: usize,
        reason: String,
    },

    /// Job not found
    #[error("Job '{0}' not found")]
    JobNotFound(String),

    // ==========================================================================
    // Caller Errors
    // ==========================================================================
    /// Operation requires results produced in the other execution mode
    #[error("Expected {expected} results, got {found} results")]
    ModeMismatch {
        expected: ExecutionMode,
        found: ExecutionMode,
    },

    /// Payloads and keys differ in length
    #[error("Got {items} circuits but {keys} keys")]
    LengthMismatch { items: usize, keys: usize },

    /// Experiment description failed validation
    #[error("Invalid experiment: {0}")]
    InvalidExperiment(String),

    /// Circuit failed validation
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// Probability formula is missing one of its inputs
    #[error("Missing histogram for circuit '{0}'")]
    MissingCircuit(String),

    /// Only part of the data carries mitigation info
    #[error("Mitigation info present for {with} of {total} circuits; expected all or none")]
    InconsistentMitigation { with: usize, total: usize },

    // ==========================================================================
    // Other Errors
    // ==========================================================================
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl QBenchError {
    /// Check if error only affects the single item being resolved
    pub fn is_item_failure(&self) -> bool {
        matches!(
            self,
            QBenchError::ExecutionFailed { .. } | QBenchError::JobNotFound(_)
        )
    }

    /// Create a backend error from any displayable value
    pub fn backend(message: impl std::fmt::Display) -> Self {
        QBenchError::Backend(message.to_string())
    }
}
