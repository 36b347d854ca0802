//! # QBench IBM: IBM Quantum Backend Family
//!
//! Runs qbench experiments on IBM Quantum devices through the REST API.
//!
//! ## Features
//!
//! - **Credentials**: Token from the environment, `.env` or the Qiskit
//!   account file
//! - **Job Submission**: One job per batch, circuits sent as OpenQASM 3
//! - **Bulk Retrieval**: A single filtered query resolves many job ids
//! - **Readout Calibration**: Device properties feed readout mitigation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use qbench_core::Engine;
//! use qbench_ibm::IbmProvider;
//!
//! let provider = IbmProvider::from_env()?;
//! let outcome = Engine::default().run_experiment(&experiments, &description, &provider)?;
//! ```

pub mod backend;
pub mod client;
pub mod credentials;
pub mod error;
pub mod jobs;
pub mod provider;

// Re-exports
pub use backend::{BackendStatus, IbmBackend};
pub use client::IbmClient;
pub use credentials::{Credentials, CredentialsManager};
pub use error::{IBMError, Result};
pub use jobs::{job_status_from_api, IbmJob};
pub use provider::IbmProvider;

/// IBM Quantum API base URL
pub const IBM_QUANTUM_API_URL: &str = "https://api.quantum.ibm.com";

/// Maximum wait time for job completion (seconds)
pub const MAX_WAIT_TIME: u64 = 3600;

/// Poll interval for job status (seconds)
pub const POLL_INTERVAL: u64 = 5;
