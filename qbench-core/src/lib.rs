//! # QBench Core: Discrimination Benchmarks for Quantum Backends
//!
//! Runs Fourier measurement-discrimination experiments on quantum backends
//! and turns their histograms into discrimination probabilities.
//!
//! ## Features
//!
//! - **Keyed Batching**: Split circuits into jobs that fit backend limits,
//!   keeping every circuit's key next to it
//! - **Sync and Async Execution**: Resolve results immediately or record job
//!   ids and resolve them later
//! - **Partial Failures**: A failed circuit drops only its own result
//! - **Readout Mitigation**: Mitigated histograms when the device reports
//!   readout error rates
//! - **Mock Backends**: Deterministic in-process simulators for testing
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use qbench_core::{BackendDescription, Engine, FourierExperimentSet, MockProvider};
//!
//! let experiments = FourierExperimentSet::from_json(&experiment_json)?;
//! let description = BackendDescription::from_json(&backend_json)?;
//!
//! let engine = Engine::default();
//! let outcome = engine.run_experiment(&experiments, &description, &MockProvider::new())?;
//! let table = engine.tabulate_results(&outcome)?;
//! println!("{}", table.to_csv());
//! ```

pub mod backend;
pub mod batching;
pub mod circuit;
pub mod error;
pub mod fourier;
pub mod gateset;
pub mod histogram;
pub mod jobs;
pub mod limits;
pub mod logging;
pub mod mitigation;
pub mod mock;
pub mod models;
pub mod progress;
pub mod resolve;
pub mod runner;
pub mod schemes;
pub mod simulator;
pub mod tabulate;

// Re-exports
pub use backend::{
    Backend, BackendConfiguration, BackendFamily, BackendProperties, BackendProvider, RunOptions,
};
pub use batching::{batch_circuits_with_keys, execute_in_batches, BatchJob, BatchWithKeys};
pub use circuit::{Circuit, Gate, GateType};
pub use error::{ExecutionMode, QBenchError, Result};
pub use fourier::{
    collect_circuits_and_keys, discrimination_probability_upper_bound, FourierComponents,
};
pub use gateset::Gateset;
pub use histogram::{Distribution, Histogram};
pub use jobs::{
    fetch_statuses, missing_ids, BulkQuery, Job, JobHandle, JobQuery, JobStatus, JobTracker,
    OneByOne, RetrievalStrategy,
};
pub use limits::{Limits, LimitsResolver, LimitsRule};
pub use mitigation::{MitigationInfo, QubitMitigationInfo, ReadoutMitigation};
pub use mock::{MockProvider, MockSimulator};
pub use models::{
    AnglesRange, AsyncResult, BackendDescription, BatchResult, CircuitKey, ExperimentOutcome,
    FourierExperimentSet, Method, QubitsPair, ResultForCircuit, SingleResult, SyncResult,
};
pub use resolve::{
    extract_result_from_job, resolve_batches, resolve_batches_with_stats, Resolution,
};
pub use runner::Engine;
pub use schemes::{DiscriminationScheme, NamedDistributions};
pub use tabulate::{tabulate, ProbabilityFn, Row, Table};
