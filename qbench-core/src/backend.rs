//! Backend abstraction
//!
//! Backends run bounded batches of circuits and hand back job handles. Each
//! backend belongs to a [`BackendFamily`]; family-specific behaviour (limits,
//! bulk job retrieval) lives in registries keyed by family rather than in the
//! backend itself.

use crate::circuit::Circuit;
use crate::error::Result;
use crate::jobs::{JobHandle, JobQuery};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Backend-specific keyword options passed through to `run`
pub type RunOptions = serde_json::Map<String, serde_json::Value>;

/// Family of backends sharing submission rules
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendFamily {
    /// In-process mock simulators
    Mock,
    /// Local Aer-style simulators
    AerSimulator,
    /// Amazon Braket devices and simulators
    Braket,
    /// IBM Quantum devices
    Ibm,
    /// Families registered by downstream crates
    Custom(String),
}

impl std::fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mock => write!(f, "mock"),
            Self::AerSimulator => write!(f, "aer_simulator"),
            Self::Braket => write!(f, "braket"),
            Self::Ibm => write!(f, "ibm"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Static configuration reported by a backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfiguration {
    /// Number of qubits
    pub num_qubits: usize,

    /// Maximum shots per circuit
    #[serde(default)]
    pub max_shots: Option<u32>,

    /// Maximum circuits per job
    #[serde(default)]
    pub max_experiments: Option<usize>,

    /// Is simulator
    #[serde(default)]
    pub simulator: bool,

    /// Free-form device summary
    #[serde(default)]
    pub summary: Option<String>,
}

/// Single calibrated property of a qubit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QubitProperty {
    /// Property name, e.g. `prob_meas1_prep0`
    pub name: String,

    /// Property value
    pub value: f64,

    /// Unit (empty for probabilities)
    #[serde(default)]
    pub unit: String,
}

/// Calibration data of a device at the time a job ran
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendProperties {
    /// Backend name
    pub backend_name: String,

    /// Per-qubit properties, indexed by physical qubit
    pub qubits: Vec<Vec<QubitProperty>>,
}

impl BackendProperties {
    /// Look up a named property of a qubit
    pub fn qubit_property(&self, qubit: usize, name: &str) -> Option<f64> {
        self.qubits
            .get(qubit)?
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value)
    }
}

/// A device or simulator able to run bounded-size jobs
///
/// Within a job, the i-th histogram must belong to the i-th submitted circuit.
pub trait Backend: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Family used for limits and retrieval dispatch
    fn family(&self) -> BackendFamily;

    /// Static configuration
    fn configuration(&self) -> BackendConfiguration;

    /// Submit circuits as a single job
    ///
    /// May block until completion (synchronous backends) or return a pending
    /// handle (asynchronous backends).
    fn run(&self, circuits: &[Circuit], shots: u32, options: &RunOptions) -> Result<JobHandle>;

    /// Retrieve a previously submitted job by id
    fn retrieve_job(&self, job_id: &str) -> Result<JobHandle>;

    /// Bulk job lookup, when the backend supports filtering jobs by id
    fn job_query(&self) -> Option<&dyn JobQuery> {
        None
    }
}

/// Resolves backend names to live backends
pub trait BackendProvider {
    /// Get a backend by name
    fn get_backend(&self, name: &str) -> Result<Arc<dyn Backend>>;
}
