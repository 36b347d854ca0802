//! Mock backends for testing without hardware credentials
//!
//! [`MockSimulator`] runs circuits on the in-process statevector simulator and
//! keeps every job it created, so asynchronous flows can retrieve them later.
//! [`MockProvider`] is a caller-owned registry of named mock backends.

use crate::backend::{
    Backend, BackendConfiguration, BackendFamily, BackendProperties, BackendProvider,
    QubitProperty, RunOptions,
};
use crate::circuit::Circuit;
use crate::error::{QBenchError, Result};
use crate::histogram::Histogram;
use crate::jobs::{Job, JobHandle, JobQuery, JobStatus};
use crate::mitigation::QubitMitigationInfo;
use crate::simulator::sample_counts;
use log::debug;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Number of qubits reported by mock backends
pub const MOCK_NUM_QUBITS: usize = 20;

/// Shot limit reported by mock backends
pub const MOCK_MAX_SHOTS: u32 = 100_000;

/// Readout error P(1|0) reported by calibrated mocks
pub const MOCK_PROB_MEAS1_PREP0: f64 = 0.21;

/// Readout error P(0|1) reported by calibrated mocks
pub const MOCK_PROB_MEAS0_PREP1: f64 = 0.37;

/// Job produced by a [`MockSimulator`]; results are computed at submission
#[derive(Debug, Clone)]
pub struct MockJob {
    id: String,
    status: JobStatus,
    results: Vec<std::result::Result<Histogram, String>>,
    properties: Option<BackendProperties>,
}

impl Job for MockJob {
    fn job_id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> Result<JobStatus> {
        Ok(self.status)
    }

    fn counts(&self, index: usize) -> Result<Histogram> {
        match self.results.get(index) {
            Some(Ok(histogram)) => Ok(histogram.clone()),
            Some(Err(reason)) => Err(QBenchError::ExecutionFailed {
                job_id: self.id.clone(),
                index,
                reason: reason.clone(),
            }),
            None => Err(QBenchError::backend(format!(
                "Job {} has {} results, requested index {}",
                self.id,
                self.results.len(),
                index
            ))),
        }
    }

    fn properties(&self) -> Option<BackendProperties> {
        self.properties.clone()
    }
}

/// Simulator backend with configurable failures and calibration data
pub struct MockSimulator {
    name: String,
    seed: u64,
    fail_job_indices: Vec<usize>,
    failed_items: Vec<(usize, usize)>,
    properties: Option<BackendProperties>,
    readout_error: Option<QubitMitigationInfo>,
    bulk_query: bool,
    submitted: AtomicUsize,
    jobs: Mutex<Vec<Arc<MockJob>>>,
}

impl MockSimulator {
    /// Ideal simulator
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seed: 0,
            fail_job_indices: Vec::new(),
            failed_items: Vec::new(),
            properties: None,
            readout_error: None,
            bulk_query: false,
            submitted: AtomicUsize::new(0),
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// Base seed mixed into every circuit's sampling seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Jobs submitted at these positions (0-based) fail entirely
    pub fn with_failing_jobs(mut self, indices: Vec<usize>) -> Self {
        self.fail_job_indices = indices;
        self
    }

    /// Circuit `item` of the job submitted at position `job` fails
    pub fn with_failed_item(mut self, job: usize, item: usize) -> Self {
        self.failed_items.push((job, item));
        self
    }

    /// Report readout error rates on every qubit
    pub fn with_readout_properties(mut self) -> Self {
        let qubit = vec![
            QubitProperty {
                name: "prob_meas1_prep0".into(),
                value: MOCK_PROB_MEAS1_PREP0,
                unit: String::new(),
            },
            QubitProperty {
                name: "prob_meas0_prep1".into(),
                value: MOCK_PROB_MEAS0_PREP1,
                unit: String::new(),
            },
        ];
        self.properties = Some(BackendProperties {
            backend_name: self.name.clone(),
            qubits: vec![qubit; MOCK_NUM_QUBITS],
        });
        self
    }

    /// Report readout error rates and misread measured bits at those rates
    pub fn with_readout_noise(self) -> Self {
        let mut backend = self.with_readout_properties();
        backend.readout_error = Some(QubitMitigationInfo {
            prob_meas0_prep1: MOCK_PROB_MEAS0_PREP1,
            prob_meas1_prep0: MOCK_PROB_MEAS1_PREP0,
        });
        backend
    }

    /// Expose bulk job lookup; jobs come back in reverse submission order
    pub fn with_bulk_query(mut self) -> Self {
        self.bulk_query = true;
        self
    }

    /// Number of jobs submitted so far
    pub fn job_count(&self) -> usize {
        self.jobs.lock().map_or(0, |jobs| jobs.len())
    }

    fn circuit_seed(&self, circuit: &Circuit) -> Result<u64> {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        circuit.to_qasm()?.hash(&mut hasher);
        Ok(hasher.finish())
    }

    fn lock_jobs(&self) -> Result<std::sync::MutexGuard<'_, Vec<Arc<MockJob>>>> {
        self.jobs
            .lock()
            .map_err(|_| QBenchError::backend("mock job cache poisoned"))
    }
}

impl Backend for MockSimulator {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> BackendFamily {
        BackendFamily::Mock
    }

    fn configuration(&self) -> BackendConfiguration {
        BackendConfiguration {
            num_qubits: MOCK_NUM_QUBITS,
            max_shots: Some(MOCK_MAX_SHOTS),
            max_experiments: None,
            simulator: true,
            summary: Some("mock statevector simulator".into()),
        }
    }

    fn run(&self, circuits: &[Circuit], shots: u32, _options: &RunOptions) -> Result<JobHandle> {
        let position = self.submitted.fetch_add(1, Ordering::SeqCst);
        let job_failed = self.fail_job_indices.contains(&position);

        let mut results = Vec::with_capacity(circuits.len());
        for (index, circuit) in circuits.iter().enumerate() {
            if job_failed {
                results.push(Err("Job execution failed".to_string()));
            } else if self.failed_items.contains(&(position, index)) {
                results.push(Err("Circuit execution failed".to_string()));
            } else {
                let seed = self.circuit_seed(circuit)?;
                let counts = sample_counts(circuit, shots, seed, self.readout_error.as_ref())?;
                results.push(Ok(counts));
            }
        }

        let job = Arc::new(MockJob {
            id: uuid::Uuid::new_v4().to_string(),
            status: if job_failed {
                JobStatus::Error
            } else {
                JobStatus::Done
            },
            results,
            properties: self.properties.clone(),
        });
        debug!(
            "{}: job {} ({} circuits, {} shots) -> {}",
            self.name,
            job.id,
            circuits.len(),
            shots,
            job.status
        );
        self.lock_jobs()?.push(Arc::clone(&job));
        Ok(job)
    }

    fn retrieve_job(&self, job_id: &str) -> Result<JobHandle> {
        let jobs = self.lock_jobs()?;
        jobs.iter()
            .find(|job| job.id == job_id)
            .map(|job| Arc::clone(job) as JobHandle)
            .ok_or_else(|| QBenchError::JobNotFound(job_id.to_string()))
    }

    fn job_query(&self) -> Option<&dyn JobQuery> {
        if self.bulk_query {
            Some(self)
        } else {
            None
        }
    }
}

impl JobQuery for MockSimulator {
    fn jobs_with_ids(&self, job_ids: &[String]) -> Result<Vec<JobHandle>> {
        let jobs = self.lock_jobs()?;
        Ok(jobs
            .iter()
            .rev()
            .filter(|job| job_ids.contains(&job.id))
            .map(|job| Arc::clone(job) as JobHandle)
            .collect())
    }
}

/// Registry of mock backends, owned by the caller
///
/// Built-in backends:
/// - `mock-backend`: ideal simulator
/// - `failing-mock-backend`: second and third submitted jobs fail
/// - `mock-backend-with-mitigation`: ideal simulator reporting readout errors
/// - `noisy-mock-backend`: simulator misreading bits at the reported rates
pub struct MockProvider {
    backends: BTreeMap<String, Arc<MockSimulator>>,
    extra: HashMap<String, fn() -> MockSimulator>,
}

impl MockProvider {
    pub fn new() -> Self {
        let mut provider = Self {
            backends: BTreeMap::new(),
            extra: HashMap::new(),
        };
        provider.reset();
        provider
    }

    fn builtin() -> Vec<MockSimulator> {
        vec![
            MockSimulator::new("mock-backend"),
            MockSimulator::new("failing-mock-backend").with_failing_jobs(vec![1, 2]),
            MockSimulator::new("mock-backend-with-mitigation").with_readout_properties(),
            MockSimulator::new("noisy-mock-backend").with_readout_noise(),
        ]
    }

    /// Register an extra backend, rebuilt by `factory` on every reset
    pub fn register(&mut self, factory: fn() -> MockSimulator) {
        let backend = factory();
        let name = backend.name.clone();
        self.backends.insert(name.clone(), Arc::new(backend));
        self.extra.insert(name, factory);
    }

    /// Replace every backend with a fresh instance, dropping all cached jobs
    pub fn reset(&mut self) {
        self.backends.clear();
        let fresh = Self::builtin()
            .into_iter()
            .chain(self.extra.values().map(|factory| factory()));
        for backend in fresh {
            self.backends.insert(backend.name.clone(), Arc::new(backend));
        }
    }

    /// Backends, optionally only the one called `name`
    pub fn backends(&self, name: Option<&str>) -> Vec<Arc<MockSimulator>> {
        self.backends
            .values()
            .filter(|backend| name.map_or(true, |n| backend.name == n))
            .cloned()
            .collect()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendProvider for MockProvider {
    fn get_backend(&self, name: &str) -> Result<Arc<dyn Backend>> {
        self.backends
            .get(name)
            .map(|backend| Arc::clone(backend) as Arc<dyn Backend>)
            .ok_or_else(|| QBenchError::UnknownBackend(name.to_string()))
    }
}
