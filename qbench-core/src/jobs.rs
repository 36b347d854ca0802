//! Job handles, retrieval and status tallies
//!
//! Provides functionality to:
//! - Describe submitted jobs and their statuses
//! - Retrieve jobs by id, one by one or in bulk depending on backend family
//! - Count job statuses before attempting resolution

use crate::backend::{Backend, BackendFamily, BackendProperties};
use crate::error::{QBenchError, Result};
use crate::histogram::Histogram;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    /// Job is being prepared
    Initializing,

    /// Job is queued
    Queued,

    /// Job is being validated
    Validating,

    /// Job is running
    Running,

    /// Job completed successfully
    Done,

    /// Job failed
    Error,

    /// Job was cancelled
    Cancelled,

    /// Unknown status
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Check if job is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error | JobStatus::Cancelled)
    }

    /// Check if job succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Done)
    }

    /// Status name as reported in tallies
    pub fn name(&self) -> &'static str {
        match self {
            JobStatus::Initializing => "INITIALIZING",
            JobStatus::Queued => "QUEUED",
            JobStatus::Validating => "VALIDATING",
            JobStatus::Running => "RUNNING",
            JobStatus::Done => "DONE",
            JobStatus::Error => "ERROR",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A submitted job
pub trait Job: Send + Sync {
    /// Job id
    fn job_id(&self) -> &str;

    /// Current status
    fn status(&self) -> Result<JobStatus>;

    /// Histogram of the `index`-th circuit submitted in this job
    ///
    /// Returns [`QBenchError::ExecutionFailed`] when that result is unavailable
    /// because execution failed.
    fn counts(&self, index: usize) -> Result<Histogram>;

    /// Calibration data of the device that ran this job, when exposed
    fn properties(&self) -> Option<BackendProperties> {
        None
    }
}

/// Shared handle to a submitted job
pub type JobHandle = Arc<dyn Job>;

/// Bulk lookup of jobs by id
///
/// Order of the returned jobs is unspecified.
pub trait JobQuery {
    /// Fetch all jobs whose id is in `job_ids`
    fn jobs_with_ids(&self, job_ids: &[String]) -> Result<Vec<JobHandle>>;
}

/// Placeholder for a job that could not be retrieved
///
/// Every result lookup fails with [`QBenchError::JobNotFound`], so resolution
/// counts its circuits as missing instead of aborting.
#[derive(Debug, Clone)]
pub struct UnavailableJob {
    id: String,
}

impl UnavailableJob {
    /// Create a placeholder for `id`
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Job for UnavailableJob {
    fn job_id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> Result<JobStatus> {
        Ok(JobStatus::Unknown)
    }

    fn counts(&self, _index: usize) -> Result<Histogram> {
        Err(QBenchError::JobNotFound(self.id.clone()))
    }
}

// ============================================================================
// Retrieval strategies
// ============================================================================

/// Strategy for turning job ids back into live handles
pub trait RetrievalStrategy: Send + Sync {
    /// Retrieve jobs; ids unknown to the backend are left out of the result
    fn retrieve(&self, backend: &dyn Backend, job_ids: &[String]) -> Result<Vec<JobHandle>>;
}

/// Requested ids with no job among `jobs`, in request order, without repeats
pub fn missing_ids(job_ids: &[String], jobs: &[JobHandle]) -> Vec<String> {
    let found: HashSet<&str> = jobs.iter().map(|job| job.job_id()).collect();
    let mut seen = HashSet::new();
    job_ids
        .iter()
        .filter(|id| !found.contains(id.as_str()) && seen.insert(id.as_str()))
        .cloned()
        .collect()
}

fn warn_missing(backend: &dyn Backend, missing: &[String]) {
    if !missing.is_empty() {
        warn!(
            "{} job(s) not found on {}: {}",
            missing.len(),
            backend.name(),
            missing.join(", ")
        );
    }
}

/// One retrieval call per job id
#[derive(Debug, Clone, Copy, Default)]
pub struct OneByOne;

impl RetrievalStrategy for OneByOne {
    fn retrieve(&self, backend: &dyn Backend, job_ids: &[String]) -> Result<Vec<JobHandle>> {
        let mut jobs = Vec::with_capacity(job_ids.len());
        let mut missing = Vec::new();
        for job_id in job_ids {
            match backend.retrieve_job(job_id) {
                Ok(job) => jobs.push(job),
                Err(QBenchError::JobNotFound(id)) => {
                    debug!("Job {} not found", id);
                    if !missing.contains(&id) {
                        missing.push(id);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        warn_missing(backend, &missing);
        Ok(jobs)
    }
}

/// Single filtered query, when the backend exposes [`JobQuery`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkQuery;

impl RetrievalStrategy for BulkQuery {
    fn retrieve(&self, backend: &dyn Backend, job_ids: &[String]) -> Result<Vec<JobHandle>> {
        match backend.job_query() {
            Some(query) => {
                let jobs = query.jobs_with_ids(job_ids)?;
                warn_missing(backend, &missing_ids(job_ids, &jobs));
                Ok(jobs)
            }
            None => {
                debug!(
                    "Backend {} has no bulk job query, retrieving one by one",
                    backend.name()
                );
                OneByOne.retrieve(backend, job_ids)
            }
        }
    }
}

/// Retrieves jobs using the strategy registered for the backend's family
pub struct JobTracker {
    strategies: HashMap<BackendFamily, Box<dyn RetrievalStrategy>>,
    fallback: Box<dyn RetrievalStrategy>,
}

impl JobTracker {
    /// Tracker retrieving every family one by one
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
            fallback: Box::new(OneByOne),
        }
    }

    /// Register (or replace) the strategy for a family
    pub fn register(&mut self, family: BackendFamily, strategy: Box<dyn RetrievalStrategy>) {
        self.strategies.insert(family, strategy);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_strategy(
        mut self,
        family: BackendFamily,
        strategy: Box<dyn RetrievalStrategy>,
    ) -> Self {
        self.register(family, strategy);
        self
    }

    /// Retrieve jobs with given ids
    ///
    /// The order of the returned jobs is not guaranteed to match `job_ids`.
    pub fn retrieve(&self, backend: &dyn Backend, job_ids: &[String]) -> Result<Vec<JobHandle>> {
        let strategy = self
            .strategies
            .get(&backend.family())
            .unwrap_or(&self.fallback);
        strategy.retrieve(backend, job_ids)
    }

    /// Retrieve jobs and index them by id
    pub fn retrieve_mapping(
        &self,
        backend: &dyn Backend,
        job_ids: &[String],
    ) -> Result<HashMap<String, JobHandle>> {
        Ok(self
            .retrieve(backend, job_ids)?
            .into_iter()
            .map(|job| (job.job_id().to_string(), job))
            .collect())
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new().with_strategy(BackendFamily::Ibm, Box::new(BulkQuery))
    }
}

/// Count occurrences of each status among `jobs`
///
/// Counts sum to `jobs.len()`.
pub fn fetch_statuses(jobs: &[JobHandle]) -> Result<BTreeMap<String, usize>> {
    let mut counts = BTreeMap::new();
    for job in jobs {
        *counts.entry(job.status()?.name().to_string()).or_insert(0) += 1;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendConfiguration, RunOptions};
    use crate::circuit::Circuit;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedJob {
        id: String,
        status: JobStatus,
    }

    impl Job for FixedJob {
        fn job_id(&self) -> &str {
            &self.id
        }

        fn status(&self) -> Result<JobStatus> {
            Ok(self.status)
        }

        fn counts(&self, _index: usize) -> Result<Histogram> {
            Ok(Histogram::new())
        }
    }

    fn job(id: &str, status: JobStatus) -> JobHandle {
        Arc::new(FixedJob {
            id: id.into(),
            status,
        })
    }

    struct CountingBackend {
        family: BackendFamily,
        single_calls: AtomicUsize,
        bulk_calls: AtomicUsize,
    }

    impl CountingBackend {
        fn new(family: BackendFamily) -> Self {
            Self {
                family,
                single_calls: AtomicUsize::new(0),
                bulk_calls: AtomicUsize::new(0),
            }
        }
    }

    impl Backend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }

        fn family(&self) -> BackendFamily {
            self.family.clone()
        }

        fn configuration(&self) -> BackendConfiguration {
            BackendConfiguration::default()
        }

        fn run(&self, _: &[Circuit], _: u32, _: &RunOptions) -> Result<JobHandle> {
            Err(QBenchError::backend("not supported"))
        }

        fn retrieve_job(&self, job_id: &str) -> Result<JobHandle> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            if job_id == "missing" {
                return Err(QBenchError::JobNotFound(job_id.into()));
            }
            Ok(job(job_id, JobStatus::Done))
        }

        fn job_query(&self) -> Option<&dyn JobQuery> {
            Some(self)
        }
    }

    impl JobQuery for CountingBackend {
        fn jobs_with_ids(&self, job_ids: &[String]) -> Result<Vec<JobHandle>> {
            self.bulk_calls.fetch_add(1, Ordering::SeqCst);
            Ok(job_ids
                .iter()
                .rev()
                .map(|id| job(id, JobStatus::Queued))
                .collect())
        }
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Done.is_success());
        assert!(!JobStatus::Error.is_success());
    }

    #[test]
    fn test_job_status_serde_names() {
        let json = serde_json::to_string(&JobStatus::Done).unwrap();
        assert_eq!(json, "\"DONE\"");
        let parsed: JobStatus = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(parsed, JobStatus::Unknown);
    }

    #[test]
    fn test_fetch_statuses_counts_sum_to_job_count() {
        let jobs = vec![
            job("a", JobStatus::Done),
            job("b", JobStatus::Done),
            job("c", JobStatus::Error),
            job("d", JobStatus::Queued),
        ];

        let counts = fetch_statuses(&jobs).unwrap();

        assert_eq!(counts["DONE"], 2);
        assert_eq!(counts["ERROR"], 1);
        assert_eq!(counts["QUEUED"], 1);
        assert_eq!(counts.values().sum::<usize>(), jobs.len());
    }

    #[test]
    fn test_fetch_statuses_of_nothing_is_empty() {
        assert!(fetch_statuses(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_default_strategy_retrieves_one_by_one() {
        let backend = CountingBackend::new(BackendFamily::Mock);
        let tracker = JobTracker::default();

        let jobs = tracker.retrieve(&backend, &ids(&["a", "b", "c"])).unwrap();

        assert_eq!(jobs.len(), 3);
        assert_eq!(backend.single_calls.load(Ordering::SeqCst), 3);
        assert_eq!(backend.bulk_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_one_by_one_skips_unknown_ids() {
        let backend = CountingBackend::new(BackendFamily::Mock);
        let jobs = OneByOne
            .retrieve(&backend, &ids(&["a", "missing", "b"]))
            .unwrap();

        let found: Vec<&str> = jobs.iter().map(|j| j.job_id()).collect();
        assert_eq!(found, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_ids_in_request_order() {
        let jobs = vec![job("b", JobStatus::Done), job("d", JobStatus::Done)];
        let missing = missing_ids(&ids(&["a", "b", "c", "a", "d"]), &jobs);

        assert_eq!(missing, ids(&["a", "c"]));
        assert!(missing_ids(&ids(&["b"]), &jobs).is_empty());
    }

    #[test]
    fn test_registered_family_uses_bulk_query() {
        let backend = CountingBackend::new(BackendFamily::Ibm);
        let tracker = JobTracker::default();

        let mapping = tracker
            .retrieve_mapping(&backend, &ids(&["a", "b", "c"]))
            .unwrap();

        assert_eq!(backend.bulk_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.single_calls.load(Ordering::SeqCst), 0);
        assert_eq!(mapping["b"].job_id(), "b");
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn test_unavailable_job_reports_not_found() {
        let job = UnavailableJob::new("gone");
        let err = job.counts(0).unwrap_err();
        assert!(err.is_item_failure());
        assert_eq!(job.status().unwrap(), JobStatus::Unknown);
    }
}
