//! IBM Quantum job handles
//!
//! Provides functionality to:
//! - Map API job statuses onto [`JobStatus`]
//! - Wait for a job to finish and cache its per-circuit results
//! - Report every circuit of an unfinished job as failed
//! - Expose the device calibration used for readout mitigation

use crate::client::{job_not_found, IbmClient};
use crate::error::{IBMError, Result};
use crate::{MAX_WAIT_TIME, POLL_INTERVAL};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use qbench_core::{BackendProperties, Histogram, Job, JobStatus, QBenchError};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Map a status string reported by the API
///
/// Runtime and legacy spellings (`Completed`/`DONE`, `Failed`/`ERROR`) are
/// both accepted.
pub fn job_status_from_api(raw: &str) -> JobStatus {
    match raw.to_ascii_uppercase().as_str() {
        "INITIALIZING" => JobStatus::Initializing,
        "QUEUED" => JobStatus::Queued,
        "VALIDATING" => JobStatus::Validating,
        "RUNNING" => JobStatus::Running,
        "COMPLETED" | "DONE" => JobStatus::Done,
        "FAILED" | "ERROR" => JobStatus::Error,
        "CANCELLED" | "CANCELED" => JobStatus::Cancelled,
        _ => JobStatus::Unknown,
    }
}

/// Job record as returned by `/jobs` and `/jobs/{id}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JobData {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobListResponse {
    #[serde(default)]
    pub jobs: Vec<JobData>,
}

#[derive(Debug, Deserialize)]
struct JobResultResponse {
    #[serde(default)]
    results: Vec<CircuitResult>,
}

#[derive(Debug, Deserialize)]
struct CircuitResult {
    #[serde(default = "succeeded")]
    success: bool,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: ResultData,
    #[serde(default)]
    header: ResultHeader,
}

fn succeeded() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
struct ResultData {
    #[serde(default)]
    counts: HashMap<String, u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ResultHeader {
    #[serde(default)]
    memory_slots: Option<usize>,
}

/// Convert API counts into a bitstring histogram
///
/// Keys may be binary strings or hexadecimal (`0x..`); hex keys are expanded
/// to `memory_slots` bits, or to the widest key when the width is unknown.
fn normalize_counts(
    counts: &HashMap<String, u64>,
    memory_slots: Option<usize>,
) -> Result<Histogram> {
    let mut parsed = Vec::with_capacity(counts.len());
    for (key, &count) in counts {
        let value = match key.strip_prefix("0x") {
            Some(hex) => Some(u64::from_str_radix(hex, 16).map_err(|_| {
                IBMError::InvalidResponse(format!("Malformed count key '{}'", key))
            })?),
            None => None,
        };
        parsed.push((key, value, count));
    }

    let width = memory_slots.unwrap_or_else(|| {
        parsed
            .iter()
            .filter_map(|(_, value, _)| *value)
            .map(|v| (u64::BITS - v.leading_zeros()).max(1) as usize)
            .max()
            .unwrap_or(1)
    });

    let mut histogram = Histogram::new();
    for (key, value, count) in parsed {
        let bitstring = match value {
            Some(v) => format!("{:0width$b}", v, width = width),
            None => key.replace(' ', ""),
        };
        *histogram.entry(bitstring).or_insert(0) += count;
    }
    Ok(histogram)
}

/// What a job yielded once polling stopped
enum Outcome {
    Failed(String),
    Finished(Vec<CircuitResult>),
}

/// Histogram of circuit `index` of `job_id`, given the job's outcome
///
/// A failed or unfinished job fails every circuit.
fn circuit_histogram(job_id: &str, outcome: &Outcome, index: usize) -> Result<Histogram> {
    let results = match outcome {
        Outcome::Failed(reason) => {
            return Err(IBMError::CircuitFailed {
                job_id: job_id.to_string(),
                index,
                reason: reason.clone(),
            })
        }
        Outcome::Finished(results) => results,
    };

    let result = results.get(index).ok_or_else(|| {
        IBMError::InvalidResponse(format!(
            "Job {} returned {} results, circuit {} requested",
            job_id,
            results.len(),
            index
        ))
    })?;

    if !result.success {
        return Err(IBMError::CircuitFailed {
            job_id: job_id.to_string(),
            index,
            reason: result.status.clone().unwrap_or_else(|| "failed".into()),
        });
    }
    normalize_counts(&result.data.counts, result.header.memory_slots)
}

/// Handle to a job stored by IBM Quantum
pub struct IbmJob {
    id: String,
    backend: String,
    created_at: Option<DateTime<Utc>>,
    client: Arc<IbmClient>,
    outcome: Mutex<Option<Arc<Outcome>>>,
}

impl IbmJob {
    pub(crate) fn from_data(data: JobData, backend: &str, client: Arc<IbmClient>) -> Self {
        Self {
            backend: data.backend.unwrap_or_else(|| backend.to_string()),
            id: data.id,
            created_at: data.created,
            client,
            outcome: Mutex::new(None),
        }
    }

    /// Name of the device the job was submitted to
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Submission time, when reported
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn fetch_status(&self) -> Result<JobStatus> {
        let data: JobData = self
            .client
            .get(&format!("jobs/{}", self.id))
            .map_err(|e| job_not_found(e, &self.id))?;
        Ok(job_status_from_api(&data.status))
    }

    /// Poll until the job reaches a terminal state or `MAX_WAIT_TIME` passes
    ///
    /// Returns the last status seen, terminal or not.
    fn wait_for_completion(&self) -> Result<JobStatus> {
        let timeout = Duration::from_secs(MAX_WAIT_TIME);
        let start = Instant::now();

        loop {
            let status = self.fetch_status()?;
            if status.is_terminal() {
                return Ok(status);
            }
            if start.elapsed() > timeout {
                warn!(
                    "Job {} still {} after {} seconds, its circuits count as failed",
                    self.id,
                    status,
                    timeout.as_secs()
                );
                return Ok(status);
            }
            debug!("Job {} is {}, waiting", self.id, status);
            self.client.pause(Duration::from_secs(POLL_INTERVAL));
        }
    }

    fn lock_outcome(&self) -> Result<MutexGuard<'_, Option<Arc<Outcome>>>> {
        self.outcome
            .lock()
            .map_err(|_| IBMError::Other(format!("Result cache of job {} poisoned", self.id)))
    }

    /// Outcome of the job, polling for it when not cached yet
    ///
    /// The cache is not locked while polling. Terminal outcomes are cached;
    /// an unfinished job is asked again on the next call.
    fn outcome(&self) -> Result<Arc<Outcome>> {
        if let Some(outcome) = self.lock_outcome()?.as_ref() {
            return Ok(Arc::clone(outcome));
        }

        let outcome = match self.wait_for_completion()? {
            JobStatus::Done => {
                let response: JobResultResponse = self
                    .client
                    .get(&format!("jobs/{}/results", self.id))
                    .map_err(|e| job_not_found(e, &self.id))?;
                Outcome::Finished(response.results)
            }
            status if status.is_terminal() => {
                Outcome::Failed(format!("job finished with status {}", status))
            }
            status => {
                return Ok(Arc::new(Outcome::Failed(format!(
                    "job still {} when polling stopped",
                    status
                ))))
            }
        };

        let mut cached = self.lock_outcome()?;
        Ok(Arc::clone(cached.get_or_insert(Arc::new(outcome))))
    }

    fn histogram(&self, index: usize) -> Result<Histogram> {
        circuit_histogram(&self.id, &*self.outcome()?, index)
    }
}

impl Job for IbmJob {
    fn job_id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> qbench_core::Result<JobStatus> {
        Ok(self.fetch_status()?)
    }

    fn counts(&self, index: usize) -> qbench_core::Result<Histogram> {
        self.histogram(index).map_err(QBenchError::from)
    }

    fn properties(&self) -> Option<BackendProperties> {
        match self
            .client
            .get::<BackendProperties>(&format!("backends/{}/properties", self.backend))
        {
            Ok(props) => Some(props),
            Err(e) => {
                debug!("No properties for backend {}: {}", self.backend, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(&str, u64)]) -> HashMap<String, u64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_status_spellings() {
        assert_eq!(job_status_from_api("Completed"), JobStatus::Done);
        assert_eq!(job_status_from_api("DONE"), JobStatus::Done);
        assert_eq!(job_status_from_api("Failed"), JobStatus::Error);
        assert_eq!(job_status_from_api("ERROR"), JobStatus::Error);
        assert_eq!(job_status_from_api("Queued"), JobStatus::Queued);
        assert_eq!(job_status_from_api("Cancelled"), JobStatus::Cancelled);
        assert_eq!(job_status_from_api("paused?"), JobStatus::Unknown);
    }

    #[test]
    fn test_hex_counts_expand_to_memory_slots() {
        let histogram = normalize_counts(&counts(&[("0x0", 5), ("0x3", 7)]), Some(2)).unwrap();

        assert_eq!(histogram["00"], 5);
        assert_eq!(histogram["11"], 7);
    }

    #[test]
    fn test_hex_counts_without_width() {
        let histogram = normalize_counts(&counts(&[("0x1", 1), ("0x2", 2)]), None).unwrap();

        assert_eq!(histogram["01"], 1);
        assert_eq!(histogram["10"], 2);
    }

    #[test]
    fn test_binary_counts_pass_through() {
        let histogram = normalize_counts(&counts(&[("0 1", 4), ("10", 6)]), None).unwrap();

        assert_eq!(histogram["01"], 4);
        assert_eq!(histogram["10"], 6);
    }

    #[test]
    fn test_malformed_hex_key() {
        assert!(matches!(
            normalize_counts(&counts(&[("0xzz", 1)]), None),
            Err(IBMError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_result_response_parsing() {
        let json = r#"{
            "results": [
                {"success": true, "data": {"counts": {"0x1": 10}}, "header": {"memory_slots": 2}},
                {"success": false, "status": "ERROR_RUNNING_JOB"},
                {"data": {"counts": {"11": 3}}}
            ]
        }"#;
        let response: JobResultResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.results.len(), 3);
        assert!(response.results[0].success);
        assert!(!response.results[1].success);
        assert!(response.results[2].success);
        assert_eq!(response.results[0].header.memory_slots, Some(2));
    }

    fn finished(json: &str) -> Outcome {
        let response: JobResultResponse = serde_json::from_str(json).unwrap();
        Outcome::Finished(response.results)
    }

    #[test]
    fn test_unfinished_job_fails_each_circuit() {
        let outcome = Outcome::Failed("job still RUNNING when polling stopped".into());

        for index in 0..3 {
            let err: QBenchError = circuit_histogram("job-1", &outcome, index)
                .unwrap_err()
                .into();
            assert!(err.is_item_failure());
        }
    }

    #[test]
    fn test_circuit_histogram_of_finished_job() {
        let outcome = finished(
            r#"{"results": [
                {"data": {"counts": {"0x2": 9}}, "header": {"memory_slots": 2}},
                {"success": false, "status": "ERROR_RUNNING_JOB"}
            ]}"#,
        );

        assert_eq!(circuit_histogram("job-2", &outcome, 0).unwrap()["10"], 9);

        let failed: QBenchError = circuit_histogram("job-2", &outcome, 1).unwrap_err().into();
        assert!(failed.is_item_failure());

        assert!(matches!(
            circuit_histogram("job-2", &outcome, 2),
            Err(IBMError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_cached_outcome_answers_without_polling() {
        // Nothing listens on this port, so any request would fail
        let client = IbmClient::new(
            crate::credentials::Credentials::new("0123456789abcdef0123456789abcdef0123")
                .with_api_url("http://127.0.0.1:9"),
        )
        .unwrap();
        let data = JobData {
            id: "job-3".into(),
            status: "Completed".into(),
            backend: None,
            created: None,
        };
        let job = IbmJob::from_data(data, "ibm_test", Arc::new(client));
        *job.lock_outcome().unwrap() = Some(Arc::new(finished(
            r#"{"results": [{"data": {"counts": {"01": 4}}}]}"#,
        )));

        assert_eq!(job.counts(0).unwrap()["01"], 4);
        assert_eq!(job.backend(), "ibm_test");
    }

    #[test]
    fn test_job_data_parsing() {
        let json = r#"{"jobs": [{"id": "c1", "status": "Running", "backend": "ibm_kyiv",
                      "created": "2024-05-01T12:00:00Z"}, {"id": "c2"}]}"#;
        let list: JobListResponse = serde_json::from_str(json).unwrap();

        assert_eq!(list.jobs.len(), 2);
        assert_eq!(list.jobs[0].backend.as_deref(), Some("ibm_kyiv"));
        assert!(list.jobs[0].created.is_some());
        assert_eq!(job_status_from_api(&list.jobs[1].status), JobStatus::Unknown);
    }
}
