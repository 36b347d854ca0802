//! IBM Quantum devices as qbench backends
//!
//! Provides functionality to:
//! - List devices and turn them into [`BackendConfiguration`]s
//! - Submit circuits as OpenQASM 3 programs, one job per batch
//! - Retrieve jobs by id, one by one or with a single filtered query

use crate::client::{job_not_found, IbmClient};
use crate::error::{IBMError, Result};
use crate::jobs::{IbmJob, JobData, JobListResponse};
use log::debug;
use qbench_core::{
    Backend, BackendConfiguration, BackendFamily, Circuit, JobHandle, JobQuery, QBenchError,
    RunOptions,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Backend status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendStatus {
    /// Backend is online and accepting jobs
    Online,

    /// Backend is offline for maintenance
    Offline,

    /// Backend is paused
    Paused,

    /// Backend status is unknown
    #[default]
    Unknown,
}

impl BackendStatus {
    fn from_api(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            Some("online") | Some("active") => BackendStatus::Online,
            Some("offline") => BackendStatus::Offline,
            Some("paused") => BackendStatus::Paused,
            _ => BackendStatus::Unknown,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BackendResponse {
    #[serde(default)]
    pub backends: Vec<BackendData>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BackendData {
    pub name: String,
    #[serde(default)]
    n_qubits: Option<usize>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    simulator: Option<bool>,
    #[serde(default)]
    max_shots: Option<u32>,
    #[serde(default)]
    max_experiments: Option<usize>,
    #[serde(default)]
    description: Option<String>,
}

impl BackendData {
    pub fn status(&self) -> BackendStatus {
        BackendStatus::from_api(self.status.as_deref())
    }

    pub fn configuration(&self) -> BackendConfiguration {
        BackendConfiguration {
            num_qubits: self.n_qubits.unwrap_or(0),
            max_shots: self.max_shots,
            max_experiments: self.max_experiments,
            simulator: self.simulator.unwrap_or(false),
            summary: self.description.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct JobSubmitRequest<'a> {
    backend: &'a str,
    shots: u32,
    circuits: Vec<String>,
    #[serde(skip_serializing_if = "no_options")]
    options: &'a RunOptions,
}

fn no_options(options: &&RunOptions) -> bool {
    options.is_empty()
}

/// An IBM Quantum device
pub struct IbmBackend {
    name: String,
    status: BackendStatus,
    configuration: BackendConfiguration,
    client: Arc<IbmClient>,
}

impl IbmBackend {
    pub(crate) fn from_data(data: &BackendData, client: Arc<IbmClient>) -> Self {
        Self {
            name: data.name.clone(),
            status: data.status(),
            configuration: data.configuration(),
            client,
        }
    }

    /// Status reported when the device was listed
    pub fn status(&self) -> BackendStatus {
        self.status
    }

    fn submit(&self, circuits: &[Circuit], shots: u32, options: &RunOptions) -> Result<IbmJob> {
        let programs = circuits
            .iter()
            .map(Circuit::to_qasm)
            .collect::<qbench_core::Result<Vec<_>>>()
            .map_err(|e| IBMError::JobSubmissionFailed(e.to_string()))?;

        let request = JobSubmitRequest {
            backend: &self.name,
            shots,
            circuits: programs,
            options,
        };
        let data: JobData = self.client.post("jobs", &request).map_err(|e| match e {
            IBMError::ApiErrorStructured { code, message } => {
                IBMError::JobSubmissionFailed(format!("HTTP {}: {}", code, message))
            }
            other => other,
        })?;

        debug!("Job {} submitted to {}", data.id, self.name);
        Ok(IbmJob::from_data(data, &self.name, Arc::clone(&self.client)))
    }

    fn fetch_job(&self, job_id: &str) -> Result<IbmJob> {
        let data: JobData = self
            .client
            .get(&format!("jobs/{}", job_id))
            .map_err(|e| job_not_found(e, job_id))?;
        let job = IbmJob::from_data(data, &self.name, Arc::clone(&self.client));
        if let Some(created) = job.created_at() {
            debug!("Retrieved job {} created {}", job_id, created);
        }
        Ok(job)
    }

    fn query_jobs(&self, job_ids: &[String]) -> Result<Vec<IbmJob>> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }
        let limit = job_ids.len().to_string();
        let query = [("ids", job_ids.join(",")), ("limit", limit)];
        let response: JobListResponse = self.client.get_with_query("jobs", &query)?;

        Ok(response
            .jobs
            .into_iter()
            .filter(|data| job_ids.contains(&data.id))
            .map(|data| IbmJob::from_data(data, &self.name, Arc::clone(&self.client)))
            .collect())
    }
}

impl Backend for IbmBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> BackendFamily {
        BackendFamily::Ibm
    }

    fn configuration(&self) -> BackendConfiguration {
        self.configuration.clone()
    }

    fn run(
        &self,
        circuits: &[Circuit],
        shots: u32,
        options: &RunOptions,
    ) -> qbench_core::Result<JobHandle> {
        let job = self.submit(circuits, shots, options)?;
        Ok(Arc::new(job))
    }

    fn retrieve_job(&self, job_id: &str) -> qbench_core::Result<JobHandle> {
        let job = self.fetch_job(job_id)?;
        Ok(Arc::new(job))
    }

    fn job_query(&self) -> Option<&dyn JobQuery> {
        Some(self)
    }
}

impl JobQuery for IbmBackend {
    fn jobs_with_ids(&self, job_ids: &[String]) -> qbench_core::Result<Vec<JobHandle>> {
        let jobs = self.query_jobs(job_ids).map_err(QBenchError::from)?;
        Ok(jobs
            .into_iter()
            .map(|job| Arc::new(job) as JobHandle)
            .collect())
    }
}
