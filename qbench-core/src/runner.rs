//! Experiment runner
//!
//! Entry points used by the command line: run a set of experiments, check
//! the status of asynchronous jobs, resolve them and tabulate the results.

use crate::backend::{Backend, BackendProvider};
use crate::batching::{execute_in_batches, BatchJob};
use crate::error::{QBenchError, Result};
use crate::fourier::collect_circuits_and_keys;
use crate::jobs::{fetch_statuses, JobHandle, JobTracker, UnavailableJob};
use crate::limits::LimitsResolver;
use crate::logging::log_experiments;
use crate::models::{
    AsyncResult, BackendDescription, ExperimentOutcome, FourierExperimentSet, Metadata, SyncResult,
};
use crate::resolve::resolve_batches;
use crate::schemes::{DiscriminationScheme, NamedDistributions};
use crate::tabulate::{tabulate, Table};
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Limits and retrieval registries used by every run
#[derive(Default)]
pub struct Engine {
    pub limits: LimitsResolver,
    pub tracker: JobTracker,
    /// Draw progress bars while submitting and resolving
    pub show_progress: bool,
}

impl Engine {
    pub fn new(limits: LimitsResolver, tracker: JobTracker) -> Self {
        Self {
            limits,
            tracker,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run every circuit of `experiments` on the described backend
    ///
    /// Synchronous backends yield resolved data; asynchronous ones yield job
    /// ids to be resolved later.
    pub fn run_experiment(
        &self,
        experiments: &FourierExperimentSet,
        description: &BackendDescription,
        provider: &dyn BackendProvider,
    ) -> Result<ExperimentOutcome> {
        experiments.validate()?;
        log_experiments(experiments);

        let backend = provider.get_backend(&description.name)?;
        let limits = self.limits.get_limits(backend.as_ref())?;
        if !limits.allows_shots(experiments.num_shots) {
            return Err(QBenchError::InvalidExperiment(format!(
                "Backend {} accepts at most {} shots per circuit, requested {}",
                backend.name(),
                limits.max_shots.unwrap_or_default(),
                experiments.num_shots
            )));
        }

        let (circuits, keys) = collect_circuits_and_keys(experiments)?;
        info!(
            "Submitting {} circuits to {} (batch size: {})",
            circuits.len(),
            backend.name(),
            limits
                .max_circuits
                .map_or_else(|| "unlimited".to_string(), |n| n.to_string())
        );
        let jobs = execute_in_batches(
            backend.as_ref(),
            circuits,
            keys,
            experiments.num_shots,
            limits.max_circuits,
            &description.run_options,
            self.show_progress,
        )?;

        let metadata = Metadata {
            experiments: experiments.clone(),
            backend_description: description.clone(),
        };

        if description.asynchronous {
            info!("Submitted {} jobs", jobs.len());
            return Ok(ExperimentOutcome::Async(AsyncResult {
                metadata,
                data: jobs.iter().map(BatchJob::to_record).collect(),
            }));
        }

        info!("Executing jobs...");
        let data = resolve_batches(&jobs, self.show_progress);
        info!("Done");
        Ok(ExperimentOutcome::Sync(SyncResult { metadata, data }))
    }

    /// Backend and job ids of an asynchronous outcome
    fn backend_and_ids(
        &self,
        outcome: &AsyncResult,
        provider: &dyn BackendProvider,
    ) -> Result<(Arc<dyn Backend>, Vec<String>)> {
        let backend = provider.get_backend(&outcome.metadata.backend_description.name)?;
        let job_ids = outcome.data.iter().map(|b| b.job_id.clone()).collect();
        Ok((backend, job_ids))
    }

    /// Count statuses of the jobs of an asynchronous outcome
    pub fn fetch_statuses(
        &self,
        outcome: &ExperimentOutcome,
        provider: &dyn BackendProvider,
    ) -> Result<BTreeMap<String, usize>> {
        let outcome = outcome.as_async()?;
        let (backend, job_ids) = self.backend_and_ids(outcome, provider)?;

        info!("Fetching statuses of {} jobs", job_ids.len());
        let jobs = self.tracker.retrieve(backend.as_ref(), &job_ids)?;
        fetch_statuses(&jobs)
    }

    /// Turn an asynchronous outcome into a synchronous one
    ///
    /// Jobs the backend no longer knows count as failures of all their
    /// circuits. A job id recorded more than once resolves every record
    /// against the same job.
    pub fn resolve_results(
        &self,
        outcome: &ExperimentOutcome,
        provider: &dyn BackendProvider,
    ) -> Result<ExperimentOutcome> {
        let outcome = outcome.as_async()?;
        let (backend, job_ids) = self.backend_and_ids(outcome, provider)?;

        info!("Retrieving {} jobs", job_ids.len());
        let jobs = self.tracker.retrieve_mapping(backend.as_ref(), &job_ids)?;

        let batches: Vec<BatchJob> = outcome
            .data
            .iter()
            .map(|record| {
                let job: JobHandle = jobs.get(&record.job_id).cloned().unwrap_or_else(|| {
                    warn!("Job {} could not be retrieved", record.job_id);
                    Arc::new(UnavailableJob::new(record.job_id.clone()))
                });
                BatchJob {
                    job,
                    keys: record.keys.clone(),
                }
            })
            .collect();

        info!("Resolving results...");
        let data = resolve_batches(&batches, self.show_progress);
        Ok(ExperimentOutcome::Sync(SyncResult {
            metadata: outcome.metadata.clone(),
            data,
        }))
    }

    /// Compute discrimination probabilities of a synchronous outcome
    pub fn tabulate_results(&self, outcome: &ExperimentOutcome) -> Result<Table> {
        let outcome = outcome.as_sync()?;
        let scheme = outcome.metadata.experiments.method.scheme();

        info!("Tabulating {} results", outcome.data.len());
        tabulate(&outcome.data, &|counts: &NamedDistributions| {
            scheme.probability(counts)
        })
    }
}
