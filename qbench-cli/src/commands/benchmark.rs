//! `qbench benchmark`: run a set of experiments against a backend.

use super::{provider_for, write_output};
use log::info;
use qbench_core::{BackendDescription, Engine, FourierExperimentSet, Result};
use std::path::Path;

pub fn run(
    experiment_file: &Path,
    backend_file: &Path,
    output: Option<&Path>,
    show_progress: bool,
) -> Result<()> {
    let experiments = FourierExperimentSet::from_json(&std::fs::read_to_string(experiment_file)?)?;
    let description = BackendDescription::from_json(&std::fs::read_to_string(backend_file)?)?;
    let provider = provider_for(&description)?;

    info!(
        "Running on {} backend {} ({})",
        description.provider,
        description.name,
        description.mode()
    );
    let outcome = Engine::default()
        .with_progress(show_progress)
        .run_experiment(&experiments, &description, provider.as_ref())?;

    write_output(output, &outcome.to_json()?)
}
