pub mod benchmark;
pub mod resolve;
pub mod status;
pub mod tabulate;

use qbench_core::{
    BackendDescription, BackendProvider, ExperimentOutcome, MockProvider, QBenchError, Result,
};
use qbench_ibm::IbmProvider;
use std::io::Write;
use std::path::Path;

/// Provider serving the backend named in `description`
pub fn provider_for(description: &BackendDescription) -> Result<Box<dyn BackendProvider>> {
    match description.provider.as_str() {
        "mock" => Ok(Box::new(MockProvider::new())),
        "ibm" => Ok(Box::new(IbmProvider::from_env()?)),
        other => Err(QBenchError::UnknownBackend(format!(
            "{} (unknown provider '{}')",
            description.name, other
        ))),
    }
}

pub fn read_outcome(path: &Path) -> Result<ExperimentOutcome> {
    ExperimentOutcome::from_json(&std::fs::read_to_string(path)?)
}

/// Write `content` to `path`, or to stdout when no path is given
pub fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
