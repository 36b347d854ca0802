//! Logging setup for binaries
//!
//! Libraries only emit records through `log`; binaries call [`init`] once.

use crate::models::FourierExperimentSet;
use env_logger::{Builder, Env};
use log::{debug, info, LevelFilter};
use std::io::Write;

/// Filter used when neither a level nor `RUST_LOG` is given
pub const DEFAULT_FILTER: &str = "qbench=info";

/// Install the global logger
///
/// Records are written as `LEVEL | timestamp | target | message`. An explicit
/// `level` applies to every `qbench` crate and takes precedence over
/// `RUST_LOG`. A logger installed earlier is kept; the refusal is reported
/// through it at debug level.
pub fn init(level: Option<LevelFilter>) {
    let mut builder = match level {
        Some(level) => {
            let mut builder = Builder::new();
            builder.parse_filters(&format!("qbench={}", level));
            builder
        }
        None => Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER)),
    };

    let installed = builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} | {} | {} | {}",
                record.level(),
                buf.timestamp(),
                record.target(),
                record.args()
            )
        })
        .try_init();

    if let Err(e) = installed {
        debug!("Keeping the existing logger: {}", e);
    }
}

/// Log a summary of an experiment set before running it
pub fn log_experiments(experiments: &FourierExperimentSet) {
    let pairs: Vec<String> = experiments
        .qubits
        .iter()
        .map(|pair| format!("({}, {})", pair.target, pair.ancilla))
        .collect();
    let angles = &experiments.angles;

    info!("Method: {}", experiments.method);
    match experiments.gateset {
        Some(gateset) => info!("Gateset: {}", gateset),
        None => info!("Gateset: generic"),
    }
    info!("Qubit pairs (target, ancilla): {}", pairs.join(", "));
    info!(
        "Phi: {} steps from {} to {}",
        angles.num_steps, angles.start, angles.stop
    );
    info!("Shots per circuit: {}", experiments.num_shots);
}
