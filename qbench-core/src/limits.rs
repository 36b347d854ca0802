//! Backend submission limits
//!
//! Limits are resolved by rules registered per [`BackendFamily`]. Families
//! without a rule are treated as unconstrained; a rule may instead refuse with
//! [`QBenchError::CapacityUnknown`] when a real bound exists but cannot be
//! looked up.

use crate::backend::{Backend, BackendFamily};
use crate::error::{QBenchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroUsize;

/// Shot limit of Rigetti Lucy devices
pub const LUCY_MAX_SHOTS: u32 = 10_000;

/// Shot limit of Rigetti Aspen devices and Braket managed simulators
pub const ASPEN_MAX_SHOTS: u32 = 100_000;

/// Circuit limit imposed by mock backends, small enough to force batching
pub const MOCK_MAX_CIRCUITS: usize = 2;

/// Maximum number of circuits and shots (per circuit) in a single job
///
/// `None` means no limit is known or enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum circuits per job
    pub max_circuits: Option<NonZeroUsize>,

    /// Maximum shots per circuit
    pub max_shots: Option<u32>,
}

impl Limits {
    /// No limits at all
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Only a shot limit
    pub fn shots(max_shots: Option<u32>) -> Self {
        Self {
            max_circuits: None,
            max_shots,
        }
    }

    /// Set the circuit limit; zero is treated as no limit
    pub fn with_max_circuits(mut self, max_circuits: Option<usize>) -> Self {
        self.max_circuits = max_circuits.and_then(NonZeroUsize::new);
        self
    }

    /// Check whether `shots` fits the shot limit
    pub fn allows_shots(&self, shots: u32) -> bool {
        self.max_shots.map_or(true, |max| shots <= max)
    }
}

/// Rule computing limits for one backend family
pub trait LimitsRule: Send + Sync {
    /// Compute limits of `backend`
    fn limits(&self, backend: &dyn Backend) -> Result<Limits>;
}

/// Shot and circuit limits read from the backend configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigurationLimits;

impl LimitsRule for ConfigurationLimits {
    fn limits(&self, backend: &dyn Backend) -> Result<Limits> {
        let config = backend.configuration();
        Ok(Limits::shots(config.max_shots).with_max_circuits(config.max_experiments))
    }
}

/// Shot limit from configuration, circuits unbounded
#[derive(Debug, Clone, Copy, Default)]
pub struct ShotsOnlyLimits;

impl LimitsRule for ShotsOnlyLimits {
    fn limits(&self, backend: &dyn Backend) -> Result<Limits> {
        Ok(Limits::shots(backend.configuration().max_shots))
    }
}

/// Shot limit from configuration with a fixed circuit limit
#[derive(Debug, Clone, Copy)]
pub struct FixedCircuitLimits {
    max_circuits: NonZeroUsize,
}

impl FixedCircuitLimits {
    /// Create a rule capping jobs at `max_circuits`
    pub fn new(max_circuits: NonZeroUsize) -> Self {
        Self { max_circuits }
    }
}

impl LimitsRule for FixedCircuitLimits {
    fn limits(&self, backend: &dyn Backend) -> Result<Limits> {
        Ok(Limits {
            max_circuits: Some(self.max_circuits),
            max_shots: backend.configuration().max_shots,
        })
    }
}

/// Amazon Braket devices, identified by name or device summary
#[derive(Debug, Clone, Copy, Default)]
pub struct BraketLimits;

impl LimitsRule for BraketLimits {
    fn limits(&self, backend: &dyn Backend) -> Result<Limits> {
        let name = backend.name().to_lowercase();
        if name == "lucy" {
            return Ok(Limits::shots(Some(LUCY_MAX_SHOTS)));
        }
        if name.starts_with("aspen") {
            return Ok(Limits::shots(Some(ASPEN_MAX_SHOTS)));
        }
        let is_simulator = backend
            .configuration()
            .summary
            .map_or(false, |summary| summary.contains("simulator"));
        if is_simulator {
            return Ok(Limits::shots(Some(ASPEN_MAX_SHOTS)));
        }
        Err(QBenchError::CapacityUnknown {
            backend: backend.name().to_string(),
        })
    }
}

/// Resolves limits by dispatching on backend family
pub struct LimitsResolver {
    rules: HashMap<BackendFamily, Box<dyn LimitsRule>>,
}

impl LimitsResolver {
    /// Resolver without rules; every backend is unconstrained
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Resolver with rules for every built-in family
    pub fn with_default_rules() -> Self {
        let mut resolver = Self::new();
        resolver.register(BackendFamily::Ibm, Box::new(ConfigurationLimits));
        resolver.register(BackendFamily::AerSimulator, Box::new(ShotsOnlyLimits));
        resolver.register(BackendFamily::Braket, Box::new(BraketLimits));
        if let Some(max_circuits) = NonZeroUsize::new(MOCK_MAX_CIRCUITS) {
            resolver.register(
                BackendFamily::Mock,
                Box::new(FixedCircuitLimits::new(max_circuits)),
            );
        }
        resolver
    }

    /// Register (or replace) the rule for a family
    pub fn register(&mut self, family: BackendFamily, rule: Box<dyn LimitsRule>) {
        self.rules.insert(family, rule);
    }

    /// Obtain limits on circuits and shots (per circuit) in a single job
    pub fn get_limits(&self, backend: &dyn Backend) -> Result<Limits> {
        match self.rules.get(&backend.family()) {
            Some(rule) => rule.limits(backend),
            None => Ok(Limits::unbounded()),
        }
    }
}

impl Default for LimitsResolver {
    fn default() -> Self {
        Self::with_default_rules()
    }
}
