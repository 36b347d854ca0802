//! Serializable models
//!
//! Experiment and backend descriptions (inputs) and the records produced by
//! synchronous and asynchronous runs (outputs).

use crate::backend::RunOptions;
use crate::error::{ExecutionMode, QBenchError, Result};
use crate::gateset::Gateset;
use crate::histogram::{Distribution, Histogram};
use crate::mitigation::MitigationInfo;
use serde::{Deserialize, Serialize};

// =============================================================================
// Keys
// =============================================================================

/// Role of a single circuit within an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitKey {
    /// Target qubit
    pub target: usize,
    /// Ancilla qubit
    pub ancilla: usize,
    /// Circuit variant, e.g. `u_v0`
    pub name: String,
    /// Fourier angle
    pub phi: f64,
}

impl CircuitKey {
    /// Create a key
    pub fn new(target: usize, ancilla: usize, name: impl Into<String>, phi: f64) -> Self {
        Self {
            target,
            ancilla,
            name: name.into(),
            phi,
        }
    }

    /// Identity of the experiment this circuit belongs to
    pub fn label(&self) -> ExperimentLabel {
        ExperimentLabel {
            target: self.target,
            ancilla: self.ancilla,
            phi: self.phi,
        }
    }
}

/// `(target, ancilla, phi)` identity shared by all circuit variants
#[derive(Debug, Clone, Copy)]
pub struct ExperimentLabel {
    pub target: usize,
    pub ancilla: usize,
    pub phi: f64,
}

impl ExperimentLabel {
    /// Bitwise identity, so labels can be hashed
    fn bits(&self) -> (usize, usize, u64) {
        (self.target, self.ancilla, self.phi.to_bits())
    }
}

impl PartialEq for ExperimentLabel {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for ExperimentLabel {}

impl std::hash::Hash for ExperimentLabel {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

// =============================================================================
// Experiment description
// =============================================================================

/// Pair of qubits used in a single experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QubitsPair {
    pub target: usize,
    pub ancilla: usize,
}

/// Evenly spaced range of angles, endpoints included
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnglesRange {
    pub start: f64,
    pub stop: f64,
    pub num_steps: usize,
}

impl AnglesRange {
    /// Check range consistency
    pub fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || !self.stop.is_finite() {
            return Err(QBenchError::InvalidExperiment(
                "Angles must be finite".into(),
            ));
        }
        if self.num_steps == 0 {
            return Err(QBenchError::InvalidExperiment(
                "Number of steps must be positive".into(),
            ));
        }
        if self.start > self.stop {
            return Err(QBenchError::InvalidExperiment(
                "Start cannot be larger than stop".into(),
            ));
        }
        if self.start == self.stop && self.num_steps != 1 {
            return Err(QBenchError::InvalidExperiment(
                "There can be only one step if start equals stop".into(),
            ));
        }
        Ok(())
    }

    /// Angles of the range, `num_steps` of them
    pub fn values(&self) -> Vec<f64> {
        if self.num_steps == 1 {
            return vec![self.start];
        }
        let step = (self.stop - self.start) / (self.num_steps - 1) as f64;
        (0..self.num_steps)
            .map(|i| {
                if i == self.num_steps - 1 {
                    self.stop
                } else {
                    self.start + step * i as f64
                }
            })
            .collect()
    }
}

/// Scheme used to estimate discrimination probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Four circuits, ancilla outcome used for postselection
    Postselection,
    /// Two circuits using the direct sum V0† ⊕ V1†
    DirectSum,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postselection => write!(f, "postselection"),
            Self::DirectSum => write!(f, "direct_sum"),
        }
    }
}

/// Experiment type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentKind {
    #[serde(rename = "discrimination-fourier")]
    DiscriminationFourier,
}

/// Set of Fourier discrimination experiments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FourierExperimentSet {
    #[serde(rename = "type")]
    pub kind: ExperimentKind,
    pub qubits: Vec<QubitsPair>,
    pub angles: AnglesRange,
    pub method: Method,
    pub num_shots: u32,
    /// Native gateset for the components, generic gates when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateset: Option<Gateset>,
}

impl FourierExperimentSet {
    /// Parse and validate from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let experiments: Self = serde_json::from_str(json)?;
        experiments.validate()?;
        Ok(experiments)
    }

    /// Check the experiment set
    pub fn validate(&self) -> Result<()> {
        self.angles.validate()?;

        if self.num_shots == 0 {
            return Err(QBenchError::InvalidExperiment(
                "Number of shots must be positive".into(),
            ));
        }

        for (i, pair) in self.qubits.iter().enumerate() {
            if pair.target == pair.ancilla {
                return Err(QBenchError::InvalidExperiment(
                    "Target and ancilla need to have different indices".into(),
                ));
            }
            if self.qubits[..i].contains(pair) {
                return Err(QBenchError::InvalidExperiment(
                    "All pairs of qubits should be distinct".into(),
                ));
            }
        }

        Ok(())
    }

    /// Enumerate `(target, ancilla, phi)` for every pair and angle
    pub fn enumerate_experiment_labels(&self) -> Vec<ExperimentLabel> {
        let angles = self.angles.values();
        self.qubits
            .iter()
            .flat_map(|pair| {
                angles.iter().map(move |&phi| ExperimentLabel {
                    target: pair.target,
                    ancilla: pair.ancilla,
                    phi,
                })
            })
            .collect()
    }
}

// =============================================================================
// Backend description
// =============================================================================

/// Where and how to run experiments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendDescription {
    /// Provider key, e.g. `mock` or `ibm`
    pub provider: String,

    /// Backend name within the provider
    pub name: String,

    /// Options passed through to every job submission
    #[serde(default)]
    pub run_options: RunOptions,

    /// Record job ids instead of waiting for results
    #[serde(default)]
    pub asynchronous: bool,
}

impl BackendDescription {
    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Execution mode selected by this description
    pub fn mode(&self) -> ExecutionMode {
        if self.asynchronous {
            ExecutionMode::Asynchronous
        } else {
            ExecutionMode::Synchronous
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Result of a single circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultForCircuit {
    pub name: String,
    pub histogram: Histogram,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation_info: Option<MitigationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigated_histogram: Option<Distribution>,
}

/// Results of all circuit variants sharing `(target, ancilla, phi)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleResult {
    pub target: usize,
    pub ancilla: usize,
    pub phi: f64,
    pub results_per_circuit: Vec<ResultForCircuit>,
}

/// Submitted job and the keys of its circuits, in submission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub job_id: String,
    pub keys: Vec<CircuitKey>,
}

/// Inputs a run was started with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub experiments: FourierExperimentSet,
    pub backend_description: BackendDescription,
}

/// Fully resolved data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub metadata: Metadata,
    pub data: Vec<SingleResult>,
}

/// Job ids awaiting resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncResult {
    pub metadata: Metadata,
    pub data: Vec<BatchResult>,
}

/// Output of running a set of experiments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExperimentOutcome {
    Sync(SyncResult),
    Async(AsyncResult),
}

impl ExperimentOutcome {
    /// Execution mode that produced this outcome
    pub fn mode(&self) -> ExecutionMode {
        match self {
            Self::Sync(_) => ExecutionMode::Synchronous,
            Self::Async(_) => ExecutionMode::Asynchronous,
        }
    }

    /// Metadata of the run
    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::Sync(result) => &result.metadata,
            Self::Async(result) => &result.metadata,
        }
    }

    /// Borrow as asynchronous data, failing on synchronous data
    pub fn as_async(&self) -> Result<&AsyncResult> {
        match self {
            Self::Async(result) => Ok(result),
            Self::Sync(_) => Err(QBenchError::ModeMismatch {
                expected: ExecutionMode::Asynchronous,
                found: ExecutionMode::Synchronous,
            }),
        }
    }

    /// Borrow as synchronous data, failing on asynchronous data
    pub fn as_sync(&self) -> Result<&SyncResult> {
        match self {
            Self::Sync(result) => Ok(result),
            Self::Async(_) => Err(QBenchError::ModeMismatch {
                expected: ExecutionMode::Synchronous,
                found: ExecutionMode::Asynchronous,
            }),
        }
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment_json(qubits: &str, angles: &str) -> String {
        format!(
            r#"{{
                "type": "discrimination-fourier",
                "qubits": {},
                "angles": {},
                "method": "postselection",
                "num_shots": 100
            }}"#,
            qubits, angles
        )
    }

    #[test]
    fn test_parse_valid_experiment() {
        let json = experiment_json(
            r#"[{"target": 0, "ancilla": 1}, {"target": 2, "ancilla": 5}]"#,
            r#"{"start": 0, "stop": 2, "num_steps": 3}"#,
        );
        let experiments = FourierExperimentSet::from_json(&json).unwrap();

        assert_eq!(experiments.method, Method::Postselection);
        assert_eq!(experiments.qubits.len(), 2);
        assert_eq!(experiments.enumerate_experiment_labels().len(), 6);
    }

    #[test]
    fn test_duplicate_pairs_rejected() {
        let json = experiment_json(
            r#"[{"target": 0, "ancilla": 1}, {"target": 0, "ancilla": 1}]"#,
            r#"{"start": 0, "stop": 2, "num_steps": 3}"#,
        );
        assert!(matches!(
            FourierExperimentSet::from_json(&json),
            Err(QBenchError::InvalidExperiment(_))
        ));
    }

    #[test]
    fn test_equal_target_and_ancilla_rejected() {
        let json = experiment_json(
            r#"[{"target": 3, "ancilla": 3}]"#,
            r#"{"start": 0, "stop": 2, "num_steps": 3}"#,
        );
        assert!(FourierExperimentSet::from_json(&json).is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{
            "type": "discrimination-fourier",
            "qubits": [],
            "angles": {"start": 0, "stop": 1, "num_steps": 2},
            "method": "direct_sum",
            "num_shots": 10,
            "device": "lucy"
        }"#;
        assert!(FourierExperimentSet::from_json(json).is_err());
    }

    #[test]
    fn test_gateset_is_optional() {
        let json = experiment_json(
            r#"[{"target": 0, "ancilla": 1}]"#,
            r#"{"start": 0, "stop": 2, "num_steps": 3}"#,
        );
        let generic = FourierExperimentSet::from_json(&json).unwrap();
        assert_eq!(generic.gateset, None);
        assert!(!serde_json::to_string(&generic).unwrap().contains("gateset"));

        let native = json.replace(
            r#""num_shots": 100"#,
            r#""num_shots": 100, "gateset": "rigetti""#,
        );
        let native = FourierExperimentSet::from_json(&native).unwrap();
        assert_eq!(native.gateset, Some(Gateset::Rigetti));

        let unknown = json.replace(
            r#""num_shots": 100"#,
            r#""num_shots": 100, "gateset": "aspen""#,
        );
        assert!(FourierExperimentSet::from_json(&unknown).is_err());
    }

    #[test]
    fn test_angles_validation() {
        let reversed = AnglesRange {
            start: 2.0,
            stop: 1.0,
            num_steps: 3,
        };
        assert!(reversed.validate().is_err());

        let degenerate = AnglesRange {
            start: 1.0,
            stop: 1.0,
            num_steps: 2,
        };
        assert!(degenerate.validate().is_err());

        let single = AnglesRange {
            start: 1.0,
            stop: 1.0,
            num_steps: 1,
        };
        assert!(single.validate().is_ok());
        assert_eq!(single.values(), vec![1.0]);
    }

    #[test]
    fn test_angles_include_endpoints() {
        let range = AnglesRange {
            start: 0.0,
            stop: 2.0,
            num_steps: 5,
        };
        assert_eq!(range.values(), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_backend_description_defaults() {
        let desc = BackendDescription::from_json(r#"{"provider": "mock", "name": "mock-backend"}"#)
            .unwrap();
        assert!(!desc.asynchronous);
        assert!(desc.run_options.is_empty());
        assert_eq!(desc.mode(), ExecutionMode::Synchronous);
    }

    #[test]
    fn test_outcome_mode_accessors() {
        let json = experiment_json(
            r#"[{"target": 0, "ancilla": 1}]"#,
            r#"{"start": 0, "stop": 1, "num_steps": 2}"#,
        );
        let metadata = Metadata {
            experiments: FourierExperimentSet::from_json(&json).unwrap(),
            backend_description: BackendDescription {
                provider: "mock".into(),
                name: "mock-backend".into(),
                run_options: RunOptions::new(),
                asynchronous: true,
            },
        };
        let outcome = ExperimentOutcome::Async(AsyncResult {
            metadata,
            data: vec![BatchResult {
                job_id: "job-1".into(),
                keys: vec![CircuitKey::new(0, 1, "u_v0", 0.0)],
            }],
        });

        assert!(outcome.as_async().is_ok());
        assert!(matches!(
            outcome.as_sync(),
            Err(QBenchError::ModeMismatch { .. })
        ));

        let parsed = ExperimentOutcome::from_json(&outcome.to_json().unwrap()).unwrap();
        assert_eq!(parsed, outcome);
    }
}
