//! Circuit payloads
//!
//! A minimal gate-level circuit model with OpenQASM 3.0 emission. The batching
//! engine never inspects circuits; they are built by the discrimination schemes
//! and consumed by backends.
//!
//! ## Supported Gates
//! - Single-qubit: H, X, SX, Rx, Ry, Rz, P (phase)
//! - Two-qubit: CNOT, CZ, ECR

use crate::error::{QBenchError, Result};

/// Gate types
#[derive(Debug, Clone, PartialEq)]
pub enum GateType {
    // Pauli / Clifford
    X,
    H,

    // Square root of X, native on IBM and OQC devices
    SX,

    // Rotation gates (angle in radians)
    Rx(f64),
    Ry(f64),
    Rz(f64),

    // Phase gate diag(1, e^{iλ})
    Phase(f64),

    // Two-qubit gates
    CNOT,
    CZ,

    // Echoed cross-resonance, `[control, target]`
    ECR,
}

/// A gate in the circuit
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    /// Gate type
    pub gate_type: GateType,

    /// Target qubit(s); for CNOT and ECR `[control, target]`
    pub qubits: Vec<usize>,
}

impl Gate {
    /// Create a single-qubit gate
    pub fn single(gate_type: GateType, qubit: usize) -> Self {
        Self {
            gate_type,
            qubits: vec![qubit],
        }
    }

    /// Create a two-qubit gate
    pub fn two(gate_type: GateType, control: usize, target: usize) -> Self {
        Self {
            gate_type,
            qubits: vec![control, target],
        }
    }

    /// QASM instruction for this gate
    pub fn to_qasm(&self) -> String {
        let q = &self.qubits;
        match &self.gate_type {
            GateType::X => format!("x q[{}];", q[0]),
            GateType::H => format!("h q[{}];", q[0]),
            GateType::SX => format!("sx q[{}];", q[0]),
            GateType::Rx(angle) => format!("rx({}) q[{}];", angle, q[0]),
            GateType::Ry(angle) => format!("ry({}) q[{}];", angle, q[0]),
            GateType::Rz(angle) => format!("rz({}) q[{}];", angle, q[0]),
            GateType::Phase(angle) => format!("p({}) q[{}];", angle, q[0]),
            GateType::CNOT => format!("cx q[{}], q[{}];", q[0], q[1]),
            GateType::CZ => format!("cz q[{}], q[{}];", q[0], q[1]),
            GateType::ECR => format!("ecr q[{}], q[{}];", q[0], q[1]),
        }
    }

    fn arity(&self) -> usize {
        match self.gate_type {
            GateType::CNOT | GateType::CZ | GateType::ECR => 2,
            _ => 1,
        }
    }
}

/// Circuit of gates followed by terminal measurements
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    /// Number of qubits
    pub n_qubits: usize,

    /// Gates in the circuit
    pub gates: Vec<Gate>,

    /// Measured qubits; classical bit `i` stores qubit `measured[i]`
    pub measured: Vec<usize>,
}

impl Circuit {
    /// Create a new circuit without measurements
    pub fn new(n_qubits: usize) -> Self {
        Self {
            n_qubits,
            gates: Vec::new(),
            measured: Vec::new(),
        }
    }

    /// Add a gate
    pub fn add(&mut self, gate: Gate) {
        self.gates.push(gate);
    }

    /// Append all gates of `other`, mapping its qubit `i` onto `qubits[i]`
    pub fn append(&mut self, other: &Circuit, qubits: &[usize]) {
        for gate in &other.gates {
            self.gates.push(Gate {
                gate_type: gate.gate_type.clone(),
                qubits: gate.qubits.iter().map(|&q| qubits[q]).collect(),
            });
        }
    }

    /// Measure every qubit, qubit `i` into classical bit `i`
    pub fn measure_all(&mut self) {
        self.measured = (0..self.n_qubits).collect();
    }

    /// Number of classical bits
    pub fn n_clbits(&self) -> usize {
        self.measured.len()
    }

    /// Relabel qubits: virtual qubit `i` becomes physical qubit `layout[i]`
    ///
    /// The remapped circuit spans every physical qubit up to the largest index
    /// used, idle ones included. Classical bit order is preserved.
    pub fn remap(&self, layout: &[usize]) -> Result<Circuit> {
        if layout.len() != self.n_qubits {
            return Err(QBenchError::InvalidCircuit(format!(
                "Layout has {} entries for a {}-qubit circuit",
                layout.len(),
                self.n_qubits
            )));
        }
        let mut seen = layout.to_vec();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != layout.len() {
            return Err(QBenchError::InvalidCircuit(
                "Layout maps two virtual qubits onto one physical qubit".into(),
            ));
        }

        let n_qubits = layout.iter().max().map_or(0, |&q| q + 1);
        let mut remapped = Circuit::new(n_qubits);
        remapped.append(self, layout);
        remapped.measured = self.measured.iter().map(|&q| layout[q]).collect();
        Ok(remapped)
    }

    /// Validate qubit indices and gate arities
    pub fn validate(&self) -> Result<()> {
        if self.n_qubits == 0 {
            return Err(QBenchError::InvalidCircuit("Circuit has no qubits".into()));
        }

        for gate in &self.gates {
            if gate.qubits.len() != gate.arity() {
                return Err(QBenchError::InvalidCircuit(format!(
                    "Gate {:?} expects {} qubits, got {}",
                    gate.gate_type,
                    gate.arity(),
                    gate.qubits.len()
                )));
            }
            if let Some(&qubit) = gate.qubits.iter().find(|&&q| q >= self.n_qubits) {
                return Err(QBenchError::InvalidCircuit(format!(
                    "Qubit index {} out of range (circuit has {} qubits)",
                    qubit, self.n_qubits
                )));
            }
        }

        if let Some(&qubit) = self.measured.iter().find(|&&q| q >= self.n_qubits) {
            return Err(QBenchError::InvalidCircuit(format!(
                "Measured qubit {} out of range (circuit has {} qubits)",
                qubit, self.n_qubits
            )));
        }

        Ok(())
    }

    /// Emit OpenQASM 3.0
    pub fn to_qasm(&self) -> Result<String> {
        self.validate()?;

        let mut lines = vec![
            "OPENQASM 3.0;".to_string(),
            "include \"stdgates.inc\";".to_string(),
            String::new(),
            format!("qubit[{}] q;", self.n_qubits),
        ];
        if !self.measured.is_empty() {
            lines.push(format!("bit[{}] c;", self.measured.len()));
        }
        lines.push(String::new());

        lines.extend(self.gates.iter().map(Gate::to_qasm));

        if !self.measured.is_empty() {
            lines.push(String::new());
            for (clbit, qubit) in self.measured.iter().enumerate() {
                lines.push(format!("c[{}] = measure q[{}];", clbit, qubit));
            }
        }

        Ok(lines.join("\n"))
    }
}
