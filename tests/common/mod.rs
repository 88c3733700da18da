// tests/common/mod.rs

//! Shared test backends.
//!
//! `StateVectorBackend` is a dense state-vector interpreter for lowered
//! circuits: exact probabilities, or shots sampled with a seeded `StdRng`.
//! `ScriptedBackend` replays canned distributions and `FailingBackend`
//! fails on a chosen call.

#![allow(dead_code)]

use num_complex::Complex;
use num_traits::Zero;
use qkeyscan::operations::Gate;
use qkeyscan::{BackendError, Circuit, ExecutionBackend, OperatorSpec, QuasiDistribution};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::fmt;

pub const TEST_TOLERANCE: f64 = 1e-9;

/// Largest register the dense backend accepts.
const MAX_SIMULATED_BITS: usize = 20;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug)]
pub struct TestBackendError(pub String);

impl fmt::Display for TestBackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TestBackendError {}

/// Dense state-vector backend. Outcome bit `p` is register position `p`.
pub struct StateVectorBackend {
    rng: Option<StdRng>,
    /// Every distribution returned, in call order.
    pub history: Vec<QuasiDistribution>,
}

impl StateVectorBackend {
    /// Returns exact outcome probabilities, ignoring the shot count.
    pub fn exact() -> Self {
        Self { rng: None, history: Vec::new() }
    }

    /// Samples `shots` outcomes per call from a generator seeded with `seed`.
    pub fn sampled(seed: u64) -> Self {
        Self { rng: Some(StdRng::seed_from_u64(seed)), history: Vec::new() }
    }

    /// Final amplitudes of `circuit` applied to `|0…0>`.
    pub fn amplitudes(circuit: &Circuit) -> Result<Vec<Complex<f64>>, BackendError> {
        let width = circuit.width();
        if width > MAX_SIMULATED_BITS {
            return Err(BackendError::new(TestBackendError(format!(
                "register of {} bits exceeds simulator limit {}",
                width, MAX_SIMULATED_BITS
            ))));
        }
        let mut state = vec![Complex::zero(); 1usize << width];
        state[0] = Complex::new(1.0, 0.0);
        for gate in circuit.gates() {
            apply_gate(&mut state, gate);
        }
        Ok(state)
    }

    fn sample(rng: &mut StdRng, probabilities: &[f64], shots: u64) -> QuasiDistribution {
        let mut cumulative = Vec::with_capacity(probabilities.len());
        let mut total = 0.0;
        for p in probabilities {
            total += p;
            cumulative.push(total);
        }
        let mut counts = vec![0u64; probabilities.len()];
        for _ in 0..shots {
            let r: f64 = rng.random::<f64>() * total;
            let k = cumulative.partition_point(|c| *c <= r).min(probabilities.len() - 1);
            counts[k] += 1;
        }
        counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(k, c)| (k as u64, *c as f64 / shots as f64))
            .collect()
    }
}

/// Applies the gate's 2x2 target matrix to every amplitude pair that
/// differs only in the target bit and has every control bit set.
fn apply_gate(state: &mut [Complex<f64>], gate: &Gate) {
    let matrix = gate.target_matrix();
    let target_mask = 1usize << gate.target();
    let control_mask = gate.controls().iter().fold(0usize, |m, c| m | (1 << c));
    for i0 in 0..state.len() {
        if i0 & target_mask != 0 || i0 & control_mask != control_mask {
            continue;
        }
        let i1 = i0 | target_mask;
        let (psi_0, psi_1) = (state[i0], state[i1]);
        state[i0] = matrix[0][0] * psi_0 + matrix[0][1] * psi_1;
        state[i1] = matrix[1][0] * psi_0 + matrix[1][1] * psi_1;
    }
}

impl ExecutionBackend for StateVectorBackend {
    fn execute(
        &mut self,
        operator: &OperatorSpec,
        register_width: usize,
        shots: u64,
    ) -> Result<QuasiDistribution, BackendError> {
        let circuit = Circuit::lower(operator, register_width).map_err(BackendError::new)?;
        let probabilities: Vec<f64> = Self::amplitudes(&circuit)?.iter().map(|a| a.norm_sqr()).collect();
        let distribution = match self.rng.as_mut() {
            Some(rng) => Self::sample(rng, &probabilities, shots),
            None => probabilities
                .iter()
                .enumerate()
                .filter(|(_, p)| **p > 1e-15)
                .map(|(k, p)| (k as u64, *p))
                .collect(),
        };
        self.history.push(distribution.clone());
        Ok(distribution)
    }
}

/// Replays canned distributions in order and records what it was asked.
pub struct ScriptedBackend {
    answers: VecDeque<QuasiDistribution>,
    pub calls: Vec<(OperatorSpec, usize, u64)>,
}

impl ScriptedBackend {
    pub fn new<I: IntoIterator<Item = QuasiDistribution>>(answers: I) -> Self {
        Self { answers: answers.into_iter().collect(), calls: Vec::new() }
    }
}

impl ExecutionBackend for ScriptedBackend {
    fn execute(
        &mut self,
        operator: &OperatorSpec,
        register_width: usize,
        shots: u64,
    ) -> Result<QuasiDistribution, BackendError> {
        self.calls.push((operator.clone(), register_width, shots));
        self.answers
            .pop_front()
            .ok_or_else(|| BackendError::new(TestBackendError("script exhausted".to_string())))
    }
}

/// Succeeds with a uniform answer until call `fail_on` (0-based), then fails.
pub struct FailingBackend {
    pub fail_on: usize,
    pub calls: usize,
}

impl FailingBackend {
    pub fn new(fail_on: usize) -> Self {
        Self { fail_on, calls: 0 }
    }
}

impl ExecutionBackend for FailingBackend {
    fn execute(
        &mut self,
        _operator: &OperatorSpec,
        register_width: usize,
        _shots: u64,
    ) -> Result<QuasiDistribution, BackendError> {
        let call = self.calls;
        self.calls += 1;
        if call == self.fail_on {
            return Err(BackendError::new(TestBackendError(format!("device offline on call {}", call))));
        }
        let half_index = (register_width - 1) / 2;
        let outcomes = 1u64 << half_index;
        Ok((0..outcomes).map(|k| (k, 1.0 / outcomes as f64)).collect())
    }
}
