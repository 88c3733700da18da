// src/estimator/mod.rs

//! Turns measurement statistics into the next stage's inputs.
//!
//! After every stage the returned distribution is reduced to a per-bit
//! model of the key register ([`modelled_state`]), scored by its Shannon
//! entropy ([`entropy`]), and converted into the rotation that prepares the
//! modelled state ([`build_rotation_operator`]) and the target weight of the
//! next stage ([`lambda_for_stage`]).

use crate::core::constants::estimator::{MIN_WEIGHT_FACTOR, MIN_WEIGHT_PSEUDO_COUNT};
use crate::core::constants::lambda::{LAMBDA_SCHEDULE_BASE, UNIFORM_PRIOR_LAMBDA};
use crate::core::{
    outcome_count, BitAmplitude, ModelledState, QuasiDistribution, Register, Result, SearchError, PI,
};
use crate::operations::OperatorSpec;
use crate::validation::check_distribution_mass;
use log::debug;

/// Smallest weight a bit may be assigned after `shots` measurements.
///
/// A bit never seen as 1 in a finite sample is not known to be 0; the
/// binomial estimator bound `1 / (shots + 2)` scaled by an empirical factor
/// keeps it away from certainty.
pub fn min_weight(shots: u64) -> f64 {
    MIN_WEIGHT_FACTOR / (shots as f64 + MIN_WEIGHT_PSEUDO_COUNT)
}

/// Reduces a distribution to a per-bit model of the index register.
///
/// For each index bit the estimated counts `int(p * shots)` of every
/// outcome with that bit set are summed and divided by `shots`. The weight
/// is clamped to `[min_weight, 1 - min_weight]` and stored as
/// `(cos β, sin β) = (√(1 - w), √w)`.
///
/// # Errors
/// `SearchError::Domain` if `shots` is zero or `index_width` is not a
/// supported register width.
pub fn modelled_state(index_width: usize, shots: u64, distribution: &QuasiDistribution) -> Result<ModelledState> {
    let register = Register::new(index_width)?;
    if shots == 0 {
        return Err(SearchError::domain("cannot model a state from zero shots"));
    }
    check_distribution_mass(distribution);

    let mut bit_counts = vec![0i64; register.index_width()];
    for (outcome, probability) in distribution.iter() {
        let count = outcome_count(probability, shots);
        for (i, slot) in bit_counts.iter_mut().enumerate() {
            if outcome & (1 << i) != 0 {
                *slot += count;
            }
        }
    }

    let floor = min_weight(shots);
    let bits = bit_counts
        .iter()
        .map(|count| {
            let weight = (*count as f64 / shots as f64).max(floor).min(1.0 - floor);
            BitAmplitude::from_weight(weight)
        })
        .collect::<Result<Vec<_>>>()?;
    let state = ModelledState::new(bits);
    debug!("modelled state: {}", state);
    Ok(state)
}

/// Shannon entropy in bits of a modelled state: the sum over bits of
/// `-p log2 p` for `p ∈ {cos² β, sin² β}`, skipping zero terms.
pub fn entropy(state: &ModelledState) -> f64 {
    state
        .bits()
        .iter()
        .flat_map(|b| {
            let c2 = b.cos_beta() * b.cos_beta();
            let s2 = b.sin_beta() * b.sin_beta();
            [c2, s2]
        })
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.log2())
        .sum()
}

/// Rotation over the `index_width` index bits that maps `|0…0>` onto the
/// modelled state.
///
/// Without a model every bit gets a Hadamard (uniform prior). With one, bit
/// `i` gets `U(2β_i, 0, π)`, taking `|0>` to `cos β_i |0> + sin β_i |1>`.
///
/// # Errors
/// `SearchError::Domain` if the model does not have `index_width` bits.
pub fn build_rotation_operator(index_width: usize, state: Option<&ModelledState>) -> Result<OperatorSpec> {
    Register::new(index_width)?;
    match state {
        None => Ok(OperatorSpec::sequence((0..index_width).map(OperatorSpec::hadamard))),
        Some(state) if state.is_empty() => Ok(OperatorSpec::sequence((0..index_width).map(OperatorSpec::hadamard))),
        Some(state) => {
            if state.len() != index_width {
                return Err(SearchError::domain(format!(
                    "modelled state has {} bits, register has {}",
                    state.len(),
                    index_width
                )));
            }
            Ok(OperatorSpec::sequence(
                state
                    .bits()
                    .iter()
                    .enumerate()
                    .map(|(i, b)| OperatorSpec::rotation(i, 2.0 * b.beta(), 0.0, PI)),
            ))
        }
    }
}

/// Target weight for `stage` (1-based).
///
/// Stage 1 has no information and uses the fixed prior 1/2. Later stages use
/// `2^(index_width - stage - prior_entropy)`, which grows as the model
/// sharpens and as the stages advance. The value is returned unclamped; the
/// caller brings it into (0, 0.6] before deriving iteration counts.
///
/// # Errors
/// `SearchError::Domain` if `stage` is outside `1..=index_width`.
pub fn lambda_for_stage(index_width: usize, stage: usize, prior_entropy: f64) -> Result<f64> {
    if stage == 0 || stage > index_width {
        return Err(SearchError::domain(format!(
            "stage {} outside 1..={}",
            stage, index_width
        )));
    }
    if stage == 1 {
        return Ok(UNIFORM_PRIOR_LAMBDA);
    }
    Ok(LAMBDA_SCHEDULE_BASE.powf(index_width as f64 - stage as f64 - prior_entropy))
}
