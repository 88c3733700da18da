// src/groverlong/mod.rs

//! Grover-Long amplitude amplification.
//!
//! Standard Grover search overshoots whenever the target weight λ is not one
//! of a discrete set of values. Grover-Long (G. L. Long, quant-ph/0106071)
//! replaces both π reflections with partial reflections by a phase α chosen
//! so that `g` iterations rotate the state exactly onto the target subspace.
//!
//! This module derives `g` and α from λ and composes the search operator:
//!
//! ```text
//! iteration = R · X^n · CP(α) · X^n · R† · oracle
//! oracle    = P† · kickback(α) · P
//! ```
//!
//! (read right to left) where `P` is the key-scan predicate, `R` the stage
//! rotation and `CP(α)` a phase on the ancilla controlled by every index bit.

use crate::circuits::CircuitBuilder;
use crate::core::constants::lambda::LAMBDA_MAX;
use crate::core::{Register, Result, SearchError, PI};
use crate::operations::OperatorSpec;
use log::info;

/// Rounding slack allowed on the arcsin argument of [`phase`] before it is
/// treated as out of domain.
const PHASE_ARGUMENT_TOLERANCE: f64 = 1e-12;

/// Largest iteration count held exactly by an `f64`, 2^53.
const MAX_ITERATION_COUNT: f64 = 9_007_199_254_740_992.0;

fn check_lambda(lambda: f64) -> Result<()> {
    if !(lambda > 0.0 && lambda <= LAMBDA_MAX) {
        return Err(SearchError::domain(format!(
            "lambda {} outside (0, {}]",
            lambda, LAMBDA_MAX
        )));
    }
    Ok(())
}

/// Number of Grover-Long iterations for target weight `lambda`:
/// `g = ceil(π / (4 arcsin √λ) - 1/2)`.
///
/// # Errors
/// `SearchError::Domain` unless `0 < lambda <= 0.6`, or when `lambda` is so
/// small that `g` exceeds 2^53.
pub fn iteration_count(lambda: f64) -> Result<usize> {
    check_lambda(lambda)?;
    let g = (PI / (4.0 * lambda.sqrt().asin()) - 0.5).ceil();
    if !g.is_finite() || g > MAX_ITERATION_COUNT {
        return Err(SearchError::domain(format!(
            "iteration count for lambda {:e} not representable",
            lambda
        )));
    }
    if g < 1.0 {
        return Err(SearchError::domain(format!(
            "iteration count {} for lambda {} is below 1",
            g, lambda
        )));
    }
    Ok(g as usize)
}

/// Phase angle α in radians for `g` iterations at weight `lambda`:
/// `α = 2 arcsin(sin(π / (4g + 2)) / √λ)`.
///
/// # Errors
/// `SearchError::Domain` unless `0 < lambda <= 0.6` and `g >= 1`, or when
/// the arcsin argument exceeds 1, which means `g` was not derived from
/// `lambda` by [`iteration_count`].
pub fn phase(lambda: f64, g: usize) -> Result<f64> {
    check_lambda(lambda)?;
    if g < 1 {
        return Err(SearchError::domain("iteration count in Grover-Long must be >= 1"));
    }
    let t = (PI / (4.0 * g as f64 + 2.0)).sin();
    let argument = t / lambda.sqrt();
    if argument > 1.0 + PHASE_ARGUMENT_TOLERANCE {
        return Err(SearchError::domain(format!(
            "phase argument {} > 1: g={} is inconsistent with lambda={}",
            argument, g, lambda
        )));
    }
    Ok(2.0 * argument.min(1.0).asin())
}

/// Phase `theta` on `target`, applied only when every control bit is 1 and
/// `target` starts at 0. Built as flip, phase, flip so the ancilla returns
/// to its initial value.
fn conditional_phase(controls: Vec<usize>, target: usize, theta: f64) -> OperatorSpec {
    CircuitBuilder::new()
        .add_op(OperatorSpec::controlled_flip(controls.clone(), target))
        .add_op(OperatorSpec::phase(target, theta))
        .add_op(OperatorSpec::controlled_flip(controls, target))
        .build()
}

/// Phase kickback over `index_width` flag positions plus one ancilla (local
/// position `index_width`).
///
/// Applies `phase` to the ancilla exactly when every bit in `flag_bits` is 1;
/// other basis states are unchanged. Negating `phase` yields the adjoint.
///
/// # Errors
/// `SearchError::Domain` if `flag_bits` is empty, repeats a position, or
/// names a position outside `[0, index_width)`.
pub fn build_phase_kickback(index_width: usize, flag_bits: &[usize], phase: f64) -> Result<OperatorSpec> {
    let register = Register::new(index_width)?;
    if flag_bits.is_empty() {
        return Err(SearchError::domain("phase kickback needs at least one flag bit"));
    }
    for (i, bit) in flag_bits.iter().enumerate() {
        register.check_index_bit(*bit)?;
        if flag_bits[..i].contains(bit) {
            return Err(SearchError::domain(format!("flag bit {} listed twice", bit)));
        }
    }
    Ok(conditional_phase(flag_bits.to_vec(), index_width, phase))
}

/// Oracle over the full `2n + 1` register: predicate, kickback on the
/// predicate's mirror output, then the predicate's inverse.
pub fn build_oracle(
    register: &Register,
    predicate: &OperatorSpec,
    inverse_predicate: &OperatorSpec,
    flag_bits: &[usize],
    phase: f64,
) -> Result<OperatorSpec> {
    let kickback = build_phase_kickback(register.index_width(), flag_bits, phase)?;
    Ok(CircuitBuilder::new()
        .embed(register.data_bits(), predicate.clone())?
        .embed(register.kickback_bits(), kickback)?
        .embed(register.data_bits(), inverse_predicate.clone())?
        .build())
}

/// One Grover-Long iteration: the oracle followed by the generalised
/// diffusion, a partial reflection by `phase` about the rotated reference
/// state.
pub fn build_iteration(
    register: &Register,
    oracle: &OperatorSpec,
    phase: f64,
    rotate: &OperatorSpec,
    inverse_rotate: &OperatorSpec,
) -> Result<OperatorSpec> {
    let index_bits = register.index_bits();
    let flips = || index_bits.iter().map(|i| OperatorSpec::bit_flip(*i));
    Ok(CircuitBuilder::new()
        .add_op(oracle.clone())
        .embed(index_bits.clone(), inverse_rotate.clone())?
        .add_ops(flips())
        .add_op(conditional_phase(index_bits.clone(), register.ancilla(), phase))
        .add_ops(flips())
        .embed(index_bits.clone(), rotate.clone())?
        .build())
}

/// Composite operator for one search stage, with its bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOperator {
    /// `iterations` repetitions of the Grover-Long iteration.
    pub operator: OperatorSpec,
    /// Iteration count `g`.
    pub iterations: usize,
    /// Phase angle α in radians.
    pub phase: f64,
}

impl SearchOperator {
    pub fn into_parts(self) -> (OperatorSpec, usize, f64) {
        (self.operator, self.iterations, self.phase)
    }
}

/// Builds the full search operator for one stage.
///
/// Derives `g` and α from `lambda`, builds the oracle once and repeats the
/// single iteration `g` times. `rotate` and `inverse_rotate` act on the
/// `index_width` index bits and are taken as given.
#[allow(clippy::too_many_arguments)]
pub fn build_search_operator(
    index_width: usize,
    lambda: f64,
    flag_bits: &[usize],
    predicate: &OperatorSpec,
    inverse_predicate: &OperatorSpec,
    rotate: &OperatorSpec,
    inverse_rotate: &OperatorSpec,
) -> Result<SearchOperator> {
    let register = Register::new(index_width)?;
    let iterations = iteration_count(lambda)?;
    let alpha = phase(lambda, iterations)?;
    info!("g_l = {}, phase = {:.6} pi", iterations, alpha / PI);

    let oracle = build_oracle(&register, predicate, inverse_predicate, flag_bits, alpha)?;
    let iteration = build_iteration(&register, &oracle, alpha, rotate, inverse_rotate)?;
    Ok(SearchOperator {
        operator: iteration.repeat(iterations),
        iterations,
        phase: alpha,
    })
}
