// src/validation/mod.rs

//! Checks applied at the seams between stages.
//!
//! Returned distributions are inspected but never corrected; scheduled
//! weights are brought into the Grover-Long domain; modelled states are
//! checked against their invariants before they seed a rotation.

use crate::core::constants::estimator::MASS_WARN_TOLERANCE;
use crate::core::constants::lambda::LAMBDA_MAX;
use crate::core::{ModelledState, QuasiDistribution, Result, SearchError};
use log::warn;

const DEFAULT_NORM_TOLERANCE: f64 = 1e-9;

/// Returns the total probability mass of `distribution`, logging a warning
/// when it strays from 1 by more than the estimator's tolerance.
///
/// The distribution is left as is: estimator noise is part of the data.
pub fn check_distribution_mass(distribution: &QuasiDistribution) -> f64 {
    let mass = distribution.total_mass();
    if (mass - 1.0).abs() > MASS_WARN_TOLERANCE {
        warn!(
            "distribution mass {:.4} deviates from 1 over {} outcomes; using values as returned",
            mass,
            distribution.len()
        );
    }
    mass
}

/// Brings a scheduled weight into (0, 0.6].
///
/// Values above the bound are clamped to it. A non-positive or non-finite
/// weight cannot come out of a correct schedule and is reported instead.
///
/// # Errors
/// `SearchError::Domain` if `lambda` is not a positive number.
pub fn clamp_lambda(lambda: f64) -> Result<f64> {
    if lambda.is_nan() || lambda <= 0.0 {
        return Err(SearchError::domain(format!(
            "scheduled lambda {} is not positive; schedule is broken",
            lambda
        )));
    }
    if lambda > LAMBDA_MAX {
        warn!("scheduled lambda {:.6} clamped to {}", lambda, LAMBDA_MAX);
        return Ok(LAMBDA_MAX);
    }
    Ok(lambda)
}

/// Checks the invariants of a modelled state: `index_width` bits, each with
/// components strictly inside (0, 1) and unit norm.
///
/// # Errors
/// `SearchError::Domain` naming the first offending bit.
pub fn check_modelled_state(state: &ModelledState, index_width: usize) -> Result<()> {
    if state.len() != index_width {
        return Err(SearchError::domain(format!(
            "modelled state has {} bits, expected {}",
            state.len(),
            index_width
        )));
    }
    for (i, bit) in state.bits().iter().enumerate() {
        let (c, s) = (bit.cos_beta(), bit.sin_beta());
        let inside = |x: f64| x > 0.0 && x < 1.0;
        if !inside(c) || !inside(s) {
            return Err(SearchError::domain(format!(
                "bit {} amplitudes ({}, {}) not strictly inside (0, 1)",
                i, c, s
            )));
        }
        let norm_sq = c * c + s * s;
        if (norm_sq - 1.0).abs() > DEFAULT_NORM_TOLERANCE {
            return Err(SearchError::domain(format!(
                "bit {} normalization failed: cos²+sin² = {}",
                i, norm_sq
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BitAmplitude;

    #[test]
    fn clamp_keeps_valid_weights() -> Result<()> {
        assert_eq!(clamp_lambda(0.25)?, 0.25);
        assert_eq!(clamp_lambda(0.6)?, 0.6);
        assert_eq!(clamp_lambda(45.2)?, LAMBDA_MAX);
        assert_eq!(clamp_lambda(f64::INFINITY)?, LAMBDA_MAX);
        Ok(())
    }

    #[test]
    fn clamp_rejects_broken_schedules() {
        assert!(matches!(clamp_lambda(0.0), Err(SearchError::Domain { .. })));
        assert!(matches!(clamp_lambda(-1.0), Err(SearchError::Domain { .. })));
        assert!(matches!(clamp_lambda(f64::NAN), Err(SearchError::Domain { .. })));
    }

    #[test]
    fn mass_is_reported_not_changed() {
        let dist: QuasiDistribution = [(0, 0.9), (1, 0.3)].into_iter().collect();
        assert!((check_distribution_mass(&dist) - 1.2).abs() < 1e-12);
        assert_eq!(dist.probability(0), 0.9);
    }

    #[test]
    fn modelled_state_invariants() -> Result<()> {
        let state = ModelledState::new(vec![BitAmplitude::from_weight(0.3)?, BitAmplitude::from_weight(0.9)?]);
        check_modelled_state(&state, 2)?;
        assert!(matches!(check_modelled_state(&state, 3), Err(SearchError::Domain { .. })));
        Ok(())
    }
}
