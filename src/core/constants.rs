//! Numeric constants of the Grover-Long schedule and the stage estimator.

/// Domain bounds for the target weight (lambda).
pub mod lambda {
    /// Upper bound accepted for lambda. The Grover-Long formulas hold up to
    /// 1/2; the slack to 0.6 absorbs numerical error in scheduled weights.
    pub const LAMBDA_MAX: f64 = 0.6;
    /// Weight assumed on the first stage, before any measurement exists.
    pub const UNIFORM_PRIOR_LAMBDA: f64 = 0.5;
    /// Base of the entropy-driven schedule `base^(n - stage - entropy)`.
    pub const LAMBDA_SCHEDULE_BASE: f64 = 2.0;
}

/// Empirical policy of the stage estimator.
pub mod estimator {
    /// Scales the binomial lower bound `1 / (shots + 2)` on a bit weight.
    pub const MIN_WEIGHT_FACTOR: f64 = 0.2;
    /// Additive pseudo-count in the denominator of the lower bound.
    pub const MIN_WEIGHT_PSEUDO_COUNT: f64 = 2.0;
    /// Deviation of total probability mass from 1 above which a returned
    /// distribution is logged as suspicious. It is never renormalised.
    pub const MASS_WARN_TOLERANCE: f64 = 0.05;
}

/// Register limits.
pub mod register {
    /// Largest supported index width: the `2n + 1` bit register must fit in
    /// a `u64` outcome pattern.
    pub const MAX_INDEX_WIDTH: usize = 31;
}

/// Used for phase angles (`e^(iθ)`)
pub const PI: f64 = std::f64::consts::PI;
