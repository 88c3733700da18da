// src/lib.rs

//! `qkeyscan` - Staged Grover-Long key search
//!
//! This library plans and drives an adaptive, multi-stage amplitude
//! amplification search for a secret key tested against a known
//! plaintext/ciphertext pair. It derives Grover-Long iteration counts and
//! phases, encodes the key predicate as a reversible operator, and turns
//! each stage's measurement statistics into the next stage's rotation and
//! target weight. Executing the operators is left to an
//! [`ExecutionBackend`].

pub mod core;
pub mod operations;
pub mod circuits;
pub mod oracle;
pub mod groverlong;
pub mod estimator;
pub mod validation;
pub mod backend;
pub mod search;

// Re-export the most common types for easier top-level use
pub use core::{BackendError, BitAmplitude, ModelledState, QuasiDistribution, Register, Result, SearchError};
pub use operations::{Gate, OperatorSpec};
pub use circuits::{Circuit, CircuitBuilder};
pub use oracle::{PermutedXorScrambler, Predicate, Scrambler, XorScrambler};
pub use groverlong::{build_search_operator, iteration_count, phase, SearchOperator};
pub use estimator::{build_rotation_operator, entropy, lambda_for_stage, modelled_state};
pub use backend::{ExecutionBackend, FnBackend};
pub use search::{
    ControllerState, CsvReport, ReportSink, RunReport, SearchConfig, SearchOutcome, StageStatistics, StagedSearch,
};

// Example 1: Iteration schedule
// Grover-Long needs one iteration at weight 1/2 and about (π/4)√N for a
// single marked item out of N.
/// ```
/// use qkeyscan::{iteration_count, phase, SearchError};
///
/// assert_eq!(iteration_count(0.5)?, 1);
/// assert_eq!(iteration_count(1.0 / 256.0)?, 13);
///
/// let g = iteration_count(0.1)?;
/// let alpha = phase(0.1, g)?;
/// assert!(alpha > 0.0 && alpha <= std::f64::consts::PI);
///
/// assert!(matches!(iteration_count(0.61), Err(SearchError::Domain { .. })));
/// # Ok::<(), SearchError>(())
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 2: A full staged run
// The backend here ignores the operator and always reports the key with a
// clean mirror register; a real backend would execute the operator.
/// ```
/// use qkeyscan::{
///     BackendError, FnBackend, OperatorSpec, QuasiDistribution, Scrambler, SearchConfig, SearchError,
///     StagedSearch, XorScrambler,
/// };
///
/// let (plain, key) = (0b1011, 0b0110);
/// let cipher = XorScrambler.checked_scramble(4, plain, key)?;
/// let predicate = XorScrambler.build_predicate(4, plain, cipher)?;
///
/// let backend = FnBackend(|_: &OperatorSpec, width: usize, _: u64| -> Result<QuasiDistribution, BackendError> {
///     assert_eq!(width, 9);
///     Ok([(key, 1.0)].into_iter().collect())
/// });
/// let mut search = StagedSearch::new(SearchConfig::with_index_width(4), backend)?;
/// let outcome = search.run(&predicate)?;
///
/// assert_eq!(outcome.stages().len(), 4);
/// assert_eq!(outcome.stages()[0].lambda, 0.5);
/// assert_eq!(outcome.final_state().most_likely_key(), key);
/// assert_eq!(outcome.report(key).probability, 1.0);
/// # Ok::<(), SearchError>(())
/// ```
#[doc(hidden)]
const _: () = ();
