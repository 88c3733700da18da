// src/backend/mod.rs

//! The boundary to whatever executes operators.
//!
//! The search core builds [`OperatorSpec`] trees and reads back
//! [`QuasiDistribution`]s; how the tree is run (hardware, a remote sampler,
//! a simulator in a test harness) is the implementor's business. Calls are
//! synchronous from the controller's point of view.

use crate::core::{BackendError, QuasiDistribution};
use crate::operations::OperatorSpec;

/// Executes an operator on a register initialised to all zeros.
pub trait ExecutionBackend {
    /// Runs `operator` on `register_width` bits for `shots` shots (or
    /// returns an analytic estimate) and reports the probability of each
    /// integer-encoded outcome, bit `p` of the key being register position `p`.
    ///
    /// Returned values are not normalised by the caller. Cancellation,
    /// timeouts and retries belong to the implementation.
    fn execute(
        &mut self,
        operator: &OperatorSpec,
        register_width: usize,
        shots: u64,
    ) -> Result<QuasiDistribution, BackendError>;
}

impl<B: ExecutionBackend + ?Sized> ExecutionBackend for &mut B {
    fn execute(
        &mut self,
        operator: &OperatorSpec,
        register_width: usize,
        shots: u64,
    ) -> Result<QuasiDistribution, BackendError> {
        (**self).execute(operator, register_width, shots)
    }
}

impl<B: ExecutionBackend + ?Sized> ExecutionBackend for Box<B> {
    fn execute(
        &mut self,
        operator: &OperatorSpec,
        register_width: usize,
        shots: u64,
    ) -> Result<QuasiDistribution, BackendError> {
        (**self).execute(operator, register_width, shots)
    }
}

/// Adapts a closure into a backend.
pub struct FnBackend<F>(pub F);

impl<F> ExecutionBackend for FnBackend<F>
where
    F: FnMut(&OperatorSpec, usize, u64) -> Result<QuasiDistribution, BackendError>,
{
    fn execute(
        &mut self,
        operator: &OperatorSpec,
        register_width: usize,
        shots: u64,
    ) -> Result<QuasiDistribution, BackendError> {
        (self.0)(operator, register_width, shots)
    }
}
