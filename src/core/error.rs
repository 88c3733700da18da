//! Error handling logic

use std::fmt;
use thiserror::Error;

/// Opaque failure raised by an execution backend.
///
/// The search core never inspects the wrapped error; it is carried through
/// to the caller unchanged so that retry or backoff policy can be decided
/// outside the controller.
#[derive(Debug)]
pub struct BackendError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl BackendError {
    /// Wraps any backend failure.
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self(error.into())
    }

    /// The wrapped backend failure.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// Unwraps into the original boxed failure.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.0
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Failures of a staged search run.
///
/// `Domain` and `Predicate` are programming or configuration faults: they
/// abort the current run immediately and are never retried. `Backend` is
/// whatever the execution service reported, passed through untouched.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A numeric argument left its valid domain: lambda outside (0, 0.6],
    /// an arcsin argument above 1, an iteration count below 1, or a bit
    /// position outside the register it addresses.
    #[error("Domain Error: {message}")]
    Domain {
        /// Domain failure message
        message: String,
    },

    /// The oracle encoder broke one of its own invariants, e.g. a scramble
    /// that does not round-trip or a permutation that is not self-paired.
    #[error("Predicate Error: {message}")]
    Predicate {
        /// Predicate failure message
        message: String,
    },

    /// The execution backend failed. Never retried by the core.
    #[error("Backend Error: {0}")]
    Backend(#[source] BackendError),

    /// A configuration value is unusable.
    #[error("Config Error ({field}): {message}")]
    Config {
        /// Name of the offending field
        field: String,
        /// Config failure message
        message: String,
    },

    /// The report sink could not be written.
    #[error("Report Error: {0}")]
    Report(#[from] std::io::Error),
}

impl SearchError {
    pub(crate) fn domain(message: impl Into<String>) -> Self {
        SearchError::Domain { message: message.into() }
    }

    pub(crate) fn predicate(message: impl Into<String>) -> Self {
        SearchError::Predicate { message: message.into() }
    }

    pub(crate) fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        SearchError::Config { field: field.into(), message: message.into() }
    }
}

impl From<BackendError> for SearchError {
    fn from(error: BackendError) -> Self {
        SearchError::Backend(error)
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, SearchError>;
