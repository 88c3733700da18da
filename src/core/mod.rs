// src/core/mod.rs

//! Core data structures and types

pub mod error;
pub mod register;
pub mod state;
pub mod distribution;

// Re-export public types for convenient access via `qkeyscan::core::TypeName`
pub use error::{BackendError, Result, SearchError};
pub use register::Register;
pub use state::{BitAmplitude, ModelledState};
pub use distribution::{outcome_count, QuasiDistribution};

pub mod constants;
pub use constants::PI;
