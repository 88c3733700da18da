// src/core/state.rs

use super::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amplitudes `(cos β, sin β)` of one modelled index bit.
///
/// `sin² β` is the estimated probability that the bit is 1. Both components
/// lie strictly inside (0, 1) and `cos² β + sin² β = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BitAmplitude {
    cos_beta: f64,
    sin_beta: f64,
}

impl BitAmplitude {
    /// Builds the amplitude pair from the weight of outcome 1.
    ///
    /// The weight must be strictly inside (0, 1); a certain bit cannot be
    /// modelled because the rotation derived from it would be degenerate.
    pub fn from_weight(weight: f64) -> Result<Self> {
        if !(weight > 0.0 && weight < 1.0) {
            return Err(SearchError::domain(format!(
                "bit weight {} must lie strictly inside (0, 1)",
                weight
            )));
        }
        Ok(Self {
            cos_beta: (1.0 - weight).sqrt(),
            sin_beta: weight.sqrt(),
        })
    }

    pub fn cos_beta(&self) -> f64 {
        self.cos_beta
    }

    pub fn sin_beta(&self) -> f64 {
        self.sin_beta
    }

    /// The angle β in radians, `arccos(cos β)`.
    pub fn beta(&self) -> f64 {
        self.cos_beta.acos()
    }

    /// Probability of reading 1 from this bit, `sin² β`.
    pub fn weight(&self) -> f64 {
        self.sin_beta * self.sin_beta
    }
}

/// Per-bit probabilistic model of the hidden key register.
///
/// Produced once per stage from measurement statistics and handed to the
/// next stage by value; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelledState {
    bits: Vec<BitAmplitude>,
}

impl ModelledState {
    /// Creates a modelled state, one entry per index bit.
    pub fn new(bits: Vec<BitAmplitude>) -> Self {
        Self { bits }
    }

    /// Uniform model, weight 1/2 on every bit.
    pub fn uniform(index_width: usize) -> Self {
        let half = std::f64::consts::FRAC_1_SQRT_2;
        Self {
            bits: vec![BitAmplitude { cos_beta: half, sin_beta: half }; index_width],
        }
    }

    pub fn bits(&self) -> &[BitAmplitude] {
        &self.bits
    }

    /// Number of modelled index bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Most likely key under the model: bit `i` set where `sin² β_i > 1/2`.
    pub fn most_likely_key(&self) -> u64 {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| b.weight() > 0.5)
            .fold(0u64, |acc, (i, _)| acc | (1 << i))
    }
}

impl fmt::Display for ModelledState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modelled[")?;
        for (i, b) in self.bits.iter().enumerate() {
            write!(
                f,
                "{}({:.4}, {:.4})",
                if i > 0 { ", " } else { "" },
                b.cos_beta,
                b.sin_beta
            )?;
        }
        write!(f, "]")
    }
}
