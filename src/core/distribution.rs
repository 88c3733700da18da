// src/core/distribution.rs

use super::register::Register;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Estimated probability per integer-encoded outcome pattern.
///
/// Values come straight from an execution backend and may be negative or
/// fail to sum to 1 (estimator noise). They are treated as ground truth and
/// never renormalised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuasiDistribution {
    probabilities: BTreeMap<u64, f64>,
}

/// Estimated shot count of an outcome, `int(probability * shots)`.
///
/// Truncates toward zero. A negative quasi-probability gives a negative
/// count once its magnitude reaches one shot (-0.02 at 100 shots is -2),
/// and such counts are subtracted when tallied.
pub fn outcome_count(probability: f64, shots: u64) -> i64 {
    (probability * shots as f64).trunc() as i64
}

impl QuasiDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the probability of one outcome, replacing any previous value.
    pub fn insert(&mut self, outcome: u64, probability: f64) {
        self.probabilities.insert(outcome, probability);
    }

    /// Probability of `outcome`, zero when absent.
    pub fn probability(&self, outcome: u64) -> f64 {
        self.probabilities.get(&outcome).copied().unwrap_or(0.0)
    }

    /// Iterates `(outcome, probability)` pairs in ascending outcome order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.probabilities.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Sum of all stored values. Informational only.
    pub fn total_mass(&self) -> f64 {
        self.probabilities.values().sum()
    }

    /// Estimated shot counts grouped by `(index, mirror)` register values,
    /// most common first. Ties are ordered by register values so the
    /// listing is stable.
    pub fn tally(&self, register: &Register, shots: u64) -> Vec<((u64, u64), i64)> {
        let mut counts: HashMap<(u64, u64), i64> = HashMap::new();
        for (outcome, probability) in self.iter() {
            *counts.entry(register.split(outcome)).or_insert(0) += outcome_count(probability, shots);
        }
        let mut sorted: Vec<_> = counts.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        sorted
    }

    /// The `limit` most common `(index, mirror)` pairs of [`Self::tally`].
    pub fn most_common(&self, register: &Register, shots: u64, limit: usize) -> Vec<((u64, u64), i64)> {
        let mut tally = self.tally(register, shots);
        tally.truncate(limit);
        tally
    }

    /// Fraction of shots whose index register equals `key` with every
    /// mirror bit restored to zero.
    pub fn success_probability(&self, register: &Register, shots: u64, key: u64) -> f64 {
        if shots == 0 {
            return 0.0;
        }
        let hits: i64 = self
            .iter()
            .filter(|(outcome, _)| register.split(*outcome) == (key & register.index_mask(), 0))
            .map(|(_, p)| outcome_count(p, shots))
            .sum();
        hits as f64 / shots as f64
    }
}

impl FromIterator<(u64, f64)> for QuasiDistribution {
    fn from_iter<I: IntoIterator<Item = (u64, f64)>>(iter: I) -> Self {
        Self {
            probabilities: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for QuasiDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (outcome, p)) in self.iter().enumerate() {
            write!(f, "{}{:#b}: {:.4}", if i > 0 { ", " } else { "" }, outcome, p)?;
        }
        write!(f, "}}")
    }
}
