// src/core/register.rs

use super::constants::register::MAX_INDEX_WIDTH;
use super::error::{Result, SearchError};
use std::fmt;

/// Layout of the search register.
///
/// For an index width `n` the register holds `2n + 1` bit positions:
/// index ("key") bits at `0..n`, mirror ("message") bits at `n..2n` and a
/// single ancilla at `2n`. Outcome patterns returned by a backend use the
/// same order, bit `p` of the integer being position `p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    index_width: usize,
}

impl Register {
    /// Creates the layout for `index_width` key bits.
    pub fn new(index_width: usize) -> Result<Self> {
        if index_width == 0 || index_width > MAX_INDEX_WIDTH {
            return Err(SearchError::domain(format!(
                "index width {} outside supported range 1..={}",
                index_width, MAX_INDEX_WIDTH
            )));
        }
        Ok(Self { index_width })
    }

    /// Number of index bits.
    pub fn index_width(&self) -> usize {
        self.index_width
    }

    /// Total number of positions, `2n + 1`.
    pub fn width(&self) -> usize {
        2 * self.index_width + 1
    }

    pub fn index_bit(&self, i: usize) -> usize {
        i
    }

    pub fn mirror_bit(&self, i: usize) -> usize {
        self.index_width + i
    }

    pub fn ancilla(&self) -> usize {
        2 * self.index_width
    }

    /// Positions of the index bits, in order.
    pub fn index_bits(&self) -> Vec<usize> {
        (0..self.index_width).collect()
    }

    /// Positions of the mirror bits, in order.
    pub fn mirror_bits(&self) -> Vec<usize> {
        (self.index_width..2 * self.index_width).collect()
    }

    /// Positions of index and mirror bits together (everything but the ancilla).
    pub fn data_bits(&self) -> Vec<usize> {
        (0..2 * self.index_width).collect()
    }

    /// Positions of mirror bits plus the ancilla, the span of a phase kickback.
    pub fn kickback_bits(&self) -> Vec<usize> {
        (self.index_width..=2 * self.index_width).collect()
    }

    /// Mask selecting `index_width` low bits.
    pub fn index_mask(&self) -> u64 {
        (1u64 << self.index_width) - 1
    }

    /// Splits an outcome pattern into its `(index, mirror)` registers.
    pub fn split(&self, outcome: u64) -> (u64, u64) {
        let mask = self.index_mask();
        (outcome & mask, (outcome >> self.index_width) & mask)
    }

    /// Checks that `bit` addresses an index position.
    pub fn check_index_bit(&self, bit: usize) -> Result<()> {
        if bit >= self.index_width {
            return Err(SearchError::domain(format!(
                "flag bit {} outside index range [0, {})",
                bit, self.index_width
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Register(n={}, width={})", self.index_width, self.width())
    }
}
