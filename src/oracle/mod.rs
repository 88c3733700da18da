// src/oracle/mod.rs

//! Encodes the key-scan predicate as a reversible operator.
//!
//! A [`Scrambler`] is the classical cipher under attack: an invertible,
//! bit-parallel combination of a plaintext and a key. [`Scrambler::build_predicate`]
//! turns "does this key map `plain` to `cipher`?" into an operator over the
//! index ("key") and mirror ("message") registers that leaves every mirror
//! bit at 1 exactly when the answer is yes.

use crate::circuits::{Circuit, CircuitBuilder};
use crate::core::constants::register::MAX_INDEX_WIDTH;
use crate::core::{Result, SearchError};
use crate::operations::OperatorSpec;
use log::debug;

fn width_mask(bit_width: usize) -> u64 {
    if bit_width >= 64 { u64::MAX } else { (1u64 << bit_width) - 1 }
}

/// Reversible key predicate together with its exact inverse.
///
/// Both operators act on `2 * index_width` positions: index bits at
/// `0..n`, mirror bits at `n..2n`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    index_width: usize,
    forward: OperatorSpec,
    inverse: OperatorSpec,
}

impl Predicate {
    pub fn index_width(&self) -> usize {
        self.index_width
    }

    pub fn forward(&self) -> &OperatorSpec {
        &self.forward
    }

    pub fn inverse(&self) -> &OperatorSpec {
        &self.inverse
    }

    /// Splits into `(forward, inverse)`.
    pub fn into_parts(self) -> (OperatorSpec, OperatorSpec) {
        (self.forward, self.inverse)
    }

    /// Evaluates the predicate classically for one key assignment: true when
    /// the forward operator drives every mirror bit to 1.
    pub fn accepts(&self, key: u64) -> Result<bool> {
        let n = self.index_width;
        let circuit = Circuit::lower(&self.forward, 2 * n)?;
        let out = circuit.evaluate_basis(key & width_mask(n))?;
        Ok((out >> n) & width_mask(n) == width_mask(n))
    }
}

/// An invertible, bit-parallel combination of plaintext and key.
pub trait Scrambler {
    /// Encrypts `plain` under `key`, both truncated to `bit_width` bits.
    fn scramble(&self, bit_width: usize, plain: u64, key: u64) -> Result<u64>;

    /// Decrypts `cipher` under `key`.
    fn unscramble(&self, bit_width: usize, cipher: u64, key: u64) -> Result<u64>;

    /// Value the XOR of key and plaintext must equal for `cipher` to match.
    fn xor_target(&self, bit_width: usize, cipher: u64) -> Result<u64>;

    /// Encrypts and checks that decryption restores `plain`.
    ///
    /// # Errors
    /// Returns `SearchError::Predicate` if the round trip fails.
    fn checked_scramble(&self, bit_width: usize, plain: u64, key: u64) -> Result<u64> {
        let cipher = self.scramble(bit_width, plain, key)?;
        let restored = self.unscramble(bit_width, cipher, key)?;
        if restored != plain & width_mask(bit_width) {
            return Err(SearchError::predicate(format!(
                "unscramble(scramble({:#b})) returned {:#b}",
                plain, restored
            )));
        }
        Ok(cipher)
    }

    /// Builds the key-scan predicate for a known plaintext/ciphertext pair.
    ///
    /// The forward operator drives the mirror bits to `plain`, XORs the
    /// index bits into them, then complements every mirror bit whose
    /// expected value is 0. The inverse runs the same steps backwards.
    fn build_predicate(&self, index_width: usize, plain: u64, cipher: u64) -> Result<Predicate> {
        if index_width == 0 || index_width > MAX_INDEX_WIDTH {
            return Err(SearchError::domain(format!(
                "index width {} cannot carry a key-scan predicate",
                index_width
            )));
        }
        let n = index_width;
        let target = self.xor_target(n, cipher)?;
        let mirror = |i: usize| n + i;

        let forward = CircuitBuilder::new()
            .add_ops((0..n).filter(|i| plain & (1 << i) != 0).map(|i| OperatorSpec::bit_flip(mirror(i))))
            .add_ops((0..n).map(|i| OperatorSpec::controlled_flip(vec![i], mirror(i))))
            .add_ops((0..n).filter(|i| target & (1 << i) == 0).map(|i| OperatorSpec::bit_flip(mirror(i))))
            .build();
        debug!(
            "key-scan predicate: n={}, plain={:#b}, cipher={:#b}, gates={}",
            n,
            plain & width_mask(n),
            cipher & width_mask(n),
            forward.gate_count()
        );
        let inverse = forward.clone().adjoint();
        Ok(Predicate { index_width: n, forward, inverse })
    }
}

/// Plain XOR cipher: `cipher = plain ^ key`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XorScrambler;

impl Scrambler for XorScrambler {
    fn scramble(&self, bit_width: usize, plain: u64, key: u64) -> Result<u64> {
        Ok((plain ^ key) & width_mask(bit_width))
    }

    fn unscramble(&self, bit_width: usize, cipher: u64, key: u64) -> Result<u64> {
        Ok((cipher ^ key) & width_mask(bit_width))
    }

    fn xor_target(&self, bit_width: usize, cipher: u64) -> Result<u64> {
        Ok(cipher & width_mask(bit_width))
    }
}

/// XOR followed by two disjoint bit transpositions.
///
/// Disjoint transpositions commute and are each their own inverse, so the
/// same pair of swaps undoes the permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutedXorScrambler {
    swaps: [(usize, usize); 2],
}

impl PermutedXorScrambler {
    /// Creates the scrambler.
    ///
    /// # Errors
    /// Returns `SearchError::Predicate` unless the four positions are distinct.
    pub fn new(swaps: [(usize, usize); 2]) -> Result<Self> {
        let [(a, b), (c, d)] = swaps;
        let positions = [a, b, c, d];
        for (i, p) in positions.iter().enumerate() {
            if positions[i + 1..].contains(p) {
                return Err(SearchError::predicate(format!(
                    "transpositions {:?} are not disjoint; the permutation would not be self-paired",
                    swaps
                )));
            }
        }
        Ok(Self { swaps })
    }

    pub fn swaps(&self) -> [(usize, usize); 2] {
        self.swaps
    }

    fn permute(&self, bit_width: usize, value: u64) -> Result<u64> {
        let mut out = value & width_mask(bit_width);
        for (a, b) in self.swaps {
            if a >= bit_width || b >= bit_width {
                return Err(SearchError::predicate(format!(
                    "transposition ({}, {}) outside {}-bit block",
                    a, b, bit_width
                )));
            }
            let (bit_a, bit_b) = ((out >> a) & 1, (out >> b) & 1);
            if bit_a != bit_b {
                out ^= (1 << a) | (1 << b);
            }
        }
        Ok(out)
    }
}

impl Default for PermutedXorScrambler {
    fn default() -> Self {
        Self { swaps: [(0, 1), (2, 3)] }
    }
}

impl Scrambler for PermutedXorScrambler {
    fn scramble(&self, bit_width: usize, plain: u64, key: u64) -> Result<u64> {
        self.permute(bit_width, plain ^ key)
    }

    fn unscramble(&self, bit_width: usize, cipher: u64, key: u64) -> Result<u64> {
        Ok(self.permute(bit_width, cipher)? ^ (key & width_mask(bit_width)))
    }

    fn xor_target(&self, bit_width: usize, cipher: u64) -> Result<u64> {
        self.permute(bit_width, cipher)
    }
}
