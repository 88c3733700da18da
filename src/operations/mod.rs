// src/operations/mod.rs

//! Defines the abstract operator description handed to execution backends.
//!
//! An [`OperatorSpec`] is an immutable tree: primitive [`Gate`]s at the
//! leaves, composed by sequencing, by embedding a sub-operator over a subset
//! of positions, and by taking the adjoint. Positions are local to the node
//! that names them; an [`OperatorSpec::Embed`] maps them onto its parent.
//! Nothing in this module knows how a backend executes the tree.

use crate::core::{Result, SearchError, PI};
use num_complex::Complex;
use num_traits::{One, Zero};

/// A primitive reversible operation over concrete bit positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    /// Complements the target bit.
    ///
    /// Analogy: the X gate.
    BitFlip {
        /// Position to flip.
        target: usize,
    },

    /// Complements the target bit when every control bit is 1.
    ///
    /// Analogy: CNOT / Toffoli / multi-controlled X. With no controls this
    /// is a plain bit flip.
    ControlledFlip {
        /// Positions that must all be 1.
        controls: Vec<usize>,
        /// Position to flip.
        target: usize,
    },

    /// Multiplies the amplitude by `e^(iθ)` when the target bit and every
    /// control bit are 1; every other basis state is left unchanged.
    ///
    /// Analogy: the phase gate `P(θ)` on the target, multi-controlled.
    ControlledPhase {
        /// Positions that must all be 1.
        controls: Vec<usize>,
        /// Position receiving the phase.
        target: usize,
        /// Phase angle in radians.
        theta: f64,
    },

    /// General single-bit rotation `U(θ, φ, λ)`:
    ///
    /// ```text
    /// [[cos(θ/2),          -e^(iλ) sin(θ/2)     ],
    ///  [e^(iφ) sin(θ/2),    e^(i(φ+λ)) cos(θ/2) ]]
    /// ```
    Rotation {
        target: usize,
        theta: f64,
        phi: f64,
        lambda: f64,
    },
}

impl Gate {
    /// Hadamard expressed as `U(π/2, 0, π)`.
    pub fn hadamard(target: usize) -> Self {
        Gate::Rotation { target, theta: PI / 2.0, phi: 0.0, lambda: PI }
    }

    /// The position the gate acts on.
    pub fn target(&self) -> usize {
        match self {
            Gate::BitFlip { target }
            | Gate::ControlledFlip { target, .. }
            | Gate::ControlledPhase { target, .. }
            | Gate::Rotation { target, .. } => *target,
        }
    }

    /// Control positions, empty for uncontrolled gates.
    pub fn controls(&self) -> &[usize] {
        match self {
            Gate::ControlledFlip { controls, .. } | Gate::ControlledPhase { controls, .. } => controls,
            Gate::BitFlip { .. } | Gate::Rotation { .. } => &[],
        }
    }

    /// All positions the gate reads or writes, controls first.
    pub fn positions(&self) -> Vec<usize> {
        let mut positions = self.controls().to_vec();
        positions.push(self.target());
        positions
    }

    /// Inverse of the gate. Flips are involutions; phases and rotations
    /// invert by negating their angles.
    pub fn adjoint(&self) -> Gate {
        match self {
            Gate::BitFlip { .. } | Gate::ControlledFlip { .. } => self.clone(),
            Gate::ControlledPhase { controls, target, theta } => Gate::ControlledPhase {
                controls: controls.clone(),
                target: *target,
                theta: -theta,
            },
            Gate::Rotation { target, theta, phi, lambda } => Gate::Rotation {
                target: *target,
                theta: -theta,
                phi: -lambda,
                lambda: -phi,
            },
        }
    }

    /// Rewrites every position through `map` (local position -> parent position).
    pub(crate) fn remap(&self, map: &[usize]) -> Result<Gate> {
        let lookup = |p: usize| {
            map.get(p).copied().ok_or_else(|| {
                SearchError::domain(format!(
                    "gate position {} outside embedding of width {}",
                    p,
                    map.len()
                ))
            })
        };
        let controls = |cs: &[usize]| cs.iter().map(|c| lookup(*c)).collect::<Result<Vec<_>>>();
        Ok(match self {
            Gate::BitFlip { target } => Gate::BitFlip { target: lookup(*target)? },
            Gate::ControlledFlip { controls: cs, target } => Gate::ControlledFlip {
                controls: controls(cs.as_slice())?,
                target: lookup(*target)?,
            },
            Gate::ControlledPhase { controls: cs, target, theta } => Gate::ControlledPhase {
                controls: controls(cs.as_slice())?,
                target: lookup(*target)?,
                theta: *theta,
            },
            Gate::Rotation { target, theta, phi, lambda } => Gate::Rotation {
                target: lookup(*target)?,
                theta: *theta,
                phi: *phi,
                lambda: *lambda,
            },
        })
    }

    /// The 2x2 unitary applied to the target when all controls are 1.
    pub fn target_matrix(&self) -> [[Complex<f64>; 2]; 2] {
        match self {
            Gate::BitFlip { .. } | Gate::ControlledFlip { .. } => [
                [Complex::zero(), Complex::one()],
                [Complex::one(), Complex::zero()],
            ],
            Gate::ControlledPhase { theta, .. } => [
                [Complex::one(), Complex::zero()],
                [Complex::zero(), Complex::from_polar(1.0, *theta)],
            ],
            Gate::Rotation { theta, phi, lambda, .. } => {
                let (s, c) = (theta / 2.0).sin_cos();
                [
                    [Complex::new(c, 0.0), -Complex::from_polar(s, *lambda)],
                    [Complex::from_polar(s, *phi), Complex::from_polar(c, phi + lambda)],
                ]
            }
        }
    }

    /// True when the gate maps basis states to basis states (up to phase).
    pub fn is_classical(&self) -> bool {
        !matches!(self, Gate::Rotation { .. })
    }

    /// Applies a classical gate to a basis state. Phases are dropped since a
    /// basis state only tracks its label.
    ///
    /// # Errors
    /// `SearchError::Domain` for a rotation, or for a position beyond the
    /// 64 bits of a basis label.
    pub fn apply_basis(&self, bits: u64) -> Result<u64> {
        if let Some(p) = self.positions().into_iter().find(|p| *p >= u64::BITS as usize) {
            return Err(SearchError::domain(format!(
                "position {} does not fit a {}-bit basis label",
                p,
                u64::BITS
            )));
        }
        let all_set = |cs: &[usize]| cs.iter().all(|c| bits & (1 << c) != 0);
        match self {
            Gate::BitFlip { target } => Ok(bits ^ (1 << target)),
            Gate::ControlledFlip { controls, target } => {
                Ok(if all_set(controls.as_slice()) { bits ^ (1 << target) } else { bits })
            }
            Gate::ControlledPhase { .. } => Ok(bits),
            Gate::Rotation { target, .. } => Err(SearchError::domain(format!(
                "rotation on position {} has no classical basis action",
                target
            ))),
        }
    }
}

/// Abstract, composable description of a reversible transformation.
///
/// Backends interpret the tree (typically after lowering it with
/// [`crate::circuits::Circuit::lower`]); the search core only builds it.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorSpec {
    /// A single primitive.
    Gate(Gate),
    /// Children applied in order.
    Sequence(Vec<OperatorSpec>),
    /// `operator` applied with its local position `i` mapped to `positions[i]`.
    Embed {
        positions: Vec<usize>,
        operator: Box<OperatorSpec>,
    },
    /// The inverse of the wrapped operator.
    Adjoint(Box<OperatorSpec>),
}

impl OperatorSpec {
    pub fn bit_flip(target: usize) -> Self {
        OperatorSpec::Gate(Gate::BitFlip { target })
    }

    pub fn controlled_flip(controls: Vec<usize>, target: usize) -> Self {
        OperatorSpec::Gate(Gate::ControlledFlip { controls, target })
    }

    pub fn controlled_phase(controls: Vec<usize>, target: usize, theta: f64) -> Self {
        OperatorSpec::Gate(Gate::ControlledPhase { controls, target, theta })
    }

    /// Uncontrolled phase `P(θ)` on `target`.
    pub fn phase(target: usize, theta: f64) -> Self {
        Self::controlled_phase(Vec::new(), target, theta)
    }

    pub fn rotation(target: usize, theta: f64, phi: f64, lambda: f64) -> Self {
        OperatorSpec::Gate(Gate::Rotation { target, theta, phi, lambda })
    }

    pub fn hadamard(target: usize) -> Self {
        OperatorSpec::Gate(Gate::hadamard(target))
    }

    /// The operator that does nothing.
    pub fn identity() -> Self {
        OperatorSpec::Sequence(Vec::new())
    }

    pub fn sequence<I>(ops: I) -> Self
    where
        I: IntoIterator<Item = OperatorSpec>,
    {
        OperatorSpec::Sequence(ops.into_iter().collect())
    }

    /// Embeds `operator` over `positions` of the parent register.
    ///
    /// Fails with a domain error if the positions repeat or do not cover
    /// every local position the operator uses.
    pub fn embed(positions: Vec<usize>, operator: OperatorSpec) -> Result<Self> {
        let mut seen = positions.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != positions.len() {
            return Err(SearchError::domain(format!(
                "embedding positions {:?} are not distinct",
                positions
            )));
        }
        if operator.width() > positions.len() {
            return Err(SearchError::domain(format!(
                "operator of width {} cannot be embedded over {} positions",
                operator.width(),
                positions.len()
            )));
        }
        Ok(OperatorSpec::Embed { positions, operator: Box::new(operator) })
    }

    /// The adjoint. Taking it twice yields the original tree.
    pub fn adjoint(self) -> Self {
        match self {
            OperatorSpec::Adjoint(inner) => *inner,
            other => OperatorSpec::Adjoint(Box::new(other)),
        }
    }

    /// `count` applications of `self` in sequence.
    pub fn repeat(&self, count: usize) -> Self {
        OperatorSpec::Sequence(vec![self.clone(); count])
    }

    /// Number of positions spanned: one past the highest position used.
    pub fn width(&self) -> usize {
        match self {
            OperatorSpec::Gate(g) => g.positions().into_iter().max().map_or(0, |p| p + 1),
            OperatorSpec::Sequence(ops) => ops.iter().map(|op| op.width()).max().unwrap_or(0),
            OperatorSpec::Embed { positions, .. } => positions.iter().max().map_or(0, |p| p + 1),
            OperatorSpec::Adjoint(inner) => inner.width(),
        }
    }

    /// Number of primitive gates after full expansion.
    pub fn gate_count(&self) -> usize {
        match self {
            OperatorSpec::Gate(_) => 1,
            OperatorSpec::Sequence(ops) => ops.iter().map(|op| op.gate_count()).sum(),
            OperatorSpec::Embed { operator, .. } => operator.gate_count(),
            OperatorSpec::Adjoint(inner) => inner.gate_count(),
        }
    }

    /// True when every primitive in the tree is classical.
    pub fn is_classical(&self) -> bool {
        match self {
            OperatorSpec::Gate(g) => g.is_classical(),
            OperatorSpec::Sequence(ops) => ops.iter().all(|op| op.is_classical()),
            OperatorSpec::Embed { operator, .. } => operator.is_classical(),
            OperatorSpec::Adjoint(inner) => inner.is_classical(),
        }
    }
}

impl From<Gate> for OperatorSpec {
    fn from(gate: Gate) -> Self {
        OperatorSpec::Gate(gate)
    }
}
