// src/circuits/mod.rs

//! Builds operator trees by chaining, and lowers them into flat circuits.
//!
//! [`CircuitBuilder`] sequences [`OperatorSpec`]s the way the search code
//! assembles oracles and iterations. [`Circuit`] is the lowered form: an
//! ordered list of primitive [`Gate`]s on concrete register positions, with
//! every `Embed` resolved and every `Adjoint` pushed down to the leaves.
//! Backends that prefer a flat gate list execute a `Circuit`.

use crate::core::{Result, SearchError};
use crate::operations::{Gate, OperatorSpec};
use std::fmt;

/// An ordered sequence of primitive gates on a register of `width` positions.
///
/// The order is significant: gates apply first to last.
#[derive(Clone, PartialEq)]
pub struct Circuit {
    width: usize,
    gates: Vec<Gate>,
}

impl Circuit {
    /// Creates an empty circuit on `width` positions.
    pub fn new(width: usize) -> Self {
        Self { width, gates: Vec::new() }
    }

    /// Lowers `spec` onto a register of `width` positions.
    ///
    /// # Errors
    /// Returns `SearchError::Domain` if any gate, after embedding, addresses
    /// a position at or beyond `width`.
    pub fn lower(spec: &OperatorSpec, width: usize) -> Result<Self> {
        let identity: Vec<usize> = (0..width).collect();
        let mut gates = Vec::with_capacity(spec.gate_count());
        lower_into(spec, &identity, false, &mut gates)?;
        Ok(Self { width, gates })
    }

    /// Appends a gate, checking that it stays inside the register.
    pub fn push(&mut self, gate: Gate) -> Result<()> {
        if let Some(p) = gate.positions().into_iter().find(|p| *p >= self.width) {
            return Err(SearchError::domain(format!(
                "gate position {} outside circuit of width {}",
                p, self.width
            )));
        }
        self.gates.push(gate);
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns a slice containing the ordered sequence of gates.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Inverse circuit: gates reversed, each replaced by its adjoint.
    pub fn inverse(&self) -> Self {
        Self {
            width: self.width,
            gates: self.gates.iter().rev().map(Gate::adjoint).collect(),
        }
    }

    /// Runs a classical circuit on the basis state `input`.
    ///
    /// # Errors
    /// Returns `SearchError::Domain` if the circuit contains a rotation,
    /// which does not map basis states to basis states.
    pub fn evaluate_basis(&self, input: u64) -> Result<u64> {
        self.gates.iter().try_fold(input, |bits, gate| gate.apply_basis(bits))
    }
}

fn lower_into(spec: &OperatorSpec, map: &[usize], adjoint: bool, out: &mut Vec<Gate>) -> Result<()> {
    match spec {
        OperatorSpec::Gate(gate) => {
            let gate = gate.remap(map)?;
            out.push(if adjoint { gate.adjoint() } else { gate });
        }
        OperatorSpec::Sequence(ops) => {
            if adjoint {
                for op in ops.iter().rev() {
                    lower_into(op, map, adjoint, out)?;
                }
            } else {
                for op in ops {
                    lower_into(op, map, adjoint, out)?;
                }
            }
        }
        OperatorSpec::Embed { positions, operator } => {
            let inner_map = positions
                .iter()
                .map(|p| {
                    map.get(*p).copied().ok_or_else(|| {
                        SearchError::domain(format!(
                            "embedding position {} outside register of width {}",
                            p,
                            map.len()
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            lower_into(operator, &inner_map, adjoint, out)?;
        }
        OperatorSpec::Adjoint(inner) => lower_into(inner, map, !adjoint, out)?,
    }
    Ok(())
}

//-------------------------------------------------------------------------
// Circuit Builder
//-------------------------------------------------------------------------

/// A helper struct for composing `OperatorSpec` sequences using method chaining.
pub struct CircuitBuilder {
    ops: Vec<OperatorSpec>,
}

impl CircuitBuilder {
    /// Creates a new, empty CircuitBuilder.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Appends a single operator.
    ///
    /// Returns `self` to allow for continued method chaining.
    pub fn add_op(mut self, op: impl Into<OperatorSpec>) -> Self {
        self.ops.push(op.into());
        self
    }

    /// Appends multiple operators from an iterator.
    pub fn add_ops<I>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = OperatorSpec>,
    {
        self.ops.extend(ops);
        self
    }

    /// Appends `op` embedded over `positions`.
    ///
    /// # Errors
    /// See [`OperatorSpec::embed`].
    pub fn embed(mut self, positions: Vec<usize>, op: OperatorSpec) -> Result<Self> {
        self.ops.push(OperatorSpec::embed(positions, op)?);
        Ok(self)
    }

    /// Finalizes the construction process and returns the sequenced operator.
    pub fn build(self) -> OperatorSpec {
        OperatorSpec::Sequence(self.ops)
    }
}

impl Default for CircuitBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Glyph drawn on `row` in the column of `gate`.
fn glyph(gate: &Gate, row: usize) -> char {
    let (lo, hi) = span(gate);
    if row == gate.target() {
        match gate {
            Gate::BitFlip { .. } | Gate::ControlledFlip { .. } => 'X',
            Gate::ControlledPhase { .. } => 'P',
            Gate::Rotation { .. } if *gate == Gate::hadamard(row) => 'H',
            Gate::Rotation { .. } => 'U',
        }
    } else if gate.controls().contains(&row) {
        '@'
    } else if lo < row && row < hi {
        '┼'
    } else {
        '─'
    }
}

fn span(gate: &Gate) -> (usize, usize) {
    let positions = gate.positions();
    let lo = positions.iter().copied().min().unwrap_or(gate.target());
    let hi = positions.iter().copied().max().unwrap_or(gate.target());
    (lo, hi)
}

/// One column per gate, one line per wire; a `│` joins a gate's
/// controls to its target between wires.
impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Circuit[{} gates on {} bits]", self.gates.len(), self.width)?;
        if self.gates.is_empty() {
            return Ok(());
        }
        let label = format!("q{}", self.width.saturating_sub(1)).len();
        for row in 0..self.width {
            write!(f, "{:>label$}: ", format!("q{}", row))?;
            for gate in &self.gates {
                write!(f, "─{}─", glyph(gate, row))?;
            }
            writeln!(f)?;
            if row + 1 == self.width {
                break;
            }
            write!(f, "{:label$}  ", "")?;
            for gate in &self.gates {
                let (lo, hi) = span(gate);
                write!(f, " {} ", if lo <= row && row < hi { '│' } else { ' ' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
