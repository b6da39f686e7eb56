use serde::{Deserialize, Serialize};

use crate::{GateType, ReduceOp, WireId};

/// Largest fan-in for which a gate's truth table is enumerated.
pub const MAX_FAN_IN: usize = 16;

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("{kind} gate expects {expected} input(s), got {actual}")]
    InputArity {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{kind} gate expects {expected} output(s), got {actual}")]
    OutputArity {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("lookup table with {0} inputs exceeds the fan-in limit of {MAX_FAN_IN}")]
    LutTooLarge(usize),
    #[error("lookup table needs {expected} rows, got {actual}")]
    LutRowCount { expected: usize, actual: usize },
    #[error("lookup table row {row} has {actual} output bits, expected {expected}")]
    LutRowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
}
pub type GateError = Error;

/// Interprets a bit vector as a big-endian number: bit 0 is the most significant.
pub(crate) fn row_index(bits: &[bool]) -> usize {
    bits.iter().fold(0usize, |acc, bit| (acc << 1) | usize::from(*bit))
}

/// Inverse of [`row_index`] for a fixed width.
pub(crate) fn row_bits(index: usize, width: usize) -> Vec<bool> {
    (0..width).map(|i| (index >> (width - 1 - i)) & 1 == 1).collect()
}

/// Explicit k-input, m-output function, one row per input combination in
/// ascending big-endian order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupTable {
    inputs: usize,
    outputs: usize,
    rows: Vec<Vec<bool>>,
}

impl LookupTable {
    pub fn new(inputs: usize, outputs: usize, rows: Vec<Vec<bool>>) -> Result<Self, Error> {
        if inputs > MAX_FAN_IN {
            return Err(Error::LutTooLarge(inputs));
        }
        if rows.len() != 1 << inputs {
            return Err(Error::LutRowCount {
                expected: 1 << inputs,
                actual: rows.len(),
            });
        }
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != outputs) {
            return Err(Error::LutRowWidth {
                row,
                expected: outputs,
                actual: r.len(),
            });
        }
        Ok(Self {
            inputs,
            outputs,
            rows,
        })
    }

    pub fn from_fn(
        inputs: usize,
        outputs: usize,
        f: impl Fn(&[bool]) -> Vec<bool>,
    ) -> Result<Self, Error> {
        if inputs > MAX_FAN_IN {
            return Err(Error::LutTooLarge(inputs));
        }
        let rows = (0..1usize << inputs)
            .map(|index| f(&row_bits(index, inputs)))
            .collect();
        Self::new(inputs, outputs, rows)
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn outputs(&self) -> usize {
        self.outputs
    }

    fn lookup(&self, bits: &[bool]) -> Vec<bool> {
        self.rows[row_index(bits)].clone()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    Binary(GateType),
    Not,
    Buf,
    /// Inputs `[sel, a, b]`, output `sel ? b : a`.
    Mux,
    Reduce(ReduceOp),
    Lut(LookupTable),
}

impl GateKind {
    fn name(&self) -> &'static str {
        match self {
            GateKind::Binary(_) => "binary",
            GateKind::Not => "not",
            GateKind::Buf => "buf",
            GateKind::Mux => "mux",
            GateKind::Reduce(_) => "reduce",
            GateKind::Lut(_) => "lut",
        }
    }

    /// `None` means any non-zero number of inputs.
    fn input_arity(&self) -> Option<usize> {
        match self {
            GateKind::Binary(_) => Some(2),
            GateKind::Not | GateKind::Buf => Some(1),
            GateKind::Mux => Some(3),
            GateKind::Reduce(_) => None,
            GateKind::Lut(lut) => Some(lut.inputs),
        }
    }

    fn output_arity(&self) -> usize {
        match self {
            GateKind::Lut(lut) => lut.outputs,
            _ => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub inputs: Vec<WireId>,
    pub outputs: Vec<WireId>,
    pub kind: GateKind,
}

impl Gate {
    #[must_use]
    pub fn new(kind: GateKind, inputs: Vec<WireId>, outputs: Vec<WireId>) -> Self {
        Self {
            inputs,
            outputs,
            kind,
        }
    }

    #[must_use]
    pub fn binary(t: GateType, a: WireId, b: WireId, c: WireId) -> Self {
        Self::new(GateKind::Binary(t), vec![a, b], vec![c])
    }

    #[must_use]
    pub fn and(a: WireId, b: WireId, c: WireId) -> Self {
        Self::binary(GateType::And, a, b, c)
    }

    #[must_use]
    pub fn or(a: WireId, b: WireId, c: WireId) -> Self {
        Self::binary(GateType::Or, a, b, c)
    }

    #[must_use]
    pub fn xor(a: WireId, b: WireId, c: WireId) -> Self {
        Self::binary(GateType::Xor, a, b, c)
    }

    #[must_use]
    pub fn not(a: WireId, c: WireId) -> Self {
        Self::new(GateKind::Not, vec![a], vec![c])
    }

    #[must_use]
    pub fn buf(a: WireId, c: WireId) -> Self {
        Self::new(GateKind::Buf, vec![a], vec![c])
    }

    #[must_use]
    pub fn mux(sel: WireId, a: WireId, b: WireId, c: WireId) -> Self {
        Self::new(GateKind::Mux, vec![sel, a, b], vec![c])
    }

    #[must_use]
    pub fn reduce(op: ReduceOp, inputs: Vec<WireId>, c: WireId) -> Self {
        Self::new(GateKind::Reduce(op), inputs, vec![c])
    }

    #[must_use]
    pub fn lut(table: LookupTable, inputs: Vec<WireId>, outputs: Vec<WireId>) -> Self {
        Self::new(GateKind::Lut(table), inputs, outputs)
    }

    pub fn fan_in(&self) -> usize {
        self.inputs.len()
    }

    pub fn check_arity(&self) -> Result<(), Error> {
        let kind = self.kind.name();
        match self.kind.input_arity() {
            Some(expected) if expected != self.inputs.len() => {
                return Err(Error::InputArity {
                    kind,
                    expected,
                    actual: self.inputs.len(),
                });
            }
            None if self.inputs.is_empty() => {
                return Err(Error::InputArity {
                    kind,
                    expected: 1,
                    actual: 0,
                });
            }
            _ => {}
        }

        let expected = self.kind.output_arity();
        if expected != self.outputs.len() {
            return Err(Error::OutputArity {
                kind,
                expected,
                actual: self.outputs.len(),
            });
        }
        Ok(())
    }

    /// Evaluates the gate function on the given input bits, returning one bit
    /// per output wire.
    pub fn evaluate(&self, bits: &[bool]) -> Result<Vec<bool>, Error> {
        if bits.len() != self.inputs.len() {
            return Err(Error::InputArity {
                kind: self.kind.name(),
                expected: self.inputs.len(),
                actual: bits.len(),
            });
        }
        self.check_arity()?;

        Ok(match &self.kind {
            GateKind::Binary(t) => vec![(t.f())(bits[0], bits[1])],
            GateKind::Not => vec![!bits[0]],
            GateKind::Buf => vec![bits[0]],
            GateKind::Mux => vec![if bits[0] { bits[2] } else { bits[1] }],
            GateKind::Reduce(op) => vec![op.fold(bits)],
            GateKind::Lut(lut) => lut.lookup(bits),
        })
    }
}
