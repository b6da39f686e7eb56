use bitvec::prelude::*;

use super::{errors::CircuitError, structure::Circuit};
use crate::GateError;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Circuit expects {expected} input bit(s), got {actual}")]
    InputWidth { expected: usize, actual: usize },
    #[error("Evaluation incomplete: no value derived for wire {0:?}")]
    Incomplete(String),
    #[error("Circuit structure error: {0}")]
    Structure(#[from] CircuitError),
    #[error("Gate {gate} evaluation failed: {err}")]
    Gate { gate: usize, err: GateError },
}
pub type EvalError = Error;

impl Circuit {
    /// Evaluates every wire of the circuit. The result is indexed by `WireId`.
    pub fn evaluate(&self, inputs: &[bool]) -> Result<BitVec, Error> {
        if inputs.len() != self.input_wires.len() {
            return Err(Error::InputWidth {
                expected: self.input_wires.len(),
                actual: inputs.len(),
            });
        }
        self.check_references()?;

        let mut values = bitvec![0; self.num_wire()];
        let mut known = bitvec![0; self.num_wire()];

        for (&wire_id, &value) in self.input_wires.iter().zip(inputs) {
            values.set(wire_id.0, value);
            known.set(wire_id.0, true);
        }

        for gate_id in self.topological_order()? {
            let gate = &self.gates[gate_id];
            if let Some(missing) = gate.inputs.iter().find(|w| !known[w.0]) {
                return Err(Error::Incomplete(self.wire_name(*missing).into()));
            }

            let (bits, _) = self.gate_ports(&values, gate);
            let result = gate
                .evaluate(&bits)
                .map_err(|err| Error::Gate { gate: gate_id, err })?;

            for (&out, bit) in gate.outputs.iter().zip(result) {
                values.set(out.0, bit);
                known.set(out.0, true);
            }
        }

        if let Some(missing) = known.iter_zeros().next() {
            return Err(Error::Incomplete(self.wires[missing].name.clone()));
        }

        log::debug!(
            "evaluate: complete wires={} gates={}",
            self.num_wire(),
            self.gates.len()
        );
        Ok(values)
    }

    /// Output wire values of a full trace, in output declaration order.
    pub fn outputs_of(&self, trace: &BitSlice) -> Vec<bool> {
        self.output_wires.iter().map(|w| trace[w.0]).collect()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::{Gate, LookupTable, ReduceOp, WireId};

    fn adder_circuit() -> Circuit {
        // full adder built from a two-output LUT and a reduction
        let mut circuit = Circuit::default();
        let a = circuit.issue_input_wire("a");
        let b = circuit.issue_input_wire("b");
        let cin = circuit.issue_input_wire("cin");
        let carry_ab = circuit.issue_wire("carry_ab");
        let sum_ab = circuit.issue_wire("sum_ab");
        let carry_c = circuit.issue_wire("carry_c");
        let sum = circuit.issue_output_wire("sum");
        let cout = circuit.issue_output_wire("cout");

        let half = LookupTable::from_fn(2, 2, |x| vec![x[0] & x[1], x[0] ^ x[1]]).unwrap();
        circuit.add_gate(Gate::lut(half.clone(), vec![a, b], vec![carry_ab, sum_ab]));
        circuit.add_gate(Gate::lut(half, vec![sum_ab, cin], vec![carry_c, sum]));
        circuit.add_gate(Gate::reduce(ReduceOp::Or, vec![carry_ab, carry_c], cout));
        circuit
    }

    #[test]
    fn test_full_adder_truth() {
        let circuit = adder_circuit();
        circuit.check().unwrap();
        for n in 0..8u8 {
            let inputs = [n & 4 != 0, n & 2 != 0, n & 1 != 0];
            let trace = circuit.evaluate(&inputs).unwrap();
            let total = inputs.iter().filter(|b| **b).count();
            assert_eq!(
                circuit.outputs_of(&trace),
                vec![total % 2 == 1, total >= 2],
                "inputs {inputs:?}"
            );
        }
    }

    #[test]
    fn test_input_width_mismatch() {
        let circuit = adder_circuit();
        assert_eq!(
            circuit.evaluate(&[true]),
            Err(Error::InputWidth {
                expected: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn test_undriven_wire_is_incomplete() {
        let mut circuit = adder_circuit();
        let orphan = circuit.issue_wire("orphan");
        let extra = circuit.issue_output_wire("extra");
        circuit.add_gate(Gate::not(orphan, extra));
        assert_eq!(
            circuit.evaluate(&[true, false, true]),
            Err(Error::Incomplete("orphan".into()))
        );
    }

    #[test]
    fn test_out_of_range_wire_is_an_error() {
        let mut circuit = adder_circuit();
        let extra = circuit.issue_output_wire("extra");
        circuit.add_gate(Gate::not(WireId(99), extra));
        assert_eq!(
            circuit.evaluate(&[true, false, true]),
            Err(Error::Structure(CircuitError::UnknownWire {
                gate: 3,
                wire: WireId(99)
            }))
        );

        let mut circuit = adder_circuit();
        circuit.input_wires.push(WireId(42));
        assert_eq!(
            circuit.evaluate(&[true, false, true, false]),
            Err(Error::Structure(CircuitError::UnknownPort(WireId(42))))
        );
    }
}
