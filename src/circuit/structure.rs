use std::collections::{HashMap, HashSet, VecDeque};

use bitvec::prelude::*;

use super::errors::CircuitError;
use crate::{Gate, Wire, WireId, WireRole, WireValues};

/// Flattened combinational netlist with named wires.
///
/// Input and output wires keep the order in which they were declared; that
/// order defines the positional layout of witness and output bit vectors.
#[derive(Clone, Debug, Default)]
pub struct Circuit {
    pub wires: Vec<Wire>,
    pub input_wires: Vec<WireId>,
    pub output_wires: Vec<WireId>,
    pub gates: Vec<Gate>,
}

impl Circuit {
    pub fn num_wire(&self) -> usize {
        self.wires.len()
    }

    pub fn issue_wire(&mut self, name: impl Into<String>) -> WireId {
        let new = WireId(self.wires.len());
        self.wires.push(Wire {
            name: name.into(),
            role: WireRole::Internal,
        });
        new
    }

    pub fn issue_input_wire(&mut self, name: impl Into<String>) -> WireId {
        let wire_id = self.issue_wire(name);
        self.wires[wire_id.0].role = WireRole::Input;
        self.input_wires.push(wire_id);
        wire_id
    }

    pub fn issue_output_wire(&mut self, name: impl Into<String>) -> WireId {
        let wire_id = self.issue_wire(name);
        self.make_wire_output(wire_id);
        wire_id
    }

    pub fn make_wire_output(&mut self, w: WireId) {
        if self.output_wires.contains(&w) {
            return;
        }
        if let Some(wire) = self.wires.get_mut(w.0) {
            if wire.role == WireRole::Internal {
                wire.role = WireRole::Output;
            }
        }
        self.output_wires.push(w);
    }

    pub fn add_gate(&mut self, gate: Gate) {
        self.gates.push(gate);
    }

    pub fn wire_name(&self, wire_id: WireId) -> &str {
        self.wires
            .get(wire_id.0)
            .map(|w| w.name.as_str())
            .unwrap_or("<unknown>")
    }

    pub fn wire_by_name(&self, name: &str) -> Option<WireId> {
        self.wires.iter().position(|w| w.name == name).map(WireId)
    }

    /// Validates the structural guarantees the proof engine relies on.
    pub fn check(&self) -> Result<(), CircuitError> {
        let mut names = HashSet::with_capacity(self.wires.len());
        for wire in &self.wires {
            if !names.insert(wire.name.as_str()) {
                return Err(CircuitError::DuplicateWireName(wire.name.clone()));
            }
        }

        self.check_references()?;

        let mut driven = bitvec![0; self.wires.len()];
        for gate in &self.gates {
            gate.check_arity()?;
            for &out in &gate.outputs {
                if driven[out.0] {
                    return Err(CircuitError::MultipleDrivers(self.wire_name(out).into()));
                }
                driven.set(out.0, true);
            }
        }

        for &input in &self.input_wires {
            if driven[input.0] {
                return Err(CircuitError::DrivenInput(self.wire_name(input).into()));
            }
            driven.set(input.0, true);
        }

        if let Some(undriven) = driven.iter_zeros().next() {
            return Err(CircuitError::Undriven(self.wires[undriven].name.clone()));
        }

        self.topological_order().map(|_| ())
    }

    /// Every port and gate wire must index into `wires`.
    pub(crate) fn check_references(&self) -> Result<(), CircuitError> {
        if let Some(&wire) = self
            .input_wires
            .iter()
            .chain(self.output_wires.iter())
            .find(|w| w.0 >= self.wires.len())
        {
            return Err(CircuitError::UnknownPort(wire));
        }

        for (gate_id, gate) in self.gates.iter().enumerate() {
            if let Some(&wire) = gate
                .inputs
                .iter()
                .chain(gate.outputs.iter())
                .find(|w| w.0 >= self.wires.len())
            {
                return Err(CircuitError::UnknownWire {
                    gate: gate_id,
                    wire,
                });
            }
        }
        Ok(())
    }

    /// Gate indices ordered so every gate follows the drivers of its inputs.
    pub fn topological_order(&self) -> Result<Vec<usize>, CircuitError> {
        let mut driver = HashMap::new();
        for (gate_id, gate) in self.gates.iter().enumerate() {
            for &out in &gate.outputs {
                driver.insert(out, gate_id);
            }
        }

        let mut pending = vec![0usize; self.gates.len()];
        let mut consumers: HashMap<usize, Vec<usize>> = HashMap::new();
        for (gate_id, gate) in self.gates.iter().enumerate() {
            for input in &gate.inputs {
                if let Some(&src) = driver.get(input) {
                    pending[gate_id] += 1;
                    consumers.entry(src).or_default().push(gate_id);
                }
            }
        }

        let mut ready = pending
            .iter()
            .enumerate()
            .filter(|(_, n)| **n == 0)
            .map(|(g, _)| g)
            .collect::<VecDeque<_>>();
        let mut order = Vec::with_capacity(self.gates.len());

        while let Some(gate_id) = ready.pop_front() {
            order.push(gate_id);
            for &next in consumers.get(&gate_id).into_iter().flatten() {
                pending[next] -= 1;
                if pending[next] == 0 {
                    ready.push_back(next);
                }
            }
        }

        if order.len() != self.gates.len() {
            return Err(CircuitError::Cycle);
        }
        Ok(order)
    }

    pub fn to_wire_values(&self, bits: &BitSlice) -> WireValues {
        self.wires
            .iter()
            .zip(bits.iter().by_vals())
            .map(|(wire, bit)| (wire.name.clone(), bit))
            .collect()
    }

    /// Maps a name-keyed assignment back onto wire indices. The map must
    /// contain exactly the circuit's wires.
    pub fn from_wire_values(&self, values: &WireValues) -> Result<BitVec, CircuitError> {
        if values.len() != self.wires.len() {
            return Err(CircuitError::WireSetMismatch(format!(
                "expected {} wires, got {}",
                self.wires.len(),
                values.len()
            )));
        }

        self.wires
            .iter()
            .map(|wire| {
                values.get(&wire.name).ok_or_else(|| {
                    CircuitError::WireSetMismatch(format!("missing wire {:?}", wire.name))
                })
            })
            .collect()
    }

    /// Collects the bits on a gate's input and output wires, in port order.
    pub fn gate_ports(&self, bits: &BitSlice, gate: &Gate) -> (Vec<bool>, Vec<bool>) {
        (
            gate.inputs.iter().map(|w| bits[w.0]).collect(),
            gate.outputs.iter().map(|w| bits[w.0]).collect(),
        )
    }
}
