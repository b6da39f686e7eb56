use std::{collections::HashMap, sync::Arc};

use bitvec::prelude::*;
use rand::{CryptoRng, Rng};
use zeroize::Zeroize;

use super::{
    Commitment, ExecutionReveal, GarbleError, Reveal, RoundSecret, ScramblingReveal, TruthTable,
};
use crate::{Circuit, GateKind};

/// A checked circuit together with the canonical truth table of every gate.
///
/// Immutable once built and shared by both parties. Gates with the same
/// function and shape share one table.
#[derive(Debug)]
pub struct PreparedCircuit {
    circuit: Circuit,
    tables: Vec<Arc<TruthTable>>,
}

impl PreparedCircuit {
    pub fn new(circuit: Circuit) -> Result<Self, GarbleError> {
        circuit.check()?;

        let mut cache: HashMap<(&GateKind, usize, usize), Arc<TruthTable>> = HashMap::new();
        let mut tables = Vec::with_capacity(circuit.gates.len());
        for (gate_id, gate) in circuit.gates.iter().enumerate() {
            let key = (&gate.kind, gate.inputs.len(), gate.outputs.len());
            let table = match cache.get(&key) {
                Some(table) => Arc::clone(table),
                None => {
                    let table = Arc::new(
                        TruthTable::build_canonical(gate)
                            .map_err(|err| GarbleError::CanonicalTable { gate: gate_id, err })?,
                    );
                    cache.insert(key, Arc::clone(&table));
                    table
                }
            };
            tables.push(table);
        }

        log::debug!(
            "prepare: wires={} gates={} distinct_tables={}",
            circuit.num_wire(),
            circuit.gates.len(),
            cache.len()
        );

        Ok(Self { circuit, tables })
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn canonical(&self, gate_id: usize) -> Option<&TruthTable> {
        self.tables.get(gate_id).map(Arc::as_ref)
    }

    fn check_shape(&self, commitment: &Commitment, revealed_gates: usize) -> Result<(), GarbleError> {
        let expected = self.circuit.gates.len();
        for actual in [commitment.gates.len(), revealed_gates] {
            if actual != expected {
                return Err(GarbleError::GateCountMismatch { expected, actual });
            }
        }
        let expected = self.circuit.output_wires.len();
        if commitment.outputs.len() != expected {
            return Err(GarbleError::OutputWidthMismatch {
                expected,
                actual: commitment.outputs.len(),
            });
        }
        Ok(())
    }

    /// Checks that the revealed rows were committed and that the masked
    /// trace runs through them consistently.
    ///
    /// `Ok(false)` means the proof round failed; `Err` means the reveal is
    /// malformed.
    pub fn validate_execution(
        &self,
        commitment: &Commitment,
        reveal: &ExecutionReveal,
    ) -> Result<bool, GarbleError> {
        self.check_shape(commitment, reveal.entries.len())?;

        for (gate_id, (committed, entry)) in commitment.gates.iter().zip(&reveal.entries).enumerate() {
            if !committed.contains(&entry.commitment()) {
                log::debug!("validate_execution: gate[{gate_id}] row was not committed");
                return Ok(false);
            }
        }

        let masked = self.circuit.from_wire_values(&reveal.trace)?;

        let outputs = self.circuit.outputs_of(&masked);
        if outputs != commitment.outputs {
            log::debug!("validate_execution: masked outputs differ from committed outputs");
            return Ok(false);
        }

        for (gate_id, (gate, entry)) in self.circuit.gates.iter().zip(&reveal.entries).enumerate() {
            let (inputs, outputs) = self.circuit.gate_ports(&masked, gate);
            if !entry.verify_row_matches(&inputs, &outputs)? {
                log::debug!("validate_execution: gate[{gate_id}] row disagrees with trace");
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Checks that the revealed tables are the committed ones and that each is
    /// a masked, shuffled copy of its gate's canonical table.
    pub fn validate_scrambling(
        &self,
        commitment: &Commitment,
        reveal: &ScramblingReveal,
    ) -> Result<bool, GarbleError> {
        self.check_shape(commitment, reveal.tables.len())?;

        for (gate_id, (committed, table)) in commitment.gates.iter().zip(&reveal.tables).enumerate() {
            if table.commitment() != *committed {
                log::debug!("validate_scrambling: gate[{gate_id}] table commitment mismatch");
                return Ok(false);
            }
        }

        let keys = self.circuit.from_wire_values(&reveal.keys)?;

        if let Some(&wire) = self.circuit.output_wires.iter().find(|w| keys[w.0]) {
            log::debug!(
                "validate_scrambling: output wire {:?} has a non-zero key",
                self.circuit.wire_name(wire)
            );
            return Ok(false);
        }

        for (gate_id, (gate, table)) in self.circuit.gates.iter().zip(&reveal.tables).enumerate() {
            let canonical = &self.tables[gate_id];
            if table.len() != canonical.len() || table.duplicate_row().is_some() {
                log::debug!("validate_scrambling: gate[{gate_id}] table has the wrong rows");
                return Ok(false);
            }

            let (input_keys, output_keys) = self.circuit.gate_ports(&keys, gate);
            for entry in &table.entries {
                if !canonical.contains_masked_entry(entry, &input_keys, &output_keys)? {
                    log::debug!("validate_scrambling: gate[{gate_id}] row is not a relabeling");
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }

    pub fn validate_precommitment(
        &self,
        commitment: &Commitment,
        reveal: &Reveal,
    ) -> Result<bool, GarbleError> {
        match reveal {
            Reveal::Execution(exec) => self.validate_execution(commitment, exec),
            Reveal::Scrambling(scr) => self.validate_scrambling(commitment, scr),
        }
    }
}

/// Keys and scrambled tables of the round in progress.
struct RoundState {
    keys: BitVec,
    tables: Vec<TruthTable>,
}

impl Drop for RoundState {
    fn drop(&mut self) {
        self.keys.fill(false);
        self.tables.zeroize();
    }
}

/// Prover-side garbling state for one circuit.
///
/// Owns the random source used for every key, nonce and shuffle. The
/// execution trace lives until [`GarblingEngine::forget_witness`] or drop;
/// round state lives until [`GarblingEngine::take_round_secret`] or the next
/// round.
pub struct GarblingEngine<R> {
    prepared: Arc<PreparedCircuit>,
    rng: R,
    trace: Option<BitVec>,
    round: Option<RoundState>,
}

impl<R: CryptoRng> GarblingEngine<R> {
    pub fn new(prepared: Arc<PreparedCircuit>, rng: R) -> Self {
        Self {
            prepared,
            rng,
            trace: None,
            round: None,
        }
    }

    pub fn prepared(&self) -> &Arc<PreparedCircuit> {
        &self.prepared
    }

    /// Evaluates the circuit on `inputs`, keeps the full trace and returns
    /// the output bits.
    pub fn execute(&mut self, inputs: &[bool]) -> Result<Vec<bool>, GarbleError> {
        let circuit = self.prepared.circuit();
        let trace = circuit.evaluate(inputs)?;
        let outputs = circuit.outputs_of(&trace);

        self.round = None;
        if let Some(mut old) = self.trace.replace(trace) {
            old.fill(false);
        }
        Ok(outputs)
    }

    pub fn create_proof_round(&mut self) -> Result<Commitment, GarbleError> {
        let prepared = Arc::clone(&self.prepared);
        let circuit = prepared.circuit();
        let trace = self.trace.as_ref().ok_or(GarbleError::NotExecuted)?;

        let rng = &mut self.rng;
        let mut keys = (0..circuit.num_wire())
            .map(|_| rng.random::<bool>())
            .collect::<BitVec>();
        for w in &circuit.output_wires {
            keys.set(w.0, false);
        }

        let mut tables = Vec::with_capacity(circuit.gates.len());
        let mut gates = Vec::with_capacity(circuit.gates.len());
        for (gate_id, gate) in circuit.gates.iter().enumerate() {
            let (input_keys, output_keys) = circuit.gate_ports(&keys, gate);
            let mut table = prepared.tables[gate_id].as_ref().clone();
            table.scramble(rng, &input_keys, &output_keys)?;
            gates.push(table.commitment());
            tables.push(table);
        }

        let outputs = circuit.outputs_of(trace);
        self.round = Some(RoundState { keys, tables });

        log::debug!("garble: round committed gates={}", gates.len());
        Ok(Commitment { gates, outputs })
    }

    fn masked_trace(&self) -> Result<BitVec, GarbleError> {
        let trace = self.trace.as_ref().ok_or(GarbleError::NotExecuted)?;
        let round = self.round.as_ref().ok_or(GarbleError::NoActiveRound)?;
        Ok(trace
            .iter()
            .by_vals()
            .zip(round.keys.iter().by_vals())
            .map(|(value, key)| value ^ key)
            .collect())
    }

    pub fn reveal_execution(&self) -> Result<ExecutionReveal, GarbleError> {
        let circuit = self.prepared.circuit();
        let round = self.round.as_ref().ok_or(GarbleError::NoActiveRound)?;
        let mut masked = self.masked_trace()?;

        let entries = circuit
            .gates
            .iter()
            .zip(&round.tables)
            .enumerate()
            .map(|(gate_id, (gate, table))| {
                let (inputs, outputs) = circuit.gate_ports(&masked, gate);
                let mut matching = table.entries.iter().filter(|e| e.inputs == inputs);
                let entry = matching
                    .next()
                    .ok_or(GarbleError::NoMatchingRow { gate: gate_id })?;
                let extra = matching.count();
                if extra > 0 {
                    return Err(GarbleError::AmbiguousRow {
                        gate: gate_id,
                        count: extra + 1,
                    });
                }
                if entry.outputs != outputs {
                    log::error!("reveal_execution: gate[{gate_id}] row disagrees with trace");
                    return Err(GarbleError::TraceMismatch { gate: gate_id });
                }
                Ok(entry.clone())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let trace = circuit.to_wire_values(&masked);
        masked.fill(false);
        Ok(ExecutionReveal { trace, entries })
    }

    pub fn reveal_scrambling(&self) -> Result<ScramblingReveal, GarbleError> {
        let round = self.round.as_ref().ok_or(GarbleError::NoActiveRound)?;
        Ok(ScramblingReveal {
            keys: self.prepared.circuit().to_wire_values(&round.keys),
            tables: round.tables.clone(),
        })
    }

    /// Packages both openings of the current round and wipes the round state.
    pub fn take_round_secret(&mut self) -> Result<RoundSecret, GarbleError> {
        let execution = self.reveal_execution()?;
        let scrambling = self.reveal_scrambling()?;
        self.round = None;
        Ok(RoundSecret::new(execution, scrambling))
    }

    pub fn forget_witness(&mut self) {
        self.round = None;
        if let Some(mut trace) = self.trace.take() {
            trace.fill(false);
        }
    }
}

impl<R> Drop for GarblingEngine<R> {
    fn drop(&mut self) {
        if let Some(trace) = self.trace.as_mut() {
            trace.fill(false);
        }
    }
}
