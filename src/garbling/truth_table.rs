use std::collections::HashSet;

use rand::{CryptoRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::commitment::TableCommitment;
use crate::{
    EntryHash, Gate, GateError,
    core::gate::{MAX_FAN_IN, row_bits},
};

pub const NONCE_SIZE: usize = 16;

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Gate has {fan_in} inputs; truth tables are limited to {MAX_FAN_IN}")]
    GateTooLarge { fan_in: usize },
    #[error("Truth table has two rows for input {row:?}")]
    DuplicateRow { row: Vec<bool> },
    #[error("{what} width mismatch: expected {expected}, got {actual}")]
    WidthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Gate function failed: {0}")]
    Gate(#[from] GateError),
}
pub type TableError = Error;

fn check_width(what: &'static str, expected: usize, actual: usize) -> Result<(), Error> {
    if expected != actual {
        return Err(Error::WidthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

fn xor_bits(bits: &[bool], keys: &[bool]) -> Vec<bool> {
    bits.iter().zip(keys).map(|(b, k)| b ^ k).collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct TruthTableEntry {
    pub inputs: Vec<bool>,
    pub outputs: Vec<bool>,
    pub nonce: [u8; NONCE_SIZE],
}

impl TruthTableEntry {
    /// Binding, hiding digest of the row. Widths are length-prefixed so rows
    /// of different shapes never share an encoding.
    pub fn commitment(&self) -> EntryHash {
        let mut hasher = blake3::Hasher::new();
        for bits in [&self.inputs, &self.outputs] {
            hasher.update(&(bits.len() as u64).to_le_bytes());
            hasher.update(&bits.iter().map(|b| u8::from(*b)).collect::<Vec<u8>>());
        }
        hasher.update(&self.nonce);
        hasher.finalize().into()
    }

    /// Exact comparison against expected port values. Mismatched widths
    /// indicate a caller bug, not a failed proof.
    pub fn verify_row_matches(&self, inputs: &[bool], outputs: &[bool]) -> Result<bool, Error> {
        check_width("row input", self.inputs.len(), inputs.len())?;
        check_width("row output", self.outputs.len(), outputs.len())?;
        Ok(self.inputs == inputs && self.outputs == outputs)
    }

    fn mask(&mut self, input_keys: &[bool], output_keys: &[bool]) {
        self.inputs = xor_bits(&self.inputs, input_keys);
        self.outputs = xor_bits(&self.outputs, output_keys);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct TruthTable {
    pub entries: Vec<TruthTableEntry>,
}

impl TruthTable {
    /// Enumerates every input combination of `gate` in ascending order.
    pub fn build_canonical(gate: &Gate) -> Result<Self, Error> {
        let fan_in = gate.fan_in();
        if fan_in > MAX_FAN_IN {
            return Err(Error::GateTooLarge { fan_in });
        }

        let entries = (0..1usize << fan_in)
            .map(|index| {
                let inputs = row_bits(index, fan_in);
                let outputs = gate.evaluate(&inputs)?;
                Ok(TruthTableEntry {
                    inputs,
                    outputs,
                    nonce: [0u8; NONCE_SIZE],
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let table = Self { entries };
        if let Some(row) = table.duplicate_row() {
            return Err(Error::DuplicateRow { row });
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First input vector that occurs more than once, if any.
    pub fn duplicate_row(&self) -> Option<Vec<bool>> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        self.entries
            .iter()
            .find(|e| !seen.insert(e.inputs.as_slice()))
            .map(|e| e.inputs.clone())
    }

    /// Masks every row with the same key vectors, draws a fresh nonce per
    /// row and shuffles the rows.
    pub fn scramble<R: CryptoRng + ?Sized>(
        &mut self,
        rng: &mut R,
        input_keys: &[bool],
        output_keys: &[bool],
    ) -> Result<(), Error> {
        for entry in &mut self.entries {
            check_width("input key", entry.inputs.len(), input_keys.len())?;
            check_width("output key", entry.outputs.len(), output_keys.len())?;
            entry.mask(input_keys, output_keys);
            rng.fill_bytes(&mut entry.nonce);
        }
        self.entries.shuffle(rng);
        Ok(())
    }

    /// Row commitments in the table's current order.
    pub fn commitment(&self) -> TableCommitment {
        TableCommitment(self.entries.iter().map(TruthTableEntry::commitment).collect())
    }

    /// Whether `entry`, unmasked with the given keys, is a row of this table.
    ///
    /// `self` must be in canonical order; rows are located by binary search
    /// on the input vector read as a big-endian number.
    pub fn contains_masked_entry(
        &self,
        entry: &TruthTableEntry,
        input_keys: &[bool],
        output_keys: &[bool],
    ) -> Result<bool, Error> {
        check_width("input key", entry.inputs.len(), input_keys.len())?;
        check_width("output key", entry.outputs.len(), output_keys.len())?;

        let inputs = xor_bits(&entry.inputs, input_keys);
        let outputs = xor_bits(&entry.outputs, output_keys);

        match self
            .entries
            .binary_search_by(|row| row.inputs.as_slice().cmp(inputs.as_slice()))
        {
            Ok(index) => self.entries[index].verify_row_matches(&inputs, &outputs),
            Err(_) => Ok(false),
        }
    }
}
