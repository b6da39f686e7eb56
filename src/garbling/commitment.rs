use serde::{Deserialize, Serialize};

use crate::EntryHash;

/// Row digests of one scrambled table, in the table's committed order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCommitment(pub Vec<EntryHash>);

impl TableCommitment {
    pub fn contains(&self, hash: &EntryHash) -> bool {
        self.0.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What the prover publishes for one round before seeing the challenge.
///
/// Output bits are in cleartext: output wires always carry a zero key, so
/// their masked value equals their real value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub gates: Vec<TableCommitment>,
    pub outputs: Vec<bool>,
}
