use std::fmt;

use serde::{Deserialize, Serialize};

/// 32-byte BLAKE3 digest binding one truth-table row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryHash(pub [u8; 32]);

impl EntryHash {
    /// Lowercase hex, as printed by `blake3::Hash`.
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().as_str().to_owned()
    }
}

impl From<blake3::Hash> for EntryHash {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Debug for EntryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryHash({})", self.to_hex())
    }
}
