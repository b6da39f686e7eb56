use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::{GarbleError, truth_table::{TruthTable, TruthTableEntry}};
use crate::WireValues;

/// Which half of a round secret the verifier asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeBit {
    Execution,
    Scrambling,
}

impl From<bool> for ChallengeBit {
    fn from(scrambling: bool) -> Self {
        if scrambling {
            ChallengeBit::Scrambling
        } else {
            ChallengeBit::Execution
        }
    }
}

/// Masked trace plus the single matching scrambled row of every gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct ExecutionReveal {
    pub trace: WireValues,
    pub entries: Vec<TruthTableEntry>,
}

/// Every wire key plus every gate's full scrambled table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct ScramblingReveal {
    pub keys: WireValues,
    pub tables: Vec<TruthTable>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reveal {
    Execution(ExecutionReveal),
    Scrambling(ScramblingReveal),
}

impl Reveal {
    pub fn challenge(&self) -> ChallengeBit {
        match self {
            Reveal::Execution(_) => ChallengeBit::Execution,
            Reveal::Scrambling(_) => ChallengeBit::Scrambling,
        }
    }
}

/// Both possible openings of one round, held by the prover until the
/// challenge arrives.
///
/// [`RoundSecret::disclose`] consumes the secret; the half that is not
/// disclosed is zeroed when the secret is dropped.
#[derive(Serialize, Deserialize, Zeroize)]
pub struct RoundSecret {
    execution: Option<ExecutionReveal>,
    scrambling: Option<ScramblingReveal>,
}

impl RoundSecret {
    pub(crate) fn new(execution: ExecutionReveal, scrambling: ScramblingReveal) -> Self {
        Self {
            execution: Some(execution),
            scrambling: Some(scrambling),
        }
    }

    pub fn execution(&self) -> Option<&ExecutionReveal> {
        self.execution.as_ref()
    }

    pub fn scrambling(&self) -> Option<&ScramblingReveal> {
        self.scrambling.as_ref()
    }

    pub fn disclose(mut self, challenge: ChallengeBit) -> Result<Reveal, GarbleError> {
        let reveal = match challenge {
            ChallengeBit::Execution => self.execution.take().map(Reveal::Execution),
            ChallengeBit::Scrambling => self.scrambling.take().map(Reveal::Scrambling),
        };
        reveal.ok_or(GarbleError::SecretCleared)
    }
}

impl Drop for RoundSecret {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for RoundSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundSecret")
            .field("execution", &self.execution.is_some())
            .field("scrambling", &self.scrambling.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> RoundSecret {
        let mut trace = WireValues::new();
        trace.insert("a", true);
        let mut keys = WireValues::new();
        keys.insert("a", false);
        RoundSecret::new(
            ExecutionReveal {
                trace,
                entries: vec![],
            },
            ScramblingReveal {
                keys,
                tables: vec![TruthTable::default()],
            },
        )
    }

    #[test]
    fn test_disclose_returns_requested_half() {
        let reveal = secret().disclose(ChallengeBit::Scrambling).unwrap();
        assert_eq!(reveal.challenge(), ChallengeBit::Scrambling);

        let reveal = secret().disclose(ChallengeBit::Execution).unwrap();
        match reveal {
            Reveal::Execution(exec) => assert_eq!(exec.trace.get("a"), Some(true)),
            Reveal::Scrambling(_) => panic!("wrong half disclosed"),
        }
    }

    #[test]
    fn test_cleared_half_cannot_be_disclosed() {
        let mut s = secret();
        s.scrambling.zeroize();
        assert!(s.scrambling().is_none());
        assert!(matches!(
            s.disclose(ChallengeBit::Scrambling),
            Err(GarbleError::SecretCleared)
        ));
    }

    #[test]
    fn test_serialized_secret_survives_restore() {
        let bytes = bincode::serialize(&secret()).unwrap();
        let restored: RoundSecret = bincode::deserialize(&bytes).unwrap();
        assert!(restored.execution().is_some());
        assert!(restored.scrambling().is_some());
        assert_eq!(
            format!("{restored:?}"),
            "RoundSecret { execution: true, scrambling: true }"
        );
    }
}
