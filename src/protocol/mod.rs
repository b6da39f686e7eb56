//! Multi-round orchestration of the proof.
//!
//! ```text
//!   Prover                                   Verifier
//!   bind_witness(x, y)                       bind_output(y)
//!   commit()           ── Commitment × N ──▶ receive_commitments()
//!   reveal(request)    ◀── RevealRequest ──
//!                      ──── Reveal × N ────▶ validate() -> Verdict
//! ```
//!
//! A failed round is an ordinary outcome ([`Verdict::NotProven`]); malformed
//! or out-of-order input is a [`ProtocolError`].

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod prover;
pub mod verifier;

pub use prover::{Prover, ProverState, disclose_all};
pub use verifier::{Verifier, VerifierState};

use crate::{ChallengeBit, Commitment, GarbleError};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Garbling error: {0}")]
    Garble(#[from] GarbleError),
    #[error("Witness does not produce the claimed output")]
    WitnessRejected,
    #[error("Expected {expected} round(s), got {actual}")]
    RoundCountMismatch { expected: usize, actual: usize },
    #[error("Expected {expected} output bit(s), got {actual}")]
    OutputShapeMismatch { expected: usize, actual: usize },
    #[error("Round {round}: reveal does not answer the issued challenge")]
    ChallengeMismatch { round: usize },
    #[error("Round secrets have already been revealed")]
    SecretCleared,
    #[error("A reveal request is still unresolved")]
    RequestPending,
    #[error("Operation out of order: {0}")]
    InvalidState(&'static str),
    #[error("Security parameter must be at least 1")]
    InvalidSecurityParam,
}

/// Why a proof attempt was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("proof round {round} failed validation")]
    ProofRoundFailed { round: usize },
    #[error("validated {validated} round(s), {required} required")]
    InsufficientRounds { validated: usize, required: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Every round validated; a cheating prover passes with probability at
    /// most `2^-confidence`.
    Proven { confidence: usize },
    NotProven(Rejection),
}

impl Verdict {
    pub fn is_proven(&self) -> bool {
        matches!(self, Verdict::Proven { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Proven { confidence } => write!(f, "proven with confidence 2^-{confidence}"),
            Verdict::NotProven(reason) => write!(f, "not proven: {reason}"),
        }
    }
}

/// What the verifier keeps for one round between issuing the request and
/// receiving the reveal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierRound {
    pub commitment: Commitment,
    pub challenge: ChallengeBit,
}

/// One challenge per round, in round order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealRequest {
    pub challenges: Vec<ChallengeBit>,
}

impl RevealRequest {
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}
