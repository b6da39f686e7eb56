//! # Garbled truth tables
//!
//! Each round the prover masks every wire with a fresh random key bit and
//! publishes, per gate, the digests of that gate's truth table after masking
//! and shuffling. Output wires always get key `0`.
//!
//! ```text
//! canonical table ──scramble(keys, rng)──▶ scrambled table ──commitment()──▶ Commitment
//!                                               │
//!                     ┌─────────────────────────┴───────────────────────┐
//!                     ▼                                                 ▼
//!            ExecutionReveal                                   ScramblingReveal
//!     masked trace + one row per gate                    all keys + all scrambled tables
//!   (the trace is a real evaluation)            (the tables are relabelings of the real gates)
//! ```
//!
//! The verifier sees exactly one of the two reveals per round. A prover
//! without a witness can prepare a round that survives at most one of them,
//! so each round halves the chance of cheating undetected.

pub mod commitment;
pub mod engine;
pub mod reveal;
pub mod truth_table;

pub use commitment::{Commitment, TableCommitment};
pub use engine::{GarblingEngine, PreparedCircuit};
pub use reveal::{ChallengeBit, ExecutionReveal, Reveal, RoundSecret, ScramblingReveal};
pub use truth_table::{NONCE_SIZE, TableError, TruthTable, TruthTableEntry};

use crate::{CircuitError, EvalError};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GarbleError {
    #[error("Circuit error: {0}")]
    Circuit(#[from] CircuitError),
    #[error("Evaluation failed: {0}")]
    Eval(#[from] EvalError),
    #[error("Truth table error: {0}")]
    Table(#[from] TableError),
    #[error("Canonical table for gate {gate} failed: {err}")]
    CanonicalTable { gate: usize, err: TableError },
    #[error("No execution trace: call execute() first")]
    NotExecuted,
    #[error("No proof round in progress")]
    NoActiveRound,
    #[error("Gate {gate}: no scrambled row matches the masked trace")]
    NoMatchingRow { gate: usize },
    #[error("Gate {gate}: {count} scrambled rows match the masked trace")]
    AmbiguousRow { gate: usize, count: usize },
    #[error("Gate {gate}: scrambled row disagrees with the execution trace")]
    TraceMismatch { gate: usize },
    #[error("Expected {expected} gate(s), got {actual}")]
    GateCountMismatch { expected: usize, actual: usize },
    #[error("Expected {expected} output bit(s), got {actual}")]
    OutputWidthMismatch { expected: usize, actual: usize },
    #[error("Round secret has already been disclosed")]
    SecretCleared,
}
