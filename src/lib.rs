//! Interactive zero-knowledge proof that a prover knows an input satisfying a
//! Boolean circuit, by cut-and-choose over garbled truth tables.

mod circuit;
mod core;
pub mod framing;
mod garbling;
mod params;
pub mod protocol;
pub mod session;

pub use crate::core::{
    gate::{Gate, GateError, GateKind, LookupTable, MAX_FAN_IN},
    gate_type::{GateType, ReduceOp},
    hash::EntryHash,
    wire::{Wire, WireId, WireRole, WireValues},
};

pub use circuit::{Circuit, CircuitError, EvalError};
pub use garbling::{
    ChallengeBit, Commitment, ExecutionReveal, GarbleError, GarblingEngine, NONCE_SIZE,
    PreparedCircuit, Reveal, RoundSecret, ScramblingReveal, TableCommitment, TableError,
    TruthTable, TruthTableEntry,
};
pub use params::ProtocolParams;
pub use protocol::{
    ProtocolError, Prover, ProverState, Rejection, RevealRequest, Verdict, Verifier,
    VerifierRound, VerifierState,
};
