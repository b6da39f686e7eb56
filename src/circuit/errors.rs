use crate::{GateError, WireId};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CircuitError {
    #[error("Gate error: {0}")]
    Gate(#[from] GateError),
    #[error("Wire name {0:?} is used more than once")]
    DuplicateWireName(String),
    #[error("Gate {gate} references wire {wire} outside the circuit")]
    UnknownWire { gate: usize, wire: WireId },
    #[error("Port wire {0} is outside the circuit")]
    UnknownPort(WireId),
    #[error("Wire {0:?} is driven by more than one gate")]
    MultipleDrivers(String),
    #[error("Input wire {0:?} is driven by a gate")]
    DrivenInput(String),
    #[error("Wire {0:?} is neither an input nor driven by a gate")]
    Undriven(String),
    #[error("Circuit contains a combinational cycle")]
    Cycle,
    #[error("Wire value map does not match the circuit: {0}")]
    WireSetMismatch(String),
}
