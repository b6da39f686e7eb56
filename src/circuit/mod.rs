//! # Circuit Model
//!
//! A flattened combinational netlist: named wires partitioned into inputs,
//! internal wires and outputs, plus gates that connect them.
//!
//! ```text
//! ┌─────────────┐    check()     ┌──────────────────┐   evaluate(witness)   ┌──────────────┐
//! │   Circuit   │───────────────▶│ validated netlist│──────────────────────▶│  full trace  │
//! │ Construction│                │ (acyclic, driven)│                       │ (one bit per │
//! └─────────────┘                └──────────────────┘                       │    wire)     │
//!                                                                           └──────────────┘
//! ```
//!
//! Parsing hardware descriptions into this form happens outside the crate.
//! [`Circuit::check`] enforces what the proof engine assumes: unique wire
//! names, a single driver per wire, no driven inputs and no cycles.

pub mod errors;
pub mod evaluation;
pub mod structure;

pub use errors::CircuitError;
pub use evaluation::EvalError;
pub use structure::Circuit;
