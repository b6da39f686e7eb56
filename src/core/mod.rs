pub mod gate;
pub mod gate_type;
pub mod hash;
pub mod wire;
