use serde::{Deserialize, Serialize};

/// Two-input, single-output Boolean functions.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateType {
    And = 0,
    Nand = 1,
    Nimp = 2,
    Imp = 3, // a => b
    Ncimp = 4,
    Cimp = 5, // b => a
    Nor = 6,
    Or = 7,
    Xor,
    Xnor,
}

impl GateType {
    pub const fn f(&self) -> fn(bool, bool) -> bool {
        match self {
            GateType::And => |a, b| a & b,
            GateType::Nand => |a, b| !(a & b),

            GateType::Nimp => |a, b| a & !b,
            GateType::Imp => |a, b| !a | b,

            GateType::Ncimp => |a, b| !a & b,
            GateType::Cimp => |a, b| !b | a,

            GateType::Nor => |a, b| !(a | b),
            GateType::Or => |a, b| a | b,

            GateType::Xor => |a, b| a ^ b,
            GateType::Xnor => |a, b| !(a ^ b),
        }
    }
}

/// Associative operators folded over an arbitrary number of inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReduceOp {
    And,
    Or,
    Xor,
}

impl ReduceOp {
    pub fn fold(&self, bits: &[bool]) -> bool {
        match self {
            ReduceOp::And => bits.iter().all(|b| *b),
            ReduceOp::Or => bits.iter().any(|b| *b),
            ReduceOp::Xor => bits.iter().fold(false, |acc, b| acc ^ b),
        }
    }
}
