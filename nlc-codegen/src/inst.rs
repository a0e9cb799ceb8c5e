//! Native instruction set produced by instruction-by-instruction lowering

use nlc_common::{BinOp, TempId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-address native instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NativeInst {
    /// Load an immediate into a temporary
    Const(TempId, i64),
    /// Copy an incoming argument into a temporary
    Arg(TempId, u16),
    /// dest = lhs <op> rhs
    Binary(BinOp, TempId, TempId, TempId),
    /// dest = -src
    Neg(TempId, TempId),
    /// Return the value of a temporary
    Ret(TempId),
}

impl fmt::Display for NativeInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeInst::Const(t, v) => write!(f, "%{} = const {}", t, v),
            NativeInst::Arg(t, i) => write!(f, "%{} = arg {}", t, i),
            NativeInst::Binary(op, d, a, b) => write!(f, "%{} = {} %{}, %{}", d, op, a, b),
            NativeInst::Neg(d, s) => write!(f, "%{} = neg %{}", d, s),
            NativeInst::Ret(t) => write!(f, "ret %{}", t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(NativeInst::Const(0, 42).to_string(), "%0 = const 42");
        assert_eq!(NativeInst::Binary(BinOp::Add, 2, 0, 1).to_string(), "%2 = add %0, %1");
        assert_eq!(NativeInst::Ret(2).to_string(), "ret %2");
    }
}
