//! Kernels compiled ahead of time into the driver binary
//!
//! These stand in for an external native compiler: the driver's provider
//! hands out their addresses for functions with matching names and
//! arities.

use nlc_common::{BinOp, Bytecode, FunctionDescriptor, NativeFnPtr, Signature};
use nlc_lower::PrecompiledProvider;

extern "C" fn add(a: i64, b: i64) -> i64 {
    a.wrapping_add(b)
}

extern "C" fn sub(a: i64, b: i64) -> i64 {
    a.wrapping_sub(b)
}

extern "C" fn mul(a: i64, b: i64) -> i64 {
    a.wrapping_mul(b)
}

extern "C" fn square(x: i64) -> i64 {
    x.wrapping_mul(x)
}

extern "C" fn madd(a: i64, b: i64, c: i64) -> i64 {
    a.wrapping_mul(b).wrapping_add(c)
}

type Fn1 = extern "C" fn(i64) -> i64;
type Fn2 = extern "C" fn(i64, i64) -> i64;
type Fn3 = extern "C" fn(i64, i64, i64) -> i64;

pub fn provider() -> PrecompiledProvider {
    PrecompiledProvider::new()
        .with("add", NativeFnPtr(add as Fn2 as usize), 2)
        .with("sub", NativeFnPtr(sub as Fn2 as usize), 2)
        .with("mul", NativeFnPtr(mul as Fn2 as usize), 2)
        .with("square", NativeFnPtr(square as Fn1 as usize), 1)
        .with("madd", NativeFnPtr(madd as Fn3 as usize), 3)
}

/// Functions compiled by `nlc demo`, with the arguments to call them with
pub fn demo_functions() -> Vec<(FunctionDescriptor, Vec<i64>)> {
    vec![
        (
            FunctionDescriptor::new(
                "madd",
                Signature::new(["a", "b", "c"]),
                vec![
                    Bytecode::LoadArg(0),
                    Bytecode::LoadArg(1),
                    Bytecode::Binary(BinOp::Mul),
                    Bytecode::LoadArg(2),
                    Bytecode::Binary(BinOp::Add),
                    Bytecode::Return,
                ],
            ),
            vec![6, 7, 0],
        ),
        (
            FunctionDescriptor::new(
                "square",
                Signature::new(["x"]),
                vec![
                    Bytecode::LoadArg(0),
                    Bytecode::LoadArg(0),
                    Bytecode::Binary(BinOp::Mul),
                    Bytecode::Return,
                ],
            ),
            vec![12],
        ),
        // No precompiled body: always lowered by the host
        (
            FunctionDescriptor::new(
                "negdiff",
                Signature::new(["a", "b"]),
                vec![
                    Bytecode::LoadArg(0),
                    Bytecode::LoadArg(1),
                    Bytecode::Binary(BinOp::Sub),
                    Bytecode::Neg,
                    Bytecode::Return,
                ],
            ),
            vec![3, 10],
        ),
    ]
}
