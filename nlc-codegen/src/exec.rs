//! Executable entries resolved from a finalized code library

use crate::inst::NativeInst;
use crate::library::LoweredFunction;
use nlc_common::{CompilerError, CompilerResult, NativeFnPtr, TempId};
use log::trace;
use std::collections::HashMap;

/// Largest argument count supported for native entries
pub const MAX_NATIVE_ARITY: usize = 4;

/// Something the host can call with `i64` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledEntry {
    /// Body lowered by the host, run by the evaluator below
    Lowered(LoweredFunction),
    /// Externally compiled body reached through the C ABI
    Native {
        symbol: String,
        ptr: NativeFnPtr,
        arity: usize,
    },
}

impl CompiledEntry {
    pub fn symbol(&self) -> &str {
        match self {
            CompiledEntry::Lowered(f) => &f.symbol,
            CompiledEntry::Native { symbol, .. } => symbol,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            CompiledEntry::Lowered(f) => f.arity,
            CompiledEntry::Native { arity, .. } => *arity,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, CompiledEntry::Native { .. })
    }

    pub fn call(&self, args: &[i64]) -> CompilerResult<i64> {
        if args.len() != self.arity() {
            return Err(CompilerError::execution(format!(
                "'{}' takes {} arguments, got {}",
                self.symbol(),
                self.arity(),
                args.len()
            )));
        }

        match self {
            CompiledEntry::Lowered(f) => evaluate(f, args),
            CompiledEntry::Native { symbol, ptr, .. } => call_native(symbol, *ptr, args),
        }
    }
}

fn evaluate(function: &LoweredFunction, args: &[i64]) -> CompilerResult<i64> {
    let mut temps: HashMap<TempId, i64> = HashMap::new();
    let read = |temps: &HashMap<TempId, i64>, t: TempId| {
        temps.get(&t).copied().ok_or_else(|| {
            CompilerError::execution(format!("'{}' reads undefined temporary %{}", function.symbol, t))
        })
    };

    for inst in &function.code {
        trace!("  exec {}", inst);
        match *inst {
            NativeInst::Const(t, v) => {
                temps.insert(t, v);
            }
            NativeInst::Arg(t, idx) => {
                let value = args.get(idx as usize).copied().ok_or_else(|| {
                    CompilerError::execution(format!("argument {} out of range", idx))
                })?;
                temps.insert(t, value);
            }
            NativeInst::Binary(op, d, a, b) => {
                let lhs = read(&temps, a)?;
                let rhs = read(&temps, b)?;
                let value = op.apply(lhs, rhs).ok_or_else(|| {
                    CompilerError::execution(format!("{} by zero in '{}'", op, function.symbol))
                })?;
                temps.insert(d, value);
            }
            NativeInst::Neg(d, s) => {
                let value = read(&temps, s)?.wrapping_neg();
                temps.insert(d, value);
            }
            NativeInst::Ret(t) => return read(&temps, t),
        }
    }

    Err(CompilerError::execution(format!(
        "'{}' fell off the end without returning",
        function.symbol
    )))
}

fn call_native(symbol: &str, ptr: NativeFnPtr, args: &[i64]) -> CompilerResult<i64> {
    type F0 = extern "C" fn() -> i64;
    type F1 = extern "C" fn(i64) -> i64;
    type F2 = extern "C" fn(i64, i64) -> i64;
    type F3 = extern "C" fn(i64, i64, i64) -> i64;
    type F4 = extern "C" fn(i64, i64, i64, i64) -> i64;

    if ptr.is_null() {
        return Err(CompilerError::execution(format!("'{}' resolved to a null pointer", symbol)));
    }
    let raw = ptr.addr() as *const ();

    // SAFETY: native symbols are registered by a native-function provider whose
    // contract is to hand out `extern "C"` functions taking and returning `i64`
    // with the arity of the descriptor they were compiled for.
    let result = unsafe {
        match args {
            &[] => std::mem::transmute::<*const (), F0>(raw)(),
            &[a] => std::mem::transmute::<*const (), F1>(raw)(a),
            &[a, b] => std::mem::transmute::<*const (), F2>(raw)(a, b),
            &[a, b, c] => std::mem::transmute::<*const (), F3>(raw)(a, b, c),
            &[a, b, c, d] => std::mem::transmute::<*const (), F4>(raw)(a, b, c, d),
            _ => {
                return Err(CompilerError::execution(format!(
                    "'{}': native calls support at most {} arguments",
                    symbol, MAX_NATIVE_ARITY
                )))
            }
        }
    };
    Ok(result)
}
