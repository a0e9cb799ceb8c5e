// Shared fixtures for lowering and pipeline tests

mod pipeline_tests;

use crate::settings::Settings;
use crate::state::CompilationState;
use nlc_codegen::NativeSymbolTable;
use nlc_common::{BinOp, Bytecode, FunctionDescriptor, NativeArtifact, NativeFnPtr, Signature};
use std::sync::Arc;

pub(crate) extern "C" fn native_add(a: i64, b: i64) -> i64 {
    a + b
}

pub(crate) extern "C" fn native_mul(a: i64, b: i64) -> i64 {
    a * b
}

pub(crate) fn ptr2(f: extern "C" fn(i64, i64) -> i64) -> NativeFnPtr {
    NativeFnPtr(f as usize)
}

/// `name(a, b) = a <op> b`
pub(crate) fn binary_fn(name: &str, op: BinOp) -> FunctionDescriptor {
    FunctionDescriptor::new(
        name,
        Signature::new(["a", "b"]),
        vec![
            Bytecode::LoadArg(0),
            Bytecode::LoadArg(1),
            Bytecode::Binary(op),
            Bytecode::Return,
        ],
    )
}

pub(crate) fn artifact_for(fndesc: &FunctionDescriptor, ptr: NativeFnPtr) -> NativeArtifact {
    NativeArtifact {
        function_pointer: ptr,
        symbol_name: fndesc.mangled_name(),
    }
}

/// State with a private symbol table so tests never share registrations
pub(crate) fn isolated_state(fndesc: FunctionDescriptor, use_mlir: bool) -> (CompilationState, Arc<NativeSymbolTable>) {
    let table = Arc::new(NativeSymbolTable::new());
    let settings = Settings::default().with_use_mlir(use_mlir);
    let state = CompilationState::with_symbols(fndesc, settings, Arc::clone(&table));
    (state, table)
}
