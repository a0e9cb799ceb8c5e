//! Native-Lowering Compiler - Code Generation Library
//!
//! This crate is the code-generation side of the pipeline:
//!
//! - The native instruction set emitted by bytecode lowering
//! - Code modules and the code library that finalizes them
//! - The process-wide native symbol table
//! - Executable entries for lowered and externally compiled functions

pub mod inst;
pub mod library;
pub mod symbols;
pub mod exec;

pub use inst::NativeInst;
pub use library::{CodeLibrary, CodeModule, EnvironmentObject, LoweredFunction};
pub use symbols::NativeSymbolTable;
pub use exec::{CompiledEntry, MAX_NATIVE_ARITY};
