//! Native-Lowering Compiler - Common Types and Utilities
//!
//! This crate contains shared types, error definitions, and utilities
//! used across all components of the native-lowering compiler.

pub mod error;
pub mod types;

pub use error::{CompilerError, CompilerResult};
pub use types::*;
