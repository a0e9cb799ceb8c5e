//! Common types used throughout the compiler
//!
//! This module defines data types that are shared across multiple
//! compiler phases: the function descriptor and its bytecode, the
//! per-request metadata mapping, and the native artifact handed over by
//! an external native-function provider.

use crate::error::{CompilerError, CompilerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Temporary variable identifier for lowered code
pub type TempId = u32;

/// Metadata key holding the native function pointer
pub const NATIVE_FUNC_PTR_KEY: &str = "native_func_ptr";

/// Metadata key holding the native symbol name
pub const NATIVE_FUNC_NAME_KEY: &str = "native_func_name";

/// Binary operators understood by the host bytecode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    /// Evaluate with wrapping semantics; division by zero is an error
    pub fn apply(self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            BinOp::Add => Some(lhs.wrapping_add(rhs)),
            BinOp::Sub => Some(lhs.wrapping_sub(rhs)),
            BinOp::Mul => Some(lhs.wrapping_mul(rhs)),
            BinOp::Div => lhs.checked_div(rhs),
            BinOp::Rem => lhs.checked_rem(rhs),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::Rem => "rem",
        };
        write!(f, "{}", s)
    }
}

/// Stack bytecode of the host language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bytecode {
    /// Push a constant
    LoadConst(i64),
    /// Push the argument at the given index
    LoadArg(u16),
    /// Pop two values, push the result
    Binary(BinOp),
    /// Negate the top of stack
    Neg,
    /// Return the top of stack
    Return,
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bytecode::LoadConst(v) => write!(f, "LOAD_CONST {}", v),
            Bytecode::LoadArg(i) => write!(f, "LOAD_ARG {}", i),
            Bytecode::Binary(op) => write!(f, "BINARY_{}", op.to_string().to_uppercase()),
            Bytecode::Neg => write!(f, "UNARY_NEG"),
            Bytecode::Return => write!(f, "RETURN"),
        }
    }
}

/// Type signature of a compiled function; every value is an `i64`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signature {
    pub args: Vec<String>,
}

impl Signature {
    pub fn new<S: Into<String>>(args: impl IntoIterator<Item = S>) -> Self {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

/// Function descriptor produced by the earlier pipeline stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    /// Fully qualified name, defaults to `name` when absent from input files
    #[serde(default)]
    pub qualified_name: String,
    pub signature: Signature,
    pub bytecode: Vec<Bytecode>,
}

impl FunctionDescriptor {
    pub fn new(name: &str, signature: Signature, bytecode: Vec<Bytecode>) -> Self {
        Self {
            name: name.to_string(),
            qualified_name: name.to_string(),
            signature,
            bytecode,
        }
    }

    /// Name used in diagnostics; falls back to the short name
    pub fn display_name(&self) -> &str {
        if self.qualified_name.is_empty() {
            &self.name
        } else {
            &self.qualified_name
        }
    }

    /// Linker-visible symbol of the function body
    pub fn mangled_name(&self) -> String {
        let qualified = self.display_name().replace('.', "$");
        format!("_nlc_{}_{}", qualified, self.signature.arity())
    }

    /// Symbol of the per-function environment object
    pub fn env_name(&self) -> String {
        format!("_nlc_env_{}", self.display_name().replace('.', "$"))
    }
}

/// Address of a native function, kept as a plain integer so it can travel
/// through metadata and serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeFnPtr(pub usize);

impl NativeFnPtr {
    pub fn addr(self) -> usize {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NativeFnPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Pre-compiled function pointer plus its linker-visible symbol name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeArtifact {
    pub function_pointer: NativeFnPtr,
    pub symbol_name: String,
}

/// Values stored in request metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataValue {
    Pointer(usize),
    Str(String),
    Int(i64),
    Bool(bool),
}

/// String-keyed metadata attached to one compilation request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    entries: BTreeMap<String, MetadataValue>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetadataValue) -> Option<MetadataValue> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Store a native artifact under the well-known keys
    pub fn insert_native_artifact(&mut self, artifact: NativeArtifact) {
        self.insert(
            NATIVE_FUNC_PTR_KEY,
            MetadataValue::Pointer(artifact.function_pointer.addr()),
        );
        self.insert(NATIVE_FUNC_NAME_KEY, MetadataValue::Str(artifact.symbol_name));
    }

    pub fn has_native_artifact(&self) -> bool {
        self.contains_key(NATIVE_FUNC_PTR_KEY) && self.contains_key(NATIVE_FUNC_NAME_KEY)
    }

    /// Remove and return the native artifact.
    ///
    /// Both keys are validated before either is removed, so a failed take
    /// leaves the metadata untouched.
    pub fn take_native_artifact(&mut self, function: &str) -> CompilerResult<NativeArtifact> {
        let function_pointer = match self.get(NATIVE_FUNC_PTR_KEY) {
            Some(MetadataValue::Pointer(addr)) => NativeFnPtr(*addr),
            Some(other) => {
                return Err(CompilerError::Internal {
                    message: format!("metadata key '{}' holds {:?}, expected a pointer", NATIVE_FUNC_PTR_KEY, other),
                })
            }
            None => return Err(CompilerError::missing_artifact(function, NATIVE_FUNC_PTR_KEY)),
        };
        let symbol_name = match self.get(NATIVE_FUNC_NAME_KEY) {
            Some(MetadataValue::Str(name)) => name.clone(),
            Some(other) => {
                return Err(CompilerError::Internal {
                    message: format!("metadata key '{}' holds {:?}, expected a string", NATIVE_FUNC_NAME_KEY, other),
                })
            }
            None => return Err(CompilerError::missing_artifact(function, NATIVE_FUNC_NAME_KEY)),
        };

        self.remove(NATIVE_FUNC_PTR_KEY);
        self.remove(NATIVE_FUNC_NAME_KEY);

        Ok(NativeArtifact {
            function_pointer,
            symbol_name,
        })
    }
}
