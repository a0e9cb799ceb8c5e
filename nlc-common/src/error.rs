//! Error handling for the native-lowering compiler
//!
//! This module defines the error taxonomy shared by every pipeline stage.

use thiserror::Error;

/// Result alias used throughout the compiler
pub type CompilerResult<T> = Result<T, CompilerError>;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    /// The native artifact was expected in the request metadata but is gone.
    /// This is a pipeline contract violation, never a user error.
    #[error("Missing native artifact for '{function}': metadata key '{key}' not present")]
    MissingArtifact {
        function: String,
        key: String,
    },

    #[error("Native function provider '{provider}' has no artifact for '{function}'")]
    ProviderDeclined {
        function: String,
        provider: String,
    },

    #[error("Invalid bytecode in '{function}' at offset {offset}: {message}")]
    InvalidBytecode {
        function: String,
        offset: usize,
        message: String,
    },

    #[error("Code generation error: {message}")]
    Codegen { message: String },

    #[error("Execution error: {message}")]
    Execution { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Internal compiler error: {message}")]
    Internal { message: String },
}

impl CompilerError {
    /// Create a missing-artifact error
    pub fn missing_artifact(function: &str, key: &str) -> Self {
        CompilerError::MissingArtifact {
            function: function.to_string(),
            key: key.to_string(),
        }
    }

    /// Create an invalid bytecode error
    pub fn invalid_bytecode(function: &str, offset: usize, message: impl Into<String>) -> Self {
        CompilerError::InvalidBytecode {
            function: function.to_string(),
            offset,
            message: message.into(),
        }
    }

    /// Create a codegen error
    pub fn codegen(message: impl Into<String>) -> Self {
        CompilerError::Codegen { message: message.into() }
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        CompilerError::Execution { message: message.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        CompilerError::Config { message: message.into() }
    }

    /// Whether the pipeline driver may retry this compilation on a fallback pipeline
    pub fn allows_fallback(&self) -> bool {
        matches!(self, CompilerError::ProviderDeclined { .. })
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::Io {
            message: err.to_string(),
        }
    }
}

/// Convert from String (for simple error cases)
impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::Internal { message }
    }
}
