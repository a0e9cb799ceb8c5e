//! Process-wide configuration
//!
//! Settings are read once from the environment and cached; each
//! compilation takes a snapshot so the flags cannot change halfway through
//! a pipeline run.

use nlc_common::{CompilerError, CompilerResult};
use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Environment variable toggling the native-artifact lowering path
pub const USE_MLIR_ENV: &str = "NLC_USE_MLIR";

/// Environment variable that stops the pipeline after lowering
pub const NO_COMPILE_ENV: &str = "NLC_NO_COMPILE";

static GLOBAL_SETTINGS: Lazy<Settings> = Lazy::new(|| {
    Settings::from_env().unwrap_or_else(|e| {
        warn!("{}; using default settings", e);
        Settings::default()
    })
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Adopt pre-compiled native artifacts instead of lowering bytecode
    pub use_mlir: bool,
    /// Lower only, do not resolve an executable entry
    pub no_compile: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_mlir: true,
            no_compile: false,
        }
    }
}

impl Settings {
    /// Cached process-wide settings
    pub fn global() -> Settings {
        *GLOBAL_SETTINGS
    }

    pub fn from_env() -> CompilerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup, unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> CompilerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        if let Some(value) = lookup(USE_MLIR_ENV) {
            settings.use_mlir = parse_flag(USE_MLIR_ENV, &value)?;
        }
        if let Some(value) = lookup(NO_COMPILE_ENV) {
            settings.no_compile = parse_flag(NO_COMPILE_ENV, &value)?;
        }
        Ok(settings)
    }

    pub fn with_use_mlir(mut self, use_mlir: bool) -> Self {
        self.use_mlir = use_mlir;
        self
    }

    pub fn with_no_compile(mut self, no_compile: bool) -> Self {
        self.no_compile = no_compile;
        self
    }
}

/// Parse a boolean flag value
pub fn parse_flag(name: &str, value: &str) -> CompilerResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(CompilerError::config(format!(
            "invalid value '{}' for {}, expected a boolean",
            other, name
        ))),
    }
}
