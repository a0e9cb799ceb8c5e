//! Per-function compilation state threaded through the pass pipeline

use crate::selector::StrategySelector;
use crate::settings::Settings;
use nlc_codegen::{CodeLibrary, CompiledEntry, EnvironmentObject, NativeSymbolTable};
use nlc_common::{FunctionDescriptor, Metadata};
use std::sync::Arc;

/// What the native lowering pass leaves behind
#[derive(Debug, Clone)]
pub struct LowerResult {
    pub environment: EnvironmentObject,
    pub library: CodeLibrary,
    /// Absent when the pipeline ran with `no_compile`
    pub entry: Option<CompiledEntry>,
}

/// Everything one function compilation carries from pass to pass.
///
/// The strategy selector lives here rather than in a global, so two
/// pipelines compiling on different threads never observe each other's
/// overrides. The native symbol table is the one piece shared across
/// compilations.
#[derive(Debug)]
pub struct CompilationState {
    pub fndesc: FunctionDescriptor,
    pub metadata: Metadata,
    pub settings: Settings,
    pub selector: StrategySelector,
    pub symbols: Arc<NativeSymbolTable>,
    pub result: Option<LowerResult>,
}

impl CompilationState {
    /// New state using the process-wide native symbol table
    pub fn new(fndesc: FunctionDescriptor, settings: Settings) -> Self {
        Self::with_symbols(fndesc, settings, NativeSymbolTable::global())
    }

    pub fn with_symbols(fndesc: FunctionDescriptor, settings: Settings, symbols: Arc<NativeSymbolTable>) -> Self {
        Self {
            fndesc,
            metadata: Metadata::new(),
            settings,
            selector: StrategySelector::default(),
            symbols,
            result: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}
