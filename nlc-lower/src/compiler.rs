//! Compiler driver
//!
//! Builds the pass pipelines and decides which one compiles a function.
//! With `use_mlir` on and a provider configured, the native pipeline runs
//! first; if the provider has nothing for the function, the function is
//! recompiled from scratch on the default pipeline. Any other failure is
//! final.

use crate::pass::PassManager;
use crate::passes::{NativeLoweringPass, NativeProviderPass, SubstitutableLoweringPass, VerifyBytecodePass};
use crate::provider::NativeFunctionProvider;
use crate::settings::Settings;
use crate::state::{CompilationState, LowerResult};
use nlc_codegen::NativeSymbolTable;
use nlc_common::{CompilerError, CompilerResult, FunctionDescriptor, Metadata};
use log::{info, warn};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    /// Verification, provider, substitutable lowering
    Native,
    /// Verification, host lowering
    Default,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Native => write!(f, "native"),
            PipelineKind::Default => write!(f, "default"),
        }
    }
}

#[derive(Debug)]
pub struct CompiledFunction {
    pub pipeline: PipelineKind,
    pub state: CompilationState,
    pub result: LowerResult,
}

impl CompiledFunction {
    pub fn call(&self, args: &[i64]) -> CompilerResult<i64> {
        match &self.result.entry {
            Some(entry) => entry.call(args),
            None => Err(CompilerError::execution(format!(
                "'{}' was lowered with no_compile, nothing to call",
                self.state.fndesc.display_name()
            ))),
        }
    }
}

pub struct Compiler {
    settings: Settings,
    provider: Option<Arc<dyn NativeFunctionProvider>>,
    symbols: Arc<NativeSymbolTable>,
}

impl Default for Compiler {
    /// Process-wide settings, no provider, global symbol table
    fn default() -> Self {
        Self::new(Settings::global())
    }
}

impl Compiler {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            provider: None,
            symbols: NativeSymbolTable::global(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn NativeFunctionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_symbols(mut self, symbols: Arc<NativeSymbolTable>) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn symbols(&self) -> &Arc<NativeSymbolTable> {
        &self.symbols
    }

    /// Verification, provider (when enabled and configured), substitutable lowering
    pub fn native_pipeline(&self) -> PassManager {
        let mut pm = PassManager::new("native").with_pass(VerifyBytecodePass::new());
        if self.settings.use_mlir {
            if let Some(provider) = &self.provider {
                pm.add_pass(Box::new(NativeProviderPass::new(Arc::clone(provider))));
            }
        }
        pm.with_pass(SubstitutableLoweringPass::new())
    }

    pub fn default_pipeline(&self) -> PassManager {
        PassManager::new("default")
            .with_pass(VerifyBytecodePass::new())
            .with_pass(NativeLoweringPass::new())
    }

    pub fn compile(&self, fndesc: FunctionDescriptor) -> CompilerResult<CompiledFunction> {
        self.compile_with_metadata(fndesc, Metadata::new())
    }

    /// Compile with metadata prepared by earlier stages (for example an
    /// artifact supplied without a provider)
    pub fn compile_with_metadata(
        &self,
        fndesc: FunctionDescriptor,
        metadata: Metadata,
    ) -> CompilerResult<CompiledFunction> {
        let mut state = self.new_state(fndesc.clone()).with_metadata(metadata.clone());
        match self.native_pipeline().run(&mut state) {
            Ok(()) => Self::finish(PipelineKind::Native, state),
            Err(e) if e.allows_fallback() => {
                warn!("{}; falling back to the default pipeline", e);
                let mut state = self.new_state(fndesc).with_metadata(metadata);
                self.default_pipeline().run(&mut state)?;
                Self::finish(PipelineKind::Default, state)
            }
            Err(e) => Err(e),
        }
    }

    fn new_state(&self, fndesc: FunctionDescriptor) -> CompilationState {
        CompilationState::with_symbols(fndesc, self.settings, Arc::clone(&self.symbols))
    }

    fn finish(pipeline: PipelineKind, mut state: CompilationState) -> CompilerResult<CompiledFunction> {
        let result = state.result.take().ok_or_else(|| CompilerError::Internal {
            message: format!(
                "pipeline '{}' finished without a lowering result for '{}'",
                pipeline,
                state.fndesc.display_name()
            ),
        })?;
        info!("'{}' compiled by the {} pipeline", state.fndesc.display_name(), pipeline);
        Ok(CompiledFunction {
            pipeline,
            state,
            result,
        })
    }
}
