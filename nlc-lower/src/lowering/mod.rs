//! Function lowering strategies
//!
//! Every strategy walks the same state machine:
//!
//! ```text
//! Start -> EnvironmentReady -> InstructionsLowered | ArtifactBound -> Finalized
//! ```
//!
//! Environment-object emission, per-function setup and post-lowering are
//! shared scaffolding ([`LowerBase`]); strategies differ only in how the
//! function body comes to exist.

mod artifact;
mod default;

pub use artifact::ArtifactLowering;
pub use default::{lower_bytecode, DefaultLowering};

use nlc_codegen::{CodeLibrary, CodeModule, EnvironmentObject, NativeSymbolTable};
use nlc_common::{CompilerError, CompilerResult, FunctionDescriptor, Metadata};
use log::{debug, trace};
use std::fmt;

/// Borrowed view of the pipeline state a lowering object works against
pub struct LowerContext<'a> {
    pub fndesc: &'a FunctionDescriptor,
    pub metadata: &'a mut Metadata,
    pub library: &'a mut CodeLibrary,
    pub symbols: &'a NativeSymbolTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoweringStage {
    Start,
    EnvironmentReady,
    InstructionsLowered,
    ArtifactBound,
    Finalized,
}

impl fmt::Display for LoweringStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoweringStage::Start => "start",
            LoweringStage::EnvironmentReady => "environment-ready",
            LoweringStage::InstructionsLowered => "instructions-lowered",
            LoweringStage::ArtifactBound => "artifact-bound",
            LoweringStage::Finalized => "finalized",
        };
        write!(f, "{}", s)
    }
}

/// Capability set shared by all lowering strategies
pub trait Lowering {
    /// Short name for logs and tests
    fn kind(&self) -> &'static str;

    /// Lower the whole function: environment, body, post-lowering
    fn lower(&mut self, cx: &mut LowerContext<'_>) -> CompilerResult<()>;

    /// Produce the function body
    fn lower_normal_function(&mut self, cx: &mut LowerContext<'_>) -> CompilerResult<()>;

    fn stage(&self) -> LoweringStage;

    /// Environment object emitted for the function, once lowering got that far
    fn environment(&self) -> Option<&EnvironmentObject>;

    /// Symbol callers should resolve to reach the lowered function
    fn entry_symbol(&self, fndesc: &FunctionDescriptor) -> String {
        fndesc.mangled_name()
    }
}

/// Scaffolding shared by every strategy
#[derive(Debug)]
pub struct LowerBase {
    module: Option<CodeModule>,
    env: Option<EnvironmentObject>,
    stage: LoweringStage,
}

impl Default for LowerBase {
    fn default() -> Self {
        Self::new()
    }
}

impl LowerBase {
    pub fn new() -> Self {
        Self {
            module: None,
            env: None,
            stage: LoweringStage::Start,
        }
    }

    pub fn stage(&self) -> LoweringStage {
        self.stage
    }

    pub fn environment(&self) -> Option<&EnvironmentObject> {
        self.env.as_ref()
    }

    pub(crate) fn advance(&mut self, fndesc: &FunctionDescriptor, stage: LoweringStage) {
        trace!("'{}': {} -> {}", fndesc.display_name(), self.stage, stage);
        self.stage = stage;
    }

    fn module_mut(&mut self, fndesc: &FunctionDescriptor) -> CompilerResult<&mut CodeModule> {
        self.module.as_mut().ok_or_else(|| CompilerError::Internal {
            message: format!(
                "'{}': no code module, environment object was never emitted",
                fndesc.display_name()
            ),
        })
    }

    /// Create the function's code module and emit its environment object
    pub fn emit_environment_object(&mut self, cx: &mut LowerContext<'_>) {
        let mut module = cx.library.create_module(cx.fndesc.display_name());
        let env = EnvironmentObject {
            symbol: cx.fndesc.env_name(),
            function: cx.fndesc.display_name().to_string(),
            arity: cx.fndesc.signature.arity(),
        };
        debug!("Emitting environment object '{}'", env.symbol);
        module.add_environment(env.clone());
        self.module = Some(module);
        self.env = Some(env);
        self.advance(cx.fndesc, LoweringStage::EnvironmentReady);
    }

    /// Per-function bookkeeping: declare the function symbol in the module
    pub fn setup_function(&mut self, cx: &mut LowerContext<'_>) -> CompilerResult<()> {
        let symbol = cx.fndesc.mangled_name();
        trace!("Declaring function symbol '{}'", symbol);
        self.module_mut(cx.fndesc)?.declare_function(&symbol);
        Ok(())
    }

    pub fn module(&mut self, cx: &LowerContext<'_>) -> CompilerResult<&mut CodeModule> {
        self.module_mut(cx.fndesc)
    }

    /// Hand the finished module to the library
    pub fn post_lowering(&mut self, cx: &mut LowerContext<'_>) -> CompilerResult<()> {
        let module = self.module.take().ok_or_else(|| CompilerError::Internal {
            message: format!("'{}': module already handed to the library", cx.fndesc.display_name()),
        })?;
        cx.library.add_module(module)?;
        self.advance(cx.fndesc, LoweringStage::Finalized);
        Ok(())
    }
}
