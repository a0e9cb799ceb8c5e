//! Native-Lowering Compiler - Lowering Strategies and Pass Pipeline
//!
//! This crate lowers function descriptors through a pass pipeline whose
//! native lowering stage can be substituted. The default strategy lowers
//! host bytecode instruction by instruction; the substitute strategy adopts
//! a function pointer compiled elsewhere and registers it in the native
//! symbol table, reusing the host scaffolding around it.

pub mod compiler;
pub mod lowering;
pub mod pass;
pub mod passes;
pub mod provider;
pub mod selector;
pub mod settings;
pub mod state;

#[cfg(test)]
mod tests;

pub use compiler::{CompiledFunction, Compiler, PipelineKind};
pub use lowering::{ArtifactLowering, DefaultLowering, LowerContext, Lowering, LoweringStage};
pub use pass::{CompilerPass, PassInfo, PassManager};
pub use passes::{NativeLoweringPass, NativeProviderPass, SubstitutableLoweringPass, VerifyBytecodePass};
pub use provider::{NativeFunctionProvider, PrecompiledProvider};
pub use selector::{LoweringStrategy, ScopedStrategy, StrategySelector};
pub use settings::Settings;
pub use state::{CompilationState, LowerResult};
