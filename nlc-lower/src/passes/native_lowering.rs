//! Native lowering pass
//!
//! Creates the function's code library, instantiates whichever lowering
//! implementation the strategy selector names, drives it, and resolves the
//! executable entry.

use crate::lowering::LowerContext;
use crate::pass::{CompilerPass, PassInfo};
use crate::state::{CompilationState, LowerResult};
use nlc_codegen::CodeLibrary;
use nlc_common::{CompilerError, CompilerResult};
use log::{debug, info};

#[derive(Debug, Default)]
pub struct NativeLoweringPass;

impl NativeLoweringPass {
    pub fn new() -> Self {
        Self
    }
}

impl CompilerPass for NativeLoweringPass {
    fn info(&self) -> PassInfo {
        PassInfo::transform("native-lowering", true)
    }

    fn run(&mut self, state: &mut CompilationState) -> CompilerResult<bool> {
        let strategy = state.selector.current();
        let mut lowering = strategy.instantiate(&state.settings);
        debug!(
            "Lowering '{}' with strategy '{}' ({} lowering)",
            state.fndesc.display_name(),
            strategy,
            lowering.kind()
        );

        let mut library = CodeLibrary::new(state.fndesc.display_name());
        {
            let mut cx = LowerContext {
                fndesc: &state.fndesc,
                metadata: &mut state.metadata,
                library: &mut library,
                symbols: &state.symbols,
            };
            lowering.lower(&mut cx)?;
        }

        let environment = lowering.environment().cloned().ok_or_else(|| CompilerError::Internal {
            message: format!(
                "'{}' lowered without an environment object",
                state.fndesc.display_name()
            ),
        })?;

        let entry = if state.settings.no_compile {
            debug!("no_compile set, skipping executable resolution");
            None
        } else {
            let symbol = lowering.entry_symbol(&state.fndesc);
            let entry = library.get_executable(&symbol, state.fndesc.signature.arity(), &state.symbols)?;
            info!(
                "Compiled '{}' -> '{}' ({})",
                state.fndesc.display_name(),
                symbol,
                if entry.is_native() { "native artifact" } else { "lowered bytecode" }
            );
            Some(entry)
        };

        state.result = Some(LowerResult {
            environment,
            library,
            entry,
        });
        Ok(true)
    }
}
