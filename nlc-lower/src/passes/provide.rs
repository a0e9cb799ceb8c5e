//! Native artifact acquisition

use crate::pass::{CompilerPass, PassInfo};
use crate::provider::NativeFunctionProvider;
use crate::state::CompilationState;
use nlc_common::{CompilerError, CompilerResult};
use log::{debug, info};
use std::sync::Arc;

/// Asks a native function provider for the function body and stores the
/// artifact in the request metadata for the lowering stage to consume
pub struct NativeProviderPass {
    provider: Arc<dyn NativeFunctionProvider>,
}

impl NativeProviderPass {
    pub fn new(provider: Arc<dyn NativeFunctionProvider>) -> Self {
        Self { provider }
    }
}

impl CompilerPass for NativeProviderPass {
    fn info(&self) -> PassInfo {
        PassInfo::transform("native-provider", false)
    }

    fn run(&mut self, state: &mut CompilationState) -> CompilerResult<bool> {
        if state.metadata.has_native_artifact() {
            debug!("'{}' already carries a native artifact", state.fndesc.display_name());
            return Ok(false);
        }

        match self.provider.provide(&state.fndesc) {
            Some(artifact) => {
                info!(
                    "Provider '{}' compiled '{}' -> '{}'",
                    self.provider.name(),
                    state.fndesc.display_name(),
                    artifact.symbol_name
                );
                state.metadata.insert_native_artifact(artifact);
                Ok(true)
            }
            None => Err(CompilerError::ProviderDeclined {
                function: state.fndesc.display_name().to_string(),
                provider: self.provider.name().to_string(),
            }),
        }
    }
}
