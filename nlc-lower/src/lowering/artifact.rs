//! Native artifact adoption
//!
//! Instead of lowering bytecode, this strategy takes the pre-compiled
//! function pointer an upstream provider left in the request metadata and
//! registers it in the native symbol table. The surrounding scaffolding
//! (environment object, declaration, module hand-off) is the same as for
//! the default strategy, so callers cannot tell the two apart.

use super::{LowerBase, LowerContext, Lowering, LoweringStage};
use nlc_codegen::EnvironmentObject;
use nlc_common::{CompilerResult, FunctionDescriptor};
use log::{info, warn};

#[derive(Debug, Default)]
pub struct ArtifactLowering {
    base: LowerBase,
    bound_symbol: Option<String>,
}

impl ArtifactLowering {
    pub fn new() -> Self {
        Self {
            base: LowerBase::new(),
            bound_symbol: None,
        }
    }
}

impl Lowering for ArtifactLowering {
    fn kind(&self) -> &'static str {
        "artifact"
    }

    fn lower(&mut self, cx: &mut LowerContext<'_>) -> CompilerResult<()> {
        self.base.emit_environment_object(cx);
        self.lower_normal_function(cx)?;
        self.base.post_lowering(cx)
    }

    fn lower_normal_function(&mut self, cx: &mut LowerContext<'_>) -> CompilerResult<()> {
        self.base.setup_function(cx)?;

        // The declared function symbol is never defined in the library, the
        // body lives behind the registered pointer.
        cx.library.skip_symbol_verification();

        let artifact = cx.metadata.take_native_artifact(cx.fndesc.display_name())?;
        if artifact.symbol_name != cx.fndesc.mangled_name() {
            warn!(
                "Artifact symbol '{}' differs from declared symbol '{}'",
                artifact.symbol_name,
                cx.fndesc.mangled_name()
            );
        }

        cx.symbols.register(&artifact.symbol_name, artifact.function_pointer)?;
        info!(
            "Bound '{}' to native artifact '{}' at {}",
            cx.fndesc.display_name(),
            artifact.symbol_name,
            artifact.function_pointer
        );

        self.bound_symbol = Some(artifact.symbol_name);
        self.base.advance(cx.fndesc, LoweringStage::ArtifactBound);
        Ok(())
    }

    fn stage(&self) -> LoweringStage {
        self.base.stage()
    }

    fn environment(&self) -> Option<&EnvironmentObject> {
        self.base.environment()
    }

    fn entry_symbol(&self, fndesc: &FunctionDescriptor) -> String {
        self.bound_symbol.clone().unwrap_or_else(|| fndesc.mangled_name())
    }
}
