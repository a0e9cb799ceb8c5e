//! Pass infrastructure

use crate::state::CompilationState;
use nlc_common::{CompilerError, CompilerResult};
use log::{debug, info, trace};

/// Registration flags of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassInfo {
    pub name: &'static str,
    /// The pass alters control or data flow of the function
    pub mutates_cfg: bool,
    /// The pass only inspects the state
    pub analysis_only: bool,
}

impl PassInfo {
    pub const fn analysis(name: &'static str) -> Self {
        Self {
            name,
            mutates_cfg: false,
            analysis_only: true,
        }
    }

    pub const fn transform(name: &'static str, mutates_cfg: bool) -> Self {
        Self {
            name,
            mutates_cfg,
            analysis_only: false,
        }
    }
}

/// One stage of the compilation pipeline
pub trait CompilerPass {
    fn info(&self) -> PassInfo;

    /// Run the pass; returns true if the state was modified
    fn run(&mut self, state: &mut CompilationState) -> CompilerResult<bool>;
}

/// Ordered list of passes run against one compilation state
pub struct PassManager {
    name: String,
    passes: Vec<Box<dyn CompilerPass>>,
}

impl PassManager {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_pass(&mut self, pass: Box<dyn CompilerPass>) {
        self.passes.push(pass);
    }

    pub fn with_pass(mut self, pass: impl CompilerPass + 'static) -> Self {
        self.add_pass(Box::new(pass));
        self
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.info().name).collect()
    }

    /// Run every pass in order, stopping at the first failure
    pub fn run(&mut self, state: &mut CompilationState) -> CompilerResult<()> {
        info!(
            "Pipeline '{}': compiling '{}' ({} passes)",
            self.name,
            state.fndesc.display_name(),
            self.passes.len()
        );

        for pass in &mut self.passes {
            let info = pass.info();
            debug!("Running pass: {}", info.name);
            let changed = pass.run(state).inspect_err(|e| {
                debug!("Pass '{}' failed: {}", info.name, e);
            })?;

            if changed && info.analysis_only {
                return Err(CompilerError::Internal {
                    message: format!("analysis-only pass '{}' reported a mutation", info.name),
                });
            }
            if changed {
                debug!("Pass '{}' modified the state", info.name);
            } else {
                trace!("Pass '{}' made no changes", info.name);
            }
        }
        Ok(())
    }
}
