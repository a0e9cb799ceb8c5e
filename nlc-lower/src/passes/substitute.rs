//! Substitutable lowering stage
//!
//! Wraps an inner lowering pass and runs it with a different lowering
//! strategy installed. The override covers exactly one inner invocation:
//! the previous strategy is back in place before `run` returns, whether
//! the inner pass succeeded, failed or panicked. Inner errors are passed
//! through untouched.

use super::NativeLoweringPass;
use crate::pass::{CompilerPass, PassInfo};
use crate::selector::{LoweringStrategy, ScopedStrategy};
use crate::state::CompilationState;
use nlc_common::CompilerResult;

pub struct SubstitutableLoweringPass<P = NativeLoweringPass> {
    inner: P,
    strategy: LoweringStrategy,
}

impl SubstitutableLoweringPass<NativeLoweringPass> {
    pub fn new() -> Self {
        Self::wrapping(NativeLoweringPass::new())
    }
}

impl Default for SubstitutableLoweringPass<NativeLoweringPass> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: CompilerPass> SubstitutableLoweringPass<P> {
    pub fn wrapping(inner: P) -> Self {
        Self::with_strategy(inner, LoweringStrategy::Substitute)
    }

    pub fn with_strategy(inner: P, strategy: LoweringStrategy) -> Self {
        Self { inner, strategy }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: CompilerPass> CompilerPass for SubstitutableLoweringPass<P> {
    fn info(&self) -> PassInfo {
        PassInfo::transform("substitutable-lowering", true)
    }

    fn run(&mut self, state: &mut CompilationState) -> CompilerResult<bool> {
        let mut scoped = ScopedStrategy::install(state, self.strategy);
        let result = self.inner.run(&mut scoped);
        drop(scoped);
        result
    }
}
