//! Lowering strategy selection
//!
//! The native lowering pass does not pick its lowering implementation
//! itself; it asks the [`StrategySelector`] stored in the compilation state.
//! A pass that wants a different implementation installs it with
//! [`ScopedStrategy`], which puts the previous strategy back when dropped.
//! Drop runs on normal return, on `?` early exits and while unwinding from a
//! panic, so the override never outlives the pass that made it.

use crate::lowering::{ArtifactLowering, DefaultLowering, Lowering};
use crate::settings::Settings;
use crate::state::CompilationState;
use log::debug;
use std::fmt;
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoweringStrategy {
    /// Host bytecode lowering
    #[default]
    Default,
    /// Adopt a native artifact when `use_mlir` is set, otherwise behave as `Default`
    Substitute,
}

impl LoweringStrategy {
    /// Construct the lowering object this strategy stands for
    pub fn instantiate(self, settings: &Settings) -> Box<dyn Lowering> {
        match self {
            LoweringStrategy::Default => Box::new(DefaultLowering::new()),
            LoweringStrategy::Substitute if settings.use_mlir => Box::new(ArtifactLowering::new()),
            LoweringStrategy::Substitute => Box::new(DefaultLowering::new()),
        }
    }
}

impl fmt::Display for LoweringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoweringStrategy::Default => write!(f, "default"),
            LoweringStrategy::Substitute => write!(f, "substitute"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrategySelector {
    current: LoweringStrategy,
}

impl StrategySelector {
    pub fn new(strategy: LoweringStrategy) -> Self {
        Self { current: strategy }
    }

    pub fn current(&self) -> LoweringStrategy {
        self.current
    }

    pub fn set(&mut self, strategy: LoweringStrategy) {
        self.current = strategy;
    }

    /// Install `strategy` and return the one it replaced
    pub fn replace(&mut self, strategy: LoweringStrategy) -> LoweringStrategy {
        std::mem::replace(&mut self.current, strategy)
    }
}

/// Exclusive access to a compilation state with a strategy override in effect
pub struct ScopedStrategy<'a> {
    state: &'a mut CompilationState,
    previous: LoweringStrategy,
}

impl<'a> ScopedStrategy<'a> {
    pub fn install(state: &'a mut CompilationState, strategy: LoweringStrategy) -> Self {
        let previous = state.selector.replace(strategy);
        debug!(
            "Strategy override for '{}': {} -> {}",
            state.fndesc.display_name(),
            previous,
            strategy
        );
        Self { state, previous }
    }

    pub fn previous(&self) -> LoweringStrategy {
        self.previous
    }
}

impl Deref for ScopedStrategy<'_> {
    type Target = CompilationState;

    fn deref(&self) -> &CompilationState {
        &*self.state
    }
}

impl DerefMut for ScopedStrategy<'_> {
    fn deref_mut(&mut self) -> &mut CompilationState {
        &mut *self.state
    }
}

impl Drop for ScopedStrategy<'_> {
    fn drop(&mut self) {
        let overridden = self.state.selector.replace(self.previous);
        debug!(
            "Strategy restored for '{}': {} -> {}",
            self.state.fndesc.display_name(),
            overridden,
            self.previous
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlc_codegen::NativeSymbolTable;
    use nlc_common::{FunctionDescriptor, Signature};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Arc;

    fn state() -> CompilationState {
        let fndesc = FunctionDescriptor::new("f", Signature::default(), vec![]);
        CompilationState::with_symbols(fndesc, Settings::default(), Arc::new(NativeSymbolTable::new()))
    }

    #[test]
    fn test_scope_restores_on_drop() {
        let mut state = state();
        {
            let scoped = ScopedStrategy::install(&mut state, LoweringStrategy::Substitute);
            assert_eq!(scoped.selector.current(), LoweringStrategy::Substitute);
            assert_eq!(scoped.previous(), LoweringStrategy::Default);
        }
        assert_eq!(state.selector.current(), LoweringStrategy::Default);
    }

    #[test]
    fn test_nested_scopes_unwind_in_order() {
        let mut state = state();
        state.selector.set(LoweringStrategy::Substitute);
        {
            let mut outer = ScopedStrategy::install(&mut state, LoweringStrategy::Default);
            {
                let inner = ScopedStrategy::install(&mut outer, LoweringStrategy::Substitute);
                assert_eq!(inner.previous(), LoweringStrategy::Default);
            }
            assert_eq!(outer.selector.current(), LoweringStrategy::Default);
        }
        assert_eq!(state.selector.current(), LoweringStrategy::Substitute);
    }

    #[test]
    fn test_scope_restores_while_unwinding() {
        let mut state = state();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _scoped = ScopedStrategy::install(&mut state, LoweringStrategy::Substitute);
            panic!("lowering blew up");
        }));
        assert!(outcome.is_err());
        assert_eq!(state.selector.current(), LoweringStrategy::Default);
    }

    #[test]
    fn test_substitute_without_feature_is_default_lowering() {
        let enabled = Settings::default().with_use_mlir(true);
        let disabled = Settings::default().with_use_mlir(false);
        assert_eq!(LoweringStrategy::Substitute.instantiate(&enabled).kind(), "artifact");
        assert_eq!(LoweringStrategy::Substitute.instantiate(&disabled).kind(), "default");
        assert_eq!(LoweringStrategy::Default.instantiate(&enabled).kind(), "default");
    }
}
