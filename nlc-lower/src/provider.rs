//! Native function providers
//!
//! A provider is the external compiler that turns a function descriptor
//! into a ready-to-call native pointer. The pipeline only sees the result:
//! either an artifact, or a refusal that lets the driver fall back to host
//! lowering. How a provider decides is its own business.

use nlc_common::{FunctionDescriptor, NativeArtifact, NativeFnPtr};
use log::{debug, warn};
use std::collections::HashMap;

pub trait NativeFunctionProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Produce a native artifact for `fndesc`, or `None` if not available.
    ///
    /// The returned symbol name should be `fndesc.mangled_name()`; the
    /// pointer must be an `extern "C"` function taking one `i64` per
    /// signature argument and returning `i64`.
    fn provide(&self, fndesc: &FunctionDescriptor) -> Option<NativeArtifact>;
}

/// Provider backed by functions compiled ahead of time
#[derive(Debug, Default)]
pub struct PrecompiledProvider {
    entries: HashMap<String, (NativeFnPtr, usize)>,
}

impl PrecompiledProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `ptr` available for functions named `name` with `arity` arguments
    pub fn register(&mut self, name: &str, ptr: NativeFnPtr, arity: usize) {
        self.entries.insert(name.to_string(), (ptr, arity));
    }

    pub fn with(mut self, name: &str, ptr: NativeFnPtr, arity: usize) -> Self {
        self.register(name, ptr, arity);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl NativeFunctionProvider for PrecompiledProvider {
    fn name(&self) -> &str {
        "precompiled"
    }

    fn provide(&self, fndesc: &FunctionDescriptor) -> Option<NativeArtifact> {
        let (ptr, arity) = match self.entries.get(&fndesc.name) {
            Some(entry) => *entry,
            None => {
                debug!("No precompiled body for '{}'", fndesc.display_name());
                return None;
            }
        };

        if arity != fndesc.signature.arity() {
            warn!(
                "Precompiled '{}' takes {} arguments, descriptor has {}",
                fndesc.name,
                arity,
                fndesc.signature.arity()
            );
            return None;
        }

        Some(NativeArtifact {
            function_pointer: ptr,
            symbol_name: fndesc.mangled_name(),
        })
    }
}
