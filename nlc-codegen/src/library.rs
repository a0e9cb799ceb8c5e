//! Code library - collects lowered modules and resolves executables
//!
//! A library owns one or more code modules. Finalization checks that every
//! symbol a module declared is defined somewhere in the library; once
//! finalized, symbols can be resolved to executable entries, falling back
//! to the process-wide native symbol table for symbols the library only
//! declares.

use crate::exec::CompiledEntry;
use crate::inst::NativeInst;
use crate::symbols::NativeSymbolTable;
use nlc_common::{CompilerError, CompilerResult};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Host-runtime context object emitted once per function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentObject {
    pub symbol: String,
    pub function: String,
    pub arity: usize,
}

/// A function body lowered by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoweredFunction {
    pub symbol: String,
    pub arity: usize,
    pub code: Vec<NativeInst>,
}

/// Per-function unit of code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeModule {
    pub name: String,
    declared: BTreeSet<String>,
    functions: Vec<LoweredFunction>,
    environments: Vec<EnvironmentObject>,
}

impl CodeModule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            declared: BTreeSet::new(),
            functions: Vec::new(),
            environments: Vec::new(),
        }
    }

    /// Declare a function symbol this module expects to be defined
    pub fn declare_function(&mut self, symbol: &str) {
        self.declared.insert(symbol.to_string());
    }

    pub fn define_function(&mut self, function: LoweredFunction) {
        self.declared.insert(function.symbol.clone());
        self.functions.push(function);
    }

    pub fn add_environment(&mut self, env: EnvironmentObject) {
        self.environments.push(env);
    }

    pub fn declared(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(String::as_str)
    }

    pub fn functions(&self) -> &[LoweredFunction] {
        &self.functions
    }

    pub fn environments(&self) -> &[EnvironmentObject] {
        &self.environments
    }

    pub fn get_function(&self, symbol: &str) -> Option<&LoweredFunction> {
        self.functions.iter().find(|f| f.symbol == symbol)
    }
}

/// Collection of code modules with finalization and symbol resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLibrary {
    pub name: String,
    modules: Vec<CodeModule>,
    finalized: bool,
    verify_declared_symbols: bool,
}

impl CodeLibrary {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            modules: Vec::new(),
            finalized: false,
            verify_declared_symbols: true,
        }
    }

    pub fn create_module(&self, name: &str) -> CodeModule {
        CodeModule::new(&format!("{}::{}", self.name, name))
    }

    /// Link a module into the library. Fails after finalization.
    pub fn add_module(&mut self, module: CodeModule) -> CompilerResult<()> {
        if self.finalized {
            return Err(CompilerError::codegen(format!(
                "cannot add module '{}' to finalized library '{}'",
                module.name, self.name
            )));
        }
        debug!(
            "Library '{}': adding module '{}' ({} functions, {} declarations)",
            self.name,
            module.name,
            module.functions.len(),
            module.declared.len()
        );
        self.modules.push(module);
        Ok(())
    }

    /// Disable the declared-symbol check performed by [`CodeLibrary::finalize`].
    ///
    /// Required when function bodies are supplied from outside the library
    /// (for example a pre-compiled native artifact registered in the
    /// [`NativeSymbolTable`]): the library then declares symbols it never
    /// defines, and those are resolved at lookup time instead.
    pub fn skip_symbol_verification(&mut self) {
        if self.verify_declared_symbols {
            warn!("Library '{}': declared-symbol verification disabled", self.name);
        }
        self.verify_declared_symbols = false;
    }

    pub fn verifies_symbols(&self) -> bool {
        self.verify_declared_symbols
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn modules(&self) -> &[CodeModule] {
        &self.modules
    }

    /// Total number of native instructions emitted into this library
    pub fn instruction_count(&self) -> usize {
        self.modules
            .iter()
            .flat_map(|m| m.functions.iter())
            .map(|f| f.code.len())
            .sum()
    }

    pub fn get_function(&self, symbol: &str) -> Option<&LoweredFunction> {
        self.modules.iter().find_map(|m| m.get_function(symbol))
    }

    pub fn get_environment(&self, symbol: &str) -> Option<&EnvironmentObject> {
        self.modules
            .iter()
            .flat_map(|m| m.environments.iter())
            .find(|e| e.symbol == symbol)
    }

    /// Symbols declared by some module but defined by none
    pub fn undefined_symbols(&self) -> Vec<String> {
        let mut undefined: Vec<String> = self
            .modules
            .iter()
            .flat_map(|m| m.declared())
            .filter(|s| self.get_function(s).is_none())
            .map(str::to_string)
            .collect();
        undefined.sort();
        undefined.dedup();
        undefined
    }

    /// Finalize the library. Idempotent.
    pub fn finalize(&mut self) -> CompilerResult<()> {
        if self.finalized {
            return Ok(());
        }

        if self.verify_declared_symbols {
            let undefined = self.undefined_symbols();
            if !undefined.is_empty() {
                return Err(CompilerError::codegen(format!(
                    "library '{}' declares symbols it never defines: {}",
                    self.name,
                    undefined.join(", ")
                )));
            }
        }

        self.finalized = true;
        info!(
            "Library '{}' finalized: {} modules, {} instructions",
            self.name,
            self.modules.len(),
            self.instruction_count()
        );
        Ok(())
    }

    /// Finalize and resolve `symbol` to something callable.
    ///
    /// Library-defined functions win; otherwise the symbol must be
    /// registered in `table`.
    pub fn get_executable(
        &mut self,
        symbol: &str,
        arity: usize,
        table: &NativeSymbolTable,
    ) -> CompilerResult<CompiledEntry> {
        self.finalize()?;

        if let Some(function) = self.get_function(symbol) {
            debug!("Resolved '{}' to library-lowered code", symbol);
            return Ok(CompiledEntry::Lowered(function.clone()));
        }

        match table.lookup(symbol) {
            Some(ptr) => {
                debug!("Resolved '{}' to native symbol at {}", symbol, ptr);
                Ok(CompiledEntry::Native {
                    symbol: symbol.to_string(),
                    ptr,
                    arity,
                })
            }
            None => Err(CompilerError::codegen(format!(
                "symbol '{}' is neither defined in library '{}' nor registered as a native symbol",
                symbol, self.name
            ))),
        }
    }

    /// Stable JSON dump, used by `--emit` and for comparing pipeline outputs
    pub fn to_json(&self) -> CompilerResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CompilerError::Internal {
            message: format!("failed to serialize library '{}': {}", self.name, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlc_common::NativeFnPtr;
    use pretty_assertions::assert_eq;

    fn lowered(symbol: &str) -> LoweredFunction {
        LoweredFunction {
            symbol: symbol.to_string(),
            arity: 0,
            code: vec![NativeInst::Const(0, 7), NativeInst::Ret(0)],
        }
    }

    #[test]
    fn test_finalize_rejects_declared_only_symbols() {
        let mut lib = CodeLibrary::new("lib");
        let mut module = lib.create_module("m");
        module.declare_function("missing");
        lib.add_module(module).unwrap();

        let err = lib.finalize().unwrap_err();
        assert!(err.to_string().contains("missing"));
        assert!(!lib.is_finalized());
    }

    #[test]
    fn test_skip_symbol_verification() {
        let mut lib = CodeLibrary::new("lib");
        let mut module = lib.create_module("m");
        module.declare_function("missing");
        lib.add_module(module).unwrap();
        lib.skip_symbol_verification();

        assert!(lib.finalize().is_ok());
        assert_eq!(lib.undefined_symbols(), vec!["missing".to_string()]);
    }

    #[test]
    fn test_add_module_after_finalize_fails() {
        let mut lib = CodeLibrary::new("lib");
        lib.finalize().unwrap();
        assert!(lib.add_module(CodeModule::new("late")).is_err());
    }

    #[test]
    fn test_get_executable_prefers_library_code() {
        let table = NativeSymbolTable::new();
        table.register("f", NativeFnPtr(0x40)).unwrap();

        let mut lib = CodeLibrary::new("lib");
        let mut module = lib.create_module("m");
        module.define_function(lowered("f"));
        lib.add_module(module).unwrap();

        let entry = lib.get_executable("f", 0, &table).unwrap();
        assert!(!entry.is_native());
        assert_eq!(lib.instruction_count(), 2);
    }

    #[test]
    fn test_get_executable_falls_back_to_symbol_table() {
        let table = NativeSymbolTable::new();
        table.register("g", NativeFnPtr(0x40)).unwrap();

        let mut lib = CodeLibrary::new("lib");
        let mut module = lib.create_module("m");
        module.declare_function("g");
        lib.add_module(module).unwrap();
        lib.skip_symbol_verification();

        let entry = lib.get_executable("g", 2, &table).unwrap();
        assert!(entry.is_native());
        assert_eq!(entry.arity(), 2);
        assert!(lib.get_executable("h", 0, &table).is_err());
    }
}
