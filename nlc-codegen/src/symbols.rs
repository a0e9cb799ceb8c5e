//! Process-wide native symbol table
//!
//! Downstream linking and calling machinery resolves function symbols here
//! when the code library does not define them itself. The table is
//! additive: entries are never removed, a later registration under the same
//! name rebinds it, and registration from several compilations may
//! interleave in any order.

use nlc_common::{CompilerError, CompilerResult, NativeFnPtr};
use log::{debug, trace, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

static GLOBAL_SYMBOLS: Lazy<Arc<NativeSymbolTable>> = Lazy::new(|| Arc::new(NativeSymbolTable::new()));

/// Thread-safe name → native pointer mapping
#[derive(Debug, Default)]
pub struct NativeSymbolTable {
    symbols: RwLock<HashMap<String, NativeFnPtr>>,
}

impl NativeSymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shared by every pipeline in this process
    pub fn global() -> Arc<NativeSymbolTable> {
        Arc::clone(&GLOBAL_SYMBOLS)
    }

    /// Register `ptr` under `name`.
    ///
    /// Returns `Ok(true)` when the table changed and `Ok(false)` when the
    /// same pointer was already registered. A different pointer under an
    /// existing name replaces the old binding (a redefined function).
    pub fn register(&self, name: &str, ptr: NativeFnPtr) -> CompilerResult<bool> {
        if ptr.is_null() {
            return Err(CompilerError::codegen(format!(
                "refusing to register null pointer for symbol '{}'",
                name
            )));
        }

        let mut symbols = self.symbols.write().unwrap_or_else(PoisonError::into_inner);
        match symbols.get(name).copied() {
            Some(existing) if existing == ptr => {
                trace!("Symbol '{}' already registered at {}", name, ptr);
                Ok(false)
            }
            Some(existing) => {
                warn!("Rebinding native symbol '{}' from {} to {}", name, existing, ptr);
                symbols.insert(name.to_string(), ptr);
                Ok(true)
            }
            None => {
                debug!("Registered native symbol '{}' at {}", name, ptr);
                symbols.insert(name.to_string(), ptr);
                Ok(true)
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<NativeFnPtr> {
        self.symbols
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.symbols.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted snapshot of all registered names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .symbols
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_register_and_lookup() {
        let table = NativeSymbolTable::new();
        assert!(table.is_empty());
        assert_eq!(table.register("foo", NativeFnPtr(0x10)), Ok(true));
        assert_eq!(table.lookup("foo"), Some(NativeFnPtr(0x10)));
        assert_eq!(table.lookup("bar"), None);
    }

    #[test]
    fn test_reregister_same_pointer_is_noop() {
        let table = NativeSymbolTable::new();
        table.register("foo", NativeFnPtr(0x10)).unwrap();
        assert_eq!(table.register("foo", NativeFnPtr(0x10)), Ok(false));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_rebind_replaces_pointer() {
        let table = NativeSymbolTable::new();
        table.register("foo", NativeFnPtr(0x10)).unwrap();
        assert_eq!(table.register("foo", NativeFnPtr(0x20)), Ok(true));
        assert_eq!(table.lookup("foo"), Some(NativeFnPtr(0x20)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_null_pointer_rejected() {
        let table = NativeSymbolTable::new();
        assert!(table.register("foo", NativeFnPtr(0)).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_concurrent_registration() {
        let table = Arc::new(NativeSymbolTable::new());
        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let table = Arc::clone(&table);
                thread::spawn(move || table.register(&format!("sym{}", i), NativeFnPtr(i * 0x100)))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Ok(true));
        }
        assert_eq!(table.len(), 8);
        assert_eq!(table.names()[0], "sym1");
    }
}
