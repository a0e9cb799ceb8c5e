// Tests for the pass manager and the compiler driver

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::compiler::{Compiler, PipelineKind};
    use crate::pass::{CompilerPass, PassInfo, PassManager};
    use crate::provider::PrecompiledProvider;
    use nlc_common::{CompilerError, CompilerResult, Metadata};
    use pretty_assertions::assert_eq;

    fn provider() -> Arc<PrecompiledProvider> {
        Arc::new(
            PrecompiledProvider::new()
                .with("add", ptr2(native_add), 2)
                .with("mul", ptr2(native_mul), 2),
        )
    }

    fn compiler(settings: Settings) -> (Compiler, Arc<NativeSymbolTable>) {
        let table = Arc::new(NativeSymbolTable::new());
        let compiler = Compiler::new(settings)
            .with_provider(provider())
            .with_symbols(Arc::clone(&table));
        (compiler, table)
    }

    #[test]
    fn test_native_pipeline_adopts_provider_artifact() {
        let (compiler, table) = compiler(Settings::default());
        let compiled = compiler.compile(binary_fn("mul", BinOp::Mul)).unwrap();

        assert_eq!(compiled.pipeline, PipelineKind::Native);
        assert!(compiled.result.entry.as_ref().unwrap().is_native());
        assert_eq!(compiled.call(&[6, 7]), Ok(42));
        assert_eq!(table.len(), 1);
        assert!(!compiled.state.metadata.has_native_artifact());
    }

    #[test]
    fn test_provider_decline_falls_back_to_default_pipeline() {
        let (compiler, table) = compiler(Settings::default());
        let compiled = compiler.compile(binary_fn("rem", BinOp::Rem)).unwrap();

        assert_eq!(compiled.pipeline, PipelineKind::Default);
        assert!(!compiled.result.entry.as_ref().unwrap().is_native());
        assert_eq!(compiled.call(&[17, 5]), Ok(2));
        assert!(table.is_empty());
    }

    #[test]
    fn test_feature_disabled_lowers_bytecode() {
        let (compiler, table) = compiler(Settings::default().with_use_mlir(false));
        assert_eq!(
            compiler.native_pipeline().pass_names(),
            vec!["verify-bytecode", "substitutable-lowering"]
        );

        let compiled = compiler.compile(binary_fn("add", BinOp::Add)).unwrap();
        assert_eq!(compiled.pipeline, PipelineKind::Native);
        assert!(!compiled.result.entry.as_ref().unwrap().is_native());
        assert_eq!(compiled.call(&[2, 3]), Ok(5));
        assert!(table.is_empty());
    }

    #[test]
    fn test_enabled_without_provider_requires_artifact() {
        let table = Arc::new(NativeSymbolTable::new());
        let compiler = Compiler::new(Settings::default()).with_symbols(Arc::clone(&table));

        let err = compiler.compile(binary_fn("add", BinOp::Add)).unwrap_err();
        assert!(matches!(err, CompilerError::MissingArtifact { .. }));

        let add = binary_fn("add", BinOp::Add);
        let mut metadata = Metadata::new();
        metadata.insert_native_artifact(artifact_for(&add, ptr2(native_add)));
        let compiled = compiler.compile_with_metadata(add, metadata).unwrap();
        assert_eq!(compiled.call(&[1, 1]), Ok(2));
    }

    #[test]
    fn test_no_compile_skips_executable() {
        let (compiler, _table) = compiler(Settings::default().with_no_compile(true));
        let compiled = compiler.compile(binary_fn("add", BinOp::Add)).unwrap();

        assert!(compiled.result.entry.is_none());
        assert!(matches!(compiled.call(&[1, 2]), Err(CompilerError::Execution { .. })));
    }

    #[test]
    fn test_invalid_bytecode_does_not_fall_back() {
        let (compiler, table) = compiler(Settings::default());
        let mut bad = binary_fn("add", BinOp::Add);
        bad.bytecode.pop();

        let err = compiler.compile(bad).unwrap_err();
        assert!(matches!(err, CompilerError::InvalidBytecode { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_recompiling_same_function_reuses_symbol() {
        let (compiler, table) = compiler(Settings::default());
        let first = compiler.compile(binary_fn("add", BinOp::Add)).unwrap();
        let second = compiler.compile(binary_fn("add", BinOp::Add)).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(first.call(&[1, 2]), second.call(&[1, 2]));
    }

    #[test]
    fn test_redefined_function_rebinds_symbol() {
        let (compiler, table) = compiler(Settings::default());
        let first = compiler.compile(binary_fn("add", BinOp::Add)).unwrap();
        assert_eq!(first.call(&[6, 7]), Ok(13));

        let redefined = Compiler::new(Settings::default())
            .with_provider(Arc::new(PrecompiledProvider::new().with("add", ptr2(native_mul), 2)))
            .with_symbols(Arc::clone(&table));
        let second = redefined.compile(binary_fn("add", BinOp::Add)).unwrap();

        assert_eq!(second.pipeline, PipelineKind::Native);
        assert_eq!(second.call(&[6, 7]), Ok(42));
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.lookup(&binary_fn("add", BinOp::Add).mangled_name()),
            Some(ptr2(native_mul))
        );
    }

    #[test]
    fn test_default_compiler_uses_process_wide_state() {
        let compiler = Compiler::default();
        assert_eq!(*compiler.settings(), Settings::global());
        assert_eq!(Settings::global(), Settings::global());
        assert!(Arc::ptr_eq(compiler.symbols(), &NativeSymbolTable::global()));
    }

    struct LyingAnalysis;

    impl CompilerPass for LyingAnalysis {
        fn info(&self) -> PassInfo {
            PassInfo::analysis("lying-analysis")
        }

        fn run(&mut self, _state: &mut CompilationState) -> CompilerResult<bool> {
            Ok(true)
        }
    }

    #[test]
    fn test_analysis_pass_may_not_mutate() {
        let (mut state, _table) = isolated_state(binary_fn("add", BinOp::Add), false);
        let mut pm = PassManager::new("test").with_pass(LyingAnalysis);

        assert!(matches!(pm.run(&mut state), Err(CompilerError::Internal { .. })));
    }
}
