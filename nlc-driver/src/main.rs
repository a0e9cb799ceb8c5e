//! Native-Lowering Compiler Driver
//!
//! Command-line front end: compiles function descriptors given as JSON,
//! optionally adopting precompiled native bodies, and runs the result.

mod builtins;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use nlc_common::FunctionDescriptor;
use nlc_lower::{CompiledFunction, Compiler, Settings};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nlc")]
#[command(about = "Native-Lowering Compiler")]
#[command(version = "0.1.0")]
struct Cli {
    /// Verbose logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Adopt precompiled native bodies (defaults to NLC_USE_MLIR, then true)
    #[arg(long, global = true)]
    use_mlir: Option<bool>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a function descriptor (JSON) and optionally call it
    Compile {
        /// Input function descriptor
        input: PathBuf,

        /// Comma-separated integer arguments to call the function with
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        args: Vec<i64>,

        /// Lower only, do not resolve an executable (defaults to NLC_NO_COMPILE, then false)
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        no_compile: Option<bool>,

        /// Print the code library as JSON
        #[arg(long)]
        emit: bool,
    },

    /// Compile the built-in demo functions with both backends
    Demo,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let result = Settings::from_env()
        .context("invalid environment configuration")
        .and_then(|env| run(cli, env));
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Run a command; flags given on the command line override `env`
fn run(cli: Cli, env: Settings) -> Result<()> {
    let mut settings = env;
    if let Some(use_mlir) = cli.use_mlir {
        settings = settings.with_use_mlir(use_mlir);
    }

    match cli.command {
        Commands::Compile {
            input,
            args,
            no_compile,
            emit,
        } => {
            if let Some(no_compile) = no_compile {
                settings = settings.with_no_compile(no_compile);
            }
            log::debug!("Effective settings: {:?}", settings);
            compile_file(&input, &args, settings, emit)
        }
        Commands::Demo => {
            log::debug!("Effective settings: {:?}", settings);
            run_demo(settings)
        }
    }
}

fn compiler(settings: Settings) -> Compiler {
    Compiler::new(settings).with_provider(Arc::new(builtins::provider()))
}

fn load_descriptor(path: &Path) -> Result<FunctionDescriptor> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut fndesc: FunctionDescriptor =
        serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
    if fndesc.qualified_name.is_empty() {
        fndesc.qualified_name = fndesc.name.clone();
    }
    Ok(fndesc)
}

fn compile_file(input: &Path, args: &[i64], settings: Settings, emit: bool) -> Result<()> {
    let fndesc = load_descriptor(input)?;
    println!("Compiling '{}' (use_mlir = {})", fndesc.display_name(), settings.use_mlir);

    let compiled = compiler(settings).compile(fndesc)?;
    report(&compiled);

    if emit {
        println!("{}", compiled.result.library.to_json()?);
    }

    if settings.no_compile {
        if !args.is_empty() {
            bail!("--args cannot be used with --no-compile");
        }
        return Ok(());
    }

    let value = compiled.call(args)?;
    println!("{}({}) = {}", compiled.state.fndesc.name, join_args(args), value);
    Ok(())
}

fn run_demo(settings: Settings) -> Result<()> {
    let native = compiler(settings.with_use_mlir(true));
    let host = compiler(settings.with_use_mlir(false));

    for (fndesc, args) in builtins::demo_functions() {
        let a = native.compile(fndesc.clone())?;
        let b = host.compile(fndesc)?;
        report(&a);
        report(&b);

        let (x, y) = (a.call(&args)?, b.call(&args)?);
        println!("  {}({}) = {} / {}", a.state.fndesc.name, join_args(&args), x, y);
        if x != y {
            bail!("backends disagree on '{}'", a.state.fndesc.name);
        }
    }
    Ok(())
}

fn report(compiled: &CompiledFunction) {
    let how = match &compiled.result.entry {
        Some(entry) if entry.is_native() => "native artifact",
        Some(_) => "lowered bytecode",
        None => "not compiled",
    };
    println!(
        "  {} pipeline: '{}' -> {} ({} instructions)",
        compiled.pipeline,
        compiled.state.fndesc.display_name(),
        how,
        compiled.result.library.instruction_count()
    );
}

fn join_args(args: &[i64]) -> String {
    args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlc_lower::settings::NO_COMPILE_ENV;

    #[test]
    fn test_demo_runs() {
        assert!(run_demo(Settings::default()).is_ok());
    }

    #[test]
    fn test_compile_file_from_json() {
        let dir = std::env::temp_dir().join(format!("nlc-driver-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("twice.json");
        fs::write(
            &path,
            r#"{"name": "twice", "signature": {"args": ["x"]},
                "bytecode": [{"LoadArg": 0}, {"LoadConst": 2}, {"Binary": "Mul"}, "Return"]}"#,
        )
        .unwrap();

        let fndesc = load_descriptor(&path).unwrap();
        assert_eq!(fndesc.qualified_name, "twice");
        assert!(compile_file(&path, &[21], Settings::default(), false).is_ok());

        fs::remove_dir_all(&dir).unwrap();
    }

    fn demo_path(name: &str) -> String {
        format!("{}/../demos/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn env_with(pairs: &[(&str, &str)]) -> Settings {
        Settings::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[test]
    fn test_no_compile_from_environment_is_honored() {
        let env = env_with(&[(NO_COMPILE_ENV, "1")]);
        let cli = Cli::try_parse_from(["nlc", "compile", &demo_path("add.json"), "--args", "1,2"]).unwrap();

        let err = run(cli, env).unwrap_err();
        assert!(err.to_string().contains("--no-compile"));
    }

    #[test]
    fn test_no_compile_flag_overrides_environment() {
        let env = env_with(&[(NO_COMPILE_ENV, "1")]);
        let add = demo_path("add.json");

        let cli = Cli::try_parse_from(["nlc", "compile", &add, "--no-compile", "false", "--args", "1,2"]).unwrap();
        assert!(run(cli, env).is_ok());

        let cli = Cli::try_parse_from(["nlc", "compile", &add, "--no-compile"]).unwrap();
        assert!(run(cli, Settings::default()).is_ok());
    }
}
