use clap::{Parser, Subcommand};
use miette::{Diagnostic, IntoDiagnostic, MietteHandlerOpts, NamedSource, Report, Result};
use reflang_typechecker::typecheck_program;
use reflang_wasm::{compile_program, CompileOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

mod sources;

use sources::SourceUnit;

#[derive(Parser)]
#[command(
    name = "reflang",
    version,
    about = "The Reflang compiler",
    long_about = "Reflang is a small statically-typed language that compiles to WebAssembly."
)]
struct Cli {
    /// Log compiler progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse source files and print their canonical text
    Parse {
        /// Source files or directories (use '-' to read from stdin)
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },

    /// Type-check source files and print the typed program
    Check {
        /// Source files or directories (use '-' to read from stdin)
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },

    /// Compile source files to WebAssembly modules
    Compile {
        /// Source files or directories (use '-' to read from stdin)
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Directory for the generated `.wasm` files
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Print each module as hex instead of writing files
        #[arg(long)]
        hex: bool,

        /// Skip operand-stack validation before encoding
        #[arg(long)]
        no_validate: bool,

        /// Do not export defined functions
        #[arg(long)]
        no_export: bool,

        /// Module name for `extern fn` imports
        #[arg(long, value_name = "NAME", default_value = "env")]
        import_module: String,
    },
}

fn main() {
    setup_miette_handler();

    let cli = Cli::parse();

    if cli.verbose {
        colog::default_builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    let success = match cli.command {
        Some(Commands::Parse { paths }) => run_units(&paths, parse_unit),
        Some(Commands::Check { paths }) => run_units(&paths, check_unit),
        Some(Commands::Compile {
            paths,
            output,
            hex,
            no_validate,
            no_export,
            import_module,
        }) => {
            let options = CompileOptions {
                validate: !no_validate,
                export_functions: !no_export,
                import_module,
                module_name: None,
            };
            run_units(&paths, |unit| {
                compile_unit(unit, &options, output.as_deref(), hex)
            })
        }
        None => {
            // No subcommand provided, show help
            Cli::parse_from(["reflang", "--help"]);
            true
        }
    };

    if !success {
        process::exit(1);
    }
}

fn setup_miette_handler() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .tab_width(4)
                .with_cause_chain()
                .build(),
        )
    }))
    .ok();
}

/// Run `action` over every unit; each one fails independently. Returns
/// whether all of them succeeded.
fn run_units<F>(paths: &[PathBuf], mut action: F) -> bool
where
    F: FnMut(&SourceUnit) -> Result<()>,
{
    let paths = match sources::expand_paths(paths) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("{:?}", e);
            return false;
        }
    };

    let multiple_units = paths.len() > 1;
    let mut success = true;

    for path in paths {
        let result = sources::load(&path).and_then(|unit| {
            action(&unit)?;
            Ok(unit.name)
        });

        match result {
            Ok(name) => {
                if multiple_units {
                    eprintln!("✅ {}", name);
                }
            }
            Err(e) => {
                eprintln!("{:?}", e);
                success = false;
            }
        }
    }

    success
}

/// Wrap a diagnostic with the unit's source so labels render as snippets
fn with_source<E>(unit: &SourceUnit, error: E) -> Report
where
    E: Diagnostic + Send + Sync + 'static,
{
    Report::new(error).with_source_code(NamedSource::new(&unit.name, unit.source.clone()))
}

fn parse_unit(unit: &SourceUnit) -> Result<()> {
    let program =
        reflang_parser::parse_program(&unit.source).map_err(|e| with_source(unit, e))?;
    println!("{}", program);
    Ok(())
}

fn check_unit(unit: &SourceUnit) -> Result<()> {
    let program =
        reflang_parser::parse_program(&unit.source).map_err(|e| with_source(unit, e))?;
    let typed = typecheck_program(&program).map_err(|e| with_source(unit, e))?;

    for signature in typed.functions.iter() {
        log::debug!("{}", signature);
    }
    println!("{}", typed);
    Ok(())
}

fn compile_unit(
    unit: &SourceUnit,
    options: &CompileOptions,
    output_dir: Option<&Path>,
    hex: bool,
) -> Result<()> {
    let options = CompileOptions {
        module_name: Some(unit.stem()),
        ..options.clone()
    };

    let program =
        reflang_parser::parse_program(&unit.source).map_err(|e| with_source(unit, e))?;
    let typed = typecheck_program(&program).map_err(|e| with_source(unit, e))?;
    let module = compile_program(typed, &options).map_err(|e| with_source(unit, e))?;

    if hex {
        println!("{}", module.hex());
        return Ok(());
    }

    let output_path = unit.output_path(output_dir);
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir).into_diagnostic()?;
    }
    fs::write(&output_path, &module.bytes).into_diagnostic()?;
    log::info!(
        "wrote {} ({} bytes)",
        output_path.display(),
        module.bytes.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests;
