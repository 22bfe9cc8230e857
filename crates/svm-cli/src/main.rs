//! Stack VM - CLI
//!
//! Command-line interface for building and running stack VM bytecode.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use svm_core::assembler::assemble_listing;
use svm_core::bytecode::disassemble;
use svm_core::{Bytecode, BytecodeLoader, HotLoopCounter, SvmConfig, Value, VirtualMachine};

#[derive(Parser)]
#[command(name = "svm")]
#[command(about = "Stack VM - assemble and run bytecode", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a listing of integer or opcode-name tokens into raw bytecode
    Assemble {
        /// Listing file
        listing: PathBuf,

        /// Output path (default: listing path without its extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify and execute a program
    Run {
        #[command(flatten)]
        input: Input,

        /// Integer argument pushed before execution (default: 0)
        #[arg(long, conflicts_with = "text", allow_negative_numbers = true)]
        int: Option<i64>,

        /// Text argument pushed before execution
        #[arg(long)]
        text: Option<String>,

        /// Stop after this many dispatched instructions
        #[arg(long)]
        step_budget: Option<u64>,

        /// Operand stack slots per frame
        #[arg(long, default_value_t = svm_core::config::DEFAULT_STACK_CAPACITY)]
        stack_capacity: usize,

        /// Report loop headers taken at least this many times
        #[arg(long)]
        hot_threshold: Option<u64>,
    },

    /// Print one line per instruction
    Disasm {
        #[command(flatten)]
        input: Input,
    },

    /// Check that a program is structurally valid
    Verify {
        #[command(flatten)]
        input: Input,
    },
}

#[derive(Args)]
struct Input {
    /// Bytecode file (or listing with --listing)
    file: PathBuf,

    /// Treat the file as a listing and assemble it first
    #[arg(long)]
    listing: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = execute(cli.command) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Assemble { listing, output } => {
            let code = read_listing(&listing)?;
            let output = output.unwrap_or_else(|| default_output(&listing));
            fs::write(&output, code.as_bytes())
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("{} successfully assembled", output.display());
        }

        Commands::Run {
            input,
            int,
            text,
            step_budget,
            stack_capacity,
            hot_threshold,
        } => {
            let code = read_input(&input)?;
            BytecodeLoader::verify(&code).context("invalid bytecode")?;

            let initial = match text {
                Some(s) => Value::Text(s),
                None => Value::Integer(int.unwrap_or(0)),
            };

            let mut config = SvmConfig::new().with_stack_capacity(stack_capacity);
            config.step_budget = step_budget;
            let vm = VirtualMachine::with_config(config);
            debug!(len = code.len(), arg = %initial, "starting run");

            let result = match hot_threshold {
                Some(threshold) => {
                    let mut counter = HotLoopCounter::new(threshold);
                    let result = vm.run_with_observer(&code, initial, &mut counter);
                    for (key, count) in counter.hot_loops() {
                        eprintln!("hot loop at pc {} taken {} times", key.pc, count);
                    }
                    result
                }
                None => vm.run(&code, initial),
            };

            let value = result.context("runtime error")?;
            println!("{}", value.representation());
        }

        Commands::Disasm { input } => {
            let code = read_input(&input)?;
            for line in disassemble(&code).context("cannot disassemble")? {
                println!("{}", line);
            }
        }

        Commands::Verify { input } => {
            let code = read_input(&input)?;
            BytecodeLoader::verify(&code).context("invalid bytecode")?;
            println!("{}: ok ({} bytes)", input.file.display(), code.len());
        }
    }
    Ok(())
}

fn read_input(input: &Input) -> Result<Bytecode> {
    if input.listing {
        return read_listing(&input.file);
    }
    let bytes = fs::read(&input.file)
        .with_context(|| format!("failed to read bytecode file {}", input.file.display()))?;
    Ok(Bytecode::from(bytes))
}

fn read_listing(path: &Path) -> Result<Bytecode> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read listing {}", path.display()))?;
    let code = assemble_listing(&source)
        .with_context(|| format!("failed to assemble {}", path.display()))?;
    if code.is_empty() {
        bail!("{} contains no tokens", path.display());
    }
    Ok(code)
}

/// `prog.lst` -> `prog`; a path with no extension gets `.bc` appended
fn default_output(listing: &Path) -> PathBuf {
    if listing.extension().is_some() {
        listing.with_extension("")
    } else {
        listing.with_extension("bc")
    }
}
