use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tlc::bytecode::disasm::disassemble;
use tlc::runtime::{Vm, VmConfig};
use tlc::CompilerConfig;

/// Compile a program to a class unit.
#[derive(Debug, Parser)]
#[command(name = "tlc", version)]
struct Args {
    /// Source file
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the compiled class
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print each rule application
    #[arg(long)]
    trace: bool,

    /// Print a listing of the generated code
    #[arg(long)]
    listing: bool,

    /// Run the compiled code on the reference interpreter
    #[arg(long)]
    run: bool,

    /// Stop the interpreter after this many instructions
    #[arg(long)]
    max_steps: Option<usize>,

    #[arg(long, default_value = "Main")]
    class_name: String,

    #[arg(long, default_value = "main")]
    entry_point: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;

    let config = CompilerConfig {
        class_name: args.class_name.clone(),
        entry_point: args.entry_point.clone(),
        trace: args.trace,
        ..CompilerConfig::default()
    };
    let compiled = tlc::compile_with_config(&source, &config)
        .with_context(|| format!("failed to compile '{}'", args.input.display()))?;

    if args.trace {
        for line in &compiled.trace {
            eprintln!("{}", line);
        }
    }

    if args.listing {
        print!("{}", disassemble(&compiled.class));
    }

    if let Some(output) = &args.output {
        let bytes = compiled.class.to_bytes()?;
        fs::write(output, bytes)
            .with_context(|| format!("failed to write '{}'", output.display()))?;
    }

    if args.run {
        let mut vm = Vm::with_config(VmConfig {
            max_steps: args.max_steps,
            ..VmConfig::default()
        });
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        vm.run(&compiled.class, &mut out)?;
        out.flush()?;
    }

    Ok(())
}
