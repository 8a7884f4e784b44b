use clap::Parser;
use std::path::PathBuf;

use progemit::options::{AlignmentSize, CheckAlgo, Dialect, OptionLevel, Options};
use progemit::program::{emit_to_file, Program};

#[derive(Parser, Debug)]
#[command(
    name = "progemit",
    version,
    about = "Renders an abstract random program as a self-checking C++ test"
)]
struct Cli {
    /// Abstract program (JSON)
    program: PathBuf,

    /// Output file path
    #[arg(short, long, default_value = "driver.cpp")]
    output: PathBuf,

    /// Target dialect
    #[arg(long, value_enum, default_value_t = Dialect::Cxx)]
    std: Dialect,

    /// Checksum algorithm: asserts, hash or precompute
    #[arg(long, default_value = "precompute")]
    check_algo: String,

    /// Keep symbols the generator marked as dead
    #[arg(long)]
    allow_dead_data: bool,

    /// Pass input symbols to `test` as arguments
    #[arg(long, value_enum, default_value_t = OptionLevel::None)]
    inp_as_args: OptionLevel,

    /// Attach alignment attributes to arrays
    #[arg(long, value_enum, default_value_t = OptionLevel::None)]
    emit_align_attr: OptionLevel,

    /// Array alignment; `max` picks one at random
    #[arg(long, value_enum, default_value_t = AlignmentSize::Max)]
    align_size: AlignmentSize,

    /// Use one alignment size for every array
    #[arg(long)]
    unique_align_size: bool,

    /// Seed of the emission RNG
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// External helper functions (JSON)
    #[arg(long)]
    functions: Option<PathBuf>,

    /// Log emission phases
    #[arg(long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "progemit=debug" } else { "progemit=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(e: progemit::error::EmitError) -> ! {
    eprintln!("progemit: error: {}", e);
    std::process::exit(if e.is_io() { 2 } else { 1 });
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let check_algo: CheckAlgo = cli.check_algo.parse().unwrap_or_else(|e| fail(e));

    let mut program = Program::from_path(&cli.program)
        .unwrap_or_else(|e| fail(e))
        .with_zero_var();
    if let Some(path) = &cli.functions {
        program
            .functions
            .extend(progemit::functions::load_functions(path));
    }

    let options = Options {
        std: cli.std,
        check_algo,
        allow_dead_data: cli.allow_dead_data,
        inp_as_args: cli.inp_as_args,
        emit_align_attr: cli.emit_align_attr,
        align_size: cli.align_size,
        unique_align_size: cli.unique_align_size,
        seed: cli.seed,
    };

    tracing::debug!(
        program = %cli.program.display(),
        output = %cli.output.display(),
        inputs = program.inputs.vars.len() + program.inputs.arrays.len(),
        outputs = program.outputs.vars.len() + program.outputs.arrays.len(),
        "emitting"
    );

    match emit_to_file(&program, &options, &cli.output) {
        Ok(emitted) => {
            if let Some(seed) = emitted.expected_seed {
                tracing::info!(seed, "expected checksum");
            }
        }
        Err(e) => fail(e),
    }
}
