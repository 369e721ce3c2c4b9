use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use tracing::info;

use crate::config::{LogConfig, OutputTarget};
use crate::generator::{check_output, gen_code, write_output, CheckOutcome};
use crate::logging::init_logging;
use crate::spec::{load_package, parse_args, parse_files};

/// Command-line interface for apigen
///
/// Generates HTTP dispatch, parameter binding and validation code from
/// annotated service methods and parameter structs.
#[derive(Parser, Debug)]
#[command(name = "apigen", version)]
#[command(about = "Generate HTTP RPC boilerplate from annotated Rust sources", long_about = None)]
pub struct Cli {
    /// Source directory, or source files within one directory
    #[arg(required = true, value_name = "SRC")]
    pub inputs: Vec<PathBuf>,

    /// Package to generate when the sources declare more than one
    #[arg(short, long)]
    pub package: Option<String>,

    /// Output file; `-` prints to stdout (default: <dir>/<package>_apigen.rs)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Fail when the output file is not up to date instead of writing it
    #[arg(long, default_value_t = false)]
    pub check: bool,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Parse the process arguments, set up logging and run.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env(cli.verbose))?;
    run(&cli)
}

/// Run one generation with already parsed arguments.
///
/// Nothing is written unless every stage succeeds.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let inputs = parse_args(&cli.inputs)?;
    let files = load_package(&inputs, cli.package.as_deref())?;
    let pkg = parse_files(&files)?;
    let code = gen_code(&pkg)?;

    let target = OutputTarget::resolve(cli.output.as_deref(), &inputs.dir, &pkg.package_name);

    if !cli.check {
        return write_output(&target, &code);
    }

    let OutputTarget::File(path) = &target else {
        bail!("--check compares against a file, not stdout");
    };
    match check_output(path, &code)? {
        CheckOutcome::UpToDate => {
            info!(path = %path.display(), "generated code is up to date");
            Ok(())
        }
        CheckOutcome::Stale => bail!("{} is out of date", path.display()),
        CheckOutcome::Missing => bail!("{} does not exist", path.display()),
    }
}
