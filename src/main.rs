//! CLI entry point for `pgtyped`.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use pgtyped::error::GenerateError;
use pgtyped::generator::pipeline::generate_bindings;
use pgtyped::introspect::catalog::TypeMapping;
use pgtyped::introspect::postgres::PgConnector;
use pgtyped::output::formatter::{run_formatter, FormatOutcome, FormatterCommand};
use pgtyped::output::writer::write_output;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pgtyped",
    about = "Generate typed Python bindings for annotated SQL queries against a live PostgreSQL database"
)]
struct Cli {
    /// Annotated SQL file
    input: PathBuf,

    /// PostgreSQL connection URI
    db_url: String,

    /// JSON object mapping PostgreSQL type names to host types
    #[arg(long)]
    type_overrides: Option<PathBuf>,

    /// Skip the `uv run ruff format` pass over the generated file
    #[arg(long)]
    no_format: bool,

    /// Print debug diagnostics
    #[arg(long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_mapping(path: Option<&Path>) -> Result<TypeMapping, GenerateError> {
    let mapping = TypeMapping::postgres();
    let Some(path) = path else {
        return Ok(mapping);
    };
    let content = std::fs::read_to_string(path).map_err(|source| GenerateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    mapping
        .with_overrides_json(&content)
        .map_err(GenerateError::TypeOverrides)
}

fn run(cli: &Cli) -> Result<PathBuf, GenerateError> {
    let mapping = load_mapping(cli.type_overrides.as_deref())?;
    let connector = PgConnector::new(&cli.db_url);
    let file = generate_bindings(&cli.input, &connector, &mapping)?;
    write_output(&cli.input, &file)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = match run(&cli) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {e}");
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            process::exit(2);
        }
    };
    info!(path = %output.display(), "wrote bindings");

    if cli.no_format {
        return;
    }
    match run_formatter(&FormatterCommand::default(), &output) {
        FormatOutcome::Formatted => {}
        FormatOutcome::Unavailable(message) | FormatOutcome::Failed(message) => {
            warn!(path = %output.display(), "formatter did not run cleanly: {message}");
        }
    }
}
