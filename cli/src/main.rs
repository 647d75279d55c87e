use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod output;
mod scan;

use output::{OutputFormat, diagnostic_lines, format_reports};
use scan::{CheckError, FunctionReport, collect_source_paths, load_options, scan_file};

#[derive(Debug, Parser)]
#[command(name = "cmdbind-check")]
#[command(about = "Offline checker for command-line work functions")]
#[command(version)]
struct Cli {
    /// YAML file with compiler options (reserved type names, label separator).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check every annotated work function in the given files or directories.
    Check(CheckArgs),
    /// Print the compiled bindings of one source file.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Rust source files or directories (searched recursively for *.rs).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Number of parallel workers (0 uses one per CPU).
    #[arg(long, default_value_t = 0)]
    jobs: usize,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Rust source file.
    #[arg(long)]
    input: PathBuf,
    /// Only show the work function with this name.
    #[arg(long)]
    function: Option<String>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check(args) => run_check(args, cli.config),
        Command::Inspect(args) => run_inspect(args, cli.config),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_check(args: CheckArgs, config: Option<PathBuf>) -> Result<(), String> {
    let options = load_options(config.as_deref()).map_err(|err| err.to_string())?;
    let paths = collect_source_paths(&args.inputs).map_err(|err| err.to_string())?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs)
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;

    let results: Vec<Result<Vec<FunctionReport>, CheckError>> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| scan_file(path, &options))
            .collect()
    });

    let mut functions = 0usize;
    let mut diagnostics = 0usize;
    let mut unreadable = 0usize;

    for result in results {
        match result {
            Ok(reports) => {
                functions += reports.len();
                for report in &reports {
                    for line in diagnostic_lines(report) {
                        println!("{line}");
                        diagnostics += 1;
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "skipping source file");
                eprintln!("error: {err}");
                unreadable += 1;
            }
        }
    }

    println!(
        "Checked {functions} work function(s) in {} file(s): {diagnostics} diagnostic(s)",
        paths.len()
    );

    if diagnostics > 0 || unreadable > 0 {
        let mut problems = Vec::new();
        if diagnostics > 0 {
            problems.push(format!("{diagnostics} diagnostic(s)"));
        }
        if unreadable > 0 {
            problems.push(format!("{unreadable} unreadable file(s)"));
        }
        return Err(format!("check failed: {}", problems.join(", ")));
    }

    Ok(())
}

fn run_inspect(args: InspectArgs, config: Option<PathBuf>) -> Result<(), String> {
    let options = load_options(config.as_deref()).map_err(|err| err.to_string())?;
    let mut reports = scan_file(&args.input, &options).map_err(|err| err.to_string())?;

    if let Some(ref name) = args.function {
        reports.retain(|report| &report.function == name);
        if reports.is_empty() {
            return Err(format!(
                "No annotated function named '{name}' in '{}'",
                args.input.display()
            ));
        }
    }

    println!("{}", format_reports(&reports, args.format)?);

    let failed = reports
        .iter()
        .filter(|report| !report.diagnostics().is_empty())
        .count();
    if failed > 0 {
        return Err(format!("{failed} work function(s) failed to compile"));
    }

    Ok(())
}
