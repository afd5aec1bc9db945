use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod classifier;
mod error;
mod impact;
mod language;
mod naming;
mod report;
mod role;
mod source_unit;
mod usage;

#[derive(Parser, Debug)]
#[command(name = "column-impact")]
#[command(
    about = "Find the Java classes and API routes impacted by a change of a database column",
    long_about = None
)]
/// Arguments received by the main command.
///
/// ## Arguments:
/// - `path` (`String`): Path to the project to analyze, defaults to current directory,
/// - `column` (`String`): Column to look for,
/// - `output` (`Option<String>`): Where to write the report, defaults to a dated file name,
/// - `json` (`bool`): true to print the result as JSON instead of writing a report,
/// - `debug` (`bool`): true to display more info, defaults to false.
struct Args {
    #[arg(short, long, default_value_t = String::from("."))]
    /// Path to the project to analyze.
    path: String,
    #[arg(short, long)]
    /// Database column to look for, eg. user_email.
    column: String,
    #[arg(short, long)]
    /// Report file, must end with .json.
    output: Option<String>,
    #[arg(short, long)]
    /// Print the analysis result as JSON on the standard output.
    json: bool,
    #[arg(short, long)]
    /// Display more information.
    debug: bool,
}

/// Logs go to stderr so that `--json` output stays parsable.
/// `RUST_LOG` wins over the `--debug` flag.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("column_impact={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the column impact analysis with the arguments from `Args`.
/// - Check the arguments,
/// - Analyze the project,
/// - Print the result as JSON, or write the report and display a summary.
///
/// ## Returns:
/// - (`Result<()>`): Ok if no critical error, else description of the error.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);
    debug!("Arguments: {:?}", args);

    let output: Option<PathBuf> = match (&args.output, args.json) {
        (Some(output), _) => Some(report::validate_output_path(output)?),
        (None, false) => Some(PathBuf::from(report::default_report_file_name(
            &args.column,
            Local::now(),
        ))),
        (None, true) => None,
    };

    let result = match impact::analyze(&args.path, &args.column) {
        Ok(result) => result,
        Err(analysis_error) => {
            error!("Analysis failed: {}", analysis_error);
            return Err(analysis_error.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    if let Some(output) = &output {
        report::write_report(&result, output)?;
    }
    if !args.json {
        report::print_summary(&result, output.as_deref());
    }
    Ok(())
}
