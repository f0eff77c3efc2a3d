#![forbid(unsafe_code)]

mod cmd;
mod jira;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    author,
    version,
    about = "tally: flow metrics from issue-tracker change history",
    long_about = None
)]
struct Cli {
    /// Output format (defaults to pretty on a TTY, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Config file (.toml, .yaml, .yml or .json). Defaults to .tally/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Metrics",
        about = "Compute every flow metric",
        long_about = "Reconstruct item histories and report cycle time, lead time, queue time, throughput, cumulative queue time and return-to-testing.",
        after_help = "EXAMPLES:\n    # Report from a saved Jira export\n    tally report --input export.json\n\n    # Query Jira directly\n    tally report --jira-server https://jira.example.com --jira-jql \"project = OPS\"\n\n    # Emit machine-readable output\n    tally report --input export.json --format json"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        next_help_heading = "Metrics",
        about = "Show one reconstructed item",
        long_about = "Show the reconstructed timing profile of a single item by key.",
        after_help = "EXAMPLES:\n    # Show an item from an export\n    tally show OPS-12 --input export.json\n\n    # Emit machine-readable output\n    tally show OPS-12 --input export.json --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Print the effective configuration",
        long_about = "Print the configuration commands would use, with environment overrides applied and the token redacted.",
        after_help = "EXAMPLES:\n    # Show effective config\n    tally config\n\n    # Use an explicit config file\n    tally --config tally.yaml config"
    )]
    Config(cmd::config::ConfigArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    tally completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "tally=debug,info"
        } else {
            "tally=info,warn"
        })
    });

    let format = env::var("TALLY_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;
    let config_path = cli.config.as_deref();

    match &cli.command {
        Commands::Report(args) => {
            cmd::report::run_report(args, config_path, output, &project_root)
        }
        Commands::Show(args) => cmd::show::run_show(args, config_path, output, &project_root),
        Commands::Config(args) => {
            cmd::config::run_config(args, config_path, output, &project_root)
        }
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args, &mut command)
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let output = output::resolve_output_mode(cli.format, cli.json);
    debug!(?output, "output mode resolved");

    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cli_error = match err.downcast::<CliError>() {
                Ok(cli_error) => cli_error,
                Err(other) => CliError::new(format!("{other:#}")),
            };
            if let Err(render_err) = output::render_error(output, &cli_error) {
                eprintln!("error: {} ({render_err})", cli_error.message);
            }
            ExitCode::FAILURE
        }
    }
}
