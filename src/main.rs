mod aws;
mod config;
mod error;
mod operation;
mod output;
mod prompt;

/// Version injected at compile time via LAMCTL_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("LAMCTL_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{anyhow, Result};
use aws::client::SdkLambdaClient;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use config::Config;
use error::{ClientError, ShimError};
use operation::registry::OperationDef;
use operation::{execute, find_operation, operation_command, registry, ExecutionOptions, Outcome, ParsedArgs};
use output::{write_value, OutputFormat};
use prompt::TerminalConfirm;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command-line client for AWS Lambda
#[derive(Parser, Debug)]
#[command(
    name = "lamctl",
    version = VERSION,
    about,
    long_about = None,
    after_help = "Operation parameters follow the operation name, e.g.\n  lamctl invoke --FunctionName my-fn --Payload '{\"id\":1}'\n  lamctl list-aliases --help\nGlobal options may appear before or after the operation."
)]
struct Args {
    /// AWS profile to use
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// AWS region to use
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Custom AWS endpoint URL (for LocalStack, etc.). Also reads from AWS_ENDPOINT_URL env var.
    #[arg(long, global = true)]
    endpoint_url: Option<String>,

    /// Output format (defaults to the configured format, then json)
    #[arg(short, long, value_enum, global = true)]
    output: Option<OutputFormat>,

    /// Log level for debugging (logs to platform config dir: Linux ~/.config/lamctl/lamctl.log, macOS ~/Library/Application Support/lamctl/lamctl.log, Windows %APPDATA%/lamctl/lamctl.log)
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Run in read-only mode (block all mutating operations)
    #[arg(long, global = true)]
    readonly: bool,

    /// List available operations
    #[arg(long)]
    list: bool,

    /// Remember the resolved profile and region as defaults
    #[arg(long, global = true)]
    save_defaults: bool,
}

/// Top-level command with one subcommand per catalogued operation
fn cli(operations: &[OperationDef]) -> clap::Command {
    Args::command()
        .subcommands(operations.iter().map(operation_command))
        .subcommand_value_name("OPERATION")
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {}", log_path.display(), e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("lamctl {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    config::config_dir()
        .map(|dir| dir.join("lamctl.log"))
        .unwrap_or_else(|| PathBuf::from("lamctl.log"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let operations = match registry() {
        Ok(operations) => operations,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let matches = cli(operations).get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // Keep the guard alive for the duration of the program
    let _log_guard = setup_logging(args.log_level);

    match run(args, operations, matches.subcommand()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {err:#}");
            if let Some(ShimError::Remote(ClientError::Service {
                status, request_id, ..
            })) = err.downcast_ref::<ShimError>()
            {
                let status = status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
                eprintln!("  HTTP status: {}, request id: {}", status, request_id.as_deref().unwrap_or("-"));
            }
            match err.downcast_ref::<ShimError>() {
                Some(e) if e.is_configuration_error() => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(args: Args, operations: &[OperationDef], operation: Option<(&str, &ArgMatches)>) -> Result<()> {
    let Some((name, matches)) = operation.filter(|_| !args.list) else {
        print_catalogue(operations);
        return Ok(());
    };

    let op = find_operation(operations, name).ok_or_else(|| anyhow!("unknown operation '{}'", name))?;
    let parsed = ParsedArgs::from_matches(op, matches);

    let mut config = Config::load();
    let profile = args.profile.clone().unwrap_or_else(|| config.effective_profile());
    let region = args.region.clone().unwrap_or_else(|| config.effective_region());
    let endpoint_url = args.endpoint_url.clone().or_else(|| config.effective_endpoint_url());
    let format = args.output.unwrap_or(config.output);

    if args.save_defaults {
        config.set_profile(&profile)?;
        config.set_region(&region)?;
    }

    let client = SdkLambdaClient::connect(&profile, &region, endpoint_url).await;
    tracing::info!("Using profile '{}' in {} ({})", profile, region, client.endpoint());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let options = ExecutionOptions {
        readonly: args.readonly || config.readonly,
        confirm_threshold: config.confirm_threshold,
        confirm: &TerminalConfirm,
        cancel,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut write_error = None;
    let outcome = execute(&client, op, parsed, &options, &mut |value| {
        if write_error.is_none() {
            write_error = write_value(&mut out, &value, format).err();
        }
    })
    .await?;

    if let Some(err) = write_error {
        return Err(err);
    }

    match outcome {
        Outcome::Declined => eprintln!("{} was not run.", op.name),
        Outcome::Completed { emitted } => tracing::info!("{} completed, {} value(s) written", op.name, emitted),
    }
    Ok(())
}

fn print_catalogue(operations: &[OperationDef]) {
    let width = operations.iter().map(|op| op.name.len()).max().unwrap_or(0);
    println!("Available operations:\n");
    for op in operations {
        let marker = if op.is_mutating() { format!(" [{}]", op.impact.label()) } else { String::new() };
        println!("  {:width$}  {}{}", op.name, op.description, marker, width = width);
    }
    println!("\nRun 'lamctl <operation> --help' for its parameters.");
}
