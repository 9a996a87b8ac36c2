//! Command-line front end for data-guard.
//!
//! ```text
//! data-guard validate --input request.json [--format human|json]
//! data-guard plan --input request.json --table orders
//! data-guard operators
//! ```
//!
//! Input files hold an ingest request: `source_id`, `schema`, `rules` and
//! `data`. `validate` exits with status 1 when the run fails.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use data_guard::config::GuardConfig;
use data_guard::formatters::{FormatterConfig, HumanFormatter, JsonFormatter, ResultFormatter};
use data_guard::logging::setup::{init_logging, SubscriberConfig};
use data_guard::operators::OperatorRegistry;
use data_guard::optimizer::PushdownPlan;
use data_guard::service::{IngestRequest, ValidationService};
use data_guard::{GuardError, Result};

#[derive(Parser, Debug)]
#[command(name = "data-guard")]
#[command(author, version, about = "Validate record batches against rule sets", long_about = None)]
struct Cli {
    /// Log engine activity to stderr
    #[arg(long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the records of a request file
    Validate {
        /// Path to the request JSON file
        #[arg(long)]
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,

        /// Maximum number of failures to print
        #[arg(long)]
        max_errors: Option<usize>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show how the rules of a request file split between SQL and memory
    Plan {
        /// Path to the request JSON file
        #[arg(long)]
        input: PathBuf,

        /// Table the failure query targets
        #[arg(long)]
        table: String,
    },

    /// List the registered operators
    Operators,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose || cli.log_json {
        let config = SubscriberConfig::new()
            .verbose(cli.verbose)
            .json(cli.log_json);
        if let Err(e) = init_logging(config) {
            eprintln!("warning: logging unavailable: {e}");
        }
    }

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Validate {
            input,
            format,
            max_errors,
            no_color,
        } => {
            let request = read_request(&input)?;
            let service = ValidationService::new(GuardConfig::from_env()?)?;
            let result = service.ingest(request).await?;

            let mut config = FormatterConfig::default().with_colors(!no_color);
            if let Some(max) = max_errors {
                config = config.with_max_errors(max);
            }
            let output = match format {
                OutputFormat::Human => HumanFormatter::with_config(config).format(&result)?,
                OutputFormat::Json => JsonFormatter::with_config(config).format(&result)?,
            };
            println!("{output}");

            Ok(if result.is_pass() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Command::Plan { input, table } => {
            let request = read_request(&input)?;
            let pushdown = PushdownPlan::new(&table, &request.rules);

            let report = serde_json::json!({
                "sql_rules": pushdown.plan.sql_rules.iter().map(|r| &r.id).collect::<Vec<_>>(),
                "memory_rules": pushdown.plan.memory_rules.iter().map(|r| &r.id).collect::<Vec<_>>(),
                "sql": pushdown.query.to_sql(),
                "args": pushdown.query.args,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Operators => {
            for name in OperatorRegistry::global().names() {
                println!("{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_request(path: &Path) -> Result<IngestRequest> {
    let body = std::fs::read(path).map_err(|e| {
        GuardError::invalid_request(format!("cannot read {}: {e}", path.display()))
    })?;
    IngestRequest::from_json(&body)
}
