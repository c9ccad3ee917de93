use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ledger_analyzer::cli::setup::setup;
use ledger_analyzer::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for ledger_analyzer::AppCommand {
    fn from(cmd: Commands) -> ledger_analyzer::AppCommand {
        use ledger_analyzer::AppCommand;
        match cmd {
            Commands::Import { file } => AppCommand::Import { file },
            Commands::Stats {
                user,
                from,
                to,
                group_by,
            } => AppCommand::Stats {
                user_id: user,
                from,
                to,
                group_by,
            },
            Commands::Forecast {
                user,
                period,
                ahead,
            } => AppCommand::Forecast {
                user_id: user,
                period,
                periods_ahead: ahead,
            },
            Commands::Anomalies { user, period } => AppCommand::Anomalies {
                user_id: user,
                period,
            },
            Commands::Recurring { user } => AppCommand::Recurring { user_id: user },
            Commands::Report { user, period } => AppCommand::Report {
                user_id: user,
                period,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Import transactions from a JSON array
    Import { file: PathBuf },
    /// Income, expense and category totals per period
    Stats {
        #[arg(short, long)]
        user: String,
        /// Range start, YYYY-MM-DD or RFC 3339
        #[arg(long)]
        from: Option<String>,
        /// Range end, inclusive
        #[arg(long)]
        to: Option<String>,
        /// month, quarter or year
        #[arg(short, long)]
        group_by: Option<String>,
    },
    /// Project income and expense for upcoming periods
    Forecast {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        period: Option<String>,
        /// Number of periods to project
        #[arg(short, long, default_value_t = 3, allow_negative_numbers = true)]
        ahead: i32,
    },
    /// Categories with unusual spending in the latest period
    Anomalies {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        period: Option<String>,
    },
    /// Recurring payments expected soon
    Recurring {
        #[arg(short, long)]
        user: String,
    },
    /// Forecast, anomalies and recurring payments together
    Report {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        period: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => ledger_analyzer::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
