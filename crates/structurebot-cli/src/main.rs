use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use structurebot_cli::commands::check::{handle_check, CheckCommandArgs};
use structurebot_cli::commands::lookup::handle_type;
use structurebot_cli::logging::{init_logging, LoggingConfig};
use structurebot_cli::output::OutputFormat;
use structurebot_lib::time::parse_timestamp;
use structurebot_lib::{Config, MAX_FUEL_WARNING_DAYS};

#[derive(Parser, Debug)]
#[command(author, version, about = "EVE Online corporation structure monitor")]
struct Cli {
    /// CSV type catalog; takes precedence over the SDE export.
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "static_data")]
    types: Option<PathBuf>,

    /// SQLite static data export.
    #[arg(long, global = true, value_name = "PATH")]
    static_data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check fuel, quantum cores and unanchoring for a corporation's structures.
    Check(CheckArgs),
    /// Resolve an item type and print its fuel attributes.
    Type {
        /// Exact type name, e.g. "Standup Manufacturing Plant I".
        name: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Corporation name (defaults to STRUCTUREBOT_CORPORATION).
    #[arg(long)]
    corporation: Option<String>,

    /// Post findings to the configured Slack webhook.
    #[arg(long)]
    notify: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Warn when fuel runs out within this many days.
    #[arg(
        long,
        value_name = "DAYS",
        value_parser = clap::value_parser!(i64).range(1..=MAX_FUEL_WARNING_DAYS)
    )]
    fuel_warning_days: Option<i64>,

    /// Evaluate as of an RFC 3339 timestamp instead of now.
    #[arg(long, value_name = "TIMESTAMP", value_parser = parse_at)]
    at: Option<DateTime<Utc>>,
}

fn parse_at(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_timestamp(value).map_err(|err| err.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LoggingConfig::from_env());

    let mut config = Config::from_env().context("failed to read configuration")?;
    if let Some(path) = cli.types {
        config.types = Some(path);
    }
    if let Some(path) = cli.static_data {
        config.static_data = Some(path);
        config.types = None;
    }

    match cli.command {
        Command::Check(args) => handle_check(
            &config,
            &CheckCommandArgs {
                corporation: args.corporation,
                notify: args.notify,
                format: args.format,
                fuel_warning_days: args.fuel_warning_days,
                at: args.at,
            },
        ),
        Command::Type { name, format } => handle_type(&config, &name, format),
    }
}
