//! Courtside CLI - live basketball scoring from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod simulate;

/// Courtside - offline-first live basketball scoring
#[derive(Parser, Debug)]
#[command(name = "courtside")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Data directory (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a scripted match against an in-memory backend
    Simulate {
        /// Number of scoring-table actions to play
        #[arg(long, default_value_t = 80)]
        actions: u32,
        /// Action number at which the network drops
        #[arg(long)]
        offline_from: Option<u32>,
        /// Action number at which the network returns
        #[arg(long, requires = "offline_from")]
        offline_until: Option<u32>,
        /// Seed for the action script
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show this installation's device id, creating it if missing
    Device,

    /// Inspect the offline queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
enum QueueCommands {
    /// List pending entries and the failed total
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let mut config = courtside_sync::SyncConfig::load();
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }

    let result = match cli.command {
        Commands::Simulate {
            actions,
            offline_from,
            offline_until,
            seed,
        } => {
            let script = simulate::Script {
                actions,
                offline_from,
                offline_until,
                seed: seed.unwrap_or_else(rand::random),
            };
            simulate::run(&config, &script).await
        }
        Commands::Device => commands::device(&config),
        Commands::Queue { command } => match command {
            QueueCommands::Status => commands::queue_status(&config),
        },
        Commands::Version => {
            println!("courtside {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8, format: LogFormat) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("courtside={log_level}").into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_simulate_with_outage() {
        let cli = Cli::try_parse_from([
            "courtside",
            "simulate",
            "--offline-from",
            "10",
            "--offline-until",
            "20",
            "--seed",
            "7",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate {
                offline_from,
                offline_until,
                seed,
                ..
            } => {
                assert_eq!(offline_from, Some(10));
                assert_eq!(offline_until, Some(20));
                assert_eq!(seed, Some(7));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn offline_until_requires_offline_from() {
        assert!(Cli::try_parse_from(["courtside", "simulate", "--offline-until", "5"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "courtside",
            "queue",
            "status",
            "-vv",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
