pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use cardwise_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use clap::{Parser, Subcommand};

use crate::commands::cards::CardLinkArgs;
use crate::commands::click::ClickArgs;
use crate::commands::import::ImportArgs;
use crate::commands::recommend::RecommendArgs;
use crate::commands::review::{PendingArgs, ReviewArgs};
use crate::commands::stats::StatsArgs;

#[derive(Debug, Parser)]
#[command(
    name = "cardwise",
    about = "Cardwise campaign matching CLI",
    long_about = "Rank credit-card campaigns for a cart, record engagement, and maintain \
                  the campaign catalog.",
    after_help = "Examples:\n  cardwise seed\n  cardwise recommend --amount 500 --category \
                  grocery --card 1\n  cardwise import --bank-id 2 --file feed.json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file to load instead of the default locations")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Database URL override")]
    database_url: Option<String>,
    #[arg(long, global = true, help = "Log level override (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations")]
    Migrate,
    #[command(about = "Load the demo bank, card, merchant and campaign catalog")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Rank existing-card and new-card campaigns for a cart")]
    Recommend {
        #[command(flatten)]
        args: RecommendArgs,
        #[arg(long, help = "Override recommendations.top_n for this run")]
        top_n: Option<usize>,
    },
    #[command(about = "Record a click on a recommended campaign and resolve its redirect")]
    Click(ClickArgs),
    #[command(about = "Link or unlink a card for a user")]
    Cards(CardLinkArgs),
    #[command(about = "Import a bank campaign feed from a JSON file")]
    Import(ImportArgs),
    #[command(about = "Approve or reject a campaign awaiting review")]
    Review(ReviewArgs),
    #[command(about = "List campaigns awaiting review")]
    Pending(PendingArgs),
    #[command(about = "Report shown and click counts for a campaign")]
    Stats(StatsArgs),
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                database_url: self.database_url.clone(),
                log_level: self.log_level.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let mut options = cli.load_options();

    // A broken config is reported by the command itself; logging falls back to defaults.
    let logging_config = AppConfig::load(options.clone()).unwrap_or_default();
    init_logging(&logging_config);

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Config => commands::config::run(options),
        Command::Recommend { args, top_n } => {
            options.overrides.top_n = top_n;
            commands::recommend::run(options, args)
        }
        Command::Click(args) => commands::click::run(options, args),
        Command::Cards(args) => commands::cards::run(options, args),
        Command::Import(args) => commands::import::run(options, args),
        Command::Review(args) => commands::review::run(options, args),
        Command::Pending(args) => commands::review::pending(options, args),
        Command::Stats(args) => commands::stats::run(options, args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the command payload.
fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
