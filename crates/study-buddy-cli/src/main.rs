use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Filter used when `STUDY_BUDDY_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "study_buddy=info";

#[derive(Parser)]
#[command(name = "study-buddy", version, about = "Study Buddy CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a study session or inspect lifetime totals
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Print one peer encouragement line
    Line(commands::content::LineArgs),
    /// Preview background check-in notifications
    Notifications(commands::content::NotificationArgs),
    /// Adaptive check-in model
    Adaptive {
        #[command(subcommand)]
        action: commands::adaptive::AdaptiveAction,
    },
    /// Token balance, history and redemptions
    Rewards {
        #[command(subcommand)]
        action: commands::rewards::RewardsAction,
    },
    /// Summary of the last session
    Insights,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STUDY_BUDDY_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Line(args) => commands::content::line(args),
        Commands::Notifications(args) => commands::content::notifications(args),
        Commands::Adaptive { action } => commands::adaptive::run(action),
        Commands::Rewards { action } => commands::rewards::run(action),
        Commands::Insights => commands::insights::run(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
