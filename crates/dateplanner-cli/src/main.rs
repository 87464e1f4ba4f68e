use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dateplanner-cli", version, about = "Dateplanner CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every stage and the running countdown as JSON
    Status,
    /// Stage operations
    Stage {
        #[command(subcommand)]
        action: commands::stage::StageAction,
    },
    /// Front-matter screens
    Intro {
        #[command(subcommand)]
        action: commands::intro::IntroAction,
    },
    /// Wait for the running countdown, printing the remaining time
    Watch,
    /// Print the confirmed choices
    Summary,
    /// Discard all progress (the user identity is kept)
    Restart,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    // Logs go to stderr; stdout carries JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Status => commands::status::run_status(),
        Commands::Stage { action } => commands::stage::run(action),
        Commands::Intro { action } => commands::intro::run(action),
        Commands::Watch => commands::watch::run(),
        Commands::Summary => commands::status::run_summary(),
        Commands::Restart => commands::status::run_restart(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
