use clap::{Parser, Subcommand};
use taskstrike_core::storage::Config;
use tracing::info;

mod commands;

#[derive(Parser)]
#[command(name = "taskstrike", version, about = "Pomodoro-style task timer with history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a countdown for a task
    Run {
        /// Name of the task
        task_name: String,
        /// Duration in minutes (config default when omitted)
        duration_min: Option<u32>,
    },
    /// Add a task to the to-do list
    Add {
        /// Name of the task
        task_name: String,
        /// Duration in minutes
        duration_min: u32,
    },
    /// To-do list management
    Todo {
        #[command(subcommand)]
        action: commands::todo::TodoAction,
    },
    /// Task history
    History {
        /// JSON output
        #[arg(long)]
        json: bool,
    },
    /// Aggregate statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);
    info!("application started");

    let result = match cli.command {
        Commands::Run {
            task_name,
            duration_min,
        } => commands::run::run(&config, task_name, duration_min),
        Commands::Add {
            task_name,
            duration_min,
        } => commands::todo::add(task_name, duration_min),
        Commands::Todo { action } => commands::todo::run(action),
        Commands::History { json } => commands::history::run(json),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(config: &Config) {
    let filter = std::env::var("TASKSTRIKE_LOG").unwrap_or_else(|_| {
        format!(
            "taskstrike={0},taskstrike_core={0}",
            config.logging.level
        )
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
