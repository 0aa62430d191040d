use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "search-ads-cli", version, about = "Apple Search Ads CLI")]
struct Cli {
    /// Log requests and replay progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Campaign management
    Campaigns {
        #[command(subcommand)]
        action: commands::campaigns::CampaignsAction,
    },
    /// Deferred save queue
    Queue {
        #[command(subcommand)]
        action: commands::queue::QueueAction,
    },
    /// Report downloads
    Report {
        #[command(subcommand)]
        action: commands::report::ReportAction,
    },
    /// Local store snapshots
    Store {
        #[command(subcommand)]
        action: commands::store::StoreAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Campaigns { action } => commands::campaigns::run(action),
        Commands::Queue { action } => commands::queue::run(action),
        Commands::Report { action } => commands::report::run(action),
        Commands::Store { action } => commands::store::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
