mod commands;
mod config;
mod nutritionix;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_add, cmd_cache_clear, cmd_cache_show, cmd_chart, cmd_clear, cmd_delete, cmd_list,
};
use crate::config::Config;
use crate::nutritionix::NutritionixClient;
use plateful_core::service::FoodLog;

#[derive(Parser)]
#[command(
    name = "plateful",
    version,
    about = "A weekly food log that looks up calories for you",
    long_about = "\n\n  ┌─┐┬  ┌─┐┌┬┐┌─┐┌─┐┬ ┬┬
  ├─┘│  ├─┤ │ ├┤ ├┤ │ ││
  ┴  ┴─┘┴ ┴ ┴ └─┘└  └─┘┴─┘
   breakfast, lunch, dinner.
"
)]
struct Cli {
    /// Keep everything in memory for this run (nothing is saved)
    #[arg(long, global = true)]
    in_memory: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a food, looking up its calories
    Add {
        /// Food description (e.g. "banana", "2 eggs")
        food: String,
        /// Meal type: breakfast, lunch, dinner
        #[arg(short, long, default_value = "breakfast")]
        meal: String,
        /// Day of the week (monday-sunday, mon-sun, default: today)
        #[arg(short, long)]
        day: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry by ID
    Delete {
        /// Entry ID to delete
        entry_id: u64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every entry and the food cache
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List logged entries
    List {
        /// Meal filter: all, breakfast, lunch, dinner
        #[arg(short, long, default_value = "all")]
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weekly calorie totals per meal
    Chart {
        /// Output chart datasets as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or clear the food calorie cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show cached lookups
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget all cached lookups (entries are kept)
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Log to stderr so JSON on stdout stays clean. `PLATEFUL_LOG` takes
/// `EnvFilter` directives, e.g. `PLATEFUL_LOG=plateful_core=debug`.
fn init_logging() {
    let filter = EnvFilter::try_from_env("PLATEFUL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let mut log = if cli.in_memory {
        FoodLog::new_in_memory()?
    } else {
        FoodLog::new(&config.db_path)?
    };
    let lookup = NutritionixClient::new(config.nutritionix.clone())?;

    match cli.command {
        Commands::Add {
            food,
            meal,
            day,
            json,
        } => cmd_add(&mut log, &lookup, &food, &meal, day.as_deref(), json).await,
        Commands::Delete { entry_id, json } => cmd_delete(&mut log, entry_id, json),
        Commands::Clear { yes, json } => cmd_clear(&mut log, yes, json),
        Commands::List { meal, json } => cmd_list(&log, &meal, json),
        Commands::Chart { json } => cmd_chart(&log, json),
        Commands::Cache { command } => match command {
            CacheCommands::Show { json } => cmd_cache_show(&log, json),
            CacheCommands::Clear { json } => cmd_cache_clear(&mut log, json),
        },
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                Some(config.load_or_create_api_key()?.0)
            };
            server::start_server(log, Arc::new(lookup), port, &bind, api_key).await
        }
    }
}
