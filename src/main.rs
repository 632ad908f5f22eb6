//! statgraph - Field-resolving aggregation cache for US state statistics
//!
//! Main entry point for the statgraph CLI.

use clap::{Parser, Subcommand};
use statgraph::config::StatGraphConfig;
use statgraph::resolve::{FieldRequest, QueryRequest, StatService};
use statgraph::source::DataUsaSource;
use statgraph::stats;
use statgraph::web::QueryServer;
use std::process;
use std::sync::Arc;

/// statgraph - cached query service over the DataUSA statistics API
#[derive(Parser, Debug)]
#[command(name = "statgraph")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/statgraph/config.yaml)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP query server
    Serve {
        /// Bind address (overrides config)
        #[arg(short, long)]
        addr: Option<String>,
    },

    /// List states, optionally filtered by name prefix
    States {
        /// Case-insensitive name prefix
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Summarize commute statistics for one state
    Commute {
        /// State name prefix (e.g. "alab")
        state: String,

        /// Restrict to one year
        #[arg(short, long)]
        year: Option<String>,
    },

    /// Degrees awarded by concentration area for one state
    Degrees {
        /// State name prefix
        state: String,

        /// Restrict to one year
        #[arg(short, long)]
        year: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize logging
    if let Err(e) = statgraph::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> statgraph::Result<()> {
    let config = match &cli.config {
        Some(path) => StatGraphConfig::load(path)?,
        None => StatGraphConfig::load_default()?,
    };

    let source = Arc::new(DataUsaSource::with_base_url(config.source.base_url.as_str())?);
    let service = Arc::new(StatService::new(source));

    match cli.command {
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.server.bind_addr.clone());
            let server = QueryServer::new(service, config.server.cache_max_age_secs);
            server.run(&addr).await
        }

        Commands::States { name } => {
            let states = service.states(name.as_deref()).await?;
            if states.is_empty() {
                println!("No matching states");
                return Ok(());
            }
            for state in states {
                println!("{}  {}  ({})", state.id, state.name, state.slug);
            }
            Ok(())
        }

        Commands::Commute { state, year } => {
            let request = QueryRequest {
                name: Some(state.clone()),
                commute_times: Some(field_request(&year)),
                commute_methods: Some(field_request(&year)),
                ..Default::default()
            };

            let views = service.resolve(&request).await?;
            let view = views
                .first()
                .ok_or_else(|| statgraph::StatGraphError::Other(format!("No state matches '{}'", state)))?;

            let times = view.commute_times.as_deref().unwrap_or_default();
            let methods = view.commute_methods.as_deref().unwrap_or_default();

            println!("Commute summary for {}", view.name);
            println!("  Total commuters:  {}", stats::total_commuters(times));
            match stats::average_travel_time(times) {
                Some(minutes) => println!("  Avg commute time: {:.1} minutes", minutes),
                None => println!("  Avg commute time: N/A"),
            }
            match stats::popular_method(methods) {
                Some((method, count)) => println!("  Popular method:   {} ({})", method, count),
                None => println!("  Popular method:   N/A"),
            }
            Ok(())
        }

        Commands::Degrees { state, year } => {
            let request = QueryRequest {
                name: Some(state.clone()),
                concentrations: Some(field_request(&year)),
                ..Default::default()
            };

            let views = service.resolve(&request).await?;
            let view = views
                .first()
                .ok_or_else(|| statgraph::StatGraphError::Other(format!("No state matches '{}'", state)))?;

            let records = view.concentrations.as_deref().unwrap_or_default();
            let totals = stats::degrees_by_area(records);
            if totals.is_empty() {
                println!("No concentration data for {}", view.name);
                return Ok(());
            }

            println!("Degrees awarded in {}", view.name);
            for total in totals {
                println!("  area {}  {}  {}", total.area, total.year, total.number_awarded);
            }
            Ok(())
        }
    }
}

fn field_request(year: &Option<String>) -> FieldRequest {
    match year {
        Some(year) => FieldRequest::year(year.clone()),
        None => FieldRequest::all(),
    }
}
