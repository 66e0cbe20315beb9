#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the rally impact analysis.
//!
//! Without a subcommand an interactive menu is shown instead.

mod interactive;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rally_impact_geocoder::{Geocoder as _, location_query};
use rally_impact_geocoder::service_registry::{all_services, find_service};
use rally_impact_rally::output::read_augmented_path;
use rally_impact_rally::summary;
use rally_impact_rally_models::ImpactSummary;

#[derive(Parser)]
#[command(
    name = "rally_impact",
    about = "COVID-19 deaths before and after campaign rallies, by county"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Geocode rallies, aggregate county deaths, and write the outputs
    Run(run::RunArgs),
    /// Print the county a place query resolves to
    Geocode {
        /// Place to look up (e.g., "Kenosha, WI" or `--state WI Kenosha`)
        query: String,
        /// Two-letter state appended to the query
        #[arg(long)]
        state: Option<String>,
        /// Geocoding service id
        #[arg(long, env = "RALLY_IMPACT_SERVICE")]
        service: Option<String>,
        /// `City,State,County` table for the `lookup` service
        #[arg(long, env = "RALLY_IMPACT_COUNTIES")]
        counties: Option<PathBuf>,
    },
    /// Recompute the summary of a previously written augmented table
    Summary {
        /// Augmented rally table
        path: PathBuf,
    },
    /// List configured geocoding services
    Services,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = rally_impact_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Run(args) => {
            let summary = run::run(&args, &multi).await?;
            print!("{}", summary::render(&summary));
        }
        Commands::Geocode {
            query,
            state,
            service,
            counties,
        } => {
            let query = match state {
                Some(state) => location_query(&query, &state),
                None => query,
            };
            geocode(&query, service.as_deref(), counties.as_deref()).await?;
        }
        Commands::Summary { path } => {
            let rows = read_augmented_path(&path)?;
            print!("{}", summary::render(&ImpactSummary::from_rows(&rows)));
        }
        Commands::Services => list_services(),
    }

    Ok(())
}

/// Resolves one query and prints the county.
async fn geocode(
    query: &str,
    service: Option<&str>,
    counties: Option<&std::path::Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = find_service(service).ok_or("Unknown or disabled geocoding service")?;
    let geocoder = rally_impact_geocoder::from_service(&service, counties)?;

    let place = geocoder.geocode(query).await?;
    match place.county {
        Some(county) => println!("{query}: {county}"),
        None => {
            log::warn!("No county found for '{query}'");
            println!("{query}: <no county>");
        }
    }
    if let Some(address) = place.formatted_address {
        log::info!("Matched '{address}'");
    }

    Ok(())
}

fn list_services() {
    println!("{:<10} {:<8} {:<9} NAME", "ID", "ENABLED", "PRIORITY");
    println!("{}", "-".repeat(60));
    for service in all_services() {
        println!(
            "{:<10} {:<8} {:<9} {}",
            service.id, service.enabled, service.priority, service.name
        );
    }
}
