//! The full analysis: load inputs, geocode, aggregate, write outputs.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use rally_impact_cli_utils::{IndicatifProgress, MultiProgress};
use rally_impact_geocoder::service_registry::find_service;
use rally_impact_geography::StateTable;
use rally_impact_mortality::loader;
use rally_impact_rally::output::{write_augmented_path, write_locations_path};
use rally_impact_rally::resolve::ResolveOptions;
use rally_impact_rally::{
    AnalysisConfig, DEFAULT_FALLBACK_COUNTY, DEFAULT_WINDOW_DAYS, analyze, input,
};
use rally_impact_rally_models::ImpactSummary;

/// Inputs, outputs, and parameters of one analysis run.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Rally table (`City`, `State`, `Date`, optional `Population`)
    #[arg(long, env = "RALLY_IMPACT_RALLIES")]
    pub rallies: PathBuf,
    /// JHU `time_series_covid19_deaths_US.csv`
    #[arg(long, env = "RALLY_IMPACT_DEATHS")]
    pub deaths: PathBuf,
    /// `Abbr,State` table overriding the built-in state names
    #[arg(long, env = "RALLY_IMPACT_STATES")]
    pub states: Option<PathBuf>,
    /// `City,State,County` table for the `lookup` geocoding service
    #[arg(long, env = "RALLY_IMPACT_COUNTIES")]
    pub counties: Option<PathBuf>,
    /// Where to write the augmented rally table
    #[arg(long, env = "RALLY_IMPACT_OUTPUT", default_value = "rallies-augmented.csv")]
    pub output: PathBuf,
    /// Where to write rally coordinates and trends
    #[arg(long, env = "RALLY_IMPACT_LOCATIONS", default_value = "rally-locations.csv")]
    pub locations: PathBuf,
    /// Days on each side of a rally to total
    #[arg(long, env = "RALLY_IMPACT_WINDOW_DAYS", default_value_t = DEFAULT_WINDOW_DAYS)]
    pub window_days: u32,
    /// County used when the geocoder finds none
    #[arg(long, env = "RALLY_IMPACT_FALLBACK_COUNTY", default_value = DEFAULT_FALLBACK_COUNTY)]
    pub fallback_county: String,
    /// Geocoding service id (see `services`); defaults to the highest priority
    #[arg(long, env = "RALLY_IMPACT_SERVICE")]
    pub service: Option<String>,
}

/// Runs the analysis described by `args` and returns its summary.
///
/// # Errors
///
/// Returns an error if an input cannot be read, the geocoding service is
/// unknown or misconfigured, geocoding fails, a rally's state is unknown,
/// or an output cannot be written.
pub async fn run(
    args: &RunArgs,
    multi: &MultiProgress,
) -> Result<ImpactSummary, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let states = match &args.states {
        Some(path) => StateTable::from_path(path)?,
        None => StateTable::builtin(),
    };
    let mortality = loader::load_path(&args.deaths)?;
    let rallies = input::dedup_exact(input::read_rallies_path(&args.rallies)?);

    let service = find_service(args.service.as_deref()).ok_or_else(|| {
        format!(
            "Unknown or disabled geocoding service '{}'",
            args.service.as_deref().unwrap_or("<default>")
        )
    })?;
    log::info!("Using geocoding service '{}' ({})", service.id, service.name);
    let geocoder = rally_impact_geocoder::from_service(&service, args.counties.as_deref())?;

    let config = AnalysisConfig {
        window_days: args.window_days,
        resolve: ResolveOptions::from_request(&service.request, &args.fallback_county),
    };

    let progress = IndicatifProgress::geocode_bar(multi, "Geocoding rally locations");
    let rows = analyze(
        rallies,
        geocoder.as_ref(),
        &states,
        &mortality,
        &config,
        Some(&progress),
    )
    .await?;

    write_augmented_path(&args.output, &rows)?;
    write_locations_path(&args.locations, &rows, &mortality)?;

    log::info!(
        "Analyzed {} rallies in {:.1}s",
        rows.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(ImpactSummary::from_rows(&rows))
}
