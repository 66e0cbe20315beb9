//! Menu-driven front end using `dialoguer`, for running the analysis
//! without remembering flags.

use std::path::PathBuf;

use dialoguer::{Input, Select};
use rally_impact_cli_utils::MultiProgress;
use rally_impact_geocoder::service_registry::enabled_services;
use rally_impact_rally::output::read_augmented_path;
use rally_impact_rally::{DEFAULT_FALLBACK_COUNTY, DEFAULT_WINDOW_DAYS, summary};
use rally_impact_rally_models::ImpactSummary;

use crate::run::RunArgs;

enum Action {
    Run,
    Summary,
    Geocode,
    Services,
}

impl Action {
    const ALL: &[Self] = &[Self::Run, Self::Summary, Self::Geocode, Self::Services];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Run => "Run analysis",
            Self::Summary => "Summarize an augmented table",
            Self::Geocode => "Look up a county",
            Self::Services => "List geocoding services",
        }
    }
}

/// Prompts for an action and its parameters, then runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected action fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Run => {
            let args = prompt_run_args()?;
            let summary = crate::run::run(&args, multi).await?;
            print!("{}", summary::render(&summary));
        }
        Action::Summary => {
            let path = prompt_path("Augmented table", Some("rallies-augmented.csv"))?;
            let rows = read_augmented_path(&path)?;
            print!("{}", summary::render(&ImpactSummary::from_rows(&rows)));
        }
        Action::Geocode => {
            let query: String = Input::new()
                .with_prompt("Place (City, ST)")
                .interact_text()?;
            let service = prompt_service()?;
            let counties = prompt_counties(&service)?;
            crate::geocode(&query, Some(&service), counties.as_deref()).await?;
        }
        Action::Services => crate::list_services(),
    }

    Ok(())
}

fn prompt_run_args() -> Result<RunArgs, Box<dyn std::error::Error>> {
    let rallies = prompt_path("Rally table", None)?;
    let deaths = prompt_path(
        "Deaths time series",
        Some("time_series_covid19_deaths_US.csv"),
    )?;
    let service = prompt_service()?;
    let counties = prompt_counties(&service)?;

    let window_days: u32 = Input::new()
        .with_prompt("Window (days)")
        .default(DEFAULT_WINDOW_DAYS)
        .interact_text()?;
    let fallback_county: String = Input::new()
        .with_prompt("Placeholder county")
        .default(DEFAULT_FALLBACK_COUNTY.to_string())
        .interact_text()?;

    Ok(RunArgs {
        rallies,
        deaths,
        states: None,
        counties,
        output: prompt_path("Augmented output", Some("rallies-augmented.csv"))?,
        locations: prompt_path("Locations output", Some("rally-locations.csv"))?,
        window_days,
        fallback_county,
        service: Some(service),
    })
}

fn prompt_path(
    prompt: &str,
    default: Option<&str>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default.to_string());
    }
    Ok(PathBuf::from(input.interact_text()?.trim()))
}

fn prompt_service() -> Result<String, Box<dyn std::error::Error>> {
    let services = enabled_services();
    let labels: Vec<String> = services
        .iter()
        .map(|s| format!("{} ({})", s.id, s.name))
        .collect();

    let idx = Select::new()
        .with_prompt("Geocoding service")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(services[idx].id.clone())
}

/// Asks for the county table when the lookup service is selected.
fn prompt_counties(service: &str) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    if service != "lookup" {
        return Ok(None);
    }
    prompt_path("City,State,County table", Some("rallies-augmented.csv")).map(Some)
}
