#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the safest routing core.
//!
//! Drives the same orchestrator and session runner the app embeds:
//! `route` searches a destination and prints the corridor incidents,
//! `incidents` clusters an area's feed data, and `navigate` walks a
//! found route with simulated positions.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use safest_directions::GoogleDirections;
use safest_geo::{Coordinate, SearchArea};
use safest_navigation::{
    GeolocationSource, NavigationEvent, Navigator, SimulatedGeolocation, WatchOptions,
    start_session,
};
use safest_places::GooglePlaces;
use safest_search::{RouteBundle, SearchConfig, SearchOrchestrator, SearchProviders, SearchUpdate};
use safest_source::normalize::normalize;
use safest_source::{IncidentFeed, SocrataIncidentFeed};
use safest_source_models::IncidentKind;
use safest_spatial::{cluster_incidents, density_color};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "safest", about = "Pedestrian safety routing toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a walking route and list safety incidents along it
    Route {
        /// Origin position as "lat,lng"
        #[arg(long, value_parser = parse_coordinate)]
        from: Coordinate,
        /// Destination, as free text to autocomplete
        #[arg(long)]
        to: String,
        /// Corridor half-width in meters
        #[arg(long, default_value = "500")]
        corridor: f64,
    },
    /// Fetch and cluster incidents around a point
    Incidents {
        /// Center position as "lat,lng"
        #[arg(long, value_parser = parse_coordinate)]
        at: Coordinate,
        /// Fetch radius in meters
        #[arg(long, default_value = "2000")]
        radius: f64,
    },
    /// Walk a found route with simulated positions
    Navigate {
        /// Origin position as "lat,lng"
        #[arg(long, value_parser = parse_coordinate)]
        from: Coordinate,
        /// Destination, as free text to autocomplete
        #[arg(long)]
        to: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Route { from, to, corridor } => {
            let config = SearchConfig {
                corridor_meters: corridor,
                ..SearchConfig::default()
            };
            let bundle = search_route(from, &to, config).await?;
            print_bundle(&bundle);
        }
        Commands::Incidents { at, radius } => {
            run_incidents(at, radius).await?;
        }
        Commands::Navigate { from, to } => {
            let bundle = search_route(from, &to, SearchConfig::default()).await?;
            print_bundle(&bundle);
            run_navigation(&bundle).await?;
        }
    }

    Ok(())
}

/// Parses a "lat,lng" argument.
fn parse_coordinate(s: &str) -> Result<Coordinate, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got {s:?}"))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("bad latitude {lat:?}"))?;
    let longitude: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("bad longitude {lng:?}"))?;
    Ok(Coordinate::new(latitude, longitude))
}

fn build_providers() -> Result<SearchProviders, Box<dyn std::error::Error>> {
    let api_key =
        std::env::var("GOOGLE_MAPS_API_KEY").map_err(|_| "GOOGLE_MAPS_API_KEY is not set")?;
    let app_token = std::env::var("SOCRATA_APP_TOKEN").ok();

    Ok(SearchProviders {
        places: Arc::new(GooglePlaces::new(api_key.clone())),
        directions: Arc::new(GoogleDirections::new(api_key)),
        incidents: Arc::new(SocrataIncidentFeed::new(app_token)),
    })
}

/// Runs the orchestrator end to end: autocomplete the query, take the
/// top suggestion, resolve it, and wait for the route bundle.
async fn search_route(
    from: Coordinate,
    to: &str,
    config: SearchConfig,
) -> Result<RouteBundle, Box<dyn std::error::Error>> {
    let providers = build_providers()?;
    let (orchestrator, mut updates) = SearchOrchestrator::spawn(from, providers, config);
    orchestrator.query_changed(to);

    while let Some(update) = updates.recv().await {
        match update {
            SearchUpdate::Suggestions(suggestions) => {
                let Some(top) = suggestions.first() else {
                    return Err(format!("no places found for {to:?}").into());
                };
                println!("Destination: {}", top.description);
                orchestrator.suggestion_selected(&top.place_id);
            }
            SearchUpdate::DestinationResolved(place) => {
                log::info!(
                    "Resolved to ({}, {})",
                    place.location.latitude,
                    place.location.longitude
                );
                orchestrator.destination_committed();
            }
            SearchUpdate::RouteReady(bundle) => return Ok(bundle),
            SearchUpdate::Notice(notice) => return Err(notice.into()),
        }
    }

    Err("search ended without a route".into())
}

fn print_bundle(bundle: &RouteBundle) {
    println!();
    println!("Route: {} points, {} steps", bundle.route.len(), bundle.steps.len());
    for (index, step) in bundle.steps.iter().enumerate() {
        println!(
            "  {:>2}. {} ({:.0} m, {})",
            index + 1,
            step.instruction,
            step.distance_meters,
            step.duration_text
        );
    }

    let calls = bundle
        .incidents
        .iter()
        .filter(|i| i.kind == IncidentKind::Call)
        .count();
    let complaints = bundle.incidents.len() - calls;
    println!();
    println!(
        "{} incidents within the corridor ({calls} calls, {complaints} complaints)",
        bundle.incidents.len()
    );
    print_cells(&bundle.cells);
}

fn print_cells(cells: &[safest_spatial::GridCell]) {
    let max_count = cells.iter().map(|c| c.count).max().unwrap_or(0);
    let mut ordered: Vec<&safest_spatial::GridCell> = cells.iter().collect();
    ordered.sort_by(|a, b| b.count.cmp(&a.count));

    for cell in ordered {
        let (r, g, b) = density_color(cell.count, max_count);
        println!(
            "  ({:.5}, {:.5})  x{:<4} #{r:02x}{g:02x}{b:02x}",
            cell.centroid.latitude, cell.centroid.longitude, cell.count
        );
    }
}

async fn run_incidents(at: Coordinate, radius: f64) -> Result<(), Box<dyn std::error::Error>> {
    let app_token = std::env::var("SOCRATA_APP_TOKEN").ok();
    let feed = SocrataIncidentFeed::new(app_token);
    let area = SearchArea::new(at, radius);

    let (calls, complaints) = tokio::join!(feed.fetch_calls(&area), feed.fetch_complaints(&area));
    let batch = normalize(calls?, complaints?);

    println!(
        "{} incidents ({} raw records dropped)",
        batch.incidents.len(),
        batch.dropped
    );
    let cells = cluster_incidents(&batch.incidents, SearchConfig::default().cell_size_degrees);
    print_cells(&cells);
    Ok(())
}

/// Replays the route's step endpoints through a simulated geolocation
/// source and prints each session event.
async fn run_navigation(bundle: &RouteBundle) -> Result<(), Box<dyn std::error::Error>> {
    let mut navigator = Navigator::new();
    if !navigator.start(bundle.route.clone(), bundle.steps.clone()) {
        return Err("route has no steps to navigate".into());
    }

    let source = SimulatedGeolocation::new(bundle.steps.iter().map(|s| s.endpoint).collect());
    let positions = source.watch(&WatchOptions::default()).await?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let handle = start_session(navigator, positions, events_tx);

    println!();
    println!("Navigating...");
    while let Some(event) = events_rx.recv().await {
        match event {
            NavigationEvent::Progress {
                step_index,
                distance_meters,
            } => log::debug!("step {step_index}: {distance_meters:.0} m remaining"),
            NavigationEvent::StepAdvanced {
                step_index,
                instruction,
            } => println!("  step {}: {instruction}", step_index + 1),
            NavigationEvent::Arrived => {
                println!("  arrived");
                break;
            }
            NavigationEvent::Cancelled => {
                println!("  cancelled");
                break;
            }
        }
    }

    handle.join().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_pairs() {
        let c = parse_coordinate("40.7128,-74.0060").unwrap();
        assert!((c.latitude - 40.7128).abs() < 1e-9);
        assert!((c.longitude - -74.0060).abs() < 1e-9);
    }

    #[test]
    fn parses_coordinate_with_spaces() {
        let c = parse_coordinate("40.7128, -74.0060").unwrap();
        assert!((c.longitude - -74.0060).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!(parse_coordinate("40.7128").is_err());
        assert!(parse_coordinate("north,west").is_err());
    }
}
