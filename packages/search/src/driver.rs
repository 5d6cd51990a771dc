//! Orchestrator actor: executes search effects against the providers.
//!
//! One task owns the [`SearchState`] and processes commands from a
//! single channel, so every transition and every completion is applied
//! in one place, in order. Provider calls run in spawned sub-tasks that
//! post their completions back onto the same channel; the state machine
//! then accepts or discards them by token.

use std::sync::Arc;

use safest_directions::{DirectionsError, DirectionsProvider, WalkingRoute};
use safest_geo::{Coordinate, SearchArea};
use safest_places::{PlaceSuggestion, PlacesError, PlacesProvider, ResolvedPlace};
use safest_source::normalize::{NormalizedBatch, normalize};
use safest_source::IncidentFeed;
use safest_spatial::{cluster_incidents, filter_by_corridor};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::state::{Effect, RequestToken, SearchState};
use crate::{RouteBundle, SearchConfig};

/// The injected collaborators the orchestrator talks to.
#[derive(Clone)]
pub struct SearchProviders {
    /// Autocomplete + place resolution.
    pub places: Arc<dyn PlacesProvider>,
    /// Walking directions.
    pub directions: Arc<dyn DirectionsProvider>,
    /// Public-safety incident feeds.
    pub incidents: Arc<dyn IncidentFeed>,
}

/// Updates published to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchUpdate {
    /// The suggestion list changed.
    Suggestions(Vec<PlaceSuggestion>),
    /// A selected suggestion resolved to a destination.
    DestinationResolved(ResolvedPlace),
    /// The route, steps, and corridor incidents are ready.
    RouteReady(RouteBundle),
    /// A non-fatal problem the user should see; prior state stands.
    Notice(String),
}

enum Command {
    QueryChanged(String),
    SuggestionSelected(String),
    DestinationCommitted,
    Reset,
    DebounceFired {
        token: RequestToken,
        query: String,
    },
    AutocompleteDone {
        token: RequestToken,
        result: Result<Vec<PlaceSuggestion>, PlacesError>,
    },
    PlaceResolved {
        token: RequestToken,
        result: Result<ResolvedPlace, PlacesError>,
    },
    RouteData {
        token: RequestToken,
        directions: Result<WalkingRoute, DirectionsError>,
        incidents: NormalizedBatch,
    },
}

/// Handle to a running search orchestrator. Dropping it shuts the actor
/// down once in-flight work drains.
pub struct SearchOrchestrator {
    commands: mpsc::UnboundedSender<Command>,
}

impl SearchOrchestrator {
    /// Spawns the orchestrator actor. Returns the command handle and the
    /// stream of updates for the presentation layer.
    #[must_use]
    pub fn spawn(
        origin: Coordinate,
        providers: SearchProviders,
        config: SearchConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SearchUpdate>) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let actor = Actor {
            state: SearchState::new(origin, config),
            providers,
            config,
            commands: commands_tx.downgrade(),
            updates: updates_tx,
            debounce: None,
        };
        tokio::spawn(actor.run(commands_rx));

        (
            Self {
                commands: commands_tx,
            },
            updates_rx,
        )
    }

    /// The user edited the query text.
    pub fn query_changed(&self, text: &str) {
        let _ = self.commands.send(Command::QueryChanged(text.to_string()));
    }

    /// The user picked an autocomplete suggestion.
    pub fn suggestion_selected(&self, place_id: &str) {
        let _ = self
            .commands
            .send(Command::SuggestionSelected(place_id.to_string()));
    }

    /// The user committed to navigating to the resolved destination.
    pub fn destination_committed(&self) {
        let _ = self.commands.send(Command::DestinationCommitted);
    }

    /// Clears the search and invalidates everything in flight.
    pub fn reset(&self) {
        let _ = self.commands.send(Command::Reset);
    }
}

struct Actor {
    state: SearchState,
    providers: SearchProviders,
    config: SearchConfig,
    /// Weak handle back onto our own command channel: sub-tasks hold a
    /// strong clone only while they run, so the actor still shuts down
    /// when the [`SearchOrchestrator`] is dropped.
    commands: mpsc::WeakUnboundedSender<Command>,
    updates: mpsc::UnboundedSender<SearchUpdate>,
    /// In-flight debounce timer; replaced (and aborted) on every
    /// keystroke so only the final query's timer ever fires.
    debounce: Option<JoinHandle<()>>,
}

impl Actor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            self.handle(command);
        }
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::QueryChanged(text) => {
                let effects = self.state.query_changed(&text);
                if effects.is_empty() {
                    // Cleared query: drop any pending timer and tell the
                    // presentation layer the list is empty.
                    if let Some(timer) = self.debounce.take() {
                        timer.abort();
                    }
                    self.publish(SearchUpdate::Suggestions(Vec::new()));
                }
                self.perform(effects);
            }
            Command::SuggestionSelected(place_id) => {
                let effects = self.state.suggestion_selected(&place_id);
                self.perform(effects);
            }
            Command::DestinationCommitted => {
                let effects = self.state.destination_committed();
                self.perform(effects);
            }
            Command::Reset => {
                if let Some(timer) = self.debounce.take() {
                    timer.abort();
                }
                self.state.reset();
                self.publish(SearchUpdate::Suggestions(Vec::new()));
            }
            Command::DebounceFired { token, query } => {
                if !self.state.is_current(token) {
                    log::debug!("Debounce fired for a superseded query {query:?}");
                    return;
                }
                let Some(commands) = self.commands.upgrade() else {
                    return;
                };
                let places = Arc::clone(&self.providers.places);
                let bias = SearchArea::new(self.origin_bias(), self.config.autocomplete_bias_meters);
                tokio::spawn(async move {
                    let result = places.autocomplete(&query, &bias).await;
                    let _ = commands.send(Command::AutocompleteDone { token, result });
                });
            }
            Command::AutocompleteDone { token, result } => match result {
                Ok(suggestions) => {
                    if self.state.autocomplete_loaded(token, suggestions.clone()) {
                        self.publish(SearchUpdate::Suggestions(suggestions));
                    }
                }
                Err(error) => {
                    if self.state.is_current(token) {
                        log::warn!("Autocomplete failed: {error}");
                        self.publish(SearchUpdate::Notice(format!("Place search failed: {error}")));
                    }
                }
            },
            Command::PlaceResolved { token, result } => match result {
                Ok(place) => {
                    if self.state.place_resolved(token, place.clone()) {
                        self.publish(SearchUpdate::DestinationResolved(place));
                    }
                }
                Err(error) => {
                    if self.state.is_current(token) {
                        log::warn!("Place resolution failed: {error}");
                        self.publish(SearchUpdate::Notice(format!(
                            "Could not resolve place: {error}"
                        )));
                    }
                }
            },
            Command::RouteData {
                token,
                directions,
                incidents,
            } => self.handle_route_data(token, directions, incidents),
        }
    }

    fn handle_route_data(
        &mut self,
        token: RequestToken,
        directions: Result<WalkingRoute, DirectionsError>,
        incidents: NormalizedBatch,
    ) {
        if !self.state.is_current(token) {
            log::debug!("Discarding stale route data (token {token:?})");
            return;
        }

        let route = match directions {
            Ok(route) => route,
            Err(DirectionsError::NoRoute) => {
                self.publish(SearchUpdate::Notice("No walking route found".to_string()));
                return;
            }
            Err(error) => {
                log::warn!("Directions fetch failed: {error}");
                self.publish(SearchUpdate::Notice(format!("Directions failed: {error}")));
                return;
            }
        };

        // Corridor-filter the incidents against the route decoded from
        // this same response, then grid them for display.
        let filtered = filter_by_corridor(
            incidents.incidents,
            &route.points,
            self.config.corridor_meters,
        );
        let cells = cluster_incidents(&filtered, self.config.cell_size_degrees);

        let bundle = RouteBundle {
            route: route.points,
            steps: route.steps,
            incidents: filtered,
            cells,
        };
        if self.state.route_data_loaded(token, bundle.clone()) {
            self.publish(SearchUpdate::RouteReady(bundle));
        }
    }

    fn perform(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ScheduleAutocomplete {
                    token,
                    query,
                    delay,
                } => {
                    if let Some(previous) = self.debounce.take() {
                        previous.abort();
                    }
                    let Some(commands) = self.commands.upgrade() else {
                        continue;
                    };
                    self.debounce = Some(tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = commands.send(Command::DebounceFired { token, query });
                    }));
                }
                Effect::ResolvePlace { token, place_id } => {
                    let Some(commands) = self.commands.upgrade() else {
                        continue;
                    };
                    let places = Arc::clone(&self.providers.places);
                    tokio::spawn(async move {
                        let result = places.resolve(&place_id).await;
                        let _ = commands.send(Command::PlaceResolved { token, result });
                    });
                }
                Effect::FetchRouteData {
                    token,
                    origin,
                    destination,
                } => {
                    let Some(commands) = self.commands.upgrade() else {
                        continue;
                    };
                    let directions = Arc::clone(&self.providers.directions);
                    let feed = Arc::clone(&self.providers.incidents);
                    let area = SearchArea::new(destination, self.config.incident_radius_meters);
                    tokio::spawn(async move {
                        let directions_fut = directions.walking_route(origin, destination);
                        let incidents_fut = fetch_incidents(feed, area);
                        let (directions, incidents) =
                            tokio::join!(directions_fut, incidents_fut);
                        let _ = commands.send(Command::RouteData {
                            token,
                            directions,
                            incidents,
                        });
                    });
                }
            }
        }
    }

    fn publish(&self, update: SearchUpdate) {
        let _ = self.updates.send(update);
    }

    fn origin_bias(&self) -> Coordinate {
        self.state.origin()
    }
}

/// Fetches and normalizes both incident feeds for `area`, degrading to
/// an empty batch when a feed fails: routing proceeds with zero
/// incidents rather than blocking.
async fn fetch_incidents(feed: Arc<dyn IncidentFeed>, area: SearchArea) -> NormalizedBatch {
    let (calls, complaints) = tokio::join!(feed.fetch_calls(&area), feed.fetch_complaints(&area));

    let calls = calls.unwrap_or_else(|error| {
        log::warn!("Calls feed failed, continuing without it: {error}");
        Vec::new()
    });
    let complaints = complaints.unwrap_or_else(|error| {
        log::warn!("Complaints feed failed, continuing without it: {error}");
        Vec::new()
    });

    normalize(calls, complaints)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use safest_source::FeedError;
    use safest_source::feeds::{CallRecord, ComplaintRecord};

    use super::*;

    const ORIGIN: Coordinate = Coordinate::new(40.7128, -74.0060);
    const DEST_A: Coordinate = Coordinate::new(40.6815, -73.9241);
    const DEST_B: Coordinate = Coordinate::new(40.7306, -73.9866);

    fn test_config() -> SearchConfig {
        SearchConfig {
            debounce: Duration::from_millis(50),
            ..SearchConfig::default()
        }
    }

    struct ScriptedPlaces {
        autocomplete_queries: Mutex<Vec<String>>,
    }

    impl ScriptedPlaces {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                autocomplete_queries: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PlacesProvider for ScriptedPlaces {
        async fn autocomplete(
            &self,
            query: &str,
            _bias: &SearchArea,
        ) -> Result<Vec<PlaceSuggestion>, PlacesError> {
            self.autocomplete_queries
                .lock()
                .unwrap()
                .push(query.to_string());
            Ok(vec![PlaceSuggestion {
                place_id: format!("place-{query}"),
                description: query.to_string(),
            }])
        }

        async fn resolve(&self, place_id: &str) -> Result<ResolvedPlace, PlacesError> {
            let location = if place_id == "a" { DEST_A } else { DEST_B };
            Ok(ResolvedPlace {
                location,
                description: place_id.to_string(),
            })
        }
    }

    /// Directions stub: destination A answers slowly, everything else
    /// quickly. Routes are a straight two-point line.
    struct ScriptedDirections;

    #[async_trait]
    impl DirectionsProvider for ScriptedDirections {
        async fn walking_route(
            &self,
            origin: Coordinate,
            destination: Coordinate,
        ) -> Result<WalkingRoute, DirectionsError> {
            let delay = if (destination.latitude - DEST_A.latitude).abs() < 1e-9 {
                Duration::from_millis(100)
            } else {
                Duration::from_millis(5)
            };
            tokio::time::sleep(delay).await;
            Ok(WalkingRoute {
                points: vec![origin, destination],
                steps: vec![safest_directions::RouteStep {
                    instruction: "Walk".to_string(),
                    endpoint: destination,
                    distance_meters: 100.0,
                    duration_text: "2 mins".to_string(),
                }],
            })
        }
    }

    struct NoRouteDirections;

    #[async_trait]
    impl DirectionsProvider for NoRouteDirections {
        async fn walking_route(
            &self,
            _origin: Coordinate,
            _destination: Coordinate,
        ) -> Result<WalkingRoute, DirectionsError> {
            Err(DirectionsError::NoRoute)
        }
    }

    /// Feed stub: one call record at the destination, one far away.
    struct ScriptedFeed;

    #[async_trait]
    impl IncidentFeed for ScriptedFeed {
        async fn fetch_calls(&self, area: &SearchArea) -> Result<Vec<CallRecord>, FeedError> {
            let near = CallRecord {
                cad_evnt_id: Some("near".to_string()),
                typ_desc: Some("DISPUTE".to_string()),
                radio_code: Some("10-52".to_string()),
                incident_date: Some("2026-07-01T22:14:00.000".to_string()),
                latitude: Some(area.center.latitude.to_string()),
                longitude: Some(area.center.longitude.to_string()),
            };
            let far = CallRecord {
                cad_evnt_id: Some("far".to_string()),
                typ_desc: Some("DISPUTE".to_string()),
                radio_code: None,
                incident_date: None,
                latitude: Some((area.center.latitude + 1.0).to_string()),
                longitude: Some((area.center.longitude + 1.0).to_string()),
            };
            Ok(vec![near, far])
        }

        async fn fetch_complaints(
            &self,
            _area: &SearchArea,
        ) -> Result<Vec<ComplaintRecord>, FeedError> {
            Ok(Vec::new())
        }
    }

    struct FailingFeed;

    #[async_trait]
    impl IncidentFeed for FailingFeed {
        async fn fetch_calls(&self, _area: &SearchArea) -> Result<Vec<CallRecord>, FeedError> {
            Err(FeedError::Status { status: 503 })
        }

        async fn fetch_complaints(
            &self,
            _area: &SearchArea,
        ) -> Result<Vec<ComplaintRecord>, FeedError> {
            Err(FeedError::Status { status: 503 })
        }
    }

    fn providers(
        places: Arc<dyn PlacesProvider>,
        directions: Arc<dyn DirectionsProvider>,
        incidents: Arc<dyn IncidentFeed>,
    ) -> SearchProviders {
        SearchProviders {
            places,
            directions,
            incidents,
        }
    }

    async fn next_update(rx: &mut mpsc::UnboundedReceiver<SearchUpdate>) -> SearchUpdate {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for update")
            .expect("orchestrator went away")
    }

    #[tokio::test]
    async fn debounce_sends_only_the_final_query() {
        let places = ScriptedPlaces::new();
        let (orchestrator, mut updates) = SearchOrchestrator::spawn(
            ORIGIN,
            providers(
                Arc::clone(&places) as Arc<dyn PlacesProvider>,
                Arc::new(ScriptedDirections),
                Arc::new(ScriptedFeed),
            ),
            test_config(),
        );

        orchestrator.query_changed("Mac");
        orchestrator.query_changed("Maco");
        orchestrator.query_changed("Macon");

        let update = next_update(&mut updates).await;
        match update {
            SearchUpdate::Suggestions(suggestions) => {
                assert_eq!(suggestions.len(), 1);
                assert_eq!(suggestions[0].description, "Macon");
            }
            other => panic!("unexpected update {other:?}"),
        }

        let queries = places.autocomplete_queries.lock().unwrap().clone();
        assert_eq!(queries, ["Macon"]);
    }

    #[tokio::test]
    async fn late_directions_for_a_never_overwrite_b() {
        let places = ScriptedPlaces::new();
        let (orchestrator, mut updates) = SearchOrchestrator::spawn(
            ORIGIN,
            providers(
                Arc::clone(&places) as Arc<dyn PlacesProvider>,
                Arc::new(ScriptedDirections),
                Arc::new(ScriptedFeed),
            ),
            test_config(),
        );

        // Commit destination A (slow directions), then switch to B
        // before A's response lands.
        orchestrator.suggestion_selected("a");
        assert!(matches!(
            next_update(&mut updates).await,
            SearchUpdate::DestinationResolved(place) if place.description == "a"
        ));
        orchestrator.destination_committed();

        orchestrator.suggestion_selected("b");
        assert!(matches!(
            next_update(&mut updates).await,
            SearchUpdate::DestinationResolved(place) if place.description == "b"
        ));
        orchestrator.destination_committed();

        let update = next_update(&mut updates).await;
        match update {
            SearchUpdate::RouteReady(bundle) => {
                assert!((bundle.route[1].latitude - DEST_B.latitude).abs() < 1e-9);
            }
            other => panic!("unexpected update {other:?}"),
        }

        // A's stale response arrives around 100 ms in and must be
        // dropped without a second RouteReady.
        let extra = tokio::time::timeout(Duration::from_millis(250), updates.recv()).await;
        assert!(extra.is_err(), "unexpected update {extra:?}");
    }

    #[tokio::test]
    async fn corridor_incidents_ride_along_with_the_route() {
        let places = ScriptedPlaces::new();
        let (orchestrator, mut updates) = SearchOrchestrator::spawn(
            ORIGIN,
            providers(
                Arc::clone(&places) as Arc<dyn PlacesProvider>,
                Arc::new(ScriptedDirections),
                Arc::new(ScriptedFeed),
            ),
            test_config(),
        );

        orchestrator.suggestion_selected("b");
        let SearchUpdate::DestinationResolved(_) = next_update(&mut updates).await else {
            panic!("expected resolution first");
        };
        orchestrator.destination_committed();

        let update = next_update(&mut updates).await;
        match update {
            SearchUpdate::RouteReady(bundle) => {
                // The far record is outside the corridor; only the one at
                // the destination survives, in one cell.
                assert_eq!(bundle.incidents.len(), 1);
                assert_eq!(bundle.incidents[0].id, "near");
                assert_eq!(bundle.cells.len(), 1);
                assert_eq!(bundle.cells[0].count, 1);
            }
            other => panic!("unexpected update {other:?}"),
        }
    }

    #[tokio::test]
    async fn feed_failure_degrades_to_zero_incidents() {
        let places = ScriptedPlaces::new();
        let (orchestrator, mut updates) = SearchOrchestrator::spawn(
            ORIGIN,
            providers(
                Arc::clone(&places) as Arc<dyn PlacesProvider>,
                Arc::new(ScriptedDirections),
                Arc::new(FailingFeed),
            ),
            test_config(),
        );

        orchestrator.suggestion_selected("b");
        let SearchUpdate::DestinationResolved(_) = next_update(&mut updates).await else {
            panic!("expected resolution first");
        };
        orchestrator.destination_committed();

        let update = next_update(&mut updates).await;
        match update {
            SearchUpdate::RouteReady(bundle) => {
                assert!(bundle.incidents.is_empty());
                assert!(bundle.cells.is_empty());
                assert!(!bundle.route.is_empty());
            }
            other => panic!("unexpected update {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_route_surfaces_a_notice_and_keeps_prior_state() {
        let places = ScriptedPlaces::new();
        let (orchestrator, mut updates) = SearchOrchestrator::spawn(
            ORIGIN,
            providers(
                Arc::clone(&places) as Arc<dyn PlacesProvider>,
                Arc::new(NoRouteDirections),
                Arc::new(ScriptedFeed),
            ),
            test_config(),
        );

        orchestrator.suggestion_selected("b");
        let SearchUpdate::DestinationResolved(_) = next_update(&mut updates).await else {
            panic!("expected resolution first");
        };
        orchestrator.destination_committed();

        let update = next_update(&mut updates).await;
        assert!(matches!(update, SearchUpdate::Notice(_)));

        let extra = tokio::time::timeout(Duration::from_millis(100), updates.recv()).await;
        assert!(extra.is_err(), "unexpected update {extra:?}");
    }

    #[tokio::test]
    async fn reset_clears_suggestions() {
        let places = ScriptedPlaces::new();
        let (orchestrator, mut updates) = SearchOrchestrator::spawn(
            ORIGIN,
            providers(
                Arc::clone(&places) as Arc<dyn PlacesProvider>,
                Arc::new(ScriptedDirections),
                Arc::new(ScriptedFeed),
            ),
            test_config(),
        );

        orchestrator.query_changed("Macon");
        let SearchUpdate::Suggestions(suggestions) = next_update(&mut updates).await else {
            panic!("expected suggestions");
        };
        assert_eq!(suggestions.len(), 1);

        orchestrator.reset();
        let SearchUpdate::Suggestions(cleared) = next_update(&mut updates).await else {
            panic!("expected cleared suggestions");
        };
        assert!(cleared.is_empty());
    }
}
