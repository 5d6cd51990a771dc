//! Pure search state machine.
//!
//! Every user-facing transition returns the effects to perform instead
//! of performing them, so the staleness and debounce rules are testable
//! without a runtime or any provider. Each transition that starts a new
//! intent bumps the request token; completions carrying an older token
//! are discarded unconditionally, which is what stops a slow early
//! response from overwriting a newer selection's state.

use std::time::Duration;

use safest_geo::Coordinate;
use safest_places::{PlaceSuggestion, ResolvedPlace};

use crate::{RouteBundle, SearchConfig};

/// Opaque monotonically increasing identifier for outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Work the driver must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start (or restart) the autocomplete debounce timer.
    ScheduleAutocomplete {
        /// Token the eventual request must carry.
        token: RequestToken,
        /// Query to send when the timer fires.
        query: String,
        /// Debounce delay.
        delay: Duration,
    },
    /// Resolve a selected place id into a destination coordinate.
    ResolvePlace {
        /// Token the eventual result must carry.
        token: RequestToken,
        /// The selected place.
        place_id: String,
    },
    /// Fetch directions and incidents for a committed destination,
    /// concurrently.
    FetchRouteData {
        /// Token the eventual results must carry.
        token: RequestToken,
        /// Walk origin.
        origin: Coordinate,
        /// Walk destination.
        destination: Coordinate,
    },
}

/// Search pipeline state: current query, suggestions, resolved
/// destination, and the last completed route bundle.
#[derive(Debug)]
pub struct SearchState {
    origin: Coordinate,
    config: SearchConfig,
    current_token: u64,
    query: String,
    suggestions: Vec<PlaceSuggestion>,
    destination: Option<ResolvedPlace>,
    bundle: Option<RouteBundle>,
    /// Destination the bundle was computed for; a re-commit for the same
    /// spot is a no-op.
    bundle_destination: Option<Coordinate>,
}

impl SearchState {
    /// Creates an empty search rooted at the user's origin.
    #[must_use]
    pub fn new(origin: Coordinate, config: SearchConfig) -> Self {
        Self {
            origin,
            config,
            current_token: 0,
            query: String::new(),
            suggestions: Vec::new(),
            destination: None,
            bundle: None,
            bundle_destination: None,
        }
    }

    fn next_token(&mut self) -> RequestToken {
        self.current_token += 1;
        RequestToken(self.current_token)
    }

    /// Whether `token` is still the newest issued token.
    #[must_use]
    pub const fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.current_token
    }

    /// The origin this search is rooted at.
    #[must_use]
    pub const fn origin(&self) -> Coordinate {
        self.origin
    }

    /// The text the user has typed so far.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Current ranked suggestions.
    #[must_use]
    pub fn suggestions(&self) -> &[PlaceSuggestion] {
        &self.suggestions
    }

    /// The resolved destination, if any.
    #[must_use]
    pub const fn destination(&self) -> Option<&ResolvedPlace> {
        self.destination.as_ref()
    }

    /// The last completed route bundle, if any.
    #[must_use]
    pub const fn bundle(&self) -> Option<&RouteBundle> {
        self.bundle.as_ref()
    }

    /// The user typed. Restarts the debounce window; an empty query just
    /// clears the suggestion list.
    pub fn query_changed(&mut self, text: &str) -> Vec<Effect> {
        self.query = text.to_string();
        let token = self.next_token();

        if text.trim().is_empty() {
            self.suggestions.clear();
            return Vec::new();
        }

        vec![Effect::ScheduleAutocomplete {
            token,
            query: text.to_string(),
            delay: self.config.debounce,
        }]
    }

    /// An autocomplete response arrived. Returns `false` when it was
    /// stale and discarded.
    pub fn autocomplete_loaded(
        &mut self,
        token: RequestToken,
        suggestions: Vec<PlaceSuggestion>,
    ) -> bool {
        if !self.is_current(token) {
            log::debug!("Discarding stale autocomplete result (token {token:?})");
            return false;
        }
        self.suggestions = suggestions;
        true
    }

    /// The user picked a suggestion.
    pub fn suggestion_selected(&mut self, place_id: &str) -> Vec<Effect> {
        let token = self.next_token();
        self.suggestions.clear();
        vec![Effect::ResolvePlace {
            token,
            place_id: place_id.to_string(),
        }]
    }

    /// A place resolution arrived. Returns `false` when stale.
    pub fn place_resolved(&mut self, token: RequestToken, place: ResolvedPlace) -> bool {
        if !self.is_current(token) {
            log::debug!("Discarding stale place resolution (token {token:?})");
            return false;
        }
        self.destination = Some(place);
        true
    }

    /// The user committed to the destination. No-ops without a resolved
    /// destination, or when the current bundle already covers it.
    pub fn destination_committed(&mut self) -> Vec<Effect> {
        let Some(destination) = &self.destination else {
            return Vec::new();
        };
        if self.bundle.is_some() && self.bundle_destination == Some(destination.location) {
            return Vec::new();
        }

        let destination = destination.location;
        let token = self.next_token();
        vec![Effect::FetchRouteData {
            token,
            origin: self.origin,
            destination,
        }]
    }

    /// The directions + incidents fan-out completed. Returns `false`
    /// when stale.
    pub fn route_data_loaded(&mut self, token: RequestToken, bundle: RouteBundle) -> bool {
        if !self.is_current(token) {
            log::debug!("Discarding stale route data (token {token:?})");
            return false;
        }
        self.bundle_destination = self.destination.as_ref().map(|d| d.location);
        self.bundle = Some(bundle);
        true
    }

    /// Clears the whole search. Bumping the token here invalidates every
    /// in-flight request.
    pub fn reset(&mut self) {
        self.next_token();
        self.query.clear();
        self.suggestions.clear();
        self.destination = None;
        self.bundle = None;
        self.bundle_destination = None;
    }
}
