#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Turn-by-turn navigation.
//!
//! [`Navigator`] is a plain state machine driven by single position
//! updates; it never subscribes to anything itself, which keeps it
//! testable without a live location source. The [`runner`] module wires a
//! position stream to a navigator for the lifetime of one session.

pub mod geolocation;
pub mod runner;

use safest_directions::RouteStep;
use safest_geo::{Coordinate, haversine_distance};

pub use geolocation::{
    Accuracy, GeolocationError, GeolocationSource, SimulatedGeolocation, WatchOptions,
};
pub use runner::{NavigationEvent, SessionHandle, start_session};

/// A position within this distance of the current step's endpoint counts
/// as reaching it.
pub const ARRIVAL_RADIUS_METERS: f64 = 20.0;

/// The state of one active navigation: the route, its steps, and where
/// along the steps the user currently is.
///
/// Exactly one session exists at a time; it is destroyed wholesale on
/// cancellation or arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationSession {
    /// Decoded route geometry for display.
    pub route: Vec<Coordinate>,
    /// Ordered maneuver steps from the same directions response.
    pub steps: Vec<RouteStep>,
    /// Index of the step currently being walked.
    pub current_step: usize,
}

/// What a single position update meant for the session.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionOutcome {
    /// No session is active; the update was ignored.
    Inactive,
    /// Still en route to the current step's endpoint.
    Progress {
        /// Index of the step being walked.
        step_index: usize,
        /// Remaining distance to the step endpoint in meters.
        distance_meters: f64,
    },
    /// Reached a step endpoint and advanced to the next step.
    Advanced {
        /// Index of the step now being walked.
        step_index: usize,
    },
    /// Reached the final step's endpoint; the session is cleared.
    Arrived,
}

/// Turn-by-turn progress tracker: Idle until started, Active until
/// cancelled or arrived.
#[derive(Debug, Default)]
pub struct Navigator {
    session: Option<NavigationSession>,
}

impl Navigator {
    /// Creates an idle navigator.
    #[must_use]
    pub const fn new() -> Self {
        Self { session: None }
    }

    /// Starts a session over `route` and `steps`.
    ///
    /// Returns `false` and stays idle when `steps` is empty: navigation
    /// cannot begin without directions.
    pub fn start(&mut self, route: Vec<Coordinate>, steps: Vec<RouteStep>) -> bool {
        if steps.is_empty() {
            log::debug!("Ignoring start with no steps");
            return false;
        }
        self.session = Some(NavigationSession {
            route,
            steps,
            current_step: 0,
        });
        true
    }

    /// Feeds one live position into the session.
    ///
    /// Reaching the current step's endpoint advances by exactly one step
    /// per update, even if the position is already within range of a
    /// later step; reaching the last step's endpoint clears the session.
    pub fn on_position(&mut self, position: Coordinate) -> PositionOutcome {
        let Some(session) = self.session.as_mut() else {
            return PositionOutcome::Inactive;
        };

        let endpoint = session.steps[session.current_step].endpoint;
        let distance_meters = haversine_distance(position, endpoint);

        if distance_meters < ARRIVAL_RADIUS_METERS {
            if session.current_step + 1 == session.steps.len() {
                log::info!("Arrived at destination");
                self.session = None;
                return PositionOutcome::Arrived;
            }
            session.current_step += 1;
            log::info!("Advanced to step {}", session.current_step);
            return PositionOutcome::Advanced {
                step_index: session.current_step,
            };
        }

        PositionOutcome::Progress {
            step_index: session.current_step,
            distance_meters,
        }
    }

    /// Cancels any active session. Safe to call repeatedly or while idle.
    pub fn cancel(&mut self) {
        self.session = None;
    }

    /// Whether a session is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The active session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&NavigationSession> {
        self.session.as_ref()
    }
}
