//! Session runner: wires a position stream to a [`Navigator`].
//!
//! The runner owns the navigator and the subscription for the whole
//! session, so there is no shared state and no lock. Cancellation is a
//! oneshot checked ahead of the position branch; a cancel issued before
//! an update is processed always wins, and the subscription is dropped
//! whenever the runner exits, however it exits.

use futures::stream::{BoxStream, StreamExt};
use safest_geo::Coordinate;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::{Navigator, PositionOutcome};

/// Events emitted while a session runs.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    /// Still walking the current step.
    Progress {
        /// Index of the step being walked.
        step_index: usize,
        /// Remaining distance to its endpoint in meters.
        distance_meters: f64,
    },
    /// Advanced to a new step.
    StepAdvanced {
        /// Index of the step now being walked.
        step_index: usize,
        /// Its instruction text.
        instruction: String,
    },
    /// Reached the destination; the session is over.
    Arrived,
    /// The session was cancelled.
    Cancelled,
}

/// Handle to a running session.
///
/// Dropping the handle without joining also ends the session: the
/// closed cancel channel resolves the runner's cancel branch.
pub struct SessionHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<Navigator>,
}

impl SessionHandle {
    /// Cancels the session. Takes effect before any further position
    /// update is processed; calling again is a no-op.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }

    /// Waits for the runner to finish and returns the (now idle)
    /// navigator.
    pub async fn join(self) -> Navigator {
        self.task.await.unwrap_or_default()
    }
}

/// Spawns a runner for an already-started navigator over a position
/// stream. Events are delivered on `events` in position order.
#[must_use]
pub fn start_session(
    navigator: Navigator,
    positions: BoxStream<'static, Coordinate>,
    events: mpsc::UnboundedSender<NavigationEvent>,
) -> SessionHandle {
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let task = tokio::spawn(run(navigator, positions, cancel_rx, events));
    SessionHandle {
        cancel: Some(cancel_tx),
        task,
    }
}

async fn run(
    mut navigator: Navigator,
    mut positions: BoxStream<'static, Coordinate>,
    mut cancel: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<NavigationEvent>,
) -> Navigator {
    loop {
        tokio::select! {
            biased;

            _ = &mut cancel => {
                navigator.cancel();
                let _ = events.send(NavigationEvent::Cancelled);
                break;
            }

            position = positions.next() => {
                let Some(position) = position else {
                    // Position source ended; leave whatever state stands.
                    break;
                };
                match navigator.on_position(position) {
                    PositionOutcome::Progress { step_index, distance_meters } => {
                        let _ = events.send(NavigationEvent::Progress { step_index, distance_meters });
                    }
                    PositionOutcome::Advanced { step_index } => {
                        let instruction = navigator
                            .session()
                            .map(|s| s.steps[step_index].instruction.clone())
                            .unwrap_or_default();
                        let _ = events.send(NavigationEvent::StepAdvanced { step_index, instruction });
                    }
                    PositionOutcome::Arrived => {
                        let _ = events.send(NavigationEvent::Arrived);
                        break;
                    }
                    PositionOutcome::Inactive => break,
                }
            }
        }
    }
    navigator
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use safest_directions::RouteStep;

    use super::*;

    fn step(instruction: &str, lat: f64, lng: f64) -> RouteStep {
        RouteStep {
            instruction: instruction.to_string(),
            endpoint: Coordinate::new(lat, lng),
            distance_meters: 100.0,
            duration_text: "2 mins".to_string(),
        }
    }

    fn started_navigator() -> Navigator {
        let mut navigator = Navigator::new();
        let route = vec![
            Coordinate::new(40.7128, -74.0060),
            Coordinate::new(40.7140, -74.0049),
            Coordinate::new(40.7152, -74.0038),
        ];
        let steps = vec![
            step("Head north on Broadway", 40.7140, -74.0049),
            step("Turn right", 40.7152, -74.0038),
        ];
        assert!(navigator.start(route, steps));
        navigator
    }

    #[tokio::test]
    async fn walks_a_session_to_arrival() {
        let navigator = started_navigator();
        let positions = stream::iter(vec![
            Coordinate::new(40.7128, -74.0060),
            Coordinate::new(40.7140, -74.0049),
            Coordinate::new(40.7152, -74.0038),
        ])
        .boxed();

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let handle = start_session(navigator, positions, events_tx);
        let navigator = handle.join().await;

        assert!(!navigator.is_active());

        let mut events = Vec::new();
        while let Ok(event) = events_rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events[0], NavigationEvent::Progress { step_index: 0, .. }));
        assert!(matches!(
            events[1],
            NavigationEvent::StepAdvanced { step_index: 1, .. }
        ));
        assert_eq!(events[2], NavigationEvent::Arrived);
    }

    #[tokio::test]
    async fn cancel_wins_over_pending_positions() {
        let navigator = started_navigator();
        // A stream that is always ready with endpoint hits; cancelling
        // first must still stop the session before any advance.
        let positions = stream::iter(vec![
            Coordinate::new(40.7140, -74.0049);
            16
        ])
        .boxed();

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut handle = start_session(navigator, positions, events_tx);
        handle.cancel();
        let navigator = handle.join().await;

        assert!(!navigator.is_active());
        assert_eq!(events_rx.try_recv(), Ok(NavigationEvent::Cancelled));
    }

    #[tokio::test]
    async fn cancel_twice_is_safe() {
        let navigator = started_navigator();
        let positions = stream::iter(Vec::new()).boxed();
        let (events_tx, _events_rx) = mpsc::unbounded_channel();

        let mut handle = start_session(navigator, positions, events_tx);
        handle.cancel();
        handle.cancel();
        let navigator = handle.join().await;
        assert!(!navigator.is_active());
    }

    #[tokio::test]
    async fn exhausted_stream_ends_the_runner() {
        let navigator = started_navigator();
        let positions = stream::iter(vec![Coordinate::new(40.7128, -74.0060)]).boxed();
        let (events_tx, _events_rx) = mpsc::unbounded_channel();

        let handle = start_session(navigator, positions, events_tx);
        let navigator = handle.join().await;
        // One progress update, then the source dried up mid-session.
        assert!(navigator.is_active());
    }
}
