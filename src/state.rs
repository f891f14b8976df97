// Drive state store: the single source of truth every visual consumer reads.
// Setters are assignment plus change notification; redundant writes emit
// nothing, so a frame that recomputes identical state stays silent.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::JourneyError;
use crate::types::MarkerScreenPosition;

/// Change notification emitted by the store. Consumers drain these once per
/// frame; the queue is the observer seam between driver and presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DriveEvent {
    ProgressChanged { progress: f32 },
    ActiveMarkerChanged { index: Option<usize> },
    MarkerVisited { index: usize },
    JourneyFinished,
    CarParked,
    ReplayRequested { count: u32 },
    MarkersProjected,
}

/// Shared per-page-view drive state. One instance per mount, passed by
/// reference to the scroll driver, motion rig, projector, and scoreboard.
/// Single-threaded by design; see the concurrency notes in the crate docs.
#[derive(Debug)]
pub struct DriveStore {
    milestone_count: usize,
    progress: f32,
    active_marker: Option<usize>,
    visited: BTreeSet<usize>,
    journey_finished: bool,
    car_at_garage: bool,
    replay_counter: u32,
    marker_screen_positions: Vec<MarkerScreenPosition>,
    events: Vec<DriveEvent>,
}

impl DriveStore {
    pub fn new(milestone_count: usize, initial_progress: f32) -> DriveStore {
        DriveStore {
            milestone_count,
            progress: initial_progress,
            active_marker: None,
            visited: BTreeSet::new(),
            journey_finished: false,
            car_at_garage: false,
            replay_counter: 0,
            marker_screen_positions: vec![
                MarkerScreenPosition::default();
                milestone_count
            ],
            events: Vec::new(),
        }
    }

    pub fn milestone_count(&self) -> usize {
        self.milestone_count
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn active_marker(&self) -> Option<usize> {
        self.active_marker
    }

    pub fn visited(&self) -> &BTreeSet<usize> {
        &self.visited
    }

    pub fn journey_finished(&self) -> bool {
        self.journey_finished
    }

    pub fn car_at_garage(&self) -> bool {
        self.car_at_garage
    }

    pub fn replay_counter(&self) -> u32 {
        self.replay_counter
    }

    pub fn marker_screen_positions(&self) -> &[MarkerScreenPosition] {
        &self.marker_screen_positions
    }

    pub fn set_progress(&mut self, progress: f32) {
        if progress == self.progress {
            return;
        }
        self.progress = progress;
        self.events.push(DriveEvent::ProgressChanged { progress });
    }

    /// Set the nearest-marker index. `Some(i)` must index a milestone.
    pub fn set_active_marker(&mut self, index: Option<usize>) -> Result<(), JourneyError> {
        if let Some(i) = index {
            if i >= self.milestone_count {
                return Err(JourneyError::MarkerOutOfRange {
                    index: i,
                    count: self.milestone_count,
                });
            }
        }
        if index != self.active_marker {
            self.active_marker = index;
            self.events.push(DriveEvent::ActiveMarkerChanged { index });
        }
        Ok(())
    }

    /// Record a milestone as visited. Idempotent: re-adding an index keeps
    /// the set unchanged and emits no duplicate event.
    pub fn add_visited(&mut self, index: usize) -> Result<(), JourneyError> {
        if index >= self.milestone_count {
            return Err(JourneyError::MarkerOutOfRange {
                index,
                count: self.milestone_count,
            });
        }
        if self.visited.insert(index) {
            self.events.push(DriveEvent::MarkerVisited { index });
        }
        Ok(())
    }

    pub fn set_journey_finished(&mut self, finished: bool) {
        if finished == self.journey_finished {
            return;
        }
        self.journey_finished = finished;
        if finished {
            self.events.push(DriveEvent::JourneyFinished);
        }
    }

    pub fn set_car_at_garage(&mut self, at_garage: bool) {
        if at_garage == self.car_at_garage {
            return;
        }
        self.car_at_garage = at_garage;
        if at_garage {
            self.events.push(DriveEvent::CarParked);
        }
    }

    /// Clear the visited set and bump the replay counter.
    ///
    /// Caller contract: this does NOT reset `progress`, `journey_finished`,
    /// or `car_at_garage`. The replay entry point (scoreboard) resets those
    /// explicitly, in that order, before snapping scroll back to the top —
    /// the counter exists so consumers can key per-traversal effects off it.
    pub fn trigger_replay(&mut self) {
        self.visited.clear();
        self.replay_counter += 1;
        self.events.push(DriveEvent::ReplayRequested {
            count: self.replay_counter,
        });
    }

    /// Publish a freshly projected marker array. The projector applies its
    /// own hysteresis; anything arriving here is a real change.
    pub fn set_marker_screen_positions(&mut self, positions: &[MarkerScreenPosition]) {
        self.marker_screen_positions.clear();
        self.marker_screen_positions.extend_from_slice(positions);
        self.events.push(DriveEvent::MarkersProjected);
    }

    /// Take all pending change notifications, oldest first.
    pub fn drain_events(&mut self) -> Vec<DriveEvent> {
        std::mem::take(&mut self.events)
    }

    #[cfg(test)]
    pub(crate) fn pending_events(&self) -> &[DriveEvent] {
        &self.events
    }
}
