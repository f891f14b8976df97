// Scroll-to-progress driver. Converts raw page scroll into a position on the
// track curve via a piecewise-linear map over equal pixel segments, tracks the
// nearest milestone, and runs the end-of-journey state machine:
// AtRest -> Driving -> Finishing -> Finished.
//
// Scroll events are coalesced: `submit` only records the latest offset, and
// all work happens in `tick`, once per rendered frame.

use crate::error::JourneyError;
use crate::state::DriveStore;
use crate::track::{TrackLayout, START_FINISH_PARAM};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    AtRest,
    Driving,
    /// Eased roll from the wrap point into the garage. Driven by frame-delta
    /// accumulation rather than wall clock, so a stalled frame loop slows the
    /// animation instead of jumping it.
    Finishing {
        elapsed_ms: f32,
    },
    Finished,
}

#[derive(Debug)]
pub struct ScrollDriver {
    layout: TrackLayout,
    section_top: f32,
    pixels_per_segment: f32,
    finish_epsilon: f32,
    initial_progress: f32,
    finish_duration_ms: f32,
    pending: Option<f32>,
    phase: Phase,
}

impl ScrollDriver {
    pub fn new(
        layout: TrackLayout,
        pixels_per_segment: f32,
        finish_epsilon: f32,
        initial_progress: f32,
        finish_duration_ms: f32,
    ) -> ScrollDriver {
        ScrollDriver {
            layout,
            section_top: 0.0,
            pixels_per_segment,
            finish_epsilon,
            initial_progress,
            finish_duration_ms: finish_duration_ms.max(1.0),
            pending: None,
            phase: Phase::AtRest,
        }
    }

    /// Total scroll distance of one full traversal:
    /// `(milestone_count + 1) * pixels_per_segment`.
    pub fn total_scroll_budget(&self) -> f32 {
        (self.layout.len() as f32 + 1.0) * self.pixels_per_segment
    }

    /// Page offset of the journey section's top edge. Updated on layout
    /// changes; never resets progress or the visited set.
    pub fn set_section_top(&mut self, top: f32) {
        self.section_top = top;
    }

    /// Record a raw scroll offset. Latest submission wins; earlier ones that
    /// arrive between frames are overwritten, not queued.
    pub fn submit(&mut self, scroll_y: f32) {
        self.pending = Some(scroll_y);
    }

    /// Scroll offset (absolute, page coordinates) that centers milestone
    /// `index`, used by the scoreboard's jump-to-milestone.
    pub fn scroll_offset_for(&self, index: usize, padding: f32) -> f32 {
        self.section_top + index as f32 * self.pixels_per_segment + padding
    }

    /// Re-enable scroll-driven updates after the finish flags were cleared
    /// out of band (jump-to-milestone). Flags must already be reset on the
    /// store, otherwise the next tick would still see a finished journey.
    pub fn resume(&mut self) {
        self.pending = None;
        self.phase = Phase::Driving;
    }

    /// Reset per-traversal state for replay or teardown. Aborts a finishing
    /// animation mid-flight; nothing is written to the store afterwards.
    pub fn reset_traversal(&mut self) {
        self.pending = None;
        self.phase = Phase::AtRest;
    }

    /// Per-frame update. Consumes at most one coalesced scroll offset, or
    /// advances the finishing animation by `dt_ms`.
    pub fn tick(&mut self, store: &mut DriveStore, dt_ms: f32) -> Result<(), JourneyError> {
        match self.phase {
            Phase::Finishing { elapsed_ms } => {
                // Not interruptible by scroll; drop anything that came in.
                self.pending = None;
                self.advance_finish(store, elapsed_ms + dt_ms.max(0.0));
                Ok(())
            }
            Phase::Finished => {
                self.pending = None;
                Ok(())
            }
            Phase::AtRest | Phase::Driving => match self.pending.take() {
                Some(scroll_y) => self.apply_scroll(store, scroll_y),
                None => Ok(()),
            },
        }
    }

    fn advance_finish(&mut self, store: &mut DriveStore, elapsed_ms: f32) {
        let t = (elapsed_ms / self.finish_duration_ms).min(1.0);
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        store.set_progress(eased * START_FINISH_PARAM);

        if t >= 1.0 {
            self.phase = Phase::Finished;
            store.set_car_at_garage(true);
        } else {
            self.phase = Phase::Finishing { elapsed_ms };
        }
    }

    fn apply_scroll(&mut self, store: &mut DriveStore, scroll_y: f32) -> Result<(), JourneyError> {
        let budget = self.total_scroll_budget();
        let effective = (scroll_y - self.section_top).clamp(0.0, budget);

        if effective <= 0.0 {
            self.phase = Phase::AtRest;
            store.set_progress(self.initial_progress);
            store.set_active_marker(None)?;
            return Ok(());
        }

        self.phase = Phase::Driving;
        let progress = self.progress_for(effective);
        store.set_progress(progress);

        let nearest = self.layout.nearest_marker(progress);
        if nearest != store.active_marker() {
            if let Some(index) = nearest {
                store.add_visited(index)?;
            }
            store.set_active_marker(nearest)?;
        }

        if effective >= budget - self.finish_epsilon {
            store.set_active_marker(None)?;
            store.set_journey_finished(true);
            self.phase = Phase::Finishing { elapsed_ms: 0.0 };
        }

        Ok(())
    }

    /// Piecewise-linear map from effective scroll to curve parameter.
    /// Segment 0 spans initial..position(0), segment i spans
    /// position(i-1)..position(i), and the last segment closes the lap at 1.
    /// Continuous and non-decreasing in `effective`.
    fn progress_for(&self, effective: f32) -> f32 {
        let n = self.layout.len();
        let positions = self.layout.positions();

        let segment = ((effective / self.pixels_per_segment) as usize).min(n);
        let local = ((effective - segment as f32 * self.pixels_per_segment)
            / self.pixels_per_segment)
            .clamp(0.0, 1.0);

        let from = if segment == 0 {
            self.initial_progress
        } else {
            positions[segment - 1]
        };
        let to = if segment == n { 1.0 } else { positions[segment] };

        from + (to - from) * local
    }
}
