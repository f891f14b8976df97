// Scoreboard orchestration: the two sanctioned write paths back into
// driver-owned state. Jump-to-milestone and replay both act by handing the
// host a scroll command; flags are reset BEFORE the command is returned so
// the driver's next tick already sees an unfinished journey.

use serde::{Deserialize, Serialize};

use crate::error::JourneyError;
use crate::motion::MotionRig;
use crate::scroll::ScrollDriver;
use crate::state::DriveStore;

/// Scroll instruction for the host page to execute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScrollCommand {
    /// Smooth-scroll to an absolute page offset.
    ScrollTo { offset: f32 },
    /// Snap back to the top of the journey section.
    SnapToTop,
}

#[derive(Debug)]
pub struct Scoreboard {
    milestone_count: usize,
    select_padding: f32,
    initial_progress: f32,
}

impl Scoreboard {
    pub fn new(milestone_count: usize, select_padding: f32, initial_progress: f32) -> Scoreboard {
        Scoreboard {
            milestone_count,
            select_padding,
            initial_progress,
        }
    }

    /// Jump to a milestone. Clears the finish flags and re-arms the driver
    /// first; only then is the scroll command produced. Reordering this would
    /// race the driver's per-frame read of `journey_finished`.
    pub fn select_milestone(
        &self,
        store: &mut DriveStore,
        driver: &mut ScrollDriver,
        index: usize,
    ) -> Result<ScrollCommand, JourneyError> {
        if index >= self.milestone_count {
            return Err(JourneyError::MarkerOutOfRange {
                index,
                count: self.milestone_count,
            });
        }

        store.set_journey_finished(false);
        store.set_car_at_garage(false);
        driver.resume();

        Ok(ScrollCommand::ScrollTo {
            offset: driver.scroll_offset_for(index, self.select_padding),
        })
    }

    /// Start the journey over. Completes the replay caller contract: clears
    /// the visited set via the store, then resets the traversal flags and
    /// progress explicitly before asking the host to snap scroll to the top.
    pub fn replay(
        &self,
        store: &mut DriveStore,
        driver: &mut ScrollDriver,
        rig: &mut MotionRig,
    ) -> Result<ScrollCommand, JourneyError> {
        store.trigger_replay();
        store.set_journey_finished(false);
        store.set_car_at_garage(false);
        store.set_active_marker(None)?;
        store.set_progress(self.initial_progress);
        driver.reset_traversal();
        rig.reset();

        Ok(ScrollCommand::SnapToTop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackLayout;
    use crate::types::CameraSettings;

    const INITIAL: f32 = 0.012;

    fn setup(n: usize) -> (Scoreboard, DriveStore, ScrollDriver, MotionRig) {
        (
            Scoreboard::new(n, 80.0, INITIAL),
            DriveStore::new(n, INITIAL),
            ScrollDriver::new(TrackLayout::new(n), 1500.0, 5.0, INITIAL, 800.0),
            MotionRig::new(CameraSettings::default()),
        )
    }

    fn finish_journey(store: &mut DriveStore, driver: &mut ScrollDriver) {
        let budget = driver.total_scroll_budget();
        driver.submit(budget);
        driver.tick(store, 16.0).expect("tick");
        for _ in 0..60 {
            driver.tick(store, 16.0).expect("tick");
        }
        assert!(store.journey_finished() && store.car_at_garage());
    }

    #[test]
    fn select_computes_segment_offset() {
        let (scoreboard, mut store, mut driver, _) = setup(4);
        driver.set_section_top(200.0);

        let command = scoreboard
            .select_milestone(&mut store, &mut driver, 2)
            .expect("index in range");
        assert_eq!(
            command,
            ScrollCommand::ScrollTo {
                offset: 200.0 + 2.0 * 1500.0 + 80.0
            }
        );
    }

    #[test]
    fn select_clears_flags_before_returning() {
        let (scoreboard, mut store, mut driver, _) = setup(3);
        finish_journey(&mut store, &mut driver);

        scoreboard
            .select_milestone(&mut store, &mut driver, 1)
            .expect("index in range");
        assert!(!store.journey_finished());
        assert!(!store.car_at_garage());

        // The driver accepts scroll again on its very next tick.
        driver.submit(3000.0);
        driver.tick(&mut store, 16.0).expect("tick");
        assert_eq!(store.active_marker(), Some(1));
    }

    #[test]
    fn select_rejects_out_of_range() {
        let (scoreboard, mut store, mut driver, _) = setup(2);
        assert!(scoreboard
            .select_milestone(&mut store, &mut driver, 2)
            .is_err());
    }

    #[test]
    fn replay_resets_traversal_and_snaps_to_top() {
        let (scoreboard, mut store, mut driver, mut rig) = setup(3);
        finish_journey(&mut store, &mut driver);
        assert!(!store.visited().is_empty());

        let command = scoreboard
            .replay(&mut store, &mut driver, &mut rig)
            .expect("replay");
        assert_eq!(command, ScrollCommand::SnapToTop);
        assert!(store.visited().is_empty());
        assert_eq!(store.replay_counter(), 1);
        assert!(!store.journey_finished());
        assert!(!store.car_at_garage());
        assert_eq!(store.progress(), INITIAL);

        // A fresh traversal works end to end.
        driver.submit(0.0);
        driver.tick(&mut store, 16.0).expect("tick");
        driver.submit(1500.0);
        driver.tick(&mut store, 16.0).expect("tick");
        assert_eq!(store.active_marker(), Some(0));
        assert_eq!(store.visited().len(), 1);
    }
}
