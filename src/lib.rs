// journey_core: Rust/WASM engine for the About page's scroll-driven 3D
// timeline. All journey state and math live here; the host page is plumbing
// that forwards scroll/resize/frame ticks and applies the returned transforms.

mod error;
mod motion;
mod overlay;
mod projector;
mod scroll;
mod state;
mod track;
mod types;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

pub use error::JourneyError;
pub use motion::MotionRig;
pub use overlay::{Scoreboard, ScrollCommand};
pub use projector::MarkerProjector;
pub use scroll::ScrollDriver;
pub use state::{DriveEvent, DriveStore};
pub use track::{TrackCurve, TrackLayout, START_FINISH_PARAM};
pub use types::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Everything the host needs to render one frame, returned as one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameOutput {
    pub progress: f32,
    /// Nearest milestone index, or -1 when none is active.
    pub active_marker: i32,
    pub visited: Vec<usize>,
    pub journey_finished: bool,
    pub car_at_garage: bool,
    pub replay_counter: u32,
    pub car: CarPose,
    pub camera: CameraPose,
    pub markers: Vec<MarkerScreenPosition>,
    pub events: Vec<DriveEvent>,
}

/// The journey engine proper. Native callers (and tests) use this directly;
/// the WASM `Journey` wrapper below adds the JSON boundary.
///
/// Single-threaded and frame-driven: the host calls `on_scroll` from its
/// scroll listener (events are coalesced internally) and `tick` once per
/// rendered frame. Dropping the engine is teardown; there are no callbacks
/// to unsubscribe on the Rust side.
pub struct JourneyEngine {
    curve: TrackCurve,
    store: DriveStore,
    driver: ScrollDriver,
    rig: MotionRig,
    projector: MarkerProjector,
    scoreboard: Scoreboard,
    milestones: Vec<Milestone>,
    viewport: ViewportSize,
}

impl JourneyEngine {
    pub fn new(mut config: JourneyConfig) -> Result<JourneyEngine, JourneyError> {
        if !(config.pixels_per_segment > 0.0) {
            return Err(JourneyError::InvalidConfig(
                "pixels_per_segment must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&config.initial_progress) || config.initial_progress == 0.0 {
            return Err(JourneyError::InvalidConfig(
                "initial_progress must lie strictly between 0 and 1".to_string(),
            ));
        }

        config.milestones.sort_by_key(|m| m.sort_order);
        let milestones = config.milestones;
        let count = milestones.len();

        let curve = TrackCurve::default_circuit();
        let layout = TrackLayout::new(count);
        let projector = MarkerProjector::new(
            &curve,
            &layout,
            &milestones,
            config.marker,
            &config.camera,
        );
        let driver = ScrollDriver::new(
            layout,
            config.pixels_per_segment,
            config.finish_epsilon_px,
            config.initial_progress,
            config.finish_duration_ms,
        );

        Ok(JourneyEngine {
            curve,
            store: DriveStore::new(count, config.initial_progress),
            driver,
            rig: MotionRig::new(config.camera),
            projector,
            scoreboard: Scoreboard::new(count, config.select_padding_px, config.initial_progress),
            milestones,
            viewport: ViewportSize::default(),
        })
    }

    /// Record a raw scroll offset; coalesced to the next `tick`.
    pub fn on_scroll(&mut self, scroll_y: f32) {
        self.driver.submit(scroll_y);
    }

    /// Page offset of the journey section's top edge.
    pub fn set_section_top(&mut self, top: f32) {
        self.driver.set_section_top(top);
    }

    /// Viewport resize. Recomputes projection math only; progress and the
    /// visited set are untouched.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = ViewportSize { width, height };
    }

    /// Advance one frame: scroll driver, motion rig, marker projection, then
    /// a snapshot of everything the host renders from.
    pub fn tick(&mut self, dt_ms: f32) -> Result<FrameOutput, JourneyError> {
        self.driver.tick(&mut self.store, dt_ms)?;
        let (car, camera) = self.rig.update(&self.store, &self.curve, dt_ms);
        self.projector.update(&mut self.store, &camera, self.viewport);

        Ok(FrameOutput {
            progress: self.store.progress(),
            active_marker: self
                .store
                .active_marker()
                .map_or(-1, |i| i as i32),
            visited: self.store.visited().iter().copied().collect(),
            journey_finished: self.store.journey_finished(),
            car_at_garage: self.store.car_at_garage(),
            replay_counter: self.store.replay_counter(),
            car,
            camera,
            markers: self.store.marker_screen_positions().to_vec(),
            events: self.store.drain_events(),
        })
    }

    /// Jump to a milestone; returns the scroll command for the host.
    pub fn select_milestone(&mut self, index: usize) -> Result<ScrollCommand, JourneyError> {
        self.scoreboard
            .select_milestone(&mut self.store, &mut self.driver, index)
    }

    /// Restart the journey; returns the scroll command for the host.
    pub fn replay(&mut self) -> Result<ScrollCommand, JourneyError> {
        self.scoreboard
            .replay(&mut self.store, &mut self.driver, &mut self.rig)
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn total_scroll_budget(&self) -> f32 {
        self.driver.total_scroll_budget()
    }

    pub fn store(&self) -> &DriveStore {
        &self.store
    }
}

/// Main engine interface exposed to JavaScript.
/// Batch interface to minimize JS↔WASM crossings: one JSON string in at
/// construction, one JSON frame snapshot out per tick.
#[wasm_bindgen]
pub struct Journey {
    inner: JourneyEngine,
}

#[wasm_bindgen]
impl Journey {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<Journey, JsValue> {
        let config: JourneyConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
        let inner = JourneyEngine::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Journey { inner })
    }

    pub fn on_scroll(&mut self, scroll_y: f32) {
        self.inner.on_scroll(scroll_y);
    }

    pub fn set_section_top(&mut self, top: f32) {
        self.inner.set_section_top(top);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.inner.resize(width, height);
    }

    /// Advance one frame and return the FrameOutput snapshot as JSON.
    pub fn tick(&mut self, dt_ms: f32) -> Result<String, JsValue> {
        let output = self
            .inner
            .tick(dt_ms)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_json::to_string(&output)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Jump to a milestone. Returns a ScrollCommand as JSON.
    pub fn select_milestone(&mut self, index: u32) -> Result<String, JsValue> {
        let command = self
            .inner
            .select_milestone(index as usize)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_json::to_string(&command)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Restart the journey. Returns a ScrollCommand as JSON.
    pub fn replay(&mut self) -> Result<String, JsValue> {
        let command = self
            .inner
            .replay()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_json::to_string(&command)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn progress(&self) -> f32 {
        self.inner.store().progress()
    }

    pub fn journey_finished(&self) -> bool {
        self.inner.store().journey_finished()
    }

    pub fn car_at_garage(&self) -> bool {
        self.inner.store().car_at_garage()
    }

    pub fn replay_counter(&self) -> u32 {
        self.inner.store().replay_counter()
    }

    pub fn total_scroll_budget(&self) -> f32 {
        self.inner.total_scroll_budget()
    }
}
