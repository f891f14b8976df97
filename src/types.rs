// Shared types for the journey engine. Config structs come from JS as JSON,
// frame output goes back the same way. Strong typing over loose floats where
// it matters (marker indices, viewport size).

use serde::{Deserialize, Serialize};

/// Which side of the track a milestone's marker sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl Side {
    /// Sign applied to the track's lateral (right-hand) direction.
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// Milestone record supplied by the host before the engine mounts.
/// Immutable for the lifetime of the page view; order is fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub year: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub side: Side,
    #[serde(default)]
    pub sort_order: i32,
}

/// Engine configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyConfig {
    pub milestones: Vec<Milestone>,
    /// Scroll distance allotted to each segment of the journey, in CSS pixels.
    #[serde(default = "default_pixels_per_segment")]
    pub pixels_per_segment: f32,
    /// Distance from the end of the scroll budget at which the finish fires.
    #[serde(default = "default_finish_epsilon")]
    pub finish_epsilon_px: f32,
    /// Curve parameter the car rests at before any scrolling. Just past the
    /// start line so the car is visibly on the track, never exactly 0.
    #[serde(default = "default_initial_progress")]
    pub initial_progress: f32,
    /// Duration of the eased roll from the wrap point into the garage.
    #[serde(default = "default_finish_duration")]
    pub finish_duration_ms: f32,
    /// Extra scroll offset applied when jumping to a milestone, so the
    /// selected marker lands mid-segment rather than on its leading edge.
    #[serde(default = "default_select_padding")]
    pub select_padding_px: f32,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub marker: MarkerSettings,
}

fn default_pixels_per_segment() -> f32 {
    1500.0
}

fn default_finish_epsilon() -> f32 {
    5.0
}

fn default_initial_progress() -> f32 {
    0.012
}

fn default_finish_duration() -> f32 {
    800.0
}

fn default_select_padding() -> f32 {
    80.0
}

/// Camera framing and smoothing settings.
/// Two presets: a pursuit frame while driving, a closer garage frame once the
/// car is parked. The garage lerp factor is faster so the zoom-in reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "default_pursuit_back")]
    pub pursuit_back: f32,
    #[serde(default = "default_pursuit_height")]
    pub pursuit_height: f32,
    #[serde(default = "default_garage_back")]
    pub garage_back: f32,
    #[serde(default = "default_garage_height")]
    pub garage_height: f32,
    /// Height above the sampled track point the camera looks at.
    #[serde(default = "default_look_height")]
    pub look_height: f32,
    /// Height of the car body above the track surface.
    #[serde(default = "default_car_height")]
    pub car_height: f32,
    /// Smoothing factor at the reference frame time (16.67ms).
    #[serde(default = "default_pursuit_lerp")]
    pub pursuit_lerp: f32,
    #[serde(default = "default_garage_lerp")]
    pub garage_lerp: f32,
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "default_near")]
    pub near_clip: f32,
    #[serde(default = "default_far")]
    pub far_clip: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        CameraSettings {
            pursuit_back: default_pursuit_back(),
            pursuit_height: default_pursuit_height(),
            garage_back: default_garage_back(),
            garage_height: default_garage_height(),
            look_height: default_look_height(),
            car_height: default_car_height(),
            pursuit_lerp: default_pursuit_lerp(),
            garage_lerp: default_garage_lerp(),
            fov_degrees: default_fov(),
            near_clip: default_near(),
            far_clip: default_far(),
        }
    }
}

fn default_pursuit_back() -> f32 {
    9.0
}

fn default_pursuit_height() -> f32 {
    4.5
}

fn default_garage_back() -> f32 {
    4.0
}

fn default_garage_height() -> f32 {
    1.8
}

fn default_look_height() -> f32 {
    0.8
}

fn default_car_height() -> f32 {
    0.25
}

fn default_pursuit_lerp() -> f32 {
    0.08
}

fn default_garage_lerp() -> f32 {
    0.16
}

fn default_fov() -> f32 {
    55.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    220.0
}

/// Marker placement and projection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSettings {
    /// Lateral distance from the track centerline to the marker post.
    #[serde(default = "default_lateral_offset")]
    pub lateral_offset: f32,
    #[serde(default = "default_vertical_offset")]
    pub vertical_offset: f32,
    /// Project markers only every k-th frame.
    #[serde(default = "default_projection_stride")]
    pub projection_stride: u32,
    /// Minimum pixel movement before a new marker array is published.
    #[serde(default = "default_publish_threshold")]
    pub publish_threshold_px: f32,
}

impl Default for MarkerSettings {
    fn default() -> Self {
        MarkerSettings {
            lateral_offset: default_lateral_offset(),
            vertical_offset: default_vertical_offset(),
            projection_stride: default_projection_stride(),
            publish_threshold_px: default_publish_threshold(),
        }
    }
}

fn default_lateral_offset() -> f32 {
    2.5
}

fn default_vertical_offset() -> f32 {
    1.6
}

fn default_projection_stride() -> u32 {
    3
}

fn default_publish_threshold() -> f32 {
    1.5
}

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        ViewportSize {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

/// Projected screen position of one milestone marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MarkerScreenPosition {
    pub x: f32,
    pub y: f32,
    pub visible: bool,
}

/// Car placement for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CarPose {
    pub position: [f32; 3],
    /// Heading around the vertical axis, radians.
    pub yaw: f32,
}

/// Camera placement for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CameraPose {
    pub position: [f32; 3],
    pub look_at: [f32; 3],
}
