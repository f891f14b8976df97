// Per-frame car and camera motion. Samples the track at the current progress
// (or the garage landmark once parked) and eases the rendered transforms
// toward the sampled targets. Purely continuous: the only discrete choice is
// the pursuit-vs-garage framing preset.
//
// The rig's vectors are persistent state reused across frames; nothing here
// allocates in the steady state. Single-threaded only — the rig must not be
// shared across threads.

use glam::Vec3;

use crate::state::DriveStore;
use crate::track::{TrackCurve, START_FINISH_PARAM};
use crate::types::{CameraPose, CameraSettings, CarPose};

/// Reference frame time the lerp factors are calibrated against.
const REFERENCE_FRAME_MS: f32 = 16.667;

#[derive(Debug)]
pub struct MotionRig {
    settings: CameraSettings,
    car_position: Vec3,
    car_yaw: f32,
    camera_position: Vec3,
    camera_look: Vec3,
    initialized: bool,
}

impl MotionRig {
    pub fn new(settings: CameraSettings) -> MotionRig {
        MotionRig {
            settings,
            car_position: Vec3::ZERO,
            car_yaw: 0.0,
            camera_position: Vec3::ZERO,
            camera_look: Vec3::ZERO,
            initialized: false,
        }
    }

    /// Advance the rig one frame and return the transforms to render.
    /// Tolerates unchanged state between frames (pure read of the store).
    pub fn update(
        &mut self,
        store: &DriveStore,
        curve: &TrackCurve,
        dt_ms: f32,
    ) -> (CarPose, CameraPose) {
        let t = if store.car_at_garage() {
            START_FINISH_PARAM
        } else {
            store.progress()
        };
        // point_at wraps, so transiently out-of-range progress still samples
        // a valid point instead of degenerating.
        let point = curve.point_at(t);
        let tangent = curve.tangent_at(t);

        let car_target = point + Vec3::Y * self.settings.car_height;
        let yaw_target = if tangent.x.abs() + tangent.z.abs() > 1e-6 {
            tangent.x.atan2(tangent.z)
        } else {
            self.car_yaw
        };

        let (back, height, lerp_factor) = if store.car_at_garage() {
            (
                self.settings.garage_back,
                self.settings.garage_height,
                self.settings.garage_lerp,
            )
        } else {
            (
                self.settings.pursuit_back,
                self.settings.pursuit_height,
                self.settings.pursuit_lerp,
            )
        };
        let camera_target = point - tangent * back + Vec3::Y * height;
        let look_target = point + Vec3::Y * self.settings.look_height;

        if !self.initialized {
            self.car_position = car_target;
            self.car_yaw = yaw_target;
            self.camera_position = camera_target;
            self.camera_look = look_target;
            self.initialized = true;
        } else {
            let alpha = smoothing_alpha(lerp_factor, dt_ms);
            self.car_position = self.car_position.lerp(car_target, alpha);
            self.car_yaw += shortest_angle(self.car_yaw, yaw_target) * alpha;
            self.camera_position = self.camera_position.lerp(camera_target, alpha);
            self.camera_look = self.camera_look.lerp(look_target, alpha);
        }

        (
            CarPose {
                position: self.car_position.to_array(),
                yaw: self.car_yaw,
            },
            CameraPose {
                position: self.camera_position.to_array(),
                look_at: self.camera_look.to_array(),
            },
        )
    }

    /// Snap back to targets on the next frame. Used on replay so the camera
    /// does not sweep across the whole circuit.
    pub fn reset(&mut self) {
        self.initialized = false;
    }
}

/// Frame-rate-independent smoothing: `factor` is the per-frame blend at the
/// reference frame time, rescaled exponentially for the actual `dt_ms`.
fn smoothing_alpha(factor: f32, dt_ms: f32) -> f32 {
    let factor = factor.clamp(0.0, 1.0);
    if factor >= 1.0 {
        return 1.0;
    }
    let frames = (dt_ms / REFERENCE_FRAME_MS).max(0.0);
    1.0 - (1.0 - factor).powf(frames)
}

/// Signed shortest rotation from `from` to `to`, in radians.
fn shortest_angle(from: f32, to: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (to - from + PI).rem_euclid(TAU) - PI
}
