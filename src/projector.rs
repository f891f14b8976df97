// Marker projection: fixed track-relative world positions projected through
// the active camera into screen pixels for the DOM overlay. Throttled to
// every k-th frame, with pixel hysteresis so identical frames publish nothing.
//
// The projection and publish buffers are pre-allocated at construction and
// reused; steady-state frames do not allocate.

use glam::{Mat4, Vec3};

use crate::state::DriveStore;
use crate::track::{TrackCurve, TrackLayout};
use crate::types::{
    CameraPose, CameraSettings, MarkerScreenPosition, MarkerSettings, Milestone, ViewportSize,
};

#[derive(Debug)]
pub struct MarkerProjector {
    settings: MarkerSettings,
    fov_degrees: f32,
    near_clip: f32,
    far_clip: f32,
    world_positions: Vec<Vec3>,
    scratch: Vec<MarkerScreenPosition>,
    published: Vec<MarkerScreenPosition>,
    has_published: bool,
    frame_counter: u32,
}

impl MarkerProjector {
    /// Precompute marker world positions: the track point at each milestone's
    /// parameter, pushed laterally to the milestone's side of the road.
    pub fn new(
        curve: &TrackCurve,
        layout: &TrackLayout,
        milestones: &[Milestone],
        settings: MarkerSettings,
        camera: &CameraSettings,
    ) -> MarkerProjector {
        let world_positions = milestones
            .iter()
            .enumerate()
            .filter_map(|(i, milestone)| {
                let t = layout.position(i)?;
                let point = curve.point_at(t);
                let lateral = curve.tangent_at(t).cross(Vec3::Y).normalize_or_zero();
                Some(
                    point
                        + lateral * (settings.lateral_offset * milestone.side.sign())
                        + Vec3::Y * settings.vertical_offset,
                )
            })
            .collect::<Vec<_>>();

        let count = world_positions.len();
        MarkerProjector {
            settings,
            fov_degrees: camera.fov_degrees,
            near_clip: camera.near_clip,
            far_clip: camera.far_clip,
            world_positions,
            scratch: vec![MarkerScreenPosition::default(); count],
            published: vec![MarkerScreenPosition::default(); count],
            has_published: false,
            frame_counter: 0,
        }
    }

    /// Per-frame update. Projects on every `projection_stride`-th call and
    /// publishes to the store only when something moved past the hysteresis
    /// threshold or flipped visibility.
    pub fn update(&mut self, store: &mut DriveStore, camera: &CameraPose, viewport: ViewportSize) {
        let stride = self.settings.projection_stride.max(1);
        let run = self.frame_counter % stride == 0;
        self.frame_counter = self.frame_counter.wrapping_add(1);
        if !run || self.world_positions.is_empty() {
            return;
        }
        if !(viewport.width > 0.0) || !(viewport.height > 0.0) {
            return;
        }

        let Some(view_projection) = self.view_projection(camera, viewport) else {
            return;
        };

        for (slot, world) in self.scratch.iter_mut().zip(&self.world_positions) {
            *slot = project(&view_projection, *world, viewport, *slot);
        }

        if self.should_publish() {
            store.set_marker_screen_positions(&self.scratch);
            self.published.copy_from_slice(&self.scratch);
            self.has_published = true;
        }
    }

    fn view_projection(&self, camera: &CameraPose, viewport: ViewportSize) -> Option<Mat4> {
        let eye = Vec3::from(camera.position);
        let target = Vec3::from(camera.look_at);
        if (target - eye).length_squared() <= f32::EPSILON {
            return None;
        }

        let aspect = viewport.width / viewport.height;
        if !aspect.is_finite() || aspect <= 0.0 {
            return None;
        }

        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let projection = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            aspect,
            self.near_clip.max(1e-4),
            self.far_clip.max(self.near_clip + 1.0),
        );
        Some(projection * view)
    }

    fn should_publish(&self) -> bool {
        if !self.has_published {
            return true;
        }
        let threshold = self.settings.publish_threshold_px;
        self.scratch.iter().zip(&self.published).any(|(new, old)| {
            new.visible != old.visible
                || (new.visible
                    && ((new.x - old.x).abs() > threshold || (new.y - old.y).abs() > threshold))
        })
    }
}

fn project(
    view_projection: &Mat4,
    world: Vec3,
    viewport: ViewportSize,
    previous: MarkerScreenPosition,
) -> MarkerScreenPosition {
    let clip = *view_projection * world.extend(1.0);
    if clip.w <= 0.0 {
        // Behind the camera: keep the last pixel position so the overlay can
        // fade out in place instead of snapping to a corner.
        return MarkerScreenPosition {
            visible: false,
            ..previous
        };
    }

    let ndc = clip.truncate() / clip.w;
    if !ndc.x.is_finite() || !ndc.y.is_finite() {
        return MarkerScreenPosition {
            visible: false,
            ..previous
        };
    }

    MarkerScreenPosition {
        x: (ndc.x + 1.0) * 0.5 * viewport.width,
        y: (1.0 - ndc.y) * 0.5 * viewport.height,
        // Depth outside [0,1] means nearer than the near plane or past the
        // far plane; either way the marker is out of visible range.
        visible: (0.0..=1.0).contains(&ndc.z),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DriveEvent;
    use crate::types::Side;

    fn milestones(n: usize) -> Vec<Milestone> {
        (0..n)
            .map(|i| Milestone {
                id: format!("m{i}"),
                year: format!("{}", 2015 + i),
                title: format!("Milestone {i}"),
                description: String::new(),
                images: Vec::new(),
                tags: Vec::new(),
                side: if i % 2 == 0 { Side::Left } else { Side::Right },
                sort_order: i as i32,
            })
            .collect()
    }

    fn setup(n: usize) -> (MarkerProjector, DriveStore, TrackCurve, TrackLayout) {
        let curve = TrackCurve::default_circuit();
        let layout = TrackLayout::new(n);
        let projector = MarkerProjector::new(
            &curve,
            &layout,
            &milestones(n),
            MarkerSettings::default(),
            &CameraSettings::default(),
        );
        (projector, DriveStore::new(n, 0.012), curve, layout)
    }

    fn camera_facing(curve: &TrackCurve, t: f32) -> CameraPose {
        let point = curve.point_at(t);
        let tangent = curve.tangent_at(t);
        let eye = point - tangent * 12.0 + Vec3::Y * 5.0;
        CameraPose {
            position: eye.to_array(),
            look_at: (point + Vec3::Y * 1.0).to_array(),
        }
    }

    #[test]
    fn marker_ahead_projects_on_screen() {
        let (mut projector, mut store, curve, layout) = setup(1);
        let t = layout.position(0).expect("one milestone");
        let camera = camera_facing(&curve, t);

        projector.update(&mut store, &camera, ViewportSize::default());

        let markers = store.marker_screen_positions();
        assert_eq!(markers.len(), 1);
        assert!(markers[0].visible);
        assert!(markers[0].x > 0.0 && markers[0].x < 1920.0);
        assert!(markers[0].y > 0.0 && markers[0].y < 1080.0);
    }

    #[test]
    fn marker_behind_camera_is_invisible() {
        let (mut projector, mut store, curve, layout) = setup(1);
        let t = layout.position(0).expect("one milestone");
        let point = curve.point_at(t);
        let tangent = curve.tangent_at(t);
        // Camera past the marker, looking further down the track.
        let eye = point + tangent * 12.0 + Vec3::Y * 5.0;
        let camera = CameraPose {
            position: eye.to_array(),
            look_at: (point + tangent * 30.0).to_array(),
        };

        projector.update(&mut store, &camera, ViewportSize::default());
        assert!(!store.marker_screen_positions()[0].visible);
    }

    #[test]
    fn projection_is_throttled_to_stride() {
        let (mut projector, mut store, curve, layout) = setup(2);
        let camera = camera_facing(&curve, layout.position(0).expect("milestone"));

        // First call projects; the next two are skipped by the stride of 3.
        projector.update(&mut store, &camera, ViewportSize::default());
        let publishes_after_first = count_publishes(&mut store);
        assert_eq!(publishes_after_first, 1);

        let moved = CameraPose {
            position: [camera.position[0] + 50.0, camera.position[1], camera.position[2]],
            look_at: camera.look_at,
        };
        projector.update(&mut store, &moved, ViewportSize::default());
        projector.update(&mut store, &moved, ViewportSize::default());
        assert_eq!(count_publishes(&mut store), 0);

        // Third call after the first projection runs again.
        projector.update(&mut store, &moved, ViewportSize::default());
        assert_eq!(count_publishes(&mut store), 1);
    }

    #[test]
    fn unchanged_camera_publishes_once() {
        let (mut projector, mut store, curve, layout) = setup(2);
        let camera = camera_facing(&curve, layout.position(0).expect("milestone"));

        for _ in 0..9 {
            projector.update(&mut store, &camera, ViewportSize::default());
        }
        assert_eq!(count_publishes(&mut store), 1);
    }

    #[test]
    fn zero_milestones_publish_nothing() {
        let (mut projector, mut store, curve, _) = setup(0);
        let camera = camera_facing(&curve, 0.5);
        projector.update(&mut store, &camera, ViewportSize::default());
        assert_eq!(count_publishes(&mut store), 0);
    }

    #[test]
    fn degenerate_viewport_is_a_no_op() {
        let (mut projector, mut store, curve, layout) = setup(1);
        let camera = camera_facing(&curve, layout.position(0).expect("milestone"));
        projector.update(
            &mut store,
            &camera,
            ViewportSize {
                width: 0.0,
                height: 0.0,
            },
        );
        assert_eq!(count_publishes(&mut store), 0);
    }

    fn count_publishes(store: &mut DriveStore) -> usize {
        store
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, DriveEvent::MarkersProjected))
            .count()
    }
}
