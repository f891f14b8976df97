// Track geometry: a closed Catmull-Rom curve through fixed control points,
// plus the derived assignment of milestones to curve parameters.
// Pure and stateless; safe to sample every frame from any consumer.

use glam::Vec3;

/// Curve parameter of the start/finish landmark. The garage sits just past
/// the line, so the finish animation rolls the car from the wrap point (0)
/// up to this value.
pub const START_FINISH_PARAM: f32 = 0.03;

const DEFAULT_TENSION: f32 = 0.5;

/// Control points of the default circuit, counter-clockwise on the ground
/// plane with the start/finish straight near the origin.
const DEFAULT_CONTROL_POINTS: [[f32; 3]; 12] = [
    [0.0, 0.0, 0.0],
    [14.0, 0.0, -6.0],
    [26.0, 0.0, -4.0],
    [34.0, 0.0, 6.0],
    [30.0, 0.0, 18.0],
    [18.0, 0.0, 26.0],
    [4.0, 0.0, 30.0],
    [-12.0, 0.0, 28.0],
    [-24.0, 0.0, 18.0],
    [-28.0, 0.0, 6.0],
    [-20.0, 0.0, -4.0],
    [-10.0, 0.0, -4.0],
];

/// Closed Catmull-Rom spline. `t` and `t + 1` sample the same point; any
/// real-valued parameter is wrapped, so out-of-range progress never panics.
#[derive(Debug, Clone)]
pub struct TrackCurve {
    points: Vec<Vec3>,
    tension: f32,
}

impl TrackCurve {
    /// Build a closed curve through the given control points.
    /// Needs at least 3 points to form a loop.
    pub fn closed(points: Vec<Vec3>, tension: f32) -> Option<TrackCurve> {
        if points.len() < 3 {
            return None;
        }
        Some(TrackCurve { points, tension })
    }

    /// The default circuit used by the journey scene.
    pub fn default_circuit() -> TrackCurve {
        TrackCurve {
            points: DEFAULT_CONTROL_POINTS.iter().map(|p| Vec3::from(*p)).collect(),
            tension: DEFAULT_TENSION,
        }
    }

    /// Sample the curve at parameter `t` (wrapped into [0,1)).
    pub fn point_at(&self, t: f32) -> Vec3 {
        let n = self.points.len();
        let t = wrap_param(t);
        let scaled = t * n as f32;
        let seg = (scaled.floor() as usize).min(n - 1);
        let local = scaled - seg as f32;

        let p0 = self.points[(seg + n - 1) % n];
        let p1 = self.points[seg];
        let p2 = self.points[(seg + 1) % n];
        let p3 = self.points[(seg + 2) % n];

        catmull_rom(p0, p1, p2, p3, local, self.tension)
    }

    /// Unit forward direction at parameter `t`, via central difference.
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let eps = 0.0005;
        let a = self.point_at(t - eps);
        let b = self.point_at(t + eps);
        (b - a).normalize_or_zero()
    }
}

/// Wrap any real parameter into [0, 1).
pub fn wrap_param(t: f32) -> f32 {
    let wrapped = t.rem_euclid(1.0);
    if wrapped.is_finite() {
        wrapped
    } else {
        0.0
    }
}

fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32, tension: f32) -> Vec3 {
    // Cubic Hermite form.
    let v0 = (p2 - p0) * tension;
    let v1 = (p3 - p1) * tension;

    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    p1 * h00 + v0 * h10 + p2 * h01 + v1 * h11
}

/// Circular distance between two parameters on the closed curve.
pub fn wrapped_distance(a: f32, b: f32) -> f32 {
    let d = (wrap_param(a) - wrap_param(b)).abs();
    d.min(1.0 - d)
}

/// Mapping from milestone index to curve parameter. Markers are spread
/// evenly through the open interval (0,1); 0 and 1 stay reserved for the
/// start/finish line and the wrap.
#[derive(Debug, Clone)]
pub struct TrackLayout {
    positions: Vec<f32>,
}

impl TrackLayout {
    pub fn new(milestone_count: usize) -> TrackLayout {
        let n = milestone_count as f32;
        let positions = (0..milestone_count)
            .map(|i| (i as f32 + 1.0) / (n + 1.0))
            .collect();
        TrackLayout { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Curve parameter assigned to milestone `i`.
    pub fn position(&self, i: usize) -> Option<f32> {
        self.positions.get(i).copied()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Milestone circularly closest to `progress`. `None` when there are no
    /// milestones.
    pub fn nearest_marker(&self, progress: f32) -> Option<usize> {
        self.positions
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                wrapped_distance(progress, **a)
                    .partial_cmp(&wrapped_distance(progress, **b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn curve_is_closed() {
        let curve = TrackCurve::default_circuit();
        let start = curve.point_at(0.0);
        let end = curve.point_at(1.0);
        assert!((start - end).length() < 1e-4);
    }

    #[test]
    fn tangent_is_unit_length() {
        let curve = TrackCurve::default_circuit();
        for i in 0..20 {
            let t = i as f32 / 20.0;
            let tan = curve.tangent_at(t);
            assert!((tan.length() - 1.0).abs() < 1e-3, "tangent at {} not unit", t);
        }
    }

    #[test]
    fn out_of_range_parameter_wraps() {
        let curve = TrackCurve::default_circuit();
        let a = curve.point_at(0.25);
        let b = curve.point_at(1.25);
        let c = curve.point_at(-0.75);
        assert!((a - b).length() < 1e-4);
        assert!((a - c).length() < 1e-4);
    }

    #[test]
    fn too_few_points_rejected() {
        assert!(TrackCurve::closed(vec![Vec3::ZERO, Vec3::X], 0.5).is_none());
    }

    #[test]
    fn layout_three_milestones() {
        let layout = TrackLayout::new(3);
        assert_eq!(layout.positions(), &[0.25, 0.5, 0.75]);
    }

    #[test]
    fn empty_layout_has_no_nearest() {
        let layout = TrackLayout::new(0);
        assert!(layout.is_empty());
        assert_eq!(layout.nearest_marker(0.5), None);
    }

    #[test]
    fn nearest_marker_wraps_around() {
        // Marker at 0.9 with progress 0.05: distance is 0.15, not 0.85.
        assert!((wrapped_distance(0.05, 0.9) - 0.15).abs() < 1e-6);

        let layout = TrackLayout::new(9); // positions 0.1 .. 0.9
        assert_eq!(layout.nearest_marker(0.97), Some(8));
        assert_eq!(layout.nearest_marker(0.02), Some(0));
    }

    proptest! {
        /// Positions are strictly increasing and stay inside the open (0,1)
        /// interval for every milestone count.
        #[test]
        fn layout_positions_strictly_increasing_and_open(n in 1usize..64) {
            let layout = TrackLayout::new(n);
            let positions = layout.positions();
            prop_assert_eq!(positions.len(), n);
            for (i, &p) in positions.iter().enumerate() {
                prop_assert!(p > 0.0 && p < 1.0, "position {} = {} escapes (0,1)", i, p);
                if i > 0 {
                    prop_assert!(p > positions[i - 1]);
                }
            }
        }

        /// Wrapped distance is symmetric and bounded by half the loop.
        #[test]
        fn wrapped_distance_symmetric(a in 0.0f32..1.0, b in 0.0f32..1.0) {
            let d1 = wrapped_distance(a, b);
            let d2 = wrapped_distance(b, a);
            prop_assert!((d1 - d2).abs() < 1e-6);
            prop_assert!(d1 <= 0.5 + 1e-6);
        }
    }
}
