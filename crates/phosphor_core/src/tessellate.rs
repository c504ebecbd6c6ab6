//! Polyline tessellation
//!
//! Turns a pending polyline into a textured triangle list. Every segment is a
//! ribbon `2 * thickness` wide whose cross-section sweeps the falloff texture
//! from `u = 0` (left edge) to `u = 1` (right edge). Segments meeting at a
//! moderate angle are trimmed so their inner edges meet at the miter point,
//! and the notch left on the outer side is filled with a triangle fan.
//! Sharper turns and the ends of open paths get flat, extended caps.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_8, TAU};

use crate::config::{CLOSED_PATH_EPSILON, HALF_TEXTURE_SIZE, INITIAL_BUFFER_CAPACITY, TEXTURE_SIZE};
use crate::mesh::{MeshBuffer, Vertex};

/// Slack added to the 90 degree connection threshold
const JOINT_ANGLE_EPSILON: f64 = f32::EPSILON as f64;

const TEX: f32 = TEXTURE_SIZE as f32;
const HALF_TEX: f32 = HALF_TEXTURE_SIZE as f32;

/// Stroke parameters applied to one polyline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pen {
    /// Half-width of the ribbon, in framebuffer units
    pub thickness: f64,
    /// RGBA colour written into every vertex
    pub color: [f32; 4],
}

/// What a call to [`tessellate`] emitted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TessellationSummary {
    pub segments: usize,
    pub connected_joints: usize,
    pub caps: usize,
    pub vertices: usize,
}

/// A connected joint between two consecutive segments
#[derive(Clone, Copy, Debug, PartialEq)]
struct Joint {
    /// Direction of the incoming segment
    prev_angle: f64,
    /// Distance both segments are shortened by at the joint
    trim: f64,
    /// Ribbon half-width at the joint (reduced when the trim was clamped)
    thickness: f64,
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    start: [f64; 2],
    end: [f64; 2],
    angle: f64,
    sin_a: f64,
    cos_a: f64,
    len: f64,
}

impl Segment {
    fn new(start: [f64; 2], end: [f64; 2]) -> Self {
        let dx = end[0] - start[0];
        let dy = end[1] - start[1];
        let angle = dy.atan2(dx);
        Self {
            start,
            end,
            angle,
            sin_a: angle.sin(),
            cos_a: angle.cos(),
            len: (dx * dx + dy * dy).sqrt(),
        }
    }

    /// Perpendicular offset of `p` towards the left edge, then along the line
    fn offset(&self, p: [f64; 2], side: f64, along: f64) -> [f64; 2] {
        [
            p[0] + side * self.sin_a + along * self.cos_a,
            p[1] - side * self.cos_a + along * self.sin_a,
        ]
    }
}

/// Normalize an angle into `[0, 2π)`
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// The smaller of the two angular differences between two directions
pub fn turn_angle(from: f64, to: f64) -> f64 {
    normalize_angle(to - from).min(normalize_angle(from - to))
}

/// Trim distance and joint half-width for a connected joint
///
/// The raw trim `thickness * tan(turn / 2)` is clamped to half the shorter
/// adjacent segment. When it is clamped the joint half-width shrinks by the
/// same ratio so the inner edges still meet at the miter point.
pub fn joint_trim(thickness: f64, turn: f64, prev_len: f64, next_len: f64) -> (f64, f64) {
    let raw = thickness * (turn / 2.0).tan();
    let limit = 0.5 * prev_len.min(next_len);
    if raw > limit && raw > 0.0 {
        (limit, thickness * limit / raw)
    } else {
        (raw, thickness)
    }
}

/// Number of fan triangles covering `span` radians (about one per 22.5°)
pub fn fan_steps(span: f64) -> usize {
    ((span / FRAC_PI_8).round() as usize).max(1)
}

/// True when the polyline ends where it starts (and has room to turn)
pub fn is_closed(points: &[[f64; 2]]) -> bool {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 3 => {
            (first[0] - last[0]).abs() < CLOSED_PATH_EPSILON
                && (first[1] - last[1]).abs() < CLOSED_PATH_EPSILON
        }
        _ => false,
    }
}

fn connect(prev: &Segment, next: &Segment, thickness: f64) -> Option<Joint> {
    if prev.len <= 0.0 || next.len <= 0.0 {
        return None;
    }
    let turn = turn_angle(prev.angle, next.angle);
    if turn > FRAC_PI_2 + JOINT_ANGLE_EPSILON {
        return None;
    }
    let (trim, thickness) = joint_trim(thickness, turn, prev.len, next.len);
    Some(Joint {
        prev_angle: prev.angle,
        trim,
        thickness,
    })
}

/// Tessellate one polyline into `mesh`
///
/// Fewer than two points emit nothing.
pub fn tessellate(points: &[[f64; 2]], pen: &Pen, mesh: &mut MeshBuffer) -> TessellationSummary {
    let mut summary = TessellationSummary::default();
    if points.len() < 2 {
        return summary;
    }

    let before = mesh.len();
    let closed = is_closed(points);
    let segments: Vec<Segment> = points
        .windows(2)
        .map(|pair| Segment::new(pair[0], pair[1]))
        .collect();
    let count = segments.len();

    // start_joints[i] joins segment i-1 (or the last one, when closed) to i
    let start_joints: Vec<Option<Joint>> = (0..count)
        .map(|i| {
            if i > 0 {
                connect(&segments[i - 1], &segments[i], pen.thickness)
            } else if closed {
                connect(&segments[count - 1], &segments[0], pen.thickness)
            } else {
                None
            }
        })
        .collect();

    let mut emitter = Emitter {
        mesh,
        color: pen.color,
    };

    for (i, segment) in segments.iter().enumerate() {
        let start_joint = start_joints[i];
        let end_joint = if i + 1 < count {
            start_joints[i + 1]
        } else if closed {
            start_joints[0]
        } else {
            None
        };

        let (start_trim, start_t) = start_joint.map_or((0.0, pen.thickness), |j| (j.trim, j.thickness));
        let (end_trim, end_t) = end_joint.map_or((0.0, pen.thickness), |j| (j.trim, j.thickness));

        let l0 = segment.offset(segment.start, start_t, start_trim);
        let r0 = segment.offset(segment.start, -start_t, start_trim);
        let l1 = segment.offset(segment.end, end_t, -end_trim);
        let r1 = segment.offset(segment.end, -end_t, -end_trim);

        if let Some(joint) = start_joint {
            // Pivot on the inner corner; the rim sweeps the outer notch
            let turn = normalize_angle(segment.angle - joint.prev_angle);
            let counter = normalize_angle(joint.prev_angle - segment.angle);
            let pivot = if turn < counter { r0 } else { l0 };
            emitter.fan(pivot, joint.prev_angle, segment.angle, 2.0 * joint.thickness);
            summary.connected_joints += 1;
        }

        emitter.quad(r0, r1, l1, l0);

        if start_joint.is_none() {
            let lt0 = segment.offset(l0, 0.0, -pen.thickness);
            let rt0 = segment.offset(r0, 0.0, -pen.thickness);
            emitter.start_cap(l0, r0, lt0, rt0);
            summary.caps += 1;
        }

        if end_joint.is_none() {
            let lt1 = segment.offset(l1, 0.0, pen.thickness);
            let rt1 = segment.offset(r1, 0.0, pen.thickness);
            emitter.end_cap(l1, r1, lt1, rt1);
            summary.caps += 1;
        }
    }

    summary.segments = count;
    summary.vertices = emitter.mesh.len() - before;
    tracing::trace!(
        segments = summary.segments,
        joints = summary.connected_joints,
        caps = summary.caps,
        vertices = summary.vertices,
        closed,
        "tessellated polyline"
    );
    summary
}

struct Emitter<'a> {
    mesh: &'a mut MeshBuffer,
    color: [f32; 4],
}

impl Emitter<'_> {
    fn point(&mut self, p: [f64; 2], u: f32, v: f32) {
        self.mesh
            .push(Vertex::textured(p[0] as f32, p[1] as f32, u, v, self.color));
    }

    fn quad(&mut self, r0: [f64; 2], r1: [f64; 2], l1: [f64; 2], l0: [f64; 2]) {
        self.point(r0, TEX, HALF_TEX);
        self.point(r1, TEX, HALF_TEX);
        self.point(l1, 0.0, HALF_TEX);
        self.point(l0, 0.0, HALF_TEX);
        self.point(r0, TEX, HALF_TEX);
        self.point(l1, 0.0, HALF_TEX);
    }

    fn start_cap(&mut self, l0: [f64; 2], r0: [f64; 2], lt0: [f64; 2], rt0: [f64; 2]) {
        self.point(l0, 0.0, HALF_TEX);
        self.point(lt0, 0.0, 0.0);
        self.point(r0, TEX, HALF_TEX);
        self.point(r0, TEX, HALF_TEX);
        self.point(lt0, 0.0, 0.0);
        self.point(rt0, TEX, 0.0);
    }

    fn end_cap(&mut self, l1: [f64; 2], r1: [f64; 2], lt1: [f64; 2], rt1: [f64; 2]) {
        self.point(lt1, 0.0, 0.0);
        self.point(l1, 0.0, HALF_TEX);
        self.point(r1, TEX, HALF_TEX);
        self.point(lt1, 0.0, 0.0);
        self.point(r1, TEX, HALF_TEX);
        self.point(rt1, TEX, 0.0);
    }

    /// Triangle fan around `center` sweeping the shorter arc between the
    /// two directions, rim at distance `radius`
    fn fan(&mut self, center: [f64; 2], prev_angle: f64, angle: f64, radius: f64) {
        let forward = normalize_angle(angle - prev_angle);
        let backward = normalize_angle(prev_angle - angle);

        let (radius, rim_u, pivot_u, from, span) = if backward < forward {
            (-radius, TEX, 0.0, angle, backward)
        } else {
            (radius, 0.0, TEX, prev_angle, forward)
        };

        let steps = fan_steps(span);
        let rim = |theta: f64| [center[0] + radius * theta.sin(), center[1] - radius * theta.cos()];

        for i in 1..=steps {
            let a0 = from + (i - 1) as f64 * span / steps as f64;
            let a1 = from + i as f64 * span / steps as f64;
            self.point(rim(a0), rim_u, HALF_TEX);
            self.point(center, pivot_u, HALF_TEX);
            self.point(rim(a1), rim_u, HALF_TEX);
        }
    }
}

/// Collects the points of the polyline being drawn
///
/// A polyline is open from [`begin`](Self::begin) until [`end`](Self::end).
#[derive(Clone, Debug)]
pub struct Tessellator {
    pending: Vec<[f64; 2]>,
}

impl Tessellator {
    pub fn new() -> Self {
        Self {
            pending: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Start a polyline at (x, y)
    ///
    /// Aborts the process when a previous polyline was begun but never
    /// ended; nested polylines mean the caller's draw state is corrupt.
    pub fn begin(&mut self, x: f64, y: f64) {
        if self.is_open() {
            crate::diagnostic!(
                "assertion failure: begin_draw with {} pending points (missing end_draw)",
                self.pending.len()
            );
            std::process::abort();
        }
        self.pending.push([x, y]);
    }

    /// Extend the polyline to (x, y)
    pub fn line_to(&mut self, x: f64, y: f64) {
        self.pending.push([x, y]);
    }

    /// True between `begin` and `end`
    pub fn is_open(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Pending points, in framebuffer coordinates
    pub fn pending(&self) -> &[[f64; 2]] {
        &self.pending
    }

    /// Tessellate the pending polyline into `mesh` and close it
    pub fn end(&mut self, pen: &Pen, mesh: &mut MeshBuffer) -> TessellationSummary {
        let summary = tessellate(&self.pending, pen, mesh);
        self.pending.clear();
        summary
    }
}

impl Default for Tessellator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_4, PI};

    const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    fn pen(thickness: f64) -> Pen {
        Pen {
            thickness,
            color: WHITE,
        }
    }

    fn run(points: &[[f64; 2]], thickness: f64) -> (TessellationSummary, MeshBuffer) {
        let mut mesh = MeshBuffer::new();
        let summary = tessellate(points, &pen(thickness), &mut mesh);
        (summary, mesh)
    }

    #[test]
    fn test_short_polylines_emit_nothing() {
        let mut mesh = MeshBuffer::new();
        mesh.push(Vertex::default());

        assert_eq!(tessellate(&[], &pen(8.0), &mut mesh), TessellationSummary::default());
        assert_eq!(tessellate(&[[1.0, 1.0]], &pen(8.0), &mut mesh).vertices, 0);
        assert_eq!(mesh.len(), 1);
    }

    #[test]
    fn test_single_segment() {
        let (summary, mesh) = run(&[[0.0, 0.0], [100.0, 0.0]], 8.0);
        assert_eq!(summary.segments, 1);
        assert_eq!(summary.caps, 2);
        assert_eq!(summary.connected_joints, 0);
        // quad + two caps
        assert_eq!(summary.vertices, 18);
        assert_eq!(mesh.len(), 18);
        assert!(mesh
            .as_slice()
            .iter()
            .all(|v| v.position.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn test_ribbon_width_is_twice_thickness() {
        let (_, mesh) = run(&[[0.0, 0.0], [100.0, 0.0]], 8.0);
        let quad = &mesh.as_slice()[0..6];
        // r0, r1, l1, l0
        let right = quad[0];
        let left = quad[3];
        assert_eq!(right.x(), 0.0);
        assert_eq!(left.x(), 0.0);
        assert!(((right.y() - left.y()).abs() - 16.0).abs() < 1e-4);
        assert_eq!(right.uv, [1.0, 0.5]);
        assert_eq!(left.uv, [0.0, 0.5]);
    }

    #[test]
    fn test_diagonal_width() {
        let (_, mesh) = run(&[[10.0, 10.0], [60.0, 60.0]], 4.0);
        let quad = &mesh.as_slice()[0..6];
        let dx = quad[0].x() - quad[3].x();
        let dy = quad[0].y() - quad[3].y();
        assert!(((dx * dx + dy * dy).sqrt() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_caps_extend_by_thickness() {
        let (_, mesh) = run(&[[0.0, 0.0], [100.0, 0.0]], 8.0);
        let start_cap = &mesh.as_slice()[6..12];
        let end_cap = &mesh.as_slice()[12..18];

        // l0, lt0, r0, r0, lt0, rt0
        assert!((start_cap[1].x() + 8.0).abs() < 1e-4);
        assert!((start_cap[5].x() + 8.0).abs() < 1e-4);
        assert_eq!(start_cap[1].uv, [0.0, 1.0]);
        assert_eq!(start_cap[5].uv, [1.0, 1.0]);

        // lt1, l1, r1, lt1, r1, rt1
        assert!((end_cap[0].x() - 108.0).abs() < 1e-4);
        assert!((end_cap[5].x() - 108.0).abs() < 1e-4);
    }

    #[test]
    fn test_dot_is_capped_square() {
        let (summary, mesh) = run(&[[50.0, 50.0], [50.0, 50.0]], 2.0);
        assert_eq!(summary.caps, 2);
        let xs: Vec<f32> = mesh.as_slice().iter().map(|v| v.x()).collect();
        let ys: Vec<f32> = mesh.as_slice().iter().map(|v| v.y()).collect();
        let span = |vals: &[f32]| {
            vals.iter().cloned().fold(f32::MIN, f32::max) - vals.iter().cloned().fold(f32::MAX, f32::min)
        };
        assert!((span(&xs) - 4.0).abs() < 1e-4);
        assert!((span(&ys) - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_open_polyline_caps_only_ends() {
        let points = [[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [200.0, 100.0]];
        let (summary, _) = run(&points, 4.0);
        assert_eq!(summary.segments, 3);
        assert_eq!(summary.connected_joints, 2);
        assert_eq!(summary.caps, 2);
    }

    #[test]
    fn test_closed_polyline_has_no_caps() {
        let square = [
            [0.0, 0.0],
            [100.0, 0.0],
            [100.0, 100.0],
            [0.0, 100.0],
            [0.0, 0.0],
        ];
        assert!(is_closed(&[[0.0, 0.0], [10.0, 0.0], [0.05, -0.05]]));
        let (summary, _) = run(&square, 4.0);
        assert_eq!(summary.segments, 4);
        assert_eq!(summary.connected_joints, 4);
        assert_eq!(summary.caps, 0);
    }

    #[test]
    fn test_nearly_closed_is_open() {
        let points = [[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0], [0.0, 0.2]];
        assert!(!is_closed(&points));
        let (summary, _) = run(&points, 4.0);
        assert_eq!(summary.caps, 2);
    }

    #[test]
    fn test_sharp_turn_is_disconnected() {
        // 135 degree turn exceeds the connection threshold
        let points = [[0.0, 0.0], [100.0, 0.0], [0.0, 100.0]];
        let (summary, _) = run(&points, 4.0);
        assert_eq!(summary.connected_joints, 0);
        assert_eq!(summary.caps, 4);

        // Full reversal
        let (summary, _) = run(&[[0.0, 0.0], [100.0, 0.0], [0.0, 0.0]], 4.0);
        assert_eq!(summary.connected_joints, 0);
    }

    #[test]
    fn test_right_angle_connects() {
        let (summary, mesh) = run(&[[0.0, 0.0], [100.0, 0.0], [100.0, 100.0]], 4.0);
        assert_eq!(summary.connected_joints, 1);
        // 2 segments * 6 + 2 caps * 6 + fan of 4 steps * 3
        assert_eq!(fan_steps(FRAC_PI_2), 4);
        assert_eq!(mesh.len(), 12 + 12 + 12);
    }

    #[test]
    fn test_inner_corners_meet_at_miter() {
        let (_, mesh) = run(&[[0.0, 0.0], [100.0, 0.0], [100.0, 100.0]], 4.0);
        let v = mesh.as_slice();
        // First segment: quad r0,r1,l1,l0 then start cap
        let first_r1 = v[1];
        // Second segment begins with its fan (4 steps), then its quad
        let second_r0 = v[12 + 12];
        assert!((first_r1.x() - second_r0.x()).abs() < 1e-3);
        assert!((first_r1.y() - second_r0.y()).abs() < 1e-3);
        // Inner miter of a 90 degree turn sits at (100 - t, t)
        assert!((second_r0.x() - 96.0).abs() < 1e-3);
        assert!((second_r0.y() - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_fan_rim_reaches_outer_edges() {
        let (_, mesh) = run(&[[0.0, 0.0], [100.0, 0.0], [100.0, 100.0]], 4.0);
        let v = mesh.as_slice();
        let fan = &v[12..24];
        let pivot = fan[1];
        for tri in fan.chunks(3) {
            for rim in [tri[0], tri[2]] {
                let d = ((rim.x() - pivot.x()).powi(2) + (rim.y() - pivot.y()).powi(2)).sqrt();
                assert!((d - 8.0).abs() < 1e-3);
            }
            assert_eq!(tri[1].uv, [1.0, 0.5]);
            assert_eq!(tri[0].uv, [0.0, 0.5]);
        }
        // First rim point coincides with the first segment's outer end
        let first_l1 = v[2];
        assert!((fan[0].x() - first_l1.x()).abs() < 1e-3);
        assert!((fan[0].y() - first_l1.y()).abs() < 1e-3);
    }

    #[test]
    fn test_joint_trim_unclamped() {
        let (trim, t) = joint_trim(8.0, FRAC_PI_2, 100.0, 100.0);
        assert!((trim - 8.0).abs() < 1e-9);
        assert_eq!(t, 8.0);

        let (trim, _) = joint_trim(8.0, 0.0, 100.0, 100.0);
        assert_eq!(trim, 0.0);
    }

    #[test]
    fn test_joint_trim_clamps_to_half_shorter_segment() {
        let (trim, t) = joint_trim(8.0, FRAC_PI_2, 6.0, 100.0);
        assert!((trim - 3.0).abs() < 1e-9);
        // Half-width shrinks with the trim ratio: 8 * 3 / 8
        assert!((t - 3.0).abs() < 1e-9);
        assert!(trim <= 3.0);
    }

    #[test]
    fn test_trimmed_segments_never_invert() {
        // Short middle segment between two right-angle turns
        let points = [[0.0, 0.0], [50.0, 0.0], [50.0, 3.0], [100.0, 3.0]];
        let (summary, mesh) = run(&points, 8.0);
        assert_eq!(summary.connected_joints, 2);

        // Middle quad: after first quad (6) + cap (6) + fan (12)
        let v = mesh.as_slice();
        let middle = &v[24..30];
        // r0 -> r1 must still advance along +y
        assert!(middle[1].y() - middle[0].y() >= -1e-4);
        assert!(middle[2].y() - middle[3].y() >= -1e-4);
    }

    #[test]
    fn test_angle_helpers() {
        assert!((normalize_angle(-FRAC_PI_2) - 1.5 * PI).abs() < 1e-12);
        assert_eq!(normalize_angle(TAU), 0.0);
        assert!((turn_angle(0.0, 3.0 * FRAC_PI_4) - 3.0 * FRAC_PI_4).abs() < 1e-12);
        assert!((turn_angle(0.1, TAU - 0.1) - 0.2).abs() < 1e-12);
        assert_eq!(fan_steps(0.0), 1);
        assert_eq!(fan_steps(FRAC_PI_4), 2);
    }

    #[test]
    fn test_tessellator_lifecycle() {
        let mut tess = Tessellator::new();
        let mut mesh = MeshBuffer::new();
        assert!(!tess.is_open());

        tess.begin(0.0, 0.0);
        tess.line_to(10.0, 0.0);
        assert!(tess.is_open());
        assert_eq!(tess.pending().len(), 2);

        let summary = tess.end(&pen(1.0), &mut mesh);
        assert_eq!(summary.segments, 1);
        assert!(!tess.is_open());

        tess.begin(5.0, 5.0);
        assert_eq!(tess.end(&pen(1.0), &mut mesh).vertices, 0);
        assert!(!tess.is_open());
    }

    const NESTED_BEGIN_CHILD: &str = "PHOSPHOR_NESTED_BEGIN_CHILD";

    #[test]
    fn test_nested_begin_aborts() {
        if std::env::var_os(NESTED_BEGIN_CHILD).is_some() {
            let mut tess = Tessellator::new();
            tess.begin(0.0, 0.0);
            tess.begin(1.0, 1.0);
            return;
        }

        // Re-run just this test in a child process, which must die
        let output = std::process::Command::new(std::env::current_exe().unwrap())
            .args([
                "--exact",
                "tessellate::tests::test_nested_begin_aborts",
                "--nocapture",
                "--test-threads=1",
            ])
            .env(NESTED_BEGIN_CHILD, "1")
            .output()
            .unwrap();

        assert!(!output.status.success());
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            assert_eq!(output.status.signal(), Some(6), "expected SIGABRT");
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("[vector_display] assertion failure: begin_draw with 1 pending points"),
            "missing diagnostic: {}",
            stderr
        );
    }
}
