//! Polygon predicates: corner detection, planarity, convexity, simplicity.

use xcut_kernel_math::{newell_normal, CutTolerance, Dir3, Plane, Point2, Point3, Vec3};

use crate::{Result, TessellateError};

/// Orthonormal frame used to project a (near-)planar polygon to 2D.
///
/// The frame normal is the Newell normal of the outer loop, so the projected
/// outer loop is always counter-clockwise.
#[derive(Debug, Clone, Copy)]
pub struct PolygonFrame {
    origin: Point3,
    u: Vec3,
    v: Vec3,
    normal: Dir3,
}

impl PolygonFrame {
    /// Build the projection frame of a closed loop.
    pub fn new(points: &[Point3]) -> Result<Self> {
        if points.len() < 3 {
            return Err(TessellateError::TooFewPoints(points.len()));
        }
        let n = newell_normal(points);
        let normal = Dir3::try_new(n, f64::MIN_POSITIVE).ok_or(TessellateError::ZeroNormal)?;

        let origin = points[0];
        let far = points
            .iter()
            .max_by(|a, b| (*a - origin).norm_squared().total_cmp(&(*b - origin).norm_squared()))
            .ok_or(TessellateError::TooFewPoints(0))?;
        let d = far - origin;
        let in_plane = d - normal.as_ref() * d.dot(normal.as_ref());
        let len = in_plane.norm();
        if len <= 0.0 {
            return Err(TessellateError::ZeroNormal);
        }
        let u = in_plane / len;
        let v = normal.cross(&u);
        Ok(Self {
            origin,
            u,
            v,
            normal,
        })
    }

    /// Unit normal of the frame.
    pub fn normal(&self) -> Dir3 {
        self.normal
    }

    /// Project a 3D point into the frame.
    pub fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(&self.u), d.dot(&self.v))
    }

    /// Project a whole loop.
    pub fn project_all(&self, points: &[Point3]) -> Vec<Point2> {
        points.iter().map(|p| self.project(p)).collect()
    }
}

/// Signed area of a 2D polygon (positive when counter-clockwise).
pub fn signed_area_2d(pts: &[Point2]) -> f64 {
    let n = pts.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = &pts[i];
        let b = &pts[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    0.5 * area
}

/// Indices of the corner points of a closed loop.
///
/// A point whose two neighbouring edges are collinear within
/// `tol.collinearity` (relative sine of the turning angle) is an edge point,
/// not a corner. The decision for each point depends only on its two loop
/// neighbours, so the result does not change when the loop is rotated or
/// reversed.
pub fn corner_points(points: &[Point3], tol: &CutTolerance) -> Vec<usize> {
    let n = points.len();
    if n < 3 {
        return (0..n).collect();
    }
    (0..n)
        .filter(|&i| {
            let prev = &points[(i + n - 1) % n];
            let next = &points[(i + 1) % n];
            let a = points[i] - prev;
            let b = next - points[i];
            let scale = a.norm() * b.norm();
            scale > 0.0 && a.cross(&b).norm() > tol.collinearity * scale
        })
        .collect()
}

/// Whether all points lie within `tol.planarity` (relative to the loop
/// diameter) of the plane through three well-separated reference points.
///
/// A collinear loop has no plane and is reported as non-planar.
pub fn is_planar(points: &[Point3], tol: &CutTolerance) -> bool {
    let Some(plane) = Plane::from_points(points, tol) else {
        return false;
    };
    let limit = tol.planarity * xcut_kernel_math::diameter(points);
    points.iter().all(|p| plane.signed_distance(p).abs() <= limit)
}

/// Whether a loop is strictly convex in its own projection frame.
///
/// Every turn must be to the left (collinear turns within tolerance are
/// accepted) and the loop must wind exactly once.
pub fn is_convex(points: &[Point3], tol: &CutTolerance) -> bool {
    let Ok(frame) = PolygonFrame::new(points) else {
        return false;
    };
    is_convex_2d(&frame.project_all(points), tol)
}

/// Convexity of a loop already projected counter-clockwise.
pub(crate) fn is_convex_2d(pts: &[Point2], tol: &CutTolerance) -> bool {
    let n = pts.len();
    if n < 3 {
        return false;
    }
    let mut turning = 0.0;
    for i in 0..n {
        let a = pts[i] - pts[(i + n - 1) % n];
        let b = pts[(i + 1) % n] - pts[i];
        let cross = a.perp(&b);
        if cross < -tol.collinearity * a.norm() * b.norm() {
            return false;
        }
        turning += cross.atan2(a.dot(&b));
    }
    (turning - std::f64::consts::TAU).abs() < 1e-6
}

/// Check that a set of closed 2D loops has no crossing edges.
///
/// Edges are numbered consecutively over all loops. Adjacent edges of the
/// same loop are allowed to share their common point; any other contact is
/// reported as an intersection.
pub fn check_simple(loops: &[Vec<Point2>]) -> Result<()> {
    let mut edges: Vec<(Point2, Point2, usize, usize)> = Vec::new();
    for (l, lp) in loops.iter().enumerate() {
        let n = lp.len();
        for i in 0..n {
            edges.push((lp[i], lp[(i + 1) % n], l, i));
        }
    }

    for a in 0..edges.len() {
        for b in a + 1..edges.len() {
            let (p1, p2, la, ia) = edges[a];
            let (q1, q2, lb, ib) = edges[b];
            if la == lb {
                let n = loops[la].len();
                if ib == (ia + 1) % n || ia == (ib + 1) % n {
                    continue;
                }
            }
            if segments_intersect(&p1, &p2, &q1, &q2) {
                return Err(TessellateError::SelfIntersecting {
                    edge_a: a,
                    edge_b: b,
                });
            }
        }
    }
    Ok(())
}

/// 2D orientation of `c` relative to the directed line `a → b`.
pub(crate) fn orient(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    (b - a).perp(&(c - a))
}

/// Closed segment intersection test, touching included.
pub(crate) fn segments_intersect(p1: &Point2, p2: &Point2, q1: &Point2, q2: &Point2) -> bool {
    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

fn on_segment(a: &Point2, b: &Point2, p: &Point2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
