#![warn(missing_docs)]

//! Math types for the xcut kernel.
//!
//! Thin wrappers around nalgebra providing the point and vector types used
//! by cut-cell construction, the tolerance configuration value shared by
//! every stage, and a handful of robust geometric kernels (triangle area,
//! polygon normal, plane through reference points).

use nalgebra::{Unit, Vector2, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in a 2D parameter space (reference coordinates of a surface cell).
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// Geometric tolerances for cut-cell construction.
///
/// This is an immutable configuration value. It is passed explicitly into the
/// cut mesh and never stored in global state, so tests can run the same
/// geometry at different tolerances side by side.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CutTolerance {
    /// Two points closer than this (absolute distance) are the same point.
    pub point_merge: f64,
    /// Maximum out-of-plane distance of a facet point, relative to the facet diameter.
    pub planarity: f64,
    /// Relative threshold below which three points count as collinear.
    pub collinearity: f64,
    /// Boundary cells with an area at or below this value are rejected.
    pub min_cell_area: f64,
    /// Line cells with a length at or below this value are rejected.
    pub min_line_length: f64,
}

impl CutTolerance {
    /// Default cut tolerances.
    pub const DEFAULT: Self = Self {
        point_merge: 1e-12,
        planarity: 1e-8,
        collinearity: 1e-8,
        min_cell_area: 1e-15,
        min_line_length: 1e-14,
    };

    /// Check if two points are coincident within the merge tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.point_merge
    }

    /// Same tolerances with a different minimum boundary-cell area.
    pub fn with_min_cell_area(self, min_cell_area: f64) -> Self {
        Self {
            min_cell_area,
            ..self
        }
    }

    /// Same tolerances with a different minimum line length.
    pub fn with_min_line_length(self, min_line_length: f64) -> Self {
        Self {
            min_line_length,
            ..self
        }
    }
}

impl Default for CutTolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Area and orientation of a triangle computed by [`triangle_area`].
#[derive(Debug, Clone, Copy)]
pub struct TriangleArea {
    /// Non-negative triangle area.
    pub area: f64,
    /// Unit normal following the corner order, `None` for a collapsed triangle.
    pub normal: Option<Dir3>,
}

/// Robust triangle area.
///
/// The cross product is taken between the two shorter edges, which meet at
/// the corner opposite the longest edge. Cancellation then stays bounded
/// for needle- and cap-shaped triangles where the textbook `|e1 × e2| / 2`
/// from an arbitrary corner loses most of its digits.
pub fn triangle_area(p0: &Point3, p1: &Point3, p2: &Point3) -> TriangleArea {
    let corners = [p0, p1, p2];
    // Edge i is opposite corner i.
    let lengths = [
        (p2 - p1).norm_squared(),
        (p0 - p2).norm_squared(),
        (p1 - p0).norm_squared(),
    ];
    let apex = (0..3)
        .max_by(|&i, &j| lengths[i].total_cmp(&lengths[j]))
        .unwrap_or(0);

    let o = corners[apex];
    let u = corners[(apex + 1) % 3] - o;
    let v = corners[(apex + 2) % 3] - o;
    let cross = u.cross(&v);

    TriangleArea {
        area: 0.5 * cross.norm(),
        normal: Unit::try_new(cross, f64::MIN_POSITIVE),
    }
}

/// Newell normal of a closed polygon.
///
/// The magnitude equals twice the enclosed area for planar polygons and the
/// direction follows the right-hand rule on the point order. Works for
/// non-convex and slightly non-planar loops.
pub fn newell_normal(points: &[Point3]) -> Vec3 {
    let n = points.len();
    let mut normal = Vec3::zeros();
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Area of a closed (planar) polygon, via the Newell normal.
pub fn polygon_area(points: &[Point3]) -> f64 {
    0.5 * newell_normal(points).norm()
}

/// Largest distance between any two points of a set.
pub fn diameter(points: &[Point3]) -> f64 {
    let mut d: f64 = 0.0;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            d = d.max((b - a).norm());
        }
    }
    d
}

/// Plane defined by an origin and a unit normal.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// A point on the plane.
    pub origin: Point3,
    /// Unit normal of the plane.
    pub normal: Dir3,
}

impl Plane {
    /// Plane through three well-separated, non-collinear reference points of `points`.
    ///
    /// The first point is the origin, the second is the point farthest from
    /// it, and the third maximizes the spanned triangle. Returns `None` when
    /// all points are collinear within `tol.collinearity`.
    pub fn from_points(points: &[Point3], tol: &CutTolerance) -> Option<Self> {
        let origin = *points.first()?;
        let (far, far_dist) = points
            .iter()
            .map(|p| (p, (p - origin).norm()))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        if far_dist <= 0.0 {
            return None;
        }
        let e1 = far - origin;
        let (cross, cross_norm) = points
            .iter()
            .map(|p| {
                let c = e1.cross(&(p - origin));
                let n = c.norm();
                (c, n)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        if cross_norm <= tol.collinearity * far_dist * far_dist {
            return None;
        }
        Some(Self {
            origin,
            normal: Unit::new_normalize(cross),
        })
    }

    /// Signed distance of `p` from the plane (positive on the normal side).
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(self.normal.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_triangle_area_right_triangle() {
        let t = triangle_area(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
            &Point3::new(0.0, 3.0, 0.0),
        );
        assert_relative_eq!(t.area, 3.0, epsilon = 1e-14);
        let n = t.normal.unwrap();
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_triangle_area_follows_winding() {
        let t = triangle_area(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(0.0, 3.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
        );
        assert_relative_eq!(t.normal.unwrap().z, -1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_triangle_area_needle() {
        // Base 1, height 1e-9: exact area is 5e-10.
        let t = triangle_area(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.5, 1e-9, 0.0),
        );
        assert_relative_eq!(t.area, 5e-10, max_relative = 1e-6);
        assert!(t.normal.is_some());
    }

    #[test]
    fn test_triangle_area_collapsed() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let t = triangle_area(&p, &p, &p);
        assert_eq!(t.area, 0.0);
        assert!(t.normal.is_none());
    }

    #[test]
    fn test_newell_normal_square() {
        let square = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let n = newell_normal(&square);
        assert_relative_eq!(n.z, 2.0, epsilon = 1e-14);
        assert_relative_eq!(polygon_area(&square), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_plane_from_points_skips_collinear_start() {
        let pts = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.5, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let plane = Plane::from_points(&pts, &CutTolerance::DEFAULT).unwrap();
        assert_relative_eq!(plane.normal.z.abs(), 1.0, epsilon = 1e-14);
        assert_relative_eq!(
            plane.signed_distance(&Point3::new(0.3, 0.2, 3.0)).abs(),
            2.0,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_plane_from_collinear_points() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
        ];
        assert!(Plane::from_points(&pts, &CutTolerance::DEFAULT).is_none());
    }

    #[test]
    fn test_tolerance_points_equal() {
        let tol = CutTolerance::DEFAULT;
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(1.0 + 1e-14, 2.0, 3.0);
        assert!(tol.points_equal(&a, &b));
        let c = Point3::new(1.0 + 1e-6, 2.0, 3.0);
        assert!(!tol.points_equal(&a, &c));
    }

    #[test]
    fn test_tolerance_builders() {
        let tol = CutTolerance::DEFAULT
            .with_min_cell_area(1e-6)
            .with_min_line_length(1e-3);
        assert_eq!(tol.min_cell_area, 1e-6);
        assert_eq!(tol.min_line_length, 1e-3);
        assert_eq!(tol.point_merge, CutTolerance::DEFAULT.point_merge);
    }
}
