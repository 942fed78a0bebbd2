//! Metric of a boundary (line or surface) element embedded in 3D.

use xcut_kernel_math::{Point3, Vec2, Vec3};

/// Differential measure and unit normal of a boundary element at one point.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryMetric {
    /// `sqrt(det G)` with `G` the metric tensor of the parametrization.
    pub drs: f64,
    /// Unit normal. For surfaces `a1 × a2 / |a1 × a2|`, for lines the in-plane
    /// normal `(t_y, -t_x, 0)` of the tangent `t`.
    pub normal: Vec3,
}

/// Compute the metric tensor of a surface element and derive `drs` and the normal.
///
/// `derivs` are the reference derivatives of the shape functions at the
/// evaluation point. A slightly negative determinant from round-off on a
/// collapsed cell yields a NaN `drs`; callers decide how to treat it.
pub fn surface_metric(xyz: &[Point3], derivs: &[Vec2]) -> BoundaryMetric {
    let mut a1 = Vec3::zeros();
    let mut a2 = Vec3::zeros();
    for (x, d) in xyz.iter().zip(derivs) {
        a1 += x.coords * d.x;
        a2 += x.coords * d.y;
    }

    let g11 = a1.dot(&a1);
    let g12 = a1.dot(&a2);
    let g22 = a2.dot(&a2);
    let drs = (g11 * g22 - g12 * g12).sqrt();

    let normal = a1.cross(&a2) / drs;
    BoundaryMetric { drs, normal }
}

/// Metric of a line element (first derivative component only).
pub fn line_metric(xyz: &[Point3], derivs: &[Vec2]) -> BoundaryMetric {
    let mut t = Vec3::zeros();
    for (x, d) in xyz.iter().zip(derivs) {
        t += x.coords * d.x;
    }
    let drs = t.norm();
    let in_plane = Vec3::new(t.y, -t.x, 0.0);
    let len = in_plane.norm();
    let normal = if len > 0.0 { in_plane / len } else { Vec3::zeros() };
    BoundaryMetric { drs, normal }
}
