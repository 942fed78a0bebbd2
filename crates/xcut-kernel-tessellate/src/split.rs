//! Coarse decomposition of convex loops into quadrilaterals and triangles.

use xcut_kernel_math::{CutTolerance, Point3};

use crate::polygon::{is_convex_2d, PolygonFrame};
use crate::triangulate::best_fan_apex;

/// Split a convex loop into quadrilaterals plus at most one triangle.
///
/// Sub-polygons share the fan apex chosen by [`best_fan_apex`] and follow
/// the loop winding. Returns `None` when the loop is not convex in its own
/// projection frame.
pub fn split_convex(points: &[Point3], tol: &CutTolerance) -> Option<Vec<Vec<usize>>> {
    let frame = PolygonFrame::new(points).ok()?;
    if !is_convex_2d(&frame.project_all(points), tol) {
        return None;
    }

    let n = points.len();
    let apex = best_fan_apex(points);
    let at = |i: usize| (apex + i) % n;

    let mut cells = Vec::with_capacity(n / 2);
    let mut i = 1;
    while i + 2 < n {
        cells.push(vec![at(0), at(i), at(i + 1), at(i + 2)]);
        i += 2;
    }
    if i + 1 < n {
        cells.push(vec![at(0), at(i), at(i + 1)]);
    }
    Some(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use xcut_kernel_math::polygon_area;

    fn regular(n: usize) -> Vec<Point3> {
        (0..n)
            .map(|k| {
                let a = std::f64::consts::TAU * k as f64 / n as f64;
                Point3::new(a.cos(), a.sin(), 0.0)
            })
            .collect()
    }

    #[test]
    fn test_split_counts() {
        let tol = CutTolerance::default();
        let shape = |n: usize| -> Vec<usize> {
            split_convex(&regular(n), &tol)
                .unwrap()
                .iter()
                .map(Vec::len)
                .collect()
        };
        assert_eq!(shape(3), vec![3]);
        assert_eq!(shape(4), vec![4]);
        assert_eq!(shape(5), vec![4, 3]);
        assert_eq!(shape(6), vec![4, 4]);
        assert_eq!(shape(7), vec![4, 4, 3]);
    }

    #[test]
    fn test_split_area_additivity() {
        let tol = CutTolerance::default();
        let pts = regular(7);
        let total: f64 = split_convex(&pts, &tol)
            .unwrap()
            .iter()
            .map(|cell| {
                let corners: Vec<Point3> = cell.iter().map(|&i| pts[i]).collect();
                polygon_area(&corners)
            })
            .sum();
        assert_relative_eq!(total, polygon_area(&pts), max_relative = 1e-12);
    }

    #[test]
    fn test_split_rejects_non_convex() {
        let tol = CutTolerance::default();
        let l_shape = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        assert!(split_convex(&l_shape, &tol).is_none());
    }
}
