//! Polygon triangulation: fan from a well-conditioned apex for convex loops,
//! ear clipping with hole bridging for everything else.

use xcut_kernel_math::{triangle_area, CutTolerance, Point2, Point3};

use crate::polygon::{
    check_simple, is_convex_2d, orient, segments_intersect, signed_area_2d, PolygonFrame,
};
use crate::{Result, TessellateError};

/// Triangulate a closed loop with optional holes.
///
/// Returned triangles index into the concatenation of `outer` followed by
/// every hole in order. Triangles follow the winding of `outer`; holes may be
/// given in either winding. The result is deterministic for a given input
/// order, introduces no new points, and contains no zero-area triangles.
///
/// Non-planar loops are triangulated in the projection onto their Newell
/// plane.
pub fn triangulate(
    outer: &[Point3],
    holes: &[Vec<Point3>],
    tol: &CutTolerance,
) -> Result<Vec<[usize; 3]>> {
    let frame = PolygonFrame::new(outer)?;
    let outer_2d = frame.project_all(outer);

    let mut loops = vec![outer_2d];
    for hole in holes {
        if hole.len() < 3 {
            return Err(TessellateError::TooFewPoints(hole.len()));
        }
        loops.push(frame.project_all(hole));
    }
    check_simple(&loops)?;

    let all_3d: Vec<Point3> = outer.iter().chain(holes.iter().flatten()).copied().collect();

    let raw = if holes.is_empty() && is_convex_2d(&loops[0], tol) {
        fan(&all_3d[..outer.len()], best_fan_apex(outer))
    } else {
        let all_2d: Vec<Point2> = loops.iter().flatten().copied().collect();
        let poly = bridge_holes(&loops, &all_2d);
        ear_clip(&all_2d, &poly, tol)?
    };

    Ok(raw
        .into_iter()
        .filter(|t| !is_degenerate(&all_3d[t[0]], &all_3d[t[1]], &all_3d[t[2]], tol))
        .collect())
}

/// Index of the fan apex that gives the best-shaped fan.
///
/// Every corner is tried and the one maximising the smallest triangle
/// quality (`2 * area / longest_edge^2`) of its fan wins. Ties go to the
/// lowest index, so the choice is reproducible.
pub fn best_fan_apex(points: &[Point3]) -> usize {
    let n = points.len();
    if n <= 3 {
        return 0;
    }

    let mut best_idx = 0;
    let mut best_quality = f64::NEG_INFINITY;
    for apex in 0..n {
        let quality = fan(points, apex)
            .iter()
            .map(|t| triangle_quality(&points[t[0]], &points[t[1]], &points[t[2]]))
            .fold(f64::INFINITY, f64::min);
        if quality > best_quality {
            best_quality = quality;
            best_idx = apex;
        }
    }
    best_idx
}

/// Fan triangulation of a loop from corner `apex`.
pub fn fan(points: &[Point3], apex: usize) -> Vec<[usize; 3]> {
    let n = points.len();
    (1..n.saturating_sub(1))
        .map(|i| [apex, (apex + i) % n, (apex + i + 1) % n])
        .collect()
}

fn triangle_quality(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    let longest = (b - a)
        .norm_squared()
        .max((c - b).norm_squared())
        .max((a - c).norm_squared());
    if longest <= 0.0 {
        return 0.0;
    }
    2.0 * triangle_area(a, b, c).area / longest
}

fn is_degenerate(a: &Point3, b: &Point3, c: &Point3, tol: &CutTolerance) -> bool {
    triangle_quality(a, b, c) <= tol.collinearity
}

/// Merge holes into the outer loop through bridge edges.
///
/// Each hole is walked clockwise and connected to the closest visible
/// vertex of the polygon built so far. The resulting index loop visits
/// bridge endpoints twice.
fn bridge_holes(loops: &[Vec<Point2>], all_2d: &[Point2]) -> Vec<usize> {
    let mut poly: Vec<usize> = (0..loops[0].len()).collect();

    let mut start = loops[0].len();
    let mut hole_ranges = Vec::with_capacity(loops.len() - 1);
    for hole in &loops[1..] {
        hole_ranges.push(start..start + hole.len());
        start += hole.len();
    }

    for (h, range) in hole_ranges.iter().enumerate() {
        let mut hole: Vec<usize> = range.clone().collect();
        if signed_area_2d(&loops[h + 1]) > 0.0 {
            hole.reverse();
        }
        let m = hole.len();

        let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
        for (k, &hi) in hole.iter().enumerate() {
            for (j, &pi) in poly.iter().enumerate() {
                let dist = (all_2d[pi] - all_2d[hi]).norm_squared();
                candidates.push((dist, k, j));
            }
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        let pending = &hole_ranges[h + 1..];
        let chosen = candidates
            .iter()
            .find(|&&(_, k, j)| {
                bridge_is_visible(all_2d, &poly, &hole, pending, poly[j], hole[k])
            })
            .or_else(|| candidates.first());
        let Some(&(_, k, j)) = chosen else {
            continue;
        };

        let bridge_outer = poly[j];
        let bridge_inner = hole[k];
        let mut merged = Vec::with_capacity(poly.len() + m + 2);
        merged.extend_from_slice(&poly[..=j]);
        merged.extend((0..m).map(|i| hole[(k + i) % m]));
        merged.push(bridge_inner);
        merged.push(bridge_outer);
        merged.extend_from_slice(&poly[j + 1..]);
        poly = merged;
    }

    poly
}

/// Whether the segment `a → b` crosses no edge of the current polygon, the
/// hole being bridged, or any hole still waiting to be bridged.
fn bridge_is_visible(
    all_2d: &[Point2],
    poly: &[usize],
    hole: &[usize],
    pending: &[std::ops::Range<usize>],
    a: usize,
    b: usize,
) -> bool {
    let pa = &all_2d[a];
    let pb = &all_2d[b];
    let blocked = |i: usize, j: usize| {
        if i == a || i == b || j == a || j == b {
            return false;
        }
        segments_intersect(pa, pb, &all_2d[i], &all_2d[j])
    };
    let loop_blocks = |lp: &[usize]| {
        let n = lp.len();
        (0..n).any(|e| blocked(lp[e], lp[(e + 1) % n]))
    };
    if loop_blocks(poly) || loop_blocks(hole) {
        return false;
    }
    pending.iter().all(|r| {
        let lp: Vec<usize> = r.clone().collect();
        !loop_blocks(&lp)
    })
}

/// Ear clipping of a counter-clockwise index loop.
///
/// When no ear is left the first (near-)collinear corner is clipped as a
/// zero-area triangle. If there is none either, the loop cannot be
/// triangulated.
fn ear_clip(verts: &[Point2], indices: &[usize], tol: &CutTolerance) -> Result<Vec<[usize; 3]>> {
    let mut out = Vec::with_capacity(indices.len().saturating_sub(2));
    let mut remaining: Vec<usize> = indices.to_vec();

    while remaining.len() > 3 {
        let n = remaining.len();
        let corner = |i: usize| {
            let prev = remaining[(i + n - 1) % n];
            let next = remaining[(i + 1) % n];
            (prev, remaining[i], next)
        };

        let ear = (0..n).find(|&i| {
            let (p, c, q) = corner(i);
            let (a, b, cc) = (&verts[p], &verts[c], &verts[q]);
            if orient(a, b, cc) <= 0.0 {
                return false;
            }
            (0..n).all(|j| {
                let r = remaining[j];
                r == p || r == c || r == q || !point_in_triangle(&verts[r], a, b, cc)
            })
        });

        let clip = ear.or_else(|| {
            (0..n).find(|&i| {
                let (p, c, q) = corner(i);
                let (a, b, cc) = (&verts[p], &verts[c], &verts[q]);
                let scale = (b - a).norm() * (cc - b).norm();
                orient(a, b, cc).abs() <= tol.collinearity * scale
            })
        });

        let Some(i) = clip else {
            return Err(TessellateError::EarClippingFailed { remaining: n });
        };
        let (p, c, q) = corner(i);
        out.push([p, c, q]);
        remaining.remove(i);
    }

    if remaining.len() == 3 {
        out.push([remaining[0], remaining[1], remaining[2]]);
    }
    Ok(out)
}

/// Strict point-in-triangle test; points on the boundary are outside.
fn point_in_triangle(p: &Point2, a: &Point2, b: &Point2, c: &Point2) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom == 0.0 {
        return false;
    }
    let u = (dot11 * dot02 - dot01 * dot12) / denom;
    let v = (dot00 * dot12 - dot01 * dot02) / denom;

    let eps = 1e-12;
    u > eps && v > eps && (u + v) < 1.0 - eps
}
