//! Gauss quadrature rules.
//!
//! Rules are generated on demand for any polynomial degree instead of being
//! read from tables: lines and quadrilaterals use (tensor-product)
//! Gauss-Legendre points, triangles use the collapsed-coordinate (Duffy)
//! product rule.

use xcut_kernel_math::Point3;

use crate::{CellType, FemError, Result};

const NEWTON_MAX_ITER: usize = 100;

/// Gauss-Legendre points and weights on `[-1, 1]`.
///
/// `n` points integrate polynomials up to degree `2n - 1` exactly. The nodes
/// are returned in ascending order.
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    let m = n.div_ceil(2);

    for i in 0..m {
        // Tricomi's initial guess for the i-th root, counted from +1.
        let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..NEWTON_MAX_ITER {
            let (p, dp) = legendre(n, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() < 1e-16 {
                break;
            }
        }
        let (_, dp) = legendre(n, x);
        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        nodes[i] = -x;
        nodes[n - 1 - i] = x;
        weights[i] = w;
        weights[n - 1 - i] = w;
    }

    (nodes, weights)
}

/// Legendre polynomial `P_n(x)` and its derivative.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    if n == 0 {
        return (1.0, 0.0);
    }
    for k in 2..=n {
        let k = k as f64;
        let p2 = ((2.0 * k - 1.0) * x * p1 - (k - 1.0) * p0) / k;
        p0 = p1;
        p1 = p2;
    }
    let n = n as f64;
    let dp = n * (x * p1 - p0) / (x * x - 1.0);
    (p1, dp)
}

/// Number of 1D points needed to integrate degree `degree` exactly.
fn points_for_degree(degree: usize) -> usize {
    (degree + 2) / 2
}

/// A quadrature rule: points with weights.
///
/// For reference-cell rules the points live in the reference coordinates of
/// the cell (unused trailing components are zero). Externally supplied rules
/// for arbitrary boundary cells hold physical points with weights that
/// already include the area scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationRule {
    points: Vec<Point3>,
    weights: Vec<f64>,
}

impl IntegrationRule {
    /// Build a rule from matching point and weight lists.
    pub fn new(points: Vec<Point3>, weights: Vec<f64>) -> Result<Self> {
        if points.len() != weights.len() {
            return Err(FemError::RuleLengthMismatch {
                points: points.len(),
                weights: weights.len(),
            });
        }
        Ok(Self { points, weights })
    }

    /// Rule with no points.
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Single-point placeholder rule carrying zero weight.
    pub fn point() -> Self {
        Self {
            points: vec![Point3::origin()],
            weights: vec![0.0],
        }
    }

    /// Gauss-Legendre rule on the reference line `[-1, 1]`.
    pub fn line(degree: usize) -> Self {
        let (x, w) = gauss_legendre(points_for_degree(degree));
        Self {
            points: x.iter().map(|&xi| Point3::new(xi, 0.0, 0.0)).collect(),
            weights: w,
        }
    }

    /// Tensor-product Gauss rule on the reference square `[-1, 1]^2`.
    pub fn quad(degree: usize) -> Self {
        let (x, w) = gauss_legendre(points_for_degree(degree));
        let mut points = Vec::with_capacity(x.len() * x.len());
        let mut weights = Vec::with_capacity(x.len() * x.len());
        for (j, &s) in x.iter().enumerate() {
            for (i, &r) in x.iter().enumerate() {
                points.push(Point3::new(r, s, 0.0));
                weights.push(w[i] * w[j]);
            }
        }
        Self { points, weights }
    }

    /// Collapsed-coordinate rule on the unit triangle.
    ///
    /// Maps the square `(u, v)` onto the triangle through
    /// `s = (1 + v) / 2`, `r = (1 + u)(1 - s) / 2`; the Jacobian `(1 - s) / 4`
    /// raises the polynomial degree in `v` by one, which the point count
    /// accounts for.
    ///
    /// Exact for `degree` but not minimal: the tensor product uses
    /// `((degree + 3) / 2)^2` points, 121 at degree 20, where symmetric
    /// tabulated rules need far fewer.
    pub fn tri(degree: usize) -> Self {
        let n = points_for_degree(degree + 1);
        let (x, w) = gauss_legendre(n);
        let mut points = Vec::with_capacity(n * n);
        let mut weights = Vec::with_capacity(n * n);
        for (j, &v) in x.iter().enumerate() {
            let s = 0.5 * (1.0 + v);
            for (i, &u) in x.iter().enumerate() {
                let r = 0.5 * (1.0 + u) * (1.0 - s);
                points.push(Point3::new(r, s, 0.0));
                weights.push(w[i] * w[j] * 0.25 * (1.0 - s));
            }
        }
        Self { points, weights }
    }

    /// Rule of the given cell shape integrating `degree` exactly.
    ///
    /// Gauss-Legendre rules on lines and quadrilaterals are minimal for
    /// their shape; the triangle rule is the collapsed one from
    /// [`IntegrationRule::tri`].
    pub fn for_cell(cell: CellType, degree: usize) -> Result<Self> {
        match cell {
            CellType::Point1 => Ok(Self::point()),
            CellType::Line2 => Ok(Self::line(degree)),
            CellType::Tri3 => Ok(Self::tri(degree)),
            CellType::Quad4 => Ok(Self::quad(degree)),
            other => Err(FemError::UnsupportedShape(other)),
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the rule has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Quadrature points.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Quadrature weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Iterate over `(point, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Point3, f64)> + '_ {
        self.points.iter().zip(self.weights.iter().copied())
    }

    /// Sum of all weights (the measure of the integration domain).
    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().sum()
    }
}
