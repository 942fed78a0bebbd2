//! Integrable boundary cells created on facets.
//!
//! The shape set is closed, so cells are a tagged enum dispatched by
//! `match`. Point, line, triangle and quadrilateral cells carry fixed-size
//! corner buffers; arbitrary cells carry an externally supplied
//! quadrature rule whose points are physical and whose weights already
//! include the area scaling.

use xcut_kernel_fem::metric::{line_metric, surface_metric};
use xcut_kernel_fem::shape::surface_shape;
use xcut_kernel_fem::{CellType, IntegrationRule, ParentElement};
use xcut_kernel_math::{triangle_area, CutTolerance, Point2, Point3, Vec3};

use crate::{CutError, FacetId, PointId, Result};

slotmap::new_key_type! {
    /// Unique identifier for a boundary cell in the cut mesh.
    pub struct BoundaryCellId;
}

/// Cubature degree of line cells.
pub const LINE2_DEGREE: usize = 4;
/// Cubature degree of triangle and quadrilateral cells.
pub const SURFACE_DEGREE: usize = 20;

/// Image of one local coordinate under a boundary-cell mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMapping {
    /// Mapped point.
    pub x: Point3,
    /// Unit normal (zero for point cells).
    pub normal: Vec3,
    /// Differential measure (area or length element).
    pub drs: f64,
}

/// Corner data of a fixed-size cell.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedCell<const N: usize> {
    /// Owning facet.
    pub facet: FacetId,
    /// Corner points.
    pub points: [PointId; N],
    /// Current corner coordinates.
    pub x: [Point3; N],
    /// Reference corner coordinates.
    pub x_ref: [Point3; N],
}

impl<const N: usize> FixedCell<N> {
    pub(crate) fn new(
        shape: CellType,
        facet: FacetId,
        points: &[PointId],
        x: &[Point3],
        x_ref: &[Point3],
    ) -> Result<Self> {
        let wrong = || CutError::WrongCornerCount {
            shape,
            expected: N,
            found: points.len(),
        };
        Ok(Self {
            facet,
            points: points.try_into().map_err(|_| wrong())?,
            x: x.try_into().map_err(|_| wrong())?,
            x_ref: x_ref.try_into().map_err(|_| wrong())?,
        })
    }
}

/// A cell integrated with a caller-supplied rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitraryCell {
    /// Owning facet.
    pub facet: FacetId,
    /// Corner points.
    pub points: Vec<PointId>,
    /// Current corner coordinates.
    pub x: Vec<Point3>,
    /// Reference corner coordinates.
    pub x_ref: Vec<Point3>,
    /// Quadrature rule with physical points.
    pub rule: IntegrationRule,
    /// Cell normal.
    pub normal: Vec3,
    /// Declared cubature degree (0 when unknown).
    pub degree: usize,
}

/// One integrable fragment of a facet.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryCell {
    /// Placeholder point cell with zero measure.
    Point1(FixedCell<1>),
    /// Two-node line.
    Line2(FixedCell<2>),
    /// Three-node triangle.
    Tri3(FixedCell<3>),
    /// Four-node quadrilateral.
    Quad4(FixedCell<4>),
    /// Polygon with an explicit quadrature rule.
    Arbitrary(ArbitraryCell),
}

impl BoundaryCell {
    /// Owning facet.
    pub fn facet(&self) -> FacetId {
        match self {
            BoundaryCell::Point1(c) => c.facet,
            BoundaryCell::Line2(c) => c.facet,
            BoundaryCell::Tri3(c) => c.facet,
            BoundaryCell::Quad4(c) => c.facet,
            BoundaryCell::Arbitrary(c) => c.facet,
        }
    }

    /// Finite-element shape, `None` for arbitrary cells.
    pub fn cell_type(&self) -> Option<CellType> {
        match self {
            BoundaryCell::Point1(_) => Some(CellType::Point1),
            BoundaryCell::Line2(_) => Some(CellType::Line2),
            BoundaryCell::Tri3(_) => Some(CellType::Tri3),
            BoundaryCell::Quad4(_) => Some(CellType::Quad4),
            BoundaryCell::Arbitrary(_) => None,
        }
    }

    /// Corner points.
    pub fn points(&self) -> &[PointId] {
        match self {
            BoundaryCell::Point1(c) => &c.points,
            BoundaryCell::Line2(c) => &c.points,
            BoundaryCell::Tri3(c) => &c.points,
            BoundaryCell::Quad4(c) => &c.points,
            BoundaryCell::Arbitrary(c) => &c.points,
        }
    }

    /// Current corner coordinates.
    pub fn coordinates(&self) -> &[Point3] {
        match self {
            BoundaryCell::Point1(c) => &c.x,
            BoundaryCell::Line2(c) => &c.x,
            BoundaryCell::Tri3(c) => &c.x,
            BoundaryCell::Quad4(c) => &c.x,
            BoundaryCell::Arbitrary(c) => &c.x,
        }
    }

    /// Reference corner coordinates.
    pub fn reference_coordinates(&self) -> &[Point3] {
        match self {
            BoundaryCell::Point1(c) => &c.x_ref,
            BoundaryCell::Line2(c) => &c.x_ref,
            BoundaryCell::Tri3(c) => &c.x_ref,
            BoundaryCell::Quad4(c) => &c.x_ref,
            BoundaryCell::Arbitrary(c) => &c.x_ref,
        }
    }

    fn corners(&self, reference: bool) -> &[Point3] {
        if reference {
            self.reference_coordinates()
        } else {
            self.coordinates()
        }
    }

    /// Polynomial degree the default rule integrates exactly.
    pub fn cubature_degree(&self) -> usize {
        match self {
            BoundaryCell::Point1(_) => 0,
            BoundaryCell::Line2(_) => LINE2_DEGREE,
            BoundaryCell::Tri3(_) | BoundaryCell::Quad4(_) => SURFACE_DEGREE,
            BoundaryCell::Arbitrary(c) => c.degree,
        }
    }

    /// Measure of the cell.
    ///
    /// Lines return their length. Triangles use the robust triangle-area
    /// kernel. Quadrilaterals integrate the metric determinant with a 2x2
    /// Gauss rule, skipping points where it is NaN. Point and arbitrary
    /// cells return zero.
    pub fn area(&self) -> f64 {
        match self {
            BoundaryCell::Point1(_) | BoundaryCell::Arbitrary(_) => 0.0,
            BoundaryCell::Line2(c) => (c.x[1] - c.x[0]).norm(),
            BoundaryCell::Tri3(c) => triangle_area(&c.x[0], &c.x[1], &c.x[2]).area,
            BoundaryCell::Quad4(c) => quad4_area(&c.x),
        }
    }

    /// Unit normal at local coordinate `eta`.
    pub fn normal(&self, eta: &Point3) -> Result<Vec3> {
        Ok(self.transform(eta, false)?.normal)
    }

    /// Cell-constant normal, evaluated at the reference centroid.
    pub fn normal_vector(&self) -> Result<Vec3> {
        match self {
            BoundaryCell::Arbitrary(c) => Ok(c.normal),
            _ => self.normal(&self.reference_center()),
        }
    }

    fn reference_center(&self) -> Point3 {
        let c = self
            .cell_type()
            .map(CellType::reference_center)
            .unwrap_or([0.0; 3]);
        Point3::new(c[0], c[1], c[2])
    }

    /// Physical image of the reference centroid.
    pub fn element_center(&self) -> Point3 {
        match self {
            BoundaryCell::Point1(c) => c.x[0],
            BoundaryCell::Line2(c) => nalgebra::center(&c.x[0], &c.x[1]),
            BoundaryCell::Tri3(c) => Point3::from((c.x[0].coords + c.x[1].coords + c.x[2].coords) / 3.0),
            BoundaryCell::Quad4(c) => average(&c.x),
            BoundaryCell::Arbitrary(c) => average(&c.x),
        }
    }

    /// Map local coordinate `eta` to a point, normal and measure.
    ///
    /// `reference` selects the reference configuration. Triangles take the
    /// measure from the robust triangle area (`drs = 2 * area`) instead of
    /// the metric tensor; quadrilaterals keep the metric tensor, so their
    /// `drs` can be NaN on collapsed cells. For arbitrary cells `eta` is a
    /// physical rule point and is returned unchanged with `drs = 1`.
    pub fn transform(&self, eta: &Point3, reference: bool) -> Result<CellMapping> {
        match self {
            BoundaryCell::Arbitrary(c) => Ok(CellMapping {
                x: *eta,
                normal: c.normal,
                drs: 1.0,
            }),
            _ => map_corners(self.corners(reference), eta),
        }
    }

    /// Map local coordinate `eta` into the local coordinates of the parent
    /// element.
    ///
    /// The cell corners are pulled back into the parent's reference space
    /// (through its quadratic shadow when `shadow` is set and one exists)
    /// and the cell mapping is evaluated there. The returned normal and
    /// measure are those of the pulled-back cell.
    pub fn transform_local_coords(
        &self,
        parent: &ParentElement,
        eta: &Point3,
        shadow: bool,
    ) -> Result<CellMapping> {
        let elem = parent.mapping_element(shadow);
        match self {
            BoundaryCell::Arbitrary(c) => Ok(CellMapping {
                x: elem.local_coordinates(eta)?,
                normal: c.normal,
                drs: 1.0,
            }),
            _ => {
                let local = self
                    .coordinates()
                    .iter()
                    .map(|x| elem.local_coordinates(x))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                map_corners(&local, eta)
            }
        }
    }

    /// Whether the cell is large enough to integrate.
    pub fn is_valid(&self, tol: &CutTolerance) -> bool {
        match self {
            BoundaryCell::Point1(_) => true,
            BoundaryCell::Line2(_) => self.area() > tol.min_line_length,
            BoundaryCell::Tri3(c) => {
                self.area() > tol.min_cell_area && min_corner_sine(&c.x) > tol.collinearity
            }
            BoundaryCell::Quad4(_) => self.area() > tol.min_cell_area,
            BoundaryCell::Arbitrary(c) => c.rule.weight_sum() > tol.min_cell_area,
        }
    }

    /// Rule integrating polynomials of `degree` exactly on the cell.
    ///
    /// Arbitrary cells always return their stored rule.
    pub fn gauss_rule(&self, degree: usize) -> IntegrationRule {
        match self {
            BoundaryCell::Point1(_) => IntegrationRule::point(),
            BoundaryCell::Line2(_) => IntegrationRule::line(degree),
            BoundaryCell::Tri3(_) => IntegrationRule::tri(degree),
            BoundaryCell::Quad4(_) => IntegrationRule::quad(degree),
            BoundaryCell::Arbitrary(c) => c.rule.clone(),
        }
    }

    /// Rule for the cell's own cubature degree.
    pub fn default_gauss_rule(&self) -> IntegrationRule {
        self.gauss_rule(self.cubature_degree())
    }

    /// Shift the current corner coordinates along one axis.
    pub fn assign_offset(&mut self, axis: usize, offset: f64) -> Result<()> {
        if axis >= 3 {
            return Err(CutError::InvalidInput(format!("offset axis {axis} out of range")));
        }
        let corners: &mut [Point3] = match self {
            BoundaryCell::Point1(c) => &mut c.x,
            BoundaryCell::Line2(c) => &mut c.x,
            BoundaryCell::Tri3(c) => &mut c.x,
            BoundaryCell::Quad4(c) => &mut c.x,
            BoundaryCell::Arbitrary(c) => &mut c.x,
        };
        for p in corners {
            p[axis] += offset;
        }
        Ok(())
    }
}

fn average(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

/// Shape-function mapping of a point, line, triangle or quad given by its
/// corner coordinates.
fn map_corners(xyz: &[Point3], eta: &Point3) -> Result<CellMapping> {
    let interpolate = |values: &[f64]| {
        let sum = xyz
            .iter()
            .zip(values)
            .fold(Vec3::zeros(), |acc, (p, n)| acc + p.coords * *n);
        Point3::from(sum)
    };
    match xyz.len() {
        1 => Ok(CellMapping {
            x: xyz[0],
            normal: Vec3::zeros(),
            drs: 0.0,
        }),
        2 => {
            let shape = surface_shape(CellType::Line2, &Point2::new(eta.x, 0.0))?;
            let metric = line_metric(xyz, &shape.derivs);
            Ok(CellMapping {
                x: interpolate(&shape.values),
                normal: metric.normal,
                drs: metric.drs,
            })
        }
        3 => {
            let shape = surface_shape(CellType::Tri3, &Point2::new(eta.x, eta.y))?;
            let tri = triangle_area(&xyz[0], &xyz[1], &xyz[2]);
            Ok(CellMapping {
                x: interpolate(&shape.values),
                normal: tri.normal.map(|n| n.into_inner()).unwrap_or_else(Vec3::zeros),
                drs: 2.0 * tri.area,
            })
        }
        4 => {
            let shape = surface_shape(CellType::Quad4, &Point2::new(eta.x, eta.y))?;
            let metric = surface_metric(xyz, &shape.derivs);
            Ok(CellMapping {
                x: interpolate(&shape.values),
                normal: metric.normal,
                drs: metric.drs,
            })
        }
        n => Err(CutError::InvalidInput(format!("no shape mapping for {n} corners"))),
    }
}

/// Area of a bilinear quadrilateral by 2x2 Gauss quadrature of the metric
/// determinant.
fn quad4_area(xyz: &[Point3; 4]) -> f64 {
    let mut area = 0.0;
    for (eta, w) in IntegrationRule::quad(3).iter() {
        let Ok(shape) = surface_shape(CellType::Quad4, &Point2::new(eta.x, eta.y)) else {
            continue;
        };
        let drs = surface_metric(xyz, &shape.derivs).drs;
        if drs.is_nan() {
            log::warn!("NaN metric determinant in quad4 cell at eta = ({}, {}), skipped", eta.x, eta.y);
            continue;
        }
        area += w * drs;
    }
    area
}

/// Smallest sine of the three corner angles of a triangle.
fn min_corner_sine(xyz: &[Point3; 3]) -> f64 {
    (0..3)
        .map(|i| {
            let a = xyz[(i + 1) % 3] - xyz[i];
            let b = xyz[(i + 2) % 3] - xyz[i];
            let scale = a.norm() * b.norm();
            if scale > 0.0 {
                a.cross(&b).norm() / scale
            } else {
                0.0
            }
        })
        .fold(f64::INFINITY, f64::min)
}
