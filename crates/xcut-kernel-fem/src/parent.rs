//! Background (parent) element geometry.
//!
//! A cut element needs to map points between physical space and its own
//! reference coordinates, so that boundary-cell quadrature points can be
//! composed with element shape functions. Linear elements may carry a
//! quadratic "shadow" element whose geometry is used instead.

use nalgebra::Matrix3;
use xcut_kernel_math::{Point3, Vec3};

use crate::shape::volume_shape;
use crate::{CellType, FemError, Result};

const NEWTON_MAX_ITER: usize = 50;
const NEWTON_REL_TOL: f64 = 1e-13;

/// Geometry of a 3D background element.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentElement {
    shape: CellType,
    nodes: Vec<Point3>,
    shadow: Option<Box<ParentElement>>,
}

impl ParentElement {
    /// Create a parent element from its shape and node coordinates.
    pub fn new(shape: CellType, nodes: Vec<Point3>) -> Result<Self> {
        if shape.dim() != 3 {
            return Err(FemError::UnsupportedShape(shape));
        }
        if nodes.len() != shape.num_nodes() {
            return Err(FemError::WrongNodeCount {
                shape,
                expected: shape.num_nodes(),
                found: nodes.len(),
            });
        }
        Ok(Self {
            shape,
            nodes,
            shadow: None,
        })
    }

    /// Attach a quadratic shadow element.
    ///
    /// The shadow must be quadratic (`tet10` or `hex20`).
    pub fn with_shadow(mut self, shadow: ParentElement) -> Result<Self> {
        if !shadow.shape.is_quadratic() {
            return Err(FemError::UnsupportedShape(shadow.shape));
        }
        self.shadow = Some(Box::new(shadow));
        Ok(self)
    }

    /// Element shape.
    pub fn shape(&self) -> CellType {
        self.shape
    }

    /// Physical node coordinates.
    pub fn nodes(&self) -> &[Point3] {
        &self.nodes
    }

    /// The quadratic shadow element, if any.
    pub fn shadow(&self) -> Option<&ParentElement> {
        self.shadow.as_deref()
    }

    /// Element used for the mapping: the shadow when requested and present.
    pub fn mapping_element(&self, shadow: bool) -> &ParentElement {
        match (&self.shadow, shadow) {
            (Some(s), true) => s,
            _ => self,
        }
    }

    /// Physical coordinates of the reference point `xi`.
    pub fn global_coordinates(&self, xi: &Point3) -> Result<Point3> {
        let shape = volume_shape(self.shape, xi)?;
        let mut x = Vec3::zeros();
        for (node, n) in self.nodes.iter().zip(&shape.values) {
            x += node.coords * *n;
        }
        Ok(Point3::from(x))
    }

    /// Jacobian `∂x/∂ξ` at the reference point `xi` (columns are `∂x/∂ξ_j`).
    pub fn jacobian(&self, xi: &Point3) -> Result<Matrix3<f64>> {
        let shape = volume_shape(self.shape, xi)?;
        let mut jac = Matrix3::zeros();
        for (node, d) in self.nodes.iter().zip(&shape.derivs) {
            jac += node.coords * d.transpose();
        }
        Ok(jac)
    }

    /// Reference coordinates of the physical point `x` (Newton iteration).
    pub fn local_coordinates(&self, x: &Point3) -> Result<Point3> {
        let c = self.shape.reference_center();
        let mut xi = Point3::new(c[0], c[1], c[2]);
        let scale = self.size().max(f64::MIN_POSITIVE);

        let mut residual = f64::INFINITY;
        for _ in 0..NEWTON_MAX_ITER {
            let r = self.global_coordinates(&xi)? - x;
            residual = r.norm();
            if residual <= NEWTON_REL_TOL * scale {
                return Ok(xi);
            }
            let jac = self.jacobian(&xi)?;
            let inv = jac.try_inverse().ok_or(FemError::SingularJacobian {
                xi: [xi.x, xi.y, xi.z],
            })?;
            xi -= inv * r;
        }
        Err(FemError::NotConverged {
            iterations: NEWTON_MAX_ITER,
            residual,
        })
    }

    /// Largest node distance, used to scale the Newton tolerance.
    fn size(&self) -> f64 {
        xcut_kernel_math::diameter(&self.nodes)
    }
}
