#![warn(missing_docs)]

//! Cut boundary representation and integration cells for XFEM-style
//! embedded-interface methods.
//!
//! Provides [`ElementCut`], built from the intersection data of one
//! background element ([`CutInput`]). It orients the facets of every
//! volume cell outward and covers the requested facets with integrable
//! boundary cells.
//!
//! # Example
//!
//! ```
//! use xcut_kernel::{CutInput, CutOptions, ElementCut, FacetInput, PointInput, SideInput, VolumeCellInput};
//! use xcut_kernel::xcut_kernel_topo::{Position, SideKind};
//!
//! // Reference tetrahedron, every face a marked element face.
//! let corners = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
//! let faces = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];
//! let input = CutInput {
//!     points: corners.iter().map(|&x| PointInput { x, ..Default::default() }).collect(),
//!     sides: faces
//!         .iter()
//!         .enumerate()
//!         .map(|(face, pts)| SideInput { kind: SideKind::ElementFace { face }, marked: true, points: pts.to_vec() })
//!         .collect(),
//!     facets: faces
//!         .iter()
//!         .enumerate()
//!         .map(|(side, pts)| FacetInput { side, points: pts.to_vec(), ..Default::default() })
//!         .collect(),
//!     volume_cells: vec![VolumeCellInput { position: Position::Inside, facets: vec![0, 1, 2, 3] }],
//!     element: None,
//! };
//! let cut = ElementCut::build(&input, &CutOptions::default()).unwrap();
//! let vc = cut.volume_cells()[0];
//! assert!((cut.volume(vc).unwrap() - 1.0 / 6.0).abs() < 1e-12);
//! ```

pub use xcut_kernel_fem;
pub use xcut_kernel_math;
pub use xcut_kernel_tessellate;
pub use xcut_kernel_topo;

#[cfg(feature = "gmsh")]
mod gmsh;
mod input;

pub use input::{
    CutInput, CutOptions, ElementInput, FacetDecomposition, FacetInput, PointInput, SideInput,
    VolumeCellInput,
};
pub use xcut_kernel_topo::{CutError, Result};

use xcut_kernel_fem::{IntegrationRule, ParentElement};
use xcut_kernel_math::{Point3, Vec3};
use xcut_kernel_topo::{
    BoundaryCell, BoundaryCellId, CellMapping, CutMesh, FacetId, PointId, VolumeCellId,
};

/// Cubature degree used by the volume, area and closure checks.
const CHECK_DEGREE: usize = 4;

/// Boundary representation of one cut background element.
#[derive(Debug)]
pub struct ElementCut {
    mesh: CutMesh,
    parent: Option<ParentElement>,
    facets: Vec<FacetId>,
    volume_cells: Vec<VolumeCellId>,
}

impl ElementCut {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Build the cut mesh, orient every volume cell and create its boundary
    /// cells.
    ///
    /// Boundary cells are created on facets of cutter sides and of marked
    /// element faces, and on every other facet when
    /// [`CutOptions::element_face_cells`] is set. Cell corners follow the
    /// outward orientation of the owning volume cell, so a facet shared by
    /// two volume cells gets one set of cells for each, with opposite
    /// normals.
    pub fn build(input: &CutInput, options: &CutOptions) -> Result<Self> {
        let mut mesh = CutMesh::new(options.tolerance);

        let points: Vec<PointId> = input
            .points
            .iter()
            .map(|p| {
                let x = Point3::from(p.x);
                let id = mesh.add_point_with_reference(x, p.x_ref.map_or(x, Point3::from));
                if let Some(position) = p.position {
                    mesh.set_point_position(id, position);
                }
                id
            })
            .collect();
        let point = |i: usize| {
            points
                .get(i)
                .copied()
                .ok_or_else(|| CutError::InvalidInput(format!("unknown point index {i}")))
        };

        let mut sides = Vec::with_capacity(input.sides.len());
        for side in &input.sides {
            let pts = side.points.iter().map(|&i| point(i)).collect::<Result<Vec<_>>>()?;
            sides.push(mesh.add_side(side.kind, side.marked, &pts));
        }

        let mut facets = Vec::with_capacity(input.facets.len());
        for facet in &input.facets {
            let side = *sides
                .get(facet.side)
                .ok_or_else(|| CutError::InvalidInput(format!("unknown side index {}", facet.side)))?;
            let pts = facet.points.iter().map(|&i| point(i)).collect::<Result<Vec<_>>>()?;
            let id = mesh.new_facet(&pts, side, facet.cut_surface)?;
            if let Some(position) = facet.position {
                mesh.set_facet_position(id, position);
            }
            facets.push(id);
        }
        let facet = |i: usize| facets.get(i).copied().ok_or(CutError::UnknownFacet(i));

        for (i, f) in input.facets.iter().enumerate() {
            for &h in &f.holes {
                mesh.add_hole(facets[i], facet(h)?)?;
            }
        }

        let mut volume_cells = Vec::with_capacity(input.volume_cells.len());
        for vc in &input.volume_cells {
            let id = mesh.new_volume_cell(vc.position);
            for &f in &vc.facets {
                mesh.register(facet(f)?, id)?;
            }
            mesh.orient_volume_cell(id)?;
            volume_cells.push(id);
        }

        let parent = input.element.as_ref().map(parent_element).transpose()?;

        let mut cut = Self {
            mesh,
            parent,
            facets,
            volume_cells,
        };
        for vc in cut.volume_cells.clone() {
            cut.create_boundary_cells(vc, options)?;
        }
        Ok(cut)
    }

    fn create_boundary_cells(&mut self, vc: VolumeCellId, options: &CutOptions) -> Result<()> {
        let prefer_split = options.decomposition == FacetDecomposition::Split;
        let bounding = self.mesh.volume_cell(vc).facets().to_vec();
        for (facet, orientation) in bounding {
            if !(options.element_face_cells || self.mesh.on_boundary_cell_side(facet)) {
                continue;
            }
            if let Some(rel_tol) = options.facet_area_check {
                self.mesh.test_facet_area(facet, rel_tol)?;
            }
            let cells = self.mesh.facet_decomposition(facet, prefer_split)?.to_vec();
            for mut corners in cells {
                if orientation.is_reversed() {
                    corners.reverse();
                }
                match corners.len() {
                    3 => self.mesh.new_tri3_cell(vc, facet, &corners)?,
                    4 => self.mesh.new_quad4_cell(vc, facet, &corners)?,
                    n => {
                        return Err(CutError::InvalidInput(format!(
                            "facet decomposition produced a {n}-corner cell"
                        )))
                    }
                };
            }
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Underlying cut mesh.
    pub fn mesh(&self) -> &CutMesh {
        &self.mesh
    }

    /// Background element, if one was supplied.
    pub fn parent(&self) -> Option<&ParentElement> {
        self.parent.as_ref()
    }

    /// Facet created for input facet `index`.
    pub fn facet_id(&self, index: usize) -> Result<FacetId> {
        self.facets
            .get(index)
            .copied()
            .ok_or(CutError::UnknownFacet(index))
    }

    /// Volume cells in input order.
    pub fn volume_cells(&self) -> &[VolumeCellId] {
        &self.volume_cells
    }

    /// Boundary cells created for a volume cell.
    pub fn boundary_cells(
        &self,
        vc: VolumeCellId,
    ) -> impl Iterator<Item = (BoundaryCellId, &BoundaryCell)> + '_ {
        self.mesh
            .volume_cell(vc)
            .boundary_cells()
            .iter()
            .map(|&id| (id, self.mesh.boundary_cell(id)))
    }

    /// Boundary cells created on a facet, for all volume cells.
    pub fn facet_boundary_cells(
        &self,
        facet: FacetId,
    ) -> impl Iterator<Item = (BoundaryCellId, &BoundaryCell)> + '_ {
        self.mesh
            .facet(facet)
            .boundary_cells()
            .iter()
            .map(|&id| (id, self.mesh.boundary_cell(id)))
    }

    /// Map local coordinate `eta` of a boundary cell into the local
    /// coordinates of the background element.
    pub fn transform_local_coords(
        &self,
        cell: BoundaryCellId,
        eta: &Point3,
        shadow: bool,
    ) -> Result<CellMapping> {
        let parent = self
            .parent
            .as_ref()
            .ok_or_else(|| CutError::InvalidInput("no background element supplied".into()))?;
        self.mesh
            .boundary_cell(cell)
            .transform_local_coords(parent, eta, shadow)
    }

    // =========================================================================
    // Integration checks
    // =========================================================================

    /// Enclosed volume by the divergence theorem, `(1/3) ∮ x · n dA`.
    ///
    /// Exact only when boundary cells cover the whole cell surface (see
    /// [`CutOptions::element_face_cells`]).
    pub fn volume(&self, vc: VolumeCellId) -> Result<f64> {
        self.integrate(vc, |m| m.x.coords.dot(&m.normal) / 3.0)
    }

    /// Total area of the boundary cells of a volume cell.
    pub fn boundary_area(&self, vc: VolumeCellId) -> Result<f64> {
        self.integrate(vc, |_| 1.0)
    }

    /// `∮ n dA` over the boundary cells; zero for a closed cell surface.
    pub fn closure_defect(&self, vc: VolumeCellId) -> Result<Vec3> {
        let mut sum = Vec3::zeros();
        for (_, cell) in self.boundary_cells(vc) {
            for_each_point(cell, |m, w| sum += m.normal * (w * m.drs))?;
        }
        Ok(sum)
    }

    /// Polygon area of `facet` minus the area of the boundary cells created
    /// on it for `vc`.
    pub fn area_defect(&self, vc: VolumeCellId, facet: FacetId) -> Result<f64> {
        let mut cells = 0.0;
        for (_, cell) in self.boundary_cells(vc).filter(|(_, c)| c.facet() == facet) {
            for_each_point(cell, |m, w| cells += w * m.drs)?;
        }
        Ok(self.mesh.facet_area(facet) - cells)
    }

    fn integrate(&self, vc: VolumeCellId, f: impl Fn(&CellMapping) -> f64) -> Result<f64> {
        let mut sum = 0.0;
        for (_, cell) in self.boundary_cells(vc) {
            for_each_point(cell, |m, w| sum += w * m.drs * f(m))?;
        }
        Ok(sum)
    }
}

/// Visit every quadrature point of a cell with its mapping and weight,
/// skipping points where the measure is NaN.
fn for_each_point(cell: &BoundaryCell, mut visit: impl FnMut(&CellMapping, f64)) -> Result<()> {
    let rule: IntegrationRule = cell.gauss_rule(CHECK_DEGREE);
    for (eta, w) in rule.iter() {
        let m = cell.transform(eta, false)?;
        if m.drs.is_nan() {
            log::warn!("NaN measure at eta = {:?}, point skipped", eta.coords.as_slice());
            continue;
        }
        visit(&m, w);
    }
    Ok(())
}

fn parent_element(input: &ElementInput) -> Result<ParentElement> {
    let nodes = input.nodes.iter().map(|&n| Point3::from(n)).collect();
    let mut parent = ParentElement::new(input.shape, nodes)?;
    if let Some(shadow) = &input.shadow {
        let nodes = shadow.nodes.iter().map(|&n| Point3::from(n)).collect();
        parent = parent.with_shadow(ParentElement::new(shadow.shape, nodes)?)?;
    }
    Ok(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use xcut_kernel_fem::CellType;
    use xcut_kernel_topo::{FacetOrientation, Position, SideKind};

    const CUBE: [[f64; 3]; 12] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
        // Cut plane x = 0.5.
        [0.5, 0.0, 0.0],
        [0.5, 1.0, 0.0],
        [0.5, 0.0, 1.0],
        [0.5, 1.0, 1.0],
    ];

    // Facet indices.
    const X0: usize = 0;
    const X1: usize = 1;
    const CUT: usize = 10;

    /// Unit cube split in half by the plane x = 0.5.
    fn halved_cube() -> CutInput {
        let face = |face: usize, points: &[usize]| SideInput {
            kind: SideKind::ElementFace { face },
            marked: false,
            points: points.to_vec(),
        };
        let sides = vec![
            face(0, &[0, 3, 7, 4]),
            face(1, &[1, 2, 6, 5]),
            face(2, &[0, 8, 1, 5, 10, 4]),
            face(3, &[3, 9, 2, 6, 11, 7]),
            face(4, &[0, 8, 1, 2, 9, 3]),
            face(5, &[4, 10, 5, 6, 11, 7]),
            SideInput {
                kind: SideKind::CutSurface { id: 0 },
                marked: false,
                points: vec![8, 9, 11, 10],
            },
        ];
        let facet = |side: usize, points: &[usize]| FacetInput {
            side,
            points: points.to_vec(),
            cut_surface: side == 6,
            ..Default::default()
        };
        let facets = vec![
            facet(0, &[0, 3, 7, 4]),
            facet(1, &[1, 2, 6, 5]),
            facet(2, &[0, 8, 10, 4]),
            facet(2, &[8, 1, 5, 10]),
            facet(3, &[3, 9, 11, 7]),
            facet(3, &[9, 2, 6, 11]),
            facet(4, &[0, 8, 9, 3]),
            facet(4, &[8, 1, 2, 9]),
            facet(5, &[4, 10, 11, 7]),
            facet(5, &[10, 5, 6, 11]),
            facet(6, &[8, 9, 11, 10]),
        ];
        CutInput {
            points: CUBE
                .iter()
                .map(|&x| PointInput {
                    x,
                    ..Default::default()
                })
                .collect(),
            sides,
            facets,
            volume_cells: vec![
                VolumeCellInput {
                    position: Position::Inside,
                    facets: vec![X0, 2, 4, 6, 8, CUT],
                },
                VolumeCellInput {
                    position: Position::Outside,
                    facets: vec![X1, 3, 5, 7, 9, CUT],
                },
            ],
            element: Some(ElementInput {
                shape: CellType::Hex8,
                nodes: CUBE[..8].to_vec(),
                shadow: None,
            }),
        }
    }

    fn all_faces() -> CutOptions {
        CutOptions {
            element_face_cells: true,
            facet_area_check: Some(1e-10),
            ..Default::default()
        }
    }

    #[test]
    fn test_halved_cube_cut_cells() {
        let cut = ElementCut::build(&halved_cube(), &CutOptions::default()).unwrap();
        let [left, right] = cut.volume_cells() else {
            panic!("expected two volume cells");
        };
        let cut_facet = cut.facet_id(CUT).unwrap();

        // Only the cut facet carries cells: one quad per side.
        let left_cells: Vec<_> = cut.boundary_cells(*left).collect();
        let right_cells: Vec<_> = cut.boundary_cells(*right).collect();
        assert_eq!(left_cells.len(), 1);
        assert_eq!(right_cells.len(), 1);
        assert_eq!(cut.facet_boundary_cells(cut_facet).count(), 2);

        let (_, l) = left_cells[0];
        let (_, r) = right_cells[0];
        assert_eq!(l.cell_type(), Some(CellType::Quad4));
        assert_relative_eq!(l.area(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(r.area(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(l.normal_vector().unwrap(), Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(r.normal_vector().unwrap(), -Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(cut.area_defect(*left, cut_facet).unwrap(), 0.0, epsilon = 1e-12);

        let mesh = cut.mesh();
        assert_eq!(mesh.volume_cell(*left).orientation(cut_facet), Some(FacetOrientation::AsStored));
        assert_eq!(mesh.volume_cell(*right).orientation(cut_facet), Some(FacetOrientation::Reversed));
        assert_eq!(mesh.neighbor(cut_facet, *left), Some(*right));
    }

    #[test]
    fn test_halved_cube_volumes_and_closure() {
        for decomposition in [FacetDecomposition::Split, FacetDecomposition::Triangulation] {
            let options = CutOptions {
                decomposition,
                ..all_faces()
            };
            let cut = ElementCut::build(&halved_cube(), &options).unwrap();
            for &vc in cut.volume_cells() {
                assert_relative_eq!(cut.volume(vc).unwrap(), 0.5, epsilon = 1e-12);
                assert_relative_eq!(cut.boundary_area(vc).unwrap(), 4.0, epsilon = 1e-12);
                assert_relative_eq!(cut.closure_defect(vc).unwrap(), Vec3::zeros(), epsilon = 1e-12);
                for &(facet, _) in cut.mesh().volume_cell(vc).facets() {
                    assert_relative_eq!(cut.area_defect(vc, facet).unwrap(), 0.0, epsilon = 1e-12);
                }
            }
            let cells: usize = cut
                .volume_cells()
                .iter()
                .map(|&vc| cut.boundary_cells(vc).count())
                .sum();
            let expected = match decomposition {
                FacetDecomposition::Split => 12,
                FacetDecomposition::Triangulation => 24,
            };
            assert_eq!(cells, expected);
        }
    }

    #[test]
    fn test_marked_element_face_gets_cells() {
        let mut input = halved_cube();
        input.sides[0].marked = true;
        let cut = ElementCut::build(&input, &CutOptions::default()).unwrap();
        let left = cut.volume_cells()[0];
        assert_eq!(cut.boundary_cells(left).count(), 2);
        let x0 = cut.facet_id(X0).unwrap();
        let (_, cell) = cut.facet_boundary_cells(x0).next().unwrap();
        assert_relative_eq!(cell.normal_vector().unwrap(), -Vec3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_transform_local_coords() {
        let cut = ElementCut::build(&halved_cube(), &CutOptions::default()).unwrap();
        let left = cut.volume_cells()[0];
        let (id, _) = cut.boundary_cells(left).next().unwrap();
        let m = cut
            .transform_local_coords(id, &Point3::new(0.0, 0.0, 0.0), false)
            .unwrap();
        // Cell centre (0.5, 0.5, 0.5) is the element centre.
        assert_relative_eq!(m.x, Point3::origin(), epsilon = 1e-10);

        let mut input = halved_cube();
        input.element = None;
        let cut = ElementCut::build(&input, &CutOptions::default()).unwrap();
        let (id, _) = cut.boundary_cells(cut.volume_cells()[0]).next().unwrap();
        assert!(cut.transform_local_coords(id, &Point3::origin(), false).is_err());
    }

    #[test]
    fn test_build_is_deterministic() {
        let cells = || {
            let cut = ElementCut::build(&halved_cube(), &all_faces()).unwrap();
            cut.volume_cells()
                .iter()
                .flat_map(|&vc| {
                    cut.boundary_cells(vc)
                        .map(|(_, c)| c.coordinates().to_vec())
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(cells(), cells());
    }

    #[test]
    fn test_bad_references_are_errors() {
        let mut input = halved_cube();
        input.volume_cells[0].facets.push(42);
        assert_eq!(
            ElementCut::build(&input, &CutOptions::default()).unwrap_err(),
            CutError::UnknownFacet(42)
        );

        let mut input = halved_cube();
        input.facets[0].points[1] = 99;
        assert!(matches!(
            ElementCut::build(&input, &CutOptions::default()),
            Err(CutError::InvalidInput(_))
        ));

        // A third volume cell on the cut facet.
        let mut input = halved_cube();
        input.volume_cells.push(VolumeCellInput {
            position: Position::Undecided,
            facets: vec![CUT],
        });
        assert!(matches!(
            ElementCut::build(&input, &CutOptions::default()),
            Err(CutError::TooManyVolumeCells { .. })
        ));
    }

    #[test]
    fn test_json_fixture() {
        let input: CutInput = serde_json::from_str(
            r#"{
                "points": [
                    {"x": [0, 0, 0]}, {"x": [1, 0, 0]}, {"x": [0, 1, 0]}, {"x": [0, 0, 1]}
                ],
                "sides": [
                    {"kind": {"kind": "element_face", "face": 0}, "points": [0, 2, 1]},
                    {"kind": {"kind": "element_face", "face": 1}, "points": [0, 1, 3]},
                    {"kind": {"kind": "element_face", "face": 2}, "points": [1, 2, 3]},
                    {"kind": {"kind": "element_face", "face": 3}, "points": [0, 3, 2]}
                ],
                "facets": [
                    {"side": 0, "points": [0, 2, 1]},
                    {"side": 1, "points": [0, 1, 3]},
                    {"side": 2, "points": [1, 2, 3]},
                    {"side": 3, "points": [0, 3, 2]}
                ],
                "volume_cells": [{"position": "inside", "facets": [0, 1, 2, 3]}],
                "element": {"shape": "tet4", "nodes": [[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1]]}
            }"#,
        )
        .unwrap();
        let options: CutOptions =
            serde_json::from_str(r#"{"decomposition": "triangulation", "element_face_cells": true}"#)
                .unwrap();
        assert_eq!(options.tolerance, xcut_kernel_math::CutTolerance::DEFAULT);

        let cut = ElementCut::build(&input, &options).unwrap();
        let vc = cut.volume_cells()[0];
        assert_eq!(cut.mesh().volume_cell(vc).position(), Position::Inside);
        assert_relative_eq!(cut.volume(vc).unwrap(), 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(cut.closure_defect(vc).unwrap(), Vec3::zeros(), epsilon = 1e-12);
    }
}
