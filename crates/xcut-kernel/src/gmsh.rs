//! Gmsh `.pos` dump of boundary cells for visual inspection.

use std::io::{self, Write};

use xcut_kernel_math::Point3;
use xcut_kernel_topo::BoundaryCell;

use crate::ElementCut;

impl ElementCut {
    /// Write all boundary cells as Gmsh post-processing views.
    ///
    /// The first view holds the cells with the volume-cell index as scalar
    /// value, the second the cell normals at the cell centres.
    pub fn dump_gmsh<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "View \"BoundaryCells\" {{")?;
        for (k, &vc) in self.volume_cells().iter().enumerate() {
            for (_, cell) in self.boundary_cells(vc) {
                write_cell(out, cell, k as f64)?;
            }
        }
        writeln!(out, "}};")?;

        writeln!(out, "View \"BoundaryCellNormals\" {{")?;
        for &vc in self.volume_cells() {
            for (_, cell) in self.boundary_cells(vc) {
                let Ok(n) = cell.normal_vector() else {
                    continue;
                };
                let c = cell.element_center();
                writeln!(
                    out,
                    "VP({},{},{}){{{},{},{}}};",
                    c.x, c.y, c.z, n.x, n.y, n.z
                )?;
            }
        }
        writeln!(out, "}};")
    }
}

fn write_cell<W: Write>(out: &mut W, cell: &BoundaryCell, value: f64) -> io::Result<()> {
    let x = cell.coordinates();
    let tag = match cell {
        BoundaryCell::Point1(_) => "SP",
        BoundaryCell::Line2(_) => "SL",
        BoundaryCell::Tri3(_) => "ST",
        BoundaryCell::Quad4(_) => "SQ",
        BoundaryCell::Arbitrary(_) => {
            for p in x {
                write_element(out, "SP", std::slice::from_ref(p), value)?;
            }
            return Ok(());
        }
    };
    write_element(out, tag, x, value)
}

fn write_element<W: Write>(out: &mut W, tag: &str, x: &[Point3], value: f64) -> io::Result<()> {
    let coords: Vec<String> = x
        .iter()
        .flat_map(|p| [p.x, p.y, p.z])
        .map(|c| c.to_string())
        .collect();
    let values = vec![value.to_string(); x.len()];
    writeln!(out, "{}({}){{{}}};", tag, coords.join(","), values.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CutInput, CutOptions, FacetInput, PointInput, SideInput, VolumeCellInput};
    use xcut_kernel_topo::{Position, SideKind};

    #[test]
    fn test_dump_single_triangle() {
        let corners = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let input = CutInput {
            points: corners
                .iter()
                .map(|&x| PointInput {
                    x,
                    ..Default::default()
                })
                .collect(),
            sides: vec![SideInput {
                kind: SideKind::CutSurface { id: 3 },
                marked: false,
                points: vec![0, 1, 2],
            }],
            facets: vec![FacetInput {
                side: 0,
                points: vec![0, 1, 2],
                cut_surface: true,
                ..Default::default()
            }],
            volume_cells: vec![VolumeCellInput {
                position: Position::Inside,
                facets: vec![0],
            }],
            element: None,
        };
        let cut = crate::ElementCut::build(&input, &CutOptions::default()).unwrap();

        let mut buf = Vec::new();
        cut.dump_gmsh(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.matches("ST(").count(), 1);
        assert_eq!(text.matches("VP(").count(), 1);
        assert!(text.contains("{0,0,0};"));
        assert!(text.starts_with("View \"BoundaryCells\" {"));
    }
}
