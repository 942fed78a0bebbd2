//! Shape functions and their first derivatives.
//!
//! Reference cells:
//! - line2: `ξ ∈ [-1, 1]`
//! - tri3, tet4, tet10: unit simplex, node 0 at the origin
//! - quad4, hex8, hex20: `[-1, 1]^d`, corners counter-clockwise, bottom layer first
//! - wedge6: unit triangle × `ζ ∈ [-1, 1]`

use xcut_kernel_math::{Point2, Point3, Vec2, Vec3};

use crate::{CellType, FemError, Result};

/// Shape function values and reference derivatives of a 0D/1D/2D cell.
///
/// For line cells only the first derivative component is meaningful.
#[derive(Debug, Clone)]
pub struct SurfaceShape {
    /// `N_i(ξ)` for every node.
    pub values: Vec<f64>,
    /// `(∂N_i/∂ξ, ∂N_i/∂η)` for every node.
    pub derivs: Vec<Vec2>,
}

/// Shape function values and reference derivatives of a 3D cell.
#[derive(Debug, Clone)]
pub struct VolumeShape {
    /// `N_i(ξ)` for every node.
    pub values: Vec<f64>,
    /// `(∂N_i/∂ξ, ∂N_i/∂η, ∂N_i/∂ζ)` for every node.
    pub derivs: Vec<Vec3>,
}

const QUAD4_NODES: [[f64; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

const HEX8_NODES: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Corner pairs of the hex20 mid-edge nodes 8..20.
const HEX20_EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
];

/// Corner pairs of the tet10 mid-edge nodes 4..10.
const TET10_EDGES: [[usize; 2]; 6] = [[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]];

/// Evaluate shape functions of a point, line or surface cell at `xi`.
pub fn surface_shape(cell: CellType, xi: &Point2) -> Result<SurfaceShape> {
    let (r, s) = (xi.x, xi.y);
    let shape = match cell {
        CellType::Point1 => SurfaceShape {
            values: vec![1.0],
            derivs: vec![Vec2::zeros()],
        },
        CellType::Line2 => SurfaceShape {
            values: vec![0.5 * (1.0 - r), 0.5 * (1.0 + r)],
            derivs: vec![Vec2::new(-0.5, 0.0), Vec2::new(0.5, 0.0)],
        },
        CellType::Tri3 => SurfaceShape {
            values: vec![1.0 - r - s, r, s],
            derivs: vec![Vec2::new(-1.0, -1.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
        },
        CellType::Quad4 => {
            let mut values = Vec::with_capacity(4);
            let mut derivs = Vec::with_capacity(4);
            for [ri, si] in QUAD4_NODES {
                values.push(0.25 * (1.0 + r * ri) * (1.0 + s * si));
                derivs.push(Vec2::new(
                    0.25 * ri * (1.0 + s * si),
                    0.25 * si * (1.0 + r * ri),
                ));
            }
            SurfaceShape { values, derivs }
        }
        other => return Err(FemError::UnsupportedShape(other)),
    };
    Ok(shape)
}

/// Evaluate shape functions of a volume cell at `xi`.
pub fn volume_shape(cell: CellType, xi: &Point3) -> Result<VolumeShape> {
    let shape = match cell {
        CellType::Tet4 => tet4(xi),
        CellType::Hex8 => hex8(xi),
        CellType::Wedge6 => wedge6(xi),
        CellType::Tet10 => tet10(xi),
        CellType::Hex20 => hex20(xi),
        other => return Err(FemError::UnsupportedShape(other)),
    };
    Ok(shape)
}

fn tet4(xi: &Point3) -> VolumeShape {
    VolumeShape {
        values: vec![1.0 - xi.x - xi.y - xi.z, xi.x, xi.y, xi.z],
        derivs: vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ],
    }
}

fn hex8(xi: &Point3) -> VolumeShape {
    let (r, s, t) = (xi.x, xi.y, xi.z);
    let mut values = Vec::with_capacity(8);
    let mut derivs = Vec::with_capacity(8);
    for [ri, si, ti] in HEX8_NODES {
        let (a, b, c) = (1.0 + r * ri, 1.0 + s * si, 1.0 + t * ti);
        values.push(0.125 * a * b * c);
        derivs.push(Vec3::new(
            0.125 * ri * b * c,
            0.125 * si * a * c,
            0.125 * ti * a * b,
        ));
    }
    VolumeShape { values, derivs }
}

fn wedge6(xi: &Point3) -> VolumeShape {
    let (r, s, t) = (xi.x, xi.y, xi.z);
    let tri = [1.0 - r - s, r, s];
    let dtri = [[-1.0, -1.0], [1.0, 0.0], [0.0, 1.0]];
    let mut values = Vec::with_capacity(6);
    let mut derivs = Vec::with_capacity(6);
    for ti in [-1.0, 1.0] {
        let lin = 0.5 * (1.0 + t * ti);
        for k in 0..3 {
            values.push(tri[k] * lin);
            derivs.push(Vec3::new(
                dtri[k][0] * lin,
                dtri[k][1] * lin,
                tri[k] * 0.5 * ti,
            ));
        }
    }
    VolumeShape { values, derivs }
}

fn tet10(xi: &Point3) -> VolumeShape {
    let l = [1.0 - xi.x - xi.y - xi.z, xi.x, xi.y, xi.z];
    let dl = [
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
    ];
    let mut values = Vec::with_capacity(10);
    let mut derivs = Vec::with_capacity(10);
    for k in 0..4 {
        values.push(l[k] * (2.0 * l[k] - 1.0));
        derivs.push(dl[k] * (4.0 * l[k] - 1.0));
    }
    for [a, b] in TET10_EDGES {
        values.push(4.0 * l[a] * l[b]);
        derivs.push((dl[a] * l[b] + dl[b] * l[a]) * 4.0);
    }
    VolumeShape { values, derivs }
}

fn hex20(xi: &Point3) -> VolumeShape {
    let x = [xi.x, xi.y, xi.z];
    let mut values = Vec::with_capacity(20);
    let mut derivs = Vec::with_capacity(20);

    for node in HEX8_NODES {
        let f = [
            1.0 + x[0] * node[0],
            1.0 + x[1] * node[1],
            1.0 + x[2] * node[2],
        ];
        let sum = x[0] * node[0] + x[1] * node[1] + x[2] * node[2];
        values.push(0.125 * f[0] * f[1] * f[2] * (sum - 2.0));
        let mut d = Vec3::zeros();
        for k in 0..3 {
            let (i, j) = ((k + 1) % 3, (k + 2) % 3);
            d[k] = 0.125 * node[k] * f[i] * f[j] * (sum - 2.0 + f[k]);
        }
        derivs.push(d);
    }

    for [a, b] in HEX20_EDGES {
        let pa = HEX8_NODES[a];
        let pb = HEX8_NODES[b];
        let mid = [
            0.5 * (pa[0] + pb[0]),
            0.5 * (pa[1] + pb[1]),
            0.5 * (pa[2] + pb[2]),
        ];
        // The edge runs along the axis where the mid-node coordinate vanishes.
        let axis = (0..3).find(|&k| mid[k] == 0.0).unwrap_or(0);
        let (i, j) = ((axis + 1) % 3, (axis + 2) % 3);
        let bubble = 1.0 - x[axis] * x[axis];
        let fi = 1.0 + x[i] * mid[i];
        let fj = 1.0 + x[j] * mid[j];
        values.push(0.25 * bubble * fi * fj);
        let mut d = Vec3::zeros();
        d[axis] = -0.5 * x[axis] * fi * fj;
        d[i] = 0.25 * bubble * mid[i] * fj;
        d[j] = 0.25 * bubble * fi * mid[j];
        derivs.push(d);
    }

    VolumeShape { values, derivs }
}

/// Reference coordinates of the nodes of a volume shape.
pub fn reference_nodes(cell: CellType) -> Result<Vec<Point3>> {
    let nodes = match cell {
        CellType::Tet4 => vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ],
        CellType::Hex8 => HEX8_NODES
            .iter()
            .map(|p| Point3::new(p[0], p[1], p[2]))
            .collect(),
        CellType::Wedge6 => vec![
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(1.0, 0.0, -1.0),
            Point3::new(0.0, 1.0, -1.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ],
        CellType::Tet10 => {
            let mut nodes = reference_nodes(CellType::Tet4)?;
            for [a, b] in TET10_EDGES {
                nodes.push(nalgebra::center(&nodes[a], &nodes[b]));
            }
            nodes
        }
        CellType::Hex20 => {
            let mut nodes = reference_nodes(CellType::Hex8)?;
            for [a, b] in HEX20_EDGES {
                nodes.push(nalgebra::center(&nodes[a], &nodes[b]));
            }
            nodes
        }
        other => return Err(FemError::UnsupportedShape(other)),
    };
    Ok(nodes)
}
