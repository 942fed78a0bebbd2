//! Finite-element cell shapes known to the cut kernel.

/// Shape of a finite-element cell.
///
/// Boundary cells use the 0D/1D/2D shapes, background elements use the 3D
/// ones. `Tet10` and `Hex20` only appear as quadratic shadow elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CellType {
    /// Single point.
    Point1,
    /// Two-node line.
    Line2,
    /// Three-node triangle.
    Tri3,
    /// Four-node quadrilateral.
    Quad4,
    /// Four-node tetrahedron.
    Tet4,
    /// Eight-node hexahedron.
    Hex8,
    /// Six-node wedge (triangular prism).
    Wedge6,
    /// Ten-node quadratic tetrahedron.
    Tet10,
    /// Twenty-node serendipity hexahedron.
    Hex20,
}

impl CellType {
    /// Number of nodes of this shape.
    pub fn num_nodes(self) -> usize {
        match self {
            CellType::Point1 => 1,
            CellType::Line2 => 2,
            CellType::Tri3 => 3,
            CellType::Quad4 => 4,
            CellType::Tet4 => 4,
            CellType::Hex8 => 8,
            CellType::Wedge6 => 6,
            CellType::Tet10 => 10,
            CellType::Hex20 => 20,
        }
    }

    /// Parametric dimension of this shape.
    pub fn dim(self) -> usize {
        match self {
            CellType::Point1 => 0,
            CellType::Line2 => 1,
            CellType::Tri3 | CellType::Quad4 => 2,
            CellType::Tet4 | CellType::Hex8 | CellType::Wedge6 | CellType::Tet10 | CellType::Hex20 => 3,
        }
    }

    /// Whether the shape uses quadratic shape functions.
    pub fn is_quadratic(self) -> bool {
        matches!(self, CellType::Tet10 | CellType::Hex20)
    }

    /// Centroid of the reference cell.
    pub fn reference_center(self) -> [f64; 3] {
        match self {
            CellType::Tri3 => [1.0 / 3.0, 1.0 / 3.0, 0.0],
            CellType::Tet4 | CellType::Tet10 => [0.25, 0.25, 0.25],
            CellType::Wedge6 => [1.0 / 3.0, 1.0 / 3.0, 0.0],
            CellType::Point1
            | CellType::Line2
            | CellType::Quad4
            | CellType::Hex8
            | CellType::Hex20 => [0.0, 0.0, 0.0],
        }
    }

    /// Lower-case shape name.
    pub fn name(self) -> &'static str {
        match self {
            CellType::Point1 => "point1",
            CellType::Line2 => "line2",
            CellType::Tri3 => "tri3",
            CellType::Quad4 => "quad4",
            CellType::Tet4 => "tet4",
            CellType::Hex8 => "hex8",
            CellType::Wedge6 => "wedge6",
            CellType::Tet10 => "tet10",
            CellType::Hex20 => "hex20",
        }
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
