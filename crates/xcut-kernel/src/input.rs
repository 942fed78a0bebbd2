//! Intersection data handed over by the upstream cut, and build options.
//!
//! All cross references are plain indices into the sibling vectors, so the
//! whole input can be loaded from JSON (or any other serde format).

use serde::{Deserialize, Serialize};
use xcut_kernel_fem::CellType;
use xcut_kernel_math::CutTolerance;
use xcut_kernel_topo::{Position, SideKind};

/// Complete cut description of one background element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CutInput {
    /// Cut points.
    pub points: Vec<PointInput>,
    /// Element faces and cutter sides.
    pub sides: Vec<SideInput>,
    /// Facets on the sides.
    pub facets: Vec<FacetInput>,
    /// Volume cells, each listing its bounding facets.
    pub volume_cells: Vec<VolumeCellInput>,
    /// Background element, needed for local-coordinate mappings.
    #[serde(default)]
    pub element: Option<ElementInput>,
}

/// One cut point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointInput {
    /// Current coordinates.
    pub x: [f64; 3],
    /// Reference coordinates, `x` when absent.
    #[serde(default)]
    pub x_ref: Option<[f64; 3]>,
    /// Position, if already classified upstream.
    #[serde(default)]
    pub position: Option<Position>,
}

/// One side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideInput {
    /// Element face or cutter side.
    pub kind: SideKind,
    /// Marked background side (boundary cells are created on it).
    #[serde(default)]
    pub marked: bool,
    /// Point indices of the side loop.
    pub points: Vec<usize>,
}

/// One facet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetInput {
    /// Index of the parent side.
    pub side: usize,
    /// Point indices in loop order.
    pub points: Vec<usize>,
    /// Indices of facets cut out of this one.
    #[serde(default)]
    pub holes: Vec<usize>,
    /// Whether the facet lies on the cut surface.
    #[serde(default)]
    pub cut_surface: bool,
    /// Position, if already classified upstream.
    #[serde(default)]
    pub position: Option<Position>,
}

/// One volume cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeCellInput {
    /// Inside/outside classification.
    #[serde(default)]
    pub position: Position,
    /// Indices of the bounding facets.
    pub facets: Vec<usize>,
}

/// Background element geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInput {
    /// Element shape (a 3D shape).
    pub shape: CellType,
    /// Node coordinates in the shape's node order.
    pub nodes: Vec<[f64; 3]>,
    /// Quadratic shadow element used for curved geometry.
    #[serde(default)]
    pub shadow: Option<Box<ElementInput>>,
}

/// How facets are broken into boundary cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetDecomposition {
    /// Quadrilaterals (plus one triangle) where a facet allows it,
    /// triangles elsewhere.
    #[default]
    Split,
    /// Triangles everywhere.
    Triangulation,
}

/// Options for [`ElementCut::build`](crate::ElementCut::build).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CutOptions {
    /// Geometric tolerances.
    pub tolerance: CutTolerance,
    /// Facet decomposition strategy.
    pub decomposition: FacetDecomposition,
    /// Also create boundary cells on unmarked element faces.
    pub element_face_cells: bool,
    /// Verify every decomposed facet's triangulated area against its polygon
    /// area with this relative tolerance.
    pub facet_area_check: Option<f64>,
}
