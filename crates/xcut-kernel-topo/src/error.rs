//! Error types for cut-mesh construction.

use thiserror::Error;
use xcut_kernel_fem::{CellType, FemError};
use xcut_kernel_tessellate::TessellateError;

use crate::{FacetId, VolumeCellId};

/// Errors raised while building the cut boundary representation.
///
/// All variants are fatal: they point at inconsistent intersection data or a
/// missing shape implementation. Degenerate but legitimate geometry never
/// shows up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CutError {
    /// A facet has fewer than three distinct points.
    #[error("degenerate facet on side {side}: points {pids:?}")]
    DegenerateFacet {
        /// Parent side number.
        side: usize,
        /// Point numbers of the facet.
        pids: Vec<usize>,
    },

    /// The point cycle of a facet (or one of its holes) crosses itself.
    #[error("self-intersecting facet on side {side}: points {pids:?}, edges {edge_a} and {edge_b}")]
    SelfIntersectingFacet {
        /// Parent side number.
        side: usize,
        /// Point numbers of the facet.
        pids: Vec<usize>,
        /// First crossing edge.
        edge_a: usize,
        /// Second crossing edge.
        edge_b: usize,
    },

    /// Triangulation failed for another reason.
    #[error("cannot triangulate facet on side {side}: points {pids:?}")]
    TriangulationFailed {
        /// Parent side number.
        side: usize,
        /// Point numbers of the facet.
        pids: Vec<usize>,
        /// Underlying tessellation error.
        #[source]
        source: TessellateError,
    },

    /// A facet was registered with a third volume cell.
    #[error("facet with points {pids:?} already bounds two volume cells")]
    TooManyVolumeCells {
        /// Point numbers of the facet.
        pids: Vec<usize>,
    },

    /// Orientation propagation found an odd cycle of flips.
    #[error("volume cell {volume_cell:?} is not orientable: facets {facet_a:?} and {facet_b:?} disagree")]
    NonOrientable {
        /// The volume cell being oriented.
        volume_cell: VolumeCellId,
        /// Facet whose orientation was already fixed.
        facet_a: FacetId,
        /// Neighbouring facet that contradicts it.
        facet_b: FacetId,
    },

    /// A boundary cell factory got the wrong number of corners.
    #[error("{shape} boundary cell needs {expected} corners, got {found}")]
    WrongCornerCount {
        /// Requested cell shape.
        shape: CellType,
        /// Required corner count.
        expected: usize,
        /// Supplied corner count.
        found: usize,
    },

    /// A boundary cell corner is not a point of its facet.
    #[error("boundary cell corner {corner} is not a point of the facet {facet_pids:?}")]
    ForeignCorner {
        /// Offending point number.
        corner: usize,
        /// Point numbers of the facet.
        facet_pids: Vec<usize>,
    },

    /// A boundary cell was requested for a volume cell the facet does not bound.
    #[error("facet with points {pids:?} does not bound volume cell {volume_cell:?}")]
    FacetNotInVolumeCell {
        /// Point numbers of the facet.
        pids: Vec<usize>,
        /// The requested volume cell.
        volume_cell: VolumeCellId,
    },

    /// An input record references a facet that does not exist.
    #[error("unknown facet index {0}")]
    UnknownFacet(usize),

    /// Triangulated area of a facet does not match its polygon area.
    #[error("facet with points {pids:?}: polygon area {polygon:e}, triangulated area {cells:e}")]
    FacetAreaMismatch {
        /// Point numbers of the facet.
        pids: Vec<usize>,
        /// Polygon area (holes excluded).
        polygon: f64,
        /// Sum of triangle areas.
        cells: f64,
    },

    /// Malformed input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Finite-element evaluation failed.
    #[error(transparent)]
    Fem(#[from] FemError),
}

/// Result alias for cut-mesh operations.
pub type Result<T> = std::result::Result<T, CutError>;
