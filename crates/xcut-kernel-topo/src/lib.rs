#![warn(missing_docs)]

//! Cut boundary representation of one background element.
//!
//! The cut of an element by an interface is described by:
//! 1. **Points** merged within tolerance and classified by position
//! 2. **Sides** of the element or of the cutter, each a point cycle
//! 3. **Facets** fragments of sides bounding at most two volume cells
//! 4. **Volume cells** connected sub-volumes with outward facet orientation
//! 5. **Boundary cells** integrable fragments of facets
//!
//! Everything lives in slotmap arenas owned by [`CutMesh`]; entities refer
//! to each other by key.

mod boundary_cell;
mod cycle;
mod error;
mod facet;
mod mesh;
mod orientation;
mod point;
mod side;
mod volume_cell;

pub use boundary_cell::{
    ArbitraryCell, BoundaryCell, BoundaryCellId, CellMapping, FixedCell, LINE2_DEGREE,
    SURFACE_DEGREE,
};
pub use cycle::Cycle;
pub use error::{CutError, Result};
pub use facet::{Decomposition, Facet, FacetId};
pub use mesh::CutMesh;
pub use point::{Point, PointId, Position};
pub use side::{Side, SideId, SideKind};
pub use volume_cell::{FacetOrientation, VolumeCell, VolumeCellId};
