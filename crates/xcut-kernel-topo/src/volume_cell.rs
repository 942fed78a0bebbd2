//! Volume cells: connected sub-volumes of the cut element.

use crate::{BoundaryCellId, FacetId, Position};

slotmap::new_key_type! {
    /// Unique identifier for a volume cell in the cut mesh.
    pub struct VolumeCellId;
}

/// Orientation of a bounding facet as seen from one volume cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FacetOrientation {
    /// The stored point order points outwards.
    #[default]
    AsStored,
    /// The reversed point order points outwards.
    Reversed,
}

impl FacetOrientation {
    /// Whether the stored order must be reversed.
    pub fn is_reversed(self) -> bool {
        self == FacetOrientation::Reversed
    }

    pub(crate) fn from_flip(flip: bool) -> Self {
        if flip {
            FacetOrientation::Reversed
        } else {
            FacetOrientation::AsStored
        }
    }
}

/// One connected sub-volume bounded by oriented facets.
#[derive(Debug, Clone, Default)]
pub struct VolumeCell {
    pub(crate) position: Position,
    pub(crate) facets: Vec<(FacetId, FacetOrientation)>,
    pub(crate) boundary_cells: Vec<BoundaryCellId>,
}

impl VolumeCell {
    /// Position classification.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Bounding facets with their outward orientation.
    pub fn facets(&self) -> &[(FacetId, FacetOrientation)] {
        &self.facets
    }

    /// Orientation of `facet`, if it bounds this cell.
    pub fn orientation(&self, facet: FacetId) -> Option<FacetOrientation> {
        self.facets
            .iter()
            .find(|(f, _)| *f == facet)
            .map(|&(_, o)| o)
    }

    /// Boundary cells created for this volume cell.
    pub fn boundary_cells(&self) -> &[BoundaryCellId] {
        &self.boundary_cells
    }
}
