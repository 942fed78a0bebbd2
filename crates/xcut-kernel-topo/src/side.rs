//! Parent surfaces of facets.

use crate::{Cycle, FacetId};

slotmap::new_key_type! {
    /// Unique identifier for a side in the cut mesh.
    pub struct SideId;
}

/// What a side is a slice of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum SideKind {
    /// A face of the background element.
    ElementFace {
        /// Local face number within the element.
        face: usize,
    },
    /// A piece of a cutter surface.
    CutSurface {
        /// Identifier of the cutter side upstream.
        id: usize,
    },
}

/// A parent surface owning one or more facets.
#[derive(Debug, Clone)]
pub struct Side {
    pub(crate) sid: usize,
    pub(crate) kind: SideKind,
    pub(crate) marked: bool,
    pub(crate) cycle: Cycle,
    pub(crate) facets: Vec<FacetId>,
}

impl Side {
    /// Stable side number, assigned in insertion order.
    pub fn sid(&self) -> usize {
        self.sid
    }

    /// Side kind.
    pub fn kind(&self) -> SideKind {
        self.kind
    }

    /// Whether this side belongs to a cutter surface.
    pub fn is_cut_side(&self) -> bool {
        matches!(self.kind, SideKind::CutSurface { .. })
    }

    /// Whether this is a marked background side (needs boundary cells
    /// although it is not cut).
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// Point cycle of the side.
    pub fn cycle(&self) -> &Cycle {
        &self.cycle
    }

    /// Facets created on this side.
    pub fn facets(&self) -> &[FacetId] {
        &self.facets
    }
}
