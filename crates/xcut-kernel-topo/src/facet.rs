//! Facets: planar fragments of a side bounding one or two volume cells.

use std::sync::OnceLock;

use crate::cycle::same_rotation;
use crate::{BoundaryCellId, Cycle, PointId, Position, SideId, VolumeCellId};

slotmap::new_key_type! {
    /// Unique identifier for a facet in the cut mesh.
    pub struct FacetId;
}

/// Sub-polygons of a facet, each a list of corner points.
pub type Decomposition = Vec<Vec<PointId>>;

/// A (near-)planar polygon of a side, possibly with holes.
///
/// Geometry queries that need point coordinates live on
/// [`CutMesh`](crate::CutMesh); this type holds the combinatorial data and
/// the memoized decompositions.
#[derive(Debug)]
pub struct Facet {
    pub(crate) side: SideId,
    pub(crate) cut_side: bool,
    pub(crate) points: Cycle,
    pub(crate) corners: Vec<PointId>,
    pub(crate) holes: Vec<FacetId>,
    pub(crate) position: Position,
    pub(crate) cut_surface: bool,
    pub(crate) volume_cells: Vec<VolumeCellId>,
    pub(crate) boundary_cells: Vec<BoundaryCellId>,
    pub(crate) planar: OnceLock<bool>,
    pub(crate) triangulation: OnceLock<Decomposition>,
    pub(crate) split: OnceLock<Option<Decomposition>>,
}

impl Facet {
    pub(crate) fn new(
        side: SideId,
        cut_side: bool,
        points: Cycle,
        corners: Vec<PointId>,
        cut_surface: bool,
    ) -> Self {
        Self {
            side,
            cut_side,
            points,
            corners,
            holes: Vec::new(),
            position: if cut_surface {
                Position::OnCutSurface
            } else {
                Position::Undecided
            },
            cut_surface,
            volume_cells: Vec::new(),
            boundary_cells: Vec::new(),
            planar: OnceLock::new(),
            triangulation: OnceLock::new(),
            split: OnceLock::new(),
        }
    }

    /// Drop memoized decompositions after a topology change.
    pub(crate) fn reset_caches(&mut self) {
        self.planar.take();
        self.triangulation.take();
        self.split.take();
    }

    /// Parent side.
    pub fn side(&self) -> SideId {
        self.side
    }

    /// All points of the facet in loop order.
    pub fn points(&self) -> &Cycle {
        &self.points
    }

    /// Corner points in loop order (collinear edge points removed).
    pub fn corner_points(&self) -> &[PointId] {
        &self.corners
    }

    /// Hole facets.
    pub fn holes(&self) -> &[FacetId] {
        &self.holes
    }

    /// Whether the facet has holes.
    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }

    /// Position classification.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Whether the facet was created as part of the cut surface.
    pub fn is_cut_surface(&self) -> bool {
        self.cut_surface
    }

    /// Whether the parent side belongs to a cutter surface.
    pub fn on_cut_side(&self) -> bool {
        self.cut_side
    }

    /// Registered volume cells (at most two).
    pub fn volume_cells(&self) -> &[VolumeCellId] {
        &self.volume_cells
    }

    /// Boundary cells created on this facet.
    pub fn boundary_cells(&self) -> &[BoundaryCellId] {
        &self.boundary_cells
    }

    /// Whether the facet is a triangle.
    pub fn is_triangle(&self) -> bool {
        self.corners.len() == 3
    }

    /// Whether `p` is one of the facet points.
    pub fn contains_point(&self, p: PointId) -> bool {
        self.points.contains(p)
    }

    /// Whether this facet shares at least one point with `other`.
    pub fn touches(&self, other: &Facet) -> bool {
        self.points.points().iter().any(|&p| other.contains_point(p))
    }

    /// Whether `points` lists the corners of this facet, up to rotation and
    /// reflection.
    pub fn corner_equals(&self, points: &[PointId]) -> bool {
        if same_rotation(&self.corners, points) {
            return true;
        }
        let reversed: Vec<PointId> = points.iter().rev().copied().collect();
        same_rotation(&self.corners, &reversed)
    }

    /// Third corner of a triangular facet given the other two.
    pub fn other_point(&self, p1: PointId, p2: PointId) -> Option<PointId> {
        if !self.is_triangle() || !self.corners.contains(&p1) || !self.corners.contains(&p2) {
            return None;
        }
        self.corners.iter().copied().find(|&p| p != p1 && p != p2)
    }

    /// Whether the facet bounds the given volume cell.
    pub fn is_registered(&self, vc: VolumeCellId) -> bool {
        self.volume_cells.contains(&vc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn facet_with(corners: Vec<PointId>) -> Facet {
        let mut sides: SlotMap<SideId, ()> = SlotMap::with_key();
        let side = sides.insert(());
        Facet::new(side, false, Cycle::new(corners.clone()), corners, false)
    }

    fn ids(n: usize) -> Vec<PointId> {
        let mut map: SlotMap<PointId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_corner_equals() {
        let p = ids(4);
        let f = facet_with(p.clone());
        assert!(f.corner_equals(&[p[2], p[3], p[0], p[1]]));
        assert!(f.corner_equals(&[p[1], p[0], p[3], p[2]]));
        assert!(!f.corner_equals(&[p[0], p[2], p[1], p[3]]));
    }

    #[test]
    fn test_other_point() {
        let p = ids(4);
        let tri = facet_with(p[..3].to_vec());
        assert_eq!(tri.other_point(p[0], p[2]), Some(p[1]));
        assert_eq!(tri.other_point(p[0], p[3]), None);

        let quad = facet_with(p.clone());
        assert_eq!(quad.other_point(p[0], p[1]), None);
    }

    #[test]
    fn test_touches() {
        let p = ids(5);
        let a = facet_with(p[..3].to_vec());
        let b = facet_with(vec![p[2], p[3], p[4]]);
        let c = facet_with(vec![p[3], p[4], p[0]]);
        assert!(a.touches(&b));
        assert!(a.touches(&c));
        let d = facet_with(vec![p[3], p[4], p[1]]);
        assert!(b.touches(&d));
    }

    #[test]
    fn test_cut_surface_position() {
        let p = ids(3);
        let mut sides: SlotMap<SideId, ()> = SlotMap::with_key();
        let side = sides.insert(());
        let f = Facet::new(side, true, Cycle::new(p.clone()), p, true);
        assert_eq!(f.position(), Position::OnCutSurface);
        assert!(f.on_cut_side());
    }
}
