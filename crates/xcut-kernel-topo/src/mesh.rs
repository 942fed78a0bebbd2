//! Arena storage for the cut data of one background element.

use slotmap::SlotMap;
use xcut_kernel_fem::{CellType, IntegrationRule, ParentElement};
use xcut_kernel_math::{newell_normal, CutTolerance, Point3, Vec3};
use xcut_kernel_tessellate::{self as tessellate, TessellateError};

use crate::boundary_cell::{ArbitraryCell, FixedCell};
use crate::facet::Decomposition;
use crate::{
    BoundaryCell, BoundaryCellId, CutError, Cycle, Facet, FacetId, Point, PointId, Position,
    Result, Side, SideId, SideKind, VolumeCell, VolumeCellId,
};

/// Points, sides, facets, boundary cells and volume cells of one cut element.
///
/// All entities live in slotmap arenas and refer to each other by key. The
/// tolerance is fixed at construction. Memoized facet decompositions are
/// filled through `&self`, so a finished mesh can be shared between readers.
#[derive(Debug)]
pub struct CutMesh {
    tol: CutTolerance,
    pub(crate) points: SlotMap<PointId, Point>,
    pub(crate) sides: SlotMap<SideId, Side>,
    pub(crate) facets: SlotMap<FacetId, Facet>,
    pub(crate) boundary_cells: SlotMap<BoundaryCellId, BoundaryCell>,
    pub(crate) volume_cells: SlotMap<VolumeCellId, VolumeCell>,
}

impl CutMesh {
    /// Create an empty mesh.
    pub fn new(tol: CutTolerance) -> Self {
        Self {
            tol,
            points: SlotMap::with_key(),
            sides: SlotMap::with_key(),
            facets: SlotMap::with_key(),
            boundary_cells: SlotMap::with_key(),
            volume_cells: SlotMap::with_key(),
        }
    }

    /// Tolerances of this mesh.
    pub fn tolerance(&self) -> &CutTolerance {
        &self.tol
    }

    // ---------------------------------------------------------------------
    // Points and sides
    // ---------------------------------------------------------------------

    /// Add a point, merging it into an existing point closer than
    /// `point_merge`.
    pub fn add_point(&mut self, x: Point3) -> PointId {
        self.add_point_with_reference(x, x)
    }

    /// Add a point with separate reference coordinates.
    ///
    /// Merging compares current coordinates and keeps the existing point
    /// unchanged.
    pub fn add_point_with_reference(&mut self, x: Point3, x_ref: Point3) -> PointId {
        if let Some((id, _)) = self
            .points
            .iter()
            .find(|(_, p)| self.tol.points_equal(&p.x, &x))
        {
            return id;
        }
        let pid = self.points.len();
        self.points.insert(Point {
            pid,
            x,
            x_ref,
            position: Position::Undecided,
        })
    }

    /// Point by key.
    pub fn point(&self, id: PointId) -> &Point {
        &self.points[id]
    }

    /// All points in insertion order.
    pub fn points(&self) -> impl Iterator<Item = (PointId, &Point)> {
        self.points.iter()
    }

    /// Set the position of a point.
    pub fn set_point_position(&mut self, id: PointId, position: Position) {
        self.points[id].position = position;
    }

    /// Add a side with its point cycle.
    pub fn add_side(&mut self, kind: SideKind, marked: bool, points: &[PointId]) -> SideId {
        let sid = self.sides.len();
        self.sides.insert(Side {
            sid,
            kind,
            marked,
            cycle: Cycle::new(points.iter().copied()),
            facets: Vec::new(),
        })
    }

    /// Side by key.
    pub fn side(&self, id: SideId) -> &Side {
        &self.sides[id]
    }

    pub(crate) fn coords(&self, ids: &[PointId]) -> Vec<Point3> {
        ids.iter().map(|&p| self.points[p].x).collect()
    }

    fn pids(&self, ids: &[PointId]) -> Vec<usize> {
        ids.iter().map(|&p| self.points[p].pid).collect()
    }

    // ---------------------------------------------------------------------
    // Facets
    // ---------------------------------------------------------------------

    /// Create a facet on `side` from an ordered point list.
    ///
    /// Corner points are derived immediately. A cut-surface facet marks
    /// itself and its points as lying on the cut surface.
    ///
    /// # Errors
    ///
    /// [`CutError::DegenerateFacet`] when fewer than three distinct points
    /// are given.
    pub fn new_facet(
        &mut self,
        points: &[PointId],
        side: SideId,
        cut_surface: bool,
    ) -> Result<FacetId> {
        let cycle = Cycle::new(points.iter().copied());
        let mut distinct = cycle.points().to_vec();
        distinct.sort();
        distinct.dedup();
        if distinct.len() < 3 {
            return Err(CutError::DegenerateFacet {
                side: self.sides[side].sid,
                pids: self.pids(points),
            });
        }

        let corner_idx = tessellate::corner_points(&self.coords(cycle.points()), &self.tol);
        let corners: Vec<PointId> = corner_idx.iter().map(|&i| cycle.points()[i]).collect();

        if cut_surface {
            for &p in cycle.points() {
                self.points[p].position = Position::OnCutSurface;
            }
        }

        let cut_side = self.sides[side].is_cut_side();
        let id = self
            .facets
            .insert(Facet::new(side, cut_side, cycle, corners, cut_surface));
        self.sides[side].facets.push(id);
        Ok(id)
    }

    /// Facet by key.
    pub fn facet(&self, id: FacetId) -> &Facet {
        &self.facets[id]
    }

    /// All facets in insertion order.
    pub fn facets(&self) -> impl Iterator<Item = (FacetId, &Facet)> {
        self.facets.iter()
    }

    /// Register `hole` as an excluded region of `facet`.
    ///
    /// A facet with holes is never split, only triangulated.
    pub fn add_hole(&mut self, facet: FacetId, hole: FacetId) -> Result<()> {
        if facet == hole {
            return Err(CutError::InvalidInput("a facet cannot be its own hole".into()));
        }
        let f = &mut self.facets[facet];
        if !f.holes.contains(&hole) {
            f.holes.push(hole);
            f.reset_caches();
        }
        Ok(())
    }

    /// Set the position of a facet.
    pub fn set_facet_position(&mut self, facet: FacetId, position: Position) {
        self.facets[facet].position = position;
    }

    /// Move a facet to another parent side.
    pub fn exchange_side(&mut self, facet: FacetId, new_side: SideId) {
        let old = self.facets[facet].side;
        if old == new_side {
            return;
        }
        self.sides[old].facets.retain(|&f| f != facet);
        self.sides[new_side].facets.push(facet);
        let cut_side = self.sides[new_side].is_cut_side();
        let f = &mut self.facets[facet];
        f.side = new_side;
        f.cut_side = cut_side;
    }

    /// Whether the facet lies on a marked side of the background element.
    pub fn on_marked_background_side(&self, facet: FacetId) -> bool {
        let side = &self.sides[self.facets[facet].side];
        side.is_marked() && !side.is_cut_side()
    }

    /// Whether boundary cells are needed on this facet.
    pub fn on_boundary_cell_side(&self, facet: FacetId) -> bool {
        self.facets[facet].on_cut_side() || self.on_marked_background_side(facet)
    }

    /// Whether both facets lie on the same cutter side.
    pub fn share_same_cut_side(&self, a: FacetId, b: FacetId) -> bool {
        let (fa, fb) = (&self.facets[a], &self.facets[b]);
        fa.on_cut_side() && fa.side == fb.side
    }

    fn hole_corners(&self, facet: &Facet) -> Vec<Vec<PointId>> {
        facet
            .holes
            .iter()
            .map(|&h| self.facets[h].corners.clone())
            .filter(|c| c.len() >= 3)
            .collect()
    }

    /// Whether the facet corners (and hole corners) lie in one plane within
    /// `planarity`. Memoized.
    pub fn is_facet_planar(&self, facet: FacetId) -> bool {
        let f = &self.facets[facet];
        *f.planar.get_or_init(|| {
            if f.corners.len() < 3 {
                return false;
            }
            let mut ids = f.corners.clone();
            ids.extend(self.hole_corners(f).into_iter().flatten());
            tessellate::is_planar(&self.coords(&ids), &self.tol)
        })
    }

    /// Whether the facet is hole-free and convex.
    pub fn is_facet_convex(&self, facet: FacetId) -> bool {
        let f = &self.facets[facet];
        !f.has_holes() && tessellate::is_convex(&self.coords(&f.corners), &self.tol)
    }

    /// Triangulation of the facet minus its holes. Memoized.
    ///
    /// Triangles follow the stored point order, use only corner points and
    /// never have zero area. A hairline facet may end up with no triangles
    /// at all.
    ///
    /// # Errors
    ///
    /// [`CutError::DegenerateFacet`] when fewer than three corners remain,
    /// [`CutError::SelfIntersectingFacet`] when the corner cycle or a hole
    /// crosses itself, [`CutError::TriangulationFailed`] when ear clipping
    /// gets stuck.
    pub fn facet_triangulation(&self, facet: FacetId) -> Result<&[Vec<PointId>]> {
        let f = &self.facets[facet];
        if let Some(tris) = f.triangulation.get() {
            return Ok(tris);
        }
        let tris = self.triangulate_facet(f)?;
        Ok(f.triangulation.get_or_init(|| tris))
    }

    fn triangulate_facet(&self, f: &Facet) -> Result<Decomposition> {
        let side = self.sides[f.side].sid;
        let degenerate = || CutError::DegenerateFacet {
            side,
            pids: self.pids(f.points.points()),
        };
        if f.corners.len() < 3 {
            return Err(degenerate());
        }
        let holes = self.hole_corners(f);
        let hole_coords: Vec<Vec<Point3>> = holes.iter().map(|h| self.coords(h)).collect();
        let ids: Vec<PointId> = f
            .corners
            .iter()
            .copied()
            .chain(holes.iter().flatten().copied())
            .collect();

        match tessellate::triangulate(&self.coords(&f.corners), &hole_coords, &self.tol) {
            Ok(tris) => Ok(tris
                .into_iter()
                .map(|t| t.iter().map(|&i| ids[i]).collect())
                .collect()),
            Err(TessellateError::ZeroNormal | TessellateError::TooFewPoints(_)) => Err(degenerate()),
            Err(TessellateError::SelfIntersecting { edge_a, edge_b }) => {
                Err(CutError::SelfIntersectingFacet {
                    side,
                    pids: self.pids(f.points.points()),
                    edge_a,
                    edge_b,
                })
            }
            Err(source) => Err(CutError::TriangulationFailed {
                side,
                pids: self.pids(f.points.points()),
                source,
            }),
        }
    }

    /// Coarse split of a planar, convex, hole-free facet into quadrilaterals
    /// plus at most one triangle. Memoized.
    ///
    /// `None` whenever the facet has holes, is not planar, or is not convex;
    /// callers then fall back to [`CutMesh::facet_triangulation`].
    pub fn facet_split_cells(&self, facet: FacetId) -> Option<&[Vec<PointId>]> {
        let f = &self.facets[facet];
        f.split
            .get_or_init(|| {
                if f.has_holes() || !self.is_facet_planar(facet) {
                    return None;
                }
                let cells = tessellate::split_convex(&self.coords(&f.corners), &self.tol)?;
                Some(
                    cells
                        .into_iter()
                        .map(|c| c.iter().map(|&i| f.corners[i]).collect())
                        .collect(),
                )
            })
            .as_deref()
    }

    /// Sub-polygons used to create boundary cells.
    ///
    /// With `prefer_split` the split cells are used when available; every
    /// other facet is triangulated.
    pub fn facet_decomposition(&self, facet: FacetId, prefer_split: bool) -> Result<&[Vec<PointId>]> {
        if prefer_split {
            if let Some(cells) = self.facet_split_cells(facet) {
                return Ok(cells);
            }
            log::debug!(
                "facet {:?} cannot be split, triangulating",
                self.pids(&self.facets[facet].corners)
            );
        }
        self.facet_triangulation(facet)
    }

    /// Whether two facets sharing an edge traverse it in opposite
    /// directions.
    ///
    /// Full point cycles are compared first, then corner cycles (one facet
    /// may carry an edge point the other lacks). `None` when no edge is
    /// shared.
    pub fn have_consistent_normal(&self, a: FacetId, b: FacetId) -> Option<bool> {
        let (fa, fb) = (&self.facets[a], &self.facets[b]);
        let shared = |ca: &Cycle, cb: &Cycle| {
            ca.edges()
                .find_map(|(p, q)| cb.edge_direction(p, q))
                .map(|same| !same)
        };
        shared(&fa.points, &fb.points).or_else(|| {
            shared(
                &Cycle::new(fa.corners.iter().copied()),
                &Cycle::new(fb.corners.iter().copied()),
            )
        })
    }

    /// Like [`CutMesh::have_consistent_normal`], but with both facets in
    /// their outward orientation for `vc`.
    pub fn have_consistent_orientation(
        &self,
        vc: VolumeCellId,
        a: FacetId,
        b: FacetId,
    ) -> Option<bool> {
        let cell = &self.volume_cells[vc];
        let ra = cell.orientation(a)?.is_reversed();
        let rb = cell.orientation(b)?.is_reversed();
        self.have_consistent_normal(a, b)
            .map(|consistent| consistent ^ (ra != rb))
    }

    /// Facet corners in the local coordinates of `parent`.
    pub fn corner_points_local(
        &self,
        facet: FacetId,
        parent: &ParentElement,
        shadow: bool,
    ) -> Result<Vec<Point3>> {
        let elem = parent.mapping_element(shadow);
        self.facets[facet]
            .corners
            .iter()
            .map(|&p| {
                elem.local_coordinates(&self.points[p].x)
                    .map_err(CutError::from)
            })
            .collect()
    }

    /// Area of the facet minus its holes, projected onto the plane of the
    /// outer Newell normal. Equals the polygon area for planar facets.
    pub fn facet_area(&self, facet: FacetId) -> f64 {
        let f = &self.facets[facet];
        let outer = newell_normal(&self.coords(f.points.points()));
        let Some(n) = outer.try_normalize(0.0) else {
            return 0.0;
        };
        let holes: f64 = f
            .holes
            .iter()
            .map(|&h| newell_normal(&self.coords(self.facets[h].points.points())).dot(&n).abs())
            .sum();
        0.5 * (outer.norm() - holes)
    }

    /// Check that the triangulation covers the facet area within
    /// `rel_tol`.
    ///
    /// Triangle areas are projected like [`CutMesh::facet_area`], so warped
    /// facets compare equal as well.
    pub fn test_facet_area(&self, facet: FacetId, rel_tol: f64) -> Result<()> {
        let f = &self.facets[facet];
        let polygon = self.facet_area(facet);
        let n = newell_normal(&self.coords(f.points.points()))
            .try_normalize(0.0)
            .unwrap_or_else(Vec3::zeros);
        let cells: f64 = self
            .facet_triangulation(facet)?
            .iter()
            .map(|t| 0.5 * newell_normal(&self.coords(t)).dot(&n))
            .sum();
        if (polygon - cells).abs() > rel_tol * polygon.abs().max(f64::MIN_POSITIVE) {
            return Err(CutError::FacetAreaMismatch {
                pids: self.pids(f.points.points()),
                polygon,
                cells,
            });
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Volume cells
    // ---------------------------------------------------------------------

    /// Create an empty volume cell.
    pub fn new_volume_cell(&mut self, position: Position) -> VolumeCellId {
        self.volume_cells.insert(VolumeCell {
            position,
            ..VolumeCell::default()
        })
    }

    /// Volume cell by key.
    pub fn volume_cell(&self, id: VolumeCellId) -> &VolumeCell {
        &self.volume_cells[id]
    }

    /// All volume cells in creation order.
    pub fn volume_cells(&self) -> impl Iterator<Item = (VolumeCellId, &VolumeCell)> {
        self.volume_cells.iter()
    }

    /// Link a facet and a volume cell in both directions.
    ///
    /// Registering the same pair twice is a no-op.
    ///
    /// # Errors
    ///
    /// [`CutError::TooManyVolumeCells`] when the facet already bounds two
    /// other volume cells.
    pub fn register(&mut self, facet: FacetId, vc: VolumeCellId) -> Result<()> {
        let f = &self.facets[facet];
        if f.is_registered(vc) {
            return Ok(());
        }
        if f.volume_cells.len() >= 2 {
            return Err(CutError::TooManyVolumeCells {
                pids: self.pids(f.points.points()),
            });
        }
        self.facets[facet].volume_cells.push(vc);
        self.volume_cells[vc]
            .facets
            .push((facet, Default::default()));
        Ok(())
    }

    /// Remove the link between a facet and a volume cell.
    pub fn disconnect_volume(&mut self, facet: FacetId, vc: VolumeCellId) {
        self.facets[facet].volume_cells.retain(|&v| v != vc);
        self.volume_cells[vc].facets.retain(|&(f, _)| f != facet);
    }

    /// The volume cell on the far side of `facet`, seen from `vc`.
    pub fn neighbor(&self, facet: FacetId, vc: VolumeCellId) -> Option<VolumeCellId> {
        let f = &self.facets[facet];
        if !f.is_registered(vc) {
            return None;
        }
        f.volume_cells.iter().copied().find(|&v| v != vc)
    }

    /// Facet points in the outward order for `vc`.
    pub fn oriented_points(&self, vc: VolumeCellId, facet: FacetId) -> Vec<PointId> {
        let f = &self.facets[facet];
        let reversed = self.volume_cells[vc]
            .orientation(facet)
            .is_some_and(|o| o.is_reversed());
        if reversed {
            f.points.reversed().points().to_vec()
        } else {
            f.points.points().to_vec()
        }
    }

    // ---------------------------------------------------------------------
    // Boundary cells
    // ---------------------------------------------------------------------

    /// Boundary cell by key.
    pub fn boundary_cell(&self, id: BoundaryCellId) -> &BoundaryCell {
        &self.boundary_cells[id]
    }

    /// Mutable boundary cell by key.
    pub fn boundary_cell_mut(&mut self, id: BoundaryCellId) -> &mut BoundaryCell {
        &mut self.boundary_cells[id]
    }

    /// Create a point cell. Always valid.
    pub fn new_point1_cell(
        &mut self,
        vc: VolumeCellId,
        facet: FacetId,
        points: &[PointId],
    ) -> Result<Option<BoundaryCellId>> {
        self.check_cell_corners(vc, facet, points)?;
        let (x, x_ref) = self.corner_coords(points);
        let cell = BoundaryCell::Point1(FixedCell::new(CellType::Point1, facet, points, &x, &x_ref)?);
        Ok(self.insert_cell(vc, cell))
    }

    /// Create a line cell; `Ok(None)` when shorter than `min_line_length`.
    pub fn new_line2_cell(
        &mut self,
        vc: VolumeCellId,
        facet: FacetId,
        points: &[PointId],
    ) -> Result<Option<BoundaryCellId>> {
        self.check_cell_corners(vc, facet, points)?;
        let (x, x_ref) = self.corner_coords(points);
        let cell = BoundaryCell::Line2(FixedCell::new(CellType::Line2, facet, points, &x, &x_ref)?);
        Ok(self.insert_cell(vc, cell))
    }

    /// Create a triangle cell; `Ok(None)` when degenerate.
    pub fn new_tri3_cell(
        &mut self,
        vc: VolumeCellId,
        facet: FacetId,
        points: &[PointId],
    ) -> Result<Option<BoundaryCellId>> {
        self.check_cell_corners(vc, facet, points)?;
        let (x, x_ref) = self.corner_coords(points);
        let cell = BoundaryCell::Tri3(FixedCell::new(CellType::Tri3, facet, points, &x, &x_ref)?);
        Ok(self.insert_cell(vc, cell))
    }

    /// Create a quadrilateral cell; `Ok(None)` when degenerate.
    pub fn new_quad4_cell(
        &mut self,
        vc: VolumeCellId,
        facet: FacetId,
        points: &[PointId],
    ) -> Result<Option<BoundaryCellId>> {
        self.check_cell_corners(vc, facet, points)?;
        let (x, x_ref) = self.corner_coords(points);
        let cell = BoundaryCell::Quad4(FixedCell::new(CellType::Quad4, facet, points, &x, &x_ref)?);
        Ok(self.insert_cell(vc, cell))
    }

    /// Create a cell with an explicit rule (physical points, scaled weights)
    /// and normal; `Ok(None)` when the rule weights sum to less than
    /// `min_cell_area`.
    pub fn new_arbitrary_cell(
        &mut self,
        vc: VolumeCellId,
        facet: FacetId,
        points: &[PointId],
        rule: IntegrationRule,
        normal: Vec3,
        degree: usize,
    ) -> Result<Option<BoundaryCellId>> {
        if points.is_empty() {
            return Err(CutError::InvalidInput("arbitrary cell without points".into()));
        }
        self.check_cell_corners(vc, facet, points)?;
        let (x, x_ref) = self.corner_coords(points);
        let cell = BoundaryCell::Arbitrary(ArbitraryCell {
            facet,
            points: points.to_vec(),
            x,
            x_ref,
            rule,
            normal,
            degree,
        });
        Ok(self.insert_cell(vc, cell))
    }

    /// Cell corners must be points of the facet (or of its holes), and the
    /// facet must bound `vc`.
    fn check_cell_corners(&self, vc: VolumeCellId, facet: FacetId, points: &[PointId]) -> Result<()> {
        let f = &self.facets[facet];
        if !f.is_registered(vc) {
            return Err(CutError::FacetNotInVolumeCell {
                pids: self.pids(f.points.points()),
                volume_cell: vc,
            });
        }
        let on_facet = |p: &PointId| {
            f.points.points().contains(p)
                || f.holes.iter().any(|&h| self.facets[h].points.points().contains(p))
        };
        if let Some(&p) = points.iter().find(|p| !on_facet(p)) {
            return Err(CutError::ForeignCorner {
                corner: self.points[p].pid,
                facet_pids: self.pids(f.points.points()),
            });
        }
        Ok(())
    }

    fn corner_coords(&self, points: &[PointId]) -> (Vec<Point3>, Vec<Point3>) {
        points
            .iter()
            .map(|&p| (self.points[p].x, self.points[p].x_ref))
            .unzip()
    }

    fn insert_cell(&mut self, vc: VolumeCellId, cell: BoundaryCell) -> Option<BoundaryCellId> {
        if !cell.is_valid(&self.tol) {
            log::debug!(
                "rejecting degenerate {} cell on points {:?}",
                cell.cell_type().map_or("arbitrary", |t| t.name()),
                self.pids(cell.points())
            );
            return None;
        }
        let facet = cell.facet();
        let id = self.boundary_cells.insert(cell);
        self.facets[facet].boundary_cells.push(id);
        self.volume_cells[vc].boundary_cells.push(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use xcut_kernel_math::polygon_area;

    /// Mesh with a single cut side holding the given loop as one facet.
    fn single_facet(coords: &[[f64; 3]]) -> (CutMesh, FacetId, Vec<PointId>) {
        let mut mesh = CutMesh::new(CutTolerance::default());
        let ids: Vec<PointId> = coords
            .iter()
            .map(|c| mesh.add_point(Point3::new(c[0], c[1], c[2])))
            .collect();
        let side = mesh.add_side(SideKind::CutSurface { id: 0 }, false, &ids);
        let facet = mesh.new_facet(&ids, side, true).unwrap();
        (mesh, facet, ids)
    }

    fn cell_area_sum(mesh: &CutMesh, cells: &[Vec<PointId>]) -> f64 {
        cells.iter().map(|c| polygon_area(&mesh.coords(c))).sum()
    }

    #[test]
    fn test_point_merge() {
        let mut mesh = CutMesh::new(CutTolerance::default());
        let a = mesh.add_point(Point3::new(1.0, 0.0, 0.0));
        let b = mesh.add_point(Point3::new(1.0 + 1e-14, 0.0, 0.0));
        let c = mesh.add_point(Point3::new(1.0 + 1e-6, 0.0, 0.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(mesh.point(c).pid(), 1);
    }

    #[test]
    fn test_degenerate_facet_is_an_error() {
        let mut mesh = CutMesh::new(CutTolerance::default());
        let a = mesh.add_point(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_point(Point3::new(1.0, 0.0, 0.0));
        let side = mesh.add_side(SideKind::ElementFace { face: 3 }, false, &[a, b]);
        let err = mesh.new_facet(&[a, b, a, b], side, false).unwrap_err();
        assert_eq!(
            err,
            CutError::DegenerateFacet {
                side: 0,
                pids: vec![0, 1, 0, 1]
            }
        );
    }

    #[test]
    fn test_cut_surface_marks_points() {
        let (mesh, facet, ids) = single_facet(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert!(mesh.facet(facet).on_cut_side());
        assert!(mesh.on_boundary_cell_side(facet));
        assert!(ids
            .iter()
            .all(|&p| mesh.point(p).position() == Position::OnCutSurface));
    }

    #[test]
    fn test_corner_points_skip_edge_points() {
        let (mesh, facet, ids) = single_facet(&[
            [0.0, 0.0, 0.0],
            [0.5, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        assert_eq!(mesh.facet(facet).corner_points(), &[ids[0], ids[2], ids[3], ids[4]]);
        assert!(mesh.is_facet_planar(facet));
        assert!(mesh.is_facet_convex(facet));
    }

    #[test]
    fn test_triangulation_is_memoized_and_additive() {
        let (mesh, facet, _) = single_facet(&[
            [0.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
            [3.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 3.0, 0.0],
            [0.0, 3.0, 0.0],
        ]);
        let first: Vec<Vec<PointId>> = mesh.facet_triangulation(facet).unwrap().to_vec();
        let second = mesh.facet_triangulation(facet).unwrap();
        assert_eq!(first.as_slice(), second);
        assert_relative_eq!(cell_area_sum(&mesh, &first), 5.0, max_relative = 1e-12);
        assert_relative_eq!(mesh.facet_area(facet), 5.0, max_relative = 1e-12);
        mesh.test_facet_area(facet, 1e-8).unwrap();

        // Non-convex: no split.
        assert!(mesh.facet_split_cells(facet).is_none());
    }

    #[test]
    fn test_split_is_memoized_and_additive() {
        let coords: Vec<[f64; 3]> = (0..6)
            .map(|k| {
                let a = std::f64::consts::TAU * k as f64 / 6.0;
                [a.cos(), a.sin(), 0.25]
            })
            .collect();
        let (mesh, facet, _) = single_facet(&coords);
        let first = mesh.facet_split_cells(facet).unwrap().to_vec();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|c| c.len() == 4));
        assert_eq!(mesh.facet_split_cells(facet).unwrap(), first.as_slice());
        assert_relative_eq!(
            cell_area_sum(&mesh, &first),
            mesh.facet_area(facet),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_non_planar_facet_is_triangulated() {
        let (mesh, facet, _) = single_facet(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.1],
            [0.0, 1.0, 0.0],
        ]);
        assert!(!mesh.is_facet_planar(facet));
        assert!(mesh.facet_split_cells(facet).is_none());
        let tris = mesh.facet_decomposition(facet, true).unwrap().to_vec();
        assert_eq!(tris.len(), 2);

        // Triangles are tilted against the Newell plane, so only their
        // projected areas add up to the facet area.
        assert!(cell_area_sum(&mesh, &tris) > mesh.facet_area(facet));
        mesh.test_facet_area(facet, 1e-12).unwrap();
    }

    #[test]
    fn test_facet_with_hole() {
        let mut mesh = CutMesh::new(CutTolerance::default());
        let outer: Vec<PointId> = [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]
            .iter()
            .map(|c| mesh.add_point(Point3::new(c[0], c[1], 1.0)))
            .collect();
        let inner: Vec<PointId> = [[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]]
            .iter()
            .map(|c| mesh.add_point(Point3::new(c[0], c[1], 1.0)))
            .collect();
        let side = mesh.add_side(SideKind::ElementFace { face: 5 }, true, &outer);
        let face = mesh.new_facet(&outer, side, false).unwrap();
        let hole = mesh.new_facet(&inner, side, false).unwrap();

        assert!(mesh.facet_split_cells(face).is_some());
        mesh.add_hole(face, hole).unwrap();
        assert!(mesh.facet_split_cells(face).is_none());

        let tris = mesh.facet_triangulation(face).unwrap().to_vec();
        assert_relative_eq!(cell_area_sum(&mesh, &tris), 12.0, max_relative = 1e-12);
        assert_relative_eq!(mesh.facet_area(face), 12.0, max_relative = 1e-12);
        assert!(mesh.on_marked_background_side(face));
        assert!(mesh.on_boundary_cell_side(face));
        assert!(mesh.add_hole(face, face).is_err());
    }

    #[test]
    fn test_self_intersecting_facet_is_an_error() {
        let (mesh, facet, _) = single_facet(&[
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, -1.0, 0.0],
            [1.0, 3.0, 0.0],
        ]);
        let err = mesh.facet_triangulation(facet).unwrap_err();
        match err {
            CutError::SelfIntersectingFacet { side, pids, .. } => {
                assert_eq!(side, 0);
                assert_eq!(pids, vec![0, 1, 2, 3, 4]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_collinear_facet_is_an_error() {
        let (mesh, facet, _) = single_facet(&[
            [0.0, 0.0, 0.0],
            [1.0, 1e-12, 0.0],
            [2.0, 0.0, 0.0],
        ]);
        assert!(mesh.facet(facet).corner_points().len() < 3);
        assert!(matches!(
            mesh.facet_triangulation(facet),
            Err(CutError::DegenerateFacet { side: 0, .. })
        ));
    }

    #[test]
    fn test_hairline_facet_has_no_cells() {
        let mut mesh = CutMesh::new(CutTolerance::default().with_min_cell_area(1e-6));
        let ids: Vec<PointId> = [[0.0, 0.0], [1.0, 1e-7], [2.0, 0.0]]
            .iter()
            .map(|c| mesh.add_point(Point3::new(c[0], c[1], 0.0)))
            .collect();
        let side = mesh.add_side(SideKind::CutSurface { id: 0 }, false, &ids);
        let facet = mesh.new_facet(&ids, side, true).unwrap();
        let vc = mesh.new_volume_cell(Position::Inside);
        mesh.register(facet, vc).unwrap();

        let tris = mesh.facet_triangulation(facet).unwrap().to_vec();
        assert_eq!(tris.len(), 1);
        assert_eq!(mesh.new_tri3_cell(vc, facet, &tris[0]).unwrap(), None);
        assert!(mesh.facet(facet).boundary_cells().is_empty());
    }

    #[test]
    fn test_have_consistent_normal() {
        let mut mesh = CutMesh::new(CutTolerance::default());
        let p: Vec<PointId> = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [2.0, 0.0]]
            .iter()
            .map(|c| mesh.add_point(Point3::new(c[0], c[1], 0.0)))
            .collect();
        let side = mesh.add_side(SideKind::CutSurface { id: 1 }, false, &p);
        let a = mesh.new_facet(&[p[0], p[1], p[2]], side, true).unwrap();
        let b = mesh.new_facet(&[p[0], p[2], p[3]], side, true).unwrap();
        let c = mesh.new_facet(&[p[0], p[3], p[2]], side, true).unwrap();
        let d = mesh.new_facet(&[p[1], p[4], p[2]], side, true).unwrap();
        let far = mesh.new_facet(&[p[3], p[4], p[1]], side, true).unwrap();

        assert_eq!(mesh.have_consistent_normal(a, b), Some(true));
        assert_eq!(mesh.have_consistent_normal(a, c), Some(false));
        assert_eq!(mesh.have_consistent_normal(a, d), Some(true));
        assert_eq!(mesh.have_consistent_normal(b, d), None);
        assert!(mesh.share_same_cut_side(a, far));
    }

    #[test]
    fn test_register_and_neighbor() {
        let (mut mesh, facet, _) = single_facet(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let inside = mesh.new_volume_cell(Position::Inside);
        let outside = mesh.new_volume_cell(Position::Outside);
        let third = mesh.new_volume_cell(Position::Undecided);

        mesh.register(facet, inside).unwrap();
        assert_eq!(mesh.neighbor(facet, inside), None);
        mesh.register(facet, outside).unwrap();
        mesh.register(facet, outside).unwrap();
        assert_eq!(mesh.neighbor(facet, inside), Some(outside));
        assert_eq!(mesh.neighbor(facet, outside), Some(inside));
        assert_eq!(mesh.neighbor(facet, third), None);

        let err = mesh.register(facet, third).unwrap_err();
        assert!(matches!(err, CutError::TooManyVolumeCells { .. }));

        mesh.disconnect_volume(facet, outside);
        assert_eq!(mesh.neighbor(facet, inside), None);
        assert!(mesh.volume_cell(outside).facets().is_empty());
        mesh.register(facet, third).unwrap();
    }

    #[test]
    fn test_boundary_cells_are_registered() {
        let (mut mesh, facet, ids) = single_facet(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        let vc = mesh.new_volume_cell(Position::Inside);
        mesh.register(facet, vc).unwrap();

        let quad = mesh.new_quad4_cell(vc, facet, &ids).unwrap().unwrap();
        let tri = mesh.new_tri3_cell(vc, facet, &ids[..3]).unwrap().unwrap();
        let line = mesh.new_line2_cell(vc, facet, &ids[..2]).unwrap().unwrap();
        let point = mesh.new_point1_cell(vc, facet, &ids[..1]).unwrap().unwrap();
        assert_eq!(mesh.facet(facet).boundary_cells(), &[quad, tri, line, point]);
        assert_eq!(mesh.volume_cell(vc).boundary_cells().len(), 4);
        assert_eq!(mesh.boundary_cell(quad).facet(), facet);

        // Collapsed corners are rejected without error.
        assert_eq!(mesh.new_tri3_cell(vc, facet, &[ids[0], ids[0], ids[1]]).unwrap(), None);
        assert!(matches!(
            mesh.new_tri3_cell(vc, facet, &ids),
            Err(CutError::WrongCornerCount { expected: 3, found: 4, .. })
        ));

        let rule = IntegrationRule::new(vec![Point3::new(0.5, 0.5, 0.0)], vec![1.0]).unwrap();
        let arb = mesh
            .new_arbitrary_cell(vc, facet, &ids, rule, Vec3::z(), 0)
            .unwrap();
        assert!(arb.is_some());
        let empty = IntegrationRule::empty();
        assert_eq!(
            mesh.new_arbitrary_cell(vc, facet, &ids, empty, Vec3::z(), 0).unwrap(),
            None
        );
    }

    #[test]
    fn test_cell_corners_must_belong_to_the_facet() {
        let mut mesh = CutMesh::new(CutTolerance::default());
        let p: Vec<PointId> = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
            .iter()
            .map(|c| mesh.add_point(Point3::new(c[0], c[1], 0.0)))
            .collect();
        let side = mesh.add_side(SideKind::CutSurface { id: 0 }, false, &p);
        let facet = mesh.new_facet(&p[..3], side, true).unwrap();
        let vc = mesh.new_volume_cell(Position::Inside);
        mesh.register(facet, vc).unwrap();

        let err = mesh.new_tri3_cell(vc, facet, &[p[1], p[3], p[2]]).unwrap_err();
        assert_eq!(
            err,
            CutError::ForeignCorner {
                corner: 3,
                facet_pids: vec![0, 1, 2]
            }
        );
        let rule = IntegrationRule::new(vec![Point3::new(0.5, 0.5, 0.0)], vec![1.0]).unwrap();
        assert!(matches!(
            mesh.new_arbitrary_cell(vc, facet, &[p[3]], rule, Vec3::z(), 0),
            Err(CutError::ForeignCorner { corner: 3, .. })
        ));
        assert!(mesh.facet(facet).boundary_cells().is_empty());
    }

    #[test]
    fn test_cell_facet_must_bound_the_volume_cell() {
        let (mut mesh, facet, ids) = single_facet(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let inside = mesh.new_volume_cell(Position::Inside);
        let outside = mesh.new_volume_cell(Position::Outside);
        mesh.register(facet, inside).unwrap();

        let err = mesh.new_tri3_cell(outside, facet, &ids).unwrap_err();
        assert_eq!(
            err,
            CutError::FacetNotInVolumeCell {
                pids: vec![0, 1, 2],
                volume_cell: outside
            }
        );
        assert!(mesh.volume_cell(outside).boundary_cells().is_empty());
        assert!(mesh.new_tri3_cell(inside, facet, &ids).unwrap().is_some());
    }

    #[test]
    fn test_exchange_side() {
        let (mut mesh, facet, ids) = single_facet(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let old = mesh.facet(facet).side();
        let face = mesh.add_side(SideKind::ElementFace { face: 0 }, false, &ids);
        mesh.exchange_side(facet, face);
        assert!(!mesh.facet(facet).on_cut_side());
        assert!(mesh.side(old).facets().is_empty());
        assert_eq!(mesh.side(face).facets(), &[facet]);
        assert!(!mesh.on_boundary_cell_side(facet));
    }

    #[test]
    fn test_corner_points_local() {
        let nodes = xcut_kernel_fem::shape::reference_nodes(CellType::Hex8).unwrap();
        let parent = ParentElement::new(CellType::Hex8, nodes).unwrap();
        let (mesh, facet, _) = single_facet(&[[0.5, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 0.5]]);
        let local = mesh.corner_points_local(facet, &parent, false).unwrap();
        assert_relative_eq!(local[1], Point3::new(0.0, 0.5, 0.0), epsilon = 1e-12);
    }
}
