//! Outward orientation of the facets bounding a volume cell.
//!
//! Facets are linked through shared edges. Walking the edge graph
//! breadth-first fixes the relative orientation of each connected
//! component; the divergence-theorem volume of each component then decides
//! the global sign. The component with the largest absolute volume is the
//! outer shell and must enclose positive volume; every other component is
//! an interior void and must enclose negative volume.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use log::trace;
use xcut_kernel_math::{newell_normal, Vec3};

use crate::volume_cell::FacetOrientation;
use crate::{CutError, CutMesh, FacetId, PointId, Result, VolumeCellId};

impl CutMesh {
    /// Orient every facet of `vc` so that its normal points out of the cell.
    ///
    /// Facet edges are cut at every point of the cell lying on them, so a
    /// facet carrying edge points still meets a neighbour that does not.
    /// Edges shared by more than two facets of the cell are ignored while
    /// propagating.
    ///
    /// # Errors
    ///
    /// [`CutError::NonOrientable`] when two facets sharing an edge cannot be
    /// made consistent.
    pub fn orient_volume_cell(&mut self, vc: VolumeCellId) -> Result<()> {
        let facets: Vec<FacetId> = self.volume_cells[vc].facets.iter().map(|&(f, _)| f).collect();
        let n = facets.len();

        let mut cell_points: BTreeSet<PointId> = BTreeSet::new();
        for &facet in &facets {
            let f = &self.facets[facet];
            cell_points.extend(f.points.points());
            for &h in &f.holes {
                cell_points.extend(self.facets[h].points.points());
            }
        }
        let cell_points: Vec<PointId> = cell_points.into_iter().collect();

        // Undirected edge -> (facet index, runs from low to high pid).
        let mut edges: BTreeMap<(usize, usize), Vec<(usize, bool)>> = BTreeMap::new();
        for (i, &facet) in facets.iter().enumerate() {
            for (a, b) in self.boundary_edges(facet) {
                for (a, b) in self.split_edge(a, b, &cell_points) {
                    let (pa, pb) = (self.points[a].pid, self.points[b].pid);
                    edges
                        .entry((pa.min(pb), pa.max(pb)))
                        .or_default()
                        .push((i, pa < pb));
                }
            }
        }

        // Neighbour j relative to i: `true` when both run the shared edge
        // the same way, so one of them must be flipped.
        let mut adjacency: Vec<Vec<(usize, bool)>> = vec![Vec::new(); n];
        for (edge, users) in &edges {
            match users.as_slice() {
                [(i, di), (j, dj)] if i != j => {
                    adjacency[*i].push((*j, di == dj));
                    adjacency[*j].push((*i, di == dj));
                }
                [_] | [_, _] => {}
                _ => trace!("edge {edge:?} shared by {} facets, not followed", users.len()),
            }
        }

        let mut flip = vec![false; n];
        let mut visited = vec![false; n];
        let mut components: Vec<Vec<usize>> = Vec::new();
        for seed in 0..n {
            if visited[seed] {
                continue;
            }
            visited[seed] = true;
            let mut component = vec![seed];
            let mut queue = VecDeque::from([seed]);
            while let Some(i) = queue.pop_front() {
                for &(j, same) in &adjacency[i] {
                    let want = flip[i] ^ same;
                    if !visited[j] {
                        visited[j] = true;
                        flip[j] = want;
                        trace!("facet {j} takes flip {want} from facet {i}");
                        component.push(j);
                        queue.push_back(j);
                    } else if flip[j] != want {
                        return Err(CutError::NonOrientable {
                            volume_cell: vc,
                            facet_a: facets[i],
                            facet_b: facets[j],
                        });
                    }
                }
            }
            components.push(component);
        }

        let volumes: Vec<f64> = components
            .iter()
            .map(|component| {
                component
                    .iter()
                    .map(|&i| {
                        let v = self.facet_volume_term(facets[i]);
                        if flip[i] {
                            -v
                        } else {
                            v
                        }
                    })
                    .sum()
            })
            .collect();
        let outer = volumes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(k, _)| k);

        for (k, component) in components.iter().enumerate() {
            let wrong_sign = if Some(k) == outer {
                volumes[k] < 0.0
            } else {
                volumes[k] > 0.0
            };
            if wrong_sign {
                trace!("reversing component {k} with volume {:e}", volumes[k]);
                for &i in component {
                    flip[i] = !flip[i];
                }
            }
        }

        for (entry, &f) in self.volume_cells[vc].facets.iter_mut().zip(&flip) {
            entry.1 = FacetOrientation::from_flip(f);
        }
        Ok(())
    }

    /// Directed boundary edges of a facet: the outer loop as stored, each
    /// hole loop running against it.
    fn boundary_edges(&self, facet: FacetId) -> Vec<(PointId, PointId)> {
        let f = &self.facets[facet];
        let mut edges: Vec<(PointId, PointId)> = f.points.edges().collect();
        let outer_normal = newell_normal(&self.coords(f.points.points()));
        for &h in &f.holes {
            let hole = &self.facets[h].points;
            let same_winding = newell_normal(&self.coords(hole.points())).dot(&outer_normal) > 0.0;
            if same_winding {
                edges.extend(hole.edges().map(|(a, b)| (b, a)));
            } else {
                edges.extend(hole.edges());
            }
        }
        edges
    }

    /// Pieces of the directed edge `a -> b` between the points of `candidates`
    /// lying on it, in order from `a` to `b`.
    fn split_edge(&self, a: PointId, b: PointId, candidates: &[PointId]) -> Vec<(PointId, PointId)> {
        let (xa, xb) = (self.points[a].x, self.points[b].x);
        let d = xb - xa;
        let len = d.norm();
        if len == 0.0 {
            return vec![(a, b)];
        }
        let reach = self.tolerance().point_merge.max(self.tolerance().collinearity * len);
        let mut inner: Vec<(f64, PointId)> = candidates
            .iter()
            .filter(|&&p| p != a && p != b)
            .filter_map(|&p| {
                let x = self.points[p].x;
                let t = (x - xa).dot(&d) / (len * len);
                let off = (x - (xa + d * t)).norm();
                (t > 0.0 && t < 1.0 && off <= reach).then_some((t, p))
            })
            .collect();
        if inner.is_empty() {
            return vec![(a, b)];
        }
        inner.sort_by(|x, y| x.0.total_cmp(&y.0));
        let chain: Vec<PointId> = std::iter::once(a)
            .chain(inner.into_iter().map(|(_, p)| p))
            .chain(std::iter::once(b))
            .collect();
        chain.windows(2).map(|w| (w[0], w[1])).collect()
    }

    /// Contribution of a facet, in stored order, to the enclosed volume:
    /// `(1/6) p0 . N` with `N` the Newell vector minus the hole vectors.
    fn facet_volume_term(&self, facet: FacetId) -> f64 {
        let f = &self.facets[facet];
        let points = self.coords(f.points.points());
        let Some(p0) = points.first() else {
            return 0.0;
        };
        let outer = newell_normal(&points);
        let mut normal: Vec3 = outer;
        for &h in &f.holes {
            let hole = newell_normal(&self.coords(self.facets[h].points.points()));
            if hole.dot(&outer) > 0.0 {
                normal -= hole;
            } else {
                normal += hole;
            }
        }
        p0.coords.dot(&normal) / 6.0
    }
}
