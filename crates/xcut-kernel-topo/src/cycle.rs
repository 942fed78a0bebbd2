//! Closed point loops.

use crate::PointId;

/// An ordered, closed loop of points.
///
/// Consecutive repeats (including last to first) are collapsed on
/// construction, so no edge of a cycle is degenerate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Cycle {
    points: Vec<PointId>,
}

impl Cycle {
    /// Build a cycle, collapsing consecutive repeats.
    pub fn new(points: impl IntoIterator<Item = PointId>) -> Self {
        let mut out: Vec<PointId> = Vec::new();
        for p in points {
            if out.last() != Some(&p) {
                out.push(p);
            }
        }
        while out.len() > 1 && out.first() == out.last() {
            out.pop();
        }
        Self { points: out }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the cycle has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in loop order.
    pub fn points(&self) -> &[PointId] {
        &self.points
    }

    /// Whether `p` is on the cycle.
    pub fn contains(&self, p: PointId) -> bool {
        self.points.contains(&p)
    }

    /// Directed edges `(p_i, p_{i+1})`, closing back to the first point.
    pub fn edges(&self) -> impl Iterator<Item = (PointId, PointId)> + '_ {
        let n = self.points.len();
        (0..if n > 1 { n } else { 0 }).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Whether the undirected edge `{a, b}` is an edge of the cycle.
    pub fn contains_edge(&self, a: PointId, b: PointId) -> bool {
        self.edge_direction(a, b).is_some()
    }

    /// Direction of the edge `{a, b}` in the cycle.
    ///
    /// `Some(true)` when the cycle runs `a → b`, `Some(false)` when it runs
    /// `b → a`, `None` when `{a, b}` is not an edge.
    pub fn edge_direction(&self, a: PointId, b: PointId) -> Option<bool> {
        self.edges().find_map(|(p, q)| {
            if p == a && q == b {
                Some(true)
            } else if p == b && q == a {
                Some(false)
            } else {
                None
            }
        })
    }

    /// The same loop traversed backwards.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Whether `other` is the same loop up to rotation.
    pub fn same_loop(&self, other: &Cycle) -> bool {
        same_rotation(&self.points, &other.points)
    }

    /// Whether `other` is the same loop up to rotation and reflection.
    pub fn same_loop_any_direction(&self, other: &Cycle) -> bool {
        self.same_loop(other) || self.same_loop(&other.reversed())
    }
}

/// Whether two point lists describe the same loop up to rotation.
pub(crate) fn same_rotation(a: &[PointId], b: &[PointId]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    if a.is_empty() {
        return true;
    }
    let n = a.len();
    b.iter()
        .enumerate()
        .filter(|&(_, p)| *p == a[0])
        .any(|(shift, _)| (0..n).all(|i| a[i] == b[(shift + i) % n]))
}
