//! Cut points.

use xcut_kernel_math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a point in the cut mesh.
    pub struct PointId;
}

/// Classification of a point, facet or volume cell relative to the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Position {
    /// Not classified yet.
    #[default]
    Undecided,
    /// Inside the embedded domain.
    Inside,
    /// Outside the embedded domain.
    Outside,
    /// On the cut surface itself.
    OnCutSurface,
}

/// A geometric location shared by facets and boundary cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub(crate) pid: usize,
    pub(crate) x: Point3,
    pub(crate) x_ref: Point3,
    pub(crate) position: Position,
}

impl Point {
    /// Stable point number, assigned in insertion order.
    pub fn pid(&self) -> usize {
        self.pid
    }

    /// Current coordinates.
    pub fn x(&self) -> &Point3 {
        &self.x
    }

    /// Reference-configuration coordinates.
    pub fn x_ref(&self) -> &Point3 {
        &self.x_ref
    }

    /// Position classification.
    pub fn position(&self) -> Position {
        self.position
    }
}
