#![warn(missing_docs)]

//! Polygon tessellation for the xcut kernel.
//!
//! Works on plain coordinate slices so the algorithms stay independent of
//! the cut-mesh storage:
//! 1. Corner detection, planarity and convexity predicates
//! 2. Simplicity (self-intersection) checks in the polygon's own plane
//! 3. Triangulation by fan or ear clipping with hole bridging
//! 4. Coarse convex splitting into quadrilaterals

mod polygon;
mod split;
mod triangulate;

pub use polygon::{
    check_simple, corner_points, is_convex, is_planar, signed_area_2d, PolygonFrame,
};
pub use split::split_convex;
pub use triangulate::{best_fan_apex, fan, triangulate};

use thiserror::Error;

/// Errors from polygon tessellation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TessellateError {
    /// A loop has fewer than three points.
    #[error("loop has {0} points, at least 3 are required")]
    TooFewPoints(usize),

    /// Two non-adjacent edges intersect.
    #[error("edges {edge_a} and {edge_b} intersect")]
    SelfIntersecting {
        /// First edge index (edges numbered over all loops).
        edge_a: usize,
        /// Second edge index.
        edge_b: usize,
    },

    /// Ear clipping got stuck with this many vertices left.
    #[error("ear clipping failed with {remaining} vertices remaining")]
    EarClippingFailed {
        /// Vertices left in the loop.
        remaining: usize,
    },

    /// The loop encloses no area, so it has no normal.
    #[error("loop has a zero normal")]
    ZeroNormal,
}

/// Result alias for tessellation operations.
pub type Result<T> = std::result::Result<T, TessellateError>;
