#![warn(missing_docs)]

//! Finite-element support for the xcut kernel.
//!
//! Cell shapes, shape functions, on-demand Gauss rules, the metric of
//! boundary elements embedded in 3D, and parent-element geometry with an
//! inverse (physical to reference) mapping.

mod cell_type;
pub mod gauss;
pub mod metric;
mod parent;
pub mod shape;

pub use cell_type::CellType;
pub use gauss::IntegrationRule;
pub use metric::BoundaryMetric;
pub use parent::ParentElement;

use thiserror::Error;

/// Errors from finite-element evaluations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FemError {
    /// The operation is not available for this cell shape.
    #[error("unsupported cell shape: {0}")]
    UnsupportedShape(CellType),

    /// A parent element was given the wrong number of nodes.
    #[error("{shape} needs {expected} nodes, got {found}")]
    WrongNodeCount {
        /// Element shape.
        shape: CellType,
        /// Required number of nodes.
        expected: usize,
        /// Supplied number of nodes.
        found: usize,
    },

    /// The element Jacobian is singular at the given reference point.
    #[error("singular jacobian at xi = {xi:?}")]
    SingularJacobian {
        /// Reference point where the inversion failed.
        xi: [f64; 3],
    },

    /// Newton iteration for local coordinates did not converge.
    #[error("local coordinates did not converge after {iterations} iterations (residual {residual:e})")]
    NotConverged {
        /// Iterations performed.
        iterations: usize,
        /// Final residual norm.
        residual: f64,
    },

    /// Point and weight lists of a quadrature rule differ in length.
    #[error("integration rule has {points} points but {weights} weights")]
    RuleLengthMismatch {
        /// Number of points.
        points: usize,
        /// Number of weights.
        weights: usize,
    },
}

/// Result alias for finite-element operations.
pub type Result<T> = std::result::Result<T, FemError>;
