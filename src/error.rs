//! Error types for the Voltaic circuit simulator.
//!
//! This module provides a unified error type [`VoltaicError`] that covers
//! all error conditions that can occur while building a circuit, solving
//! the MNA system, and writing probe output.

use thiserror::Error;

/// Result type alias using [`VoltaicError`].
pub type Result<T> = std::result::Result<T, VoltaicError>;

/// Unified error type for all Voltaic operations.
#[derive(Error, Debug)]
pub enum VoltaicError {
    // ============ Circuit Construction Errors ============
    /// Node id was never created by this circuit
    #[error("Node '{node}' not found in circuit")]
    NodeNotFound { node: String },

    /// Component id does not refer to a registered component
    #[error("Component '{component}' not found in circuit")]
    ComponentNotFound { component: String },

    /// Invalid component value
    #[error("Invalid {kind}: {message}")]
    InvalidComponent { kind: &'static str, message: String },

    // ============ Circuit Validation Errors ============
    /// Floating node (not connected to ground path)
    #[error("Floating node '{node}' detected - no path to ground")]
    FloatingNode { node: String },

    /// Missing ground node
    #[error("Circuit has no ground node (node 0 is never connected)")]
    MissingGround,

    /// Invalid circuit topology
    #[error("Invalid circuit topology: {message}")]
    InvalidTopology { message: String },

    // ============ Simulation Errors ============
    /// Matrix is singular and cannot be solved
    #[error("Singular matrix (zero pivot at elimination step {pivot}) - circuit may have a floating node or a voltage source loop")]
    SingularMatrix { pivot: usize },

    /// Solution was produced but does not satisfy the system
    #[error("Ill-conditioned system: relative residual {residual:.2e} exceeds tolerance {tolerance:.2e}")]
    IllConditioned { residual: f64, tolerance: f64 },

    /// Invalid simulation parameter
    #[error("Invalid simulation parameter: {message}")]
    InvalidSimulationParam { message: String },

    // ============ I/O Errors ============
    /// Error writing probe output
    #[error("Probe output error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl VoltaicError {
    /// Create an invalid component error
    pub fn invalid_component(kind: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidComponent {
            kind,
            message: message.into(),
        }
    }

    /// Create an invalid simulation parameter error
    pub fn invalid_param(message: impl Into<String>) -> Self {
        Self::InvalidSimulationParam {
            message: message.into(),
        }
    }

    /// True when the circuit itself cannot be solved as configured
    /// (floating nodes, source loops, numerically degenerate systems).
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::SingularMatrix { .. }
                | Self::IllConditioned { .. }
                | Self::FloatingNode { .. }
                | Self::MissingGround
        )
    }
}
