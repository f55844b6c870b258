//! Error types for the physics kernel.

use thiserror::Error;

/// Errors raised by body and shape configuration.
///
/// These are signaled immediately at the call that caused them and are never
/// silently clamped. Numerical edge cases inside the per-frame pipeline are
/// handled locally and never surface as errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Mass must be positive (use `f32::INFINITY` for an immovable body).
    #[error("mass must be positive, got {0}")]
    InvalidMass(f32),

    /// Inertia must be positive (use `f32::INFINITY` to pin rotation).
    #[error("inertia must be positive, got {0}")]
    InvalidInertia(f32),

    /// Density must be positive and finite.
    #[error("density must be positive and finite, got {0}")]
    InvalidDensity(f32),

    /// A shape constructor received degenerate or ambiguous arguments.
    #[error("invalid shape: {0}")]
    InvalidShape(&'static str),

    /// Attempted to set a non-zero orientation or angular velocity on a body
    /// that cannot rotate.
    #[error("cannot set angular state on a non-rotatable body")]
    NonRotatable,
}
