//! Error types for geometry and tessellation inputs.
//!
//! Degenerate inputs are caller contract violations. They are rejected
//! eagerly at construction or query time instead of producing NaN or
//! garbage vertex data.

use thiserror::Error;

/// Errors produced by the geometry kernel and the shape tessellator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A ray direction or plane normal had zero (or non-finite) length.
    #[error("vector must have a finite, non-zero length")]
    ZeroLengthVector,

    /// The ray runs parallel to the plane, so there is no single intersection point.
    #[error("ray is parallel to the plane")]
    ParallelRayPlane,

    /// A tessellation was requested with fewer than one point around the ring.
    #[error("tessellation requires at least 1 point, got 0")]
    TooFewPoints,

    /// The requested point count produces more vertices than a draw call can address.
    #[error("tessellation with {requested} points exceeds the addressable vertex count")]
    TooManyPoints { requested: u32 },

    /// A point, radius or height was NaN or infinite.
    #[error("{0} must be finite")]
    NonFinite(&'static str),

    /// A draw command's vertex range does not fit a GL draw call.
    #[error("draw range {first}+{count} exceeds the addressable vertex count")]
    DrawRangeOverflow { first: u32, count: u32 },

    /// A sphere radius was negative or not finite.
    #[error("invalid radius: {0}")]
    InvalidRadius(f32),

    /// Perspective projection parameters were out of range.
    #[error("invalid projection: {0}")]
    InvalidProjection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_vector_displays_readable_message() {
        let msg = format!("{}", GeometryError::ZeroLengthVector);
        assert!(msg.contains("non-zero"), "unexpected message: {msg}");
    }

    #[test]
    fn too_many_points_includes_count() {
        let err = GeometryError::TooManyPoints {
            requested: 4_000_000_000,
        };
        let msg = format!("{err}");
        assert!(msg.contains("4000000000"), "missing count in: {msg}");
    }

    #[test]
    fn invalid_radius_includes_value() {
        let msg = format!("{}", GeometryError::InvalidRadius(-2.5));
        assert!(msg.contains("-2.5"), "missing radius in: {msg}");
    }

    #[test]
    fn invalid_projection_includes_reason() {
        let err = GeometryError::InvalidProjection("far must exceed near".into());
        let msg = format!("{err}");
        assert!(msg.contains("far must exceed near"), "missing reason in: {msg}");
    }

    #[test]
    fn non_finite_names_the_input() {
        let msg = format!("{}", GeometryError::NonFinite("circle radius"));
        assert_eq!(msg, "circle radius must be finite");
    }

    #[test]
    fn draw_range_overflow_includes_range() {
        let err = GeometryError::DrawRangeOverflow {
            first: 10,
            count: 3_000_000_000,
        };
        let msg = format!("{err}");
        assert!(msg.contains("10+3000000000"), "missing range in: {msg}");
    }

    #[test]
    fn geometry_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GeometryError>();
    }

    #[test]
    fn geometry_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<GeometryError>();
    }
}
