//! Perspective projection matrix.

use glam::Mat4;

use crate::error::GeometryError;

/// Builds a right-handed perspective projection mapping view-space depth
/// `[-near, -far]` to GL clip space `[-1, 1]`.
///
/// The matrix is written out column by column with focal length
/// `a = 1 / tan(fov / 2)`.
///
/// # Errors
///
/// Returns `GeometryError::InvalidProjection` if the field of view is not
/// inside `(0, 180)` degrees, `aspect` is not positive, `near` is not
/// positive, or `far <= near`.
pub fn perspective(
    y_fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
) -> Result<Mat4, GeometryError> {
    if !(y_fov_degrees > 0.0 && y_fov_degrees < 180.0) {
        return Err(GeometryError::InvalidProjection(format!(
            "field of view must be in (0, 180) degrees, got {y_fov_degrees}"
        )));
    }
    if !(aspect > 0.0 && aspect.is_finite()) {
        return Err(GeometryError::InvalidProjection(format!(
            "aspect ratio must be positive, got {aspect}"
        )));
    }
    if !(near > 0.0 && far > near && far.is_finite()) {
        return Err(GeometryError::InvalidProjection(format!(
            "expected 0 < near < far, got near = {near}, far = {far}"
        )));
    }

    let a = 1.0 / (y_fov_degrees.to_radians() / 2.0).tan();
    let depth = far - near;

    #[rustfmt::skip]
    let columns = [
        a / aspect, 0.0, 0.0,                            0.0,
        0.0,        a,   0.0,                            0.0,
        0.0,        0.0, -((far + near) / depth),        -1.0,
        0.0,        0.0, -((2.0 * far * near) / depth),  0.0,
    ];

    Ok(Mat4::from_cols_array(&columns))
}
