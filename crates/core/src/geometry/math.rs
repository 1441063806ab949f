//! Distance and intersection queries used for picking and collision tests.

use super::primitives::{Plane, Ray, Sphere};
use super::vector::{Point, Vector};
use crate::error::GeometryError;

/// The vector from `from` to `to`.
pub fn vector_between(from: Point, to: Point) -> Vector {
    Vector::new(to.x - from.x, to.y - from.y, to.z - from.z)
}

/// Shortest distance from `point` to the infinite line through `ray`.
///
/// With `p1 = ray.point` and `p2 = p1 + ray.vector`, the length of
/// `(p1 → point) × (p2 → point)` is twice the area of the triangle
/// `p1, p2, point`. Dividing by the base `|ray.vector|` yields the height,
/// which is the distance.
pub fn distance_between(point: Point, ray: &Ray) -> f32 {
    let p1_to_point = vector_between(ray.point(), point);
    let p2_to_point = vector_between(ray.point().translate(ray.vector()), point);

    let twice_triangle_area = p1_to_point.cross(p2_to_point).length();
    let base = ray.vector().length();

    twice_triangle_area / base
}

/// Whether the line through `ray` passes through `sphere`.
///
/// Uses strict `<`: a ray exactly tangent to the sphere does not
/// intersect it.
pub fn intersects(sphere: &Sphere, ray: &Ray) -> bool {
    distance_between(sphere.center(), ray) < sphere.radius()
}

/// Where the line through `ray` meets `plane`.
///
/// The ray vector is scaled by
/// `dot(ray.point → plane.point, n) / dot(ray.vector, n)` and added to the
/// ray's origin. The result may lie behind the origin (negative scale).
///
/// # Errors
///
/// Returns `GeometryError::ParallelRayPlane` when the ray is parallel to
/// the plane, i.e. `|dot(ray.vector, n)|` is within float tolerance of zero,
/// or so close to parallel that the hit is not representable as `f32`.
pub fn intersection_point(ray: &Ray, plane: &Plane) -> Result<Point, GeometryError> {
    let denominator = ray.vector().dot(plane.normal());
    let tolerance = f32::EPSILON * ray.vector().length() * plane.normal().length();
    if denominator.abs() <= tolerance {
        return Err(GeometryError::ParallelRayPlane);
    }

    let ray_to_plane = vector_between(ray.point(), plane.point());
    let scale_factor = ray_to_plane.dot(plane.normal()) / denominator;

    let hit = ray.point().translate(ray.vector().scale(scale_factor));
    // A nearly parallel ray can push the hit past f32 range.
    if !hit.is_finite() {
        return Err(GeometryError::ParallelRayPlane);
    }
    Ok(hit)
}
