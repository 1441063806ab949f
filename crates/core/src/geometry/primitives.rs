//! Rays, planes, spheres, and the tessellation inputs `Circle` and `Cylinder`.
//!
//! `Ray`, `Plane`, and `Sphere` validate their inputs on construction
//! (including when deserialized), so the intersection queries never see
//! a zero-length direction, a zero normal, or a negative radius.

use serde::{Deserialize, Serialize};

use super::vector::{Point, Vector};
use crate::error::GeometryError;

/// A half-line starting at `point` and extending along `vector`.
///
/// The direction is not normalized; every query in
/// [`geometry::math`](super::math) is independent of its length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RayParts")]
pub struct Ray {
    point: Point,
    vector: Vector,
}

#[derive(Deserialize)]
struct RayParts {
    point: Point,
    vector: Vector,
}

impl Ray {
    /// Creates a ray.
    ///
    /// Returns `GeometryError::NonFinite` if `point` has a NaN or infinite
    /// component, and `GeometryError::ZeroLengthVector` if `vector` has
    /// zero or non-finite length.
    pub fn new(point: Point, vector: Vector) -> Result<Self, GeometryError> {
        if !point.is_finite() {
            return Err(GeometryError::NonFinite("ray origin"));
        }
        if !vector.is_usable_direction() {
            return Err(GeometryError::ZeroLengthVector);
        }
        Ok(Self { point, vector })
    }

    /// Creates the ray from `from` through `to`.
    pub fn between(from: Point, to: Point) -> Result<Self, GeometryError> {
        Self::new(from, to - from)
    }

    pub fn point(&self) -> Point {
        self.point
    }

    pub fn vector(&self) -> Vector {
        self.vector
    }

    /// The point at parameter `t`, i.e. `point + t * vector`.
    pub fn at(&self, t: f32) -> Point {
        self.point.translate(self.vector.scale(t))
    }
}

impl TryFrom<RayParts> for Ray {
    type Error = GeometryError;

    fn try_from(parts: RayParts) -> Result<Self, Self::Error> {
        Ray::new(parts.point, parts.vector)
    }
}

/// An infinite plane through `point` with the given `normal`.
///
/// The normal does not need to be unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlaneParts")]
pub struct Plane {
    point: Point,
    normal: Vector,
}

#[derive(Deserialize)]
struct PlaneParts {
    point: Point,
    normal: Vector,
}

impl Plane {
    /// Creates a plane.
    ///
    /// Returns `GeometryError::NonFinite` if `point` has a NaN or infinite
    /// component, and `GeometryError::ZeroLengthVector` if `normal` has
    /// zero or non-finite length.
    pub fn new(point: Point, normal: Vector) -> Result<Self, GeometryError> {
        if !point.is_finite() {
            return Err(GeometryError::NonFinite("plane point"));
        }
        if !normal.is_usable_direction() {
            return Err(GeometryError::ZeroLengthVector);
        }
        Ok(Self { point, normal })
    }

    pub fn point(&self) -> Point {
        self.point
    }

    pub fn normal(&self) -> Vector {
        self.normal
    }

    /// Signed distance from `p` to the plane, scaled by the normal's length.
    pub fn signed_offset(&self, p: Point) -> f32 {
        (p - self.point).dot(self.normal)
    }
}

impl TryFrom<PlaneParts> for Plane {
    type Error = GeometryError;

    fn try_from(parts: PlaneParts) -> Result<Self, Self::Error> {
        Plane::new(parts.point, parts.normal)
    }
}

/// A sphere, used as a bounding volume for picking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SphereParts")]
pub struct Sphere {
    center: Point,
    radius: f32,
}

#[derive(Deserialize)]
struct SphereParts {
    center: Point,
    radius: f32,
}

impl Sphere {
    /// Creates a sphere.
    ///
    /// Returns `GeometryError::InvalidRadius` if `radius` is negative or
    /// not finite, and `GeometryError::NonFinite` for a NaN or infinite
    /// center. A zero radius is allowed; no ray can intersect it.
    pub fn new(center: Point, radius: f32) -> Result<Self, GeometryError> {
        if !center.is_finite() {
            return Err(GeometryError::NonFinite("sphere center"));
        }
        if !radius.is_finite() || radius < 0.0 {
            return Err(GeometryError::InvalidRadius(radius));
        }
        Ok(Self { center, radius })
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl TryFrom<SphereParts> for Sphere {
    type Error = GeometryError;

    fn try_from(parts: SphereParts) -> Result<Self, Self::Error> {
        Sphere::new(parts.center, parts.radius)
    }
}

/// A circle lying in the XZ plane at `center.y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Point, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Returns a circle with the radius multiplied by `factor`.
    pub fn scale(self, factor: f32) -> Circle {
        Circle {
            radius: self.radius * factor,
            ..self
        }
    }
}

/// An upright cylinder centered on `center`, extending `height / 2` above and below it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub center: Point,
    pub radius: f32,
    pub height: f32,
}

impl Cylinder {
    pub fn new(center: Point, radius: f32, height: f32) -> Self {
        Self {
            center,
            radius,
            height,
        }
    }
}
