//! `Point` and `Vector` value types.
//!
//! Both are `Copy` and every operation returns a new value, so there is
//! no aliasing between a result and its operands. The heavy lifting is
//! delegated to `glam::Vec3`.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A position in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point {
    pub const ORIGIN: Point = Point::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns this point moved by `vector`.
    pub fn translate(self, vector: Vector) -> Point {
        Point::new(self.x + vector.x, self.y + vector.y, self.z + vector.z)
    }

    /// True when no component is NaN or infinite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Components as `[x, y, z]`, the layout used in vertex arrays.
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// A direction and magnitude in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length, `sqrt(x² + y² + z²)`.
    pub fn length(self) -> f32 {
        Vec3::from(self).length()
    }

    /// Cross product `self × other`.
    pub fn cross(self, other: Vector) -> Vector {
        Vec3::from(self).cross(Vec3::from(other)).into()
    }

    pub fn dot(self, other: Vector) -> f32 {
        Vec3::from(self).dot(Vec3::from(other))
    }

    /// Multiplies every component by `factor`.
    pub fn scale(self, factor: f32) -> Vector {
        Vector::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// True when the length is finite and greater than zero.
    pub fn is_usable_direction(self) -> bool {
        let len = self.length();
        len.is_finite() && len > 0.0
    }
}

impl From<Point> for Vector {
    fn from(p: Point) -> Self {
        Vector::new(p.x, p.y, p.z)
    }
}

impl From<Vector> for Vec3 {
    fn from(v: Vector) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Vec3> for Vector {
    fn from(v: Vec3) -> Self {
        Vector::new(v.x, v.y, v.z)
    }
}

impl From<Point> for Vec3 {
    fn from(p: Point) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

impl From<Vec3> for Point {
    fn from(v: Vec3) -> Self {
        Point::new(v.x, v.y, v.z)
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        self.translate(rhs)
    }
}

/// `to - from`, the vector pointing from `rhs` to `self`.
impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f32) -> Vector {
        self.scale(rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_is_finite_rejects_nan_and_infinity() {
        assert!(Point::new(1.0, -2.0, 3.0).is_finite());
        assert!(!Point::new(f32::NAN, 0.0, 0.0).is_finite());
        assert!(!Point::new(0.0, f32::INFINITY, 0.0).is_finite());
        assert!(!Point::new(0.0, 0.0, f32::NEG_INFINITY).is_finite());
    }

    #[test]
    fn translate_adds_components() {
        let p = Point::new(1.0, 2.0, 3.0).translate(Vector::new(0.5, -2.0, 4.0));
        assert_eq!(p, Point::new(1.5, 0.0, 7.0));
    }

    #[test]
    fn translate_leaves_original_untouched() {
        let p = Point::new(1.0, 1.0, 1.0);
        let _moved = p.translate(Vector::new(1.0, 0.0, 0.0));
        assert_eq!(p, Point::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn length_of_3_4_0_is_5() {
        assert!((Vector::new(3.0, 4.0, 0.0).length() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn cross_of_x_and_y_is_z() {
        let z = Vector::new(1.0, 0.0, 0.0).cross(Vector::new(0.0, 1.0, 0.0));
        assert_eq!(z, Vector::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn cross_is_anticommutative() {
        let a = Vector::new(1.0, 2.0, 3.0);
        let b = Vector::new(-4.0, 0.5, 2.0);
        assert_eq!(a.cross(b), -b.cross(a));
    }

    #[test]
    fn cross_does_not_mutate_operands() {
        let a = Vector::new(1.0, 2.0, 3.0);
        let b = Vector::new(4.0, 5.0, 6.0);
        let _c = a.cross(b);
        assert_eq!(a, Vector::new(1.0, 2.0, 3.0));
        assert_eq!(b, Vector::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn dot_of_perpendicular_vectors_is_zero() {
        let d = Vector::new(1.0, 0.0, 0.0).dot(Vector::new(0.0, 0.0, 7.0));
        assert_eq!(d, 0.0);
    }

    #[test]
    fn dot_matches_manual_sum() {
        let d = Vector::new(1.0, 2.0, 3.0).dot(Vector::new(4.0, -5.0, 6.0));
        assert!((d - 12.0).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn scale_multiplies_each_component() {
        assert_eq!(
            Vector::new(1.0, -2.0, 0.5).scale(2.0),
            Vector::new(2.0, -4.0, 1.0)
        );
    }

    #[test]
    fn from_point_copies_components() {
        assert_eq!(
            Vector::from(Point::new(7.0, 8.0, 9.0)),
            Vector::new(7.0, 8.0, 9.0)
        );
    }

    #[test]
    fn point_difference_points_from_rhs_to_lhs() {
        let v = Point::new(5.0, 5.0, 5.0) - Point::new(1.0, 2.0, 3.0);
        assert_eq!(v, Vector::new(4.0, 3.0, 2.0));
    }

    #[test]
    fn zero_vector_is_not_a_usable_direction() {
        assert!(!Vector::ZERO.is_usable_direction());
        assert!(!Vector::new(f32::NAN, 0.0, 0.0).is_usable_direction());
        assert!(!Vector::new(f32::INFINITY, 0.0, 0.0).is_usable_direction());
        assert!(Vector::new(0.0, 1e-3, 0.0).is_usable_direction());
    }

    #[test]
    fn glam_conversion_round_trips() {
        let v = Vector::new(0.25, -1.0, 3.5);
        assert_eq!(Vector::from(Vec3::from(v)), v);
        let p = Point::new(-0.5, 2.0, 9.0);
        assert_eq!(Point::from(Vec3::from(p)), p);
    }

    #[test]
    fn point_serializes_as_xyz_object() {
        let json = serde_json::to_value(Point::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(json, serde_json::json!({"x": 1.0, "y": 2.0, "z": 3.0}));
    }
}
