//! Geometry kernel: value types and analytic queries.
//!
//! Everything here is pure and allocation-free, so it is safe to use from
//! any thread independently of the rendering context.
//!
//! # Module overview
//!
//! - [`vector`] -- `Point` and `Vector` with pure arithmetic.
//! - [`primitives`] -- `Ray`, `Plane`, `Sphere`, `Circle`, `Cylinder`.
//! - [`math`] -- distance and intersection queries.
//! - [`projection`] -- perspective projection matrix.

pub mod math;
pub mod primitives;
pub mod projection;
pub mod vector;

pub use math::{distance_between, intersection_point, intersects, vector_between};
pub use primitives::{Circle, Cylinder, Plane, Ray, Sphere};
pub use projection::perspective;
pub use vector::{Point, Vector};
