#![deny(unsafe_code)]
//! Core of the ember rendering support layer.
//!
//! Provides the geometry kernel (`Point`, `Vector`, `Ray`, `Plane`,
//! `Sphere` and the picking queries), shape tessellation into triangle-fan
//! vertex streams, shader/buffer/texture management over the `GlDevice`
//! seam, and the host lifecycle adapter.

pub mod error;
pub mod geometry;
pub mod lifecycle;
pub mod render;
pub mod shape;

pub use error::GeometryError;
pub use geometry::{Circle, Cylinder, Plane, Point, Ray, Sphere, Vector};
pub use lifecycle::{Game, GameRenderer, SurfaceSize};
pub use render::{GlDevice, ShaderError, ShaderProgram};
pub use shape::{create_circle, create_cylinder, DrawCommand, Primitive, ShapeBuilder, ShapeData};
