//! Argument parsing and report types for the `tessellate` and `pick` commands.

use std::fmt;

use ember_core::geometry::{distance_between, intersection_point, intersects};
use ember_core::{DrawCommand, Plane, Point, Ray, ShapeData, Sphere, Vector};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Parses exactly `N` comma-separated finite floats, e.g. `"1,0,-2.5"`.
pub fn parse_floats<const N: usize>(flag: &str, value: &str) -> Result<[f32; N], CliError> {
    let bad = || CliError::Input(format!("{flag} expects {N} comma-separated numbers, got '{value}'"));

    let parsed: Vec<f32> = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|_| bad())?;
    if parsed.iter().any(|v| !v.is_finite()) {
        return Err(CliError::Input(format!("{flag} must be finite, got '{value}'")));
    }
    parsed.try_into().map_err(|_| bad())
}

pub fn parse_point(flag: &str, value: &str) -> Result<Point, CliError> {
    let [x, y, z] = parse_floats::<3>(flag, value)?;
    Ok(Point::new(x, y, z))
}

pub fn parse_vector(flag: &str, value: &str) -> Result<Vector, CliError> {
    let [x, y, z] = parse_floats::<3>(flag, value)?;
    Ok(Vector::new(x, y, z))
}

/// `x,y,z,radius`
pub fn parse_sphere(value: &str) -> Result<Sphere, CliError> {
    let [x, y, z, r] = parse_floats::<4>("--sphere", value)?;
    Ok(Sphere::new(Point::new(x, y, z), r)?)
}

/// `px,py,pz,nx,ny,nz`
pub fn parse_plane(value: &str) -> Result<Plane, CliError> {
    let [px, py, pz, nx, ny, nz] = parse_floats::<6>("--plane", value)?;
    Ok(Plane::new(Point::new(px, py, pz), Vector::new(nx, ny, nz))?)
}

/// A picking query: one ray tested against any number of spheres and an
/// optional plane.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PickQuery {
    pub ray: Ray,
    #[serde(default)]
    pub spheres: Vec<Sphere>,
    #[serde(default)]
    pub plane: Option<Plane>,
}

impl PickQuery {
    /// Parses a query from JSON. Degenerate geometry is rejected while parsing.
    pub fn from_json(json: &str) -> Result<Self, CliError> {
        serde_json::from_str(json).map_err(|e| CliError::Input(format!("invalid --query JSON: {e}")))
    }

    pub fn evaluate(&self) -> PickReport {
        let spheres = self
            .spheres
            .iter()
            .enumerate()
            .map(|(index, sphere)| SphereHit {
                index,
                hit: intersects(sphere, &self.ray),
                distance: distance_between(sphere.center(), &self.ray),
            })
            .collect();

        let plane = self.plane.map(|plane| match intersection_point(&self.ray, &plane) {
            Ok(point) => PlaneHit::Point { point },
            Err(e) => {
                log::debug!("no plane hit: {e}");
                PlaneHit::Parallel
            }
        });

        PickReport {
            ray: self.ray,
            spheres,
            plane,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SphereHit {
    pub index: usize,
    pub hit: bool,
    /// Distance from the sphere center to the ray's line.
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PlaneHit {
    Point { point: Point },
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickReport {
    pub ray: Ray,
    pub spheres: Vec<SphereHit>,
    pub plane: Option<PlaneHit>,
}

impl fmt::Display for PickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.ray.point();
        let v = self.ray.vector();
        writeln!(f, "ray ({}, {}, {}) -> ({}, {}, {})", p.x, p.y, p.z, v.x, v.y, v.z)?;
        for s in &self.spheres {
            let verdict = if s.hit { "hit" } else { "miss" };
            writeln!(f, "  sphere {}: {verdict} (distance {:.4})", s.index, s.distance)?;
        }
        match &self.plane {
            Some(PlaneHit::Point { point }) => {
                writeln!(f, "  plane: ({:.4}, {:.4}, {:.4})", point.x, point.y, point.z)?
            }
            Some(PlaneHit::Parallel) => writeln!(f, "  plane: none (ray parallel to plane)")?,
            None => {}
        }
        Ok(())
    }
}

/// Summary of a tessellated shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeReport {
    pub shape: &'static str,
    pub vertex_count: usize,
    pub draw_list: Vec<DrawCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertices: Option<Vec<[f32; 3]>>,
}

impl ShapeReport {
    pub fn new(shape: &'static str, data: &ShapeData, include_vertices: bool) -> Self {
        Self {
            shape,
            vertex_count: data.vertex_count(),
            draw_list: data.draw_list.clone(),
            vertices: include_vertices.then(|| data.vertices().collect()),
        }
    }
}

impl fmt::Display for ShapeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} vertices, {} draw command(s)",
            self.shape,
            self.vertex_count,
            self.draw_list.len()
        )?;
        for cmd in &self.draw_list {
            writeln!(f, "  {:?} first={} count={}", cmd.primitive, cmd.first, cmd.count)?;
        }
        if let Some(vertices) = &self.vertices {
            for (i, [x, y, z]) in vertices.iter().enumerate() {
                writeln!(f, "  v{i}: ({x:.4}, {y:.4}, {z:.4})")?;
            }
        }
        Ok(())
    }
}
