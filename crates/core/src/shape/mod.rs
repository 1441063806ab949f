//! Procedural tessellation of simple solids into vertex streams.
//!
//! Generators write tightly packed `x, y, z` floats and record one draw
//! command per shape. The emitted order is significant: it determines
//! the triangulation of the fan, not the renderer.
//!
//! [`ShapeBuilder`] appends several shapes into one vertex array. Each
//! shape's draw command starts at the vertex offset where it was appended,
//! so a combined array can be uploaded as a single buffer.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::geometry::{Circle, Cylinder, Point};
use crate::render::GlDevice;

/// Number of floats per vertex in generated data (`x, y, z`).
pub const FLOATS_PER_VERTEX: usize = 3;

/// Largest vertex total a shape may reach. GL takes `first` and `count`
/// as signed 32-bit integers.
pub const MAX_DRAW_VERTICES: u32 = i32::MAX as u32;

/// Primitive topology for a draw command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Triangles,
    TriangleStrip,
    TriangleFan,
    Lines,
}

/// A single `draw_arrays` call over a contiguous run of vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCommand {
    pub primitive: Primitive,
    /// Index of the first vertex.
    pub first: u32,
    /// Number of vertices drawn.
    pub count: u32,
}

impl DrawCommand {
    /// `first` and `count` as GL arguments, if `first + count` fits in `i32`.
    fn gl_range(&self) -> Result<(i32, i32), GeometryError> {
        let overflow = || GeometryError::DrawRangeOverflow {
            first: self.first,
            count: self.count,
        };
        let first = i32::try_from(self.first).map_err(|_| overflow())?;
        let count = i32::try_from(self.count).map_err(|_| overflow())?;
        first.checked_add(count).ok_or_else(overflow)?;
        Ok((first, count))
    }

    /// Issues this command against the currently bound attributes.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::DrawRangeOverflow` without drawing if the
    /// range does not fit GL's signed arguments.
    pub fn draw<D: GlDevice>(&self, device: &D) -> Result<(), GeometryError> {
        let (first, count) = self.gl_range()?;
        device.draw_arrays(self.primitive, first, count);
        Ok(())
    }
}

/// Vertex data and the draw commands that render it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeData {
    pub vertex_data: Vec<f32>,
    pub draw_list: Vec<DrawCommand>,
}

impl ShapeData {
    /// Number of vertices in `vertex_data`.
    pub fn vertex_count(&self) -> usize {
        self.vertex_data.len() / FLOATS_PER_VERTEX
    }

    /// Returns vertex `index` as `[x, y, z]`, or `None` if out of range.
    pub fn vertex(&self, index: usize) -> Option<[f32; 3]> {
        let start = index.checked_mul(FLOATS_PER_VERTEX)?;
        let end = start.checked_add(FLOATS_PER_VERTEX)?;
        let v = self.vertex_data.get(start..end)?;
        Some([v[0], v[1], v[2]])
    }

    /// Iterates over vertices as `[x, y, z]`.
    pub fn vertices(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.vertex_data
            .chunks_exact(FLOATS_PER_VERTEX)
            .map(|v| [v[0], v[1], v[2]])
    }

    /// Issues every draw command in order.
    ///
    /// All ranges are checked first, so an overflowing command means
    /// nothing is drawn.
    pub fn draw<D: GlDevice>(&self, device: &D) -> Result<(), GeometryError> {
        for command in &self.draw_list {
            command.gl_range()?;
        }
        for command in &self.draw_list {
            command.draw(device)?;
        }
        Ok(())
    }
}

/// Vertices needed for a circle fan: the center plus `num_points + 1`
/// ring vertices (the starting angle is emitted twice to close the fan).
///
/// Totals above [`MAX_DRAW_VERTICES`] are `TooManyPoints`.
pub fn circle_vertex_count(num_points: u32) -> Result<u32, GeometryError> {
    validate_points(num_points)?;
    num_points
        .checked_add(2)
        .filter(|n| *n <= MAX_DRAW_VERTICES)
        .ok_or(GeometryError::TooManyPoints {
            requested: num_points,
        })
}

/// Vertices needed for an open cylinder: a bottom/top pair per ring step.
pub fn open_cylinder_vertex_count(num_points: u32) -> Result<u32, GeometryError> {
    validate_points(num_points)?;
    num_points
        .checked_add(1)
        .and_then(|steps| steps.checked_mul(2))
        .filter(|n| *n <= MAX_DRAW_VERTICES)
        .ok_or(GeometryError::TooManyPoints {
            requested: num_points,
        })
}

fn validate_points(num_points: u32) -> Result<(), GeometryError> {
    if num_points == 0 {
        return Err(GeometryError::TooFewPoints);
    }
    Ok(())
}

fn validate_finite(name: &'static str, value: f32) -> Result<(), GeometryError> {
    if !value.is_finite() {
        return Err(GeometryError::NonFinite(name));
    }
    Ok(())
}

/// Angle of ring step `i` out of `num_points`.
fn ring_angle(i: u32, num_points: u32) -> f32 {
    (i as f32 / num_points as f32) * TAU
}

/// Creates a triangle-fan circle in the XZ plane at `circle.center.y`.
///
/// # Errors
///
/// Returns `GeometryError::TooFewPoints` if `num_points` is zero, and
/// `GeometryError::NonFinite` if the center or radius is NaN or infinite.
pub fn create_circle(circle: &Circle, num_points: u32) -> Result<ShapeData, GeometryError> {
    let mut builder = ShapeBuilder::new();
    builder.append_circle(circle, num_points)?;
    Ok(builder.build())
}

/// Creates an open (uncapped) cylinder as a single triangle fan.
///
/// # Errors
///
/// Returns `GeometryError::TooFewPoints` if `num_points` is zero, and
/// `GeometryError::NonFinite` if the center, radius or height is NaN or
/// infinite.
pub fn create_cylinder(cylinder: &Cylinder, num_points: u32) -> Result<ShapeData, GeometryError> {
    let mut builder = ShapeBuilder::new();
    builder.append_open_cylinder(cylinder, num_points)?;
    Ok(builder.build())
}

/// Accumulates several shapes into one vertex array and draw list.
#[derive(Debug, Default)]
pub struct ShapeBuilder {
    vertex_data: Vec<f32>,
    draw_list: Vec<DrawCommand>,
}

impl ShapeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the next vertex to be written.
    fn vertex_offset(&self) -> Result<u32, GeometryError> {
        let offset = self.vertex_data.len() / FLOATS_PER_VERTEX;
        u32::try_from(offset).map_err(|_| GeometryError::TooManyPoints {
            requested: u32::MAX,
        })
    }

    fn push_vertex(&mut self, x: f32, y: f32, z: f32) {
        self.vertex_data.extend_from_slice(&[x, y, z]);
    }

    /// Appends a circle fan. See [`create_circle`].
    pub fn append_circle(
        &mut self,
        circle: &Circle,
        num_points: u32,
    ) -> Result<&mut Self, GeometryError> {
        if !circle.center.is_finite() {
            return Err(GeometryError::NonFinite("circle center"));
        }
        validate_finite("circle radius", circle.radius)?;
        let num_vertices = circle_vertex_count(num_points)?;
        let first = self.vertex_offset()?;
        first
            .checked_add(num_vertices)
            .filter(|end| *end <= MAX_DRAW_VERTICES)
            .ok_or(GeometryError::TooManyPoints {
                requested: num_points,
            })?;
        self.vertex_data
            .reserve(num_vertices as usize * FLOATS_PER_VERTEX);

        let Point { x, y, z } = circle.center;
        self.push_vertex(x, y, z);

        // `<=` emits the starting angle a second time to close the fan.
        for i in 0..=num_points {
            let angle = ring_angle(i, num_points);
            self.push_vertex(
                x + circle.radius * angle.cos(),
                y,
                z + circle.radius * angle.sin(),
            );
        }

        self.draw_list.push(DrawCommand {
            primitive: Primitive::TriangleFan,
            first,
            count: num_vertices,
        });
        log::trace!("appended circle: {num_vertices} vertices at offset {first}");
        Ok(self)
    }

    /// Appends an open cylinder. See [`create_cylinder`].
    pub fn append_open_cylinder(
        &mut self,
        cylinder: &Cylinder,
        num_points: u32,
    ) -> Result<&mut Self, GeometryError> {
        if !cylinder.center.is_finite() {
            return Err(GeometryError::NonFinite("cylinder center"));
        }
        validate_finite("cylinder radius", cylinder.radius)?;
        validate_finite("cylinder height", cylinder.height)?;
        let num_vertices = open_cylinder_vertex_count(num_points)?;
        let first = self.vertex_offset()?;
        first
            .checked_add(num_vertices)
            .filter(|end| *end <= MAX_DRAW_VERTICES)
            .ok_or(GeometryError::TooManyPoints {
                requested: num_points,
            })?;
        self.vertex_data
            .reserve(num_vertices as usize * FLOATS_PER_VERTEX);

        let center = cylinder.center;
        let y_start = center.y - cylinder.height / 2.0;
        let y_end = center.y + cylinder.height / 2.0;

        for i in 0..=num_points {
            let angle = ring_angle(i, num_points);
            let x = center.x + cylinder.radius * angle.cos();
            let z = center.z + cylinder.radius * angle.sin();

            self.push_vertex(x, y_start, z);
            self.push_vertex(x, y_end, z);
        }

        self.draw_list.push(DrawCommand {
            primitive: Primitive::TriangleFan,
            first,
            count: num_vertices,
        });
        log::trace!("appended open cylinder: {num_vertices} vertices at offset {first}");
        Ok(self)
    }

    /// Number of vertices appended so far.
    pub fn vertex_count(&self) -> usize {
        self.vertex_data.len() / FLOATS_PER_VERTEX
    }

    pub fn build(self) -> ShapeData {
        ShapeData {
            vertex_data: self.vertex_data,
            draw_list: self.draw_list,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::mock::{DeviceCall, MockDevice};
    use std::f32::consts::{FRAC_PI_2, PI};

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    fn unit_circle() -> Circle {
        Circle::new(Point::ORIGIN, 1.0)
    }

    #[test]
    fn unit_circle_with_four_points_matches_worked_example() {
        let shape = create_circle(&unit_circle(), 4).unwrap();
        assert_eq!(shape.vertex_count(), 6);
        assert_eq!(shape.vertex(0), Some([0.0, 0.0, 0.0]));

        let angles = [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2, 2.0 * PI];
        for (i, angle) in angles.iter().enumerate() {
            let expected = [angle.cos(), 0.0, angle.sin()];
            let got = shape.vertex(i + 1).unwrap();
            assert!(approx(got, expected), "vertex {}: {got:?} != {expected:?}", i + 1);
        }
    }

    #[test]
    fn circle_has_single_fan_command_over_all_vertices() {
        let shape = create_circle(&unit_circle(), 16).unwrap();
        assert_eq!(
            shape.draw_list,
            vec![DrawCommand {
                primitive: Primitive::TriangleFan,
                first: 0,
                count: 18,
            }]
        );
    }

    #[test]
    fn circle_lies_at_center_height() {
        let circle = Circle::new(Point::new(1.0, 7.5, -2.0), 3.0);
        let shape = create_circle(&circle, 12).unwrap();
        assert!(shape.vertices().all(|v| v[1] == 7.5));
    }

    #[test]
    fn circle_ring_is_radius_away_from_center() {
        let circle = Circle::new(Point::new(1.0, 0.0, -2.0), 3.0);
        let shape = create_circle(&circle, 9).unwrap();
        for v in shape.vertices().skip(1) {
            let r = ((v[0] - 1.0).powi(2) + (v[2] + 2.0).powi(2)).sqrt();
            assert!((r - 3.0).abs() < 1e-5, "ring vertex {v:?} at radius {r}");
        }
    }

    #[test]
    fn cylinder_has_two_vertices_per_ring_step() {
        let cylinder = Cylinder::new(Point::ORIGIN, 1.0, 2.0);
        let shape = create_cylinder(&cylinder, 8).unwrap();
        assert_eq!(shape.vertex_count(), 18);
        assert_eq!(shape.draw_list[0].count, 18);
        assert_eq!(shape.draw_list[0].primitive, Primitive::TriangleFan);
    }

    #[test]
    fn cylinder_emits_bottom_then_top() {
        let cylinder = Cylinder::new(Point::new(0.0, 1.0, 0.0), 2.0, 4.0);
        let shape = create_cylinder(&cylinder, 4).unwrap();
        assert!(approx(shape.vertex(0).unwrap(), [2.0, -1.0, 0.0]));
        assert!(approx(shape.vertex(1).unwrap(), [2.0, 3.0, 0.0]));
        assert!(approx(shape.vertex(2).unwrap(), [0.0, -1.0, 2.0]));
        assert!(approx(shape.vertex(3).unwrap(), [0.0, 3.0, 2.0]));
    }

    #[test]
    fn zero_points_is_rejected() {
        assert_eq!(
            create_circle(&unit_circle(), 0),
            Err(GeometryError::TooFewPoints)
        );
        let cylinder = Cylinder::new(Point::ORIGIN, 1.0, 1.0);
        assert_eq!(
            create_cylinder(&cylinder, 0),
            Err(GeometryError::TooFewPoints)
        );
    }

    #[test]
    fn vertex_counts_reject_overflow() {
        assert!(circle_vertex_count(u32::MAX).is_err());
        assert!(open_cylinder_vertex_count(u32::MAX / 2).is_err());
        assert_eq!(circle_vertex_count(1), Ok(3));
        assert_eq!(open_cylinder_vertex_count(1), Ok(4));
    }

    #[test]
    fn vertex_counts_are_capped_at_i32_max() {
        assert_eq!(
            circle_vertex_count(MAX_DRAW_VERTICES - 2),
            Ok(MAX_DRAW_VERTICES)
        );
        assert_eq!(
            circle_vertex_count(MAX_DRAW_VERTICES - 1),
            Err(GeometryError::TooManyPoints {
                requested: MAX_DRAW_VERTICES - 1
            })
        );
        assert!(open_cylinder_vertex_count(MAX_DRAW_VERTICES / 2).is_err());
        assert!(open_cylinder_vertex_count(1_500_000_000).is_err());
    }

    #[test]
    fn non_finite_circle_is_rejected() {
        let nan_radius = Circle::new(Point::ORIGIN, f32::NAN);
        assert_eq!(
            create_circle(&nan_radius, 4),
            Err(GeometryError::NonFinite("circle radius"))
        );
        let inf_center = Circle::new(Point::new(f32::INFINITY, 0.0, 0.0), 1.0);
        assert_eq!(
            create_circle(&inf_center, 4),
            Err(GeometryError::NonFinite("circle center"))
        );
    }

    #[test]
    fn non_finite_cylinder_is_rejected() {
        let inf_height = Cylinder::new(Point::ORIGIN, 1.0, f32::INFINITY);
        assert_eq!(
            create_cylinder(&inf_height, 4),
            Err(GeometryError::NonFinite("cylinder height"))
        );
        let nan_radius = Cylinder::new(Point::ORIGIN, f32::NAN, 1.0);
        assert_eq!(
            create_cylinder(&nan_radius, 4),
            Err(GeometryError::NonFinite("cylinder radius"))
        );
        let nan_center = Cylinder::new(Point::new(0.0, f32::NAN, 0.0), 1.0, 1.0);
        assert_eq!(
            create_cylinder(&nan_center, 4),
            Err(GeometryError::NonFinite("cylinder center"))
        );
    }

    #[test]
    fn single_point_circle_is_degenerate_but_valid() {
        let shape = create_circle(&unit_circle(), 1).unwrap();
        assert_eq!(shape.vertex_count(), 3);
    }

    #[test]
    fn builder_offsets_second_shape_after_first() {
        let mut builder = ShapeBuilder::new();
        builder
            .append_circle(&unit_circle(), 4)
            .unwrap()
            .append_open_cylinder(&Cylinder::new(Point::ORIGIN, 1.0, 1.0), 4)
            .unwrap();
        let shape = builder.build();

        assert_eq!(shape.vertex_count(), 6 + 10);
        assert_eq!(shape.draw_list.len(), 2);
        assert_eq!(shape.draw_list[0].first, 0);
        assert_eq!(shape.draw_list[0].count, 6);
        assert_eq!(shape.draw_list[1].first, 6);
        assert_eq!(shape.draw_list[1].count, 10);
    }

    #[test]
    fn builder_matches_standalone_generators() {
        let circle = Circle::new(Point::new(0.5, 0.5, 0.5), 2.0);
        let mut builder = ShapeBuilder::new();
        builder.append_circle(&circle, 7).unwrap();
        assert_eq!(builder.build(), create_circle(&circle, 7).unwrap());
    }

    #[test]
    fn failed_append_leaves_builder_untouched() {
        let mut builder = ShapeBuilder::new();
        builder.append_circle(&unit_circle(), 3).unwrap();
        assert!(builder.append_circle(&unit_circle(), 0).is_err());
        assert!(builder
            .append_open_cylinder(&Cylinder::new(Point::ORIGIN, 1.0, f32::NAN), 3)
            .is_err());
        assert_eq!(builder.vertex_count(), 5);
    }

    #[test]
    fn draw_issues_each_command_in_order() {
        let mut builder = ShapeBuilder::new();
        builder
            .append_circle(&unit_circle(), 4)
            .unwrap()
            .append_circle(&unit_circle(), 5)
            .unwrap();
        let shape = builder.build();
        let device = MockDevice::new();
        shape.draw(&device).unwrap();

        let draws: Vec<DeviceCall> = device
            .calls()
            .into_iter()
            .filter(|c| matches!(c, DeviceCall::DrawArrays { .. }))
            .collect();
        assert_eq!(
            draws,
            vec![
                DeviceCall::DrawArrays {
                    primitive: Primitive::TriangleFan,
                    first: 0,
                    count: 6,
                },
                DeviceCall::DrawArrays {
                    primitive: Primitive::TriangleFan,
                    first: 6,
                    count: 7,
                },
            ]
        );
    }

    #[test]
    fn draw_command_rejects_count_past_i32() {
        let device = MockDevice::new();
        let command = DrawCommand {
            primitive: Primitive::TriangleFan,
            first: 0,
            count: 3_000_000_000,
        };
        assert_eq!(
            command.draw(&device),
            Err(GeometryError::DrawRangeOverflow {
                first: 0,
                count: 3_000_000_000
            })
        );
        assert!(device.calls().is_empty());
    }

    #[test]
    fn shape_draw_checks_every_range_before_drawing() {
        let shape = ShapeData {
            vertex_data: Vec::new(),
            draw_list: vec![
                DrawCommand {
                    primitive: Primitive::TriangleFan,
                    first: 0,
                    count: 6,
                },
                DrawCommand {
                    primitive: Primitive::Triangles,
                    first: MAX_DRAW_VERTICES,
                    count: 3,
                },
            ],
        };
        let device = MockDevice::new();
        assert!(matches!(
            shape.draw(&device),
            Err(GeometryError::DrawRangeOverflow { .. })
        ));
        assert!(device.calls().is_empty());
    }

    #[test]
    fn primitive_serializes_in_snake_case() {
        let json = serde_json::to_value(Primitive::TriangleFan).unwrap();
        assert_eq!(json, serde_json::json!("triangle_fan"));
        let command: DrawCommand =
            serde_json::from_str(r#"{"primitive": "lines", "first": 2, "count": 4}"#).unwrap();
        assert_eq!(command.primitive, Primitive::Lines);
    }

    // -- Property-based tests --

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn center() -> impl Strategy<Value = Point> {
            (-50.0_f32..50.0, -50.0_f32..50.0, -50.0_f32..50.0)
                .prop_map(|(x, y, z)| Point::new(x, y, z))
        }

        proptest! {
            #[test]
            fn circle_vertex_count_is_n_plus_two(c in center(), r in 0.1_f32..20.0, n in 1_u32..256) {
                let shape = create_circle(&Circle::new(c, r), n).unwrap();
                prop_assert_eq!(shape.vertex_count(), n as usize + 2);
                prop_assert_eq!(shape.vertex(0), Some(c.to_array()));
            }

            #[test]
            fn circle_closes_the_fan(c in center(), r in 0.1_f32..20.0, n in 1_u32..256) {
                let shape = create_circle(&Circle::new(c, r), n).unwrap();
                let first = shape.vertex(1).unwrap();
                let last = shape.vertex(n as usize + 1).unwrap();
                let tol = 1e-4 * (1.0 + r + c.x.abs() + c.z.abs());
                for k in 0..3 {
                    prop_assert!((first[k] - last[k]).abs() < tol, "first {first:?} last {last:?}");
                }
            }

            #[test]
            fn cylinder_pairs_share_xz_and_span_height(
                c in center(),
                r in 0.1_f32..20.0,
                h in 0.0_f32..40.0,
                n in 1_u32..256,
            ) {
                let shape = create_cylinder(&Cylinder::new(c, r, h), n).unwrap();
                prop_assert_eq!(shape.vertex_count(), 2 * (n as usize + 1));
                for step in 0..=n as usize {
                    let bottom = shape.vertex(2 * step).unwrap();
                    let top = shape.vertex(2 * step + 1).unwrap();
                    prop_assert_eq!(bottom[0], top[0]);
                    prop_assert_eq!(bottom[2], top[2]);
                    prop_assert!(((top[1] - bottom[1]) - h).abs() < 1e-4, "dy = {}", top[1] - bottom[1]);
                }
            }

            #[test]
            fn generators_are_deterministic(c in center(), r in 0.1_f32..20.0, n in 1_u32..128) {
                let a = create_circle(&Circle::new(c, r), n).unwrap();
                let b = create_circle(&Circle::new(c, r), n).unwrap();
                let a_bits: Vec<u32> = a.vertex_data.iter().map(|f| f.to_bits()).collect();
                let b_bits: Vec<u32> = b.vertex_data.iter().map(|f| f.to_bits()).collect();
                prop_assert_eq!(a_bits, b_bits);
            }
        }
    }
}
