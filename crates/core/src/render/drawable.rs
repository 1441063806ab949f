//! The per-object drawing contract.
//!
//! A drawable binds its vertex data against a program's attributes, then
//! issues its draw commands. The program must already be current.

use super::buffer::{BufferError, CpuVertexBuffer, ShaderBuffer};
use super::device::GlDevice;
use super::shader::ShaderProgram;
use crate::shape::{DrawCommand, ShapeData, FLOATS_PER_VERTEX};

/// An object that can bind its data to a program and draw itself.
pub trait Drawable<D: GlDevice> {
    /// The program type this object binds against.
    type Program;

    /// Points the program's attributes at this object's vertex data.
    fn bind_data(&self, device: &D, program: &Self::Program) -> Result<(), BufferError>;

    /// Issues this object's draw commands.
    fn draw(&self, device: &D);
}

/// Attribute name a [`ShapeObject`] binds its positions to.
pub const POSITION_ATTRIBUTE: &str = "a_Position";

/// Tessellated shape data kept in a client-side vertex buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeObject {
    vertices: CpuVertexBuffer,
    draw_list: Vec<DrawCommand>,
}

impl ShapeObject {
    pub fn new(shape: &ShapeData) -> Self {
        Self {
            vertices: CpuVertexBuffer::new(&shape.vertex_data),
            draw_list: shape.draw_list.clone(),
        }
    }

    pub fn vertices(&self) -> &CpuVertexBuffer {
        &self.vertices
    }

    pub fn draw_list(&self) -> &[DrawCommand] {
        &self.draw_list
    }
}

impl From<ShapeData> for ShapeObject {
    fn from(shape: ShapeData) -> Self {
        Self {
            vertices: CpuVertexBuffer::new(&shape.vertex_data),
            draw_list: shape.draw_list,
        }
    }
}

impl<D: GlDevice> Drawable<D> for ShapeObject {
    type Program = ShaderProgram<D>;

    /// A program without an active `a_Position` attribute is left
    /// unbound, as GL itself ignores location -1.
    fn bind_data(&self, device: &D, program: &ShaderProgram<D>) -> Result<(), BufferError> {
        let Some(location) = program.attribute_location(device, POSITION_ATTRIBUTE) else {
            log::warn!("program {:?} has no active {POSITION_ATTRIBUTE}", program.handle());
            return Ok(());
        };
        self.vertices
            .set_vertex_attr(device, 0, location, FLOATS_PER_VERTEX as i32, 0)
    }

    /// Commands whose range overflows GL's signed arguments are skipped.
    fn draw(&self, device: &D) {
        for command in &self.draw_list {
            if let Err(e) = command.draw(device) {
                log::warn!("skipped draw command: {e}");
            }
        }
    }
}
