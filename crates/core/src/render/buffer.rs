//! Vertex and index buffers.
//!
//! Two storage strategies sit behind one capability, [`ShaderBuffer`]:
//! a CPU-resident float array whose attribute pointer is handed to the
//! device on every bind, and a GPU-resident buffer object uploaded once.
//! Neither changes its storage kind or element count after construction.

use thiserror::Error;

use super::device::{AttribType, BufferTarget, BufferUsage, GlDevice};
use crate::shape::Primitive;

/// Errors from buffer creation and attribute binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The device refused to allocate or stage buffer storage.
    #[error("could not create buffer: {0}")]
    CreateFailed(String),
    /// A write or attribute window fell outside the buffer.
    #[error("range {start}..{start}+{len} is outside buffer of {capacity} elements")]
    OutOfRange {
        start: usize,
        len: usize,
        capacity: usize,
    },
    /// An index-only operation was called on a vertex buffer.
    #[error("operation requires an index buffer, found a {0:?} buffer")]
    WrongKind(BufferKind),
}

/// Something that can act as the source of a vertex attribute.
pub trait ShaderBuffer<D: GlDevice> {
    /// Points attribute `attribute_index` at this buffer's data and enables it.
    ///
    /// `data_offset` is where the attribute's first component starts. Its
    /// unit depends on the buffer: floats for [`CpuVertexBuffer`], bytes
    /// for [`GpuBuffer`]. `stride` is always in bytes; 0 means tightly
    /// packed.
    fn set_vertex_attr(
        &self,
        device: &D,
        data_offset: usize,
        attribute_index: u32,
        component_count: i32,
        stride: i32,
    ) -> Result<(), BufferError>;
}

/// Vertex floats held in client memory.
///
/// The contents are copied in at construction and can be rewritten in
/// place, but the length is fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuVertexBuffer {
    data: Box<[f32]>,
}

impl CpuVertexBuffer {
    pub fn new(vertex_data: &[f32]) -> Self {
        Self {
            data: vertex_data.into(),
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The floats as native-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Overwrites floats starting at `start` with `vertex_data`.
    ///
    /// # Errors
    ///
    /// Returns `BufferError::OutOfRange` if the write would run past the
    /// end. The buffer is left untouched in that case.
    pub fn update_vertex_data(&mut self, start: usize, vertex_data: &[f32]) -> Result<(), BufferError> {
        let capacity = self.data.len();
        let out_of_range = BufferError::OutOfRange {
            start,
            len: vertex_data.len(),
            capacity,
        };
        let end = start.checked_add(vertex_data.len()).ok_or(out_of_range.clone())?;
        let window = self.data.get_mut(start..end).ok_or(out_of_range)?;
        window.copy_from_slice(vertex_data);
        Ok(())
    }
}

impl<D: GlDevice> ShaderBuffer<D> for CpuVertexBuffer {
    /// `data_offset` is counted in floats.
    fn set_vertex_attr(
        &self,
        device: &D,
        data_offset: usize,
        attribute_index: u32,
        component_count: i32,
        stride: i32,
    ) -> Result<(), BufferError> {
        let window = self.data.get(data_offset..).ok_or(BufferError::OutOfRange {
            start: data_offset,
            len: 0,
            capacity: self.data.len(),
        })?;

        device
            .client_vertex_attrib_pointer(attribute_index, component_count, stride, window)
            .map_err(BufferError::CreateFailed)?;
        device.enable_vertex_attrib_array(attribute_index);
        Ok(())
    }
}

/// What a [`GpuBuffer`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// `f32` vertex components.
    Vertex,
    /// `u16` element indices.
    Index,
}

impl BufferKind {
    fn target(self) -> BufferTarget {
        match self {
            BufferKind::Vertex => BufferTarget::Array,
            BufferKind::Index => BufferTarget::ElementArray,
        }
    }

    fn attrib_type(self) -> AttribType {
        match self {
            BufferKind::Vertex => AttribType::F32,
            BufferKind::Index => AttribType::U16,
        }
    }
}

/// A device-side buffer object, uploaded once with a static-draw hint.
///
/// Only the handle is retained; there is no CPU copy of the contents.
pub struct GpuBuffer<D: GlDevice> {
    buffer: D::Buffer,
    kind: BufferKind,
    len: usize,
}

impl<D: GlDevice> GpuBuffer<D> {
    /// Uploads vertex floats into a new buffer object.
    ///
    /// # Errors
    ///
    /// Returns `BufferError::CreateFailed` if the device refuses the allocation.
    pub fn vertex(device: &D, vertex_data: &[f32]) -> Result<Self, BufferError> {
        Self::upload(device, BufferKind::Vertex, bytemuck::cast_slice(vertex_data), vertex_data.len())
    }

    /// Uploads `u16` indices into a new buffer object.
    ///
    /// # Errors
    ///
    /// Returns `BufferError::CreateFailed` if the device refuses the allocation.
    pub fn index(device: &D, index_data: &[u16]) -> Result<Self, BufferError> {
        Self::upload(device, BufferKind::Index, bytemuck::cast_slice(index_data), index_data.len())
    }

    fn upload(device: &D, kind: BufferKind, bytes: &[u8], len: usize) -> Result<Self, BufferError> {
        let buffer = device.create_buffer().map_err(BufferError::CreateFailed)?;
        let target = kind.target();

        device.bind_buffer(target, Some(buffer));
        device.buffer_data(target, bytes, BufferUsage::StaticDraw);
        device.bind_buffer(target, None);

        log::debug!("uploaded {len} elements to {kind:?} buffer {buffer:?}");
        Ok(Self { buffer, kind, len })
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Number of elements (floats or indices) uploaded.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn handle(&self) -> D::Buffer {
        self.buffer
    }

    fn byte_len(&self) -> usize {
        self.len * self.kind.attrib_type().size_in_bytes()
    }

    /// Binds this index buffer to the element target for `draw_elements`.
    pub fn bind_indices(&self, device: &D) -> Result<(), BufferError> {
        if self.kind != BufferKind::Index {
            return Err(BufferError::WrongKind(self.kind));
        }
        device.bind_buffer(BufferTarget::ElementArray, Some(self.buffer));
        Ok(())
    }

    /// Draws every index in this buffer with `primitive`.
    pub fn draw_elements(&self, device: &D, primitive: Primitive) -> Result<(), BufferError> {
        self.bind_indices(device)?;
        let count = i32::try_from(self.len).map_err(|_| BufferError::OutOfRange {
            start: 0,
            len: self.len,
            capacity: i32::MAX as usize,
        })?;
        device.draw_elements(primitive, count, 0);
        Ok(())
    }

    /// Deletes the buffer object.
    pub fn destroy(self, device: &D) {
        device.delete_buffer(self.buffer);
    }
}

impl<D: GlDevice> ShaderBuffer<D> for GpuBuffer<D> {
    /// `data_offset` is counted in bytes.
    fn set_vertex_attr(
        &self,
        device: &D,
        data_offset: usize,
        attribute_index: u32,
        component_count: i32,
        stride: i32,
    ) -> Result<(), BufferError> {
        let capacity = self.byte_len();
        let offset = i32::try_from(data_offset)
            .ok()
            .filter(|_| data_offset <= capacity)
            .ok_or(BufferError::OutOfRange {
                start: data_offset,
                len: 0,
                capacity,
            })?;

        device.bind_buffer(BufferTarget::Array, Some(self.buffer));
        device.vertex_attrib_pointer(
            attribute_index,
            component_count,
            self.kind.attrib_type(),
            stride,
            offset,
        );
        device.enable_vertex_attrib_array(attribute_index);
        device.bind_buffer(BufferTarget::Array, None);
        Ok(())
    }
}

impl<D: GlDevice> std::fmt::Debug for GpuBuffer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("buffer", &self.buffer)
            .field("kind", &self.kind)
            .field("len", &self.len)
            .finish()
    }
}
